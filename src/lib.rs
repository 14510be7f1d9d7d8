//! Library crate for padel-front, exposing the backend client, match-flow state and the local
//! HTTP surface for the binaries.

pub mod api;
pub mod config;
pub mod dto;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
