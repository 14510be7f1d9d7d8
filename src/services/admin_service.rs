//! Admin dashboard operations: counters, backend logs, log export and purge.

use std::path::PathBuf;

use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{info, warn};

use crate::{
    api::models::{AdminStatsDto, LogEntryDto},
    dto::{admin::LogExportResponse, common::ActionResponse},
    error::ServiceError,
    state::SharedState,
};

pub async fn stats(state: &SharedState) -> Result<AdminStatsDto, ServiceError> {
    state.current_user().await?;
    Ok(state.backend().fetch_stats().await?)
}

pub async fn logs(state: &SharedState) -> Result<Vec<LogEntryDto>, ServiceError> {
    state.current_user().await?;
    Ok(state.backend().fetch_logs().await?)
}

/// Download the backend log export and write it under the configured export directory.
pub async fn export_logs(state: &SharedState) -> Result<LogExportResponse, ServiceError> {
    state.current_user().await?;
    let contents = state.backend().export_logs().await?;

    let dir = state.config().export_dir().clone();
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|source| ServiceError::Export {
            path: dir.clone(),
            source,
        })?;

    let path = export_path(&dir, OffsetDateTime::now_utc());
    tokio::fs::write(&path, &contents)
        .await
        .map_err(|source| ServiceError::Export {
            path: path.clone(),
            source,
        })?;

    info!(path = %path.display(), bytes = contents.len(), "logs exported");
    Ok(LogExportResponse {
        path: path.display().to_string(),
        bytes: contents.len(),
    })
}

/// Delete every backend log entry.
pub async fn purge_logs(state: &SharedState) -> Result<ActionResponse, ServiceError> {
    state.current_user().await?;
    state.backend().purge_logs().await?;
    warn!("backend logs purged");
    Ok(ActionResponse::new("logs purged"))
}

/// `logs-<RFC 3339 timestamp>.json`, with `:` swapped for `-` so the name is portable.
fn export_path(dir: &std::path::Path, now: OffsetDateTime) -> PathBuf {
    let stamp = now
        .format(&Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
        .replace(':', "-");
    dir.join(format!("logs-{stamp}.json"))
}
