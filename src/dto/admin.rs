use serde::Serialize;
use utoipa::ToSchema;

/// Outcome of a log export.
#[derive(Debug, Serialize, ToSchema)]
pub struct LogExportResponse {
    /// Path of the written file.
    pub path: String,
    pub bytes: usize,
}
