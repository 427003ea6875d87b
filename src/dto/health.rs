//! Health check payload.

use serde::Serialize;

/// Body returned by the health endpoint.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service status, always `ok`.
    pub status: String,
    /// Number of active rooms.
    pub rooms: usize,
}
