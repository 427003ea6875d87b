//! Health reporting.

use crate::{dto::health::HealthResponse, state::SharedState};

/// Build the current health payload.
pub fn health_status(state: &SharedState) -> HealthResponse {
    HealthResponse {
        status: "ok".into(),
        rooms: state.rooms().len(),
    }
}
