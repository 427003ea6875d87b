//! Shared application state.

pub mod connections;
pub mod deck;
pub mod game;
pub mod registry;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::state::connections::{ConnectionMap, TimerRegistry};
use crate::state::registry::RoomRegistry;

/// Shared reference to the application state.
pub type SharedState = Arc<AppState>;

/// Everything the routers and services share: the card dataset, active
/// rooms, live connections, and pending grace-period timers.
#[derive(Debug)]
pub struct AppState {
    config: AppConfig,
    rooms: RoomRegistry,
    connections: ConnectionMap,
    timers: TimerRegistry,
}

impl AppState {
    /// Build the shared state from loaded configuration.
    pub fn new(config: AppConfig) -> SharedState {
        Arc::new(Self {
            config,
            rooms: RoomRegistry::new(),
            connections: ConnectionMap::new(),
            timers: TimerRegistry::new(),
        })
    }

    /// Loaded configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Active room registry.
    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    /// Live connection registry.
    pub fn connections(&self) -> &ConnectionMap {
        &self.connections
    }

    /// Pending grace-period timers.
    pub fn timers(&self) -> &TimerRegistry {
        &self.timers
    }
}
