//! Wire payloads exchanged with clients.

pub mod health;
pub mod public;
pub mod validation;
pub mod ws;
