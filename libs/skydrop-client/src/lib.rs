//! Skydrop cloud API client
//!
//! Async client for the Skydrop sprinkler service: OAuth token grants and
//! refresh, controller/zone state, and the watering action endpoints.

pub mod client;
pub mod error;
pub mod models;

pub use client::SkydropClient;
pub use error::Error;
pub use models::{Controller, TokenData, Zone, ZoneStatus};
