//! Report intake and routing for rough-sleeper outreach.
//!
//! [`dispatch`] holds the pure decision engine (risk tiering, nearest
//! organisation search, routing rules). [`intake`] wraps it in a service that
//! talks to the weather and geocoding collaborators and records the outcome.

pub mod config;
pub mod directory;
pub mod dispatch;
pub mod error;
pub mod intake;
pub mod integrations;
pub mod telemetry;
