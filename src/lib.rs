//! Core engine for a chat-bot playlist system: multi-source track query
//! resolution and range-addressed playlist management. The chat transport,
//! provider clients, and persistence are collaborators behind traits.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{EngineError, Result};
