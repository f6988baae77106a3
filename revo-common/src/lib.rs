//! # REVO Common Library
//!
//! Shared code for the REVO return-verification services including:
//! - Error taxonomy (`Error` enum, `Result` alias)
//! - Workflow event types (`ReturnEvent`) and the broadcast `EventBus`
//! - Configuration loading with graceful degradation

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
