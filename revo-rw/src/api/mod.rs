//! HTTP API handlers for revo-rw

pub mod health;
pub mod returns;
pub mod sse;

pub use health::health_routes;
pub use returns::return_routes;
pub use sse::return_event_stream;
