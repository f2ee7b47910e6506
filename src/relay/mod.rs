//! Tracking pixel surface.

pub mod handlers;
pub mod routes;

pub use handlers::{RelayState, TrackQuery};
pub use routes::create_relay_router;
