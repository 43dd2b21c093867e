//! Pointer-reactive visual effects for the web: a spring-smoothed custom cursor,
//! code-glyph trails, click bursts and an ambient background field, drawn on
//! canvas by a Yew front end.

pub mod components;
pub mod config;
pub mod error;
pub mod model;
pub mod render;
pub mod session;
pub mod state;
pub mod util;

pub use config::{EngineConfig, Profile};
pub use error::{FxError, Result};
pub use session::TrackingSession;
pub use state::FxScene;
