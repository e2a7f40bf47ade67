//! Event-ingestion and session-synchronization core for a live chess
//! client.
//!
//! Two reader threads feed typed events from the server's lobby and game
//! streams into a shared queue; a single dispatcher loop drains it on a
//! fixed tick, reconciles the authoritative move list against local state,
//! estimates the clocks between snapshots, and emits render commands to a
//! pluggable display surface.

pub mod board_view;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod display;
pub mod error;
pub mod events;
pub mod queue;
pub mod reader;
pub mod reconcile;
pub mod runtime;
pub mod session;

pub use config::{Config, ConfigError};
pub use dispatch::SessionDispatcher;
pub use display::{DisplaySurface, TerminalSurface};
pub use error::{CoreError, CoreResult};
pub use events::{InboundEvent, RenderCommand, UiCommand};
pub use runtime::Runtime;
