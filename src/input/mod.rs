//! Gesture input pipeline
//!
//! - `events`: parsing of raw gesture event lines
//! - `gestures`: the gesture engine and its single active session
//! - `classify`: swipe and pinch motion discrimination
//! - `delay`: settle-time arbitration for generic drag hooks
//! - `actions`: resolved actions and how they are executed
//! - `workspace`: the `_internal` workspace switching command

pub mod actions;
pub mod classify;
pub mod delay;
pub mod events;
pub mod gestures;
pub mod workspace;

// Re-export commonly used types
pub use actions::{Action, ActionSink, DryRun, Launcher};
pub use events::{parse_line, EventError, EventKind, RawEvent};
pub use gestures::{EngineSettings, GestureEngine, GestureSession, PayloadError};
