//! Application orchestration: state management, event loop, input handling
//! and background image loads.

pub mod event;
pub mod handler;
pub mod load_runtime;
pub mod state;
