//! UI / rendering layer: everything that touches Ratatui widgets.
//!
//! This layer takes the *core* gallery state and turns it into cells on
//! the terminal.  No filesystem I/O happens here.

pub mod gallery_widget;
pub mod layout;
pub mod spinner;
pub mod theme;
