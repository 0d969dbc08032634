//! Core gallery engine – scrolling, wrap-around layout, arc bending,
//! texture preparation and image loading.
//!
//! Nothing in this module depends on any TUI or rendering crate.
//! Loaded textures are `Send + Sync` so workers can hand them back across
//! threads.

pub mod bend;
pub mod gallery;
pub mod item;
pub mod layout;
pub mod loader;
pub mod scroll;
pub mod texture;
