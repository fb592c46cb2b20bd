//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout, title and status bars, overlays
//! - `input`: keyboard event handling
//! - `styles`: colour scheme and text styling
//! - `screens`: one renderer per client route

pub mod input;
pub mod render;
pub mod screens;
pub mod styles;
