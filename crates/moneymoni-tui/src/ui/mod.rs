//! Terminal UI module using ratatui.
//!
//! - `render`: Frame layout, navigation chrome, and overlays
//! - `input`: Keyboard event handling
//! - `styles`: Color scheme and text styling
//! - `tabs`: Per-page content (dashboard, transactions, etc.)

pub mod input;
pub mod render;
pub mod styles;
pub mod tabs;
