//! QR image rendering
//!
//! Pure functions from (payload, rendering options) to a base64-encoded PNG.
//! No network or disk I/O happens here; errors are surfaced to the caller.

pub mod color;
pub mod renderer;

pub use color::parse_color;
pub use renderer::{render_png_base64, QrRenderError};
