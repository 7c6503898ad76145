//! rinse-export: Pure renderers and serializers (sans-IO)
//!
//! Encodes candidates as PNG and renders the preview images: per-candidate
//! thumbnails, a contact sheet with the selection framed, and a
//! source-over-selection comparison.

pub mod png;
pub mod preview;

pub use png::{ExportError, encode_png, encode_png_rgba};
pub use preview::{contact_sheet, side_by_side, thumbnail};
