//! rinse-io: Filesystem I/O and session state for rinse.
//!
//! Owns everything that touches the disk: loading the source image,
//! exporting the selected candidate, and writing candidate and preview
//! files. The pipeline and renderers it drives stay sans-IO.

pub mod files;
pub mod session;

pub use files::{write_atomic, write_candidates, write_previews};
pub use session::{Session, SessionError};
