//! Diagram source editing.
//!
//! A rope-backed text buffer with cursor management, driven by the app's
//! update loop.

mod buffer;

pub use buffer::{Cursor, Direction, INDENT, SourceBuffer};
