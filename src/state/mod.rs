//! Client-side cached state
//!
//! Slices are plain records updated by pure reducer functions over
//! immutable snapshots, callable and testable without any rendering layer.
//! The session slice lives in `crate::session` (it carries persistence);
//! this module holds the file-collection slice.

pub mod files;

pub use files::{FileAction, FileState, RequestSequence};
