#![forbid(unsafe_code)]

//! Template composition
//!
//! Each resolved directive renders to one fragment; fragments are merged
//! into a prepend and an append bucket in invocation order and wrapped
//! around the clean text.

pub mod compositor;
pub mod fragment;

pub use compositor::{BLOCK_SEPARATOR, Bucket, Composition, Compositor, Fragment, compose};
pub use fragment::render_fragment;
