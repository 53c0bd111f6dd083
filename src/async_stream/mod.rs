//! Async streaming support for encoding.
//!
//! Encodes from a `futures_io::AsyncRead`, so any runtime works (tokio via
//! `tokio_util::compat`, async-std, smol).
//!
//! - [`encode_async`] - Creates an async stream of frames from an async reader
//! - [`FrameStream`] - The stream type
//!
//! This module requires the `async-io` feature to be enabled.

mod stream;

pub use stream::{FrameStream, encode_async};
