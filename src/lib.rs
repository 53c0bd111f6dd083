//! fecframe
//!
//! Block-oriented forward error correction framing for Rust.
//!
//! `fecframe` splits a byte stream into fixed-size symbols, groups them into
//! blocks of K, has an erasure-coding engine produce R repair symbols per
//! block and frames every symbol with an 8-byte header. The receiver
//! rebuilds the original bytes from any sufficient subset of frames, in any
//! order.
//!
//! The crate intentionally:
//! - does NOT move bytes over a network
//! - does NOT do congestion control or retransmission
//! - does NOT encrypt
//! - does NOT describe its parameters on the wire
//!
//! Sender and receiver must agree on [`FecConfig`] out of band, and the
//! receiver must know the original byte count.
//!
//! # Wire format
//!
//! ```text
//! offset 0: block_index (u32 LE)
//! offset 4: symbol_id   (u32 LE)   0..K source, K..K+R repair
//! offset 8: payload     (symbol_size bytes)
//! ```
//!
//! # Round trip
//!
//! ```
//! use fecframe::{Decoder, Encoder, FecConfig, FrameReader};
//!
//! let config = FecConfig::new(64, 10, 4)?;
//! let data: Vec<u8> = (0..2000u32).map(|i| (i * 31) as u8).collect();
//!
//! let wire = Encoder::new(config)?.encode_bytes(&data)?;
//!
//! // Lose every source frame with symbol id 3
//! let mut decoder = Decoder::new(config, data.len())?;
//! for frame in FrameReader::new(&wire, config.layout()) {
//!     let frame = frame?;
//!     if frame.symbol_id != 3 {
//!         decoder.ingest_frame(frame)?;
//!     }
//! }
//! assert_eq!(decoder.finish()?, data);
//! # Ok::<(), fecframe::FecError>(())
//! ```
//!
//! # Streaming
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::Write;
//! use fecframe::{Encoder, FecConfig, FecError};
//!
//! fn main() -> Result<(), FecError> {
//!     let config = FecConfig::default();
//!     let encoder = Encoder::new(config)?;
//!     let mut out = File::create("data.fec")?;
//!
//!     for frame in encoder.frames(File::open("data.bin")?)? {
//!         out.write_all(&frame?.to_bytes(config.layout()))?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `hash-blake3` (default): optional per-frame BLAKE3 digest trailer,
//!   enabled with `FecConfig::with_frame_digest`
//! - `async-io`: `encode_async` over `futures_io::AsyncRead`
//! - `ffi`: C entry points in the `ffi` module

#![cfg_attr(not(feature = "ffi"), forbid(unsafe_code))]
#![cfg_attr(feature = "ffi", deny(unsafe_code))]
#![warn(missing_docs)]

mod catalog;
mod codec;
mod config;
mod decoder;
mod encoder;
mod error;
mod frame;

mod buffer; // internal (thread-local reuse)
mod hash; // internal blake3 digest

#[cfg(feature = "async-io")]
mod async_stream;

#[cfg(feature = "ffi")]
pub mod ffi;

//
// Public surface
//

pub use catalog::BlockSizeCatalog;
pub use codec::{
    AddOutcome, ErasureCodec, RaptorQCodec, RaptorQDecoder, RaptorQEncoder, SymbolDecoder,
    SymbolEncoder, list_block_sizes,
};
pub use config::{FecConfig, MAX_SYMBOL_SIZE};
pub use decoder::{BlockPhase, DecodeStats, Decoder, decode, decode_with};
pub use encoder::{Encoder, FrameIter, encode};
pub use error::{EngineError, FecError};
pub use frame::{DIGEST_LEN, FrameLayout, FrameReader, HEADER_LEN, SymbolFrame};

#[cfg(feature = "async-io")]
pub use async_stream::{FrameStream, encode_async};
