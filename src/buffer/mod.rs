//! Internal scratch buffer reuse.
//!
//! Symbol-sized scratch space is needed once per block by the reader-driven
//! encoder and the decoder's extraction loop. A thread-local pool keeps those
//! allocations from repeating across calls. Not part of the public API.

mod pool;

pub(crate) use pool::Buffer;
