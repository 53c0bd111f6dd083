//! Decode driver - Decoder and the per-block decoder pool.
//!
//! Reassembles the original bytes from any sufficient subset of frames, in
//! any arrival order:
//!
//! 1. **Ingest**: frames are routed by block index to lazily created
//!    decoders. Frames for blocks already emitted are discarded.
//! 2. **Pad**: a short final block is completed with zero placeholder
//!    symbols for the source slots that hold no real data.
//! 3. **Emit**: blocks are reconstructed and copied out strictly in index
//!    order; each block's decoder is released as soon as its bytes are out.
//!
//! - [`Decoder`] - Incremental decoder
//! - [`DecodeStats`] - Counters collected while decoding
//! - [`BlockPhase`] - Per-block lifecycle
//! - [`decode`] - One-shot decode into a caller buffer
//!
//! The expected length of block `i` is `min(K * symbol_size, total_bytes -
//! i * K * symbol_size)`, so blocks may arrive in any order and a frame for a
//! block past the end of the stream is rejected on arrival.

mod pool;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, trace, warn};

pub use pool::BlockPhase;

use self::pool::{BlockState, DecoderPool, Entry};
use crate::buffer::Buffer;
use crate::codec::{AddOutcome, ErasureCodec, RaptorQCodec, SymbolDecoder};
use crate::config::FecConfig;
use crate::error::FecError;
use crate::frame::{FrameReader, SymbolFrame};

/// Counters collected while decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Frames the engine stored.
    pub frames_accepted: u64,

    /// Frames discarded as duplicates, surplus, or for already emitted blocks.
    pub frames_redundant: u64,

    /// Frames dropped because their digest did not match.
    pub frames_corrupt: u64,

    /// Zero placeholder symbols fed to complete a short final block.
    pub padding_symbols: u64,

    /// Blocks reconstructed and copied out.
    pub blocks_emitted: u32,

    /// Largest number of blocks holding a decoder at the same time.
    pub peak_live_decoders: usize,
}

/// An incremental decoder for one framed stream.
///
/// Feed frames with [`ingest`](Self::ingest) or
/// [`ingest_frame`](Self::ingest_frame), optionally pull completed leading
/// blocks out early with [`drain_ready`](Self::drain_ready), and finish with
/// [`finish_into`](Self::finish_into) or [`finish`](Self::finish).
///
/// # Example
///
/// ```
/// use fecframe::{Decoder, Encoder, FecConfig};
///
/// let config = FecConfig::new(32, 10, 4)?;
/// let data: Vec<u8> = (0..1000u32).map(|i| i as u8).collect();
/// let wire = Encoder::new(config)?.encode_bytes(&data)?;
///
/// let mut decoder = Decoder::new(config, data.len())?;
/// decoder.ingest(&wire)?;
/// assert_eq!(decoder.finish()?, data);
/// # Ok::<(), fecframe::FecError>(())
/// ```
#[derive(Debug)]
pub struct Decoder<C: ErasureCodec = RaptorQCodec> {
    codec: C,
    config: FecConfig,
    total_bytes: usize,
    block_count: u32,
    pool: DecoderPool<C::Decoder>,
    next_block: u32,
    emitted: usize,
    tail_padded: bool,
    stats: DecodeStats,
}

impl Decoder<RaptorQCodec> {
    /// Creates a RaptorQ decoder for a stream of `total_bytes` bytes.
    ///
    /// # Errors
    ///
    /// - [`FecError::InvalidConfig`] if `config` does not validate or
    ///   `total_bytes` is zero.
    /// - [`FecError::UnsupportedBlockSize`] if K is not a RaptorQ K'.
    pub fn new(config: FecConfig, total_bytes: usize) -> Result<Self, FecError> {
        Self::with_codec(RaptorQCodec::new(), config, total_bytes)
    }
}

impl<C: ErasureCodec> Decoder<C> {
    /// Creates a decoder using a custom engine.
    pub fn with_codec(codec: C, config: FecConfig, total_bytes: usize) -> Result<Self, FecError> {
        config.validate()?;
        if total_bytes == 0 {
            return Err(FecError::InvalidConfig {
                message: "total_bytes must be non-zero",
            });
        }
        if !codec.catalog().contains(config.block_symbols()) {
            return Err(FecError::UnsupportedBlockSize {
                block_symbols: config.block_symbols(),
            });
        }

        let block_count = u32::try_from(total_bytes.div_ceil(config.block_len()))
            .map_err(|_| FecError::TooManyBlocks)?;

        debug!(
            total_bytes,
            block_count,
            symbol_size = config.symbol_size(),
            block_symbols = config.block_symbols(),
            "decoder created"
        );

        Ok(Self {
            codec,
            config,
            total_bytes,
            block_count,
            pool: DecoderPool::new(),
            next_block: 0,
            emitted: 0,
            tail_padded: false,
            stats: DecodeStats::default(),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &FecConfig {
        &self.config
    }

    /// Returns the number of blocks the stream consists of.
    pub fn block_count(&self) -> u32 {
        self.block_count
    }

    /// Returns the number of output bytes not yet emitted.
    pub fn remaining(&self) -> usize {
        self.total_bytes - self.emitted
    }

    /// Returns true once every byte has been emitted.
    pub fn is_complete(&self) -> bool {
        self.emitted == self.total_bytes
    }

    /// Returns the phase of block `index`, or `None` if no frame for it arrived.
    pub fn block_phase(&self, index: u32) -> Option<BlockPhase> {
        self.pool.phase(index)
    }

    /// Returns the counters collected so far.
    pub fn stats(&self) -> DecodeStats {
        DecodeStats {
            peak_live_decoders: self.pool.peak_live(),
            ..self.stats
        }
    }

    /// Returns the number of blocks currently holding a decoder.
    pub fn live_decoders(&self) -> usize {
        self.pool.live()
    }

    /// Ingests a buffer of concatenated frames.
    ///
    /// With frame digests enabled, frames that fail verification are counted
    /// and skipped.
    ///
    /// # Errors
    ///
    /// - [`FecError::TruncatedFrame`] if `input` ends mid-frame. Frames before
    ///   the partial one have been ingested.
    /// - Any error of [`ingest_frame`](Self::ingest_frame).
    pub fn ingest(&mut self, input: &[u8]) -> Result<(), FecError> {
        for frame in FrameReader::new(input, self.config.layout()) {
            match frame {
                Ok(frame) => self.ingest_frame(frame)?,
                Err(FecError::CorruptFrame {
                    block_index,
                    symbol_id,
                }) => {
                    self.stats.frames_corrupt += 1;
                    warn!(block_index, symbol_id, "discarding frame with bad digest");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Ingests a single frame.
    ///
    /// # Errors
    ///
    /// - [`FecError::UnexpectedBlock`] if the block index lies past the end
    ///   of the stream.
    /// - [`FecError::Engine`] if the engine rejects the symbol.
    pub fn ingest_frame<P: AsRef<[u8]>>(&mut self, frame: SymbolFrame<P>) -> Result<(), FecError> {
        let block_index = frame.block_index;
        if block_index >= self.block_count {
            return Err(FecError::UnexpectedBlock {
                block_index,
                block_count: self.block_count,
            });
        }

        let expected_len = self.expected_len(block_index);
        let codec = &self.codec;
        let config = &self.config;
        let entry = self.pool.entry_or_create(block_index, || {
            trace!(block_index, expected_len, "creating block decoder");
            codec
                .new_decoder(config.block_symbols(), config.symbol_size())
                .map(|decoder| BlockState::new(decoder, expected_len))
                .map_err(|e| FecError::engine(block_index, e))
        })?;

        let state = match entry {
            Entry::Active(state) => state,
            Entry::Freed => {
                trace!(block_index, symbol_id = frame.symbol_id, "frame for emitted block");
                self.stats.frames_redundant += 1;
                return Ok(());
            }
        };

        let outcome = state
            .decoder
            .add_symbol(frame.symbol_id, frame.payload())
            .map_err(|e| FecError::engine(block_index, e))?;
        match outcome {
            AddOutcome::Accepted => self.stats.frames_accepted += 1,
            AddOutcome::NotNeeded => self.stats.frames_redundant += 1,
        }

        if state.phase == BlockPhase::Collecting && state.decoder.needed() == 0 {
            state.phase = BlockPhase::Ready;
            debug!(block_index, "block ready");
        }
        Ok(())
    }

    /// Emits leading blocks that are ready, in order, into `out`.
    ///
    /// Stops at the first block that is missing or still collecting. Returns
    /// the number of bytes written.
    ///
    /// # Errors
    ///
    /// - [`FecError::OutputTooSmall`] if `out` cannot take the next block.
    /// - [`FecError::Engine`] if reconstruction fails.
    pub fn drain_ready<B: BufMut>(&mut self, out: &mut B) -> Result<usize, FecError> {
        let mut written = 0;
        while self.next_block < self.block_count {
            let ready = matches!(
                self.pool.get_mut(self.next_block),
                Some(state) if state.phase == BlockPhase::Ready
            );
            if !ready {
                break;
            }
            written += self.emit_next(out)?;
        }
        Ok(written)
    }

    /// Completes the short final block and emits every remaining block into `out`.
    ///
    /// Returns the number of bytes written by this call.
    ///
    /// # Errors
    ///
    /// - [`FecError::MissingBlock`] if a block never received any frame.
    /// - [`FecError::OutputTooSmall`] if `out` cannot take the next block.
    /// - [`FecError::Engine`] if a block cannot be reconstructed.
    pub fn finish_into<B: BufMut>(&mut self, out: &mut B) -> Result<usize, FecError> {
        self.pad_tail()?;

        let mut written = 0;
        while self.next_block < self.block_count {
            written += self.emit_next(out)?;
        }
        Ok(written)
    }

    /// Finishes decoding and returns the bytes not yet drained.
    pub fn finish(mut self) -> Result<Bytes, FecError> {
        let mut out = BytesMut::with_capacity(self.remaining());
        self.finish_into(&mut out)?;
        Ok(out.freeze())
    }

    fn expected_len(&self, block_index: u32) -> usize {
        let block_len = self.config.block_len();
        let start = block_index as usize * block_len;
        block_len.min(self.total_bytes - start)
    }

    /// Feeds zero placeholders for the unused source slots of a short final block.
    fn pad_tail(&mut self) -> Result<(), FecError> {
        if self.tail_padded {
            return Ok(());
        }
        self.tail_padded = true;

        let last = self.block_count - 1;
        let expected_len = self.expected_len(last);
        if expected_len == self.config.block_len() {
            return Ok(());
        }

        let symbol_size = self.config.symbol_size();
        let block_symbols = u32::from(self.config.block_symbols());
        let Some(state) = self.pool.get_mut(last) else {
            return Ok(());
        };

        // expected_len < K * symbol_size, so seen < K
        let seen = expected_len.div_ceil(symbol_size) as u32;
        let zeros = Buffer::take(symbol_size);
        let mut padded = 0;
        for symbol_id in seen..block_symbols {
            if state.decoder.needed() == 0 {
                break;
            }
            let outcome = state
                .decoder
                .add_symbol(symbol_id, &zeros)
                .map_err(|e| FecError::engine(last, e))?;
            if outcome == AddOutcome::Accepted {
                padded += 1;
            }
        }

        if state.phase == BlockPhase::Collecting && state.decoder.needed() == 0 {
            state.phase = BlockPhase::Ready;
        }
        self.stats.padding_symbols += padded;
        debug!(block_index = last, seen, padded, "padded short final block");
        Ok(())
    }

    /// Reconstructs block `next_block`, copies its bytes out and frees it.
    fn emit_next<B: BufMut>(&mut self, out: &mut B) -> Result<usize, FecError> {
        let block_index = self.next_block;
        let symbol_size = self.config.symbol_size();
        let state = self
            .pool
            .get_mut(block_index)
            .ok_or(FecError::MissingBlock { block_index })?;

        if out.remaining_mut() < state.expected_len {
            return Err(FecError::OutputTooSmall {
                needed: state.expected_len,
                available: out.remaining_mut(),
            });
        }

        state
            .decoder
            .wait()
            .map_err(|e| FecError::engine(block_index, e))?;
        state.phase = BlockPhase::Decoded;

        let mut scratch = Buffer::take(symbol_size);
        let mut remaining = state.expected_len;
        for index in 0..self.config.block_symbols() {
            if remaining == 0 {
                break;
            }
            state
                .decoder
                .source_symbol(index, &mut scratch)
                .map_err(|e| FecError::engine(block_index, e))?;
            let n = remaining.min(symbol_size);
            out.put_slice(&scratch[..n]);
            remaining -= n;
        }

        let written = state.expected_len;
        self.pool.free(block_index);
        self.next_block += 1;
        self.emitted += written;
        self.stats.blocks_emitted += 1;

        debug!(
            block_index,
            bytes = written,
            live = self.pool.live(),
            "block emitted"
        );
        Ok(written)
    }
}

/// Decodes `input` into `output` with the RaptorQ engine.
///
/// Returns `total_bytes`, the number of bytes written.
///
/// # Example
///
/// ```
/// use fecframe::{FecConfig, decode, encode};
///
/// let config = FecConfig::new(8, 10, 2)?;
/// let data = b"forward error correction";
///
/// let mut wire = vec![0u8; 1024];
/// let n = encode(config, data, &mut wire)?;
///
/// let mut out = vec![0u8; data.len()];
/// decode(config, data.len(), &wire[..n], &mut out)?;
/// assert_eq!(&out, data);
/// # Ok::<(), fecframe::FecError>(())
/// ```
pub fn decode(
    config: FecConfig,
    total_bytes: usize,
    input: &[u8],
    output: &mut [u8],
) -> Result<usize, FecError> {
    decode_with(RaptorQCodec::new(), config, total_bytes, input, output)
}

/// Decodes `input` into `output` with a custom engine.
pub fn decode_with<C: ErasureCodec>(
    codec: C,
    config: FecConfig,
    total_bytes: usize,
    input: &[u8],
    output: &mut [u8],
) -> Result<usize, FecError> {
    if output.len() < total_bytes {
        return Err(FecError::OutputTooSmall {
            needed: total_bytes,
            available: output.len(),
        });
    }

    let mut decoder = Decoder::with_codec(codec, config, total_bytes)?;
    decoder.ingest(input)?;

    let mut dst = &mut output[..total_bytes];
    decoder.finish_into(&mut dst)
}
