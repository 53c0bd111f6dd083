//! Encode driver - Encoder and FrameIter.
//!
//! Splits input into `symbol_size` chunks, groups them into blocks of K,
//! emits every chunk as a source frame and appends R repair frames per block.
//!
//! - [`Encoder`] - Configured encoder over an erasure codec
//! - [`FrameIter`] - Iterator that yields frames from a [`std::io::Read`] source
//! - [`encode`] - One-shot encode into a caller buffer
//!
//! # Example
//!
//! ```
//! use fecframe::{Encoder, FecConfig};
//!
//! let encoder = Encoder::new(FecConfig::new(16, 10, 2)?)?;
//! let wire = encoder.encode_bytes(b"hello, erasure coding")?;
//!
//! // 21 bytes -> 2 source symbols, 1 block, 2 repair symbols
//! assert_eq!(wire.len(), 4 * (8 + 16));
//! # Ok::<(), fecframe::FecError>(())
//! ```

mod block;
mod iter;

use std::io::Read;

use bytes::{Bytes, BytesMut};

pub use iter::FrameIter;

pub(crate) use self::block::BlockEncoder;
use crate::codec::{ErasureCodec, RaptorQCodec, SymbolEncoder};
use crate::config::FecConfig;
use crate::error::FecError;
use crate::frame::SymbolFrame;

/// An encoder that turns a byte stream into framed source and repair symbols.
///
/// `Encoder` is cheap to clone and holds no per-call state; every encode call
/// creates its own engine instance, so one `Encoder` may be shared by many
/// threads.
#[derive(Debug, Clone)]
pub struct Encoder<C = RaptorQCodec> {
    codec: C,
    config: FecConfig,
}

impl Encoder<RaptorQCodec> {
    /// Creates an encoder using the RaptorQ engine.
    ///
    /// # Errors
    ///
    /// Returns [`FecError::InvalidConfig`] if `config` does not validate.
    pub fn new(config: FecConfig) -> Result<Self, FecError> {
        Self::with_codec(RaptorQCodec::new(), config)
    }
}

impl<C: ErasureCodec> Encoder<C> {
    /// Creates an encoder using a custom engine.
    pub fn with_codec(codec: C, config: FecConfig) -> Result<Self, FecError> {
        config.validate()?;
        Ok(Self { codec, config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &FecConfig {
        &self.config
    }

    /// Returns the exact number of bytes encoding `input_len` bytes produces.
    ///
    /// Saturates at `usize::MAX`.
    pub fn encoded_len(&self, input_len: usize) -> usize {
        let source = input_len.div_ceil(self.config.symbol_size());
        let blocks = source.div_ceil(usize::from(self.config.block_symbols()));
        let repair_per_block = usize::try_from(self.config.repair_symbols()).unwrap_or(usize::MAX);

        blocks
            .saturating_mul(repair_per_block)
            .saturating_add(source)
            .saturating_mul(self.config.frame_len())
    }

    /// Encodes `input` into `output` and returns the number of bytes written.
    ///
    /// Frames are written in emission order: each block's source frames, then
    /// its repair frames. Empty input writes nothing.
    ///
    /// # Errors
    ///
    /// - [`FecError::OutputTooSmall`] if the next frame does not fit. Bytes
    ///   before that frame have been written; nothing is written past
    ///   `output.len()`.
    /// - [`FecError::Engine`] if the engine rejects a block or produces a
    ///   repair symbol of the wrong size.
    ///
    /// # Example
    ///
    /// ```
    /// use fecframe::{Encoder, FecConfig};
    ///
    /// let encoder = Encoder::new(FecConfig::new(8, 10, 1)?)?;
    /// let input = [7u8; 20];
    /// let mut output = vec![0u8; encoder.encoded_len(input.len())];
    ///
    /// let written = encoder.encode_to_slice(&input, &mut output)?;
    /// assert_eq!(written, output.len());
    /// # Ok::<(), fecframe::FecError>(())
    /// ```
    pub fn encode_to_slice(&self, input: &[u8], output: &mut [u8]) -> Result<usize, FecError> {
        let layout = self.config.layout();
        let frame_len = layout.frame_len();
        let mut dst = output;
        let mut written = 0;

        self.drive(input, |frame| {
            if dst.len() < frame_len {
                return Err(FecError::OutputTooSmall {
                    needed: frame_len,
                    available: dst.len(),
                });
            }
            frame.write_to(layout, &mut dst);
            written += frame_len;
            Ok(())
        })?;

        Ok(written)
    }

    /// Encodes `input` into a newly allocated buffer.
    pub fn encode_bytes(&self, input: &[u8]) -> Result<Bytes, FecError> {
        let layout = self.config.layout();
        let mut out = BytesMut::with_capacity(self.encoded_len(input.len()));

        self.drive(input, |frame| {
            frame.write_to(layout, &mut out);
            Ok(())
        })?;

        Ok(out.freeze())
    }

    /// Creates a frame iterator over a reader.
    ///
    /// The iterator reads lazily, one symbol at a time.
    ///
    /// # Example
    ///
    /// ```
    /// use std::io::Cursor;
    /// use fecframe::{Encoder, FecConfig};
    ///
    /// let encoder = Encoder::new(FecConfig::new(4, 10, 2)?)?;
    /// let frames: Vec<_> = encoder
    ///     .frames(Cursor::new(vec![1u8; 9]))?
    ///     .collect::<Result<_, _>>()?;
    ///
    /// // 3 source frames, then 2 repair frames with ids 10 and 11
    /// assert_eq!(frames.len(), 5);
    /// assert_eq!(frames[3].symbol_id, 10);
    /// # Ok::<(), fecframe::FecError>(())
    /// ```
    pub fn frames<R: Read>(&self, reader: R) -> Result<FrameIter<R, C::Encoder>, FecError> {
        Ok(FrameIter::new(
            reader,
            self.block_encoder()?,
            self.config.symbol_size(),
        ))
    }

    pub(crate) fn block_encoder(&self) -> Result<BlockEncoder<C::Encoder>, FecError> {
        let engine = self
            .codec
            .new_encoder(self.config.block_symbols(), self.config.symbol_size())
            .map_err(|e| FecError::engine(0, e))?;
        Ok(BlockEncoder::new(engine, &self.config))
    }

    /// Runs the block algorithm over an in-memory input.
    fn drive<F>(&self, input: &[u8], mut emit: F) -> Result<(), FecError>
    where
        F: FnMut(&SymbolFrame) -> Result<(), FecError>,
    {
        if input.is_empty() {
            return Ok(());
        }

        let mut block = self.block_encoder()?;
        for chunk in input.chunks(self.config.symbol_size()) {
            emit(&block.push_source(chunk)?)?;
            if block.is_full() {
                emit_repair(&mut block, &mut emit)?;
            }
        }
        if block.has_pending() {
            emit_repair(&mut block, &mut emit)?;
        }
        Ok(())
    }
}

fn emit_repair<E, F>(block: &mut BlockEncoder<E>, emit: &mut F) -> Result<(), FecError>
where
    E: SymbolEncoder,
    F: FnMut(&SymbolFrame) -> Result<(), FecError>,
{
    block.prepare_repair()?;
    for index in 0..block.repair_symbols() {
        emit(&block.repair_frame(index)?)?;
    }
    block.finish_block();
    Ok(())
}

/// Encodes `input` into `output` with the RaptorQ engine.
///
/// Shorthand for [`Encoder::new`] followed by [`Encoder::encode_to_slice`].
pub fn encode(config: FecConfig, input: &[u8], output: &mut [u8]) -> Result<usize, FecError> {
    Encoder::new(config)?.encode_to_slice(input, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::parity::ParityCodec;
    use crate::frame::{FrameLayout, FrameReader};

    fn parity_encoder(symbol_size: usize, k: u16, r: u32) -> Encoder<ParityCodec> {
        Encoder::with_codec(ParityCodec::new(), FecConfig::new(symbol_size, k, r).unwrap())
            .unwrap()
    }

    fn parse(wire: &[u8], symbol_size: usize) -> Vec<SymbolFrame<&[u8]>> {
        FrameReader::new(wire, FrameLayout::plain(symbol_size))
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_short_block_layout() {
        // 10 bytes, 4-byte symbols, K = 4, R = 2
        let input: Vec<u8> = (0..10).collect();
        let encoder = parity_encoder(4, 4, 2);
        let wire = encoder.encode_bytes(&input).unwrap();
        let frames = parse(&wire, 4);

        assert_eq!(frames.len(), 5);
        assert_eq!(frames[0].payload, &[0, 1, 2, 3]);
        assert_eq!(frames[1].payload, &[4, 5, 6, 7]);
        assert_eq!(frames[2].payload, &[8, 9, 0, 0]);
        assert_eq!(
            frames.iter().map(|f| f.symbol_id).collect::<Vec<_>>(),
            vec![0, 1, 2, 4, 5]
        );
        assert!(frames.iter().all(|f| f.block_index == 0));
    }

    #[test]
    fn test_block_indices_increment() {
        let input = vec![1u8; 4 * 4 * 2 + 1];
        let encoder = parity_encoder(4, 4, 1);
        let wire = encoder.encode_bytes(&input).unwrap();
        let frames = parse(&wire, 4);

        let blocks: Vec<u32> = frames.iter().map(|f| f.block_index).collect();
        assert_eq!(blocks, vec![0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 2, 2]);
        assert_eq!(wire.len(), encoder.encoded_len(input.len()));
    }

    #[test]
    fn test_empty_input() {
        let encoder = parity_encoder(4, 4, 2);
        assert!(encoder.encode_bytes(&[]).unwrap().is_empty());
        assert_eq!(encoder.encode_to_slice(&[], &mut []).unwrap(), 0);
        assert_eq!(encoder.encoded_len(0), 0);
    }

    #[test]
    fn test_output_one_byte_short() {
        let input: Vec<u8> = (0..10).collect();
        let encoder = parity_encoder(4, 4, 2);
        let needed = encoder.encoded_len(input.len());

        let mut output = vec![0xEEu8; needed];
        let (head, tail) = output.split_at_mut(needed - 1);
        assert!(matches!(
            encoder.encode_to_slice(&input, head),
            Err(FecError::OutputTooSmall {
                needed: 12,
                available: 11
            })
        ));
        assert_eq!(tail, &[0xEE], "wrote past capacity");
    }

    #[test]
    fn test_slice_matches_bytes() {
        let input: Vec<u8> = (0..=255).collect();
        let encoder = parity_encoder(8, 4, 3);
        let mut output = vec![0u8; encoder.encoded_len(input.len())];
        let written = encoder.encode_to_slice(&input, &mut output).unwrap();

        assert_eq!(written, output.len());
        assert_eq!(&output[..], &encoder.encode_bytes(&input).unwrap()[..]);
    }

    #[test]
    fn test_frames_matches_bytes() {
        let input: Vec<u8> = (0..37).collect();
        let encoder = parity_encoder(4, 3, 2);
        let layout = encoder.config().layout();

        let mut streamed = BytesMut::new();
        for frame in encoder.frames(std::io::Cursor::new(&input)).unwrap() {
            frame.unwrap().write_to(layout, &mut streamed);
        }
        assert_eq!(streamed.freeze(), encoder.encode_bytes(&input).unwrap());
    }

    #[test]
    fn test_zero_repair_symbols() {
        let input = vec![3u8; 12];
        let encoder = parity_encoder(4, 2, 0);
        let wire = encoder.encode_bytes(&input).unwrap();
        let frames = parse(&wire, 4);
        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|f| f.symbol_id < 2));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = FecConfig::default().with_symbol_size(0);
        assert!(matches!(
            Encoder::with_codec(ParityCodec::new(), config),
            Err(FecError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_raptorq_encode_layout() {
        let input = vec![0x5Au8; 100];
        let config = FecConfig::new(16, 10, 3).unwrap();
        let mut output = vec![0u8; 512];
        let written = encode(config, &input, &mut output).unwrap();

        // 7 source frames + 3 repair frames
        assert_eq!(written, 10 * 24);
        let frames = parse(&output[..written], 16);
        assert_eq!(frames[7].symbol_id, 10);
        assert_eq!(frames[9].symbol_id, 12);
    }
}
