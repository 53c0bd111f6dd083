//! RFC 6330 (RaptorQ) engine backed by the `raptorq` crate.

use std::collections::HashSet;
use std::fmt;
use std::iter;
use std::sync::OnceLock;

use bytes::Bytes;
use raptorq::{
    EncodingPacket, ObjectTransmissionInformation, PayloadId, SourceBlockDecoder,
    SourceBlockEncoder, SourceBlockEncodingPlan,
};
use tracing::trace;

use super::{AddOutcome, ErasureCodec, SymbolDecoder, SymbolEncoder};
use crate::catalog::BlockSizeCatalog;
use crate::error::EngineError;

/// Largest number of source symbols per block RFC 6330 allows.
pub const MAX_BLOCK_SYMBOLS: u16 = 56403;

/// Internal symbol ids are 24 bits wide in RFC 6330 payload ids.
const SYMBOL_ID_LIMIT: u32 = 1 << 24;

/// The RFC 6330 K' values, built on first use.
fn catalog() -> &'static BlockSizeCatalog {
    static CATALOG: OnceLock<BlockSizeCatalog> = OnceLock::new();

    CATALOG.get_or_init(|| {
        let mut sizes = Vec::new();
        let mut k = 1u32;
        while k <= u32::from(MAX_BLOCK_SYMBOLS) {
            let extended = raptorq::extended_source_block_symbols(k);
            if let Ok(size) = u16::try_from(extended) {
                sizes.push(size);
            }
            k = extended + 1;
        }
        BlockSizeCatalog::from_sizes(sizes)
    })
}

/// Copies the RaptorQ block size catalog into `into`.
///
/// With `None`, returns the number of supported sizes. Otherwise copies at
/// most `capacity` sizes in ascending order and returns how many were copied.
///
/// # Example
///
/// ```
/// let total = fecframe::list_block_sizes(None, 0);
/// let mut sizes = vec![0u16; total as usize];
/// assert_eq!(fecframe::list_block_sizes(Some(&mut sizes), total), total);
/// assert_eq!(sizes[0], 10);
/// ```
pub fn list_block_sizes(into: Option<&mut [u16]>, capacity: u32) -> u32 {
    catalog().list_into(into, capacity)
}

/// Validates parameters and returns the symbol size as the engine's `u16`.
fn check_params(block_symbols: u16, symbol_size: usize) -> Result<u16, EngineError> {
    let unsupported = EngineError::Unsupported {
        block_symbols,
        symbol_size,
    };
    if block_symbols == 0 || block_symbols > MAX_BLOCK_SYMBOLS || symbol_size == 0 {
        return Err(unsupported);
    }
    u16::try_from(symbol_size).map_err(|_| unsupported)
}

fn transmission_info(block_symbols: u16, symbol_size: u16) -> ObjectTransmissionInformation {
    let transfer_length = u64::from(block_symbols) * u64::from(symbol_size);
    ObjectTransmissionInformation::new(transfer_length, symbol_size, 1, 1, 1)
}

/// Number of padding symbols RFC 6330 inserts between source and repair ids.
fn padding_symbols(block_symbols: u16) -> u32 {
    let k = u32::from(block_symbols);
    raptorq::extended_source_block_symbols(k) - k
}

/// RaptorQ erasure codec.
///
/// Supports every K in the RFC 6330 systematic index table (10 to 56403)
/// and symbol sizes up to 65535 bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RaptorQCodec;

impl RaptorQCodec {
    /// Creates the codec.
    pub const fn new() -> Self {
        Self
    }
}

impl ErasureCodec for RaptorQCodec {
    type Encoder = RaptorQEncoder;
    type Decoder = RaptorQDecoder;

    fn catalog(&self) -> &BlockSizeCatalog {
        catalog()
    }

    fn new_encoder(
        &self,
        block_symbols: u16,
        symbol_size: usize,
    ) -> Result<RaptorQEncoder, EngineError> {
        let symbol_size = check_params(block_symbols, symbol_size)?;
        Ok(RaptorQEncoder {
            block_symbols,
            padding: padding_symbols(block_symbols),
            oti: transmission_info(block_symbols, symbol_size),
            plan: SourceBlockEncodingPlan::generate(block_symbols),
            block: Vec::with_capacity(usize::from(block_symbols) * usize::from(symbol_size)),
            symbol_size,
            loaded: false,
            inner: None,
        })
    }

    fn new_decoder(
        &self,
        block_symbols: u16,
        symbol_size: usize,
    ) -> Result<RaptorQDecoder, EngineError> {
        let ss = check_params(block_symbols, symbol_size)?;
        let oti = transmission_info(block_symbols, ss);
        Ok(RaptorQDecoder {
            inner: SourceBlockDecoder::new2(0, &oti, oti.transfer_length()),
            block_symbols,
            padding: padding_symbols(block_symbols),
            symbol_size,
            received: HashSet::new(),
            decoded: None,
        })
    }
}

/// Per-block RaptorQ encoder.
///
/// The encoding plan depends only on K and is generated once; every block
/// reuses it.
pub struct RaptorQEncoder {
    block_symbols: u16,
    symbol_size: u16,
    padding: u32,
    oti: ObjectTransmissionInformation,
    plan: SourceBlockEncodingPlan,
    block: Vec<u8>,
    loaded: bool,
    inner: Option<SourceBlockEncoder>,
}

impl fmt::Debug for RaptorQEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RaptorQEncoder")
            .field("block_symbols", &self.block_symbols)
            .field("symbol_size", &self.symbol_size)
            .field("loaded", &self.loaded)
            .field("precomputed", &self.inner.is_some())
            .finish()
    }
}

impl SymbolEncoder for RaptorQEncoder {
    fn load(&mut self, block: &[u8]) -> Result<(), EngineError> {
        let expected = usize::from(self.block_symbols) * usize::from(self.symbol_size);
        if block.len() != expected {
            return Err(EngineError::PayloadLength {
                expected,
                actual: block.len(),
            });
        }

        self.block.clear();
        self.block.extend_from_slice(block);
        self.loaded = true;
        self.inner = None;
        Ok(())
    }

    fn precompute(&mut self) -> Result<(), EngineError> {
        if !self.loaded {
            return Err(EngineError::NotLoaded);
        }

        self.inner = Some(SourceBlockEncoder::with_encoding_plan2(
            0,
            &self.oti,
            &self.block,
            &self.plan,
        ));
        Ok(())
    }

    fn repair_symbol(&mut self, index: u32) -> Result<Bytes, EngineError> {
        let inner = self.inner.as_ref().ok_or(EngineError::NotLoaded)?;

        // raptorq numbers repair symbols from K', not K
        let isi = u32::from(self.block_symbols)
            .checked_add(self.padding)
            .and_then(|base| base.checked_add(index))
            .filter(|&isi| isi < SYMBOL_ID_LIMIT);
        if isi.is_none() {
            return Err(EngineError::SymbolId {
                symbol_id: u32::from(self.block_symbols).saturating_add(index),
            });
        }

        inner
            .repair_packets(index, 1)
            .into_iter()
            .next()
            .map(|packet| Bytes::copy_from_slice(packet.data()))
            .ok_or(EngineError::PrecomputeFailed {
                reason: "engine produced no repair packet",
            })
    }

    fn clear(&mut self) {
        self.block.clear();
        self.loaded = false;
        self.inner = None;
    }
}

/// Per-block RaptorQ decoder.
#[derive(Debug)]
pub struct RaptorQDecoder {
    inner: SourceBlockDecoder,
    block_symbols: u16,
    padding: u32,
    symbol_size: usize,
    received: HashSet<u32>,
    decoded: Option<Vec<u8>>,
}

impl RaptorQDecoder {
    /// Maps a wire symbol id (ESI) onto the id `raptorq` expects (ISI).
    fn internal_symbol_id(&self, symbol_id: u32) -> Result<u32, EngineError> {
        if symbol_id < u32::from(self.block_symbols) {
            return Ok(symbol_id);
        }
        symbol_id
            .checked_add(self.padding)
            .filter(|&isi| isi < SYMBOL_ID_LIMIT)
            .ok_or(EngineError::SymbolId { symbol_id })
    }
}

impl SymbolDecoder for RaptorQDecoder {
    fn add_symbol(&mut self, symbol_id: u32, payload: &[u8]) -> Result<AddOutcome, EngineError> {
        if self.decoded.is_some() || self.received.contains(&symbol_id) {
            return Ok(AddOutcome::NotNeeded);
        }
        if payload.len() != self.symbol_size {
            return Err(EngineError::SymbolLength {
                expected: self.symbol_size,
                actual: payload.len(),
            });
        }

        let isi = self.internal_symbol_id(symbol_id)?;
        self.received.insert(symbol_id);

        let packet = EncodingPacket::new(PayloadId::new(0, isi), payload.to_vec());
        if let Some(block) = self.inner.decode(iter::once(packet)) {
            trace!(
                received = self.received.len(),
                block_symbols = self.block_symbols,
                "raptorq block reconstructed"
            );
            self.decoded = Some(block);
        }
        Ok(AddOutcome::Accepted)
    }

    fn needed(&self) -> u32 {
        if self.decoded.is_some() {
            return 0;
        }
        let received = u32::try_from(self.received.len()).unwrap_or(u32::MAX);
        // Past K, one more symbol at a time until the system solves
        u32::from(self.block_symbols)
            .saturating_sub(received)
            .max(1)
    }

    fn wait(&mut self) -> Result<(), EngineError> {
        if self.decoded.is_some() {
            return Ok(());
        }
        Err(EngineError::Insufficient {
            received: u32::try_from(self.received.len()).unwrap_or(u32::MAX),
            needed: u32::from(self.block_symbols),
        })
    }

    fn source_symbol(&self, index: u16, out: &mut [u8]) -> Result<(), EngineError> {
        if index >= self.block_symbols {
            return Err(EngineError::SymbolId {
                symbol_id: u32::from(index),
            });
        }
        if out.len() != self.symbol_size {
            return Err(EngineError::SymbolLength {
                expected: self.symbol_size,
                actual: out.len(),
            });
        }

        let block = self.decoded.as_deref().ok_or(EngineError::NotDecoded)?;
        let start = usize::from(index) * self.symbol_size;
        out.copy_from_slice(&block[start..start + self.symbol_size]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const K: u16 = 10;
    const SS: usize = 16;

    fn block() -> Vec<u8> {
        (0..usize::from(K) * SS).map(|i| (i * 7 % 251) as u8).collect()
    }

    fn encoder_with_block(data: &[u8]) -> RaptorQEncoder {
        let mut encoder = RaptorQCodec::new().new_encoder(K, SS).unwrap();
        encoder.load(data).unwrap();
        encoder.precompute().unwrap();
        encoder
    }

    #[test]
    fn test_catalog_is_rfc6330_table() {
        let catalog = RaptorQCodec::new().catalog().clone();
        assert_eq!(&catalog.as_slice()[..4], &[10, 12, 18, 20]);
        assert_eq!(catalog.as_slice().last(), Some(&MAX_BLOCK_SYMBOLS));
        assert!(catalog.as_slice().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_list_block_sizes_probe_matches_listing() {
        let total = list_block_sizes(None, 0);
        let mut sizes = vec![0u16; total as usize + 4];
        assert_eq!(list_block_sizes(Some(&mut sizes), u32::MAX), total);
    }

    #[test]
    fn test_unsupported_parameters() {
        let codec = RaptorQCodec::new();
        assert!(matches!(
            codec.new_encoder(0, SS),
            Err(EngineError::Unsupported { .. })
        ));
        assert!(matches!(
            codec.new_decoder(K, 0),
            Err(EngineError::Unsupported { .. })
        ));
        assert!(matches!(
            codec.new_decoder(K, usize::from(u16::MAX) + 1),
            Err(EngineError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_load_rejects_wrong_length() {
        let mut encoder = RaptorQCodec::new().new_encoder(K, SS).unwrap();
        let err = encoder.load(&[0u8; 10]).unwrap_err();
        assert_eq!(
            err,
            EngineError::PayloadLength {
                expected: 160,
                actual: 10
            }
        );
    }

    #[test]
    fn test_precompute_requires_load() {
        let mut encoder = RaptorQCodec::new().new_encoder(K, SS).unwrap();
        assert_eq!(encoder.precompute(), Err(EngineError::NotLoaded));
        assert_eq!(encoder.repair_symbol(0), Err(EngineError::NotLoaded));
    }

    #[test]
    fn test_clear_drops_block() {
        let mut encoder = encoder_with_block(&block());
        encoder.clear();
        assert_eq!(encoder.repair_symbol(0), Err(EngineError::NotLoaded));
    }

    #[test]
    fn test_repair_symbols_have_symbol_size() {
        let mut encoder = encoder_with_block(&block());
        for index in 0..4 {
            assert_eq!(encoder.repair_symbol(index).unwrap().len(), SS);
        }
    }

    #[test]
    fn test_decode_from_sources_only() {
        let data = block();
        let codec = RaptorQCodec::new();
        let mut decoder = codec.new_decoder(K, SS).unwrap();

        for (id, chunk) in data.chunks(SS).enumerate() {
            assert_eq!(decoder.needed(), u32::from(K) - id as u32);
            assert_eq!(
                decoder.add_symbol(id as u32, chunk).unwrap(),
                AddOutcome::Accepted
            );
        }
        assert_eq!(decoder.needed(), 0);
        decoder.wait().unwrap();

        let mut out = vec![0u8; SS];
        decoder.source_symbol(9, &mut out).unwrap();
        assert_eq!(out, &data[9 * SS..]);
    }

    #[test]
    fn test_decode_with_repair_symbols() {
        let data = block();
        let mut encoder = encoder_with_block(&data);
        let mut decoder = RaptorQCodec::new().new_decoder(K, SS).unwrap();

        // Lose sources 0, 3 and 7; make up for them with five repair symbols
        for (id, chunk) in data.chunks(SS).enumerate() {
            if ![0, 3, 7].contains(&id) {
                decoder.add_symbol(id as u32, chunk).unwrap();
            }
        }
        for index in 0..5 {
            let repair = encoder.repair_symbol(index).unwrap();
            decoder.add_symbol(u32::from(K) + index, &repair).unwrap();
        }

        decoder.wait().unwrap();
        let mut out = vec![0u8; SS];
        for index in [0u16, 3, 7] {
            decoder.source_symbol(index, &mut out).unwrap();
            let start = usize::from(index) * SS;
            assert_eq!(out, &data[start..start + SS]);
        }
    }

    #[test]
    fn test_duplicate_and_late_symbols_not_needed() {
        let data = block();
        let mut decoder = RaptorQCodec::new().new_decoder(K, SS).unwrap();

        decoder.add_symbol(0, &data[..SS]).unwrap();
        assert_eq!(
            decoder.add_symbol(0, &data[..SS]).unwrap(),
            AddOutcome::NotNeeded
        );

        for (id, chunk) in data.chunks(SS).enumerate().skip(1) {
            decoder.add_symbol(id as u32, chunk).unwrap();
        }
        assert_eq!(
            decoder.add_symbol(u32::from(K), &[0u8; SS]).unwrap(),
            AddOutcome::NotNeeded
        );
    }

    #[test]
    fn test_wait_reports_insufficient() {
        let mut decoder = RaptorQCodec::new().new_decoder(K, SS).unwrap();
        decoder.add_symbol(1, &[0u8; SS]).unwrap();
        assert_eq!(
            decoder.wait(),
            Err(EngineError::Insufficient {
                received: 1,
                needed: 10
            })
        );

        let mut out = [0u8; SS];
        assert_eq!(
            decoder.source_symbol(0, &mut out),
            Err(EngineError::NotDecoded)
        );
    }

    #[test]
    fn test_add_symbol_rejects_wrong_length() {
        let mut decoder = RaptorQCodec::new().new_decoder(K, SS).unwrap();
        assert!(matches!(
            decoder.add_symbol(0, &[0u8; 3]),
            Err(EngineError::SymbolLength {
                expected: SS,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_symbol_id_past_payload_id_range() {
        let mut decoder = RaptorQCodec::new().new_decoder(K, SS).unwrap();
        for symbol_id in [1u32 << 24, u32::MAX - 1] {
            assert_eq!(
                decoder.add_symbol(symbol_id, &[0u8; SS]),
                Err(EngineError::SymbolId { symbol_id })
            );
        }
        assert_eq!(decoder.needed(), u32::from(K));

        // Highest repair id that still fits
        let last = SYMBOL_ID_LIMIT - 1 - padding_symbols(K);
        assert_eq!(
            decoder.add_symbol(last, &[0u8; SS]).unwrap(),
            AddOutcome::Accepted
        );
    }

    #[test]
    fn test_repair_index_past_payload_id_range() {
        let mut encoder = encoder_with_block(&block());
        let first_invalid = SYMBOL_ID_LIMIT - u32::from(K) - padding_symbols(K);
        assert!(matches!(
            encoder.repair_symbol(first_invalid),
            Err(EngineError::SymbolId { .. })
        ));
        assert_eq!(encoder.repair_symbol(first_invalid - 1).unwrap().len(), SS);
    }
}
