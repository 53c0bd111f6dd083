//! Deterministic single-parity engine for driver tests.
//!
//! Every repair symbol is the XOR of all source symbols, so a block survives
//! the loss of exactly one source symbol. Small K values (including 4) are
//! supported, which the RaptorQ table does not offer.

use std::collections::BTreeMap;

use bytes::Bytes;

use super::{AddOutcome, ErasureCodec, SymbolDecoder, SymbolEncoder};
use crate::catalog::BlockSizeCatalog;
use crate::error::EngineError;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Faults {
    pub(crate) fail_precompute: bool,
    pub(crate) short_repair: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct ParityCodec {
    catalog: BlockSizeCatalog,
    faults: Faults,
}

impl ParityCodec {
    pub(crate) fn new() -> Self {
        Self::with_faults(Faults::default())
    }

    pub(crate) fn with_faults(faults: Faults) -> Self {
        Self {
            catalog: BlockSizeCatalog::from_sizes(vec![1, 2, 3, 4, 8, 16]),
            faults,
        }
    }
}

impl ErasureCodec for ParityCodec {
    type Encoder = ParityEncoder;
    type Decoder = ParityDecoder;

    fn catalog(&self) -> &BlockSizeCatalog {
        &self.catalog
    }

    fn new_encoder(
        &self,
        block_symbols: u16,
        symbol_size: usize,
    ) -> Result<ParityEncoder, EngineError> {
        Ok(ParityEncoder {
            block_symbols,
            symbol_size,
            faults: self.faults,
            block: None,
            parity: None,
        })
    }

    fn new_decoder(
        &self,
        block_symbols: u16,
        symbol_size: usize,
    ) -> Result<ParityDecoder, EngineError> {
        Ok(ParityDecoder {
            block_symbols,
            symbol_size,
            sources: BTreeMap::new(),
            parity: None,
            decoded: None,
        })
    }
}

fn xor_into(acc: &mut [u8], symbol: &[u8]) {
    for (a, b) in acc.iter_mut().zip(symbol) {
        *a ^= b;
    }
}

#[derive(Debug)]
pub(crate) struct ParityEncoder {
    block_symbols: u16,
    symbol_size: usize,
    faults: Faults,
    block: Option<Vec<u8>>,
    parity: Option<Vec<u8>>,
}

impl SymbolEncoder for ParityEncoder {
    fn load(&mut self, block: &[u8]) -> Result<(), EngineError> {
        let expected = usize::from(self.block_symbols) * self.symbol_size;
        if block.len() != expected {
            return Err(EngineError::PayloadLength {
                expected,
                actual: block.len(),
            });
        }
        self.block = Some(block.to_vec());
        Ok(())
    }

    fn precompute(&mut self) -> Result<(), EngineError> {
        if self.faults.fail_precompute {
            return Err(EngineError::PrecomputeFailed {
                reason: "injected fault",
            });
        }
        let block = self.block.as_ref().ok_or(EngineError::NotLoaded)?;
        let mut parity = vec![0u8; self.symbol_size];
        for symbol in block.chunks(self.symbol_size) {
            xor_into(&mut parity, symbol);
        }
        self.parity = Some(parity);
        Ok(())
    }

    fn repair_symbol(&mut self, _index: u32) -> Result<Bytes, EngineError> {
        let parity = self.parity.as_ref().ok_or(EngineError::NotLoaded)?;
        if self.faults.short_repair {
            return Ok(Bytes::copy_from_slice(&parity[1..]));
        }
        Ok(Bytes::copy_from_slice(parity))
    }

    fn clear(&mut self) {
        self.block = None;
        self.parity = None;
    }
}

#[derive(Debug)]
pub(crate) struct ParityDecoder {
    block_symbols: u16,
    symbol_size: usize,
    sources: BTreeMap<u16, Vec<u8>>,
    parity: Option<Vec<u8>>,
    decoded: Option<Vec<u8>>,
}

impl ParityDecoder {
    fn missing(&self) -> u32 {
        u32::from(self.block_symbols) - self.sources.len() as u32
    }
}

impl SymbolDecoder for ParityDecoder {
    fn add_symbol(&mut self, symbol_id: u32, payload: &[u8]) -> Result<AddOutcome, EngineError> {
        if payload.len() != self.symbol_size {
            return Err(EngineError::SymbolLength {
                expected: self.symbol_size,
                actual: payload.len(),
            });
        }
        if self.needed() == 0 {
            return Ok(AddOutcome::NotNeeded);
        }

        match u16::try_from(symbol_id) {
            Ok(index) if index < self.block_symbols => {
                if self.sources.contains_key(&index) {
                    return Ok(AddOutcome::NotNeeded);
                }
                self.sources.insert(index, payload.to_vec());
            }
            _ => {
                // All repair symbols carry the same parity
                if self.parity.is_some() {
                    return Ok(AddOutcome::NotNeeded);
                }
                self.parity = Some(payload.to_vec());
            }
        }
        Ok(AddOutcome::Accepted)
    }

    fn needed(&self) -> u32 {
        if self.decoded.is_some() {
            return 0;
        }
        match self.missing() {
            0 => 0,
            1 if self.parity.is_some() => 0,
            missing => missing - u32::from(self.parity.is_some()),
        }
    }

    fn wait(&mut self) -> Result<(), EngineError> {
        if self.decoded.is_some() {
            return Ok(());
        }
        if self.needed() != 0 {
            return Err(EngineError::Insufficient {
                received: self.sources.len() as u32 + u32::from(self.parity.is_some()),
                needed: u32::from(self.block_symbols),
            });
        }

        let mut block = Vec::with_capacity(usize::from(self.block_symbols) * self.symbol_size);
        for index in 0..self.block_symbols {
            match self.sources.get(&index) {
                Some(symbol) => block.extend_from_slice(symbol),
                None => {
                    let mut recovered = self.parity.clone().ok_or(EngineError::NotDecoded)?;
                    for symbol in self.sources.values() {
                        xor_into(&mut recovered, symbol);
                    }
                    block.extend_from_slice(&recovered);
                }
            }
        }
        self.decoded = Some(block);
        Ok(())
    }

    fn source_symbol(&self, index: u16, out: &mut [u8]) -> Result<(), EngineError> {
        let block = self.decoded.as_deref().ok_or(EngineError::NotDecoded)?;
        let start = usize::from(index) * self.symbol_size;
        out.copy_from_slice(&block[start..start + self.symbol_size]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovers_one_lost_source() {
        let codec = ParityCodec::new();
        let block: Vec<u8> = (0..16).collect();

        let mut encoder = codec.new_encoder(4, 4).unwrap();
        encoder.load(&block).unwrap();
        encoder.precompute().unwrap();
        let parity = encoder.repair_symbol(0).unwrap();

        let mut decoder = codec.new_decoder(4, 4).unwrap();
        for id in [0u32, 1, 3] {
            let start = id as usize * 4;
            decoder.add_symbol(id, &block[start..start + 4]).unwrap();
        }
        assert_eq!(decoder.needed(), 1);
        decoder.add_symbol(4, &parity).unwrap();
        assert_eq!(decoder.needed(), 0);
        assert_eq!(decoder.add_symbol(5, &parity).unwrap(), AddOutcome::NotNeeded);

        decoder.wait().unwrap();
        let mut out = [0u8; 4];
        decoder.source_symbol(2, &mut out).unwrap();
        assert_eq!(out, [8, 9, 10, 11]);
    }
}
