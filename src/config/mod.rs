//! Configuration for encoding and decoding.
//!
//! - [`FecConfig`] - Symbol size, block size (K), repair count (R) and frame layout
//!
//! The decoder must be given the same `symbol_size`, `block_symbols` and frame
//! digest setting the encoder used: nothing on the wire describes them.
//!
//! # Example
//!
//! ```
//! use fecframe::FecConfig;
//!
//! // 64-byte symbols, 10 per block, 3 repair symbols per block
//! let config = FecConfig::new(64, 10, 3)?;
//! assert_eq!(config.block_len(), 640);
//!
//! // Builder pattern
//! let config = FecConfig::default()
//!     .with_symbol_size(256)
//!     .with_repair_symbols(8);
//! assert_eq!(config.frame_len(), 8 + 256);
//! # Ok::<(), fecframe::FecError>(())
//! ```

use crate::error::FecError;
use crate::frame::FrameLayout;

/// Default symbol size in bytes.
pub const DEFAULT_SYMBOL_SIZE: usize = 1024;

/// Largest symbol size; the engine carries it as a `u16`.
pub const MAX_SYMBOL_SIZE: usize = u16::MAX as usize;

/// Default number of source symbols per block (smallest RFC 6330 K').
pub const DEFAULT_BLOCK_SYMBOLS: u16 = 10;

/// Default number of repair symbols per block.
pub const DEFAULT_REPAIR_SYMBOLS: u32 = 2;

/// Parameters shared by the encode and decode drivers.
///
/// - `symbol_size` - payload bytes per frame
/// - `block_symbols` - source symbols per block (K)
/// - `repair_symbols` - repair symbols generated per block (R)
/// - `frame_digest` - append a BLAKE3 digest trailer to every frame
///   (requires the `hash-blake3` feature, changes the wire format)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FecConfig {
    symbol_size: usize,
    block_symbols: u16,
    repair_symbols: u32,
    frame_digest: bool,
}

impl FecConfig {
    /// Creates a new configuration.
    ///
    /// Returns error if a size is zero, `symbol_size` exceeds
    /// [`MAX_SYMBOL_SIZE`] or symbol ids would overflow `u32`.
    pub fn new(
        symbol_size: usize,
        block_symbols: u16,
        repair_symbols: u32,
    ) -> Result<Self, FecError> {
        let config = Self {
            symbol_size,
            block_symbols,
            repair_symbols,
            frame_digest: false,
        };
        config.validate()?;
        Ok(config)
    }

    /// Sets the symbol size.
    pub fn with_symbol_size(mut self, size: usize) -> Self {
        self.symbol_size = size;
        self
    }

    /// Sets the number of source symbols per block.
    pub fn with_block_symbols(mut self, symbols: u16) -> Self {
        self.block_symbols = symbols;
        self
    }

    /// Sets the number of repair symbols per block.
    pub fn with_repair_symbols(mut self, symbols: u32) -> Self {
        self.repair_symbols = symbols;
        self
    }

    /// Enables or disables the per-frame digest trailer (requires `hash-blake3` feature).
    #[cfg(feature = "hash-blake3")]
    pub fn with_frame_digest(mut self, enabled: bool) -> Self {
        self.frame_digest = enabled;
        self
    }

    /// Returns the symbol size.
    pub fn symbol_size(&self) -> usize {
        self.symbol_size
    }

    /// Returns the number of source symbols per block (K).
    pub fn block_symbols(&self) -> u16 {
        self.block_symbols
    }

    /// Returns the number of repair symbols per block (R).
    pub fn repair_symbols(&self) -> u32 {
        self.repair_symbols
    }

    /// Returns whether frames carry a digest trailer.
    pub fn frame_digest(&self) -> bool {
        self.frame_digest
    }

    /// Returns the payload bytes covered by one full block (`K * symbol_size`).
    pub fn block_len(&self) -> usize {
        usize::from(self.block_symbols).saturating_mul(self.symbol_size)
    }

    /// Returns the wire layout of a single frame.
    pub fn layout(&self) -> FrameLayout {
        #[cfg(feature = "hash-blake3")]
        if self.frame_digest {
            return FrameLayout::with_digest(self.symbol_size);
        }
        FrameLayout::plain(self.symbol_size)
    }

    /// Returns the size of one frame on the wire.
    pub fn frame_len(&self) -> usize {
        self.layout().frame_len()
    }

    /// Validates the current configuration.
    pub fn validate(&self) -> Result<(), FecError> {
        if self.symbol_size == 0 {
            return Err(FecError::InvalidConfig {
                message: "symbol_size must be non-zero",
            });
        }

        if self.symbol_size > MAX_SYMBOL_SIZE {
            return Err(FecError::InvalidConfig {
                message: "symbol_size must not exceed 65535",
            });
        }

        if self.block_symbols == 0 {
            return Err(FecError::InvalidConfig {
                message: "block_symbols must be non-zero",
            });
        }

        if u32::from(self.block_symbols)
            .checked_add(self.repair_symbols)
            .is_none()
        {
            return Err(FecError::InvalidConfig {
                message: "block_symbols + repair_symbols overflows a u32 symbol id",
            });
        }

        if usize::from(self.block_symbols)
            .checked_mul(self.symbol_size)
            .is_none()
        {
            return Err(FecError::InvalidConfig {
                message: "block length overflows usize",
            });
        }

        Ok(())
    }
}

impl Default for FecConfig {
    fn default() -> Self {
        Self {
            symbol_size: DEFAULT_SYMBOL_SIZE,
            block_symbols: DEFAULT_BLOCK_SYMBOLS,
            repair_symbols: DEFAULT_REPAIR_SYMBOLS,
            frame_digest: false,
        }
    }
}
