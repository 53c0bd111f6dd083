//! Decoder pool - per-block decoder state for in-flight blocks.

use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle of a block on the decode side.
///
/// `Collecting -> Ready -> Decoded -> Freed`. A freed block never comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockPhase {
    /// The decoder still needs symbols.
    Collecting,
    /// Enough distinct symbols arrived; reconstruction can run.
    Ready,
    /// Reconstruction finished; source symbols are being copied out.
    Decoded,
    /// The block's bytes were emitted and its decoder released.
    Freed,
}

impl fmt::Display for BlockPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlockPhase::Collecting => "collecting",
            BlockPhase::Ready => "ready",
            BlockPhase::Decoded => "decoded",
            BlockPhase::Freed => "freed",
        };
        f.write_str(name)
    }
}

/// A live block: its decoder and how many output bytes it covers.
#[derive(Debug)]
pub(crate) struct BlockState<D> {
    pub(crate) decoder: D,
    pub(crate) expected_len: usize,
    pub(crate) phase: BlockPhase,
}

impl<D> BlockState<D> {
    pub(crate) fn new(decoder: D, expected_len: usize) -> Self {
        Self {
            decoder,
            expected_len,
            phase: BlockPhase::Collecting,
        }
    }
}

/// Outcome of looking up a block for an incoming frame.
pub(crate) enum Entry<'a, D> {
    Active(&'a mut BlockState<D>),
    Freed,
}

/// Live block states keyed by block number.
///
/// Blocks are freed strictly in index order, so every index below
/// `freed_below` is freed and only in-flight blocks hold an entry.
#[derive(Debug)]
pub(crate) struct DecoderPool<D> {
    active: BTreeMap<u32, BlockState<D>>,
    freed_below: u32,
    peak_live: usize,
}

impl<D> DecoderPool<D> {
    pub(crate) fn new() -> Self {
        Self {
            active: BTreeMap::new(),
            freed_below: 0,
            peak_live: 0,
        }
    }

    /// Returns the entry for `index`, creating its state with `create` if absent.
    pub(crate) fn entry_or_create<E, F>(&mut self, index: u32, create: F) -> Result<Entry<'_, D>, E>
    where
        F: FnOnce() -> Result<BlockState<D>, E>,
    {
        if index < self.freed_below {
            return Ok(Entry::Freed);
        }

        if !self.active.contains_key(&index) {
            let state = create()?;
            self.active.insert(index, state);
            self.peak_live = self.peak_live.max(self.active.len());
        }

        match self.active.get_mut(&index) {
            Some(state) => Ok(Entry::Active(state)),
            None => Ok(Entry::Freed),
        }
    }

    /// Returns the live state for `index`, if any.
    pub(crate) fn get_mut(&mut self, index: u32) -> Option<&mut BlockState<D>> {
        self.active.get_mut(&index)
    }

    /// Returns the phase of `index`, or `None` if no frame for it arrived yet.
    pub(crate) fn phase(&self, index: u32) -> Option<BlockPhase> {
        if index < self.freed_below {
            return Some(BlockPhase::Freed);
        }
        self.active.get(&index).map(|state| state.phase)
    }

    /// Drops the decoder for `index` and marks every lower index freed.
    ///
    /// Callers free blocks in ascending order; a lower index is a no-op.
    pub(crate) fn free(&mut self, index: u32) {
        if index < self.freed_below {
            return;
        }
        debug_assert_eq!(index, self.freed_below, "blocks are freed in order");
        self.active.remove(&index);
        self.freed_below = index.saturating_add(1);
    }

    /// Number of blocks holding a decoder.
    pub(crate) fn live(&self) -> usize {
        self.active.len()
    }

    /// Highest value [`live`](Self::live) ever reached.
    pub(crate) fn peak_live(&self) -> usize {
        self.peak_live
    }
}
