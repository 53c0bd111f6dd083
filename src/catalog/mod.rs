//! Block size catalog.
//!
//! The set of per-block source symbol counts (K values) an erasure-coding
//! engine supports, in the engine's own order. The catalog is built once by
//! the engine and shared read-only afterwards.

use std::sync::Arc;

/// Ordered, read-only list of supported K values.
///
/// Cloning is cheap: clones share the same backing storage.
///
/// # Example
///
/// ```
/// use fecframe::BlockSizeCatalog;
///
/// let catalog = BlockSizeCatalog::from_sizes(vec![10, 12, 18]);
///
/// // Probe for the total, then fetch
/// let total = catalog.list_into(None, 0);
/// let mut sizes = vec![0u16; total as usize];
/// assert_eq!(catalog.list_into(Some(&mut sizes), total), 3);
/// assert_eq!(sizes, [10, 12, 18]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockSizeCatalog {
    sizes: Arc<[u16]>,
}

impl BlockSizeCatalog {
    /// Creates a catalog from sizes in their defined order.
    pub fn from_sizes(sizes: impl Into<Vec<u16>>) -> Self {
        Self {
            sizes: Arc::from(sizes.into()),
        }
    }

    /// Returns the number of supported sizes.
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// Returns true if the engine supports no block size at all.
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Returns true if `block_symbols` is a supported K.
    pub fn contains(&self, block_symbols: u16) -> bool {
        self.sizes.contains(&block_symbols)
    }

    /// Returns the sizes as a slice.
    pub fn as_slice(&self) -> &[u16] {
        &self.sizes
    }

    /// Iterates over the sizes in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.sizes.iter().copied()
    }

    /// Copies catalog entries into a caller buffer.
    ///
    /// - `None`: returns the total number of sizes and touches nothing.
    /// - `Some(buf)`: copies `min(capacity, buf.len(), total)` leading entries
    ///   and returns how many were copied.
    pub fn list_into(&self, into: Option<&mut [u16]>, capacity: u32) -> u32 {
        let total = self.sizes.len();
        let Some(dst) = into else {
            return u32::try_from(total).unwrap_or(u32::MAX);
        };

        let capacity = usize::try_from(capacity).unwrap_or(usize::MAX);
        let count = total.min(capacity).min(dst.len());
        dst[..count].copy_from_slice(&self.sizes[..count]);

        // count <= capacity, which came from a u32
        count as u32
    }
}

impl<'a> IntoIterator for &'a BlockSizeCatalog {
    type Item = &'a u16;
    type IntoIter = std::slice::Iter<'a, u16>;

    fn into_iter(self) -> Self::IntoIter {
        self.sizes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> BlockSizeCatalog {
        BlockSizeCatalog::from_sizes(vec![10, 12, 18, 20, 26])
    }

    #[test]
    fn test_probe_returns_total() {
        let catalog = catalog();
        assert_eq!(catalog.list_into(None, 0), 5);
        assert_eq!(catalog.list_into(None, 100), 5);
    }

    #[test]
    fn test_list_respects_capacity() {
        let catalog = catalog();
        let mut buf = [0xFFFFu16; 8];

        assert_eq!(catalog.list_into(Some(&mut buf), 3), 3);
        assert_eq!(&buf[..3], &[10, 12, 18]);
        assert!(buf[3..].iter().all(|&v| v == 0xFFFF), "wrote past capacity");
    }

    #[test]
    fn test_list_capacity_larger_than_total() {
        let catalog = catalog();
        let mut buf = [0u16; 8];
        assert_eq!(catalog.list_into(Some(&mut buf), 8), 5);
        assert_eq!(&buf[..5], catalog.as_slice());
    }

    #[test]
    fn test_list_never_exceeds_buffer() {
        let catalog = catalog();
        let mut buf = [0u16; 2];
        assert_eq!(catalog.list_into(Some(&mut buf), 10), 2);
        assert_eq!(buf, [10, 12]);
    }

    #[test]
    fn test_contains_and_iter() {
        let catalog = catalog();
        assert!(catalog.contains(18));
        assert!(!catalog.contains(19));
        assert_eq!(catalog.iter().collect::<Vec<_>>(), vec![10, 12, 18, 20, 26]);
        assert_eq!((&catalog).into_iter().count(), catalog.len());
    }

    #[test]
    fn test_clone_shares_storage() {
        let catalog = catalog();
        let clone = catalog.clone();
        assert!(std::ptr::eq(catalog.as_slice(), clone.as_slice()));
    }
}
