//! Catalog partitioning into contiguous work units

use orbital_mechanics::ElementSet;
use std::ops::Range;
use std::sync::Arc;

/// A contiguous slice of the shared catalog, processed by one worker
#[derive(Debug, Clone)]
pub struct Chunk {
    index: usize,
    catalog: Arc<[ElementSet]>,
    range: Range<usize>,
}

impl Chunk {
    /// Position of this chunk in submission order
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    pub fn satellites(&self) -> &[ElementSet] {
        &self.catalog[self.range.clone()]
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// `max(1, n / parallelism)`; a parallelism of zero gives one satellite per chunk
pub fn chunk_size(n: usize, parallelism: usize) -> usize {
    if parallelism == 0 {
        return 1;
    }
    (n / parallelism).max(1)
}

/// Split the catalog into chunks of [`chunk_size`] satellites, in catalog
/// order. The last chunk may be shorter, and there may be more chunks than
/// `parallelism` when the size does not tile the catalog evenly.
pub fn partition(catalog: &Arc<[ElementSet]>, parallelism: usize) -> Vec<Chunk> {
    let n = catalog.len();
    let size = chunk_size(n, parallelism);

    (0..n)
        .step_by(size)
        .enumerate()
        .map(|(index, start)| Chunk {
            index,
            catalog: Arc::clone(catalog),
            range: start..(start + size).min(n),
        })
        .collect()
}
