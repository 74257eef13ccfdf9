//! Memory shadow: a pool of held fixed-size blocks

use serde::{Deserialize, Serialize};

/// Size of a single pool block (1 MiB)
pub const BLOCK_SIZE_BYTES: usize = 1024 * 1024;

/// Byte written into every block so the pages are actually resident
const FILL_BYTE: u8 = 0xA5;

/// Source of pool blocks
pub trait BlockAllocator: Send {
    /// Allocate a block of `bytes`, or `None` under memory pressure
    fn allocate(&mut self, bytes: usize) -> Option<Box<[u8]>>;
}

/// Allocates blocks from the global heap without aborting on failure
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapAllocator;

impl BlockAllocator for HeapAllocator {
    fn allocate(&mut self, bytes: usize) -> Option<Box<[u8]>> {
        let mut block = Vec::new();
        block.try_reserve_exact(bytes).ok()?;
        block.resize(bytes, FILL_BYTE);
        Some(block.into_boxed_slice())
    }
}

/// Outcome of moving the pool toward its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemoryAdjustment {
    /// Pool already inside the hysteresis band
    Unchanged,
    Grew { added: usize },
    Shrank { removed: usize },
    /// Allocation failed before the target was reached
    Pressure { added: usize, shortfall: usize },
}

impl MemoryAdjustment {
    pub fn is_pressure(&self) -> bool {
        matches!(self, MemoryAdjustment::Pressure { .. })
    }
}

/// Ordered collection of held 1 MiB blocks
pub struct MemoryPool<A: BlockAllocator = HeapAllocator> {
    blocks: Vec<Box<[u8]>>,
    allocator: A,
}

impl MemoryPool<HeapAllocator> {
    pub fn new() -> Self {
        Self::with_allocator(HeapAllocator)
    }
}

impl Default for MemoryPool<HeapAllocator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: BlockAllocator> MemoryPool<A> {
    pub fn with_allocator(allocator: A) -> Self {
        Self {
            blocks: Vec::new(),
            allocator,
        }
    }

    /// Current pool size in MB (one block per MB)
    pub fn size_mb(&self) -> usize {
        self.blocks.len()
    }

    /// Move the pool toward `target_mb`
    ///
    /// Growth is immediate; shrinking only happens once the pool exceeds the
    /// target by more than `hysteresis_mb`, and then goes straight to the target.
    pub fn adjust(&mut self, target_mb: usize, hysteresis_mb: usize) -> MemoryAdjustment {
        let current = self.size_mb();

        if current < target_mb {
            self.grow_to(target_mb)
        } else if current > target_mb.saturating_add(hysteresis_mb) {
            self.shrink_to(target_mb)
        } else {
            MemoryAdjustment::Unchanged
        }
    }

    /// Append blocks until the pool holds `target_mb`, stopping at the first failed allocation
    pub fn grow_to(&mut self, target_mb: usize) -> MemoryAdjustment {
        let wanted = target_mb.saturating_sub(self.size_mb());
        if wanted == 0 {
            return MemoryAdjustment::Unchanged;
        }

        let mut added = 0;
        if self.blocks.try_reserve(wanted).is_ok() {
            while added < wanted {
                match self.allocator.allocate(BLOCK_SIZE_BYTES) {
                    Some(block) => {
                        self.blocks.push(block);
                        added += 1;
                    }
                    None => break,
                }
            }
        }

        if added == wanted {
            MemoryAdjustment::Grew { added }
        } else {
            MemoryAdjustment::Pressure {
                added,
                shortfall: wanted - added,
            }
        }
    }

    /// Drop blocks from the end until the pool holds `target_mb`
    pub fn shrink_to(&mut self, target_mb: usize) -> MemoryAdjustment {
        let current = self.size_mb();
        if current <= target_mb {
            return MemoryAdjustment::Unchanged;
        }

        self.blocks.truncate(target_mb);
        self.blocks.shrink_to_fit();
        MemoryAdjustment::Shrank {
            removed: current - target_mb,
        }
    }
}
