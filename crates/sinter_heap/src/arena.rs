//! Fixed-capacity byte arena.
//!
//! The arena owns one contiguous buffer. Allocation first tries the free
//! list (first fit, splitting the chosen region) and otherwise bumps the
//! high-water mark. Released regions are coalesced with their neighbours
//! and, when they touch the high-water mark, handed back to the bump area.
//!
//! Offset 0 is never handed out so that the host interface can use it as
//! the failure sentinel.

#![allow(clippy::cast_possible_truncation)]

use std::collections::BTreeMap;

use sinter_foundation::{Error, ErrorKind, Result};

/// Allocation granularity in bytes.
pub const ALIGN: u32 = 8;

/// Handle to a live arena region: its byte offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u32);

impl Handle {
    /// Wraps a raw offset received from the embedder.
    #[must_use]
    pub const fn from_raw(offset: u32) -> Self {
        Self(offset)
    }

    /// Returns the raw offset.
    #[must_use]
    pub const fn offset(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Region {
    offset: u32,
    len: u32,
}

impl Region {
    const fn end(self) -> u32 {
        self.offset + self.len
    }
}

/// A fixed-capacity byte arena.
#[derive(Debug, Default)]
pub struct Arena {
    buffer: Vec<u8>,
    /// Start of the never-allocated tail of the buffer.
    top: u32,
    /// Released regions below `top`, sorted by offset, never adjacent.
    free: Vec<Region>,
    /// Live regions: offset to rounded length.
    live: BTreeMap<u32, u32>,
    initialised: bool,
}

impl Arena {
    /// Creates an arena that must be initialised before use.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an arena of `size` bytes.
    #[must_use]
    pub fn with_capacity(size: u32) -> Self {
        let mut arena = Self::new();
        arena.init(size);
        arena
    }

    /// (Re)allocates the buffer and discards all allocation state.
    ///
    /// Every handle obtained before this call becomes invalid.
    pub fn init(&mut self, size: u32) {
        self.buffer = vec![0; size as usize];
        self.top = ALIGN.min(size);
        self.free.clear();
        self.live.clear();
        self.initialised = true;
    }

    /// Returns true once [`Arena::init`] has run.
    #[must_use]
    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    /// Total capacity in bytes.
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.buffer.len() as u32
    }

    /// Bytes held by live regions.
    #[must_use]
    pub fn used(&self) -> u32 {
        self.live.values().sum()
    }

    /// Bytes still available, counting both the free list and the bump area.
    #[must_use]
    pub fn available(&self) -> u32 {
        let free: u32 = self.free.iter().map(|r| r.len).sum();
        self.capacity() - self.top + free
    }

    /// Number of live regions.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Returns true if `handle` denotes a live region.
    #[must_use]
    pub fn is_live(&self, handle: Handle) -> bool {
        self.live.contains_key(&handle.0)
    }

    /// Allocates a zero-initialised region of at least `size` bytes.
    pub fn allocate(&mut self, size: u32) -> Result<Handle> {
        if !self.initialised {
            return Err(Error::new(ErrorKind::UninitialisedHeap));
        }
        let len = round_up(size.max(1)).ok_or_else(|| {
            Error::allocation_failure(size as usize, self.available() as usize)
        })?;

        let offset = match self.take_free(len) {
            Some(offset) => offset,
            None => self.bump(len).ok_or_else(|| {
                tracing::debug!(size, available = self.available(), "arena exhausted");
                Error::allocation_failure(size as usize, self.available() as usize)
            })?,
        };

        self.buffer[offset as usize..(offset + len) as usize].fill(0);
        self.live.insert(offset, len);
        Ok(Handle(offset))
    }

    /// Returns a region to the free list.
    ///
    /// Releasing a handle twice, or one this arena never produced, fails.
    pub fn release(&mut self, handle: Handle) -> Result<()> {
        let len = self
            .live
            .remove(&handle.0)
            .ok_or_else(|| Error::new(ErrorKind::InvalidRelease(handle.0)))?;
        self.insert_free(Region {
            offset: handle.0,
            len,
        });
        Ok(())
    }

    /// Borrows the bytes of a live region.
    pub fn bytes(&self, handle: Handle) -> Result<&[u8]> {
        let len = self.region_len(handle)?;
        let start = handle.0 as usize;
        Ok(&self.buffer[start..start + len as usize])
    }

    /// Mutably borrows the bytes of a live region.
    pub fn bytes_mut(&mut self, handle: Handle) -> Result<&mut [u8]> {
        let len = self.region_len(handle)?;
        let start = handle.0 as usize;
        Ok(&mut self.buffer[start..start + len as usize])
    }

    fn region_len(&self, handle: Handle) -> Result<u32> {
        if !self.initialised {
            return Err(Error::new(ErrorKind::UninitialisedHeap));
        }
        self.live.get(&handle.0).copied().ok_or_else(|| {
            Error::internal(format!("handle {} is not a live region", handle.0))
        })
    }

    fn take_free(&mut self, len: u32) -> Option<u32> {
        let idx = self.free.iter().position(|r| r.len >= len)?;
        let region = self.free[idx];
        if region.len == len {
            self.free.remove(idx);
        } else {
            self.free[idx] = Region {
                offset: region.offset + len,
                len: region.len - len,
            };
        }
        Some(region.offset)
    }

    fn bump(&mut self, len: u32) -> Option<u32> {
        let end = self.top.checked_add(len)?;
        if end > self.capacity() {
            return None;
        }
        let offset = self.top;
        self.top = end;
        Some(offset)
    }

    fn insert_free(&mut self, mut region: Region) {
        let idx = self
            .free
            .partition_point(|r| r.offset < region.offset);

        // Merge with the following region.
        if idx < self.free.len() && region.end() == self.free[idx].offset {
            region.len += self.free[idx].len;
            self.free.remove(idx);
        }
        // Merge with the preceding region.
        if idx > 0 && self.free[idx - 1].end() == region.offset {
            region.offset = self.free[idx - 1].offset;
            region.len += self.free[idx - 1].len;
            self.free.remove(idx - 1);
            return self.place_free(idx - 1, region);
        }
        self.place_free(idx, region);
    }

    fn place_free(&mut self, idx: usize, region: Region) {
        if region.end() == self.top {
            self.top = region.offset;
        } else {
            self.free.insert(idx, region);
        }
    }
}

fn round_up(size: u32) -> Option<u32> {
    size.checked_add(ALIGN - 1).map(|n| n & !(ALIGN - 1))
}
