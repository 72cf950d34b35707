//! Borrowed windows into memory owned by someone else.
//!
//! The layout engine never allocates the bytes it marshals into. A caller hands in a slice, and
//! everything the engine produces from it (sub-views, struct views) borrows from that slice.

use crate::error::{LayoutError, Result};

fn check_range(offset: usize, len: usize, size: usize) -> Result<()> {
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(LayoutError::OutOfBounds { offset, len, size }),
    }
}

#[derive(Clone, Copy, Debug)]
pub struct MemoryView<'a> {
    bytes: &'a [u8],
}

impl<'a> MemoryView<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        MemoryView { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn read_bytes(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        check_range(offset, len, self.bytes.len())?;
        Ok(&self.bytes[offset..offset + len])
    }

    pub fn read_array<const N: usize>(&self, offset: usize) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(offset, N)?);
        Ok(out)
    }

    /// Narrows the view to `[offset, offset + len)`. The result borrows the same memory.
    pub fn sub_view(&self, offset: usize, len: usize) -> Result<MemoryView<'a>> {
        Ok(MemoryView::new(self.read_bytes(offset, len)?))
    }
}

#[derive(Debug)]
pub struct MemoryViewMut<'a> {
    bytes: &'a mut [u8],
}

impl<'a> MemoryViewMut<'a> {
    pub fn new(bytes: &'a mut [u8]) -> Self {
        MemoryViewMut { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_view(&self) -> MemoryView<'_> {
        MemoryView::new(self.bytes)
    }

    pub fn read_array<const N: usize>(&self, offset: usize) -> Result<[u8; N]> {
        self.as_view().read_array(offset)
    }

    pub fn write_bytes(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        check_range(offset, data.len(), self.bytes.len())?;
        self.bytes[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Reborrows `[offset, offset + len)` mutably. `self` stays unusable while the result lives.
    pub fn sub_view_mut(&mut self, offset: usize, len: usize) -> Result<MemoryViewMut<'_>> {
        check_range(offset, len, self.bytes.len())?;
        Ok(MemoryViewMut::new(&mut self.bytes[offset..offset + len]))
    }
}
