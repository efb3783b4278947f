// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Texture and palette memory planes
//!
//! Both planes are laid out as 1024 columns × N rows. A linear address maps to
//! column `addr & 0x3FF` and row `addr >> 10`; the row wraps modulo the plane
//! height, so every address resolves to a valid cell.
//!
//! - Texture plane: 1024×512 bytes (512 KiB of texture VRAM)
//! - Palette plane: 1024×48 RGB555 entries (96 KiB of palette VRAM)

use std::num::NonZeroUsize;

use crate::core::error::{RenderError, Result};

use super::primitives::Rgba;

/// A 1024-column plane of cells
///
/// Stored as a flat row-major `Vec` for cache efficiency.
#[derive(Debug, Clone)]
pub struct TexelPlane<T> {
    data: Vec<T>,
    rows: NonZeroUsize,
}

impl<T: Copy + Default> TexelPlane<T> {
    /// Cells per row
    pub const COLUMNS: usize = 1024;

    /// Create a zero-filled plane with `rows` rows
    pub fn new(rows: NonZeroUsize) -> Self {
        Self {
            data: vec![T::default(); Self::COLUMNS * rows.get()],
            rows,
        }
    }

    /// Wrap an address into a flat index
    #[inline(always)]
    fn index(&self, addr: u32) -> usize {
        let column = (addr & 0x3FF) as usize;
        let row = (addr >> 10) as usize % self.rows;
        row * Self::COLUMNS + column
    }

    /// Read the cell at `addr` (wrapped)
    #[inline(always)]
    pub fn read(&self, addr: u32) -> T {
        self.data[self.index(addr)]
    }

    /// Write the cell at `addr` (wrapped)
    #[inline]
    pub fn write(&mut self, addr: u32, value: T) {
        let index = self.index(addr);
        self.data[index] = value;
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows.get()
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the plane has no cells
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Packed texel memory (byte-addressable)
///
/// # Examples
///
/// ```
/// use dsrx::core::gpu3d::TextureMemory;
///
/// let mut tex = TextureMemory::new();
/// tex.write_bytes(0x400, &[0xAB, 0xCD]);
/// assert_eq!(tex.read_byte(0x401), 0xCD);
///
/// // Addresses past the end wrap around
/// assert_eq!(tex.read_byte(0x400 + TextureMemory::SIZE as u32), 0xAB);
/// ```
#[derive(Debug, Clone)]
pub struct TextureMemory {
    plane: TexelPlane<u8>,
}

impl TextureMemory {
    /// Plane height in rows
    pub const ROWS: usize = 512;

    /// Plane size in bytes
    pub const SIZE: usize = TexelPlane::<u8>::COLUMNS * Self::ROWS;

    /// Create a zero-filled texture plane
    pub fn new() -> Self {
        Self {
            plane: TexelPlane::new(NonZeroUsize::new(Self::ROWS).unwrap_or(NonZeroUsize::MIN)),
        }
    }

    /// Build the plane from a full 512 KiB dump
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::PlaneSize`] if `bytes` is not exactly
    /// [`TextureMemory::SIZE`] long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::SIZE {
            return Err(RenderError::PlaneSize {
                plane: "texture",
                expected: Self::SIZE,
                actual: bytes.len(),
            });
        }

        let mut mem = Self::new();
        mem.write_bytes(0, bytes);
        Ok(mem)
    }

    /// Read one byte
    #[inline(always)]
    pub fn read_byte(&self, addr: u32) -> u8 {
        self.plane.read(addr)
    }

    /// Read a little-endian 16-bit value from two consecutive bytes
    #[inline]
    pub fn read_u16(&self, addr: u32) -> u16 {
        let lo = self.read_byte(addr) as u16;
        let hi = self.read_byte(addr.wrapping_add(1)) as u16;
        lo | (hi << 8)
    }

    /// Upload a run of bytes starting at `addr`
    pub fn write_bytes(&mut self, addr: u32, bytes: &[u8]) {
        for (i, &b) in bytes.iter().enumerate() {
            self.plane.write(addr.wrapping_add(i as u32), b);
        }
    }
}

impl Default for TextureMemory {
    fn default() -> Self {
        Self::new()
    }
}

/// Palette memory (RGB555 entries)
///
/// One 16-bit entry per column. Addresses are entry indices, not bytes.
///
/// # Examples
///
/// ```
/// use dsrx::core::gpu3d::{PaletteMemory, Rgba};
///
/// let mut pal = PaletteMemory::new();
/// pal.write_entry(3, 0x001F);
/// assert_eq!(pal.read_color(3), Rgba::new(1.0, 0.0, 0.0, 1.0));
/// ```
#[derive(Debug, Clone)]
pub struct PaletteMemory {
    plane: TexelPlane<u16>,
}

impl PaletteMemory {
    /// Plane height in rows
    pub const ROWS: usize = 48;

    /// Number of entries
    pub const ENTRIES: usize = TexelPlane::<u16>::COLUMNS * Self::ROWS;

    /// Dump size in bytes
    pub const SIZE: usize = Self::ENTRIES * 2;

    /// Create a zero-filled palette plane
    pub fn new() -> Self {
        Self {
            plane: TexelPlane::new(NonZeroUsize::new(Self::ROWS).unwrap_or(NonZeroUsize::MIN)),
        }
    }

    /// Build the plane from a full 96 KiB little-endian dump
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::PlaneSize`] if `bytes` is not exactly
    /// [`PaletteMemory::SIZE`] long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::SIZE {
            return Err(RenderError::PlaneSize {
                plane: "palette",
                expected: Self::SIZE,
                actual: bytes.len(),
            });
        }

        let mut mem = Self::new();
        for (i, pair) in bytes.chunks_exact(2).enumerate() {
            mem.write_entry(i as u32, u16::from_le_bytes([pair[0], pair[1]]));
        }
        Ok(mem)
    }

    /// Read a raw RGB555 entry
    #[inline(always)]
    pub fn read_entry(&self, addr: u32) -> u16 {
        self.plane.read(addr)
    }

    /// Read an entry as an opaque normalized color
    #[inline(always)]
    pub fn read_color(&self, addr: u32) -> Rgba {
        Rgba::from_rgb555(self.read_entry(addr))
    }

    /// Upload one entry
    pub fn write_entry(&mut self, addr: u32, value: u16) {
        self.plane.write(addr, value);
    }

    /// Upload a run of entries starting at `addr`
    pub fn write_entries(&mut self, addr: u32, values: &[u16]) {
        for (i, &v) in values.iter().enumerate() {
            self.write_entry(addr.wrapping_add(i as u32), v);
        }
    }
}

impl Default for PaletteMemory {
    fn default() -> Self {
        Self::new()
    }
}
