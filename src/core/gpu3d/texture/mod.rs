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

//! Texel decoding
//!
//! The 3D engine supports seven texture formats, all read from the packed
//! texel plane and (for indexed formats) the palette plane:
//!
//! | Format     | Bits/texel | Alpha              | Palette stride |
//! |------------|-----------:|--------------------|---------------:|
//! | A3I5       | 8          | 3-bit, expanded    | 8 entries      |
//! | I2         | 2          | color 0 optional   | 4 entries      |
//! | I4         | 4          | color 0 optional   | 8 entries      |
//! | I8         | 8          | color 0 optional   | 8 entries      |
//! | Compressed | 2 (4×4)    | index 3 in modes 0/1 | per block    |
//! | A5I3       | 8          | 5-bit              | 8 entries      |
//! | Direct     | 16         | 1-bit              | none           |
//!
//! The format is resolved once per texture into a [`TexelDecoder`], which the
//! sampler then calls for every tap.

mod formats;

use super::memory::{PaletteMemory, TextureMemory};
use super::primitives::Rgba;
use super::registers::{TexParams, WrapMode};

/// Texture format selector (bits 26-28 of the texture parameter word)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// No texture
    None,
    /// 3-bit alpha, 5-bit palette index
    A3I5,
    /// 2-bit palette index (4 colors)
    I2,
    /// 4-bit palette index (16 colors)
    I4,
    /// 8-bit palette index (256 colors)
    I8,
    /// 4×4 block compressed
    Compressed,
    /// 5-bit alpha, 3-bit palette index
    A5I3,
    /// Direct 1-5-5-5 color
    Direct,
}

impl TextureFormat {
    /// Convert the 3-bit selector to a format
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x7 {
            0 => TextureFormat::None,
            1 => TextureFormat::A3I5,
            2 => TextureFormat::I2,
            3 => TextureFormat::I4,
            4 => TextureFormat::I8,
            5 => TextureFormat::Compressed,
            6 => TextureFormat::A5I3,
            _ => TextureFormat::Direct,
        }
    }
}

/// Everything needed to address one texture
///
/// Derived from the texture parameter word and palette base at draw setup
/// and left untouched for the whole draw call.
///
/// # Examples
///
/// ```
/// use dsrx::core::gpu3d::{TexParams, TextureDescriptor, TextureFormat};
///
/// // 32×16 I4 texture at byte 0x800, repeat S
/// let params = TexParams::from_bits_retain(0x100 | (1 << 16) | (2 << 20) | (1 << 23) | (3 << 26));
/// let desc = TextureDescriptor::from_params(params, 4);
///
/// assert_eq!(desc.format, TextureFormat::I4);
/// assert_eq!(desc.texel_base, 0x800);
/// assert_eq!((desc.width, desc.height), (32, 16));
/// assert_eq!(desc.wrap(-1, -1), (31, 0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDescriptor {
    /// Texel encoding
    pub format: TextureFormat,

    /// Byte address of texel (0, 0) in the texel plane
    pub texel_base: u32,

    /// Palette base as given by the palette base register
    pub palette_base: u32,

    /// Width in texels (power of two, 8-1024)
    pub width: i32,

    /// Height in texels (power of two, 8-1024)
    pub height: i32,

    /// Horizontal wrap policy
    pub wrap_s: WrapMode,

    /// Vertical wrap policy
    pub wrap_t: WrapMode,

    /// Palette index 0 decodes as transparent
    pub color0_transparent: bool,
}

impl TextureDescriptor {
    /// Resolve a texture descriptor from the packed parameter word
    pub fn from_params(params: TexParams, palette_base: u32) -> Self {
        Self {
            format: TextureFormat::from_bits(params.format_bits()),
            texel_base: params.texel_base(),
            palette_base,
            width: params.width(),
            height: params.height(),
            wrap_s: params.wrap_s(),
            wrap_t: params.wrap_t(),
            color0_transparent: params.contains(TexParams::COLOR0_TRANSPARENT),
        }
    }

    /// Whether the polygon carries a texture at all
    pub fn is_textured(&self) -> bool {
        self.format != TextureFormat::None
    }

    /// Apply the per-axis wrap policy
    #[inline(always)]
    pub fn wrap(&self, s: i32, t: i32) -> (i32, i32) {
        (
            self.wrap_s.wrap(s, self.width),
            self.wrap_t.wrap(t, self.height),
        )
    }
}

/// Decoding strategy for one format, applied to already-wrapped coordinates
type FetchFn = fn(&TexelDecoder<'_>, i32, i32) -> Rgba;

/// A texture bound to its memory planes, ready to decode texels
///
/// The format dispatch happens once in [`TexelDecoder::new`]; every
/// subsequent [`decode`](TexelDecoder::decode) goes straight to the
/// format's fetch routine.
///
/// # Examples
///
/// ```
/// use dsrx::core::gpu3d::{PaletteMemory, TexParams, TextureDescriptor, TextureMemory, TexelDecoder, Rgba};
///
/// let mut tex = TextureMemory::new();
/// let pal = PaletteMemory::new();
///
/// // One opaque red direct-color texel at (0, 0)
/// tex.write_bytes(0, &0x801Fu16.to_le_bytes());
///
/// let desc = TextureDescriptor::from_params(TexParams::from_bits_retain(7 << 26), 0);
/// let decoder = TexelDecoder::new(&desc, &tex, &pal);
/// assert_eq!(decoder.decode(0, 0), Rgba::new(1.0, 0.0, 0.0, 1.0));
/// ```
pub struct TexelDecoder<'a> {
    desc: TextureDescriptor,
    texture: &'a TextureMemory,
    palette: &'a PaletteMemory,
    /// Alpha of palette index 0 for the I2/I4/I8 formats
    alpha0: f32,
    fetch: FetchFn,
}

impl<'a> TexelDecoder<'a> {
    /// Bind a descriptor to the memory planes and pick its decode routine
    ///
    /// [`TextureFormat::None`] falls back to the direct-color routine.
    pub fn new(
        desc: &TextureDescriptor,
        texture: &'a TextureMemory,
        palette: &'a PaletteMemory,
    ) -> Self {
        let fetch: FetchFn = match desc.format {
            TextureFormat::A3I5 => formats::fetch_a3i5,
            TextureFormat::I2 => formats::fetch_i2,
            TextureFormat::I4 => formats::fetch_i4,
            TextureFormat::I8 => formats::fetch_i8,
            TextureFormat::Compressed => formats::fetch_compressed,
            TextureFormat::A5I3 => formats::fetch_a5i3,
            TextureFormat::Direct | TextureFormat::None => formats::fetch_direct,
        };

        Self {
            desc: *desc,
            texture,
            palette,
            alpha0: if desc.color0_transparent { 0.0 } else { 1.0 },
            fetch,
        }
    }

    /// Descriptor this decoder was built from
    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.desc
    }

    /// Decode the texel at `(s, t)`, wrapping the coordinate first
    #[inline]
    pub fn decode(&self, s: i32, t: i32) -> Rgba {
        let (s, t) = self.desc.wrap(s, t);
        (self.fetch)(self, s, t)
    }
}
