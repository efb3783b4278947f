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

//! Per-format texel fetch routines
//!
//! Each routine receives coordinates that are already wrapped into the
//! texture. Addresses are computed with wrapping arithmetic and the planes
//! wrap them again on access, so no routine can fault.

use super::TexelDecoder;
use crate::core::gpu3d::primitives::Rgba;

/// Linear texel index (row-major) of a wrapped coordinate
#[inline(always)]
fn texel_index(dec: &TexelDecoder<'_>, s: i32, t: i32) -> u32 {
    (t * dec.desc.width + s) as u32
}

/// Palette entry address for an 8-entry-granular palette base
#[inline(always)]
fn palette_addr(dec: &TexelDecoder<'_>, index: u32) -> u32 {
    (dec.desc.palette_base << 3).wrapping_add(index)
}

/// Alpha for binary-alpha indexed formats
#[inline(always)]
fn index_alpha(dec: &TexelDecoder<'_>, index: u32) -> f32 {
    if index > 0 {
        1.0
    } else {
        dec.alpha0
    }
}

/// Weighted RGB blend of two palette colors, opaque
#[inline(always)]
fn blend_rgb(c0: Rgba, c1: Rgba, w0: f32, w1: f32, div: f32) -> Rgba {
    Rgba::new(
        (c0.r * w0 + c1.r * w1) / div,
        (c0.g * w0 + c1.g * w1) / div,
        (c0.b * w0 + c1.b * w1) / div,
        1.0,
    )
}

/// A3I5: bits 0-4 palette index, bits 5-7 alpha
///
/// The 3-bit alpha is expanded to 5 bits as `(a << 2) + (a >> 1)`.
pub(super) fn fetch_a3i5(dec: &TexelDecoder<'_>, s: i32, t: i32) -> Rgba {
    let addr = dec.desc.texel_base.wrapping_add(texel_index(dec, s, t));
    let texel = dec.texture.read_byte(addr) as u32;

    let alpha = texel & 0xE0;
    let alpha = (alpha >> 3) + (alpha >> 6);
    let index = texel & 0x1F;

    dec.palette
        .read_color(palette_addr(dec, index))
        .with_alpha(alpha as f32 / 31.0)
}

/// I2: four 2-bit indices per byte, lowest texel in the lowest bits
pub(super) fn fetch_i2(dec: &TexelDecoder<'_>, s: i32, t: i32) -> Rgba {
    let addr = dec
        .desc
        .texel_base
        .wrapping_add(texel_index(dec, s, t) >> 2);
    let texel = dec.texture.read_byte(addr) as u32;
    let index = (texel >> (2 * (s & 3))) & 0x3;

    // 4-color palettes are addressed in 8-byte (4-entry) units
    let pal_addr = (dec.desc.palette_base << 2).wrapping_add(index);
    dec.palette
        .read_color(pal_addr)
        .with_alpha(index_alpha(dec, index))
}

/// I4: two 4-bit indices per byte, even texel in the low nibble
pub(super) fn fetch_i4(dec: &TexelDecoder<'_>, s: i32, t: i32) -> Rgba {
    let addr = dec
        .desc
        .texel_base
        .wrapping_add(texel_index(dec, s, t) >> 1);
    let texel = dec.texture.read_byte(addr) as u32;
    let index = if (s & 1) != 0 { texel >> 4 } else { texel & 0x0F };

    dec.palette
        .read_color(palette_addr(dec, index))
        .with_alpha(index_alpha(dec, index))
}

/// I8: one 8-bit index per byte
pub(super) fn fetch_i8(dec: &TexelDecoder<'_>, s: i32, t: i32) -> Rgba {
    let addr = dec.desc.texel_base.wrapping_add(texel_index(dec, s, t));
    let index = dec.texture.read_byte(addr) as u32;

    dec.palette
        .read_color(palette_addr(dec, index))
        .with_alpha(index_alpha(dec, index))
}

/// 4×4 block compressed texture
///
/// # Texel Storage
///
/// Blocks of 4×4 texels are stored as four bytes, one per block row, each
/// holding four 2-bit indices. Every block has a matching 16-bit word in
/// the slot 1 index table:
///
/// ```text
/// Bits 0-13:  Palette offset in pairs of entries
/// Bits 14-15: Mode
/// ```
///
/// # Index Resolution
///
/// | Index | Mode 0 | Mode 1        | Mode 2 | Mode 3            |
/// |-------|--------|---------------|--------|-------------------|
/// | 0     | P0     | P0            | P0     | P0                |
/// | 1     | P1     | P1            | P1     | P1                |
/// | 2     | P2     | (P0+P1)/2     | P2     | (5·P0+3·P1)/8     |
/// | 3     | clear  | clear         | P3     | (3·P0+5·P1)/8     |
pub(super) fn fetch_compressed(dec: &TexelDecoder<'_>, s: i32, t: i32) -> Rgba {
    let block_offset = ((t & 0x3FC) * (dec.desc.width >> 2)) + (s & 0x3FC) + (t & 0x3);
    let addr = dec.desc.texel_base.wrapping_add(block_offset as u32);
    let index = (dec.texture.read_byte(addr) >> (2 * (s & 0x3))) & 0x3;

    // Slot 0 blocks index into the first half of slot 1, slot 2 into the second
    let mut slot1_addr = 0x2_0000 + ((addr & 0x1_FFFC) >> 1);
    if addr >= 0x4_0000 {
        slot1_addr += 0x1_0000;
    }

    let palinfo = dec.texture.read_u16(slot1_addr) as u32;
    let pal_base = palette_addr(dec, (palinfo & 0x3FFF) << 1);
    let mode = palinfo >> 14;

    let entry = |n: u32| dec.palette.read_color(pal_base.wrapping_add(n));

    match (index, mode) {
        (0, _) => entry(0),
        (1, _) => entry(1),
        (2, 1) => blend_rgb(entry(0), entry(1), 1.0, 1.0, 2.0),
        (2, 3) => blend_rgb(entry(0), entry(1), 5.0, 3.0, 8.0),
        (2, _) => entry(2),
        (3, 2) => entry(3),
        (3, 3) => blend_rgb(entry(0), entry(1), 3.0, 5.0, 8.0),
        _ => Rgba::TRANSPARENT,
    }
}

/// A5I3: bits 0-2 palette index, bits 3-7 alpha
pub(super) fn fetch_a5i3(dec: &TexelDecoder<'_>, s: i32, t: i32) -> Rgba {
    let addr = dec.desc.texel_base.wrapping_add(texel_index(dec, s, t));
    let texel = dec.texture.read_byte(addr) as u32;

    let alpha = (texel & 0xF8) >> 3;
    let index = texel & 0x07;

    dec.palette
        .read_color(palette_addr(dec, index))
        .with_alpha(alpha as f32 / 31.0)
}

/// Direct color: little-endian 16-bit, R in bits 0-4, G 5-9, B 10-14, alpha bit 15
pub(super) fn fetch_direct(dec: &TexelDecoder<'_>, s: i32, t: i32) -> Rgba {
    let addr = dec
        .desc
        .texel_base
        .wrapping_add(texel_index(dec, s, t) << 1);
    let raw = dec.texture.read_u16(addr);

    Rgba::from_rgb555(raw).with_alpha((raw >> 15) as f32)
}
