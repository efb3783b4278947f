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

//! Fragment-level primitive types
//!
//! This module contains the normalized color type shared by every stage of the
//! pipeline, and the per-fragment / per-polygon records handed over by the
//! rasterizer.

use std::ops::{Add, Mul};

use super::registers::{PolygonAttr, TexParams};

/// Linear interpolation between two scalars
///
/// Evaluated as `x + (y - x) * t`, which returns `x` exactly when `x == y`
/// regardless of `t`.
#[inline(always)]
pub fn mix(x: f32, y: f32, t: f32) -> f32 {
    x + (y - x) * t
}

/// A normalized RGBA color
///
/// Every channel lives in [0, 1]. 5-bit hardware values map to `v / 31`,
/// 8-bit vertex colors to `v / 255`.
///
/// # Examples
///
/// ```
/// use dsrx::core::gpu3d::Rgba;
///
/// let red = Rgba::from_rgb555(0x001F);
/// assert_eq!(red, Rgba::new(1.0, 0.0, 0.0, 1.0));
/// assert_eq!(red.bgra(), Rgba::new(0.0, 0.0, 1.0, 1.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgba {
    /// Red channel
    pub r: f32,
    /// Green channel
    pub g: f32,
    /// Blue channel
    pub b: f32,
    /// Alpha channel
    pub a: f32,
}

impl Rgba {
    /// Fully transparent black
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);

    /// Opaque black, written by the shadow-mask pass
    pub const OPAQUE_BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);

    /// Opaque white
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);

    /// Create a color from four normalized channels
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Expand a 15-bit RGB555 value to an opaque color
    ///
    /// - Bits 0-4: Red
    /// - Bits 5-9: Green
    /// - Bits 10-14: Blue
    /// - Bit 15: ignored
    #[inline]
    pub fn from_rgb555(raw: u16) -> Self {
        Self {
            r: (raw & 0x1F) as f32 / 31.0,
            g: ((raw >> 5) & 0x1F) as f32 / 31.0,
            b: ((raw >> 10) & 0x1F) as f32 / 31.0,
            a: 1.0,
        }
    }

    /// Build a color from 5-bit channels (0-31 each)
    pub fn from_rgba5(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: (r & 0x1F) as f32 / 31.0,
            g: (g & 0x1F) as f32 / 31.0,
            b: (b & 0x1F) as f32 / 31.0,
            a: (a & 0x1F) as f32 / 31.0,
        }
    }

    /// Same color with a different alpha
    #[inline]
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Per-channel linear interpolation towards `other`
    #[inline]
    pub fn mix(self, other: Rgba, t: f32) -> Self {
        Self {
            r: mix(self.r, other.r, t),
            g: mix(self.g, other.g, t),
            b: mix(self.b, other.b, t),
            a: mix(self.a, other.a, t),
        }
    }

    /// Swap red and blue, giving the hardware's native BGRA storage order
    #[inline]
    pub fn bgra(self) -> Self {
        Self {
            r: self.b,
            g: self.g,
            b: self.r,
            a: self.a,
        }
    }

    /// Clamp the color channels to at most 1.0 (alpha untouched)
    #[inline]
    pub fn saturate_rgb(self) -> Self {
        Self {
            r: self.r.min(1.0),
            g: self.g.min(1.0),
            b: self.b.min(1.0),
            a: self.a,
        }
    }

    /// Perceptual luminance with weights (0.21, 0.72, 0.07)
    #[inline]
    pub fn luminance(self) -> f32 {
        0.21 * self.r + 0.72 * self.g + 0.07 * self.b
    }

    /// Sum of absolute RGB differences (alpha ignored)
    #[inline]
    pub fn rgb_distance(self, other: Rgba) -> f32 {
        (self.r - other.r).abs() + (self.g - other.g).abs() + (self.b - other.b).abs()
    }

    /// Quantize to 8-bit RGBA, rounding to nearest
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

impl Mul for Rgba {
    type Output = Rgba;

    fn mul(self, rhs: Rgba) -> Rgba {
        Rgba {
            r: self.r * rhs.r,
            g: self.g * rhs.g,
            b: self.b * rhs.b,
            a: self.a * rhs.a,
        }
    }
}

impl Add for Rgba {
    type Output = Rgba;

    fn add(self, rhs: Rgba) -> Rgba {
        Rgba {
            r: self.r + rhs.r,
            g: self.g + rhs.g,
            b: self.b + rhs.b,
            a: self.a + rhs.a,
        }
    }
}

/// Per-polygon state shared by every fragment of the polygon
///
/// Carries the three packed words the rasterizer hands over flat (not
/// interpolated): polygon attributes, texture parameters and palette base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PolygonState {
    /// Polygon attribute word (blend mode, polygon id, flags, depth shift)
    pub attr: PolygonAttr,

    /// Texture parameter word (address, size, wrap, format)
    pub tex_params: TexParams,

    /// Palette base, in 16-byte units (8-byte units for 4-color textures)
    pub palette_base: u32,
}

/// One rasterized fragment
///
/// Produced by the external rasterizer and consumed by the pipeline. Nothing
/// in it outlives a single shading call.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Fragment {
    /// Interpolated vertex color (alpha in 5-bit domain, normalized)
    pub color: Rgba,

    /// Interpolated texture coordinate in texel units
    pub texcoord: [f32; 2],

    /// Interpolated depth in [0, 1], written explicitly by W-buffer passes
    pub depth: f32,
}
