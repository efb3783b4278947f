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

//! Texture sampling
//!
//! Turns a fractional texture coordinate into one filtered color by issuing
//! one (nearest), four (bilinear) or twenty-one (edge-adaptive) texel decodes.
//!
//! # Coordinate Convention
//!
//! Texture coordinates are in texel units. The integer texel is the
//! coordinate truncated toward zero, the sub-texel position is
//! `x - floor(x)`.

mod upscale;

use serde::{Deserialize, Serialize};

use super::primitives::Rgba;
use super::texture::TexelDecoder;

pub use upscale::{reconstruct, Neighborhood};

/// Alpha below which a texel counts as fully transparent for filtering
///
/// Half of the smallest non-zero 5-bit alpha step.
pub const TRANSPARENT_ALPHA: f32 = 0.5 / 31.0;

/// Texture filter selection
///
/// Chosen at draw setup, never per fragment. Also parsed as a command
/// line value, with the same kebab-case names as the config file.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum FilterMode {
    /// Single texel, as the hardware samples
    #[default]
    Nearest,
    /// 2×2 linear filter with transparent-pair suppression
    Bilinear,
    /// Edge-directed upscale over a 5×5 neighborhood
    EdgeAdaptive,
}

/// Filtered texture sampler for one draw call
///
/// # Examples
///
/// ```
/// use dsrx::core::gpu3d::{
///     FilterMode, PaletteMemory, Sampler, TexParams, TextureDescriptor, TextureMemory, TexelDecoder,
/// };
///
/// let tex = TextureMemory::new();
/// let pal = PaletteMemory::new();
/// let desc = TextureDescriptor::from_params(TexParams::from_bits_retain(7 << 26), 0);
/// let sampler = Sampler::new(TexelDecoder::new(&desc, &tex, &pal), FilterMode::Bilinear);
///
/// // All-zero direct texels are transparent black
/// assert_eq!(sampler.sample([3.5, 2.25]).a, 0.0);
/// ```
pub struct Sampler<'a> {
    decoder: TexelDecoder<'a>,
    mode: FilterMode,
}

impl<'a> Sampler<'a> {
    /// Create a sampler over a bound texture
    pub fn new(decoder: TexelDecoder<'a>, mode: FilterMode) -> Self {
        Self { decoder, mode }
    }

    /// Active filter
    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Underlying texel decoder
    pub fn decoder(&self) -> &TexelDecoder<'a> {
        &self.decoder
    }

    /// Sample with the configured filter
    #[inline]
    pub fn sample(&self, st: [f32; 2]) -> Rgba {
        match self.mode {
            FilterMode::Nearest => self.sample_nearest(st),
            FilterMode::Bilinear => self.sample_bilinear(st),
            FilterMode::EdgeAdaptive => self.sample_edge_adaptive(st),
        }
    }

    /// Point sample at the truncated coordinate
    #[inline]
    pub fn sample_nearest(&self, st: [f32; 2]) -> Rgba {
        self.decoder.decode(st[0] as i32, st[1] as i32)
    }

    /// 2×2 linear filter
    ///
    /// Interpolates horizontally across both rows, then vertically. A pair
    /// whose two alphas are both below [`TRANSPARENT_ALPHA`] yields
    /// transparent black instead of blending the hidden colors, which would
    /// otherwise bleed dark fringes around cut-out texels.
    pub fn sample_bilinear(&self, st: [f32; 2]) -> Rgba {
        let s = st[0] as i32;
        let t = st[1] as i32;
        let fx = fract(st[0]);
        let fy = fract(st[1]);

        let s1 = s.wrapping_add(1);
        let t1 = t.wrapping_add(1);

        let a = self.decoder.decode(s, t);
        let b = self.decoder.decode(s1, t);
        let c = self.decoder.decode(s, t1);
        let d = self.decoder.decode(s1, t1);

        let ab = lerp_visible(a, b, fx);
        let cd = lerp_visible(c, d, fx);
        lerp_visible(ab, cd, fy)
    }

    /// Edge-directed upscale of the 5×5 neighborhood
    pub fn sample_edge_adaptive(&self, st: [f32; 2]) -> Rgba {
        let s = st[0] as i32;
        let t = st[1] as i32;
        let taps = Neighborhood::gather(|dx, dy| {
            self.decoder.decode(s.wrapping_add(dx), t.wrapping_add(dy))
        });
        reconstruct(&taps, [fract(st[0]), fract(st[1])])
    }
}

/// Fractional part, always in [0, 1)
#[inline(always)]
pub(crate) fn fract(x: f32) -> f32 {
    x - x.floor()
}

/// Interpolate unless both endpoints are effectively transparent
#[inline]
fn lerp_visible(x: Rgba, y: Rgba, t: f32) -> Rgba {
    if x.a < TRANSPARENT_ALPHA && y.a < TRANSPARENT_ALPHA {
        Rgba::TRANSPARENT
    } else {
        x.mix(y, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gpu3d::memory::{PaletteMemory, TextureMemory};
    use crate::core::gpu3d::registers::TexParams;
    use crate::core::gpu3d::texture::TextureDescriptor;

    /// 8×8 direct-color texture, repeat on both axes
    fn direct_desc() -> TextureDescriptor {
        let params = TexParams::from_bits_retain(7 << 26) | TexParams::REPEAT_S | TexParams::REPEAT_T;
        TextureDescriptor::from_params(params, 0)
    }

    fn put(tex: &mut TextureMemory, s: u32, t: u32, raw: u16) {
        tex.write_bytes((t * 8 + s) * 2, &raw.to_le_bytes());
    }

    #[test]
    fn test_fract() {
        assert_eq!(fract(2.25), 0.25);
        assert_eq!(fract(-0.25), 0.75);
        assert_eq!(fract(3.0), 0.0);
    }

    #[test]
    fn test_nearest_truncates() {
        let mut tex = TextureMemory::new();
        let pal = PaletteMemory::new();
        put(&mut tex, 2, 3, 0x801F);

        let desc = direct_desc();
        let sampler = Sampler::new(TexelDecoder::new(&desc, &tex, &pal), FilterMode::Nearest);
        assert_eq!(sampler.sample([2.9, 3.99]), Rgba::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(sampler.sample([3.0, 3.0]).a, 0.0);
    }

    #[test]
    fn test_bilinear_horizontal_blend() {
        let mut tex = TextureMemory::new();
        let pal = PaletteMemory::new();
        // Black and white, both opaque, on rows 0 and 1
        for t in 0..2 {
            put(&mut tex, 0, t, 0x8000);
            put(&mut tex, 1, t, 0xFFFF);
        }

        let desc = direct_desc();
        let sampler = Sampler::new(TexelDecoder::new(&desc, &tex, &pal), FilterMode::Bilinear);
        let c = sampler.sample([0.25, 0.5]);
        assert_eq!(c, Rgba::new(0.25, 0.25, 0.25, 1.0));
    }

    #[test]
    fn test_bilinear_transparent_pair_suppression() {
        let mut tex = TextureMemory::new();
        let pal = PaletteMemory::new();
        // Row 0: two transparent white texels, row 1: opaque red pair
        put(&mut tex, 0, 0, 0x7FFF);
        put(&mut tex, 1, 0, 0x7FFF);
        put(&mut tex, 0, 1, 0x801F);
        put(&mut tex, 1, 1, 0x801F);

        let desc = direct_desc();
        let sampler = Sampler::new(TexelDecoder::new(&desc, &tex, &pal), FilterMode::Bilinear);

        // Top row collapses to transparent black, so blending halfway keeps
        // green/blue at zero instead of picking up the hidden white
        let c = sampler.sample([0.5, 0.5]);
        assert_eq!(c, Rgba::new(0.5, 0.0, 0.0, 0.5));
    }

    #[test]
    fn test_bilinear_all_transparent_is_transparent_black() {
        let mut tex = TextureMemory::new();
        let pal = PaletteMemory::new();
        for t in 0..2 {
            for s in 0..2 {
                put(&mut tex, s, t, 0x7FFF);
            }
        }

        let desc = direct_desc();
        let sampler = Sampler::new(TexelDecoder::new(&desc, &tex, &pal), FilterMode::Bilinear);
        assert_eq!(sampler.sample([0.3, 0.7]), Rgba::TRANSPARENT);
    }

    #[test]
    fn test_bilinear_integer_coordinate_matches_nearest() {
        let mut tex = TextureMemory::new();
        let pal = PaletteMemory::new();
        for t in 0..8 {
            for s in 0..8 {
                put(&mut tex, s, t, 0x8000 | ((s * 4 + t) as u16));
            }
        }

        let desc = direct_desc();
        let decoder = TexelDecoder::new(&desc, &tex, &pal);
        let bilinear = Sampler::new(decoder, FilterMode::Bilinear);
        let nearest = Sampler::new(TexelDecoder::new(&desc, &tex, &pal), FilterMode::Nearest);

        for (s, t) in [(0.0, 0.0), (3.0, 5.0), (7.0, 7.0)] {
            assert_eq!(bilinear.sample([s, t]), nearest.sample([s, t]));
        }
    }

    #[test]
    fn test_out_of_range_coordinates_wrap() {
        let mut tex = TextureMemory::new();
        let pal = PaletteMemory::new();
        put(&mut tex, 7, 0, 0x801F);

        let desc = direct_desc();
        for mode in [FilterMode::Nearest, FilterMode::Bilinear, FilterMode::EdgeAdaptive] {
            let sampler = Sampler::new(TexelDecoder::new(&desc, &tex, &pal), mode);
            // Saturates to i32::MAX, whose neighbours wrap to i32::MIN
            for st in [[3.0e9, 0.0], [0.0, 3.0e9], [-3.0e9, 3.0e9]] {
                let c = sampler.sample(st);
                assert!((0.0..=1.0).contains(&c.a), "{mode:?} {st:?}");
            }
        }

        // i32::MAX lands on column 7 under repeat
        let sampler = Sampler::new(TexelDecoder::new(&desc, &tex, &pal), FilterMode::Nearest);
        assert_eq!(sampler.sample([3.0e9, 0.0]), Rgba::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_filter_mode_serde_names() {
        let json = serde_json::to_string(&FilterMode::EdgeAdaptive).unwrap();
        assert_eq!(json, "\"edge-adaptive\"");
        let mode: FilterMode = serde_json::from_str("\"bilinear\"").unwrap();
        assert_eq!(mode, FilterMode::Bilinear);
        assert_eq!(FilterMode::default(), FilterMode::Nearest);
    }

    #[test]
    fn test_filter_mode_value_names_match_serde() {
        use clap::ValueEnum;

        for mode in FilterMode::value_variants() {
            let name = mode.to_possible_value().unwrap();
            let json = serde_json::to_string(mode).unwrap();
            assert_eq!(json, format!("\"{}\"", name.get_name()));
            assert_eq!(FilterMode::from_str(name.get_name(), false), Ok(*mode));
        }
    }
}
