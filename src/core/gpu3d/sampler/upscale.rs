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

//! Edge-directed texture upscaling (SABR)
//!
//! Reconstructs a sub-texel color from the 5×5 neighborhood of the current
//! texel. The four corners of the 5×5 block are never read, leaving 21 taps.
//!
//! # Neighborhood Layout
//!
//! Taps are numbered row-major, `n = (dy + 2) * 5 + (dx + 2)`:
//!
//! ```text
//!        dx: -2  -1   0  +1  +2
//! dy -2:      .   1   2   3   .
//! dy -1:      5   6   7   8   9
//! dy  0:     10  11  12  13  14
//! dy +1:     15  16  17  18  19
//! dy +2:      .  21  22  23   .
//! ```
//!
//! Tap 12 is the center texel.
//!
//! # Lanes
//!
//! All edge math runs on 4-lane vectors, one lane per corner of the center
//! texel. Lane 0 looks at the edge between taps 13 and 17, lane 1 between 7
//! and 13, lane 2 between 11 and 7, lane 3 between 17 and 11. Each lane
//! tests three line angles (45°, 30°, 60°) of the form `A·y + B·x = C`
//! against the sub-texel position.
//!
//! # References
//!
//! - [SABR v3.0 (libretro common-shaders)](https://github.com/libretro/common-shaders/tree/master/xbr)

use crate::core::gpu3d::primitives::Rgba;

type Vec4 = [f32; 4];
type BVec4 = [bool; 4];

// Line coefficients: A·fy + B·fx compared against C, per lane
const AI: Vec4 = [1.0, -1.0, -1.0, 1.0];
const B45: Vec4 = [1.0, 1.0, -1.0, -1.0];
const C45: Vec4 = [1.5, 0.5, -0.5, 0.5];
const B30: Vec4 = [0.5, 2.0, -0.5, -2.0];
const C30: Vec4 = [1.0, 1.0, -0.5, 0.0];
const B60: Vec4 = [2.0, 0.5, -2.0, -0.5];
const C60: Vec4 = [2.0, 0.0, -1.0, 0.5];

// Smoothstep half-widths
const M45: Vec4 = [0.4, 0.4, 0.4, 0.4];
const M30: Vec4 = [0.2, 0.4, 0.2, 0.4];
const M60: Vec4 = [0.4, 0.2, 0.4, 0.2];
const M_SHIFT: f32 = 0.2;

/// Weight of the opposing-angle difference for 30°/60° edges
const COEF: f32 = 2.0;

/// Luminance difference below which two taps count as equal
const THRESHOLD: f32 = 0.32;

/// The 5×5 texel neighborhood of one fragment
///
/// Indexed by tap number; the four corner slots are unused.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighborhood {
    taps: [Rgba; 25],
}

impl Neighborhood {
    /// Tap offsets `(dx, dy)` that are actually read
    pub const OFFSETS: [(i32, i32); 21] = [
        (-1, -2), (0, -2), (1, -2),
        (-2, -1), (-1, -1), (0, -1), (1, -1), (2, -1),
        (-2, 0), (-1, 0), (0, 0), (1, 0), (2, 0),
        (-2, 1), (-1, 1), (0, 1), (1, 1), (2, 1),
        (-1, 2), (0, 2), (1, 2),
    ];

    /// Collect the 21 taps by calling `fetch(dx, dy)` for each offset
    pub fn gather(mut fetch: impl FnMut(i32, i32) -> Rgba) -> Self {
        let mut taps = [Rgba::TRANSPARENT; 25];
        for (dx, dy) in Self::OFFSETS {
            taps[Self::tap_index(dx, dy)] = fetch(dx, dy);
        }
        Self { taps }
    }

    /// A neighborhood where every tap has the same color
    pub fn uniform(color: Rgba) -> Self {
        Self::gather(|_, _| color)
    }

    /// Tap number of an offset
    #[inline(always)]
    pub fn tap_index(dx: i32, dy: i32) -> usize {
        ((dy + 2) * 5 + (dx + 2)) as usize
    }

    /// Color at tap number `n`
    #[inline(always)]
    fn p(&self, n: usize) -> Rgba {
        self.taps[n]
    }

    /// Luminance at tap number `n`
    #[inline(always)]
    fn l(&self, n: usize) -> f32 {
        self.taps[n].luminance()
    }
}

#[inline(always)]
fn map4(f: impl Fn(usize) -> f32) -> Vec4 {
    [f(0), f(1), f(2), f(3)]
}

#[inline(always)]
fn bmap4(f: impl Fn(usize) -> bool) -> BVec4 {
    [f(0), f(1), f(2), f(3)]
}

/// Reorder lanes: `swizzle(v, [3, 0, 1, 2])` is GLSL `v.wxyz`
#[inline(always)]
fn swizzle(v: Vec4, order: [usize; 4]) -> Vec4 {
    [v[order[0]], v[order[1]], v[order[2]], v[order[3]]]
}

#[inline(always)]
fn lum_df(a: Vec4, b: Vec4) -> Vec4 {
    map4(|i| (a[i] - b[i]).abs())
}

#[inline(always)]
fn lum_eq(a: Vec4, b: Vec4) -> BVec4 {
    let df = lum_df(a, b);
    bmap4(|i| df[i] < THRESHOLD)
}

/// Weighted luminance distance across an edge
#[allow(clippy::too_many_arguments)]
#[inline(always)]
fn lum_wd(a: Vec4, b: Vec4, c: Vec4, d: Vec4, e: Vec4, f: Vec4, g: Vec4, h: Vec4) -> Vec4 {
    let ab = lum_df(a, b);
    let ac = lum_df(a, c);
    let de = lum_df(d, e);
    let df = lum_df(d, f);
    let gh = lum_df(g, h);
    map4(|i| ab[i] + ac[i] + de[i] + df[i] + 4.0 * gh[i])
}

#[inline(always)]
fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Smoothstep of the line `AI·fy + b·fx` between `c - m + shift` and `c + m + shift`
#[inline(always)]
fn line_mask(b: Vec4, c: Vec4, m: Vec4, shift: f32, fp: [f32; 2]) -> Vec4 {
    map4(|i| {
        let x = AI[i] * fp[1] + b[i] * fp[0];
        smoothstep(c[i] - m[i] + shift, c[i] + m[i] + shift, x)
    })
}

/// Reconstruct the color at sub-texel position `fp` (each in [0, 1))
///
/// Pure function of the neighborhood and `fp`. A neighborhood of one color
/// always reproduces that color.
///
/// # Algorithm
///
/// 1. Convert the taps around each corner to luminance lanes
/// 2. Classify each corner as a 45°, 30°, 60° or shallow edge using weighted
///    luminance differences and the equality threshold
/// 3. Turn the classification into a blend amount from the smoothstep mask
///    of the matching line angle
/// 4. Blend the center towards its edge-adjacent neighbors corner by corner,
///    once forward and once in reverse order
/// 5. Keep whichever candidate is closer in RGB to the center texel
///
/// # Examples
///
/// ```
/// use dsrx::core::gpu3d::{reconstruct, Neighborhood, Rgba};
///
/// let grey = Rgba::new(0.5, 0.5, 0.5, 1.0);
/// let taps = Neighborhood::uniform(grey);
/// assert_eq!(reconstruct(&taps, [0.9, 0.1]), grey);
/// ```
pub fn reconstruct(taps: &Neighborhood, fp: [f32; 2]) -> Rgba {
    // Luminance lanes. Swizzled lanes reuse the rotations of p7 and p8.
    let p7 = [taps.l(7), taps.l(11), taps.l(17), taps.l(13)];
    let p8 = [taps.l(8), taps.l(6), taps.l(16), taps.l(18)];
    let p11 = swizzle(p7, [1, 2, 3, 0]);
    let p12 = [taps.l(12); 4];
    let p13 = swizzle(p7, [3, 0, 1, 2]);
    let p14 = [taps.l(14), taps.l(2), taps.l(10), taps.l(22)];
    let p16 = swizzle(p8, [2, 3, 0, 1]);
    let p17 = swizzle(p7, [2, 3, 0, 1]);
    let p18 = swizzle(p8, [3, 0, 1, 2]);
    let p19 = [taps.l(19), taps.l(3), taps.l(5), taps.l(21)];
    let p22 = swizzle(p14, [3, 0, 1, 2]);
    let p23 = [taps.l(23), taps.l(9), taps.l(1), taps.l(15)];

    // Blend masks per line angle
    let ma45 = line_mask(B45, C45, M45, 0.0, fp);
    let ma30 = line_mask(B30, C30, M30, 0.0, fp);
    let ma60 = line_mask(B60, C60, M60, 0.0, fp);
    let marn = line_mask(B45, C45, M45, M_SHIFT, fp);

    // Edge strengths
    let e45 = lum_wd(p12, p8, p16, p18, p22, p14, p17, p13);
    let econt = lum_wd(p17, p11, p23, p13, p7, p19, p12, p18);
    let e30 = lum_df(p13, p16);
    let e60 = lum_df(p8, p17);

    let eq_13_7 = lum_eq(p13, p7);
    let eq_13_8 = lum_eq(p13, p8);
    let eq_17_11 = lum_eq(p17, p11);
    let eq_17_16 = lum_eq(p17, p16);
    let eq_13_14 = lum_eq(p13, p14);
    let eq_13_19 = lum_eq(p13, p19);
    let eq_17_22 = lum_eq(p17, p22);
    let eq_17_23 = lum_eq(p17, p23);
    let eq_12_18 = lum_eq(p12, p18);
    let eq_12_16 = lum_eq(p12, p16);
    let eq_12_8 = lum_eq(p12, p8);

    let mac = map4(|i| {
        let r45_1 = p12[i] != p13[i] && p12[i] != p17[i];
        let r45_2 = !eq_13_7[i] && !eq_13_8[i];
        let r45_3 = !eq_17_11[i] && !eq_17_16[i];
        let r45_4_1 = !eq_13_14[i] && !eq_13_19[i];
        let r45_4_2 = !eq_17_22[i] && !eq_17_23[i];
        let r45_4 = eq_12_18[i] && (r45_4_1 || r45_4_2);
        let r45_5 = eq_12_16[i] || eq_12_8[i];
        let r45 = r45_1 && (r45_2 || r45_3 || r45_4 || r45_5);
        let r30 = p12[i] != p16[i] && p11[i] != p16[i];
        let r60 = p12[i] != p8[i] && p7[i] != p8[i];

        let edr45 = e45[i] < econt[i] && r45;
        let edrrn = e45[i] <= econt[i];
        let edr30 = COEF * e30[i] <= e60[i] && r30;
        let edr60 = COEF * e60[i] <= e30[i] && r60;

        // The five classes are mutually exclusive
        match (edr45, edr30, edr60) {
            (true, true, true) => ma30[i].max(ma60[i]),
            (true, true, false) => ma30[i],
            (true, false, true) => ma60[i],
            (true, false, false) => ma45[i],
            (false, _, _) if edrrn => marn[i],
            _ => 0.0,
        }
    });

    // Per lane: pick the neighbor on the side with the smaller luminance jump
    let df_12_17 = lum_df(p12, p17);
    let df_12_13 = lum_df(p12, p13);
    let towards = |i: usize, first: usize, second: usize| {
        if df_12_13[i] < df_12_17[i] {
            taps.p(first)
        } else {
            taps.p(second)
        }
    };
    let corner = [
        towards(0, 13, 17),
        towards(1, 7, 13),
        towards(2, 11, 7),
        towards(3, 17, 11),
    ];

    let center = taps.p(12);
    let forward = (0..4).fold(center, |acc, i| acc.mix(corner[i], mac[i]));
    let reverse = (0..4).rev().fold(center, |acc, i| acc.mix(corner[i], mac[i]));

    if center.rgb_distance(reverse) <= center.rgb_distance(forward) {
        reverse
    } else {
        forward
    }
}
