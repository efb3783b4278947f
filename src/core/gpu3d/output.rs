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

//! Fragment output stage
//!
//! Decides whether a composited fragment survives its pass and what it writes
//! to the color, attribute and depth targets.
//!
//! # Variants
//!
//! One of six variants is selected when a draw call is set up:
//!
//! | Pass | Keeps | Color | Attribute |
//! |------|-------|-------|-----------|
//! | Opaque | `a >= 30.5/31` | composited | polygon id, depth-equal, fog, 1 |
//! | Translucent | `0.5/31 <= a < 30.5/31` | composited | fog = 0, 1 |
//! | Shadow mask | always | `(0, 0, 0, 1)` | untouched |
//!
//! W-buffer variants additionally write the interpolated depth; Z-buffer
//! variants leave depth to the rasterizer.
//!
//! # Attribute Target
//!
//! ```text
//! r: polygon id / 63
//! g: depth-equal flag
//! b: fog flag
//! a: 1
//! ```

use super::primitives::Rgba;
use super::registers::PolygonAttr;

/// Opaque pass discards below this alpha
pub const OPAQUE_ALPHA_MIN: f32 = 30.5 / 31.0;

/// Translucent pass discards below this alpha
pub const TRANSLUCENT_ALPHA_MIN: f32 = 0.5 / 31.0;

/// Depth buffer convention of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthMode {
    /// Depth comes from the rasterizer's interpolated Z
    Z,
    /// Fragment writes its own interpolated depth
    W,
}

/// Polygon class drawn by a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// Solid fragments only
    Opaque,
    /// Partially transparent fragments only
    Translucent,
    /// Shadow volume mask, color is ignored
    ShadowMask,
}

/// Channels written to the attribute target
///
/// `None` leaves the channel as it was.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttrWrite {
    /// Polygon id / 63
    pub polygon_id: Option<f32>,
    /// Depth-equal flag
    pub depth_equal: Option<f32>,
    /// Fog flag
    pub fog: f32,
}

impl AttrWrite {
    /// Apply the write to an attribute texel
    pub fn apply(&self, dst: &mut Rgba) {
        if let Some(id) = self.polygon_id {
            dst.r = id;
        }
        if let Some(eq) = self.depth_equal {
            dst.g = eq;
        }
        dst.b = self.fog;
        dst.a = 1.0;
    }
}

/// Everything a surviving fragment writes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentOutput {
    /// Color target value (BGRA)
    pub color: Rgba,
    /// Attribute target write, if any
    pub attr: Option<AttrWrite>,
    /// Explicit depth, W-buffer variants only
    pub depth: Option<f32>,
}

/// One of the six output variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputVariant {
    /// Depth convention
    pub depth: DepthMode,
    /// Pass kind
    pub pass: PassKind,
}

impl OutputVariant {
    /// Every variant, Z variants first
    pub const ALL: [OutputVariant; 6] = [
        OutputVariant { depth: DepthMode::Z, pass: PassKind::Opaque },
        OutputVariant { depth: DepthMode::Z, pass: PassKind::Translucent },
        OutputVariant { depth: DepthMode::Z, pass: PassKind::ShadowMask },
        OutputVariant { depth: DepthMode::W, pass: PassKind::Opaque },
        OutputVariant { depth: DepthMode::W, pass: PassKind::Translucent },
        OutputVariant { depth: DepthMode::W, pass: PassKind::ShadowMask },
    ];

    /// Select a variant for a draw call
    pub fn new(depth: DepthMode, pass: PassKind) -> Self {
        log::debug!("Output variant: {:?}/{:?}", depth, pass);
        Self { depth, pass }
    }

    /// Apply discard and build the fragment's writes
    ///
    /// `color` is the composited color, `depth` the interpolated W-buffer
    /// depth. Returns `None` when the fragment is discarded.
    ///
    /// # Examples
    ///
    /// ```
    /// use dsrx::core::gpu3d::{DepthMode, OutputVariant, PassKind, PolygonAttr, Rgba};
    ///
    /// let opaque = OutputVariant::new(DepthMode::W, PassKind::Opaque);
    /// let attr = PolygonAttr::from_bits_retain(63 << 24);
    ///
    /// let out = opaque.shade(Rgba::WHITE, attr, 0.25).unwrap();
    /// assert_eq!(out.depth, Some(0.25));
    /// assert_eq!(out.attr.unwrap().polygon_id, Some(1.0));
    ///
    /// // 30/31 alpha is not solid enough for the opaque pass
    /// assert!(opaque.shade(Rgba::WHITE.with_alpha(30.0 / 31.0), attr, 0.25).is_none());
    /// ```
    #[inline]
    pub fn shade(&self, color: Rgba, attr: PolygonAttr, depth: f32) -> Option<FragmentOutput> {
        let (color, attr_write) = match self.pass {
            PassKind::Opaque => {
                if color.a < OPAQUE_ALPHA_MIN {
                    return None;
                }
                let write = AttrWrite {
                    polygon_id: Some(attr.polygon_id() as f32 / 63.0),
                    depth_equal: Some(flag(attr.contains(PolygonAttr::DEPTH_EQUAL))),
                    fog: flag(attr.contains(PolygonAttr::FOG)),
                };
                (color, Some(write))
            }
            PassKind::Translucent => {
                if color.a < TRANSLUCENT_ALPHA_MIN || color.a >= OPAQUE_ALPHA_MIN {
                    return None;
                }
                let write = AttrWrite {
                    polygon_id: None,
                    depth_equal: None,
                    fog: 0.0,
                };
                (color, Some(write))
            }
            PassKind::ShadowMask => (Rgba::OPAQUE_BLACK, None),
        };

        Some(FragmentOutput {
            color,
            attr: attr_write,
            depth: match self.depth {
                DepthMode::Z => None,
                DepthMode::W => Some(depth),
            },
        })
    }
}

#[inline(always)]
fn flag(set: bool) -> f32 {
    if set {
        1.0
    } else {
        0.0
    }
}

/// Values written by the clear plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearFragment {
    /// Color target value (BGRA)
    pub color: Rgba,
    /// Attribute target value
    pub attr: Rgba,
    /// Clip-space depth in [-1, 1]
    pub depth: f32,
}

/// Rear-plane clear
///
/// Fills the color, attribute and depth targets before any polygon is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClearStage {
    /// 5-bit red, green, blue and alpha
    pub color: [u8; 4],
    /// Opaque polygon id of the rear plane
    pub polygon_id: u8,
    /// Fog applies to the rear plane
    pub fog: bool,
    /// Clear depth in the 24-bit depth domain
    pub depth: u32,
}

impl ClearStage {
    /// Build the clear state from the CLEAR_COLOR and CLEAR_DEPTH registers
    ///
    /// ```text
    /// CLEAR_COLOR:
    ///   Bits 0-14:  RGB555
    ///   Bit 15:     Fog
    ///   Bits 16-20: Alpha
    ///   Bits 24-29: Polygon ID
    /// CLEAR_DEPTH:
    ///   Bits 0-14:  Depth, expanded to 24 bits as d * 0x200 + 0x1FF
    /// ```
    pub fn from_registers(clear_color: u32, clear_depth: u32) -> Self {
        Self {
            color: [
                (clear_color & 0x1F) as u8,
                ((clear_color >> 5) & 0x1F) as u8,
                ((clear_color >> 10) & 0x1F) as u8,
                ((clear_color >> 16) & 0x1F) as u8,
            ],
            polygon_id: ((clear_color >> 24) & 0x3F) as u8,
            fog: clear_color & (1 << 15) != 0,
            depth: (clear_depth & 0x7FFF) * 0x200 + 0x1FF,
        }
    }

    /// The clear plane's single fragment
    ///
    /// # Examples
    ///
    /// ```
    /// use dsrx::core::gpu3d::{ClearStage, Rgba};
    ///
    /// let clear = ClearStage {
    ///     color: [31, 0, 0, 31],
    ///     polygon_id: 63,
    ///     fog: true,
    ///     depth: 0x80_0000,
    /// };
    /// let frag = clear.fragment();
    /// assert_eq!(frag.color, Rgba::new(0.0, 0.0, 1.0, 1.0));
    /// assert_eq!(frag.attr, Rgba::new(1.0, 0.0, 1.0, 1.0));
    /// assert_eq!(frag.depth, 0.0);
    /// ```
    pub fn fragment(&self) -> ClearFragment {
        let [r, g, b, a] = self.color;
        ClearFragment {
            color: Rgba::from_rgba5(r, g, b, a).bgra(),
            attr: Rgba::new(self.polygon_id as f32 / 63.0, 0.0, flag(self.fog), 1.0),
            depth: self.depth as f32 / 8_388_608.0 - 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr_word(polygon_id: u32, flags: PolygonAttr) -> PolygonAttr {
        PolygonAttr::from_bits_retain(polygon_id << 24) | flags
    }

    #[test]
    fn test_opaque_threshold() {
        let v = OutputVariant::new(DepthMode::Z, PassKind::Opaque);
        let attr = PolygonAttr::empty();

        assert!(v.shade(Rgba::WHITE, attr, 0.0).is_some());
        assert!(v.shade(Rgba::WHITE.with_alpha(30.0 / 31.0), attr, 0.0).is_none());
        assert!(v.shade(Rgba::WHITE.with_alpha(0.0), attr, 0.0).is_none());
    }

    #[test]
    fn test_translucent_window() {
        let v = OutputVariant::new(DepthMode::Z, PassKind::Translucent);
        let attr = PolygonAttr::empty();

        assert!(v.shade(Rgba::WHITE, attr, 0.0).is_none());
        assert!(v.shade(Rgba::WHITE.with_alpha(0.0), attr, 0.0).is_none());
        assert!(v.shade(Rgba::WHITE.with_alpha(1.0 / 31.0), attr, 0.0).is_some());
        assert!(v.shade(Rgba::WHITE.with_alpha(30.0 / 31.0), attr, 0.0).is_some());
    }

    #[test]
    fn test_opaque_attribute_write() {
        let v = OutputVariant::new(DepthMode::Z, PassKind::Opaque);
        let attr = attr_word(21, PolygonAttr::FOG | PolygonAttr::DEPTH_EQUAL);

        let out = v.shade(Rgba::WHITE, attr, 0.5).unwrap();
        assert_eq!(out.depth, None);

        let mut texel = Rgba::TRANSPARENT;
        out.attr.unwrap().apply(&mut texel);
        assert_eq!(texel, Rgba::new(21.0 / 63.0, 1.0, 1.0, 1.0));
    }

    #[test]
    fn test_translucent_keeps_polygon_id() {
        let v = OutputVariant::new(DepthMode::W, PassKind::Translucent);
        let attr = attr_word(5, PolygonAttr::FOG);

        let out = v.shade(Rgba::WHITE.with_alpha(0.5), attr, 0.75).unwrap();
        assert_eq!(out.depth, Some(0.75));

        let mut texel = Rgba::new(0.5, 1.0, 1.0, 1.0);
        out.attr.unwrap().apply(&mut texel);
        assert_eq!(texel, Rgba::new(0.5, 1.0, 0.0, 1.0));
    }

    #[test]
    fn test_shadow_mask_ignores_color() {
        for depth in [DepthMode::Z, DepthMode::W] {
            let v = OutputVariant::new(depth, PassKind::ShadowMask);
            let out = v.shade(Rgba::TRANSPARENT, PolygonAttr::empty(), 0.3).unwrap();
            assert_eq!(out.color, Rgba::OPAQUE_BLACK);
            assert_eq!(out.attr, None);
            assert_eq!(out.depth.is_some(), depth == DepthMode::W);
        }
    }

    #[test]
    fn test_all_variants_distinct() {
        for (i, a) in OutputVariant::ALL.iter().enumerate() {
            for b in &OutputVariant::ALL[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_clear_from_registers() {
        let clear = ClearStage::from_registers(0x3F1F_801F, 0x7FFF);
        assert_eq!(clear.color, [31, 0, 0, 31]);
        assert_eq!(clear.polygon_id, 63);
        assert!(clear.fog);
        assert_eq!(clear.depth, 0xFF_FFFF);
    }

    #[test]
    fn test_clear_fragment() {
        let clear = ClearStage {
            color: [0, 31, 0, 0],
            polygon_id: 0,
            fog: false,
            depth: 0,
        };
        let frag = clear.fragment();
        assert_eq!(frag.color, Rgba::new(0.0, 1.0, 0.0, 0.0));
        assert_eq!(frag.attr, Rgba::new(0.0, 0.0, 0.0, 1.0));
        assert_eq!(frag.depth, -1.0);
    }
}
