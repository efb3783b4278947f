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

//! 3D engine register word definitions
//!
//! Packed words handed to the fragment pipeline: the display control word,
//! the per-polygon attribute word and the texture parameter word.

use bitflags::bitflags;

bitflags! {
    /// 3D display control (DISP3DCNT)
    ///
    /// Only the bits read by the fragment pipeline are named; the remaining
    /// bits are retained untouched.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Disp3dCnt: u32 {
        /// Texture mapping enabled
        const TEXTURE_MAPPING = 1 << 0;
        /// Highlight shading instead of toon shading for blend mode 2
        const HIGHLIGHT = 1 << 1;
        /// Edge marking enabled (consumed by the display stage)
        const EDGE_MARKING = 1 << 5;
        /// Fog master enable
        const FOG_ENABLE = 1 << 7;

        const _ = !0;
    }
}

impl Default for Disp3dCnt {
    fn default() -> Self {
        Disp3dCnt::TEXTURE_MAPPING
    }
}

bitflags! {
    /// Polygon attribute word
    ///
    /// ```text
    /// Bits 4-5:   Blend mode (0=modulate, 1=decal, 2=toon/highlight, 3=shadow)
    /// Bit 11:     Translucent polygons update depth
    /// Bit 14:     Depth test is "equal" instead of "less"
    /// Bit 15:     Fog enabled for this polygon
    /// Bits 16-20: Depth shift applied to vertex Z
    /// Bits 24-29: Polygon ID
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PolygonAttr: u32 {
        /// Translucent fragments write depth
        const TRANSLUCENT_DEPTH_UPDATE = 1 << 11;
        /// Depth test passes on equality
        const DEPTH_EQUAL = 1 << 14;
        /// Fog applies to this polygon
        const FOG = 1 << 15;

        const _ = !0;
    }
}

impl Default for PolygonAttr {
    fn default() -> Self {
        PolygonAttr::empty()
    }
}

impl PolygonAttr {
    /// Blend mode field (bits 4-5)
    #[inline]
    pub fn blend_mode(self) -> BlendMode {
        BlendMode::from_bits(((self.bits() >> 4) & 0x3) as u8)
    }

    /// Polygon ID (bits 24-29, 0-63)
    #[inline]
    pub fn polygon_id(self) -> u8 {
        ((self.bits() >> 24) & 0x3F) as u8
    }

    /// Depth shift for vertex Z (bits 16-20)
    #[inline]
    pub fn depth_shift(self) -> u32 {
        (self.bits() >> 16) & 0x1F
    }
}

bitflags! {
    /// Texture parameter word (TEXIMAGE_PARAM)
    ///
    /// ```text
    /// Bits 0-15:  Texel base address in 8-byte units
    /// Bit 16/17:  Repeat in S/T
    /// Bit 18/19:  Mirror (flip) in S/T, only meaningful with repeat
    /// Bits 20-22: Width  = 8 << n
    /// Bits 23-25: Height = 8 << n
    /// Bits 26-28: Texture format
    /// Bit 29:     Palette color 0 is transparent
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TexParams: u32 {
        /// Repeat horizontally
        const REPEAT_S = 1 << 16;
        /// Repeat vertically
        const REPEAT_T = 1 << 17;
        /// Mirror every other horizontal repetition
        const FLIP_S = 1 << 18;
        /// Mirror every other vertical repetition
        const FLIP_T = 1 << 19;
        /// Palette index 0 decodes as transparent
        const COLOR0_TRANSPARENT = 1 << 29;

        const _ = !0;
    }
}

impl Default for TexParams {
    fn default() -> Self {
        TexParams::empty()
    }
}

impl TexParams {
    /// Byte address of the first texel in the texel plane
    #[inline]
    pub fn texel_base(self) -> u32 {
        (self.bits() & 0xFFFF) << 3
    }

    /// Texture width in texels (8-1024)
    #[inline]
    pub fn width(self) -> i32 {
        8 << ((self.bits() >> 20) & 0x7)
    }

    /// Texture height in texels (8-1024)
    #[inline]
    pub fn height(self) -> i32 {
        8 << ((self.bits() >> 23) & 0x7)
    }

    /// Raw format selector (bits 26-28)
    #[inline]
    pub fn format_bits(self) -> u8 {
        ((self.bits() >> 26) & 0x7) as u8
    }

    /// Wrap policy for the S axis
    #[inline]
    pub fn wrap_s(self) -> WrapMode {
        WrapMode {
            repeat: self.contains(TexParams::REPEAT_S),
            mirror: self.contains(TexParams::FLIP_S),
        }
    }

    /// Wrap policy for the T axis
    #[inline]
    pub fn wrap_t(self) -> WrapMode {
        WrapMode {
            repeat: self.contains(TexParams::REPEAT_T),
            mirror: self.contains(TexParams::FLIP_T),
        }
    }
}

/// Per-axis texture coordinate wrap policy
///
/// Mirroring only takes effect together with repeat; without repeat the
/// coordinate is clamped to the texture edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WrapMode {
    /// Coordinates repeat modulo the texture size
    pub repeat: bool,
    /// Odd repetitions are reflected
    pub mirror: bool,
}

impl WrapMode {
    /// Clamp to [0, size-1]
    pub const CLAMP: WrapMode = WrapMode {
        repeat: false,
        mirror: false,
    };

    /// Plain repeat
    pub const REPEAT: WrapMode = WrapMode {
        repeat: true,
        mirror: false,
    };

    /// Repeat with mirroring of odd tiles
    pub const MIRROR: WrapMode = WrapMode {
        repeat: true,
        mirror: true,
    };

    /// Wrap a texel coordinate into [0, size-1]
    ///
    /// `size` must be a power of two. With mirroring, the tile parity is taken
    /// from the bit just above the in-tile bits, so `-1` reflects onto `0`.
    ///
    /// # Examples
    ///
    /// ```
    /// use dsrx::core::gpu3d::WrapMode;
    ///
    /// assert_eq!(WrapMode::REPEAT.wrap(-1, 8), 7);
    /// assert_eq!(WrapMode::MIRROR.wrap(-1, 8), 0);
    /// assert_eq!(WrapMode::CLAMP.wrap(9, 8), 7);
    /// ```
    #[inline]
    pub fn wrap(self, c: i32, size: i32) -> i32 {
        if self.repeat {
            if self.mirror && (c & size) != 0 {
                (size - 1) - (c & (size - 1))
            } else {
                c & (size - 1)
            }
        } else {
            c.clamp(0, size - 1)
        }
    }
}

/// Polygon blend mode
///
/// Selects how the sampled texel combines with the interpolated vertex color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// Vertex color multiplied with the texel
    Modulate,
    /// Texel blended over the vertex color by texel alpha
    Decal,
    /// Vertex color replaced (toon) or augmented (highlight) from the toon table
    ToonHighlight,
    /// Shadow volume polygon
    Shadow,
}

impl BlendMode {
    /// Create BlendMode from the 2-bit attribute field
    ///
    /// # Examples
    ///
    /// ```
    /// use dsrx::core::gpu3d::BlendMode;
    ///
    /// assert_eq!(BlendMode::from_bits(0), BlendMode::Modulate);
    /// assert_eq!(BlendMode::from_bits(1), BlendMode::Decal);
    /// assert_eq!(BlendMode::from_bits(2), BlendMode::ToonHighlight);
    /// assert_eq!(BlendMode::from_bits(3), BlendMode::Shadow);
    /// ```
    pub fn from_bits(bits: u8) -> Self {
        match bits & 3 {
            0 => BlendMode::Modulate,
            1 => BlendMode::Decal,
            2 => BlendMode::ToonHighlight,
            _ => BlendMode::Shadow,
        }
    }

    /// Raw 2-bit value
    pub fn bits(self) -> u8 {
        match self {
            BlendMode::Modulate => 0,
            BlendMode::Decal => 1,
            BlendMode::ToonHighlight => 2,
            BlendMode::Shadow => 3,
        }
    }

    /// Whether textured output uses the decal formula
    ///
    /// Decided by the low bit of the mode, so shadow polygons use decal too.
    #[inline]
    pub fn is_decal(self) -> bool {
        self.bits() & 1 != 0
    }
}
