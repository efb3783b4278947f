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

//! 3D engine fragment pipeline
//!
//! This module implements the per-fragment half of the Nintendo DS 3D engine
//! as an accelerated renderer executes it:
//! - Decoding the seven packed texel formats from texture VRAM
//! - Nearest, bilinear and edge-adaptive (SABR) texture filtering
//! - Modulate, decal, toon/highlight and shadow blending
//! - Opaque/translucent/shadow-mask output with alpha discard
//! - The depth fog resolve pass
//!
//! # Memory Layout
//!
//! Texture and palette VRAM are exposed as two planes of 1024 columns:
//! - Texture plane: 1024×512 bytes
//! - Palette plane: 1024×48 RGB555 entries
//!
//! Every address wraps into its plane, so decoding never fails.
//!
//! # Data Flow
//!
//! ```text
//! rasterizer ─► Sampler ─► Compositor ─► OutputVariant ─► color/attr/depth
//!                  │
//!             TexelDecoder
//!
//! depth + attr ─► FogUnit ─► fog densities
//! ```
//!
//! All state used while shading is read-only for the duration of a draw
//! call, so fragments can be shaded in any order or in parallel.
//!
//! # References
//!
//! - [GBATEK: DS 3D Texture Formats](https://problemkaputt.de/gbatek.htm#ds3dtextureformats)
//! - [GBATEK: DS 3D Polygon Attributes](https://problemkaputt.de/gbatek.htm#ds3dpolygonattributes)
//! - [GBATEK: DS 3D Fog](https://problemkaputt.de/gbatek.htm#ds3drearplane)

mod compositor;
mod config;
mod fog;
mod memory;
mod output;
mod primitives;
mod registers;
mod sampler;
mod texture;
mod vertex;
#[cfg(test)]
mod tests;

pub use compositor::Compositor;
pub use config::{RenderConfig, ShaderConfig, FOG_DENSITY_MAX, FOG_TABLE_LEN};
pub use fog::FogUnit;
pub use memory::{PaletteMemory, TexelPlane, TextureMemory};
pub use output::{
    AttrWrite, ClearFragment, ClearStage, DepthMode, FragmentOutput, OutputVariant, PassKind,
    OPAQUE_ALPHA_MIN, TRANSLUCENT_ALPHA_MIN,
};
pub use primitives::{mix, Fragment, PolygonState, Rgba};
pub use registers::{BlendMode, Disp3dCnt, PolygonAttr, TexParams, WrapMode};
pub use sampler::{reconstruct, FilterMode, Neighborhood, Sampler, TRANSPARENT_ALPHA};
pub use texture::{TexelDecoder, TextureDescriptor, TextureFormat};
pub use vertex::{Vertex, VertexOutput, VertexStage};

/// Shades fragments against bound memory planes and a shared configuration
///
/// Texture state is resolved per polygon with [`sampler`](Self::sampler)
/// and handed to the per-fragment calls, so nothing is re-resolved or
/// logged per fragment.
///
/// # Examples
///
/// ```
/// use dsrx::core::gpu3d::{
///     DepthMode, Fragment, FragmentPipeline, OutputVariant, PaletteMemory, PassKind,
///     PolygonState, Rgba, ShaderConfig, TexParams, TextureMemory,
/// };
///
/// let config = ShaderConfig::default();
/// let mut tex = TextureMemory::new();
/// let pal = PaletteMemory::new();
///
/// // 8×8 direct-color texture, texel (0, 0) opaque blue
/// tex.write_bytes(0, &0xFC00u16.to_le_bytes());
///
/// let pipeline = FragmentPipeline::new(&config, &tex, &pal);
/// let polygon = PolygonState {
///     tex_params: TexParams::from_bits_retain(7 << 26),
///     ..Default::default()
/// };
/// let frag = Fragment {
///     color: Rgba::WHITE,
///     texcoord: [0.5, 0.5],
///     depth: 0.0,
/// };
///
/// let sampler = pipeline.sampler(&polygon);
/// let variant = OutputVariant::new(DepthMode::Z, PassKind::Opaque);
/// let out = pipeline
///     .shade(variant, sampler.as_ref(), &polygon, &frag)
///     .unwrap();
/// // Stored in BGRA order
/// assert_eq!(out.color, Rgba::new(1.0, 0.0, 0.0, 1.0));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FragmentPipeline<'a> {
    config: &'a ShaderConfig,
    texture: &'a TextureMemory,
    palette: &'a PaletteMemory,
}

impl<'a> FragmentPipeline<'a> {
    /// Bind the pipeline to a configuration and the two memory planes
    pub fn new(
        config: &'a ShaderConfig,
        texture: &'a TextureMemory,
        palette: &'a PaletteMemory,
    ) -> Self {
        Self {
            config,
            texture,
            palette,
        }
    }

    /// Shared configuration
    pub fn config(&self) -> &'a ShaderConfig {
        self.config
    }

    /// Resolve the sampler for one polygon
    ///
    /// Call once per polygon at draw setup. Returns `None` when the
    /// polygon's fragments never read a texel.
    pub fn sampler(&self, polygon: &PolygonState) -> Option<Sampler<'a>> {
        let desc = TextureDescriptor::from_params(polygon.tex_params, polygon.palette_base);
        if !Compositor::new(self.config).uses_texture(&desc) {
            return None;
        }

        log::trace!(
            "Texture bound: {:?} {}x{} base=0x{:05X} pal=0x{:04X} wrap=({:?},{:?}) filter={:?}",
            desc.format,
            desc.width,
            desc.height,
            desc.texel_base,
            desc.palette_base,
            desc.wrap_s,
            desc.wrap_t,
            self.config.filter
        );

        let decoder = TexelDecoder::new(&desc, self.texture, self.palette);
        Some(Sampler::new(decoder, self.config.filter))
    }

    /// Composited color of one fragment, in BGRA order
    ///
    /// `sampler` is the polygon's [`sampler`](Self::sampler).
    #[inline]
    pub fn final_color(
        &self,
        sampler: Option<&Sampler<'_>>,
        polygon: &PolygonState,
        frag: &Fragment,
    ) -> Rgba {
        let texel = sampler.map(|s| s.sample(frag.texcoord));
        Compositor::new(self.config).final_color(frag.color, polygon.attr, texel)
    }

    /// Shade one fragment through an output variant
    ///
    /// Returns `None` if the fragment is discarded.
    #[inline]
    pub fn shade(
        &self,
        variant: OutputVariant,
        sampler: Option<&Sampler<'_>>,
        polygon: &PolygonState,
        frag: &Fragment,
    ) -> Option<FragmentOutput> {
        if variant.pass == PassKind::ShadowMask {
            return variant.shade(Rgba::OPAQUE_BLACK, polygon.attr, frag.depth);
        }
        let color = self.final_color(sampler, polygon, frag);
        variant.shade(color, polygon.attr, frag.depth)
    }

    /// Shade every fragment of one polygon
    ///
    /// The texture is resolved once for the whole slice. The result holds one
    /// entry per input fragment, `None` for discarded ones.
    pub fn shade_batch(
        &self,
        variant: OutputVariant,
        polygon: &PolygonState,
        frags: &[Fragment],
    ) -> Vec<Option<FragmentOutput>> {
        log::trace!(
            "Shading {} fragments, attr={:#010X} tex={:#010X} {:?}/{:?}",
            frags.len(),
            polygon.attr.bits(),
            polygon.tex_params.bits(),
            variant.depth,
            variant.pass
        );

        let sampler = match variant.pass {
            PassKind::ShadowMask => None,
            _ => self.sampler(polygon),
        };
        frags
            .iter()
            .map(|f| self.shade(variant, sampler.as_ref(), polygon, f))
            .collect()
    }
}
