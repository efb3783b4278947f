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

//! Texture/vertex color combination
//!
//! Implements the four polygon blend modes on top of a sampled texel:
//!
//! | Mode | Vertex color | Textured result |
//! |------|--------------|-----------------|
//! | 0 Modulate | as-is | `vertex * texel` |
//! | 1 Decal | as-is | `texel.rgb * texel.a + vertex.rgb * (1 - texel.a)`, vertex alpha |
//! | 2 Toon | `toon[r]` | modulate |
//! | 2 Highlight | `r` replicated | modulate, then `+ toon[r]` saturated |
//! | 3 Shadow | as-is | decal |

use super::config::ShaderConfig;
use super::primitives::Rgba;
use super::registers::{BlendMode, PolygonAttr};
use super::texture::TextureDescriptor;

/// Blend-mode combiner over a shared configuration
#[derive(Debug, Clone, Copy)]
pub struct Compositor<'a> {
    config: &'a ShaderConfig,
}

impl<'a> Compositor<'a> {
    /// Create a compositor reading toon colors and display flags from `config`
    pub fn new(config: &'a ShaderConfig) -> Self {
        Self { config }
    }

    /// Whether fragments of a polygon with this texture need a texel at all
    ///
    /// False for untextured polygons and when texture mapping is disabled
    /// globally.
    #[inline]
    pub fn uses_texture(&self, desc: &TextureDescriptor) -> bool {
        desc.is_textured() && self.config.texturing()
    }

    /// Combine vertex color and texel into the stored fragment color
    ///
    /// `texel` is `None` for untextured polygons. A texel is also ignored
    /// when texture mapping is disabled globally. The result is in BGRA
    /// order.
    ///
    /// # Examples
    ///
    /// ```
    /// use dsrx::core::gpu3d::{Compositor, PolygonAttr, Rgba, ShaderConfig};
    ///
    /// let config = ShaderConfig::default();
    /// let compositor = Compositor::new(&config);
    ///
    /// let vertex = Rgba::new(1.0, 0.5, 0.0, 1.0);
    /// let texel = Rgba::new(0.5, 1.0, 1.0, 1.0);
    ///
    /// // Modulate, output swizzled to BGRA
    /// let out = compositor.final_color(vertex, PolygonAttr::empty(), Some(texel));
    /// assert_eq!(out, Rgba::new(0.0, 0.5, 0.5, 1.0));
    /// ```
    pub fn final_color(&self, vertex: Rgba, attr: PolygonAttr, texel: Option<Rgba>) -> Rgba {
        let mode = attr.blend_mode();
        let highlight = self.config.highlight();

        let mut vcol = vertex;
        if mode == BlendMode::ToonHighlight {
            vcol = if highlight {
                Rgba::new(vertex.r, vertex.r, vertex.r, vertex.a)
            } else {
                self.config.toon_color(vertex.r).with_alpha(vertex.a)
            };
        }

        let mut col = match texel.filter(|_| self.config.texturing()) {
            None => vcol,
            Some(t) if mode.is_decal() => Rgba::new(
                t.r * t.a + vcol.r * (1.0 - t.a),
                t.g * t.a + vcol.g * (1.0 - t.a),
                t.b * t.a + vcol.b * (1.0 - t.a),
                vcol.a,
            ),
            Some(t) => vcol * t,
        };

        if mode == BlendMode::ToonHighlight && highlight {
            let toon = self.config.toon_color(vertex.r).with_alpha(0.0);
            col = (col + toon).saturate_rgb();
        }

        col.bgra()
    }
}
