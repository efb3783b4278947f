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

//! Vertex stage
//!
//! Converts transformed hardware vertices into the clip-space position and
//! interpolants the rasterizer feeds to the fragment pipeline.

use super::config::ShaderConfig;
use super::output::DepthMode;
use super::primitives::Rgba;
use super::registers::PolygonAttr;

/// A vertex as produced by the geometry engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Vertex {
    /// Screen X, screen Y, 24-bit depth (before depth shift), W in 16.16
    pub position: [i32; 4],

    /// 8-bit red, green, blue and 5-bit alpha
    pub color: [u8; 4],

    /// Texture coordinate in 12.4 fixed point
    pub texcoord: [i16; 2],

    /// Attribute word of the owning polygon
    pub attr: PolygonAttr,
}

/// Vertex stage output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexOutput {
    /// Clip-space position
    pub position: [f32; 4],

    /// Normalized vertex color
    pub color: Rgba,

    /// Texture coordinate in texel units
    pub texcoord: [f32; 2],

    /// Depth interpolant for W-buffer passes, in [0, 1]
    pub depth: Option<f32>,
}

/// Vertex stage for one depth convention
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexStage {
    mode: DepthMode,
    screen_size: [f32; 2],
}

impl VertexStage {
    /// Create a vertex stage for the render target size in `config`
    pub fn new(mode: DepthMode, config: &ShaderConfig) -> Self {
        Self {
            mode,
            screen_size: config.screen_size,
        }
    }

    /// Depth convention
    pub fn mode(&self) -> DepthMode {
        self.mode
    }

    /// Transform one vertex
    ///
    /// Z-buffer: `z = (z << shift) / 2^23 - 1`, then `xyz *= w`.
    /// W-buffer: depth interpolant `(z << shift) / 2^24`, clip `z = 0`,
    /// then `xy *= w`.
    ///
    /// # Examples
    ///
    /// ```
    /// use dsrx::core::gpu3d::{DepthMode, ShaderConfig, Vertex, VertexStage};
    ///
    /// let stage = VertexStage::new(DepthMode::W, &ShaderConfig::default());
    /// let v = Vertex {
    ///     position: [128, 96, 0x80_0000, 0x1_0000],
    ///     color: [255, 255, 255, 31],
    ///     texcoord: [16 * 3, 8],
    ///     ..Default::default()
    /// };
    ///
    /// let out = stage.process(&v);
    /// assert_eq!(out.position, [0.0, 0.0, 0.0, 1.0]);
    /// assert_eq!(out.texcoord, [3.0, 0.5]);
    /// assert_eq!(out.depth, Some(0.5));
    /// ```
    pub fn process(&self, v: &Vertex) -> VertexOutput {
        let shifted = (v.position[2] as u32).wrapping_shl(v.attr.depth_shift()) as f32;
        let w = v.position[3] as f32 / 65536.0;
        let x = v.position[0] as f32 * 2.0 / self.screen_size[0] - 1.0;
        let y = v.position[1] as f32 * 2.0 / self.screen_size[1] - 1.0;

        let (position, depth) = match self.mode {
            DepthMode::Z => {
                let z = shifted / 8_388_608.0 - 1.0;
                ([x * w, y * w, z * w, w], None)
            }
            DepthMode::W => ([x * w, y * w, 0.0, w], Some(shifted / 16_777_216.0)),
        };

        let [r, g, b, a] = v.color;
        VertexOutput {
            position,
            color: Rgba::new(
                r as f32 / 255.0,
                g as f32 / 255.0,
                b as f32 / 255.0,
                a as f32 / 31.0,
            ),
            texcoord: [v.texcoord[0] as f32 / 16.0, v.texcoord[1] as f32 / 16.0],
            depth,
        }
    }
}
