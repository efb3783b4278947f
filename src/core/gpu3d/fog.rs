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

//! Depth fog
//!
//! Fog runs as a resolve pass after all polygons are drawn. For every pixel
//! whose attribute fog flag is set, the stored depth is mapped through a
//! piecewise-linear density table:
//!
//! ```text
//! idepth = depth * 2^24
//! idepth <  offset:  density = table[0]
//! idepth >= offset:  u = ((idepth - offset) >> 2) << shift
//!                    index = u >> 17            (clamped to 32)
//!                    frac  = u & 0x1FFFF        (0 when clamped)
//!                    density = mix(table[index], table[index + 1], frac / 2^17)
//! ```
//!
//! Blending the color buffer towards the fog color by this density is done by
//! the display stage.

use super::config::{ShaderConfig, FOG_TABLE_LEN};
use super::primitives::{mix, Rgba};
use super::registers::Disp3dCnt;

/// Last valid table index
const LAST_INDEX: u32 = (FOG_TABLE_LEN - 1) as u32;

/// Fog density evaluator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FogUnit {
    table: [f32; FOG_TABLE_LEN + 1],
    offset: i32,
    shift: u32,
    enabled: bool,
}

impl FogUnit {
    /// Capture the fog state of a configuration
    pub fn new(config: &ShaderConfig) -> Self {
        Self {
            table: config.fog_density,
            offset: config.fog_offset as i32,
            shift: config.fog_shift,
            enabled: config.disp_cnt.contains(Disp3dCnt::FOG_ENABLE),
        }
    }

    /// Whether the fog master enable is set
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Fog density for a normalized depth in [0, 1]
    ///
    /// # Examples
    ///
    /// ```
    /// use dsrx::core::gpu3d::{FogUnit, RenderConfig, ShaderConfig};
    ///
    /// let mut config = RenderConfig::default();
    /// config.fog_density = (0..33).map(|i| i as u8).collect();
    /// config.fog_offset = 0x10000;
    /// config.fog_shift = 1;
    ///
    /// let fog = FogUnit::new(&ShaderConfig::try_from(&config).unwrap());
    /// assert_eq!(fog.density(0.0), 0.0);
    /// assert_eq!(fog.density(1.0), 32.0 / 127.0);
    /// ```
    #[inline]
    pub fn density(&self, depth: f32) -> f32 {
        let idepth = (depth * 16_777_216.0) as i32;
        if idepth < self.offset {
            return self.table[0];
        }

        let u = (((idepth - self.offset) as u32) >> 2).wrapping_shl(self.shift);
        let (index, frac) = match u >> 17 {
            i if i >= LAST_INDEX => (LAST_INDEX, 0),
            i => (i, u & 0x1_FFFF),
        };

        let index = index as usize;
        mix(
            self.table[index],
            self.table[index + 1],
            frac as f32 / 131_072.0,
        )
    }

    /// Run the resolve pass over a depth/attribute buffer pair
    ///
    /// Returns one density per pixel: the fog density where the attribute
    /// fog channel (`b`) is non-zero, 0 elsewhere. Returns `None` without
    /// touching the buffers when fog is disabled globally.
    ///
    /// Buffers of different length are resolved up to the shorter one.
    pub fn resolve(&self, depth: &[f32], attr: &[Rgba]) -> Option<Vec<f32>> {
        if !self.enabled {
            log::debug!("Fog disabled, skipping resolve pass");
            return None;
        }

        log::trace!(
            "Fog resolve: {} pixels, offset={:#X}, shift={}",
            depth.len().min(attr.len()),
            self.offset,
            self.shift
        );

        let out = depth
            .iter()
            .zip(attr)
            .map(|(&d, a)| if a.b != 0.0 { self.density(d) } else { 0.0 })
            .collect();
        Some(out)
    }
}
