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

//! Render configuration
//!
//! [`RenderConfig`] holds the shared configuration block in hardware units,
//! as it would be written to the 3D engine registers, and is what gets
//! saved to and loaded from disk. [`ShaderConfig`] is the validated and
//! normalized form read by the per-fragment code. It is immutable for the
//! duration of a draw call and passed around by reference.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{RenderError, Result};

use super::primitives::Rgba;
use super::registers::Disp3dCnt;
use super::sampler::FilterMode;

/// Number of fog density samples stored in the density table
pub const FOG_TABLE_LEN: usize = 33;

/// Largest fog density value (7 bits)
pub const FOG_DENSITY_MAX: u8 = 127;

/// Configuration in hardware units
///
/// # Examples
///
/// ```
/// use dsrx::core::gpu3d::{RenderConfig, ShaderConfig};
///
/// let config: RenderConfig = toml::from_str(
///     r#"
///     screen_width = 256
///     screen_height = 192
///     disp_cnt = 0x81
///     fog_offset = 0x8000
///     fog_shift = 6
///     "#,
/// ).unwrap();
///
/// let shader = ShaderConfig::try_from(&config).unwrap();
/// assert_eq!(shader.fog_shift, 6);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Render target width in pixels
    pub screen_width: u32,

    /// Render target height in pixels
    pub screen_height: u32,

    /// Display control word (DISP3DCNT)
    pub disp_cnt: u32,

    /// Toon/highlight table, RGB555
    pub toon_colors: [u16; 32],

    /// Edge marking colors, RGB555 (consumed by the display stage)
    pub edge_colors: [u16; 8],

    /// Fog color: RGB555 in bits 0-14, 5-bit alpha in bits 16-20
    pub fog_color: u32,

    /// Fog density table, 33 entries of 7 bits each
    pub fog_density: Vec<u8>,

    /// Fog start, in the 24-bit depth domain
    pub fog_offset: u32,

    /// Fog density step shift
    pub fog_shift: u32,

    /// Texture filter
    pub filter: FilterMode,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            screen_width: 256,
            screen_height: 192,
            disp_cnt: Disp3dCnt::default().bits(),
            toon_colors: [0; 32],
            edge_colors: [0; 8],
            fog_color: 0,
            fog_density: vec![0; FOG_TABLE_LEN],
            fog_offset: 0,
            fog_shift: 0,
            filter: FilterMode::default(),
        }
    }
}

impl RenderConfig {
    /// Load and validate a configuration file
    ///
    /// The format is chosen by extension: `.toml` or `.json`.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors, parse errors, unknown extensions, or values
    /// rejected by [`RenderConfig::validate`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let config: RenderConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&contents)?,
            Some("json") => serde_json::from_str(&contents)?,
            other => {
                return Err(RenderError::InvalidConfig(format!(
                    "unsupported config extension: {}",
                    other.unwrap_or("<none>")
                )))
            }
        };

        config.validate()?;
        log::debug!("Loaded render config from {}", path.display());
        Ok(config)
    }

    /// Save the configuration as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Check that every value fits its hardware field
    pub fn validate(&self) -> Result<()> {
        if self.screen_width == 0 || self.screen_height == 0 {
            return Err(RenderError::InvalidConfig(format!(
                "screen size must be non-zero, got {}x{}",
                self.screen_width, self.screen_height
            )));
        }

        if self.fog_density.len() != FOG_TABLE_LEN {
            return Err(RenderError::InvalidConfig(format!(
                "fog density table needs {} entries, got {}",
                FOG_TABLE_LEN,
                self.fog_density.len()
            )));
        }

        if let Some(i) = self.fog_density.iter().position(|&d| d > FOG_DENSITY_MAX) {
            return Err(RenderError::InvalidConfig(format!(
                "fog density {} at index {} exceeds {}",
                self.fog_density[i], i, FOG_DENSITY_MAX
            )));
        }

        if self.fog_shift > 31 {
            return Err(RenderError::InvalidConfig(format!(
                "fog shift {} out of range",
                self.fog_shift
            )));
        }

        if self.fog_offset >= 1 << 24 {
            return Err(RenderError::InvalidConfig(format!(
                "fog offset {:#X} exceeds 24 bits",
                self.fog_offset
            )));
        }

        Ok(())
    }
}

/// Normalized configuration read by the fragment pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderConfig {
    /// Render target size in pixels
    pub screen_size: [f32; 2],

    /// Display control flags
    pub disp_cnt: Disp3dCnt,

    /// Toon/highlight colors
    pub toon_colors: [Rgba; 32],

    /// Edge marking colors
    pub edge_colors: [Rgba; 8],

    /// Fog color
    pub fog_color: Rgba,

    /// Fog densities in [0, 1]; the last entry repeats the 33rd
    pub fog_density: [f32; FOG_TABLE_LEN + 1],

    /// Fog start, in the 24-bit depth domain
    pub fog_offset: u32,

    /// Fog density step shift
    pub fog_shift: u32,

    /// Texture filter
    pub filter: FilterMode,
}

impl ShaderConfig {
    /// Whether texture mapping is enabled globally
    #[inline]
    pub fn texturing(&self) -> bool {
        self.disp_cnt.contains(Disp3dCnt::TEXTURE_MAPPING)
    }

    /// Whether blend mode 2 shades as highlight rather than toon
    #[inline]
    pub fn highlight(&self) -> bool {
        self.disp_cnt.contains(Disp3dCnt::HIGHLIGHT)
    }

    /// Toon table entry for a normalized red channel
    ///
    /// The red channel is quantized to 5 bits by truncation.
    #[inline]
    pub fn toon_color(&self, red: f32) -> Rgba {
        let index = ((red * 31.0) as usize).min(31);
        self.toon_colors[index]
    }

    fn normalize(config: &RenderConfig) -> Self {
        let mut fog_density = [0.0; FOG_TABLE_LEN + 1];
        for (dst, &src) in fog_density.iter_mut().zip(&config.fog_density) {
            *dst = src as f32 / FOG_DENSITY_MAX as f32;
        }
        fog_density[FOG_TABLE_LEN] = fog_density[FOG_TABLE_LEN - 1];

        let fog_alpha = ((config.fog_color >> 16) & 0x1F) as f32 / 31.0;

        Self {
            screen_size: [config.screen_width as f32, config.screen_height as f32],
            disp_cnt: Disp3dCnt::from_bits_retain(config.disp_cnt),
            toon_colors: config.toon_colors.map(Rgba::from_rgb555),
            edge_colors: config.edge_colors.map(Rgba::from_rgb555),
            fog_color: Rgba::from_rgb555(config.fog_color as u16).with_alpha(fog_alpha),
            fog_density,
            fog_offset: config.fog_offset,
            fog_shift: config.fog_shift,
            filter: config.filter,
        }
    }
}

impl TryFrom<&RenderConfig> for ShaderConfig {
    type Error = RenderError;

    fn try_from(config: &RenderConfig) -> Result<Self> {
        config.validate()?;
        let shader = Self::normalize(config);
        log::debug!(
            "Shader config: {}x{}, DISP3DCNT={:#06X}, filter={:?}",
            config.screen_width,
            config.screen_height,
            config.disp_cnt,
            config.filter
        );
        Ok(shader)
    }
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self::normalize(&RenderConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RenderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.disp_cnt, 1);
        assert_eq!(config.fog_density.len(), FOG_TABLE_LEN);
    }

    #[test]
    fn test_validate_rejects_short_fog_table() {
        let config = RenderConfig {
            fog_density: vec![0; 32],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RenderError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_screen() {
        let config = RenderConfig {
            screen_height: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_wide_density() {
        let mut config = RenderConfig::default();
        config.fog_density[5] = 128;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_normalize_fog_table() {
        let mut config = RenderConfig::default();
        config.fog_density = (0..33).map(|i| (i * 127 / 32) as u8).collect();

        let shader = ShaderConfig::try_from(&config).unwrap();
        assert_eq!(shader.fog_density[0], 0.0);
        assert_eq!(shader.fog_density[32], 1.0);
        // Trailing duplicate
        assert_eq!(shader.fog_density[33], shader.fog_density[32]);
    }

    #[test]
    fn test_normalize_colors() {
        let mut config = RenderConfig::default();
        config.toon_colors[31] = 0x001F;
        config.fog_color = 0x001F_7C00;

        let shader = ShaderConfig::try_from(&config).unwrap();
        assert_eq!(shader.toon_colors[31], Rgba::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(shader.fog_color, Rgba::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(shader.screen_size, [256.0, 192.0]);
    }

    #[test]
    fn test_toon_color_quantizes_red() {
        let mut config = RenderConfig::default();
        config.toon_colors[15] = 0x03E0;
        let shader = ShaderConfig::try_from(&config).unwrap();

        assert_eq!(shader.toon_color(15.5 / 31.0), Rgba::new(0.0, 1.0, 0.0, 1.0));
        // Out-of-range red stays within the table
        assert_eq!(shader.toon_color(2.0), shader.toon_colors[31]);
    }

    #[test]
    fn test_flags() {
        let config = RenderConfig {
            disp_cnt: 0x02,
            ..Default::default()
        };
        let shader = ShaderConfig::try_from(&config).unwrap();
        assert!(!shader.texturing());
        assert!(shader.highlight());
    }

    #[test]
    fn test_save_load_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = RenderConfig::default();
        config.filter = FilterMode::EdgeAdaptive;
        config.fog_shift = 4;

        config.save(&path).unwrap();
        let loaded = RenderConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "screen_width": 512, "screen_height": 384, "filter": "bilinear" }"#,
        )
        .unwrap();

        let loaded = RenderConfig::load(&path).unwrap();
        assert_eq!(loaded.screen_width, 512);
        assert_eq!(loaded.filter, FilterMode::Bilinear);
        assert_eq!(loaded.fog_density.len(), FOG_TABLE_LEN);
    }

    #[test]
    fn test_load_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "").unwrap();

        let result = RenderConfig::load(&path);
        assert!(matches!(result, Err(RenderError::InvalidConfig(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = RenderConfig::load(dir.path().join("missing.toml"));
        assert!(matches!(result, Err(RenderError::Io(_))));
    }
}
