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

//! dsrx: Nintendo DS 3D engine fragment pipeline
//!
//! This crate reproduces the per-fragment behavior of the DS 3D engine as an
//! accelerated renderer runs it: texel decoding for all seven texture
//! formats, optional texture filtering, polygon blend modes, output discard
//! rules and depth fog.
//!
//! # Architecture
//!
//! - [`core::gpu3d`]: Memory planes, decoders, sampler, compositor, output
//!   stage, vertex stage, fog and configuration
//! - [`core::error`]: Error types
//!
//! # Example
//!
//! ```
//! use dsrx::core::gpu3d::{
//!     Fragment, FragmentPipeline, PaletteMemory, PolygonState, Rgba, ShaderConfig,
//!     TextureMemory,
//! };
//!
//! let config = ShaderConfig::default();
//! let tex = TextureMemory::new();
//! let pal = PaletteMemory::new();
//! let pipeline = FragmentPipeline::new(&config, &tex, &pal);
//!
//! // Untextured polygon: the vertex color passes through, stored as BGRA
//! let frag = Fragment {
//!     color: Rgba::new(1.0, 0.0, 0.0, 1.0),
//!     ..Default::default()
//! };
//! let polygon = PolygonState::default();
//! let sampler = pipeline.sampler(&polygon);
//! let color = pipeline.final_color(sampler.as_ref(), &polygon, &frag);
//! assert_eq!(color, Rgba::new(0.0, 0.0, 1.0, 1.0));
//! ```
//!
//! # Error Handling
//!
//! Shading never fails. Loading configuration files and memory dumps returns
//! [`core::error::Result<T>`], an alias for `Result<T, RenderError>`.

pub mod core;

// Re-export commonly used types
pub use core::error::{RenderError, Result};
