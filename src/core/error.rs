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

//! Error types
//!
//! The per-fragment path never fails: every address wraps into a valid plane
//! location. Errors only surface when loading configuration files or building
//! memory planes from raw dumps.

use thiserror::Error;

/// Errors raised by the fallible edges of the renderer
#[derive(Debug, Error)]
pub enum RenderError {
    /// Filesystem access failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML configuration could not be parsed
    #[error("failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML configuration could not be serialized
    #[error("failed to serialize TOML config: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON configuration could not be parsed
    #[error("failed to parse JSON config: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A memory dump does not match the plane it is loaded into
    #[error("{plane} plane expects {expected} bytes, got {actual}")]
    PlaneSize {
        /// Plane name ("texture" or "palette")
        plane: &'static str,
        /// Required size in bytes
        expected: usize,
        /// Size that was supplied
        actual: usize,
    },

    /// A configuration value is out of range
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type used by the fallible parts of the crate
pub type Result<T> = std::result::Result<T, RenderError>;
