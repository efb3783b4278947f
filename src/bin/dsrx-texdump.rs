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

//! dsrx-texdump entry point
//!
//! Inspects texture and fog state captured from a running game:
//! - `texdump`: decodes one texture from texel/palette plane dumps through the
//!   configured filter and writes it as a binary PPM
//! - `fog`: prints the fog density curve of a configuration

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use dsrx::core::gpu3d::{
    FilterMode, FogUnit, PaletteMemory, RenderConfig, Sampler, ShaderConfig, TexParams,
    TextureDescriptor, TextureMemory, TexelDecoder,
};

/// Largest accepted `--scale`
const MAX_SCALE: i64 = 64;

/// DS 3D texture and fog inspection tool
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a texture to a PPM image
    Texdump {
        /// Texel plane dump (512 KiB)
        #[arg(long)]
        texture: PathBuf,

        /// Palette plane dump (96 KiB)
        #[arg(long)]
        palette: PathBuf,

        /// Texture parameter word (TEXIMAGE_PARAM), decimal or 0x-prefixed hex
        #[arg(long, value_parser = parse_u32)]
        params: u32,

        /// Palette base (PLTT_BASE), decimal or 0x-prefixed hex
        #[arg(long, value_parser = parse_u32, default_value = "0")]
        palette_base: u32,

        /// Render config (TOML or JSON) supplying the filter
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the filter from the config
        #[arg(long, value_enum)]
        filter: Option<FilterMode>,

        /// Output pixels per texel (1 to 64)
        #[arg(
            short,
            long,
            default_value = "1",
            value_parser = clap::value_parser!(u32).range(1..=MAX_SCALE)
        )]
        scale: u32,

        /// Output PPM path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print the fog density curve
    Fog {
        /// Render config (TOML or JSON)
        #[arg(long)]
        config: PathBuf,

        /// Number of depth steps to print
        #[arg(long, default_value = "32")]
        steps: u32,
    },
}

fn parse_u32(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid number '{}': {}", s, e))
}

fn load_config(path: Option<&Path>) -> dsrx::Result<RenderConfig> {
    match path {
        Some(path) => RenderConfig::load(path),
        None => Ok(RenderConfig::default()),
    }
}

#[allow(clippy::too_many_arguments)]
fn texdump(
    texture: &Path,
    palette: &Path,
    params: u32,
    palette_base: u32,
    config: Option<&Path>,
    filter: Option<FilterMode>,
    scale: u32,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config)?;
    let mode = filter.unwrap_or(config.filter);

    let tex = TextureMemory::from_bytes(&std::fs::read(texture)?)?;
    let pal = PaletteMemory::from_bytes(&std::fs::read(palette)?)?;

    let desc = TextureDescriptor::from_params(TexParams::from_bits_retain(params), palette_base);
    let width = desc.width as u32 * scale;
    let height = desc.height as u32 * scale;

    log::info!(
        "Decoding {:?} {}x{} texture with {:?} filter at {}x",
        desc.format,
        desc.width,
        desc.height,
        mode,
        scale
    );

    let sampler = Sampler::new(TexelDecoder::new(&desc, &tex, &pal), mode);

    let mut out = BufWriter::new(File::create(output)?);
    write!(out, "P6\n{} {}\n255\n", width, height)?;
    for y in 0..height {
        for x in 0..width {
            let st = [
                (x as f32 + 0.5) / scale as f32,
                (y as f32 + 0.5) / scale as f32,
            ];
            let [r, g, b, _] = sampler.sample(st).to_rgba8();
            out.write_all(&[r, g, b])?;
        }
    }
    out.flush()?;

    log::info!("Wrote {}", output.display());
    Ok(())
}

fn fog(config: &Path, steps: u32) -> dsrx::Result<()> {
    let config = RenderConfig::load(config)?;
    let shader = ShaderConfig::try_from(&config)?;
    let fog = FogUnit::new(&shader);

    if !fog.enabled() {
        log::warn!("Fog is disabled in DISP3DCNT; densities shown are not applied");
    }

    let steps = steps.max(1);
    println!("{:>10}  {:>8}", "depth", "density");
    for i in 0..=steps {
        let depth = i as f32 / steps as f32;
        println!("{:>10.6}  {:>8.5}", depth, fog.density(depth));
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();

    match args.command {
        Command::Texdump {
            texture,
            palette,
            params,
            palette_base,
            config,
            filter,
            scale,
            output,
        } => texdump(
            &texture,
            &palette,
            params,
            palette_base,
            config.as_deref(),
            filter,
            scale,
            &output,
        )?,
        Command::Fog { config, steps } => fog(&config, steps)?,
    }

    Ok(())
}
