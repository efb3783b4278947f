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

//! End-to-end shading through FragmentPipeline

use std::cell::Cell;
use std::sync::Once;

use crate::core::gpu3d::{
    DepthMode, Disp3dCnt, FilterMode, FogUnit, Fragment, FragmentPipeline, OutputVariant,
    PaletteMemory, PassKind, PolygonAttr, PolygonState, RenderConfig, Rgba, ShaderConfig,
    TexParams, TextureMemory,
};

/// 8×8 texture parameter word for a format, no repeat
fn params(format: u32) -> TexParams {
    TexParams::from_bits_retain(format << 26)
}

fn config(disp_cnt: Disp3dCnt, filter: FilterMode) -> ShaderConfig {
    let config = RenderConfig {
        disp_cnt: disp_cnt.bits(),
        fog_density: (0..33).map(|i| (i * 2) as u8).collect(),
        fog_shift: 4,
        filter,
        ..Default::default()
    };
    ShaderConfig::try_from(&config).unwrap()
}

fn frag(color: Rgba, s: f32, t: f32) -> Fragment {
    Fragment {
        color,
        texcoord: [s, t],
        depth: 0.5,
    }
}

/// A5I3 texture whose texel (s, t) has alpha `s * 4` and palette index 1
fn a5i3_fixture() -> (TextureMemory, PaletteMemory) {
    let mut tex = TextureMemory::new();
    let mut pal = PaletteMemory::new();
    for t in 0..8u32 {
        for s in 0..8u32 {
            let alpha = (s * 4).min(31) as u8;
            tex.write_bytes(t * 8 + s, &[(alpha << 3) | 1]);
        }
    }
    pal.write_entry(1, 0x7FFF);
    (tex, pal)
}

#[test]
fn test_opaque_pass_alpha_threshold() {
    let config = config(Disp3dCnt::TEXTURE_MAPPING, FilterMode::Nearest);
    let tex = TextureMemory::new();
    let pal = PaletteMemory::new();
    let pipeline = FragmentPipeline::new(&config, &tex, &pal);
    let variant = OutputVariant::new(DepthMode::Z, PassKind::Opaque);
    let polygon = PolygonState::default();

    let sampler = pipeline.sampler(&polygon);

    let solid = pipeline.shade(
        variant,
        sampler.as_ref(),
        &polygon,
        &frag(Rgba::WHITE, 0.0, 0.0),
    );
    assert!(solid.is_some());

    let almost = Rgba::WHITE.with_alpha(30.0 / 31.0);
    let out = pipeline.shade(variant, sampler.as_ref(), &polygon, &frag(almost, 0.0, 0.0));
    assert!(out.is_none());
}

#[test]
fn test_texel_alpha_routes_between_passes() {
    let config = config(Disp3dCnt::TEXTURE_MAPPING, FilterMode::Nearest);
    let (tex, pal) = a5i3_fixture();
    let pipeline = FragmentPipeline::new(&config, &tex, &pal);
    let polygon = PolygonState {
        tex_params: params(6),
        ..Default::default()
    };

    let sampler = pipeline.sampler(&polygon);
    let sampler = sampler.as_ref();
    let opaque = OutputVariant::new(DepthMode::W, PassKind::Opaque);
    let translucent = OutputVariant::new(DepthMode::W, PassKind::Translucent);

    // s = 0: alpha 0, dropped by both passes
    let f = frag(Rgba::WHITE, 0.5, 0.5);
    assert!(pipeline.shade(opaque, sampler, &polygon, &f).is_none());
    assert!(pipeline.shade(translucent, sampler, &polygon, &f).is_none());

    // s = 4: alpha 16/31, translucent only
    let f = frag(Rgba::WHITE, 4.5, 0.5);
    assert!(pipeline.shade(opaque, sampler, &polygon, &f).is_none());
    let out = pipeline.shade(translucent, sampler, &polygon, &f).unwrap();
    assert_eq!(out.color, Rgba::new(1.0, 1.0, 1.0, 16.0 / 31.0));
    assert_eq!(out.depth, Some(0.5));

    // s = 7: alpha 28/31 < 30.5/31, still translucent
    let f = frag(Rgba::WHITE, 7.5, 0.5);
    assert!(pipeline.shade(opaque, sampler, &polygon, &f).is_none());
    assert!(pipeline.shade(translucent, sampler, &polygon, &f).is_some());
}

#[test]
fn test_color0_transparent_is_discarded() {
    let config = config(Disp3dCnt::TEXTURE_MAPPING, FilterMode::Nearest);
    let mut tex = TextureMemory::new();
    let mut pal = PaletteMemory::new();
    // I4: texel 0 uses index 0, texel 1 index 2
    tex.write_bytes(0, &[0x20]);
    pal.write_entries(0, &[0x001F, 0x03E0, 0x7C00]);

    let pipeline = FragmentPipeline::new(&config, &tex, &pal);
    let variant = OutputVariant::new(DepthMode::Z, PassKind::Opaque);

    let keep0 = PolygonState {
        tex_params: params(3),
        ..Default::default()
    };
    let clear0 = PolygonState {
        tex_params: params(3) | TexParams::COLOR0_TRANSPARENT,
        ..Default::default()
    };

    let keep0_sampler = pipeline.sampler(&keep0);
    let clear0_sampler = pipeline.sampler(&clear0);
    let f0 = frag(Rgba::WHITE, 0.0, 0.0);
    let f1 = frag(Rgba::WHITE, 1.0, 0.0);

    // Red, stored BGRA
    assert_eq!(
        pipeline
            .shade(variant, keep0_sampler.as_ref(), &keep0, &f0)
            .unwrap()
            .color,
        Rgba::new(0.0, 0.0, 1.0, 1.0)
    );
    assert!(pipeline
        .shade(variant, clear0_sampler.as_ref(), &clear0, &f0)
        .is_none());
    // Blue, stored BGRA
    assert_eq!(
        pipeline
            .shade(variant, clear0_sampler.as_ref(), &clear0, &f1)
            .unwrap()
            .color,
        Rgba::new(1.0, 0.0, 0.0, 1.0)
    );
}

#[test]
fn test_texturing_disabled_uses_vertex_color() {
    let config = config(Disp3dCnt::empty(), FilterMode::Bilinear);
    let (tex, pal) = a5i3_fixture();
    let pipeline = FragmentPipeline::new(&config, &tex, &pal);
    let polygon = PolygonState {
        tex_params: params(6),
        ..Default::default()
    };

    let v = Rgba::new(0.25, 0.5, 0.75, 1.0);
    assert!(pipeline.sampler(&polygon).is_none());
    assert_eq!(pipeline.final_color(None, &polygon, &frag(v, 0.5, 0.5)), v.bgra());
}

#[test]
fn test_shadow_mask_writes_marker_only() {
    let config = config(Disp3dCnt::TEXTURE_MAPPING, FilterMode::Nearest);
    let (tex, pal) = a5i3_fixture();
    let pipeline = FragmentPipeline::new(&config, &tex, &pal);
    let polygon = PolygonState {
        attr: PolygonAttr::from_bits_retain(3 << 4),
        tex_params: params(6),
        ..Default::default()
    };

    let variant = OutputVariant::new(DepthMode::W, PassKind::ShadowMask);
    let out = pipeline
        .shade(variant, None, &polygon, &frag(Rgba::TRANSPARENT, 0.5, 0.5))
        .unwrap();
    assert_eq!(out.color, Rgba::OPAQUE_BLACK);
    assert_eq!(out.attr, None);
    assert_eq!(out.depth, Some(0.5));
}

#[test]
fn test_shade_batch_matches_single_fragments() {
    for filter in [
        FilterMode::Nearest,
        FilterMode::Bilinear,
        FilterMode::EdgeAdaptive,
    ] {
        let config = config(Disp3dCnt::TEXTURE_MAPPING, filter);
        let (tex, pal) = a5i3_fixture();
        let pipeline = FragmentPipeline::new(&config, &tex, &pal);
        let polygon = PolygonState {
            attr: PolygonAttr::FOG,
            tex_params: params(6) | TexParams::REPEAT_S | TexParams::REPEAT_T,
            ..Default::default()
        };

        let frags: Vec<Fragment> = (0..32)
            .map(|i| frag(Rgba::WHITE, i as f32 * 0.37, i as f32 * 0.21))
            .collect();

        let sampler = pipeline.sampler(&polygon);
        for variant in OutputVariant::ALL {
            let batch = pipeline.shade_batch(variant, &polygon, &frags);
            assert_eq!(batch.len(), frags.len());
            for (f, out) in frags.iter().zip(&batch) {
                assert_eq!(*out, pipeline.shade(variant, sampler.as_ref(), &polygon, f));
            }
        }
    }
}

#[test]
fn test_uniform_texture_filters_agree() {
    let mut tex = TextureMemory::new();
    let pal = PaletteMemory::new();
    for i in 0..64u32 {
        tex.write_bytes(i * 2, &0x83E0u16.to_le_bytes());
    }

    let polygon = PolygonState {
        tex_params: params(7) | TexParams::REPEAT_S | TexParams::REPEAT_T,
        ..Default::default()
    };
    let f = frag(Rgba::WHITE, 3.3, 5.8);

    let colors: Vec<Rgba> = [
        FilterMode::Nearest,
        FilterMode::Bilinear,
        FilterMode::EdgeAdaptive,
    ]
    .into_iter()
    .map(|filter| {
        let config = config(Disp3dCnt::TEXTURE_MAPPING, filter);
        let pipeline = FragmentPipeline::new(&config, &tex, &pal);
        let sampler = pipeline.sampler(&polygon);
        pipeline.final_color(sampler.as_ref(), &polygon, &f)
    })
    .collect();

    assert_eq!(colors[0], Rgba::new(0.0, 1.0, 0.0, 1.0));
    assert_eq!(colors[1], colors[0]);
    assert_eq!(colors[2], colors[0]);
}

#[test]
fn test_opaque_output_feeds_fog_resolve() {
    let config = config(
        Disp3dCnt::TEXTURE_MAPPING | Disp3dCnt::FOG_ENABLE,
        FilterMode::Nearest,
    );
    let tex = TextureMemory::new();
    let pal = PaletteMemory::new();
    let pipeline = FragmentPipeline::new(&config, &tex, &pal);
    let variant = OutputVariant::new(DepthMode::W, PassKind::Opaque);

    let fogged = PolygonState {
        attr: PolygonAttr::FOG | PolygonAttr::from_bits_retain(7 << 24),
        ..Default::default()
    };
    let clear = PolygonState::default();

    let mut depth = vec![0.0f32; 2];
    let mut attr = vec![Rgba::TRANSPARENT; 2];
    for (i, polygon) in [fogged, clear].iter().enumerate() {
        let f = Fragment {
            color: Rgba::WHITE,
            texcoord: [0.0, 0.0],
            depth: 1.0,
        };
        let sampler = pipeline.sampler(polygon);
        let out = pipeline
            .shade(variant, sampler.as_ref(), polygon, &f)
            .unwrap();
        depth[i] = out.depth.unwrap();
        out.attr.unwrap().apply(&mut attr[i]);
    }

    assert_eq!(attr[0], Rgba::new(7.0 / 63.0, 0.0, 1.0, 1.0));

    let densities = FogUnit::new(&config).resolve(&depth, &attr).unwrap();
    assert_eq!(densities, vec![64.0 / 127.0, 0.0]);
}

thread_local! {
    static LOG_RECORDS: Cell<usize> = const { Cell::new(0) };
}

/// Counts records emitted on the current thread
struct RecordCounter;

impl log::Log for RecordCounter {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }

    fn log(&self, _: &log::Record) {
        LOG_RECORDS.with(|n| n.set(n.get() + 1));
    }

    fn flush(&self) {}
}

static RECORD_COUNTER: RecordCounter = RecordCounter;

fn log_records() -> usize {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        if log::set_logger(&RECORD_COUNTER).is_ok() {
            log::set_max_level(log::LevelFilter::Trace);
        }
    });
    LOG_RECORDS.with(Cell::get)
}

#[test]
fn test_per_fragment_shading_does_not_log() {
    let config = config(Disp3dCnt::TEXTURE_MAPPING, FilterMode::Bilinear);
    let (tex, pal) = a5i3_fixture();
    let pipeline = FragmentPipeline::new(&config, &tex, &pal);
    let polygon = PolygonState {
        tex_params: params(6),
        ..Default::default()
    };
    let variant = OutputVariant::new(DepthMode::Z, PassKind::Translucent);

    let before = log_records();
    let sampler = pipeline.sampler(&polygon);
    let after_setup = log_records();
    assert_eq!(after_setup - before, 1);

    for i in 0..100 {
        let f = frag(Rgba::WHITE, (i % 8) as f32 + 0.5, 0.5);
        pipeline.shade(variant, sampler.as_ref(), &polygon, &f);
        pipeline.final_color(sampler.as_ref(), &polygon, &f);
    }
    assert_eq!(log_records(), after_setup);

    // A batch logs at setup only, independent of its length
    let frags: Vec<Fragment> = (0..100).map(|_| frag(Rgba::WHITE, 4.5, 0.5)).collect();
    pipeline.shade_batch(variant, &polygon, &frags);
    assert_eq!(log_records() - after_setup, 2);
}
