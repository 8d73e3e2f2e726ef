// src/encode/spiht/tests.rs

use super::engine::Engine;
use super::geometry::BandGeometry;
use super::lists::{Lists, Pixel, SetKind};
use super::topology::{Joint, PlaneLocal, Topology};
use crate::container::BitStream;
use crate::container::bit_stream::UNBOUNDED;
use crate::image::{CoeffImage, CoefficientPlanes, Plane};
use crate::utils::progress::StepReport;
use std::collections::HashMap;

/// Deterministic integer-valued planes in `[-amplitude, amplitude]`.
fn lcg_image(width: u32, height: u32, seed: u64, amplitude: i64) -> CoeffImage {
    let mut state = seed;
    let mut img = CoeffImage::new(width, height);
    for plane in Plane::ALL {
        for y in 0..height {
            for x in 0..width {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                let v = ((state >> 33) % (2 * amplitude as u64 + 1)) as i64 - amplitude;
                img.set(x, y, plane, v as f64);
            }
        }
    }
    img
}

fn scenario_image() -> CoeffImage {
    let mut img = lcg_image(8, 8, 7, 20);
    img.set(0, 0, Plane::Y, 37.0);
    img.set(6, 1, Plane::Y, -35.0);
    img.set(2, 5, Plane::Y, 32.0);
    img
}

type Trace = Vec<(StepReport, Lists)>;

fn encode_traced<T: Topology>(
    img: &CoeffImage,
    geom: &BandGeometry,
    bits: u32,
) -> (BitStream, Trace) {
    let mut engine: Engine<T> = Engine::default();
    let mut trace = Vec::new();
    let stream = engine
        .encode_plane_with(img, geom, Plane::Y, bits, geom.levels as u8, |r, l| {
            trace.push((*r, l.clone()))
        })
        .unwrap();
    (stream, trace)
}

fn decode_traced<T: Topology>(
    stream: &mut BitStream,
    geom: &BandGeometry,
) -> (CoeffImage, Trace) {
    let mut engine: Engine<T> = Engine::default();
    let mut out = CoeffImage::new(geom.width, geom.height);
    let mut trace = Vec::new();
    engine
        .decode_plane_with(&mut out, geom, Plane::Y, stream, |r, l| {
            trace.push((*r, l.clone()))
        })
        .unwrap();
    (out, trace)
}

fn all_descendants<T: Topology>(topology: &T, geom: &BandGeometry, node: Pixel, out: &mut Vec<Pixel>) {
    if !topology.has_offspring(geom, node) {
        return;
    }
    for &child in &topology.offspring(geom, node) {
        out.push(child);
        all_descendants(topology, geom, child, out);
    }
}

/// Counts how often every coordinate is covered by LIP, LSP and the sets
/// described by LIS.
fn coverage<T: Topology>(topology: &T, geom: &BandGeometry, lists: &Lists) -> HashMap<Pixel, u32> {
    let mut covered: Vec<Pixel> = Vec::new();
    covered.extend(&lists.lip);
    covered.extend(&lists.lsp);
    for entry in &lists.lis {
        match entry.kind {
            SetKind::A => all_descendants(topology, geom, entry.root, &mut covered),
            SetKind::B => {
                for &child in &topology.offspring(geom, entry.root) {
                    all_descendants(topology, geom, child, &mut covered);
                }
            }
        }
    }
    let mut counts = HashMap::new();
    for px in covered {
        *counts.entry(px).or_insert(0) += 1;
    }
    counts
}

#[test]
fn test_scenario_first_pass() {
    let img = scenario_image();
    let geom = BandGeometry::new(8, 8, 2).unwrap();
    let (stream, trace) = encode_traced::<PlaneLocal>(&img, &geom, UNBOUNDED);

    assert_eq!(stream.max_steps(), 5);
    assert_eq!(trace.len(), 6);
    let (first, lists) = &trace[0];
    assert_eq!(first.bit_plane, 5);
    let mut lsp = lists.lsp.clone();
    lsp.sort();
    let mut expected = vec![
        Pixel::new(0, 0, Plane::Y),
        Pixel::new(6, 1, Plane::Y),
        Pixel::new(2, 5, Plane::Y),
    ];
    expected.sort();
    assert_eq!(lsp, expected);

    // decoding just the first step's bits recovers the signs
    let mut partial = stream.clone();
    partial.limit(first.total_bits());
    let (out, dec_trace) = decode_traced::<PlaneLocal>(&mut partial, &geom);
    assert_eq!(dec_trace[0].1, trace[0].1);
    assert_eq!(out.get(0, 0, Plane::Y), 48.0);
    assert_eq!(out.get(6, 1, Plane::Y), -48.0);
    assert_eq!(out.get(2, 5, Plane::Y), 48.0);
    assert_eq!(out.get(1, 0, Plane::Y), 0.0);
}

#[test]
fn test_decoder_mirrors_encoder_lists() {
    let img = scenario_image();
    let geom = BandGeometry::new(8, 8, 2).unwrap();
    let (mut stream, enc_trace) = encode_traced::<PlaneLocal>(&img, &geom, UNBOUNDED);
    let (_, dec_trace) = decode_traced::<PlaneLocal>(&mut stream, &geom);

    assert_eq!(enc_trace.len(), dec_trace.len());
    for ((er, el), (dr, dl)) in enc_trace.iter().zip(&dec_trace) {
        assert_eq!(er.bit_plane, dr.bit_plane);
        assert_eq!(er.sorting_bits, dr.sorting_bits);
        assert_eq!(er.refinement_bits, dr.refinement_bits);
        assert_eq!(el, dl);
    }
}

#[test]
fn test_plane_local_lossless() {
    let img = lcg_image(16, 16, 42, 100);
    let geom = BandGeometry::new(16, 16, 2).unwrap();
    let (mut stream, _) = encode_traced::<PlaneLocal>(&img, &geom, UNBOUNDED);
    let (out, _) = decode_traced::<PlaneLocal>(&mut stream, &geom);

    for y in 0..16 {
        for x in 0..16 {
            let c = img.get(x, y, Plane::Y);
            let d = out.get(x, y, Plane::Y);
            assert!((c - d).abs() <= 0.5, "({}, {}): {} vs {}", x, y, c, d);
            if c == 0.0 {
                assert_eq!(d, 0.0);
            } else {
                assert_eq!(c.signum(), d.signum());
            }
        }
    }
    // other planes untouched
    assert_eq!(out.max_magnitude(Plane::Cb), 0.0);
}

#[test]
fn test_joint_lossless_all_planes() {
    let img = lcg_image(16, 16, 3, 60);
    let geom = BandGeometry::new(16, 16, 2).unwrap();
    let (mut stream, _) = encode_traced::<Joint>(&img, &geom, UNBOUNDED);
    let (out, _) = decode_traced::<Joint>(&mut stream, &geom);

    for plane in Plane::ALL {
        for y in 0..16 {
            for x in 0..16 {
                let c = img.get(x, y, plane);
                let d = out.get(x, y, plane);
                assert!((c - d).abs() <= 0.5, "{} ({}, {}): {} vs {}", plane, x, y, c, d);
            }
        }
    }
}

#[test]
fn test_partition_invariant_plane_local() {
    let img = lcg_image(16, 8, 11, 50);
    let geom = BandGeometry::new(16, 8, 2).unwrap();
    let (_, trace) = encode_traced::<PlaneLocal>(&img, &geom, UNBOUNDED);

    for (report, lists) in &trace {
        let counts = coverage(&PlaneLocal, &geom, lists);
        assert_eq!(counts.len(), 16 * 8, "step {}", report.step);
        assert!(counts.values().all(|&c| c == 1), "step {}", report.step);
        assert!(counts.keys().all(|px| px.plane == Plane::Y));
    }
}

#[test]
fn test_partition_invariant_joint() {
    let img = lcg_image(8, 8, 5, 40);
    let geom = BandGeometry::new(8, 8, 2).unwrap();
    let (_, trace) = encode_traced::<Joint>(&img, &geom, UNBOUNDED);

    for (report, lists) in &trace {
        let counts = coverage(&Joint, &geom, lists);
        assert_eq!(counts.len(), 3 * 8 * 8, "step {}", report.step);
        assert!(counts.values().all(|&c| c == 1), "step {}", report.step);
    }
}

#[test]
fn test_budgeted_stream_is_prefix() {
    let img = lcg_image(16, 16, 9, 80);
    let geom = BandGeometry::new(16, 16, 2).unwrap();
    let (mut full, _) = encode_traced::<PlaneLocal>(&img, &geom, UNBOUNDED);
    let all: Vec<bool> = std::iter::from_fn(|| full.get()).collect();

    for budget in [1, 17, 100, 333] {
        let (mut cut, trace) = encode_traced::<PlaneLocal>(&img, &geom, budget);
        assert_eq!(cut.total_bits(), budget);
        assert!(trace.last().is_some_and(|(r, _)| r.finished));
        let bits: Vec<bool> = std::iter::from_fn(|| cut.get()).collect();
        assert_eq!(bits, &all[..budget as usize]);
    }
}

#[test]
fn test_truncated_decode_matches_budgeted_encode() {
    let img = lcg_image(16, 16, 21, 80);
    let geom = BandGeometry::new(16, 16, 2).unwrap();
    let (full, _) = encode_traced::<PlaneLocal>(&img, &geom, UNBOUNDED);
    let (_, enc_trace) = encode_traced::<PlaneLocal>(&img, &geom, 250);

    let mut cut = full.clone();
    cut.limit(250);
    let (_, dec_trace) = decode_traced::<PlaneLocal>(&mut cut, &geom);
    assert_eq!(enc_trace.len(), dec_trace.len());
    assert_eq!(enc_trace.last().map(|t| &t.1), dec_trace.last().map(|t| &t.1));
    assert!(dec_trace.last().is_some_and(|(r, _)| r.finished));
}

#[test]
fn test_truncated_decode_matches_joint_budgets() {
    let img = lcg_image(16, 16, 33, 80);
    let geom = BandGeometry::new(16, 16, 2).unwrap();
    let (full, _) = encode_traced::<Joint>(&img, &geom, UNBOUNDED);
    let full_bits = full.total_bits();

    for budget in [1, 5, 63, 500, 2001, full_bits - 1] {
        let (_, enc_trace) = encode_traced::<Joint>(&img, &geom, budget);
        let mut cut = full.clone();
        cut.limit(budget);
        let (_, dec_trace) = decode_traced::<Joint>(&mut cut, &geom);
        assert_eq!(enc_trace.len(), dec_trace.len(), "budget {}", budget);
        assert_eq!(
            enc_trace.last().map(|t| &t.1),
            dec_trace.last().map(|t| &t.1),
            "budget {}",
            budget
        );
        assert!(dec_trace.last().is_some_and(|(r, _)| r.finished), "budget {}", budget);
    }
}

#[test]
fn test_zero_plane_codes_single_pass() {
    let img = CoeffImage::new(8, 8);
    let geom = BandGeometry::new(8, 8, 2).unwrap();
    let (stream, trace) = encode_traced::<PlaneLocal>(&img, &geom, UNBOUNDED);
    assert_eq!(stream.max_steps(), 0);
    assert_eq!(trace.len(), 1);
    // one bit per low-band pixel and per root set
    assert_eq!(stream.total_bits(), 4 + 3);
}

#[test]
fn test_dimension_mismatch_rejected() {
    let img = CoeffImage::new(8, 8);
    let geom = BandGeometry::new(16, 16, 2).unwrap();
    let mut engine: Engine<PlaneLocal> = Engine::default();
    assert!(engine.encode_plane(&img, &geom, Plane::Y, 100, 2).is_err());
}
