// src/encode/spiht/engine.rs

//! Bit-plane coding loop shared by every tree topology.
//!
//! One run codes a tree from the top bit plane `n_max` down to plane 0. Each
//! step is a sorting pass (LIP, then LIS) followed by a refinement pass over
//! the pixels that were significant before the step began. The run stops
//! early, mid-pass, as soon as the bitstream is exhausted.

use super::coder::{Decoder, Encoder, PassCoder, Step, StreamEnd};
use super::geometry::BandGeometry;
use super::lists::{Lists, SetEntry, SetKind};
use super::settings::ReportSettings;
use super::topology::{Topology, top_bit_plane};
use crate::container::BitStream;
use crate::image::{CoefficientPlanes, Plane};
use crate::utils::error::{Result, SpihtError};
use crate::utils::progress::StepReport;
use log::{debug, info};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub struct Engine<T: Topology> {
    topology: T,
    report: ReportSettings,
    lists: Lists,
    elapsed: Duration,
}

impl<T: Topology> Default for Engine<T> {
    fn default() -> Self {
        Self::new(ReportSettings::default())
    }
}

impl<T: Topology> Engine<T> {
    pub fn new(report: ReportSettings) -> Self {
        Self {
            topology: T::default(),
            report,
            lists: Lists::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Lists as left by the last run.
    pub fn lists(&self) -> &Lists {
        &self.lists
    }

    /// Time spent in list initialisation and coding passes since creation or
    /// the last [`reset_elapsed`](Self::reset_elapsed).
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn reset_elapsed(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    /// Encodes the tree of `plane` into a new stream of at most `bits` bits.
    pub fn encode_plane<P>(
        &mut self,
        planes: &P,
        geom: &BandGeometry,
        plane: Plane,
        bits: u32,
        level: u8,
    ) -> Result<BitStream>
    where
        P: CoefficientPlanes + ?Sized,
    {
        self.encode_plane_with(planes, geom, plane, bits, level, |_, _| {})
    }

    /// Like [`encode_plane`](Self::encode_plane), calling `observer` after
    /// every step.
    pub fn encode_plane_with<P, F>(
        &mut self,
        planes: &P,
        geom: &BandGeometry,
        plane: Plane,
        bits: u32,
        level: u8,
        mut observer: F,
    ) -> Result<BitStream>
    where
        P: CoefficientPlanes + ?Sized,
        F: FnMut(&StepReport, &Lists),
    {
        check_dimensions(planes, geom)?;

        let start = Instant::now();
        self.init_lists(geom, plane);
        let n_max = top_bit_plane(self.topology.max_magnitude(planes, plane));
        let max_steps = u8::try_from(n_max).map_err(|_| {
            SpihtError::InvalidArg(format!("top bit plane {} does not fit the stream header", n_max))
        })?;
        self.finish_init(start);

        self.say(format_args!("{} encoder enabled. Encoding plane {}.", T::NAME, plane));

        let mut stream = BitStream::new(max_steps, bits, level);
        {
            let mut coder = Encoder::new(planes, &mut stream);
            self.run(&mut coder, geom, n_max, &mut observer);
        }

        self.say(format_args!(
            "{} encoding done. {} bits ({:.1}B) stored in bitstream.",
            T::NAME,
            stream.total_bits(),
            stream.total_bits() as f64 / 8.0
        ));
        Ok(stream)
    }

    /// Decodes `stream` into the tree of `plane`. Returns the number of bits
    /// consumed.
    pub fn decode_plane<P>(
        &mut self,
        planes: &mut P,
        geom: &BandGeometry,
        plane: Plane,
        stream: &mut BitStream,
    ) -> Result<u32>
    where
        P: CoefficientPlanes + ?Sized,
    {
        self.decode_plane_with(planes, geom, plane, stream, |_, _| {})
    }

    pub fn decode_plane_with<P, F>(
        &mut self,
        planes: &mut P,
        geom: &BandGeometry,
        plane: Plane,
        stream: &mut BitStream,
        mut observer: F,
    ) -> Result<u32>
    where
        P: CoefficientPlanes + ?Sized,
        F: FnMut(&StepReport, &Lists),
    {
        check_dimensions(planes, geom)?;

        let start = Instant::now();
        self.init_lists(geom, plane);
        let n_max = stream.max_steps() as i32;
        self.finish_init(start);

        self.say(format_args!("{} decoder enabled. Decoding plane {}.", T::NAME, plane));

        stream.rewind();
        let consumed = {
            let mut coder = Decoder::new(planes, stream);
            self.run(&mut coder, geom, n_max, &mut observer);
            coder.bits()
        };

        self.say(format_args!(
            "{} decoding done. {} bits ({:.1}B) from bitstream have been processed.",
            T::NAME,
            consumed,
            consumed as f64 / 8.0
        ));
        Ok(consumed)
    }

    fn init_lists(&mut self, geom: &BandGeometry, plane: Plane) {
        self.lists.clear();
        self.topology.seed(geom, plane, &mut self.lists);
    }

    fn finish_init(&mut self, start: Instant) {
        let spent = start.elapsed();
        self.elapsed += spent;
        if self.report.timing {
            info!("Elapsed time on init = {:.8}", spent.as_secs_f64());
        }
    }

    fn run<C, F>(&mut self, coder: &mut C, geom: &BandGeometry, n_max: i32, observer: &mut F)
    where
        C: PassCoder,
        F: FnMut(&StepReport, &Lists),
    {
        for n in (0..=n_max).rev() {
            let threshold = 2f64.powi(n);
            let start = Instant::now();
            let refinable = self.lists.lsp.len();
            let before = coder.bits();

            self.sorting_pass(coder, geom, threshold);
            let sorting_bits = coder.bits() - before;
            if !coder.finished() {
                self.refinement_pass(coder, refinable, n);
            }
            let refinement_bits = coder.bits() - before - sorting_bits;

            let spent = start.elapsed();
            self.elapsed += spent;

            // lossless end point
            if n == 0 {
                coder.close();
            }

            let report = StepReport {
                step: (n_max - n + 1) as u32,
                bit_plane: n,
                sorting_bits,
                refinement_bits,
                lis: self.lists.lis.len(),
                lip: self.lists.lip.len(),
                lsp: self.lists.lsp.len(),
                finished: coder.finished(),
                elapsed: spent,
            };
            self.log_step(&report);
            observer(&report, &self.lists);

            if coder.finished() {
                break;
            }
        }
    }

    fn sorting_pass<C: PassCoder>(&mut self, coder: &mut C, geom: &BandGeometry, threshold: f64) {
        let pending = std::mem::take(&mut self.lists.lip);
        let mut kept = Vec::with_capacity(pending.len());
        let mut pending = pending.into_iter();
        while let Some(px) = pending.next() {
            match coder.exchange_pixel(px, threshold) {
                Ok(true) => self.lists.lsp.push(px),
                Ok(false) => kept.push(px),
                Err(StreamEnd) => {
                    kept.push(px);
                    kept.extend(pending);
                    self.lists.lip = kept;
                    return;
                }
            }
        }
        self.lists.lip = kept;

        // entries created while partitioning join the back of the queue and
        // are visited in this same pass
        let mut queue: VecDeque<SetEntry> = std::mem::take(&mut self.lists.lis).into();
        let mut retained = Vec::with_capacity(queue.len());
        while let Some(entry) = queue.pop_front() {
            match self.partition(coder, geom, entry, threshold, &mut queue) {
                Ok(true) => {}
                Ok(false) => retained.push(entry),
                Err(StreamEnd) => {
                    retained.push(entry);
                    retained.extend(queue);
                    break;
                }
            }
        }
        self.lists.lis = retained;
    }

    /// Tests one LIS entry and splits it when significant. Returns whether
    /// the entry was consumed.
    fn partition<C>(
        &mut self,
        coder: &mut C,
        geom: &BandGeometry,
        entry: SetEntry,
        threshold: f64,
        queue: &mut VecDeque<SetEntry>,
    ) -> Step<bool>
    where
        C: PassCoder,
    {
        let topology = &self.topology;
        let significant = coder
            .exchange_set(|planes| topology.is_significant(planes, geom, &entry, threshold))?;
        if !significant {
            return Ok(false);
        }

        let children = self.topology.offspring(geom, entry.root);
        match entry.kind {
            SetKind::A => {
                for &child in &children {
                    if coder.exchange_pixel(child, threshold)? {
                        self.lists.lsp.push(child);
                    } else {
                        self.lists.lip.push(child);
                    }
                }
                if children
                    .iter()
                    .any(|child| self.topology.has_offspring(geom, *child))
                {
                    queue.push_back(SetEntry::b(entry.root));
                }
            }
            SetKind::B => {
                for &child in &children {
                    if self.topology.has_offspring(geom, child) {
                        queue.push_back(SetEntry::a(child));
                    }
                }
            }
        }

        #[cfg(feature = "spiht-trace")]
        log::trace!(
            "LIS split {:?} at {} ({} children, queue {})",
            entry.kind,
            entry.root,
            children.len(),
            queue.len()
        );

        Ok(true)
    }

    fn refinement_pass<C: PassCoder>(&mut self, coder: &mut C, refinable: usize, bit_plane: i32) {
        for &px in &self.lists.lsp[..refinable] {
            if coder.exchange_refinement(px, bit_plane).is_err() {
                return;
            }
        }
    }

    fn log_step(&self, report: &StepReport) {
        if self.report.extended {
            info!("{}", report);
        } else {
            debug!("{}", report);
        }
        if self.report.timing {
            info!(
                "Step {} elapsed time = {:.8}",
                report.step,
                report.elapsed.as_secs_f64()
            );
        }
    }

    fn say(&self, message: std::fmt::Arguments<'_>) {
        if self.report.extended {
            info!("{}", message);
        } else {
            debug!("{}", message);
        }
    }
}

fn check_dimensions<P: CoefficientPlanes + ?Sized>(planes: &P, geom: &BandGeometry) -> Result<()> {
    let dims = planes.dimensions();
    if dims != (geom.width, geom.height) {
        return Err(SpihtError::InvalidArg(format!(
            "coefficient planes are {}x{} but the tree expects {}x{}",
            dims.0, dims.1, geom.width, geom.height
        )));
    }
    Ok(())
}
