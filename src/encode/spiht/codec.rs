// src/encode/spiht/codec.rs

//! Whole-image codecs on top of the coding engine.
//!
//! * [`SpihtCodec`]: one tree and one stream per plane (version `0xB0`).
//! * [`DegradedSpihtCodec`]: same layout under version `0xB1`.
//! * [`ColorSpihtCodec`]: a single tree and stream for all three planes
//!   (version `0xA0`).

use super::engine::Engine;
use super::geometry::BandGeometry;
use super::rate;
use super::settings::CodecSettings;
use super::topology::{DegradedTree, Joint, PlaneLocal, Topology};
use crate::container::{BitStream, Container};
use crate::image::{CoeffImage, Plane};
use crate::utils::error::{Result, SpihtError};
use crate::SPIHT_VERSION;
use log::{debug, info};
use std::path::Path;
use std::time::{Duration, Instant};

/// Common surface of the image codecs.
pub trait Codec {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Container version written and accepted by this codec.
    fn version(&self) -> u8;

    fn settings(&self) -> &CodecSettings;

    /// Encodes all three planes of `image` within `settings().bits`.
    fn encode(&mut self, image: &CoeffImage) -> Result<()>;

    /// Decodes the held container into `image`, which is reset to the coded
    /// dimensions first. A `desired_bits` of zero decodes everything.
    /// Returns the number of bits consumed.
    fn decode(&mut self, image: &mut CoeffImage, desired_bits: u32) -> Result<u32>;

    fn container(&self) -> &Container;

    fn container_mut(&mut self) -> &mut Container;

    /// Time spent in the last encode or decode.
    fn elapsed(&self) -> Duration;

    fn save(&self, path: &Path) -> Result<bool> {
        self.container().save(path)
    }

    fn load(&mut self, path: &Path) -> Result<bool> {
        self.container_mut().load(path)
    }

    fn image_width(&self) -> u32 {
        self.container().width()
    }

    fn image_height(&self) -> u32 {
        self.container().height()
    }
}

/// Codec with an independent tree per plane, generic over the tree rule.
///
/// Planes must be encoded in the order Y, Cb, Cr; encoding Y starts a new
/// container. Decoding has no ordering requirement.
pub struct PlanarCodec<T: Topology> {
    settings: CodecSettings,
    engine: Engine<T>,
    container: Container,
    next_plane: Plane,
    elapsed: Duration,
}

/// Plane-local SPIHT.
pub type SpihtCodec = PlanarCodec<PlaneLocal>;

/// Plane-local SPIHT stored as the degraded-tree format.
pub type DegradedSpihtCodec = PlanarCodec<DegradedTree>;

impl<T: Topology> PlanarCodec<T> {
    pub fn new(settings: CodecSettings) -> Self {
        Self {
            engine: Engine::new(settings.report),
            settings,
            container: Container::default(),
            next_plane: Plane::Y,
            elapsed: Duration::ZERO,
        }
    }

    /// Wraps an existing container, e.g. one read with [`Container::read_from`].
    pub fn with_container(mut self, container: Container) -> Self {
        self.container = container;
        self
    }

    /// Decomposition depth of `plane`; chroma carries the colour level shift.
    pub fn plane_levels(&self, plane: Plane) -> u32 {
        if plane.is_chroma() {
            self.settings.levels + self.settings.color_shift
        } else {
            self.settings.levels
        }
    }

    /// Plane expected by the next [`encode_plane`](Self::encode_plane) call
    /// that does not restart the cycle.
    pub fn next_plane(&self) -> Plane {
        self.next_plane
    }

    pub fn engine(&self) -> &Engine<T> {
        &self.engine
    }

    fn geometry(&self, width: u32, height: u32, plane: Plane) -> Result<BandGeometry> {
        BandGeometry::new(width, height, self.plane_levels(plane))
    }

    fn stream_level(&self, plane: Plane) -> Result<u8> {
        let levels = self.plane_levels(plane);
        u8::try_from(levels).map_err(|_| {
            SpihtError::InvalidArg(format!("{} decomposition levels do not fit a stream", levels))
        })
    }

    /// Encodes one plane with at most `bits` bits and appends its stream to
    /// the container. Returns the number of bits stored.
    pub fn encode_plane(&mut self, image: &CoeffImage, bits: u32, plane_id: u8) -> Result<u32> {
        let plane = Plane::try_from(plane_id)?;
        self.encode_one(image, bits, plane)
    }

    /// Decodes one plane's stream into `image`, reading at most `bits` bits
    /// (zero reads everything). Returns the number of bits consumed.
    pub fn decode_plane(&mut self, image: &mut CoeffImage, bits: u32, plane_id: u8) -> Result<u32> {
        let plane = Plane::try_from(plane_id)?;
        self.decode_one(image, bits, plane)
    }

    fn encode_one(&mut self, image: &CoeffImage, bits: u32, plane: Plane) -> Result<u32> {
        let (width, height) = (image.width(), image.height());
        let geom = self.geometry(width, height, plane)?;
        let level = self.stream_level(plane)?;

        if plane == Plane::Y {
            self.container = Container::new(T::VERSION, T::STREAM_COUNT, width, height)?;
        } else if plane != self.next_plane {
            return Err(SpihtError::OutOfOrderUse {
                expected: self.next_plane,
                actual: plane,
            });
        } else if (self.container.width(), self.container.height()) != (width, height) {
            return Err(SpihtError::InvalidArg(format!(
                "plane {} is {}x{} but the container holds a {}x{} image",
                plane,
                width,
                height,
                self.container.width(),
                self.container.height()
            )));
        }

        let stream = self.engine.encode_plane(image, &geom, plane, bits, level)?;
        let stored = stream.total_bits();
        self.container.push(stream);
        self.next_plane = plane.next().unwrap_or(Plane::Y);
        Ok(stored)
    }

    fn decode_one(&mut self, image: &mut CoeffImage, bits: u32, plane: Plane) -> Result<u32> {
        self.container.check(T::VERSION, T::STREAM_COUNT)?;
        let (width, height) = (self.container.width(), self.container.height());
        let geom = self.geometry(width, height, plane)?;
        let level = self.stream_level(plane)?;
        if (image.width(), image.height()) != (width, height) {
            image.reset(width, height);
        } else {
            image.plane_mut(plane).fill(0.0);
        }

        let stream = self.container.stream_mut(plane.index()).ok_or_else(|| {
            SpihtError::MalformedContainer(format!("no stream for plane {}", plane))
        })?;
        check_level(stream, level)?;
        stream.limit(bits);
        self.engine.decode_plane(image, &geom, plane, stream)
    }
}

impl<T: Topology> Codec for PlanarCodec<T> {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn version(&self) -> u8 {
        T::VERSION
    }

    fn settings(&self) -> &CodecSettings {
        &self.settings
    }

    fn encode(&mut self, image: &CoeffImage) -> Result<()> {
        self.engine.reset_elapsed();
        self.elapsed = Duration::ZERO;
        say(
            &self.settings,
            format_args!(
                "Base Color Plane Splitter for {} encoding enabled (spiht_codec {}).",
                T::NAME,
                SPIHT_VERSION
            ),
        );

        // reject bad levels before any plane is coded
        for plane in Plane::ALL {
            self.geometry(image.width(), image.height(), plane)?;
        }

        let start = Instant::now();
        let variances = rate::plane_variances(image, &self.settings);
        let spent = start.elapsed();
        self.elapsed += spent;
        if self.settings.report.timing {
            info!(
                "Variance measurement elapsed time: {:.8}",
                spent.as_secs_f64()
            );
        }

        let budgets = rate::split_budget(variances, self.settings.bits);
        for (plane, bits) in Plane::ALL.into_iter().zip(budgets) {
            self.encode_one(image, bits, plane)?;
        }
        Ok(())
    }

    fn decode(&mut self, image: &mut CoeffImage, desired_bits: u32) -> Result<u32> {
        self.engine.reset_elapsed();
        self.elapsed = Duration::ZERO;
        say(
            &self.settings,
            format_args!(
                "Base Color Plane Splitter for {} decoding enabled (spiht_codec {}).",
                T::NAME,
                SPIHT_VERSION
            ),
        );

        self.container.check(T::VERSION, T::STREAM_COUNT)?;
        image.reset(self.container.width(), self.container.height());

        let totals: Vec<u32> = self
            .container
            .streams()
            .iter()
            .map(BitStream::total_bits)
            .collect();
        let budgets = rate::split_decode_budget(&totals, desired_bits);

        let mut consumed = 0;
        for (plane, bits) in Plane::ALL.into_iter().zip(budgets) {
            consumed += self.decode_one(image, bits, plane)?;
        }
        Ok(consumed)
    }

    fn container(&self) -> &Container {
        &self.container
    }

    fn container_mut(&mut self) -> &mut Container {
        &mut self.container
    }

    fn elapsed(&self) -> Duration {
        self.elapsed + self.engine.elapsed()
    }
}

/// Codec coding Y, Cb and Cr as one tree into a single stream.
///
/// The colour level shift does not apply: all planes share `levels`.
pub struct ColorSpihtCodec {
    settings: CodecSettings,
    engine: Engine<Joint>,
    container: Container,
}

impl ColorSpihtCodec {
    pub fn new(settings: CodecSettings) -> Self {
        Self {
            engine: Engine::new(settings.report),
            settings,
            container: Container::default(),
        }
    }

    pub fn with_container(mut self, container: Container) -> Self {
        self.container = container;
        self
    }

    pub fn engine(&self) -> &Engine<Joint> {
        &self.engine
    }

    fn stream_level(&self) -> Result<u8> {
        u8::try_from(self.settings.levels).map_err(|_| {
            SpihtError::InvalidArg(format!(
                "{} decomposition levels do not fit a stream",
                self.settings.levels
            ))
        })
    }
}

impl Codec for ColorSpihtCodec {
    fn name(&self) -> &'static str {
        Joint::NAME
    }

    fn version(&self) -> u8 {
        Joint::VERSION
    }

    fn settings(&self) -> &CodecSettings {
        &self.settings
    }

    fn encode(&mut self, image: &CoeffImage) -> Result<()> {
        self.engine.reset_elapsed();
        say(
            &self.settings,
            format_args!("{} encoding enabled (spiht_codec {}).", Joint::NAME, SPIHT_VERSION),
        );
        let (width, height) = (image.width(), image.height());
        let geom = BandGeometry::new(width, height, self.settings.levels)?;
        let level = self.stream_level()?;

        self.container = Container::new(Joint::VERSION, Joint::STREAM_COUNT, width, height)?;
        let stream = self
            .engine
            .encode_plane(image, &geom, Plane::Y, self.settings.bits, level)?;
        self.container.push(stream);
        Ok(())
    }

    fn decode(&mut self, image: &mut CoeffImage, desired_bits: u32) -> Result<u32> {
        self.engine.reset_elapsed();
        say(
            &self.settings,
            format_args!("{} decoding enabled (spiht_codec {}).", Joint::NAME, SPIHT_VERSION),
        );
        self.container.check(Joint::VERSION, Joint::STREAM_COUNT)?;
        let (width, height) = (self.container.width(), self.container.height());
        let geom = BandGeometry::new(width, height, self.settings.levels)?;
        let level = self.stream_level()?;
        image.reset(width, height);

        let stream = self.container.stream_mut(0).ok_or_else(|| {
            SpihtError::MalformedContainer("container holds no stream".to_string())
        })?;
        check_level(stream, level)?;
        stream.limit(desired_bits);
        self.engine.decode_plane(image, &geom, Plane::Y, stream)
    }

    fn container(&self) -> &Container {
        &self.container
    }

    fn container_mut(&mut self) -> &mut Container {
        &mut self.container
    }

    fn elapsed(&self) -> Duration {
        self.engine.elapsed()
    }
}

fn check_level(stream: &BitStream, level: u8) -> Result<()> {
    if stream.level() != level {
        return Err(SpihtError::MalformedBitstream(format!(
            "stream was coded with {} decomposition levels, settings expect {}",
            stream.level(),
            level
        )));
    }
    Ok(())
}

fn say(settings: &CodecSettings, message: std::fmt::Arguments<'_>) {
    if settings.report.extended {
        info!("{}", message);
    } else {
        debug!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::CoefficientPlanes;

    fn sample(width: u32, height: u32) -> CoeffImage {
        let mut img = CoeffImage::new(width, height);
        for plane in Plane::ALL {
            for y in 0..height {
                for x in 0..width {
                    let v = ((x * 7 + y * 13 + plane.index() as u32 * 5) % 41) as f64 - 20.0;
                    img.set(x, y, plane, v);
                }
            }
        }
        img
    }

    #[test]
    fn test_plane_order_enforced() {
        let img = sample(16, 16);
        let mut codec = SpihtCodec::new(CodecSettings::new().with_levels(2));
        let err = codec.encode_plane(&img, 100, 1).unwrap_err();
        assert!(matches!(
            err,
            SpihtError::OutOfOrderUse {
                expected: Plane::Y,
                actual: Plane::Cb
            }
        ));

        codec.encode_plane(&img, 100, 0).unwrap();
        assert!(codec.encode_plane(&img, 100, 2).is_err());
        codec.encode_plane(&img, 100, 1).unwrap();
        codec.encode_plane(&img, 100, 2).unwrap();
        assert_eq!(codec.container().streams().len(), 3);
        assert_eq!(codec.next_plane(), Plane::Y);

        // Y restarts the cycle
        codec.encode_plane(&img, 100, 0).unwrap();
        assert_eq!(codec.container().streams().len(), 1);
    }

    #[test]
    fn test_invalid_plane_id() {
        let img = sample(16, 16);
        let mut codec = SpihtCodec::new(CodecSettings::new().with_levels(2));
        assert!(matches!(
            codec.encode_plane(&img, 100, 3),
            Err(SpihtError::InvalidPlaneId(3))
        ));
    }

    #[test]
    fn test_color_shift_levels() {
        let img = sample(32, 32);
        let settings = CodecSettings::new().with_levels(2).with_color_shift(1);
        let mut codec = SpihtCodec::new(settings);
        codec.encode(&img).unwrap();
        let levels: Vec<u8> = codec.container().streams().iter().map(|s| s.level()).collect();
        assert_eq!(levels, [2, 3, 3]);
    }

    #[test]
    fn test_level_mismatch_rejected() {
        let img = sample(16, 16);
        let mut codec = SpihtCodec::new(CodecSettings::new().with_levels(2));
        codec.encode(&img).unwrap();
        let container = codec.container().clone();

        let mut other = SpihtCodec::new(CodecSettings::new().with_levels(1)).with_container(container);
        let mut out = CoeffImage::default();
        assert!(matches!(
            other.decode(&mut out, 0),
            Err(SpihtError::MalformedBitstream(_))
        ));
    }

    #[test]
    fn test_codec_versions_do_not_mix() {
        let img = sample(16, 16);
        let mut planar = SpihtCodec::new(CodecSettings::new().with_levels(2));
        planar.encode(&img).unwrap();

        let mut degraded = DegradedSpihtCodec::new(CodecSettings::new().with_levels(2))
            .with_container(planar.container().clone());
        let mut out = CoeffImage::default();
        assert!(matches!(
            degraded.decode(&mut out, 0),
            Err(SpihtError::MalformedContainer(_))
        ));

        let mut joint = ColorSpihtCodec::new(CodecSettings::new().with_levels(2))
            .with_container(planar.container().clone());
        assert!(matches!(
            joint.decode(&mut out, 0),
            Err(SpihtError::MalformedContainer(_))
        ));
    }

    #[test]
    fn test_decode_resets_image() {
        let img = sample(16, 8);
        let mut codec = ColorSpihtCodec::new(CodecSettings::new().with_levels(2));
        codec.encode(&img).unwrap();
        let mut out = CoeffImage::new(3, 3);
        codec.decode(&mut out, 0).unwrap();
        assert_eq!((out.width(), out.height()), (16, 8));
    }
}
