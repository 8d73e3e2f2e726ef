// src/container/data_group.rs

//! On-disk container grouping one or three bitstreams.
//!
//! Layout (little-endian, packed):
//!
//! ```text
//! header     version:u8 bits_per_word:u8 stream_count:u8 width:u16 height:u16
//! per stream max_steps:u8 total_bits:u32 level:u8 word_count:u32
//!            word_count × u16 words
//! ```

use crate::container::bit_stream::{BitStream, WORD_BITS};
use crate::container::byte_stream::{ContainerRead, ContainerWrite};
use crate::utils::error::{Result, SpihtError};
use log::{info, warn};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

/// Size in bytes of the main header.
pub const HEADER_SIZE: usize = 7;
/// Size in bytes of each stream sub-header.
pub const SUB_HEADER_SIZE: usize = 10;

/// Main container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    pub version: u8,
    pub bits_per_word: u8,
    pub stream_count: u8,
    pub width: u16,
    pub height: u16,
}

/// Per-stream metadata preceding each word array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubHeader {
    pub max_steps: u8,
    pub total_bits: u32,
    pub level: u8,
    pub word_count: u32,
}

impl SubHeader {
    /// Metadata of `stream` as it will be stored: only the words holding
    /// the readable `total_bits` are written.
    pub fn of(stream: &BitStream) -> Self {
        let total_bits = stream.total_bits().min(stream.len() as u32);
        Self {
            max_steps: stream.max_steps(),
            total_bits,
            level: stream.level(),
            word_count: words_for(total_bits),
        }
    }
}

/// Storage words needed for `bits` bits.
#[inline]
pub fn words_for(bits: u32) -> u32 {
    bits.div_ceil(WORD_BITS as u32)
}

/// Header plus the streams of one coded image.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Container {
    header: Header,
    streams: Vec<BitStream>,
}

impl Container {
    /// Creates an empty container for a codec of the given version.
    ///
    /// Fails with `InvalidArg` when the image does not fit the 16-bit
    /// dimension fields.
    pub fn new(version: u8, stream_count: u8, width: u32, height: u32) -> Result<Self> {
        let (width, height) = match (u16::try_from(width), u16::try_from(height)) {
            (Ok(w), Ok(h)) => (w, h),
            _ => {
                return Err(SpihtError::InvalidArg(format!(
                    "image {}x{} exceeds the 65535 pixel container limit",
                    width, height
                )));
            }
        };
        Ok(Self {
            header: Header {
                version,
                bits_per_word: WORD_BITS,
                stream_count,
                width,
                height,
            },
            streams: Vec::with_capacity(stream_count as usize),
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn width(&self) -> u32 {
        self.header.width as u32
    }

    pub fn height(&self) -> u32 {
        self.header.height as u32
    }

    pub fn streams(&self) -> &[BitStream] {
        &self.streams
    }

    pub fn stream_mut(&mut self, index: usize) -> Option<&mut BitStream> {
        self.streams.get_mut(index)
    }

    /// Appends a stream. Streams are stored in coding order.
    pub fn push(&mut self, stream: BitStream) {
        self.streams.push(stream);
    }

    /// Sum of `total_bits` over all streams.
    pub fn total_bits(&self) -> u64 {
        self.streams.iter().map(|s| s.total_bits() as u64).sum()
    }

    /// Verifies the container belongs to a codec of `version` with
    /// `stream_count` streams.
    pub fn check(&self, version: u8, stream_count: u8) -> Result<()> {
        if self.header.version != version {
            return Err(SpihtError::MalformedContainer(format!(
                "version 0x{:02X} does not match codec version 0x{:02X}",
                self.header.version, version
            )));
        }
        if self.header.stream_count != stream_count || self.streams.len() != stream_count as usize
        {
            return Err(SpihtError::MalformedContainer(format!(
                "{} streams present, codec expects {}",
                self.streams.len(),
                stream_count
            )));
        }
        Ok(())
    }

    /// Serializes header and streams.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        if self.streams.len() != self.header.stream_count as usize {
            return Err(SpihtError::MalformedContainer(format!(
                "header announces {} streams but {} were coded",
                self.header.stream_count,
                self.streams.len()
            )));
        }

        let hdr = &self.header;
        writer.write_u8_le(hdr.version)?;
        writer.write_u8_le(hdr.bits_per_word)?;
        writer.write_u8_le(hdr.stream_count)?;
        writer.write_u16_le(hdr.width)?;
        writer.write_u16_le(hdr.height)?;

        for stream in &self.streams {
            let sub = SubHeader::of(stream);
            writer.write_u8_le(sub.max_steps)?;
            writer.write_u32_le(sub.total_bits)?;
            writer.write_u8_le(sub.level)?;
            writer.write_u32_le(sub.word_count)?;
            writer.write_word_slice(&stream.words()[..sub.word_count as usize])?;
        }
        Ok(())
    }

    /// Parses a container. Structural mismatches are reported as
    /// `MalformedBitstream`; short input surfaces as an `Io` error of kind
    /// `UnexpectedEof`.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let header = Header {
            version: reader.read_u8_le()?,
            bits_per_word: reader.read_u8_le()?,
            stream_count: reader.read_u8_le()?,
            width: reader.read_u16_le()?,
            height: reader.read_u16_le()?,
        };

        if header.stream_count == 0 {
            return Err(SpihtError::MalformedBitstream(
                "stream count is zero".to_string(),
            ));
        }
        if header.bits_per_word != WORD_BITS {
            return Err(SpihtError::MalformedBitstream(format!(
                "{} bits per word does not match this codec ({})",
                header.bits_per_word, WORD_BITS
            )));
        }

        let mut streams = Vec::with_capacity(header.stream_count as usize);
        for index in 0..header.stream_count {
            let sub = SubHeader {
                max_steps: reader.read_u8_le()?,
                total_bits: reader.read_u32_le()?,
                level: reader.read_u8_le()?,
                word_count: reader.read_u32_le()?,
            };
            let expected = words_for(sub.total_bits);
            if sub.word_count != expected {
                return Err(SpihtError::MalformedBitstream(format!(
                    "stream {} declares {} bits in {} words, expected {} words",
                    index, sub.total_bits, sub.word_count, expected
                )));
            }
            let words = reader.read_word_slice(sub.word_count as usize)?;
            streams.push(BitStream::from_words(
                sub.max_steps,
                sub.total_bits,
                sub.level,
                words,
            ));
        }

        Ok(Self { header, streams })
    }

    /// Saves the container to `path`.
    ///
    /// Returns `Ok(false)` when the file cannot be created; write failures
    /// after that point propagate.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<bool> {
        let path = path.as_ref();
        let file = match File::create(path) {
            Ok(file) => file,
            Err(err) => {
                warn!("Can't write to file {}: {}", path.display(), err);
                return Ok(false);
            }
        };
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        info!("Bitstream saved to file {}", path.display());
        Ok(true)
    }

    /// Replaces this container with the one stored at `path`.
    ///
    /// Returns `Ok(false)` when the file cannot be opened or ends early;
    /// structurally invalid data is an error. On failure `self` is untouched.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<bool> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) => {
                warn!("Unable to open file {}: {}", path.display(), err);
                return Ok(false);
            }
        };
        match Self::read_from(&mut BufReader::new(file)) {
            Ok(loaded) => {
                *self = loaded;
                info!("Bitstream {} loaded", path.display());
                Ok(true)
            }
            Err(SpihtError::Io(err)) if err.kind() == ErrorKind::UnexpectedEof => {
                warn!("Bitstream {} is incomplete", path.display());
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}
