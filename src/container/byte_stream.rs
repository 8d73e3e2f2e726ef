// src/container/byte_stream.rs

//! Little-endian primitives for the packed container layout.
//!
//! The container is a fixed-width, unpadded little-endian format. These
//! extension traits add the handful of integer and word-slice helpers the
//! header and stream codecs need on top of `Read`/`Write`.

use crate::container::bit_stream::Word;
use crate::utils::error::Result;
use bytemuck::{Pod, Zeroable, cast_slice, cast_slice_mut};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, ErrorKind, Read, Write};

/// Reading side of the container format.
pub trait ContainerRead: Read {
    fn read_u8_le(&mut self) -> Result<u8> {
        Ok(ReadBytesExt::read_u8(self)?)
    }

    fn read_u16_le(&mut self) -> Result<u16> {
        Ok(ReadBytesExt::read_u16::<LittleEndian>(self)?)
    }

    fn read_u32_le(&mut self) -> Result<u32> {
        Ok(ReadBytesExt::read_u32::<LittleEndian>(self)?)
    }

    /// Reads `count` little-endian storage words.
    ///
    /// The buffer grows with the data actually read, so a bogus count on a
    /// short input fails with `UnexpectedEof` instead of allocating it.
    fn read_word_slice(&mut self, count: usize) -> Result<Vec<Word>> {
        let byte_len = count.saturating_mul(size_of::<LeWord>());
        let mut bytes = Vec::new();
        Read::take(&mut *self, byte_len as u64).read_to_end(&mut bytes)?;
        if bytes.len() != byte_len {
            return Err(io::Error::new(
                ErrorKind::UnexpectedEof,
                format!("expected {} words, found {} bytes", count, bytes.len()),
            )
            .into());
        }
        let mut le_words = vec![LeWord::zeroed(); count];
        cast_slice_mut::<LeWord, u8>(&mut le_words).copy_from_slice(&bytes);
        Ok(le_words.into_iter().map(Word::from).collect())
    }
}

impl<T: Read + ?Sized> ContainerRead for T {}

/// Writing side of the container format.
pub trait ContainerWrite: Write {
    fn write_u8_le(&mut self, value: u8) -> Result<()> {
        Ok(WriteBytesExt::write_u8(self, value)?)
    }

    fn write_u16_le(&mut self, value: u16) -> Result<()> {
        Ok(WriteBytesExt::write_u16::<LittleEndian>(self, value)?)
    }

    fn write_u32_le(&mut self, value: u32) -> Result<()> {
        Ok(WriteBytesExt::write_u32::<LittleEndian>(self, value)?)
    }

    /// Writes storage words in little-endian order using a single buffer.
    fn write_word_slice(&mut self, words: &[Word]) -> Result<()> {
        let le_words: Vec<LeWord> = words.iter().map(|&w| w.into()).collect();
        self.write_all(cast_slice(&le_words))?;
        Ok(())
    }
}

impl<T: Write + ?Sized> ContainerWrite for T {}

/// Little-endian storage word that can be safely cast to/from bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct LeWord([u8; 2]);

impl From<Word> for LeWord {
    fn from(value: Word) -> Self {
        LeWord(value.to_le_bytes())
    }
}

impl From<LeWord> for Word {
    fn from(value: LeWord) -> Self {
        Word::from_le_bytes(value.0)
    }
}
