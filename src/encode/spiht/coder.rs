// src/encode/spiht/coder.rs

//! Bit exchangers for the coding passes.
//!
//! The engine describes every decision as an exchange: the [`Encoder`]
//! computes the answer from the coefficients and writes it, the [`Decoder`]
//! reads it back and updates its reconstruction. Because both sides run the
//! same traversal code, their bit order cannot drift apart.

use super::lists::Pixel;
use crate::container::BitStream;
use crate::image::CoefficientPlanes;

/// The bitstream can no longer exchange bits: the encoder ran out of budget
/// or the decoder reached the end of the stored data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamEnd;

pub type Step<T> = std::result::Result<T, StreamEnd>;

pub trait PassCoder {
    type Planes: CoefficientPlanes + ?Sized;

    /// Significance of a single coefficient, followed by its sign when
    /// significant.
    fn exchange_pixel(&mut self, px: Pixel, threshold: f64) -> Step<bool>;

    /// Significance of a set. `significant` is only evaluated when encoding.
    fn exchange_set(&mut self, significant: impl FnOnce(&Self::Planes) -> bool) -> Step<bool>;

    /// Bit `bit_plane` of a coefficient already known to be significant.
    fn exchange_refinement(&mut self, px: Pixel, bit_plane: i32) -> Step<()>;

    /// Bits exchanged so far.
    fn bits(&self) -> u32;

    /// Ends the stream after the last bit plane.
    fn close(&mut self);

    fn finished(&self) -> bool;
}

pub struct Encoder<'a, P: ?Sized> {
    planes: &'a P,
    stream: &'a mut BitStream,
    bits: u32,
}

impl<'a, P: CoefficientPlanes + ?Sized> Encoder<'a, P> {
    pub fn new(planes: &'a P, stream: &'a mut BitStream) -> Self {
        Self {
            planes,
            stream,
            bits: 0,
        }
    }

    #[inline]
    fn emit(&mut self, bit: bool) -> Step<()> {
        if self.stream.put(bit) {
            self.bits += 1;
            Ok(())
        } else {
            Err(StreamEnd)
        }
    }
}

impl<P: CoefficientPlanes + ?Sized> PassCoder for Encoder<'_, P> {
    type Planes = P;

    fn exchange_pixel(&mut self, px: Pixel, threshold: f64) -> Step<bool> {
        let value = self.planes.get(px.x, px.y, px.plane);
        let significant = value.abs() >= threshold;
        self.emit(significant)?;
        if significant {
            self.emit(value >= 0.0)?;
        }
        Ok(significant)
    }

    fn exchange_set(&mut self, significant: impl FnOnce(&Self::Planes) -> bool) -> Step<bool> {
        let significant = significant(self.planes);
        self.emit(significant)?;
        Ok(significant)
    }

    fn exchange_refinement(&mut self, px: Pixel, bit_plane: i32) -> Step<()> {
        let magnitude = self.planes.get(px.x, px.y, px.plane).abs();
        let scaled = (magnitude / 2f64.powi(bit_plane)).floor();
        self.emit(scaled % 2.0 >= 1.0)
    }

    fn bits(&self) -> u32 {
        self.bits
    }

    fn close(&mut self) {
        self.stream.close();
    }

    fn finished(&self) -> bool {
        self.stream.is_closed()
    }
}

pub struct Decoder<'a, P: ?Sized> {
    planes: &'a mut P,
    stream: &'a mut BitStream,
    bits: u32,
    halted: bool,
}

impl<'a, P: CoefficientPlanes + ?Sized> Decoder<'a, P> {
    pub fn new(planes: &'a mut P, stream: &'a mut BitStream) -> Self {
        Self {
            planes,
            stream,
            bits: 0,
            halted: false,
        }
    }

    #[inline]
    fn receive(&mut self) -> Step<bool> {
        match self.stream.get() {
            Some(bit) => {
                self.bits += 1;
                Ok(bit)
            }
            None => {
                self.halted = true;
                Err(StreamEnd)
            }
        }
    }
}

impl<P: CoefficientPlanes + ?Sized> PassCoder for Decoder<'_, P> {
    type Planes = P;

    fn exchange_pixel(&mut self, px: Pixel, threshold: f64) -> Step<bool> {
        let significant = self.receive()?;
        if significant {
            let positive = self.receive()?;
            // midpoint of [T, 2T)
            let magnitude = threshold * 1.5;
            let value = if positive { magnitude } else { -magnitude };
            self.planes.set(px.x, px.y, px.plane, value);
        }
        Ok(significant)
    }

    fn exchange_set(&mut self, _significant: impl FnOnce(&Self::Planes) -> bool) -> Step<bool> {
        self.receive()
    }

    fn exchange_refinement(&mut self, px: Pixel, bit_plane: i32) -> Step<()> {
        let one = self.receive()?;
        let value = self.planes.get(px.x, px.y, px.plane);
        let step = 2f64.powi(bit_plane - 1);
        let toward_zero = if value > 0.0 { -step } else { step };
        let refined = if one { value - toward_zero } else { value + toward_zero };
        self.planes.set(px.x, px.y, px.plane, refined);
        Ok(())
    }

    fn bits(&self) -> u32 {
        self.bits
    }

    fn close(&mut self) {
        self.stream.close();
    }

    fn finished(&self) -> bool {
        self.halted
    }
}
