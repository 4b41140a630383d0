//! Reading packed, big-endian numbers of up to 32 bits from a byte buffer.
//!
//! Sampled functions and mesh shadings store their data as a tightly packed bit stream,
//! where each value can occupy an arbitrary number of bits.

/// The number of bits a single value occupies.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct BitSize(u8);

impl BitSize {
    /// Create a new `BitSize`. Returns `None` if the size is zero or bigger than 32.
    pub fn from_u8(value: u8) -> Option<Self> {
        (1..=32).contains(&value).then_some(Self(value))
    }

    /// Return the number of bits.
    pub fn bits(&self) -> usize {
        self.0 as usize
    }

    /// Return the bit mask, which is also the largest value that can be represented.
    pub fn mask(&self) -> u32 {
        (u64::MAX >> (64 - self.0 as u32)) as u32
    }

    /// Return the largest representable value as a float.
    pub fn max_value(&self) -> f32 {
        self.mask() as f32
    }
}

/// A reader over a bit stream.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    /// Create a new bit reader.
    pub fn new(data: &'a [u8]) -> Self {
        Self::new_with(data, 0)
    }

    /// Create a new bit reader that starts at a specific bit offset.
    pub fn new_with(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    /// Skip to the next byte boundary, unless the reader already is on one.
    pub fn align(&mut self) {
        self.pos = self.pos.next_multiple_of(8);
    }

    /// The current position in bits.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The number of bits that haven't been read yet.
    pub fn remaining_bits(&self) -> usize {
        (self.data.len() * 8).saturating_sub(self.pos)
    }

    /// Whether at least `bits` more bits can be read.
    pub fn can_read(&self, bits: usize) -> bool {
        self.remaining_bits() >= bits
    }

    /// Skip the given number of bits.
    pub fn skip(&mut self, bits: usize) -> Option<()> {
        if !self.can_read(bits) {
            return None;
        }

        self.pos += bits;

        Some(())
    }

    /// Read the next value with the given size.
    ///
    /// Returns `None` without advancing if there are not enough bits left.
    pub fn read(&mut self, size: BitSize) -> Option<u32> {
        let bits = size.bits();

        if !self.can_read(bits) {
            return None;
        }

        let start = self.pos / 8;
        let offset = self.pos % 8;
        // A 32 bit value spans at most 5 bytes, so it always fits into the window.
        let end = (self.pos + bits).div_ceil(8);

        let mut window = 0u64;

        for byte in &self.data[start..end] {
            window = (window << 8) | *byte as u64;
        }

        let trailing = (end - start) * 8 - offset - bits;
        self.pos += bits;

        Some((window >> trailing) as u32 & size.mask())
    }

    /// Read the next value and map it linearly from `[0, 2^bits - 1]` into `[min, max]`.
    pub fn read_scaled(&mut self, size: BitSize, min: f32, max: f32) -> Option<f32> {
        let value = self.read(size)? as f32;

        Some(min + value * (max - min) / size.max_value())
    }
}
