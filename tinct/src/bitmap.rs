//! A simple bitmap type.

use bytemuck::{Pod, Zeroable};
use image::{ExtendedColorType, ImageResult};
use std::path::Path;

/// A color with separate alpha, stored in the order blue, green, red, alpha.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Pod, Zeroable)]
#[repr(C)]
pub struct Bgra8 {
    /// Blue component.
    pub b: u8,
    /// Green component.
    pub g: u8,
    /// Red component.
    pub r: u8,
    /// Alpha component.
    pub a: u8,
}

impl Bgra8 {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    /// Create a new color.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { b, g, r, a }
    }

    /// Create a new opaque color.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Premultiply the color with its alpha.
    pub fn premultiply(self) -> PremulBgra8 {
        let multiply = |c: u8| mul_div_255(c, self.a);

        PremulBgra8 {
            b: multiply(self.b),
            g: multiply(self.g),
            r: multiply(self.r),
            a: self.a,
        }
    }
}

/// A color premultiplied with its alpha, stored in the order blue, green, red, alpha.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Pod, Zeroable)]
#[repr(C)]
pub struct PremulBgra8 {
    /// Blue component.
    pub b: u8,
    /// Green component.
    pub g: u8,
    /// Red component.
    pub r: u8,
    /// Alpha component.
    pub a: u8,
}

impl PremulBgra8 {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self {
        b: 0,
        g: 0,
        r: 0,
        a: 0,
    };

    /// Undo the premultiplication.
    pub fn unpremultiply(self) -> Bgra8 {
        if self.a == 0 {
            return Bgra8::TRANSPARENT;
        }

        let alpha = 255.0 / f32::from(self.a);
        let divide = |c: u8| (f32::from(c) * alpha + 0.5).min(255.0) as u8;

        Bgra8 {
            b: divide(self.b),
            g: divide(self.g),
            r: divide(self.r),
            a: self.a,
        }
    }

    /// Composite `self` over `dest`.
    fn over(self, dest: Self) -> Self {
        let inv_alpha = 255 - self.a;
        let blend = |s: u8, d: u8| s.saturating_add(mul_div_255(d, inv_alpha));

        Self {
            b: blend(self.b, dest.b),
            g: blend(self.g, dest.g),
            r: blend(self.r, dest.r),
            a: blend(self.a, dest.a),
        }
    }

    /// Scale all components by `coverage`, which is between 0 and 255.
    fn scale(self, coverage: u8) -> Self {
        Self {
            b: mul_div_255(self.b, coverage),
            g: mul_div_255(self.g, coverage),
            r: mul_div_255(self.r, coverage),
            a: mul_div_255(self.a, coverage),
        }
    }
}

fn mul_div_255(a: u8, b: u8) -> u8 {
    ((u16::from(a) * u16::from(b) + 127) / 255) as u8
}

/// A bitmap of premultiplied BGRA8 pixels in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u16,
    height: u16,
    buf: Vec<PremulBgra8>,
}

impl Bitmap {
    /// Create a new, fully transparent bitmap.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            buf: vec![PremulBgra8::TRANSPARENT; usize::from(width) * usize::from(height)],
        }
    }

    /// The width of the bitmap in pixels.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// The height of the bitmap in pixels.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// The pixels of the bitmap.
    pub fn data(&self) -> &[PremulBgra8] {
        &self.buf
    }

    /// The pixels of the bitmap, mutably.
    pub fn data_mut(&mut self) -> &mut [PremulBgra8] {
        &mut self.buf
    }

    /// The pixels of the bitmap as bytes, in the order `[b, g, r, a]`.
    pub fn data_as_u8_slice(&self) -> &[u8] {
        bytemuck::cast_slice(&self.buf)
    }

    /// Return the pixel at a position, or `None` if it is out of bounds.
    pub fn pixel(&self, x: u16, y: u16) -> Option<PremulBgra8> {
        self.index(x, y).map(|i| self.buf[i])
    }

    /// Replace the pixel at a position. Out-of-bounds positions are ignored.
    pub fn set_pixel(&mut self, x: u16, y: u16, color: Bgra8) {
        if let Some(i) = self.index(x, y) {
            self.buf[i] = color.premultiply();
        }
    }

    /// Composite a color over the pixel at a position, with a coverage between 0 and 255.
    pub fn blend_pixel(&mut self, x: u16, y: u16, color: Bgra8, coverage: u8) {
        if let Some(i) = self.index(x, y) {
            self.buf[i] = color.premultiply().scale(coverage).over(self.buf[i]);
        }
    }

    /// Replace all pixels with a color.
    pub fn fill(&mut self, color: Bgra8) {
        self.buf.fill(color.premultiply());
    }

    /// Composite another bitmap over this one, with its top-left corner at `(x, y)`.
    pub fn composite(&mut self, src: &Self, x: u16, y: u16) {
        let columns = src.width.min(self.width.saturating_sub(x));
        let rows = src.height.min(self.height.saturating_sub(y));

        for row in 0..rows {
            let src_start = usize::from(row) * usize::from(src.width);
            let src_row = &src.buf[src_start..][..usize::from(columns)];
            let dest_start = usize::from(y + row) * usize::from(self.width) + usize::from(x);
            let dest_row = &mut self.buf[dest_start..][..usize::from(columns)];

            for (dest, src) in dest_row.iter_mut().zip(src_row) {
                *dest = src.over(*dest);
            }
        }
    }

    /// Return the pixels with separate alpha.
    pub fn to_unpremultiplied(&self) -> Vec<Bgra8> {
        self.buf.iter().map(|p| p.unpremultiply()).collect()
    }

    /// Save the bitmap as a PNG file.
    pub fn save_png(&self, path: impl AsRef<Path>) -> ImageResult<()> {
        let rgba = self
            .to_unpremultiplied()
            .into_iter()
            .flat_map(|Bgra8 { b, g, r, a }| [r, g, b, a])
            .collect::<Vec<_>>();

        image::save_buffer(
            path,
            &rgba,
            u32::from(self.width),
            u32::from(self.height),
            ExtendedColorType::Rgba8,
        )
    }

    fn index(&self, x: u16, y: u16) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| usize::from(y) * usize::from(self.width) + usize::from(x))
    }
}
