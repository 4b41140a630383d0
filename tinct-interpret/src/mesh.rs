//! Decoding the vertex data of mesh shadings.
//!
//! Free-form and lattice-form triangle meshes as well as Coons and tensor-product patch
//! meshes store their geometry as a packed bit stream. Each vertex consists of an
//! optional edge flag, an x and a y coordinate and one or more color components. The
//! widths of the fields and the ranges they map into are described in the shading
//! dictionary.

use crate::color::{ColorComponents, ColorSpace, Rgb};
use crate::function::Function;
use crate::util::OptionLog;
use kurbo::{Affine, Point};
use log::warn;
use smallvec::{SmallVec, smallvec};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tinct_syntax::bit_reader::{BitReader, BitSize};
use tinct_syntax::object::Dict;
use tinct_syntax::object::dict::keys::{
    BITS_PER_COMPONENT, BITS_PER_COORDINATE, BITS_PER_FLAG, DECODE,
};

/// The maximum number of color components a mesh vertex can have.
pub const MAX_MESH_COMPONENTS: usize = 8;

const COORDINATE_BITS: [u8; 8] = [1, 2, 4, 8, 12, 16, 24, 32];
const COMPONENT_BITS: [u8; 6] = [1, 2, 4, 8, 12, 16];
const FLAG_BITS: [u8; 3] = [2, 4, 8];

/// A vertex of a mesh, in device space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    /// The position of the vertex.
    pub position: Point,
    /// The color of the vertex.
    pub rgb: Rgb,
}

/// The validated layout and data of a mesh shading stream.
#[derive(Clone)]
pub struct Mesh {
    coordinate_bits: BitSize,
    component_bits: BitSize,
    flag_bits: Option<BitSize>,
    x_range: (f32, f32),
    y_range: (f32, f32),
    color_ranges: SmallVec<[(f32, f32); MAX_MESH_COMPONENTS]>,
    data: Arc<[u8]>,
}

impl Mesh {
    /// Read the layout of a mesh from a shading dictionary.
    ///
    /// `has_flags` is `false` for lattice-form meshes, which don't store edge flags.
    /// If the shading has functions, each vertex stores a single parametric value
    /// instead of one value per color space component.
    pub(crate) fn new(
        dict: &Dict<'_>,
        data: Arc<[u8]>,
        has_flags: bool,
        color_space: &ColorSpace,
        has_functions: bool,
    ) -> Option<Self> {
        let coordinate_bits = read_bit_size(dict, BITS_PER_COORDINATE, &COORDINATE_BITS)
            .warn_none("mesh has an invalid number of bits per coordinate")?;
        let component_bits = read_bit_size(dict, BITS_PER_COMPONENT, &COMPONENT_BITS)
            .warn_none("mesh has an invalid number of bits per component")?;
        let flag_bits = if has_flags {
            Some(
                read_bit_size(dict, BITS_PER_FLAG, &FLAG_BITS)
                    .warn_none("mesh has an invalid number of bits per flag")?,
            )
        } else {
            None
        };

        let component_count = if has_functions {
            1
        } else {
            color_space.component_count()
        };

        if component_count > MAX_MESH_COMPONENTS {
            warn!("mesh has {component_count} color components, which is too many");

            return None;
        }

        let decode = dict
            .get::<Vec<f32>>(DECODE)
            .warn_none("mesh has no decode array")?;

        if decode.len() != 4 + 2 * component_count {
            warn!(
                "mesh decode array has {} entries, expected {}",
                decode.len(),
                4 + 2 * component_count
            );

            return None;
        }

        let mut pairs = decode.chunks_exact(2).map(|p| (p[0], p[1]));
        let x_range = pairs.next()?;
        let y_range = pairs.next()?;

        Some(Self {
            coordinate_bits,
            component_bits,
            flag_bits,
            x_range,
            y_range,
            color_ranges: pairs.collect(),
            data,
        })
    }

    /// The number of color components stored per vertex.
    pub fn component_count(&self) -> usize {
        self.color_ranges.len()
    }

    /// Whether vertices start with an edge flag.
    pub fn has_flags(&self) -> bool {
        self.flag_bits.is_some()
    }

    /// The raw data of the mesh.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl Debug for Mesh {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesh")
            .field("coordinate_bits", &self.coordinate_bits.bits())
            .field("component_bits", &self.component_bits.bits())
            .field("flag_bits", &self.flag_bits.map(|b| b.bits()))
            .field("x_range", &self.x_range)
            .field("y_range", &self.y_range)
            .field("color_ranges", &self.color_ranges)
            .field("len", &self.data.len())
            .finish()
    }
}

fn read_bit_size(dict: &Dict<'_>, key: &[u8], allowed: &[u8]) -> Option<BitSize> {
    dict.get::<u8>(key)
        .filter(|bits| allowed.contains(bits))
        .and_then(BitSize::from_u8)
}

/// A sequential reader over the vertices of a mesh.
///
/// The reader can't be rewound. Every read checks the number of remaining bits first,
/// so a truncated stream ends the mesh instead of producing garbage vertices.
pub struct MeshStream<'a> {
    mesh: &'a Mesh,
    functions: &'a [Function],
    color_space: &'a ColorSpace,
    reader: BitReader<'a>,
}

impl<'a> MeshStream<'a> {
    /// Create a new reader over a mesh, whose colors are computed with `functions`
    /// (if there are any) and `color_space`.
    pub fn new(mesh: &'a Mesh, functions: &'a [Function], color_space: &'a ColorSpace) -> Self {
        Self {
            mesh,
            functions,
            color_space,
            reader: BitReader::new(&mesh.data),
        }
    }

    /// Whether the whole stream has been consumed.
    pub fn is_eof(&self) -> bool {
        self.reader.remaining_bits() == 0
    }

    /// Whether an edge flag can be read.
    pub fn can_read_flag(&self) -> bool {
        self.mesh
            .flag_bits
            .is_some_and(|bits| self.reader.can_read(bits.bits()))
    }

    /// Whether a coordinate pair can be read.
    pub fn can_read_coords(&self) -> bool {
        self.reader.can_read(2 * self.mesh.coordinate_bits.bits())
    }

    /// Whether a color can be read.
    pub fn can_read_color(&self) -> bool {
        self.reader
            .can_read(self.mesh.component_count() * self.mesh.component_bits.bits())
    }

    /// Read an edge flag. Only the lowest two bits of the flag are meaningful.
    pub fn read_flag(&mut self) -> Option<u32> {
        let bits = self.mesh.flag_bits?;

        Some(self.reader.read(bits)? & 0b11)
    }

    /// Read a coordinate pair and map it into device space with `transform`.
    pub fn read_coords(&mut self, transform: &Affine) -> Option<Point> {
        let bits = self.mesh.coordinate_bits;
        let (x_min, x_max) = self.mesh.x_range;
        let (y_min, y_max) = self.mesh.y_range;

        let x = self.reader.read_scaled(bits, x_min, x_max)?;
        let y = self.reader.read_scaled(bits, y_min, y_max)?;

        Some(*transform * Point::new(x as f64, y as f64))
    }

    /// Read a color and convert it into sRGB.
    ///
    /// Colors that can't be converted become black.
    pub fn read_color(&mut self) -> Option<Rgb> {
        let bits = self.mesh.component_bits;
        let mut components = ColorComponents::new();

        for &(min, max) in &self.mesh.color_ranges {
            components.push(self.reader.read_scaled(bits, min, max)?);
        }

        if self.functions.is_empty() {
            return Some(self.color_space.get_rgb_or_black(&components));
        }

        let mut outputs: ColorComponents = smallvec![];

        for function in self.functions {
            match function.eval(&components[..1]) {
                Some(values) => outputs.extend(values),
                None => outputs.extend(std::iter::repeat_n(0.0, function.output_count())),
            }
        }

        if outputs.len() < self.color_space.component_count() {
            outputs.resize(self.color_space.component_count(), 0.0);
        }

        Some(self.color_space.get_rgb_or_black(&outputs))
    }

    /// Read a whole vertex, including its edge flag if the mesh has flags.
    ///
    /// Returns the vertex and its flag (0 for meshes without flags). Subsequent reads
    /// start at the next byte boundary.
    pub fn read_vertex(&mut self, transform: &Affine) -> Option<(Vertex, u32)> {
        let flag = if self.mesh.has_flags() {
            if !self.can_read_flag() {
                return None;
            }

            self.read_flag()?
        } else {
            0
        };

        if !self.can_read_coords() {
            return None;
        }

        let position = self.read_coords(transform)?;

        if !self.can_read_color() {
            return None;
        }

        let rgb = self.read_color()?;
        self.reader.align();

        Some((Vertex { position, rgb }, flag))
    }

    /// Read one row of a lattice-form mesh.
    ///
    /// Returns an empty row if the stream doesn't contain `count` more vertices.
    pub fn read_vertex_row(&mut self, transform: &Affine, count: usize) -> Vec<Vertex> {
        let mut row = Vec::with_capacity(count);

        for _ in 0..count {
            let Some((vertex, _)) = self.read_vertex(transform) else {
                return vec![];
            };

            row.push(vertex);
        }

        row
    }
}
