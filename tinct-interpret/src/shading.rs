//! PDF shadings.

use crate::InterpreterWarning;
use crate::color::{ColorComponents, ColorSpace, Family};
use crate::context::Context;
use crate::function::Function;
use crate::mesh::Mesh;
use crate::util::OptionLog;
use kurbo::{Affine, Rect};
use log::warn;
use smallvec::SmallVec;
use std::sync::Arc;
use tinct_syntax::object::dict::keys::{
    ANTI_ALIAS, BACKGROUND, BBOX, COLORSPACE, COORDS, DOMAIN, EXTEND, FUNCTION, MATRIX,
    SHADING_TYPE, VERTICES_PER_ROW,
};
use tinct_syntax::object::{Array, CacheKey, Dict, Object, Stream, dict_or_stream};

/// The maximum number of functions a shading can have.
pub const MAX_FUNCTIONS: usize = 4;

/// The functions of a shading.
pub type Functions = SmallVec<[Function; MAX_FUNCTIONS]>;

/// A type of shading, together with its type-specific parameters.
#[derive(Debug)]
pub enum ShadingType {
    /// A function-based shading (type 1).
    FunctionBased {
        /// The rectangle `[x_min, x_max, y_min, y_max]` the functions are defined on.
        domain: [f32; 4],
        /// The transform from the domain into shading space.
        matrix: Affine,
    },
    /// An axial shading (type 2).
    Axial {
        /// The start and end point of the axis, `[x0, y0, x1, y1]`.
        coords: [f32; 4],
        /// The range of the parametric variable.
        domain: [f32; 2],
        /// Whether the shading extends beyond the start and the end of the axis.
        extend: [bool; 2],
    },
    /// A radial shading (type 3).
    Radial {
        /// The start and end circle, `[x0, y0, r0, x1, y1, r1]`.
        coords: [f32; 6],
        /// The range of the parametric variable.
        domain: [f32; 2],
        /// Whether the shading extends beyond the start and the end circle.
        extend: [bool; 2],
    },
    /// A free-form Gouraud-shaded triangle mesh (type 4).
    FreeForm {
        /// The mesh data.
        mesh: Mesh,
    },
    /// A lattice-form Gouraud-shaded triangle mesh (type 5).
    Lattice {
        /// The mesh data.
        mesh: Mesh,
        /// The number of vertices in each row of the lattice.
        vertices_per_row: usize,
    },
    /// A Coons patch mesh (type 6).
    Coons {
        /// The mesh data.
        mesh: Mesh,
    },
    /// A tensor-product patch mesh (type 7).
    Tensor {
        /// The mesh data.
        mesh: Mesh,
    },
}

impl ShadingType {
    /// The number of the shading type, as used in the `ShadingType` entry.
    pub fn number(&self) -> u8 {
        match self {
            Self::FunctionBased { .. } => 1,
            Self::Axial { .. } => 2,
            Self::Radial { .. } => 3,
            Self::FreeForm { .. } => 4,
            Self::Lattice { .. } => 5,
            Self::Coons { .. } => 6,
            Self::Tensor { .. } => 7,
        }
    }

    /// The mesh of the shading, if it is a mesh shading.
    pub fn mesh(&self) -> Option<&Mesh> {
        match self {
            Self::FreeForm { mesh }
            | Self::Lattice { mesh, .. }
            | Self::Coons { mesh }
            | Self::Tensor { mesh } => Some(mesh),
            _ => None,
        }
    }
}

/// A validated PDF shading.
#[derive(Clone, Debug)]
pub struct Shading {
    /// The type of shading.
    pub shading_type: Arc<ShadingType>,
    /// The color space of the shading.
    pub color_space: ColorSpace,
    /// The functions that compute the colors of the shading.
    ///
    /// Either empty (mesh shadings only), a single function with one output per color
    /// component, or one single-output function per color component.
    pub functions: Functions,
    /// The background color of the shading, with one value per color component.
    pub background: Option<ColorComponents>,
    /// The bounding box of the shading, in shading space.
    pub bbox: Option<Rect>,
    /// Whether the shading should be anti-aliased.
    pub anti_alias: bool,
}

impl Shading {
    /// Load a shading from a dictionary or stream object.
    ///
    /// Shadings stored as indirect objects are only validated once per document.
    pub fn load(object: &Object<'_>, ctx: &Context) -> Option<Self> {
        let load = || {
            let (dict, stream) = dict_or_stream(object).warn_none("shading has an invalid type")?;

            Self::new(&dict, stream.as_ref(), ctx)
        };

        let is_indirect = match object {
            Object::Dict(dict) => dict.obj_id().is_some(),
            Object::Stream(stream) => stream.obj_id().is_some(),
            _ => false,
        };

        if is_indirect {
            ctx.shadings().get_or_insert_with(object.cache_key(), load)
        } else {
            load()
        }
    }

    /// Validate a shading dictionary. Mesh shadings also need their stream.
    pub fn new(dict: &Dict<'_>, stream: Option<&Stream<'_>>, ctx: &Context) -> Option<Self> {
        let shading_num = dict
            .get::<i32>(SHADING_TYPE)
            .warn_none("shading has no shading type")?;

        if !(1..=7).contains(&shading_num) {
            warn!("unsupported shading type {shading_num}");
            ctx.warn(InterpreterWarning::UnsupportedShadingType);

            return None;
        }

        let color_space = dict
            .get::<Object<'_>>(COLORSPACE)
            .and_then(|o| ctx.get_color_space(&o, None))
            .warn_none("shading has no valid color space")?;

        if color_space.family() == Family::Pattern {
            warn!("shading can't use a pattern color space");

            return None;
        }

        let functions = read_functions(dict)?;
        let is_mesh = shading_num >= 4;

        if color_space.family() == Family::Indexed && (!is_mesh || !functions.is_empty()) {
            warn!("shading type {shading_num} can't use an indexed color space");

            return None;
        }

        let input_count = if shading_num == 1 { 2 } else { 1 };

        if !(is_mesh && functions.is_empty())
            && !validate_functions(&functions, input_count, color_space.component_count())
        {
            warn!("shading has invalid functions");

            return None;
        }

        let mesh = |has_flags| {
            let stream = stream.warn_none("mesh shading isn't a stream")?;

            Mesh::new(
                dict,
                stream.decoded_shared(),
                has_flags,
                &color_space,
                !functions.is_empty(),
            )
        };

        let shading_type = match shading_num {
            1 => ShadingType::FunctionBased {
                domain: optional_entry(
                    dict,
                    DOMAIN,
                    dict.get::<[f32; 4]>(DOMAIN),
                    [0.0, 1.0, 0.0, 1.0],
                )?,
                matrix: dict
                    .get::<[f64; 6]>(MATRIX)
                    .map(Affine::new)
                    .unwrap_or_default(),
            },
            2 => ShadingType::Axial {
                coords: dict
                    .get::<[f32; 4]>(COORDS)
                    .warn_none("axial shading has invalid coordinates")?,
                domain: optional_entry(dict, DOMAIN, dict.get::<[f32; 2]>(DOMAIN), [0.0, 1.0])?,
                extend: optional_entry(
                    dict,
                    EXTEND,
                    dict.get::<[bool; 2]>(EXTEND),
                    [false, false],
                )?,
            },
            3 => ShadingType::Radial {
                coords: dict
                    .get::<[f32; 6]>(COORDS)
                    .warn_none("radial shading has invalid coordinates")?,
                domain: optional_entry(dict, DOMAIN, dict.get::<[f32; 2]>(DOMAIN), [0.0, 1.0])?,
                extend: optional_entry(
                    dict,
                    EXTEND,
                    dict.get::<[bool; 2]>(EXTEND),
                    [false, false],
                )?,
            },
            4 => ShadingType::FreeForm { mesh: mesh(true)? },
            5 => {
                let vertices_per_row = dict
                    .get::<usize>(VERTICES_PER_ROW)
                    .filter(|n| *n >= 2)
                    .warn_none("lattice shading has an invalid number of vertices per row")?;

                ShadingType::Lattice {
                    mesh: mesh(false)?,
                    vertices_per_row,
                }
            }
            6 => ShadingType::Coons { mesh: mesh(true)? },
            _ => ShadingType::Tensor { mesh: mesh(true)? },
        };

        let background = dict.get::<Array<'_>>(BACKGROUND).and_then(|array| {
            let background = array
                .iter::<f32>()
                .take(color_space.component_count())
                .collect::<ColorComponents>();

            // An incomplete background is ignored.
            (background.len() == color_space.component_count()).then_some(background)
        });

        let bbox = dict
            .get::<[f64; 4]>(BBOX)
            .map(|[x0, y0, x1, y1]| Rect::new(x0, y0, x1, y1).abs());

        Some(Self {
            shading_type: Arc::new(shading_type),
            color_space,
            functions,
            background,
            bbox,
            anti_alias: dict.get::<bool>(ANTI_ALIAS).unwrap_or(false),
        })
    }

    /// The number of color components the functions produce, or the number of
    /// components of the color space if that is larger.
    ///
    /// Returns 0 if the shading has no functions.
    pub fn output_count(&self) -> usize {
        let total = self
            .functions
            .iter()
            .map(Function::output_count)
            .sum::<usize>();

        if total == 0 {
            0
        } else {
            total.max(self.color_space.component_count())
        }
    }
}

/// Use `default` if `key` is absent. A present entry that couldn't be read as `value`
/// makes the shading invalid.
fn optional_entry<T>(dict: &Dict<'_>, key: &[u8], value: Option<T>, default: T) -> Option<T> {
    if !dict.contains_key(key) {
        return Some(default);
    }

    if value.is_none() {
        warn!("shading has an invalid /{} entry", String::from_utf8_lossy(key));
    }

    value
}

fn read_functions(dict: &Dict<'_>) -> Option<Functions> {
    let Some(object) = dict.get::<Object<'_>>(FUNCTION) else {
        return Some(Functions::new());
    };

    match object {
        Object::Array(array) => {
            if array.len() > MAX_FUNCTIONS {
                warn!("shading has more than {MAX_FUNCTIONS} functions, ignoring the rest");
            }

            (0..array.len().min(MAX_FUNCTIONS))
                .map(|i| {
                    array
                        .get::<Object<'_>>(i)
                        .and_then(|f| Function::new(&f))
                        .warn_none("failed to load shading function")
                })
                .collect()
        }
        other => Some(smallvec::smallvec![
            Function::new(&other).warn_none("failed to load shading function")?
        ]),
    }
}

/// Check that the functions are either one function with up to `max_outputs` outputs,
/// or `max_outputs` functions with a single output each.
fn validate_functions(functions: &[Function], input_count: usize, max_outputs: usize) -> bool {
    let check = |expected_count: usize, expected_outputs: usize| {
        functions.len() == expected_count
            && functions.iter().all(|f| {
                f.input_count() == input_count && f.output_count() <= expected_outputs
            })
    };

    check(1, max_outputs) || check(max_outputs, 1)
}

#[cfg(test)]
mod tests {
    use super::{Shading, ShadingType};
    use crate::color::Family;
    use crate::context::Context;
    use crate::{InterpreterSettings, InterpreterWarning};
    use kurbo::{Affine, Rect};
    use std::sync::{Arc, Mutex};
    use tinct_syntax::object::{ObjRef, Object};
    use tinct_syntax::xref::XRef;

    fn ctx() -> Context {
        Context::new(InterpreterSettings::default())
    }

    fn shading(data: &[u8]) -> Option<Shading> {
        Shading::load(&Object::from_bytes(data).unwrap(), &ctx())
    }

    const RGB_RAMP: &str = "<< /FunctionType 2 /Domain [0 1] /C0 [0 0 0] /C1 [1 1 1] /N 1 >>";
    const GRAY_RAMP: &str = "<< /FunctionType 2 /Domain [0 1] /C0 [0] /C1 [1] /N 1 >>";

    #[test]
    fn axial() {
        let shading = shading(
            format!(
                "<< /ShadingType 2 /ColorSpace /DeviceRGB /Coords [0 0 100 0]
                   /Extend [true false] /Function {RGB_RAMP} /Background [1 0 0]
                   /BBox [10 20 0 0] >>"
            )
            .as_bytes(),
        )
        .unwrap();

        let ShadingType::Axial {
            coords,
            domain,
            extend,
        } = shading.shading_type.as_ref()
        else {
            panic!("expected an axial shading");
        };

        assert_eq!(*coords, [0.0, 0.0, 100.0, 0.0]);
        assert_eq!(*domain, [0.0, 1.0]);
        assert_eq!(*extend, [true, false]);
        assert_eq!(shading.color_space.family(), Family::DeviceRgb);
        assert_eq!(shading.functions.len(), 1);
        assert_eq!(shading.output_count(), 3);
        assert_eq!(shading.background.as_deref(), Some(&[1.0, 0.0, 0.0][..]));
        assert_eq!(shading.bbox, Some(Rect::new(0.0, 0.0, 10.0, 20.0)));
        assert!(!shading.anti_alias);
    }

    #[test]
    fn radial_with_function_array() {
        let shading = shading(
            format!(
                "<< /ShadingType 3 /ColorSpace /DeviceRGB /Coords [0 0 0 0 0 10]
                   /Domain [0 2] /Function [{GRAY_RAMP} {GRAY_RAMP} {GRAY_RAMP}]
                   /AntiAlias true >>"
            )
            .as_bytes(),
        )
        .unwrap();

        assert_eq!(shading.shading_type.number(), 3);
        assert_eq!(shading.functions.len(), 3);
        assert_eq!(shading.output_count(), 3);
        assert!(shading.anti_alias);
        assert!(shading.background.is_none());
    }

    #[test]
    fn function_based() {
        let mut xref = XRef::new();
        xref.insert_stream(
            ObjRef::new(1, 0),
            b"<< /FunctionType 4 /Domain [0 1 0 1] /Range [0 1] >>",
            b"{ add 2 div }".to_vec(),
        )
        .unwrap();
        xref.insert(
            ObjRef::new(2, 0),
            b"<< /ShadingType 1 /ColorSpace /DeviceGray /Matrix [2 0 0 2 0 0] /Function 1 0 R >>",
        )
        .unwrap();

        let object = xref.get::<Object<'_>>(ObjRef::new(2, 0)).unwrap();
        let shading = Shading::load(&object, &ctx()).unwrap();

        let ShadingType::FunctionBased { domain, matrix } = shading.shading_type.as_ref() else {
            panic!("expected a function-based shading");
        };

        assert_eq!(*domain, [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(*matrix, Affine::scale(2.0));

        xref.insert(
            ObjRef::new(3, 0),
            b"<< /ShadingType 1 /ColorSpace /DeviceGray /Domain [0 1 0] /Function 1 0 R >>",
        )
        .unwrap();

        let object = xref.get::<Object<'_>>(ObjRef::new(3, 0)).unwrap();
        assert!(Shading::load(&object, &ctx()).is_none());
    }

    #[test]
    fn invalid_shadings() {
        let invalid = [
            // No color space.
            format!("<< /ShadingType 2 /Coords [0 0 1 0] /Function {RGB_RAMP} >>"),
            // Pattern color space.
            format!("<< /ShadingType 2 /ColorSpace /Pattern /Coords [0 0 1 0] /Function {RGB_RAMP} >>"),
            // Indexed color space.
            format!(
                "<< /ShadingType 2 /ColorSpace [/Indexed /DeviceRGB 0 <000000>]
                   /Coords [0 0 1 0] /Function {GRAY_RAMP} >>"
            ),
            // No function.
            "<< /ShadingType 2 /ColorSpace /DeviceRGB /Coords [0 0 1 0] >>".to_string(),
            // Too many outputs.
            format!("<< /ShadingType 2 /ColorSpace /DeviceGray /Coords [0 0 1 0] /Function {RGB_RAMP} >>"),
            // Two single-output functions for three components.
            format!(
                "<< /ShadingType 2 /ColorSpace /DeviceRGB /Coords [0 0 1 0]
                   /Function [{GRAY_RAMP} {GRAY_RAMP}] >>"
            ),
            // A function that doesn't load.
            format!(
                "<< /ShadingType 3 /ColorSpace /DeviceRGB /Coords [0 0 0 0 0 1]
                   /Function [{GRAY_RAMP} << /FunctionType 9 >> {GRAY_RAMP}] >>"
            ),
            // Domain and Extend with the wrong length or type.
            format!(
                "<< /ShadingType 2 /ColorSpace /DeviceGray /Coords [0 0 1 0] /Domain [0]
                   /Function {GRAY_RAMP} >>"
            ),
            format!(
                "<< /ShadingType 3 /ColorSpace /DeviceGray /Coords [0 0 0 0 0 1]
                   /Domain [0 /One] /Function {GRAY_RAMP} >>"
            ),
            format!(
                "<< /ShadingType 2 /ColorSpace /DeviceGray /Coords [0 0 1 0] /Extend [true]
                   /Function {GRAY_RAMP} >>"
            ),
            format!(
                "<< /ShadingType 2 /ColorSpace /DeviceGray /Coords [0 0 1 0]
                   /Extend [true 1] /Function {GRAY_RAMP} >>"
            ),
            // Missing coordinates.
            format!("<< /ShadingType 3 /ColorSpace /DeviceRGB /Coords [0 0 1 0] /Function {RGB_RAMP} >>"),
            // One-input function for a function-based shading.
            format!("<< /ShadingType 1 /ColorSpace /DeviceRGB /Function {RGB_RAMP} >>"),
            // Mesh shadings need a stream.
            "<< /ShadingType 4 /ColorSpace /DeviceRGB /BitsPerCoordinate 8
                /BitsPerComponent 8 /BitsPerFlag 8 /Decode [0 1 0 1 0 1 0 1 0 1] >>"
                .to_string(),
        ];

        for data in invalid {
            assert!(shading(data.as_bytes()).is_none(), "{data}");
        }
    }

    #[test]
    fn unknown_shading_type() {
        let warnings = Arc::new(Mutex::new(vec![]));
        let sink = warnings.clone();
        let ctx = Context::new(InterpreterSettings {
            warning_sink: Arc::new(move |w| sink.lock().unwrap().push(w)),
        });

        let object = Object::from_bytes(b"<< /ShadingType 8 /ColorSpace /DeviceRGB >>").unwrap();
        assert!(Shading::load(&object, &ctx).is_none());
        assert_eq!(
            *warnings.lock().unwrap(),
            vec![InterpreterWarning::UnsupportedShadingType]
        );
    }

    #[test]
    fn mesh_shadings() {
        let mut xref = XRef::new();
        xref.insert_stream(
            ObjRef::new(1, 0),
            b"<< /ShadingType 4 /ColorSpace /DeviceRGB /BitsPerCoordinate 8
                 /BitsPerComponent 8 /BitsPerFlag 8 /Decode [0 1 0 1 0 1 0 1 0 1] >>",
            vec![0u8; 6],
        )
        .unwrap();
        xref.insert_stream(
            ObjRef::new(2, 0),
            b"<< /ShadingType 5 /ColorSpace /DeviceGray /BitsPerCoordinate 8
                 /BitsPerComponent 8 /VerticesPerRow 3 /Decode [0 1 0 1 0 1] >>",
            vec![0u8; 9],
        )
        .unwrap();
        xref.insert_stream(
            ObjRef::new(3, 0),
            b"<< /ShadingType 5 /ColorSpace /DeviceGray /BitsPerCoordinate 8
                 /BitsPerComponent 8 /VerticesPerRow 1 /Decode [0 1 0 1 0 1] >>",
            vec![0u8; 9],
        )
        .unwrap();
        xref.insert_stream(
            ObjRef::new(4, 0),
            b"<< /ShadingType 6 /ColorSpace [/Indexed /DeviceRGB 1 <ff000000ff00>]
                 /BitsPerCoordinate 16 /BitsPerComponent 8 /BitsPerFlag 2
                 /Decode [0 1 0 1 0 1] >>",
            Vec::<u8>::new(),
        )
        .unwrap();
        xref.insert_stream(
            ObjRef::new(5, 0),
            b"<< /ShadingType 7 /ColorSpace /DeviceCMYK /BitsPerCoordinate 16
                 /BitsPerComponent 8 /BitsPerFlag 2 /Decode [0 1 0 1 0 1] >>",
            Vec::<u8>::new(),
        )
        .unwrap();

        let ctx = ctx();
        let load = |n| Shading::load(&xref.get::<Object<'_>>(ObjRef::new(n, 0)).unwrap(), &ctx);

        let free_form = load(1).unwrap();
        let mesh = free_form.shading_type.mesh().unwrap();
        assert!(mesh.has_flags());
        assert_eq!(mesh.component_count(), 3);
        assert_eq!(mesh.data().len(), 6);

        let lattice = load(2).unwrap();
        assert!(matches!(
            lattice.shading_type.as_ref(),
            ShadingType::Lattice {
                vertices_per_row: 3,
                ..
            }
        ));
        assert!(!lattice.shading_type.mesh().unwrap().has_flags());

        assert!(load(3).is_none());

        // Indexed color spaces are allowed for meshes without functions.
        let coons = load(4).unwrap();
        assert_eq!(coons.shading_type.number(), 6);
        assert_eq!(coons.shading_type.mesh().unwrap().component_count(), 1);

        // The decode array doesn't cover the four CMYK components.
        assert!(load(5).is_none());
    }

    #[test]
    fn indirect_shadings_are_cached() {
        let mut xref = XRef::new();
        xref.insert(
            ObjRef::new(1, 0),
            format!("<< /ShadingType 2 /ColorSpace /DeviceRGB /Coords [0 0 1 0] /Function {RGB_RAMP} >>")
                .as_bytes(),
        )
        .unwrap();

        let ctx = ctx();
        let object = xref.get::<Object<'_>>(ObjRef::new(1, 0)).unwrap();

        let a = Shading::load(&object, &ctx).unwrap();
        let b = Shading::load(&object, &ctx).unwrap();
        assert!(Arc::ptr_eq(&a.shading_type, &b.shading_type));
        assert_eq!(ctx.shadings().len(), 1);
    }
}
