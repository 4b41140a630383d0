use kurbo::{Affine, Rect};
use once_cell::sync::Lazy;
use std::path::PathBuf;
use tinct_interpret::pattern::Pattern;
use tinct::{Bgra8, Bitmap, Context, InterpreterSettings, RenderSettings, ShadingPattern};
use tinct_syntax::object::{ObjRef, Object};
use tinct_syntax::xref::XRef;

mod radial;

const STORE: Option<&str> = option_env!("STORE");

pub(crate) static WORKSPACE_PATH: Lazy<PathBuf> =
    Lazy::new(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")));
pub(crate) static STORE_PATH: Lazy<PathBuf> = Lazy::new(|| {
    let path = WORKSPACE_PATH.join("store");
    let _ = std::fs::create_dir_all(&path);

    path
});

/// An object of a test document. Objects are numbered starting at 1.
pub(crate) enum Obj<'a> {
    Plain(&'a [u8]),
    Stream(&'a [u8], &'a [u8]),
}

fn xref(objects: &[Obj<'_>]) -> XRef {
    let mut xref = XRef::new();

    for (i, object) in objects.iter().enumerate() {
        let id = ObjRef::new(i as i32 + 1, 0);

        match object {
            Obj::Plain(data) => xref.insert(id, data).unwrap(),
            Obj::Stream(dict, data) => xref.insert_stream(id, dict, data.to_vec()).unwrap(),
        }
    }

    xref
}

/// Load the shading pattern stored as object 1.
pub(crate) fn load_pattern(objects: &[Obj<'_>]) -> ShadingPattern {
    let xref = xref(objects);
    let ctx = Context::new(InterpreterSettings::default());
    let object = xref.get::<Object<'_>>(ObjRef::new(1, 0)).unwrap();

    match Pattern::new(&object, &ctx).unwrap() {
        Pattern::Shading(pattern) => pattern,
        Pattern::Tiling(_) => panic!("expected a shading pattern"),
    }
}

/// Load the shading stored as object 1, as it is painted by the `sh` operator.
pub(crate) fn load_shading_with(objects: &[Obj<'_>], ctx: &Context) -> Option<ShadingPattern> {
    let xref = xref(objects);
    let object = xref.get::<Object<'_>>(ObjRef::new(1, 0)).unwrap();

    ShadingPattern::from_shading(&object, ctx)
}

pub(crate) fn load_shading(objects: &[Obj<'_>]) -> ShadingPattern {
    load_shading_with(objects, &Context::new(InterpreterSettings::default())).unwrap()
}

/// Render a pattern into a transparent bitmap of the given size.
///
/// With `STORE` set, the result is additionally written to the `store` directory.
pub(crate) fn render(
    name: &str,
    pattern: &ShadingPattern,
    (width, height): (u16, u16),
    matrix: Affine,
) -> Bitmap {
    render_with(name, pattern, (width, height), matrix, &RenderSettings::default())
}

pub(crate) fn render_with(
    name: &str,
    pattern: &ShadingPattern,
    (width, height): (u16, u16),
    matrix: Affine,
    settings: &RenderSettings,
) -> Bitmap {
    let mut bitmap = Bitmap::new(width, height);
    let clip = Rect::new(0.0, 0.0, f64::from(width), f64::from(height));

    assert!(tinct::draw(pattern, matrix, clip, 255, &mut bitmap, settings));

    if STORE.is_some() {
        bitmap.save_png(STORE_PATH.join(format!("{name}.png"))).unwrap();
    }

    bitmap
}

pub(crate) fn pixel(bitmap: &Bitmap, x: u16, y: u16) -> Bgra8 {
    bitmap.pixel(x, y).unwrap().unpremultiply()
}

pub(crate) fn is_transparent(bitmap: &Bitmap, x: u16, y: u16) -> bool {
    bitmap.pixel(x, y).unwrap().a == 0
}

/// The red channel of a row of pixels.
pub(crate) fn red_row(bitmap: &Bitmap, y: u16) -> Vec<u8> {
    (0..bitmap.width()).map(|x| pixel(bitmap, x, y).r).collect()
}
