use crate::{Obj, is_transparent, load_shading, pixel, render};
use kurbo::Affine;

const GRAY: &[u8] = b"<< /FunctionType 2 /Domain [0 1] /C0 [0] /C1 [1] /N 1 >>";

#[test]
fn radial_concentric() {
    let shading = |extend: &[u8]| {
        let mut dict = b"<< /ShadingType 3 /ColorSpace /DeviceGray /Coords [50 50 0 50 50 50]
                            /Function 2 0 R "
            .to_vec();
        dict.extend_from_slice(extend);
        dict.extend_from_slice(b" >>");

        load_shading(&[Obj::Plain(&dict), Obj::Plain(GRAY)])
    };

    let bitmap = render("radial_concentric", &shading(b""), (100, 100), Affine::IDENTITY);

    assert!(pixel(&bitmap, 50, 50).r < 10);
    assert!(pixel(&bitmap, 90, 50).r > 190);
    assert!(pixel(&bitmap, 70, 50).r < pixel(&bitmap, 80, 50).r);
    // The result is symmetric.
    assert_eq!(pixel(&bitmap, 30, 50), pixel(&bitmap, 69, 50));
    assert!(is_transparent(&bitmap, 0, 0));

    let bitmap = render(
        "radial_concentric_extended",
        &shading(b"/Extend [false true]"),
        (100, 100),
        Affine::IDENTITY,
    );

    assert_eq!(pixel(&bitmap, 0, 0).r, 254);
}

#[test]
fn radial_cone() {
    let pattern = load_shading(&[
        Obj::Plain(
            b"<< /ShadingType 3 /ColorSpace /DeviceGray /Coords [30 50 10 70 50 30]
                 /Function 2 0 R /Extend [true true] >>",
        ),
        Obj::Plain(GRAY),
    ]);

    let bitmap = render("radial_cone", &pattern, (100, 100), Affine::IDENTITY);

    assert!(!is_transparent(&bitmap, 60, 50));
    assert!(!is_transparent(&bitmap, 99, 99));
    // Behind the apex of the cone, the radius would be negative.
    assert!(is_transparent(&bitmap, 2, 50));
}

#[test]
fn radial_decreasing() {
    // The end circle lies inside of the start circle.
    let pattern = load_shading(&[
        Obj::Plain(
            b"<< /ShadingType 3 /ColorSpace /DeviceGray /Coords [50 50 40 55 50 10]
                 /Function 2 0 R >>",
        ),
        Obj::Plain(GRAY),
    ]);

    let bitmap = render("radial_decreasing", &pattern, (100, 100), Affine::IDENTITY);

    assert!(pixel(&bitmap, 12, 50).r < 20);
    assert!(pixel(&bitmap, 40, 50).r > 200);
    // The inside of the end circle is only painted if the shading is extended.
    assert!(is_transparent(&bitmap, 55, 50));
    assert!(is_transparent(&bitmap, 0, 0));
}

#[test]
fn radial_transformed() {
    let pattern = load_shading(&[
        Obj::Plain(
            b"<< /ShadingType 3 /ColorSpace /DeviceGray /Coords [5 5 0 5 5 5]
                 /Function 2 0 R >>",
        ),
        Obj::Plain(GRAY),
    ]);

    // An ellipse, twice as wide as it is high.
    let matrix = Affine::scale_non_uniform(10.0, 5.0);
    let bitmap = render("radial_transformed", &pattern, (100, 50), matrix);

    assert!(!is_transparent(&bitmap, 5, 25));
    assert!(!is_transparent(&bitmap, 50, 2));
    assert!(is_transparent(&bitmap, 5, 2));
}
