//! CIE-based color spaces: `CalGray`, `CalRGB` and `Lab`.

use crate::color::Rgb;
use crate::util::OptionLog;
use log::warn;
use tinct_syntax::object::dict::keys::{BLACK_POINT, GAMMA, MATRIX, RANGE, WHITE_POINT};
use tinct_syntax::object::{Array, Dict, Object};

/// `CalGray` colors are treated like `DeviceGray` colors. The parameters are only
/// validated.
pub(crate) struct CalGray {
    black_point: [f32; 3],
}

impl CalGray {
    pub(crate) fn new(array: &Array<'_>) -> Option<Self> {
        let dict = parameters(array)?;
        white_point(&dict)?;

        Some(Self {
            black_point: black_point(&dict),
        })
    }

    pub(crate) fn black_point(&self) -> [f32; 3] {
        self.black_point
    }
}

pub(crate) struct CalRgb {
    black_point: [f32; 3],
    gamma: Option<[f32; 3]>,
    matrix: Option<[f32; 9]>,
    xyz_to_rgb: Matrix3,
}

impl CalRgb {
    pub(crate) fn new(array: &Array<'_>) -> Option<Self> {
        let dict = parameters(array)?;
        let white_point = white_point(&dict)?;

        let gamma = dict.get::<Array<'_>>(GAMMA).map(|a| floats_at::<3>(&a));
        let matrix = dict.get::<Array<'_>>(MATRIX).map(|a| floats_at::<9>(&a));

        Some(Self {
            black_point: black_point(&dict),
            gamma,
            matrix,
            xyz_to_rgb: xyz_to_srgb_with_white_point(white_point),
        })
    }

    pub(crate) fn black_point(&self) -> [f32; 3] {
        self.black_point
    }

    pub(crate) fn to_rgb(&self, components: &[f32]) -> Rgb {
        let mut abc = [components[0], components[1], components[2]];

        if let Some(gamma) = self.gamma {
            for (v, g) in abc.iter_mut().zip(gamma) {
                *v = v.powf(g);
            }
        }

        let [a, b, c] = abc;

        let xyz = match self.matrix {
            Some(m) => [
                m[0] * a + m[3] * b + m[6] * c,
                m[1] * a + m[4] * b + m[7] * c,
                m[2] * a + m[5] * b + m[8] * c,
            ],
            None => abc,
        };

        let [r, g, b] = self.xyz_to_rgb.transform(xyz);

        Rgb::new(encode_srgb(r), encode_srgb(g), encode_srgb(b))
    }
}

pub(crate) struct Lab {
    black_point: [f32; 3],
    ranges: [f32; 4],
}

impl Lab {
    pub(crate) fn new(array: &Array<'_>) -> Option<Self> {
        let dict = parameters(array)?;
        white_point(&dict)?;

        let ranges = dict
            .get::<Array<'_>>(RANGE)
            .map(|a| floats_at::<4>(&a))
            .unwrap_or([-100.0, 100.0, -100.0, 100.0]);

        Some(Self {
            black_point: black_point(&dict),
            ranges,
        })
    }

    pub(crate) fn black_point(&self) -> [f32; 3] {
        self.black_point
    }

    pub(crate) fn default_value(&self, component: usize) -> (f32, f32, f32) {
        if component > 0
            && let Some(&[min, max]) = self.ranges.get(component * 2 - 2..component * 2)
            && min <= max
        {
            return (0.0_f32.clamp(min, max), min, max);
        }

        (0.0, 0.0, 100.0)
    }

    /// Convert a color. The components aren't clamped to the range of the color space.
    pub(crate) fn to_rgb(&self, components: &[f32]) -> Rgb {
        lab_to_rgb(components[0], components[1], components[2])
    }

    pub(crate) fn translate_image_line(&self, dest: &mut [u8], src: &[u8], pixels: usize) {
        for (lab, bgr) in src
            .chunks_exact(3)
            .zip(dest.chunks_exact_mut(3))
            .take(pixels)
        {
            let rgb = lab_to_rgb(
                lab[0] as f32 * 100.0 / 255.0,
                lab[1] as f32 - 128.0,
                lab[2] as f32 - 128.0,
            );
            let [r, g, b] = rgb.to_rgb8();

            bgr.copy_from_slice(&[b, g, r]);
        }
    }
}

fn lab_to_rgb(l: f32, a: f32, b: f32) -> Rgb {
    let m = (l + 16.0) / 116.0;
    let l = m + a / 500.0;
    let n = m - b / 200.0;

    let x = if l < 0.2069 {
        0.957 * 0.12842 * (l - 0.1379)
    } else {
        0.957 * l * l * l
    };
    let y = if m < 0.2069 {
        0.12842 * (m - 0.1379)
    } else {
        m * m * m
    };
    let z = if n < 0.2069 {
        1.0889 * 0.12842 * (n - 0.1379)
    } else {
        1.0889 * n * n * n
    };

    let r = 3.2410 * x - 1.5374 * y - 0.4986 * z;
    let g = -0.9692 * x + 1.8760 * y + 0.0416 * z;
    let b = 0.0556 * x - 0.2040 * y + 1.0570 * z;

    Rgb::new(encode_srgb(r), encode_srgb(g), encode_srgb(b))
}

/// Return the parameter dictionary of a CIE-based color space array.
fn parameters<'a>(array: &Array<'a>) -> Option<Dict<'a>> {
    array
        .get::<Dict<'_>>(1)
        .warn_none("CIE-based color space has no parameter dictionary")
}

/// Read the required white point, which must have a luminance of exactly 1.
fn white_point(dict: &Dict<'_>) -> Option<[f32; 3]> {
    let white_point = dict
        .get::<Array<'_>>(WHITE_POINT)
        .filter(|a| a.len() == 3)
        .map(|a| floats_at::<3>(&a))
        .filter(|[x, y, z]| *x > 0.0 && *y == 1.0 && *z > 0.0);

    if white_point.is_none() {
        warn!("CIE-based color space has an invalid white point");
    }

    white_point
}

/// Read the optional black point. Anything but three non-negative numbers gives the
/// default black point of zeros.
fn black_point(dict: &Dict<'_>) -> [f32; 3] {
    let Some(array) = dict.get::<Array<'_>>(BLACK_POINT) else {
        return [0.0; 3];
    };

    let black_point = floats_at::<3>(&array);

    if array.len() != 3 || black_point.iter().any(|v| *v < 0.0) {
        warn!("CIE-based color space has an invalid black point");

        return [0.0; 3];
    }

    black_point
}

/// Read the first `N` numbers of an array. Missing and non-numeric entries become 0.
fn floats_at<const N: usize>(array: &Array<'_>) -> [f32; N] {
    std::array::from_fn(|i| {
        array
            .get::<Object<'_>>(i)
            .and_then(|o| o.into_f32())
            .unwrap_or(0.0)
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix3([f32; 9]);

impl Matrix3 {
    const ZERO: Self = Self([0.0; 9]);

    fn inverse(&self) -> Self {
        let [a, b, c, d, e, f, g, h, i] = self.0;
        let det = a * (e * i - f * h) - b * (i * d - f * g) + c * (d * h - e * g);

        if det.abs() < f32::EPSILON {
            return Self::ZERO;
        }

        Self([
            (e * i - f * h) / det,
            -(b * i - c * h) / det,
            (b * f - c * e) / det,
            -(d * i - f * g) / det,
            (a * i - c * g) / det,
            -(a * f - c * d) / det,
            (d * h - e * g) / det,
            -(a * h - b * g) / det,
            (a * e - b * d) / det,
        ])
    }

    fn multiply(&self, other: &Self) -> Self {
        let (l, r) = (&self.0, &other.0);

        Self(std::array::from_fn(|n| {
            let (row, col) = (n / 3, n % 3);

            (0..3).map(|k| l[row * 3 + k] * r[k * 3 + col]).sum()
        }))
    }

    fn transform(&self, v: [f32; 3]) -> [f32; 3] {
        let m = &self.0;

        [
            m[0] * v[0] + m[1] * v[1] + m[2] * v[2],
            m[3] * v[0] + m[4] * v[1] + m[5] * v[2],
            m[6] * v[0] + m[7] * v[1] + m[8] * v[2],
        ]
    }
}

/// Build the matrix converting XYZ values into linear sRGB for the given white point,
/// using the sRGB primaries.
fn xyz_to_srgb_with_white_point(white_point: [f32; 3]) -> Matrix3 {
    const PRIMARIES: [(f32, f32); 3] = [(0.64, 0.33), (0.30, 0.60), (0.15, 0.06)];

    let [(rx, ry), (gx, gy), (bx, by)] = PRIMARIES;
    let rgb_xyz = Matrix3([
        rx,
        gx,
        bx,
        ry,
        gy,
        by,
        1.0 - rx - ry,
        1.0 - gx - gy,
        1.0 - bx - by,
    ]);

    let [sr, sg, sb] = rgb_xyz.inverse().transform(white_point);
    let diagonal = Matrix3([sr, 0.0, 0.0, 0.0, sg, 0.0, 0.0, 0.0, sb]);

    rgb_xyz.multiply(&diagonal).inverse()
}

/// Apply the sRGB transfer curve to a linear value, using a lookup table with
/// 10 bits of precision.
fn encode_srgb(value: f32) -> f32 {
    let value = value.clamp(0.0, 1.0);
    let scale = ((value * 1023.0) as i32).max(0) as usize;

    let encoded = if scale < 192 {
        SRGB_SAMPLES_1[scale]
    } else {
        SRGB_SAMPLES_2[(scale / 4 - 48).min(SRGB_SAMPLES_2.len() - 1)]
    };

    encoded as f32 / 255.0
}

const SRGB_SAMPLES_1: [u8; 192] = [
    0, 3, 6, 10, 13, 15, 18, 20, 22, 23, 25, 27, 28, 30, 31, 32, 34, 35, 36, 37, 38, 39, 40, 41,
    42, 43, 44, 45, 46, 47, 48, 49, 49, 50, 51, 52, 53, 53, 54, 55, 56, 56, 57, 58, 58, 59, 60, 61,
    61, 62, 62, 63, 64, 64, 65, 66, 66, 67, 67, 68, 68, 69, 70, 70, 71, 71, 72, 72, 73, 73, 74, 74,
    75, 76, 76, 77, 77, 78, 78, 79, 79, 79, 80, 80, 81, 81, 82, 82, 83, 83, 84, 84, 85, 85, 85, 86,
    86, 87, 87, 88, 88, 88, 89, 89, 90, 90, 91, 91, 91, 92, 92, 93, 93, 93, 94, 94, 95, 95, 95, 96,
    96, 97, 97, 97, 98, 98, 98, 99, 99, 99, 100, 100, 101, 101, 101, 102, 102, 102, 103, 103, 103,
    104, 104, 104, 105, 105, 106, 106, 106, 107, 107, 107, 108, 108, 108, 109, 109, 109, 110, 110,
    110, 110, 111, 111, 111, 112, 112, 112, 113, 113, 113, 114, 114, 114, 115, 115, 115, 115, 116,
    116, 116, 117, 117, 117, 118, 118, 118, 118, 119, 119, 119, 120,
];

const SRGB_SAMPLES_2: [u8; 208] = [
    120, 121, 122, 124, 125, 126, 127, 128, 129, 130, 131, 132, 133, 134, 135, 136, 137, 138, 139,
    140, 141, 142, 143, 144, 145, 146, 147, 148, 148, 149, 150, 151, 152, 153, 154, 155, 155, 156,
    157, 158, 159, 159, 160, 161, 162, 163, 163, 164, 165, 166, 167, 167, 168, 169, 170, 170, 171,
    172, 173, 173, 174, 175, 175, 176, 177, 178, 178, 179, 180, 180, 181, 182, 182, 183, 184, 185,
    185, 186, 187, 187, 188, 189, 189, 190, 190, 191, 192, 192, 193, 194, 194, 195, 196, 196, 197,
    197, 198, 199, 199, 200, 200, 201, 202, 202, 203, 203, 204, 205, 205, 206, 206, 207, 208, 208,
    209, 209, 210, 210, 211, 212, 212, 213, 213, 214, 214, 215, 215, 216, 216, 217, 218, 218, 219,
    219, 220, 220, 221, 221, 222, 222, 223, 223, 224, 224, 225, 226, 226, 227, 227, 228, 228, 229,
    229, 230, 230, 231, 231, 232, 232, 233, 233, 234, 234, 235, 235, 236, 236, 237, 237, 238, 238,
    238, 239, 239, 240, 240, 241, 241, 242, 242, 243, 243, 244, 244, 245, 245, 246, 246, 246, 247,
    247, 248, 248, 249, 249, 250, 250, 251, 251, 251, 252, 252, 253, 253, 254, 254, 255, 255,
];

#[cfg(test)]
mod tests {
    use super::{Matrix3, encode_srgb};
    use crate::color::Rgb;
    use crate::color::tests::{assert_rgb, load};

    const D65: &str = "/WhitePoint [0.9505 1 1.089]";

    #[test]
    fn srgb_curve() {
        assert_eq!(encode_srgb(0.0), 0.0);
        assert_eq!(encode_srgb(1.0), 1.0);
        assert_eq!(encode_srgb(2.0), 1.0);
        assert_eq!(encode_srgb(-1.0), 0.0);
        // 0.5 * 1023 = 511, which is in the second table.
        assert_eq!(encode_srgb(0.5), 187.0 / 255.0);
    }

    #[test]
    fn matrix_inverse() {
        let m = Matrix3([2.0, 0.0, 0.0, 0.0, 4.0, 0.0, 0.0, 0.0, 8.0]);
        assert_eq!(m.inverse(), Matrix3([0.5, 0.0, 0.0, 0.0, 0.25, 0.0, 0.0, 0.0, 0.125]));

        let singular = Matrix3([1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 0.0, 0.0, 1.0]);
        assert_eq!(singular.inverse(), Matrix3::ZERO);

        let m = Matrix3([1.0, 2.0, 0.0, 0.0, 1.0, 3.0, 4.0, 0.0, 1.0]);
        let identity = m.multiply(&m.inverse());

        for (i, v) in identity.0.iter().enumerate() {
            let expected = if i % 4 == 0 { 1.0 } else { 0.0 };
            assert!((v - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn cal_gray_is_identity() {
        let cs = load(format!("[/CalGray << {D65} /Gamma 2.2 >>]").as_bytes()).unwrap();

        assert_eq!(cs.get_rgb(&[0.3]).unwrap(), Rgb::gray(0.3));

        let mut dest = [0; 3];
        cs.translate_image_line(&mut dest, &[77], 1, 1, 1, false);
        assert_eq!(dest, [77, 77, 77]);
    }

    #[test]
    fn invalid_white_point() {
        for white_point in ["", "/WhitePoint [0.9505 0.9 1.089]", "/WhitePoint [0 1 1]", "/WhitePoint [1 1]"] {
            assert!(load(format!("[/CalGray << {white_point} >>]").as_bytes()).is_none());
            assert!(load(format!("[/CalRGB << {white_point} >>]").as_bytes()).is_none());
            assert!(load(format!("[/Lab << {white_point} >>]").as_bytes()).is_none());
        }

        assert!(load(b"[/CalRGB 1]").is_none());
    }

    #[test]
    fn cal_rgb() {
        let cs = load(format!("[/CalRGB << {D65} >>]").as_bytes()).unwrap();

        assert_rgb(cs.get_rgb(&[0.0, 0.0, 0.0]).unwrap(), Rgb::BLACK);

        // Without a matrix, the white point maps to white.
        let white = cs.get_rgb(&[0.9505, 1.0, 1.089]).unwrap();
        assert!(white.r > 0.98 && white.g > 0.98 && white.b > 0.98, "{white:?}");

        // Byte samples are only reordered.
        let mut dest = [0; 3];
        cs.translate_image_line(&mut dest, &[1, 2, 3], 1, 1, 1, false);
        assert_eq!(dest, [3, 2, 1]);
    }

    #[test]
    fn cal_rgb_with_matrix_and_gamma() {
        let cs = load(
            format!(
                "[/CalRGB << {D65} /Gamma [2 2 2]
                 /Matrix [0.4124 0.2126 0.0193 0.3576 0.7152 0.1192 0.1805 0.0722 0.9505] >>]"
            )
            .as_bytes(),
        )
        .unwrap();

        let white = cs.get_rgb(&[1.0, 1.0, 1.0]).unwrap();
        assert!(white.r > 0.98 && white.g > 0.98 && white.b > 0.98, "{white:?}");

        let red = cs.get_rgb(&[1.0, 0.0, 0.0]).unwrap();
        assert!(red.r > 0.9 && red.g < 0.1 && red.b < 0.1, "{red:?}");

        let dark = cs.get_rgb(&[0.5, 0.5, 0.5]).unwrap();
        let light = cs.get_rgb(&[0.75, 0.75, 0.75]).unwrap();
        assert!(dark.g < light.g);
    }

    #[test]
    fn lab() {
        let cs = load(format!("[/Lab << {D65} >>]").as_bytes()).unwrap();

        let white = cs.get_rgb(&[100.0, 0.0, 0.0]).unwrap();
        assert!(white.r > 0.98 && white.g > 0.98 && white.b > 0.98, "{white:?}");
        assert_rgb(cs.get_rgb(&[0.0, 0.0, 0.0]).unwrap(), Rgb::BLACK);

        let red = cs.get_rgb(&[50.0, 80.0, 60.0]).unwrap();
        assert!(red.r > red.g && red.r > red.b, "{red:?}");

        let mut dest = [0; 3];
        cs.translate_image_line(&mut dest, &[255, 128, 128], 1, 1, 1, false);
        assert!(dest.iter().all(|v| *v >= 250), "{dest:?}");
    }

    #[test]
    fn lab_components_are_not_clamped() {
        let cs = load(format!("[/Lab << {D65} /Range [-10 10 -10 10] >>]").as_bytes()).unwrap();

        // Out-of-range components are converted as they are.
        let red = cs.get_rgb(&[50.0, 80.0, 0.0]).unwrap();
        let clamped = cs.get_rgb(&[50.0, 10.0, 0.0]).unwrap();
        assert!(red.r > clamped.r && red.g < clamped.g, "{red:?} {clamped:?}");

        // An L above 100 is brighter than white in every channel and saturates.
        let white = cs.get_rgb(&[120.0, 0.0, 0.0]).unwrap();
        assert_eq!(white, Rgb::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn black_points() {
        let black_point = |params: &str| {
            load(format!("[/CalRGB << {D65} {params} >>]").as_bytes())
                .unwrap()
                .black_point()
        };

        assert_eq!(black_point(""), Some([0.0; 3]));
        assert_eq!(black_point("/BlackPoint [0.1 0.2 0.3]"), Some([0.1, 0.2, 0.3]));
        assert_eq!(black_point("/BlackPoint [0.1 0.2]"), Some([0.0; 3]));
        assert_eq!(black_point("/BlackPoint [0.1 -0.2 0.3]"), Some([0.0; 3]));

        let cs = load(format!("[/CalGray << {D65} /BlackPoint [1 1 1] >>]").as_bytes()).unwrap();
        assert_eq!(cs.black_point(), Some([1.0; 3]));

        let cs = load(format!("[/Lab << {D65} /BlackPoint [0 0 2] >>]").as_bytes()).unwrap();
        assert_eq!(cs.black_point(), Some([0.0, 0.0, 2.0]));

        assert_eq!(load(b"/DeviceRGB").unwrap().black_point(), None);
    }

    #[test]
    fn lab_default_values() {
        let cs = load(format!("[/Lab << {D65} /Range [-50 50 10 20] >>]").as_bytes()).unwrap();

        assert_eq!(cs.default_value(0), (0.0, 0.0, 100.0));
        assert_eq!(cs.default_value(1), (0.0, -50.0, 50.0));
        assert_eq!(cs.default_value(2), (10.0, 10.0, 20.0));

        let inverted = load(format!("[/Lab << {D65} /Range [5 -5 0 1] >>]").as_bytes()).unwrap();
        assert_eq!(inverted.default_value(1), (0.0, 0.0, 100.0));
    }
}
