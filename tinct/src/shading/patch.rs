//! Coons and tensor-product patch meshes.

use crate::RenderSettings;
use crate::bitmap::{Bgra8, Bitmap};
use crate::device::{Device, FillOptions, FillRule};
use kurbo::{Affine, BezPath, CubicBez, ParamCurve, Point, Vec2};
use tinct_interpret::color::Rgb;
use tinct_interpret::mesh::{Mesh, MeshStream};
use tinct_interpret::shading::Shading;

/// A color with 8-bit components, which may temporarily leave the valid range while
/// interpolating.
type Color = [i32; 3];

/// Patches whose corner colors differ by less than this in every channel are filled
/// with a single color.
const COLOR_THRESHOLD: i32 = 4;
/// Patches whose boundary curves all span less than this many pixels are filled with a
/// single color.
const SMALL_DISTANCE: f64 = 2.0;

/// The control points of a tensor-product patch. `points[i][j]` is the point with the
/// horizontal index `i` (along `u`) and the vertical index `j` (along `v`).
#[derive(Debug, Clone, Copy, PartialEq)]
struct TensorPatch {
    points: [[Point; 4]; 4],
}

impl TensorPatch {
    /// Arrange the points in the order they are stored in the mesh: first the twelve
    /// boundary points, counterclockwise starting at `p00`, then the four interior
    /// points for tensor-product patches.
    ///
    /// The interior points of a Coons patch are derived from its boundary.
    fn new(stream_points: &[Point; 16], is_tensor: bool) -> Self {
        let s = stream_points;
        let mut points = [
            [s[0], s[1], s[2], s[3]],
            [s[11], s[12], s[13], s[4]],
            [s[10], s[15], s[14], s[5]],
            [s[9], s[8], s[7], s[6]],
        ];

        if !is_tensor {
            let p = points.map(|row| row.map(Point::to_vec2));
            points[1][1] = interior(
                p[0][0],
                [p[0][1], p[1][0]],
                [p[0][3], p[3][0]],
                [p[3][1], p[1][3]],
                p[3][3],
            );
            points[1][2] = interior(
                p[0][3],
                [p[0][2], p[1][3]],
                [p[0][0], p[3][3]],
                [p[3][2], p[1][0]],
                p[3][0],
            );
            points[2][1] = interior(
                p[3][0],
                [p[3][1], p[2][0]],
                [p[3][3], p[0][0]],
                [p[0][1], p[2][3]],
                p[0][3],
            );
            points[2][2] = interior(
                p[3][3],
                [p[3][2], p[2][3]],
                [p[3][0], p[0][3]],
                [p[0][2], p[2][0]],
                p[0][0],
            );
        }

        Self { points }
    }

    /// Split the patch in half along `u`.
    fn split_u(&self) -> (Self, Self) {
        let mut first = *self;
        let mut second = *self;

        for j in 0..4 {
            let p = &self.points;
            let (c1, c2) = CubicBez::new(p[0][j], p[1][j], p[2][j], p[3][j]).subdivide();
            let (a, b) = ([c1.p0, c1.p1, c1.p2, c1.p3], [c2.p0, c2.p1, c2.p2, c2.p3]);

            for i in 0..4 {
                first.points[i][j] = a[i];
                second.points[i][j] = b[i];
            }
        }

        (first, second)
    }

    /// Split the patch in half along `v`.
    fn split_v(&self) -> (Self, Self) {
        let mut first = *self;
        let mut second = *self;

        for (i, row) in self.points.iter().enumerate() {
            let (c1, c2) = CubicBez::new(row[0], row[1], row[2], row[3]).subdivide();
            first.points[i] = [c1.p0, c1.p1, c1.p2, c1.p3];
            second.points[i] = [c2.p0, c2.p1, c2.p2, c2.p3];
        }

        (first, second)
    }

    /// Whether all four boundary curves are shorter than [`SMALL_DISTANCE`], measured
    /// as the Manhattan distance between their end points.
    fn is_small(&self) -> bool {
        let p = &self.points;
        let distance = |a: Point, b: Point| (b.x - a.x).abs() + (b.y - a.y).abs();

        [
            distance(p[0][0], p[3][0]),
            distance(p[0][3], p[3][3]),
            distance(p[0][0], p[0][3]),
            distance(p[3][0], p[3][3]),
        ]
        .iter()
        .all(|d| *d < SMALL_DISTANCE)
    }

    /// The boundary of the patch.
    fn outline(&self) -> BezPath {
        let p = &self.points;
        let mut path = BezPath::new();

        path.move_to(p[0][0]);
        path.curve_to(p[1][0], p[2][0], p[3][0]);
        path.curve_to(p[3][1], p[3][2], p[3][3]);
        path.curve_to(p[2][3], p[1][3], p[0][3]);
        path.curve_to(p[0][2], p[0][1], p[0][0]);
        path.close_path();

        path
    }

    fn bounds(&self) -> (Point, Point) {
        self.points.as_flattened().iter().fold(
            (
                Point::new(f64::INFINITY, f64::INFINITY),
                Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            ),
            |(min, max), p| {
                (
                    Point::new(min.x.min(p.x), min.y.min(p.y)),
                    Point::new(max.x.max(p.x), max.y.max(p.y)),
                )
            },
        )
    }
}

/// An interior control point of a Coons patch, computed from the corner it is next to,
/// the two boundary points adjacent to that corner, the two corners sharing an edge with
/// it, the two boundary points next to those corners and the opposite corner.
fn interior(
    corner: Vec2,
    near: [Vec2; 2],
    far: [Vec2; 2],
    edge: [Vec2; 2],
    opposite: Vec2,
) -> Point {
    let sum = -4.0 * corner + 6.0 * (near[0] + near[1]) - 2.0 * (far[0] + far[1])
        + 3.0 * (edge[0] + edge[1])
        - opposite;

    (sum / 9.0).to_point()
}

/// Draw a Coons (`is_tensor == false`) or tensor-product patch mesh.
pub(crate) fn draw(
    bitmap: &mut Bitmap,
    shading: &Shading,
    mesh: &Mesh,
    is_tensor: bool,
    transform: Affine,
    alpha: u8,
    settings: &RenderSettings,
) -> Option<()> {
    let mut stream = MeshStream::new(mesh, &shading.functions, &shading.color_space);
    let point_count = if is_tensor { 16 } else { 12 };
    let (width, height) = (f64::from(bitmap.width()), f64::from(bitmap.height()));

    let mut drawer = PatchDrawer {
        bitmap,
        colors: [[0; 3]; 4],
        alpha,
        options: FillOptions {
            fill_rule: FillRule::NonZero,
            anti_alias: settings.anti_alias,
            full_cover: true,
        },
        max_depth: settings.max_patch_depth,
    };

    let mut points = [Point::ZERO; 16];
    let mut colors = [[0; 3]; 4];

    'patches: while !stream.is_eof() {
        if !stream.can_read_flag() {
            break;
        }

        let Some(flag) = stream.read_flag() else {
            break;
        };
        let flag = flag as usize;

        // Patches with a non-zero flag share one of the edges of the previous patch.
        let (first_point, first_color) = if flag == 0 {
            (0, 0)
        } else {
            let (old_points, old_colors) = (points, colors);

            for (i, point) in points[..4].iter_mut().enumerate() {
                *point = old_points[(flag * 3 + i) % 12];
            }

            colors[0] = old_colors[flag];
            colors[1] = old_colors[(flag + 1) % 4];

            (4, 2)
        };

        for point in &mut points[first_point..point_count] {
            if !stream.can_read_coords() {
                break 'patches;
            }

            let Some(read) = stream.read_coords(&transform) else {
                break 'patches;
            };
            *point = read;
        }

        for color in &mut colors[first_color..] {
            if !stream.can_read_color() {
                break 'patches;
            }

            let Some(rgb) = stream.read_color() else {
                break 'patches;
            };
            *color = to_color(rgb);
        }

        let patch = TensorPatch::new(&points, is_tensor);
        let (min, max) = patch.bounds();

        if max.x <= 0.0 || min.x >= width || max.y <= 0.0 || min.y >= height {
            continue;
        }

        drawer.colors = colors;
        drawer.draw(&patch, (0.0, 1.0), (0.0, 1.0), 0);
    }

    Some(())
}

fn to_color(rgb: Rgb) -> Color {
    [
        (rgb.r * 255.0) as i32,
        (rgb.g * 255.0) as i32,
        (rgb.b * 255.0) as i32,
    ]
}

fn interpolate(a: i32, b: i32, t: f32) -> i32 {
    a + ((b - a) as f32 * t) as i32
}

/// The largest difference between the channels of two colors.
fn difference(a: Color, b: Color) -> i32 {
    (0..3).map(|i| (a[i] - b[i]).abs()).max().unwrap_or(0)
}

/// Recursively subdivides a patch until it can be filled with a single color.
struct PatchDrawer<'a> {
    bitmap: &'a mut Bitmap,
    /// The colors at the corners `(0, 0)`, `(0, 1)`, `(1, 1)` and `(1, 0)` of the
    /// patch, in `(u, v)` coordinates.
    colors: [Color; 4],
    alpha: u8,
    options: FillOptions,
    max_depth: u8,
}

impl PatchDrawer<'_> {
    fn color_at(&self, u: f32, v: f32) -> Color {
        let [c0, c1, c2, c3] = self.colors;

        std::array::from_fn(|i| {
            interpolate(
                interpolate(c0[i], c3[i], u),
                interpolate(c1[i], c2[i], u),
                v,
            )
        })
    }

    fn draw(
        &mut self,
        patch: &TensorPatch,
        (u0, u1): (f32, f32),
        (v0, v1): (f32, f32),
        depth: u8,
    ) {
        let corners = [
            self.color_at(u0, v0),
            self.color_at(u0, v1),
            self.color_at(u1, v1),
            self.color_at(u1, v0),
        ];

        let d_bottom = difference(corners[3], corners[0]);
        let d_left = difference(corners[1], corners[0]);
        let d_top = difference(corners[1], corners[2]);
        let d_right = difference(corners[2], corners[3]);

        let smooth = [d_bottom, d_left, d_top, d_right]
            .iter()
            .all(|d| *d < COLOR_THRESHOLD);

        if smooth || depth >= self.max_depth || patch.is_small() {
            let [r, g, b] = corners[0].map(|c| c.clamp(0, 255) as u8);
            let color = Bgra8::new(r, g, b, self.alpha);
            self.bitmap.draw_path(&patch.outline(), color, &self.options);

            return;
        }

        let (u_mid, v_mid) = ((u0 + u1) / 2.0, (v0 + v1) / 2.0);

        if d_bottom < COLOR_THRESHOLD && d_top < COLOR_THRESHOLD {
            let (first, second) = patch.split_v();
            self.draw(&first, (u0, u1), (v0, v_mid), depth + 1);
            self.draw(&second, (u0, u1), (v_mid, v1), depth + 1);
        } else if d_left < COLOR_THRESHOLD && d_right < COLOR_THRESHOLD {
            let (first, second) = patch.split_u();
            self.draw(&first, (u0, u_mid), (v0, v1), depth + 1);
            self.draw(&second, (u_mid, u1), (v0, v1), depth + 1);
        } else {
            let (left, right) = patch.split_u();

            for (half, (ua, ub)) in [(left, (u0, u_mid)), (right, (u_mid, u1))] {
                let (bottom, top) = half.split_v();
                self.draw(&bottom, (ua, ub), (v0, v_mid), depth + 1);
                self.draw(&top, (ua, ub), (v_mid, v1), depth + 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{TensorPatch, draw};
    use crate::RenderSettings;
    use crate::bitmap::{Bgra8, Bitmap};
    use crate::shading::tests::load_shading;
    use kurbo::{Affine, Point};
    use tinct_interpret::shading::ShadingType;

    const RED: Bgra8 = Bgra8::opaque(255, 0, 0);

    const COONS: &[u8] = b"<< /ShadingType 6 /ColorSpace /DeviceRGB /BitsPerCoordinate 8
        /BitsPerComponent 8 /BitsPerFlag 8 /Decode [0 255 0 255 0 1 0 1 0 1] >>";

    /// The boundary of the square from (0, 0) to (12, 12), in the order of the mesh.
    #[rustfmt::skip]
    const SQUARE: [u8; 24] = [
        0, 0, 0, 4, 0, 8, 0, 12,
        4, 12, 8, 12, 12, 12, 12, 8,
        12, 4, 12, 0, 8, 0, 4, 0,
    ];

    fn grid_points() -> [Point; 16] {
        let mut points = [Point::ZERO; 16];

        for (i, p) in SQUARE.chunks(2).enumerate() {
            points[i] = Point::new(f64::from(p[0]), f64::from(p[1]));
        }

        points
    }

    fn coons_patch(colors: [[u8; 3]; 4]) -> Vec<u8> {
        let mut data = vec![0];
        data.extend(SQUARE);
        data.extend(colors.as_flattened());

        data
    }

    fn draw_mesh(
        dict: &[u8],
        data: &[u8],
        width: u16,
        height: u16,
        settings: &RenderSettings,
    ) -> Bitmap {
        let shading = load_shading(&[(dict, Some(data))]);
        let mut bitmap = Bitmap::new(width, height);

        let (mesh, is_tensor) = match shading.shading_type.as_ref() {
            ShadingType::Coons { mesh } => (mesh, false),
            ShadingType::Tensor { mesh } => (mesh, true),
            _ => unreachable!(),
        };

        draw(
            &mut bitmap,
            &shading,
            mesh,
            is_tensor,
            Affine::IDENTITY,
            255,
            settings,
        )
        .unwrap();

        bitmap
    }

    fn pixel(bitmap: &Bitmap, x: u16, y: u16) -> Bgra8 {
        bitmap.pixel(x, y).unwrap().unpremultiply()
    }

    #[test]
    fn derived_interior_points() {
        let patch = TensorPatch::new(&grid_points(), false);

        for (i, j) in [(1, 1), (1, 2), (2, 1), (2, 2)] {
            let expected = Point::new(4.0 * i as f64, 4.0 * j as f64);
            assert!((patch.points[i][j] - expected).hypot() < 1e-9);
        }

        // The boundary is kept as is.
        assert_eq!(patch.points[0][3], Point::new(0.0, 12.0));
        assert_eq!(patch.points[1][3], Point::new(4.0, 12.0));
        assert_eq!(patch.points[3][0], Point::new(12.0, 0.0));
    }

    #[test]
    fn tensor_interior_points() {
        let mut points = grid_points();
        points[12] = Point::new(1.0, 2.0);
        let patch = TensorPatch::new(&points, true);

        assert_eq!(patch.points[1][1], Point::new(1.0, 2.0));
    }

    #[test]
    fn splitting() {
        let patch = TensorPatch::new(&grid_points(), false);

        let (left, right) = patch.split_u();
        assert_eq!(left.points[3][0], Point::new(6.0, 0.0));
        assert_eq!(right.points[0][3], Point::new(6.0, 12.0));
        assert_eq!(right.points[3][3], Point::new(12.0, 12.0));

        let (bottom, top) = patch.split_v();
        assert_eq!(bottom.points[0][3], Point::new(0.0, 6.0));
        assert_eq!(top.points[3][0], Point::new(12.0, 6.0));

        assert!(!patch.is_small());
        let (small, _) = bottom.split_u();
        let (small, _) = small.split_v();
        let (small, _) = small.split_u();
        let (small, _) = small.split_v();
        let (small, _) = small.split_u();
        let (small, _) = small.split_v();
        assert!(small.is_small());
    }

    #[test]
    fn uniform_coons_patch() {
        let data = coons_patch([[255, 0, 0]; 4]);
        let bitmap = draw_mesh(COONS, &data, 16, 16, &RenderSettings::default());

        assert_eq!(pixel(&bitmap, 0, 0), RED);
        assert_eq!(pixel(&bitmap, 6, 6), RED);
        assert_eq!(pixel(&bitmap, 11, 11), RED);
        assert_eq!(pixel(&bitmap, 13, 13), Bgra8::TRANSPARENT);
        assert_eq!(pixel(&bitmap, 14, 2), Bgra8::TRANSPARENT);
    }

    #[test]
    fn gradient_patch() {
        // Black on the left side, white on the right side.
        let data = coons_patch([[0, 0, 0], [0, 0, 0], [255, 255, 255], [255, 255, 255]]);
        let bitmap = draw_mesh(COONS, &data, 16, 16, &RenderSettings::default());

        let row = (0..12).map(|x| pixel(&bitmap, x, 6).r).collect::<Vec<_>>();
        assert!(row.is_sorted());
        assert!(row[1] < 64);
        assert!(row[10] > 192);
        assert!((0..12).all(|x| pixel(&bitmap, x, 6).a == 255));

        // Without subdivision, the patch is filled with the color of its first corner.
        let settings = RenderSettings {
            max_patch_depth: 0,
            ..RenderSettings::default()
        };
        let bitmap = draw_mesh(COONS, &data, 16, 16, &settings);
        assert_eq!(pixel(&bitmap, 10, 6), Bgra8::opaque(0, 0, 0));
    }

    #[test]
    fn shared_edge() {
        let mut data = coons_patch([[255, 0, 0]; 4]);
        // The second patch continues at the right edge of the first one, which starts
        // at (12, 12) and ends at (12, 0).
        #[rustfmt::skip]
        data.extend([
            2,
            16, 0, 20, 0, 24, 0, 24, 4,
            24, 8, 24, 12, 20, 12, 16, 12,
            255, 0, 0, 255, 0, 0,
        ]);

        let bitmap = draw_mesh(COONS, &data, 26, 16, &RenderSettings::default());

        assert_eq!(pixel(&bitmap, 6, 6), RED);
        assert_eq!(pixel(&bitmap, 20, 6), RED);
        assert_eq!(pixel(&bitmap, 25, 6), Bgra8::TRANSPARENT);
    }

    #[test]
    fn truncated_patch() {
        let data = coons_patch([[255, 0, 0]; 4]);
        let bitmap = draw_mesh(COONS, &data[..30], 16, 16, &RenderSettings::default());

        assert!(bitmap.data().iter().all(|p| p.a == 0));
    }

    #[test]
    fn patch_outside_of_bitmap() {
        let data = coons_patch([[255, 0, 0]; 4]);
        let shading = load_shading(&[(COONS, Some(data.as_slice()))]);
        let ShadingType::Coons { mesh } = shading.shading_type.as_ref() else {
            unreachable!()
        };

        let mut bitmap = Bitmap::new(16, 16);
        let transform = Affine::translate((20.0, 0.0));
        let settings = RenderSettings::default();
        draw(&mut bitmap, &shading, mesh, false, transform, 255, &settings).unwrap();

        assert!(bitmap.data().iter().all(|p| p.a == 0));
    }

    #[test]
    fn tensor_patch() {
        let dict = b"<< /ShadingType 7 /ColorSpace /DeviceRGB /BitsPerCoordinate 8
            /BitsPerComponent 8 /BitsPerFlag 8 /Decode [0 255 0 255 0 1 0 1 0 1] >>";

        let mut data = vec![0];
        data.extend(SQUARE);
        data.extend([4, 4, 4, 8, 8, 8, 8, 4]);
        data.extend([0u8, 255, 0].repeat(4));

        let bitmap = draw_mesh(dict, &data, 16, 16, &RenderSettings::default());

        assert_eq!(pixel(&bitmap, 6, 6), Bgra8::opaque(0, 255, 0));
        assert_eq!(pixel(&bitmap, 14, 14), Bgra8::TRANSPARENT);
    }
}
