//! Free-form and lattice-form triangle meshes.

use super::to_bgra;
use crate::bitmap::Bitmap;
use kurbo::Affine;
use tinct_interpret::color::Rgb;
use tinct_interpret::mesh::{Mesh, MeshStream, Vertex};
use tinct_interpret::shading::Shading;

/// Draw a free-form triangle mesh.
///
/// A vertex with flag 0 starts a new triangle, with the next two vertices completing
/// it. Any other flag forms a triangle with the new vertex and an edge of the previous
/// triangle.
pub(crate) fn draw_free_form(
    bitmap: &mut Bitmap,
    shading: &Shading,
    mesh: &Mesh,
    transform: Affine,
    alpha: u8,
) -> Option<()> {
    let mut stream = MeshStream::new(mesh, &shading.functions, &shading.color_space);
    let mut previous: Option<[Vertex; 3]> = None;

    while !stream.is_eof() {
        let Some((vertex, flag)) = stream.read_vertex(&transform) else {
            break;
        };

        let triangle = match (flag, previous) {
            (0, _) => {
                let (Some((second, _)), Some((third, _))) = (
                    stream.read_vertex(&transform),
                    stream.read_vertex(&transform),
                ) else {
                    break;
                };

                [vertex, second, third]
            }
            (1, Some([_, b, c])) => [b, c, vertex],
            (_, Some([a, _, c])) => [a, c, vertex],
            // There is no previous triangle to continue.
            (_, None) => continue,
        };

        draw_gouraud(bitmap, &triangle, alpha);
        previous = Some(triangle);
    }

    Some(())
}

/// Draw a lattice-form triangle mesh, where each cell between two consecutive rows of
/// vertices is split into two triangles.
pub(crate) fn draw_lattice(
    bitmap: &mut Bitmap,
    shading: &Shading,
    mesh: &Mesh,
    vertices_per_row: usize,
    transform: Affine,
    alpha: u8,
) -> Option<()> {
    let mut stream = MeshStream::new(mesh, &shading.functions, &shading.color_space);
    let mut previous = stream.read_vertex_row(&transform, vertices_per_row);

    if previous.is_empty() {
        return Some(());
    }

    loop {
        let current = stream.read_vertex_row(&transform, vertices_per_row);

        if current.is_empty() {
            break;
        }

        for i in 1..vertices_per_row {
            draw_gouraud(bitmap, &[previous[i], current[i - 1], previous[i - 1]], alpha);
            draw_gouraud(bitmap, &[previous[i], current[i - 1], current[i]], alpha);
        }

        previous = current;
    }

    Some(())
}

/// Fill a triangle, interpolating the colors of its vertices.
///
/// Each row is sampled at its vertical center. The colors are interpolated along the
/// two edges crossing the row, and then across the row between them.
pub(crate) fn draw_gouraud(bitmap: &mut Bitmap, triangle: &[Vertex; 3], alpha: u8) {
    if triangle
        .iter()
        .any(|v| !v.position.x.is_finite() || !v.position.y.is_finite())
    {
        return;
    }

    let ys = triangle.map(|v| v.position.y);
    let min_y = ys.iter().copied().fold(f64::INFINITY, f64::min);
    let max_y = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if min_y == max_y {
        return;
    }

    let first_row = min_y.floor().max(0.0) as u16;
    let last_row = max_y.ceil().min(f64::from(bitmap.height())) as u16;

    for row in first_row..last_row {
        let y = f64::from(row) + 0.5;
        let mut intersections = [(0.0, Rgb::BLACK); 3];
        let mut count = 0;

        for i in 0..3 {
            let (v1, v2) = (&triangle[i], &triangle[(i + 1) % 3]);
            let (p1, p2) = (v1.position, v2.position);

            if p1.y == p2.y || y < p1.y.min(p2.y) || y > p1.y.max(p2.y) {
                continue;
            }

            let t = (y - p1.y) / (p2.y - p1.y);
            intersections[count] = (p1.x + (p2.x - p1.x) * t, lerp(v1.rgb, v2.rgb, t as f32));
            count += 1;
        }

        if count < 2 {
            continue;
        }

        let intersections = &mut intersections[..count];
        intersections.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (left_x, left_rgb) = intersections[0];
        let (right_x, right_rgb) = intersections[count - 1];

        let start = left_x.floor().max(0.0) as u16;
        let end = right_x.ceil().min(f64::from(bitmap.width())) as u16;
        let span = right_x - left_x;

        for x in start..end {
            let t = if span > 0.0 {
                ((f64::from(x) + 0.5 - left_x) / span).clamp(0.0, 1.0)
            } else {
                0.0
            };

            let rgb = lerp(left_rgb, right_rgb, t as f32);
            bitmap.set_pixel(x, row, to_bgra(rgb, alpha));
        }
    }
}

fn lerp(a: Rgb, b: Rgb, t: f32) -> Rgb {
    Rgb::new(
        a.r + (b.r - a.r) * t,
        a.g + (b.g - a.g) * t,
        a.b + (b.b - a.b) * t,
    )
}
