//! The device abstraction the rasterizer paints through, and a scanline path filler
//! for bitmaps.

use crate::bitmap::{Bgra8, Bitmap};
use kurbo::{BezPath, PathEl, Point};

const TOLERANCE: f64 = 0.1;
const SUB_SAMPLES: usize = 4;

/// The fill rule used when filling a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    /// The non-zero winding rule.
    #[default]
    NonZero,
    /// The even-odd rule.
    EvenOdd,
}

/// Options for filling a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FillOptions {
    /// The fill rule.
    pub fill_rule: FillRule,
    /// Whether the edges of the path should be anti-aliased.
    pub anti_alias: bool,
    /// Whether every pixel touched by the path should be painted with full coverage.
    ///
    /// This avoids hairline seams between adjacent shapes that share an edge.
    pub full_cover: bool,
}

/// A target that shadings can be painted into.
pub trait Device {
    /// The width and height of the device in pixels.
    fn size(&self) -> (u16, u16);

    /// Fill a path, given in device pixel coordinates.
    fn draw_path(&mut self, path: &BezPath, color: Bgra8, options: &FillOptions);

    /// Composite a bitmap over the device, with its top-left corner at `(x, y)`.
    fn draw_bitmap(&mut self, bitmap: &Bitmap, x: u16, y: u16);
}

impl Device for Bitmap {
    fn size(&self) -> (u16, u16) {
        (self.width(), self.height())
    }

    fn draw_path(&mut self, path: &BezPath, color: Bgra8, options: &FillOptions) {
        fill_path(self, path, color, options);
    }

    fn draw_bitmap(&mut self, bitmap: &Bitmap, x: u16, y: u16) {
        self.composite(bitmap, x, y);
    }
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    winding: i32,
}

impl Edge {
    fn new(p0: Point, p1: Point) -> Option<Self> {
        if p0.y == p1.y {
            return None;
        }

        let (top, bottom, winding) = if p0.y < p1.y {
            (p0, p1, 1)
        } else {
            (p1, p0, -1)
        };

        Some(Self {
            x0: top.x,
            y0: top.y,
            x1: bottom.x,
            y1: bottom.y,
            winding,
        })
    }

    fn intersect(&self, y: f64) -> Option<f64> {
        (self.y0 <= y && y < self.y1)
            .then(|| self.x0 + (y - self.y0) * (self.x1 - self.x0) / (self.y1 - self.y0))
    }
}

fn collect_edges(path: &BezPath) -> Vec<Edge> {
    let mut edges = vec![];
    let mut start = Point::ZERO;
    let mut last = Point::ZERO;

    let close = |edges: &mut Vec<Edge>, last: Point, start: Point| {
        edges.extend(Edge::new(last, start));
    };

    kurbo::flatten(path.iter(), TOLERANCE, |el| match el {
        PathEl::MoveTo(p) => {
            close(&mut edges, last, start);
            start = p;
            last = p;
        }
        PathEl::LineTo(p) => {
            edges.extend(Edge::new(last, p));
            last = p;
        }
        PathEl::ClosePath => {
            close(&mut edges, last, start);
            last = start;
        }
        // Only lines remain after flattening.
        PathEl::QuadTo(..) | PathEl::CurveTo(..) => {}
    });

    close(&mut edges, last, start);

    edges
        .into_iter()
        .filter(|e| [e.x0, e.y0, e.x1, e.y1].iter().all(|v| v.is_finite()))
        .collect()
}

/// Fill a path into a bitmap with a scanline algorithm.
pub(crate) fn fill_path(bitmap: &mut Bitmap, path: &BezPath, color: Bgra8, options: &FillOptions) {
    let edges = collect_edges(path);

    if edges.is_empty() {
        return;
    }

    let width = bitmap.width();
    let y_min = edges.iter().map(|e| e.y0).fold(f64::INFINITY, f64::min);
    let y_max = edges.iter().map(|e| e.y1).fold(f64::NEG_INFINITY, f64::max);

    let first_row = y_min.floor().max(0.0) as u16;
    let last_row = y_max.ceil().min(f64::from(bitmap.height())) as u16;

    let samples = if options.anti_alias || options.full_cover {
        SUB_SAMPLES
    } else {
        1
    };

    let mut coverage = vec![0.0f32; usize::from(width)];
    let mut crossings: Vec<(f64, i32)> = vec![];

    for row in first_row..last_row {
        coverage.fill(0.0);
        let (mut touched_start, mut touched_end) = (usize::MAX, 0);

        for sample in 0..samples {
            let y = f64::from(row) + (sample as f64 + 0.5) / samples as f64;

            crossings.clear();
            crossings.extend(
                edges
                    .iter()
                    .filter_map(|e| e.intersect(y).map(|x| (x, e.winding))),
            );
            crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut winding = 0;

            for pair in crossings.windows(2) {
                winding += pair[0].1;

                let inside = match options.fill_rule {
                    FillRule::NonZero => winding != 0,
                    FillRule::EvenOdd => winding % 2 != 0,
                };

                if !inside {
                    continue;
                }

                let span = if samples == 1 {
                    center_span(pair[0].0, pair[1].0, width, &mut coverage)
                } else {
                    covered_span(
                        pair[0].0,
                        pair[1].0,
                        width,
                        1.0 / samples as f32,
                        &mut coverage,
                    )
                };

                if let Some((start, end)) = span {
                    touched_start = touched_start.min(start);
                    touched_end = touched_end.max(end);
                }
            }
        }

        for x in touched_start..touched_end {
            let value = coverage[x];

            if value <= 0.0 {
                continue;
            }

            let alpha = if options.full_cover {
                255
            } else {
                (value.min(1.0) * 255.0 + 0.5) as u8
            };

            bitmap.blend_pixel(x as u16, row, color, alpha);
        }
    }
}

/// Mark the pixels whose center lies in `[x0, x1)` as fully covered.
fn center_span(x0: f64, x1: f64, width: u16, coverage: &mut [f32]) -> Option<(usize, usize)> {
    let start = (x0 - 0.5).ceil().max(0.0);
    let end = (x1 - 0.5).ceil().min(f64::from(width));

    if start >= end {
        return None;
    }

    let (start, end) = (start as usize, end as usize);
    coverage[start..end].fill(1.0);

    Some((start, end))
}

/// Add the exact horizontal coverage of `[x0, x1)` to each pixel, weighted by `weight`.
fn covered_span(
    x0: f64,
    x1: f64,
    width: u16,
    weight: f32,
    coverage: &mut [f32],
) -> Option<(usize, usize)> {
    let x0 = x0.max(0.0);
    let x1 = x1.min(f64::from(width));

    if x0 >= x1 {
        return None;
    }

    let start = x0.floor() as usize;
    let end = (x1.ceil() as usize).min(usize::from(width));

    for (x, value) in coverage.iter_mut().enumerate().take(end).skip(start) {
        let left = x0.max(x as f64);
        let right = x1.min((x + 1) as f64);
        *value += (right - left).max(0.0) as f32 * weight;
    }

    Some((start, end))
}
