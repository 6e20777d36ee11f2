use std::ops::{Range, RangeInclusive};

use nalgebra as na;
use na::{vector, Vector2, Vector3};

use super::projector::Triangle;
use crate::util::EPSILON;

/// Covered pixel of a triangle with its barycentric coordinates relative to the
/// triangle vertices. (0, 0) is the top left pixel of the image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pixel {
    pub x: u32,
    pub y: u32,
    pub barycentric: Vector3<f32>,
}

/// Viewport transformation of clip space x, y in \[-1.0, 1.0\] to pixel space, flipping y
/// so that clip +y ends up at row 0.
pub fn to_screen(v: &Vector3<f32>, width: u32, height: u32) -> Vector2<f32> {
    return vector![
        (v.x + 1.0) / 2.0 * width as f32,
        (1.0 - v.y) / 2.0 * height as f32
    ];
}

/// Signed doubled area of (a, b, p), positive when p is on the right of a -> b in pixel space.
fn edge(a: Vector2<f32>, b: Vector2<f32>, p: Vector2<f32>) -> f32 {
    return (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
}

/// Per triangle constants of the scan.
#[derive(Debug, Clone, Copy)]
struct EdgeSetup {
    vertices: [Vector2<f32>; 3],
    area: f32,
    // Edge opposite to vertex i owns the samples lying exactly on it.
    owns_edge: [bool; 3],
}

impl EdgeSetup {
    /// None for triangles with no area on screen.
    fn new(screen: [Vector2<f32>; 3]) -> Option<EdgeSetup> {
        if screen.iter().any(|v| !v.x.is_finite() || !v.y.is_finite()) {
            return None;
        }
        let area = edge(screen[0], screen[1], screen[2]);
        if area.abs() < EPSILON {
            return None;
        }

        // Top-left rule. Edges are walked so that the inside is on the right of them,
        // then a top edge runs exactly along +x and a left edge goes up the screen.
        let orientation = area.signum();
        let owns = |a: Vector2<f32>, b: Vector2<f32>| {
            let d = (b - a) * orientation;
            return (d.y == 0.0 && d.x > 0.0) || d.y < 0.0;
        };
        let owns_edge = [
            owns(screen[1], screen[2]),
            owns(screen[2], screen[0]),
            owns(screen[0], screen[1]),
        ];

        return Some(EdgeSetup { vertices: screen, area, owns_edge });
    }

    /// Integer bounding box of the triangle clipped to the image columns and given rows.
    fn bounds(&self, width: u32, rows: &Range<u32>) -> (RangeInclusive<i64>, RangeInclusive<i64>) {
        let [a, b, c] = self.vertices;
        let min = a.inf(&b).inf(&c);
        let max = a.sup(&b).sup(&c);
        let xs = (min.x.floor() as i64).max(0)..=(max.x.ceil() as i64).min(width as i64 - 1);
        let ys = (min.y.floor() as i64).max(rows.start as i64)..=(max.y.ceil() as i64).min(rows.end as i64 - 1);
        return (xs, ys);
    }

    fn pixel(&self, x: i64, y: i64) -> Option<Pixel> {
        let [a, b, c] = self.vertices;
        let p = vector![x as f32, y as f32];
        let barycentric = vector![edge(b, c, p), edge(c, a, p), edge(a, b, p)] / self.area;
        for i in 0..3 {
            let inside = barycentric[i] > 0.0 || (barycentric[i] == 0.0 && self.owns_edge[i]);
            if !inside {
                return None;
            }
        }
        return Some(Pixel {
            x: x as u32,
            y: y as u32,
            barycentric,
        });
    }
}

/// Lazily scans the pixels of an image of given size that the triangle covers.
/// Parts of the triangle outside of the image are skipped, zero area triangles cover nothing.
pub fn rasterize(triangle: &Triangle, width: u32, height: u32) -> impl Iterator<Item = Pixel> {
    return rasterize_rows(triangle, width, height, 0..height);
}

/// Same as `rasterize`, but only visits the given band of rows.
pub fn rasterize_rows(triangle: &Triangle, width: u32, height: u32, rows: Range<u32>) -> impl Iterator<Item = Pixel> {
    let rows = rows.start..rows.end.min(height);
    let screen = triangle.positions.map(|v| to_screen(&v, width, height));
    let setup = EdgeSetup::new(screen);
    let (xs, ys) = match &setup {
        Some(setup) => setup.bounds(width, &rows),
        None => (1..=0, 1..=0),
    };

    return ys
        .flat_map(move |y| xs.clone().map(move |x| (x, y)))
        .filter_map(move |(x, y)| setup.as_ref().and_then(|setup| setup.pixel(x, y)));
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Triangle given by pixel space corners of a 20x20 image.
    fn screen_triangle(corners: [[f32; 2]; 3]) -> Triangle {
        let to_clip = |c: [f32; 2]| vector![c[0] / 10.0 - 1.0, 1.0 - c[1] / 10.0, 0.0];
        return Triangle {
            positions: corners.map(to_clip),
            view_positions: [Vector3::zeros(); 3],
            normals: [Vector3::z(); 3],
        };
    }

    #[test]
    fn test_right_triangle_coverage() {
        let triangle = screen_triangle([[0.0, 0.0], [10.0, 0.0], [0.0, 10.0]]);
        let pixels: Vec<Pixel> = rasterize(&triangle, 20, 20).collect();
        // Legs are top and left edges and stay in, the hypotenuse belongs to the neighbour.
        assert_eq!(pixels.len(), 55);
        for pixel in &pixels {
            assert!(pixel.x + pixel.y < 10);
            assert!((pixel.barycentric.sum() - 1.0).abs() < 1e-5);
            assert!(pixel.barycentric.iter().all(|&w| w >= 0.0));
        }
        let corner = pixels.iter().find(|p| p.x == 0 && p.y == 0).unwrap();
        assert!((corner.barycentric - vector![1.0, 0.0, 0.0]).norm() < 1e-6);
    }

    #[test]
    fn test_winding_does_not_matter() {
        let a = rasterize(&screen_triangle([[0.0, 0.0], [10.0, 0.0], [0.0, 10.0]]), 20, 20).count();
        let b = rasterize(&screen_triangle([[0.0, 0.0], [0.0, 10.0], [10.0, 0.0]]), 20, 20).count();
        assert_eq!(a, b);
    }

    #[test]
    fn test_shared_edge_is_covered_once() {
        let upper = screen_triangle([[0.0, 0.0], [10.0, 0.0], [0.0, 10.0]]);
        let lower = screen_triangle([[10.0, 0.0], [0.0, 10.0], [10.0, 10.0]]);
        let mut hits = vec![0; 400];
        for pixel in rasterize(&upper, 20, 20).chain(rasterize(&lower, 20, 20)) {
            hits[(pixel.x + pixel.y * 20) as usize] += 1;
        }
        assert!(hits.iter().all(|&h| h <= 1));
        assert_eq!(hits.iter().sum::<i32>(), 100);
    }

    #[test]
    fn test_degenerate_triangle_covers_nothing() {
        let line = screen_triangle([[0.0, 0.0], [5.0, 5.0], [10.0, 10.0]]);
        assert_eq!(rasterize(&line, 20, 20).count(), 0);
        let point = screen_triangle([[3.0, 3.0]; 3]);
        assert_eq!(rasterize(&point, 20, 20).count(), 0);
    }

    #[test]
    fn test_triangle_is_clamped_to_image() {
        let huge = screen_triangle([[-50.0, -50.0], [100.0, -50.0], [-50.0, 100.0]]);
        let pixels: Vec<Pixel> = rasterize(&huge, 20, 20).collect();
        assert_eq!(pixels.len(), 400);
        assert!(pixels.iter().all(|p| p.x < 20 && p.y < 20));

        let away = screen_triangle([[30.0, 30.0], [40.0, 30.0], [30.0, 40.0]]);
        assert_eq!(rasterize(&away, 20, 20).count(), 0);
    }

    #[test]
    fn test_row_bands_partition_the_scan() {
        let triangle = screen_triangle([[1.0, 2.0], [18.0, 7.0], [6.0, 19.0]]);
        let full: Vec<Pixel> = rasterize(&triangle, 20, 20).collect();
        let banded: Vec<Pixel> = (0..4)
            .flat_map(|band| rasterize_rows(&triangle, 20, 20, band * 5..band * 5 + 5))
            .collect();
        assert_eq!(full, banded);
    }

    #[test]
    fn test_viewport_flips_y() {
        let top_left = to_screen(&vector![-1.0, 1.0, 0.0], 20, 10);
        let bottom_right = to_screen(&vector![1.0, -1.0, 0.0], 20, 10);
        assert_eq!(top_left, vector![0.0, 0.0]);
        assert_eq!(bottom_right, vector![20.0, 10.0]);
    }
}
