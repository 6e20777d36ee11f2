use log::debug;
use nalgebra as na;
use na::{Matrix4, Vector3};

use crate::error::RenderError;
use crate::mesh::Mesh;
use crate::transform::Transform;
use crate::util::{from_hom_point, from_hom_vector, inverse_transpose, normalize_or_zero, to_hom_point, to_hom_vector, EPSILON};

/// Triangle after the vertex stage. Lives only for the frame that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub positions: [Vector3<f32>; 3],      // Clip space, after perspective divide.
    pub view_positions: [Vector3<f32>; 3], // Camera frame, used for lighting.
    pub normals: [Vector3<f32>; 3],        // Camera frame, unit length.
}

/// Counters collected while projecting. Only for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionStats {
    pub total: usize,
    pub outside: usize,    // All vertices outside of the clip cube.
    pub backfacing: usize, // Every vertex normal facing away from the camera.
    pub degenerate: usize, // Vertex at or behind the eye plane.
    pub min: Vector3<f32>, // Per axis bounds of transformed vertices.
    pub max: Vector3<f32>,
}

impl Default for ProjectionStats {
    fn default() -> Self {
        return Self {
            total: 0,
            outside: 0,
            backfacing: 0,
            degenerate: 0,
            min: Vector3::repeat(f32::INFINITY),
            max: Vector3::repeat(f32::NEG_INFINITY),
        };
    }
}

impl ProjectionStats {
    pub fn kept(&self) -> usize {
        return self.total - self.outside - self.backfacing - self.degenerate;
    }

    /// Share of triangles that didn't make it to rasterization.
    pub fn filtered_fraction(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        return (self.total - self.kept()) as f32 / self.total as f32;
    }

    fn track(&mut self, p: &Vector3<f32>) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }
}

/// Result of the vertex stage, triangles in shape order and then index order.
#[derive(Debug, Clone, Default)]
pub struct Projection {
    pub triangles: Vec<Triangle>,
    pub stats: ProjectionStats,
}

/// Clip space position of p, None for points on or behind the eye plane.
fn to_clip(m: &Matrix4<f32>, p: Vector3<f32>) -> Option<Vector3<f32>> {
    let hom = m * to_hom_point(p);
    if hom.w <= EPSILON {
        return None;
    }
    return from_hom_point(hom);
}

fn is_outside(p: &Vector3<f32>) -> bool {
    return p.x.abs() > 1.0 || p.y.abs() > 1.0 || p.z.abs() > 1.0;
}

/// Runs every triangle of the mesh through the transform and drops the ones that can't
/// be seen. Both tests are coarse: a triangle is dropped only if all of its vertices are
/// outside of the clip cube, or all of its normals point away from the camera.
/// Survivors are not clipped.
pub fn project(mesh: &Mesh, transform: &Transform) -> Result<Projection, RenderError> {
    let mvp_matrix = transform.matrix();
    let mv_matrix = transform.model_view();
    let it_mv_matrix = inverse_transpose(&mv_matrix).ok_or(RenderError::DegenerateTransform)?;

    let mut projection = Projection::default();
    let stats = &mut projection.stats;
    for shape in mesh.shapes() {
        'triangles: for indices in shape.triangles() {
            stats.total += 1;

            let mut triangle = Triangle {
                positions: [Vector3::zeros(); 3],
                view_positions: [Vector3::zeros(); 3],
                normals: [Vector3::zeros(); 3],
            };
            for (i, &index) in indices.iter().enumerate() {
                let vertex = shape.vertex(index);
                let Some(position) = to_clip(&mvp_matrix, vertex.position) else {
                    stats.degenerate += 1;
                    continue 'triangles;
                };
                stats.track(&position);
                triangle.positions[i] = position;
                triangle.view_positions[i] = from_hom_vector(mv_matrix * to_hom_point(vertex.position));
                triangle.normals[i] = normalize_or_zero(from_hom_vector(it_mv_matrix * to_hom_vector(vertex.normal)));
            }

            if triangle.positions.iter().all(is_outside) {
                stats.outside += 1;
                continue;
            }
            if triangle.normals.iter().all(|n| n.z < 0.0) {
                stats.backfacing += 1;
                continue;
            }
            projection.triangles.push(triangle);
        }
    }

    debug!(
        "Projected {} triangles: {} outside, {} backfacing, {} degenerate ({:.1}% filtered)",
        stats.total,
        stats.outside,
        stats.backfacing,
        stats.degenerate,
        100.0 * stats.filtered_fraction()
    );
    debug!("Clip space bounds: min {:?}, max {:?}", stats.min.as_slice(), stats.max.as_slice());

    return Ok(projection);
}
