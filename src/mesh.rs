use log::{info, trace, warn};
use nalgebra as na;
use na::{vector, Vector3};

use crate::error::RenderError;
use crate::util::normalize_or_zero;

/// Vertex of a shape, position and unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vector3<f32>,
    pub normal: Vector3<f32>,
}

/// Named piece of a mesh, stored as the flat buffers it was loaded from.
/// Every consecutive index triple names one triangle.
#[derive(Debug, Clone)]
pub struct Shape {
    name: String,
    positions: Vec<f32>,
    normals: Vec<f32>, // Empty until derived if the loader had none.
    indices: Vec<u32>,
}

impl Shape {
    /// Takes flat buffers from a mesh loader, checking that they describe whole triangles
    /// over existing vertices. An empty normal buffer means the shape has no normals.
    pub fn new(name: impl Into<String>, positions: Vec<f32>, normals: Vec<f32>, indices: Vec<u32>) -> Result<Shape, RenderError> {
        let name = name.into();
        let malformed = |buffer: &'static str, len: usize| RenderError::MalformedBuffer {
            shape: name.clone(),
            buffer,
            len,
        };
        if positions.len() % 3 != 0 {
            return Err(malformed("position", positions.len()));
        }
        if !normals.is_empty() && normals.len() != positions.len() {
            return Err(malformed("normal", normals.len()));
        }
        if indices.len() % 3 != 0 {
            return Err(malformed("index", indices.len()));
        }
        let vertex_count = positions.len() / 3;
        if let Some(&index) = indices.iter().find(|&&index| index as usize >= vertex_count) {
            return Err(RenderError::IndexOutOfRange { shape: name, index, vertex_count });
        }

        return Ok(Shape { name, positions, normals, indices });
    }

    pub fn name(&self) -> &str {
        return &self.name;
    }

    pub fn vertex_count(&self) -> usize {
        return self.positions.len() / 3;
    }

    pub fn triangle_count(&self) -> usize {
        return self.indices.len() / 3;
    }

    pub fn has_normals(&self) -> bool {
        return !self.normals.is_empty();
    }

    pub fn positions(&self) -> &[f32] {
        return &self.positions[..];
    }

    pub fn normals(&self) -> &[f32] {
        return &self.normals[..];
    }

    pub fn indices(&self) -> &[u32] {
        return &self.indices[..];
    }

    pub fn position(&self, i: usize) -> Vector3<f32> {
        return vector![self.positions[3 * i], self.positions[3 * i + 1], self.positions[3 * i + 2]];
    }

    /// Normal of vertex i, zero if the shape has no normals.
    pub fn normal(&self, i: usize) -> Vector3<f32> {
        if self.normals.is_empty() {
            return Vector3::zeros();
        }
        return vector![self.normals[3 * i], self.normals[3 * i + 1], self.normals[3 * i + 2]];
    }

    pub fn vertex(&self, i: usize) -> Vertex {
        return Vertex {
            position: self.position(i),
            normal: self.normal(i),
        };
    }

    /// Vertex index triples of all triangles, in index buffer order.
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        return self
            .indices
            .chunks_exact(3)
            .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize]);
    }

    /// Vertex normals as the normalized sum of unit normals of adjacent faces.
    /// Faces with zero area add nothing, vertices without any contribution get a zero normal.
    /// Existing normals are overwritten.
    pub fn derive_normals(&mut self) {
        if self.has_normals() {
            warn!("Overwriting existing normals of shape '{}'", self.name);
        }

        let mut accumulated = vec![Vector3::<f32>::zeros(); self.vertex_count()];
        for [a, b, c] in self.triangles() {
            let v0 = self.position(a);
            let face_normal = normalize_or_zero((self.position(b) - v0).cross(&(self.position(c) - v0)));
            accumulated[a] += face_normal;
            accumulated[b] += face_normal;
            accumulated[c] += face_normal;
        }

        self.normals = accumulated
            .into_iter()
            .flat_map(|n| {
                let n = normalize_or_zero(n);
                [n.x, n.y, n.z]
            })
            .collect();
    }
}

/// Ordered list of shapes. Read only once built, every render call borrows it.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    shapes: Vec<Shape>,
}

impl Mesh {
    /// Builds the mesh, deriving normals for the shapes that came without them.
    pub fn new(mut shapes: Vec<Shape>) -> Mesh {
        for shape in shapes.iter_mut().filter(|shape| !shape.has_normals()) {
            shape.derive_normals();
        }
        return Mesh { shapes };
    }

    pub fn shapes(&self) -> &[Shape] {
        return &self.shapes[..];
    }

    pub fn num_shapes(&self) -> usize {
        return self.shapes.len();
    }

    pub fn triangle_count(&self) -> usize {
        return self.shapes.iter().map(|shape| shape.triangle_count()).sum();
    }

    /// Logs sizes of every shape, and with trace enabled every triangle.
    pub fn log_summary(&self) {
        for (i, shape) in self.shapes.iter().enumerate() {
            info!("Shape {}: {}", i, shape.name);
            for [a, b, c] in shape.triangles() {
                trace!(
                    "triangle: {:?} {:?} {:?}, normals: {:?} {:?} {:?}",
                    shape.position(a).as_slice(),
                    shape.position(b).as_slice(),
                    shape.position(c).as_slice(),
                    shape.normal(a).as_slice(),
                    shape.normal(b).as_slice(),
                    shape.normal(c).as_slice()
                );
            }
            info!("Number of triangles - {}", shape.triangle_count());
            info!("Number of vertices  - {}", shape.vertex_count());
            info!("Number of indices   - {}", shape.indices.len());
            if let (Some(min), Some(max)) = (shape.indices.iter().min(), shape.indices.iter().max()) {
                info!("Index range         - [{}, {}]", min, max);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Unit cube with outward facing counter-clockwise faces, no normals.
    fn cube() -> Shape {
        let positions = vec![
            -1.0, -1.0, -1.0,
            1.0, -1.0, -1.0,
            1.0, 1.0, -1.0,
            -1.0, 1.0, -1.0,
            -1.0, -1.0, 1.0,
            1.0, -1.0, 1.0,
            1.0, 1.0, 1.0,
            -1.0, 1.0, 1.0,
        ];
        let indices = vec![
            4, 5, 6, 4, 6, 7, // +z
            1, 0, 3, 1, 3, 2, // -z
            5, 1, 2, 5, 2, 6, // +x
            0, 4, 7, 0, 7, 3, // -x
            7, 6, 2, 7, 2, 3, // +y
            0, 1, 5, 0, 5, 4, // -y
        ];
        return Shape::new("cube", positions, vec![], indices).unwrap();
    }

    #[test]
    fn test_derived_normals_are_unit_and_outward() {
        let mesh = Mesh::new(vec![cube()]);
        let shape = &mesh.shapes()[0];
        assert!(shape.has_normals());
        for i in 0..shape.vertex_count() {
            let vertex = shape.vertex(i);
            assert!((vertex.normal.norm() - 1.0).abs() < 1e-5);
            // Cube is centered at the origin, so outward means along the position.
            assert!(vertex.normal.dot(&vertex.position) > 0.0);
        }
    }

    #[test]
    fn test_corner_normal_sums_adjacent_faces() {
        let mesh = Mesh::new(vec![cube()]);
        // Corner (1, 1, 1) touches two +z triangles and one each of +x and +y.
        let corner = mesh.shapes()[0].normal(6);
        let expected = vector![1.0, 1.0, 2.0].normalize();
        assert!((corner - expected).norm() < 1e-5);
    }

    #[test]
    fn test_existing_normals_are_kept() {
        let shape = Shape::new(
            "flat",
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            vec![0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0],
            vec![0, 1, 2],
        )
        .unwrap();
        let mesh = Mesh::new(vec![shape]);
        assert_eq!(mesh.shapes()[0].normal(0), vector![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_explicit_derivation_overwrites() {
        let mut shape = Shape::new(
            "flat",
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            vec![0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0],
            vec![0, 1, 2],
        )
        .unwrap();
        shape.derive_normals();
        assert!((shape.normal(1) - vector![0.0, 0.0, 1.0]).norm() < 1e-6);
    }

    #[test]
    fn test_degenerate_face_gives_no_nan() {
        let shape = Shape::new(
            "needle",
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 2.0, 0.0, 0.0, 5.0, 5.0, 5.0],
            vec![],
            vec![0, 1, 2],
        )
        .unwrap();
        let mesh = Mesh::new(vec![shape]);
        let shape = &mesh.shapes()[0];
        for i in 0..shape.vertex_count() {
            assert_eq!(shape.normal(i), Vector3::zeros());
        }
    }

    #[test]
    fn test_index_out_of_range_is_rejected() {
        let result = Shape::new("broken", vec![0.0; 9], vec![], vec![0, 1, 3]);
        assert_eq!(
            result.unwrap_err(),
            RenderError::IndexOutOfRange {
                shape: String::from("broken"),
                index: 3,
                vertex_count: 3,
            }
        );
    }

    #[test]
    fn test_malformed_buffers_are_rejected() {
        let bad_positions = Shape::new("a", vec![0.0; 8], vec![], vec![]);
        assert!(matches!(bad_positions, Err(RenderError::MalformedBuffer { buffer: "position", .. })));
        let bad_indices = Shape::new("b", vec![0.0; 9], vec![], vec![0, 1]);
        assert!(matches!(bad_indices, Err(RenderError::MalformedBuffer { buffer: "index", .. })));
        let bad_normals = Shape::new("c", vec![0.0; 9], vec![0.0; 6], vec![0, 1, 2]);
        assert!(matches!(bad_normals, Err(RenderError::MalformedBuffer { buffer: "normal", .. })));
    }

    #[test]
    fn test_counts() {
        let mesh = Mesh::new(vec![cube(), cube()]);
        assert_eq!(mesh.num_shapes(), 2);
        assert_eq!(mesh.triangle_count(), 24);
        assert_eq!(mesh.shapes()[0].triangles().count(), 12);
    }
}
