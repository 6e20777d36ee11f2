use nalgebra as na;
use na::{vector, Matrix3, Matrix4, Vector3};

use super::projector::Triangle;
use super::rasterizer::Pixel;
use crate::util::{from_hom_vector, normalize_or_zero, to_hom_point};

/// Point light. Colors are rgb in \[0.0, 1.0\].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub position: Vector3<f32>,
}

impl Light {
    pub fn new(ambient: Vector3<f32>, diffuse: Vector3<f32>, specular: Vector3<f32>, position: Vector3<f32>) -> Self {
        return Self { ambient, diffuse, specular, position };
    }

    /// Same light with the position carried to another frame by the affine transform m.
    pub fn transformed(&self, m: &Matrix4<f32>) -> Light {
        return Light {
            position: from_hom_vector(m * to_hom_point(self.position)),
            ..*self
        };
    }
}

impl Default for Light {
    /// White light above and to the right of the camera, given in the camera frame.
    fn default() -> Self {
        return Self {
            ambient: vector![0.2, 0.2, 0.2],
            diffuse: vector![1.0, 1.0, 1.0],
            specular: vector![1.0, 1.0, 1.0],
            position: vector![5.0, 5.0, 0.0],
        };
    }
}

/// Surface constants, the same for the whole mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub shininess: f32,
}

impl Default for Material {
    /// Gold-yellow.
    fn default() -> Self {
        let diffuse = vector![0.929524, 0.796542, 0.178823];
        return Self {
            ambient: diffuse,
            diffuse,
            specular: vector![1.0, 0.980392, 0.549020],
            shininess: 15.0,
        };
    }
}

/// Conversion of a float color to rgb8, clamping every channel to \[0.0, 1.0\] first.
pub fn to_rgb8(color: Vector3<f32>) -> Vector3<u8> {
    return color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
}

/// Per fragment part of the pipeline: depth and color of a covered pixel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Shader {
    pub material: Material,
}

impl Shader {
    pub fn new(material: Material) -> Self {
        return Self { material };
    }

    /// Clip space z of the fragment, smaller is closer.
    pub fn depth(&self, triangle: &Triangle, pixel: &Pixel) -> f32 {
        let z_values = vector![triangle.positions[0].z, triangle.positions[1].z, triangle.positions[2].z];
        return pixel.barycentric.dot(&z_values);
    }

    /// Unlit material color.
    pub fn color(&self, _triangle: &Triangle, _pixel: &Pixel) -> Vector3<u8> {
        return to_rgb8(self.material.diffuse);
    }

    /// Phong shading with the light given in the camera frame.
    /// None if the interpolated normal vanishes, then there is nothing sensible to draw.
    pub fn color_lit(&self, triangle: &Triangle, pixel: &Pixel, light: &Light) -> Option<Vector3<u8>> {
        let bar_coord = pixel.barycentric;
        let normal = normalize_or_zero(Matrix3::from_columns(&triangle.normals) * bar_coord);
        if normal == Vector3::zeros() {
            return None;
        }
        let position = Matrix3::from_columns(&triangle.view_positions) * bar_coord;

        let light_direction = normalize_or_zero(light.position - position);
        let diff_coef = normal.dot(&light_direction).max(0.0);
        // Camera sits in the origin of its own frame.
        let view_direction = normalize_or_zero(-position);
        let reflected_light_direction = 2.0 * normal.dot(&light_direction) * normal - light_direction;
        let spec_coef = match diff_coef > 0.0 {
            true => reflected_light_direction.dot(&view_direction).max(0.0).powf(self.material.shininess),
            false => 0.0,
        };

        let material = &self.material;
        let color = light.ambient.component_mul(&material.ambient)
            + light.diffuse.component_mul(&material.diffuse) * diff_coef
            + light.specular.component_mul(&material.specular) * spec_coef;
        return Some(to_rgb8(color));
    }

    /// Lit color if there is a light, flat color otherwise.
    pub fn shade(&self, triangle: &Triangle, pixel: &Pixel, light: Option<&Light>) -> Option<Vector3<u8>> {
        return match light {
            Some(light) => self.color_lit(triangle, pixel, light),
            None => Some(self.color(triangle, pixel)),
        };
    }
}
