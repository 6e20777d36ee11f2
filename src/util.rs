use nalgebra as na;
use na::{vector, Matrix4, Vector3, Vector4};

/// Lengths and homogeneous w values below this are treated as zero.
pub const EPSILON: f32 = 1e-6;

/// Transformation of a point to homogenous coordinates.
pub fn to_hom_point(v: Vector3<f32>) -> Vector4<f32> {
    return vector![v.x, v.y, v.z, 1.0];
}

/// Transformation of a vector to homogenous coordinates.
pub fn to_hom_vector(v: Vector3<f32>) -> Vector4<f32> {
    return vector![v.x, v.y, v.z, 0.0];
}

/// Transformation of a point from homogenous coordinates, i.e. perspective divide.
/// None if w is (almost) zero or the division blows up.
pub fn from_hom_point(v: Vector4<f32>) -> Option<Vector3<f32>> {
    if v.w.abs() < EPSILON {
        return None;
    }
    let p = vector![v.x / v.w, v.y / v.w, v.z / v.w];
    if !is_finite(&p) {
        return None;
    }
    return Some(p);
}

/// Transformation of a vector from homogenous coordinates, dropping w.
pub fn from_hom_vector(v: Vector4<f32>) -> Vector3<f32> {
    return vector![v.x, v.y, v.z];
}

/// Normalizes v, clamping to the zero vector when its length is too small to divide by.
pub fn normalize_or_zero(v: Vector3<f32>) -> Vector3<f32> {
    return v.try_normalize(EPSILON).unwrap_or_else(Vector3::zeros);
}

/// Matrix used to carry normals through the transformation m.
pub fn inverse_transpose(m: &Matrix4<f32>) -> Option<Matrix4<f32>> {
    return m.try_inverse().map(|inverse| inverse.transpose());
}

pub fn is_finite(v: &Vector3<f32>) -> bool {
    return v.iter().all(|c| c.is_finite());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divide_by_w() {
        let p = from_hom_point(vector![2.0, 4.0, -6.0, 2.0]).unwrap();
        assert!((p - vector![1.0, 2.0, -3.0]).norm() < 1e-6);
    }

    #[test]
    fn test_divide_by_zero_w() {
        assert!(from_hom_point(vector![1.0, 1.0, 1.0, 0.0]).is_none());
    }

    #[test]
    fn test_normalize_zero_vector_is_not_nan() {
        let n = normalize_or_zero(Vector3::zeros());
        assert_eq!(n, Vector3::zeros());
        let n = normalize_or_zero(vector![0.0, 3.0, 4.0]);
        assert!((n.norm() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_inverse_transpose_of_scale() {
        let m = Matrix4::new_nonuniform_scaling(&vector![2.0, 4.0, 1.0]);
        let it = inverse_transpose(&m).unwrap();
        let n = from_hom_vector(it * to_hom_vector(vector![1.0, 1.0, 1.0]));
        assert!((n - vector![0.5, 0.25, 1.0]).norm() < 1e-6);
        assert!(inverse_transpose(&Matrix4::zeros()).is_none());
    }
}
