use nalgebra as na;
use na::{matrix, vector, Matrix4, Vector3};

use crate::error::RenderError;

/// Right handed view matrix, looking from eye towards center.
/// Forward parallel to up is degenerate and has to be avoided by the caller.
pub fn look_at(eye: Vector3<f32>, center: Vector3<f32>, up: Vector3<f32>) -> Matrix4<f32> {
    let forward = (center - eye).normalize();
    let side = forward.cross(&up).normalize();
    let true_up = side.cross(&forward);
    return matrix![side.x,     side.y,     side.z,     -side.dot(&eye);
                   true_up.x,  true_up.y,  true_up.z,  -true_up.dot(&eye);
                   -forward.x, -forward.y, -forward.z, forward.dot(&eye);
                   0.0,        0.0,        0.0,        1.0];
}

/// Symmetric frustum projection. Near plane lands on clip z = -1, far plane on z = 1.
pub fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Result<Matrix4<f32>, RenderError> {
    let finite = fov_y_degrees.is_finite() && aspect.is_finite() && near.is_finite() && far.is_finite();
    if !finite || aspect == 0.0 || near == far {
        return Err(RenderError::InvalidProjectionParameters { aspect, near, far });
    }
    let f = 1.0 / (fov_y_degrees.to_radians() / 2.0).tan();
    let depth = near - far;
    return Ok(matrix![f / aspect, 0.0, 0.0,                  0.0;
                      0.0,        f,   0.0,                  0.0;
                      0.0,        0.0, (far + near) / depth, 2.0 * far * near / depth;
                      0.0,        0.0, -1.0,                 0.0]);
}

/// Rotation around the x axis.
pub fn rotate_x(degrees: f32) -> Matrix4<f32> {
    let (s, c) = degrees.to_radians().sin_cos();
    return matrix![1.0, 0.0, 0.0, 0.0;
                   0.0, c,   -s,  0.0;
                   0.0, s,   c,   0.0;
                   0.0, 0.0, 0.0, 1.0];
}

/// Rotation around the y axis.
pub fn rotate_y(degrees: f32) -> Matrix4<f32> {
    let (s, c) = degrees.to_radians().sin_cos();
    return matrix![c,   0.0, s,   0.0;
                   0.0, 1.0, 0.0, 0.0;
                   -s,  0.0, c,   0.0;
                   0.0, 0.0, 0.0, 1.0];
}

/// Matrices of a single frame. Vertices are column vectors multiplied from the right,
/// so model is applied first and projection last.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub model: Matrix4<f32>,
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
}

impl Transform {
    /// Everything is identity, vertices are taken as already being in clip space.
    pub fn identity() -> Self {
        return Self {
            model: Matrix4::identity(),
            view: Matrix4::identity(),
            projection: Matrix4::identity(),
        };
    }

    /// Applied to vertex positions.
    pub fn matrix(&self) -> Matrix4<f32> {
        return self.projection * self.view * self.model;
    }

    /// Takes vertices to the camera frame, used for normals and lighting.
    pub fn model_view(&self) -> Matrix4<f32> {
        return self.view * self.model;
    }
}

/// Orbit camera. The eye stays on +z at `distance` from the origin and looks at it,
/// orbiting is done by rotating the model by pitch and yaw (degrees).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(distance: f32, pitch: f32, yaw: f32) -> Self {
        return Self {
            distance,
            pitch,
            yaw,
            ..Default::default()
        };
    }

    pub fn eye(&self) -> Vector3<f32> {
        return vector![0.0, 0.0, self.distance];
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        return look_at(self.eye(), Vector3::zeros(), Vector3::y());
    }

    pub fn model_matrix(&self) -> Matrix4<f32> {
        return rotate_x(self.pitch) * rotate_y(self.yaw);
    }

    pub fn projection_matrix(&self, aspect: f32) -> Result<Matrix4<f32>, RenderError> {
        return perspective(self.fov_y, aspect, self.near, self.far);
    }

    /// Full set of frame matrices for an output of given aspect ratio.
    pub fn transform(&self, aspect: f32) -> Result<Transform, RenderError> {
        return Ok(Transform {
            model: self.model_matrix(),
            view: self.view_matrix(),
            projection: self.projection_matrix(aspect)?,
        });
    }

    /// Drag deltas: horizontal spins around y, vertical around x.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw += dx;
        self.pitch += dy;
    }

    /// Vertical drag delta moves the camera closer (drag up) or further (drag down).
    pub fn zoom(&mut self, dy: f32) {
        self.distance -= dy * 0.2;
    }
}

impl Default for Camera {
    fn default() -> Self {
        return Self {
            distance: 10.0,
            pitch: 0.0,
            yaw: 0.0,
            fov_y: 45.0,
            near: 0.1,
            far: 100.0,
        };
    }
}
