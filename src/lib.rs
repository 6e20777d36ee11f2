//! Software z-buffer renderer for triangle meshes.
//!
//! A frame goes mesh -> projector -> rasterizer -> shader/z-buffer:
//!
//! ```no_run
//! use zbuffer::{Camera, Light, Mesh, Scene, Shape};
//!
//! # fn main() -> Result<(), zbuffer::RenderError> {
//! let triangle = Shape::new("triangle", vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], vec![], vec![0, 1, 2])?;
//! let mesh = Mesh::new(vec![triangle]);
//! let mut scene = Scene::new(640, 480);
//! let transform = Camera::default().transform(scene.aspect())?;
//! scene.render(&mesh, &transform, Some(&Light::default()))?;
//! let rgb8: &[u8] = scene.as_render_data();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod mesh;
pub mod scene;
pub mod transform;
pub mod util;

pub use error::RenderError;
pub use mesh::{Mesh, Shape, Vertex};
pub use scene::buffer::FrameBuffer;
pub use scene::projector::{project, Projection, ProjectionStats, Triangle};
pub use scene::rasterizer::{rasterize, Pixel};
pub use scene::shader::{Light, Material, Shader};
pub use scene::{RenderStats, Scene};
pub use transform::{look_at, perspective, rotate_x, rotate_y, Camera, Transform};
