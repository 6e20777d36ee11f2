pub mod buffer;
pub mod projector;
pub mod rasterizer;
pub mod shader;

use std::sync::{mpsc, Arc};

use log::debug;
use threadpool::ThreadPool;

use crate::error::RenderError;
use crate::mesh::Mesh;
use crate::transform::Transform;
use buffer::FrameBuffer;
use projector::{ProjectionStats, Triangle};
use shader::{Light, Shader};

/// What happened to the geometry of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderStats {
    pub projection: ProjectionStats,
    pub fragments: usize, // Covered pixels, summed over all triangles.
    pub written: usize,   // Fragments that won the depth test.
}

/// Software renderer, holding the frame buffer the frames are drawn into.
pub struct Scene {
    pub shader: Shader,
    frame_buffer: FrameBuffer,
}

/// Draws triangles into a buffer covering the image rows starting at `first_row`.
/// Returns (fragments, written) counts.
fn draw_triangles(
    frame_buffer: &mut FrameBuffer,
    first_row: u32,
    image_height: u32,
    triangles: &[Triangle],
    shader: &Shader,
    light: Option<&Light>,
) -> (usize, usize) {
    let rows = first_row..first_row + frame_buffer.height;
    let (mut fragments, mut written) = (0, 0);
    for triangle in triangles {
        for pixel in rasterizer::rasterize_rows(triangle, frame_buffer.width, image_height, rows.clone()) {
            fragments += 1;
            let (x, y) = (pixel.x, pixel.y - first_row);
            // Checking z-buffer before shading, shading is the expensive part.
            let depth = shader.depth(triangle, &pixel);
            if depth.is_nan() || depth >= frame_buffer.depth_at(x, y) {
                continue;
            }
            let Some(color) = shader.shade(triangle, &pixel, light) else {
                continue;
            };
            if frame_buffer.commit(x, y, depth, color) {
                written += 1;
            }
        }
    }
    return (fragments, written);
}

impl Scene {
    pub fn new(width: u32, height: u32) -> Scene {
        return Scene {
            shader: Shader::default(),
            frame_buffer: FrameBuffer::new(width, height),
        };
    }

    pub fn width(&self) -> u32 {
        return self.frame_buffer.width;
    }

    pub fn height(&self) -> u32 {
        return self.frame_buffer.height;
    }

    pub fn aspect(&self) -> f32 {
        return self.width() as f32 / self.height() as f32;
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        return &self.frame_buffer;
    }

    /// Rendered frame as rgb8 data, top row first.
    pub fn as_render_data(&self) -> &[u8] {
        return self.frame_buffer.as_render_data();
    }

    /// Renders one frame of the mesh. Light is given in the camera frame, without it
    /// the mesh is drawn in its flat material color.
    pub fn render(&mut self, mesh: &Mesh, transform: &Transform, light: Option<&Light>) -> Result<RenderStats, RenderError> {
        self.frame_buffer.clear();
        let projection = projector::project(mesh, transform)?;
        let height = self.height();
        let (fragments, written) = draw_triangles(&mut self.frame_buffer, 0, height, &projection.triangles, &self.shader, light);

        let stats = RenderStats {
            projection: projection.stats,
            fragments,
            written,
        };
        debug!("Frame done: {} fragments, {} written", fragments, written);
        return Ok(stats);
    }

    /// Same frame as `render`, with the image cut in horizontal bands drawn on the pool.
    /// Every worker owns its band and walks the triangles in the same order, so the
    /// result is identical to the single threaded one.
    pub fn render_tiled(
        &mut self,
        pool: &ThreadPool,
        mesh: &Mesh,
        transform: &Transform,
        light: Option<&Light>,
    ) -> Result<RenderStats, RenderError> {
        self.frame_buffer.clear();
        let projection = projector::project(mesh, transform)?;
        let triangles = Arc::new(projection.triangles);

        let (width, height) = (self.width(), self.height());
        let n_bands = (pool.max_count() as u32).clamp(1, height.max(1));
        let band_height = ((height + n_bands - 1) / n_bands).max(1);
        let background = self.frame_buffer.background;
        let shader = self.shader;
        let light = light.copied();

        let (sender, receiver) = mpsc::channel();
        let mut bands = 0;
        for first_row in (0..height).step_by(band_height as usize) {
            let band_rows = band_height.min(height - first_row);
            let triangles = Arc::clone(&triangles);
            let sender = sender.clone();
            pool.execute(move || {
                let mut band = FrameBuffer::new(width, band_rows);
                band.background = background;
                band.clear();
                let counts = draw_triangles(&mut band, first_row, height, &triangles, &shader, light.as_ref());
                // Receiver outlives every job, but a failed send only loses this band.
                let _ = sender.send((first_row, band, counts));
            });
            bands += 1;
        }
        drop(sender);

        let mut stats = RenderStats {
            projection: projection.stats,
            ..Default::default()
        };
        let mut received = 0;
        for (first_row, band, (fragments, written)) in receiver.iter() {
            self.frame_buffer.blit_rows(&band, first_row);
            stats.fragments += fragments;
            stats.written += written;
            received += 1;
        }
        if received != bands {
            return Err(RenderError::WorkerFailed { bands, received });
        }

        debug!("Frame done in {} bands: {} fragments, {} written", bands, stats.fragments, stats.written);
        return Ok(stats);
    }
}
