use image::RgbImage;
use nalgebra as na;
use na::{vector, Vector3};

/// Depth of the far clip plane, the value every depth sample starts a frame with.
pub const FAR_DEPTH: f32 = 1.0;

/// Background used when clearing, mid grey.
pub const BACKGROUND: [u8; 3] = [128, 128, 128];

/// Frame buffer of the software pipeline: rgb8 color data and a z-buffer.
/// Rows are stored top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    pub background: Vector3<u8>,
    z_buffer: Vec<f32>,   // Smallest depth committed so far per pixel.
    render_data: Vec<u8>, // Storing flat array.
}

impl FrameBuffer {
    /// New, already cleared frame buffer of given size.
    pub fn new(width: u32, height: u32) -> FrameBuffer {
        let n_pixels = width as usize * height as usize;
        let mut frame_buffer = FrameBuffer {
            width,
            height,
            background: Vector3::from(BACKGROUND),
            z_buffer: vec![FAR_DEPTH; n_pixels],
            render_data: vec![0; 3 * n_pixels],
        };
        frame_buffer.clear();
        return frame_buffer;
    }

    /// Resets the z-buffer to the far plane and every pixel to the background.
    pub fn clear(&mut self) {
        self.z_buffer.fill(FAR_DEPTH);
        for pixel in self.render_data.chunks_exact_mut(3) {
            pixel.copy_from_slice(self.background.as_slice());
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        return x as usize + y as usize * self.width as usize;
    }

    pub fn depth_at(&self, x: u32, y: u32) -> f32 {
        return self.z_buffer[self.index(x, y)];
    }

    pub fn color_at(&self, x: u32, y: u32) -> Vector3<u8> {
        let index = 3 * self.index(x, y);
        return vector![self.render_data[index], self.render_data[index + 1], self.render_data[index + 2]];
    }

    /// Depth test and write. The fragment lands only if it is strictly closer than
    /// what the pixel holds, so on ties the first fragment stays.
    pub fn commit(&mut self, x: u32, y: u32, depth: f32, color: Vector3<u8>) -> bool {
        let index = self.index(x, y);
        if depth.is_nan() || depth >= self.z_buffer[index] {
            return false;
        }
        self.z_buffer[index] = depth;
        self.render_data[3 * index..3 * index + 3].copy_from_slice(color.as_slice());
        return true;
    }

    /// Rendered frame as a slice of color values of size 3 * (number of pixels).
    pub fn as_render_data(&self) -> &[u8] {
        return &self.render_data[..];
    }

    /// Raw z-buffer values.
    pub fn depth_data(&self) -> &[f32] {
        return &self.z_buffer[..];
    }

    /// Z-buffer as a grey rgb8 image, near is white, far and empty pixels are black.
    /// Depth is stretched over the range actually present in the frame.
    pub fn as_depth_data(&self) -> Vec<u8> {
        let drawn = self.z_buffer.iter().filter(|&&z| z < FAR_DEPTH);
        let (z_min, z_max) = drawn.fold((f32::MAX, f32::MIN), |(min, max), &z| (min.min(z), max.max(z)));
        let scale = (z_max - z_min).max(f32::EPSILON);
        return self
            .z_buffer
            .iter()
            .flat_map(|&z| {
                let grey = match z < FAR_DEPTH {
                    true => (255.0 * (1.0 - (z - z_min) / scale)).round() as u8,
                    false => 0,
                };
                [grey; 3]
            })
            .collect();
    }

    /// Copy of the frame as an image, e.g. for saving.
    pub fn to_image(&self) -> RgbImage {
        return RgbImage::from_raw(self.width, self.height, self.render_data.clone())
            .unwrap_or_else(|| RgbImage::new(self.width, self.height));
    }

    /// Copies rows of another buffer of the same width into this one, starting at row `first_row`.
    pub(crate) fn blit_rows(&mut self, band: &FrameBuffer, first_row: u32) {
        let start = self.index(0, first_row);
        let len = band.z_buffer.len().min(self.z_buffer.len() - start);
        self.z_buffer[start..start + len].copy_from_slice(&band.z_buffer[..len]);
        self.render_data[3 * start..3 * (start + len)].copy_from_slice(&band.render_data[..3 * len]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer_is_cleared() {
        let frame_buffer = FrameBuffer::new(4, 3);
        assert_eq!(frame_buffer.depth_data().len(), 12);
        assert!(frame_buffer.depth_data().iter().all(|&z| z == FAR_DEPTH));
        assert_eq!(frame_buffer.as_render_data().len(), 36);
        assert!(frame_buffer.as_render_data().iter().all(|&c| c == 128));
    }

    #[test]
    fn test_commit_keeps_nearest_and_first_on_tie() {
        let mut frame_buffer = FrameBuffer::new(4, 4);
        assert!(frame_buffer.commit(1, 2, 0.5, vector![255, 0, 0]));
        assert!(!frame_buffer.commit(1, 2, 0.7, vector![0, 255, 0]));
        assert!(!frame_buffer.commit(1, 2, 0.5, vector![0, 0, 255]));
        assert_eq!(frame_buffer.color_at(1, 2), vector![255, 0, 0]);
        assert!(frame_buffer.commit(1, 2, -0.2, vector![0, 0, 255]));
        assert_eq!(frame_buffer.color_at(1, 2), vector![0, 0, 255]);
        assert_eq!(frame_buffer.depth_at(1, 2), -0.2);
        // Nothing at or beyond the far plane is drawn, nor NaN.
        assert!(!frame_buffer.commit(0, 0, FAR_DEPTH, vector![1, 1, 1]));
        assert!(!frame_buffer.commit(0, 0, f32::NAN, vector![1, 1, 1]));
    }

    #[test]
    fn test_clear_resets_frame() {
        let mut frame_buffer = FrameBuffer::new(2, 2);
        frame_buffer.commit(0, 1, 0.0, vector![9, 9, 9]);
        frame_buffer.clear();
        assert_eq!(frame_buffer, FrameBuffer::new(2, 2));
    }

    #[test]
    fn test_layout_is_row_major_top_down() {
        let mut frame_buffer = FrameBuffer::new(3, 2);
        frame_buffer.commit(2, 1, 0.0, vector![1, 2, 3]);
        assert_eq!(&frame_buffer.as_render_data()[15..18], &[1, 2, 3]);
        let image = frame_buffer.to_image();
        assert_eq!(image.get_pixel(2, 1).0, [1, 2, 3]);
    }

    #[test]
    fn test_depth_visualization() {
        let mut frame_buffer = FrameBuffer::new(3, 1);
        frame_buffer.commit(0, 0, -0.5, vector![0, 0, 0]);
        frame_buffer.commit(1, 0, 0.5, vector![0, 0, 0]);
        assert_eq!(frame_buffer.as_depth_data(), vec![255, 255, 255, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_blit_rows() {
        let mut frame_buffer = FrameBuffer::new(2, 3);
        let mut band = FrameBuffer::new(2, 1);
        band.commit(1, 0, 0.25, vector![7, 7, 7]);
        frame_buffer.blit_rows(&band, 2);
        assert_eq!(frame_buffer.color_at(1, 2), vector![7, 7, 7]);
        assert_eq!(frame_buffer.depth_at(1, 2), 0.25);
        assert_eq!(frame_buffer.depth_at(1, 1), FAR_DEPTH);
    }
}
