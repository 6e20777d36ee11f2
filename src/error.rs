use std::fmt;

/// Errors reported by the rendering core.
///
/// Per-triangle anomalies (triangles outside the view volume, backfacing or
/// zero-area triangles) are not errors, they are counted in the projection
/// statistics and skipped.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// Projection built with a zero aspect ratio, coinciding clip planes or
    /// non-finite parameters.
    InvalidProjectionParameters { aspect: f32, near: f32, far: f32 },
    /// Index buffer of a shape names a vertex that does not exist.
    IndexOutOfRange { shape: String, index: u32, vertex_count: usize },
    /// Flat buffer with a length that can't be split into triples, or a normal
    /// buffer not matching the position buffer.
    MalformedBuffer { shape: String, buffer: &'static str, len: usize },
    /// Model-view matrix can't be inverted, so normals can't be transformed.
    DegenerateTransform,
    /// Worker of the tiled renderer died before handing its band back.
    WorkerFailed { bands: usize, received: usize },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::InvalidProjectionParameters { aspect, near, far } => write!(
                f,
                "invalid projection parameters: aspect = {}, near = {}, far = {}",
                aspect, near, far
            ),
            RenderError::IndexOutOfRange { shape, index, vertex_count } => write!(
                f,
                "shape '{}': index {} out of range for {} vertices",
                shape, index, vertex_count
            ),
            RenderError::MalformedBuffer { shape, buffer, len } => write!(
                f,
                "shape '{}': {} buffer of length {} is malformed",
                shape, buffer, len
            ),
            RenderError::DegenerateTransform => write!(f, "model-view matrix is not invertible"),
            RenderError::WorkerFailed { bands, received } => write!(
                f,
                "only {} of {} bands came back from the workers",
                received, bands
            ),
        }
    }
}

impl std::error::Error for RenderError {}
