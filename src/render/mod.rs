mod keypoints;
mod mask;

pub use keypoints::render_keypoints;
pub use mask::{composite_mask, rasterize_hull};

/// Colors and sizes used when drawing on top of an uploaded photo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Weight of the overlay in the mask blend, the photo gets `1 - alpha`.
    pub alpha: f32,
    pub overlay_color: [u8; 3],
    pub keypoint_color: [u8; 3],
    pub keypoint_radius: i32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            alpha: 0.6,
            overlay_color: [255, 255, 255],
            keypoint_color: [0, 255, 0],
            keypoint_radius: 1,
        }
    }
}
