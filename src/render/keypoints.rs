use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;

use crate::face_landmarks::LandmarkSet;
use crate::render::RenderOptions;

/// Draws a small filled marker at every landmark on a copy of the image.
/// Markers outside the image are clipped.
pub fn render_keypoints(image: &RgbImage, landmarks: &LandmarkSet, options: &RenderOptions) -> RgbImage {
    let mut canvas = image.clone();
    let color = Rgb(options.keypoint_color);

    for p in landmarks.to_pixels(image.width(), image.height()) {
        draw_filled_circle_mut(&mut canvas, (p.x, p.y), options.keypoint_radius, color);
    }

    canvas
}
