use image::{GrayImage, Luma, RgbImage};
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut};
use imageproc::geometry::convex_hull;
use imageproc::point::Point;

use crate::face_landmarks::LandmarkSet;
use crate::render::RenderOptions;

const FILLED: Luma<u8> = Luma([255]);

/// Fills the convex hull of the landmarks into a binary mask of the given size.
pub fn rasterize_hull(landmarks: &LandmarkSet, width: u32, height: u32) -> GrayImage {
    let mut mask = GrayImage::new(width, height);

    let mut hull = convex_hull(&landmarks.to_pixels(width, height));
    if hull.len() > 1 && hull.first() == hull.last() {
        hull.pop();
    }

    match hull.as_slice() {
        [] => {}
        [p] => {
            if p.x >= 0 && p.y >= 0 && (p.x as u32) < width && (p.y as u32) < height {
                mask.put_pixel(p.x as u32, p.y as u32, FILLED);
            }
        }
        [a, b] => draw_line_segment_mut(
            &mut mask,
            (a.x as f32, a.y as f32),
            (b.x as f32, b.y as f32),
            FILLED,
        ),
        polygon if twice_area(polygon) == 0 => {
            for pair in polygon.windows(2) {
                draw_line_segment_mut(
                    &mut mask,
                    (pair[0].x as f32, pair[0].y as f32),
                    (pair[1].x as f32, pair[1].y as f32),
                    FILLED,
                );
            }
        }
        polygon => draw_polygon_mut(&mut mask, polygon, FILLED),
    }

    mask
}

// shoelace formula, zero for collinear outlines
fn twice_area(polygon: &[Point<i32>]) -> i64 {
    let n = polygon.len();
    (0..n)
        .map(|i| {
            let (a, b) = (polygon[i], polygon[(i + 1) % n]);
            a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64
        })
        .sum::<i64>()
        .abs()
}

fn blend(original: u8, overlay: u8, alpha: f32) -> u8 {
    ((1.0 - alpha) * original as f32 + alpha * overlay as f32)
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Highlights the face region: the hull mask, tinted with the overlay color,
/// is blended over the whole image. Pixels outside the hull blend with black.
///
/// `landmarks` must not be empty.
pub fn composite_mask(image: &RgbImage, landmarks: &LandmarkSet, options: &RenderOptions) -> RgbImage {
    debug_assert!(!landmarks.is_empty(), "mask needs at least one landmark");

    let mask = rasterize_hull(landmarks, image.width(), image.height());
    let mut output = image.clone();

    for (pixel, membership) in output.pixels_mut().zip(mask.pixels()) {
        let weight = membership.0[0] as f32 / 255.0;
        for (channel, &color) in pixel.0.iter_mut().zip(options.overlay_color.iter()) {
            let overlay = (color as f32 * weight).round() as u8;
            *channel = blend(*channel, overlay, options.alpha);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use proptest::prelude::*;

    fn square_landmarks() -> LandmarkSet {
        LandmarkSet::from_normalized(&[
            (0.25, 0.25),
            (0.75, 0.25),
            (0.5, 0.5),
            (0.75, 0.75),
            (0.25, 0.75),
        ])
    }

    #[test]
    fn hull_fills_interior_only() {
        let mask = rasterize_hull(&square_landmarks(), 100, 100);
        assert_eq!(mask.get_pixel(50, 50).0, [255]);
        assert_eq!(mask.get_pixel(30, 70).0, [255]);
        assert_eq!(mask.get_pixel(5, 5).0, [0]);
        assert_eq!(mask.get_pixel(90, 50).0, [0]);
    }

    #[test]
    fn single_point_hull_marks_one_pixel() {
        let landmarks = LandmarkSet::from_normalized(&[(0.5, 0.5), (0.5, 0.5)]);
        let mask = rasterize_hull(&landmarks, 10, 10);
        assert_eq!(mask.get_pixel(5, 5).0, [255]);
        assert_eq!(mask.pixels().filter(|p| p.0[0] > 0).count(), 1);
    }

    #[test]
    fn collinear_hull_draws_segment() {
        let landmarks = LandmarkSet::from_normalized(&[(0.1, 0.5), (0.5, 0.5), (0.9, 0.5)]);
        let mask = rasterize_hull(&landmarks, 10, 10);
        assert_eq!(mask.get_pixel(3, 5).0, [255]);
        assert_eq!(mask.get_pixel(3, 2).0, [0]);
    }

    #[test]
    fn blends_inside_and_darkens_outside() {
        let image = RgbImage::from_pixel(100, 100, Rgb([100, 50, 200]));
        let output = composite_mask(&image, &square_landmarks(), &RenderOptions::default());

        for (channel, &original) in output.get_pixel(50, 50).0.iter().zip([100u8, 50, 200].iter()) {
            let expected = (0.4 * original as f32 + 0.6 * 255.0).round();
            assert!((*channel as f32 - expected).abs() <= 1.0);
        }
        for (channel, &original) in output.get_pixel(2, 2).0.iter().zip([100u8, 50, 200].iter()) {
            let expected = (0.4 * original as f32).round();
            assert!((*channel as f32 - expected).abs() <= 1.0);
        }
    }

    #[test]
    fn uses_overlay_color() {
        let image = RgbImage::new(20, 20);
        let options = RenderOptions {
            overlay_color: [255, 0, 0],
            ..RenderOptions::default()
        };
        let output = composite_mask(&image, &square_landmarks(), &options);
        assert_eq!(output.get_pixel(10, 10).0, [153, 0, 0]);
    }

    #[test]
    fn source_image_is_untouched() {
        let image = RgbImage::from_pixel(16, 16, Rgb([10, 20, 30]));
        let copy = image.clone();
        let _ = composite_mask(&image, &square_landmarks(), &RenderOptions::default());
        assert_eq!(image, copy);
    }

    proptest! {
        #[test]
        fn output_keeps_dimensions(
            width in 1u32..64,
            height in 1u32..64,
            coords in proptest::collection::vec((0.0f32..1.0, 0.0f32..1.0), 1..20),
        ) {
            let image = RgbImage::new(width, height);
            let landmarks = LandmarkSet::from_normalized(&coords);
            let output = composite_mask(&image, &landmarks, &RenderOptions::default());
            prop_assert_eq!(output.dimensions(), (width, height));
        }
    }
}
