use std::ops::Deref;

use image::codecs::png::PngEncoder;
use image::{imageops, ColorType, ImageEncoder, RgbImage};
use ndarray::{Array, ArrayD, CowArray, IxDyn};
use ort::tensor::OrtOwnedTensor;
use ort::{Session, Value};

use crate::error::Result;

/// Bounding box as (x, y, width, height) in pixels.
pub type BBox = (u32, u32, u32, u32);

pub fn sigmoid(x: f32) -> f32 {
    // clip to keep exp() finite for raw logits
    let x = x.clamp(-100.0, 100.0);
    1.0 / (1.0 + (-x).exp())
}

pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();

    exps.iter().map(|e| e / sum).collect()
}

/// Index of the first maximum, `None` for an empty slice. NaN entries are skipped.
pub fn argmax(input: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &item) in input.iter().enumerate().filter(|(_, v)| !v.is_nan()) {
        match best {
            Some((_, max)) if item <= max => {}
            _ => best = Some((i, item)),
        }
    }
    best.map(|(i, _)| i)
}

/// Pads the image with black on the right/bottom so it becomes square.
/// The original pixels keep their coordinates.
pub fn letterbox(image: &RgbImage) -> (RgbImage, u32) {
    let side = image.width().max(image.height());
    let mut canvas = RgbImage::new(side, side);
    imageops::replace(&mut canvas, image, 0, 0);
    (canvas, side)
}

/// Grows a box by `ratio` of its width on every side, then clips it to the image.
pub fn pad_bbox(bbox: BBox, ratio: f32, image_w: u32, image_h: u32) -> BBox {
    let padding = ratio * bbox.2 as f32;

    let x = (bbox.0 as f32 - padding).max(0.0) as u32;
    let y = (bbox.1 as f32 - padding).max(0.0) as u32;
    let right = ((bbox.0 + bbox.2) as f32 + padding).min(image_w as f32) as u32;
    let bottom = ((bbox.1 + bbox.3) as f32 + padding).min(image_h as f32) as u32;

    (
        x.min(image_w),
        y.min(image_h),
        right.saturating_sub(x),
        bottom.saturating_sub(y),
    )
}

/// Converts an RGB image into a (1, h, w, 3) tensor scaled to [0, 1].
pub fn to_nhwc_tensor(image: &RgbImage) -> Result<CowArray<'static, f32, IxDyn>> {
    let data: Vec<f32> = image
        .pixels()
        .flat_map(|p| p.0)
        .map(|p| p as f32 / 255.0)
        .collect();

    let shape = (1, image.height() as usize, image.width() as usize, 3);
    Ok(Array::from_shape_vec(shape, data)?.into_dyn().into())
}

/// Runs a session with a single input tensor and copies every output out of ort.
pub fn run_session(session: &Session, input: &CowArray<'_, f32, IxDyn>) -> Result<Vec<ArrayD<f32>>> {
    let input = CowArray::from(input.view());
    let inputs = vec![Value::from_array(session.allocator(), &input)?];
    let outputs: Vec<Value> = session.run(inputs)?;

    outputs
        .iter()
        .map(|value| -> Result<ArrayD<f32>> {
            let tensor: OrtOwnedTensor<f32, _> = value.try_extract()?;
            let view = tensor.view().deref().clone();
            Ok(view.to_owned())
        })
        .collect()
}

pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ColorType::Rgb8,
    )?;
    Ok(buffer)
}
