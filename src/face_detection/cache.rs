use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use image::RgbImage;
use tracing::trace;

use super::{FaceBoundingBox, FaceDetectionModel};
use crate::error::Result;

/// Remembers the detection for the last image it saw, so the landmark model
/// and the emotion classifier share one detector pass per photo.
///
/// Images are keyed by a hash of their size and pixels. Errors are not cached.
pub struct CachedFaceDetector {
    inner: Arc<dyn FaceDetectionModel>,
    last: Mutex<Option<(u64, Option<FaceBoundingBox>)>>,
}

impl CachedFaceDetector {
    pub fn new(inner: Arc<dyn FaceDetectionModel>) -> CachedFaceDetector {
        CachedFaceDetector {
            inner,
            last: Mutex::new(None),
        }
    }
}

fn image_key(image: &RgbImage) -> u64 {
    let mut hasher = DefaultHasher::new();
    image.dimensions().hash(&mut hasher);
    image.as_raw().hash(&mut hasher);
    hasher.finish()
}

impl FaceDetectionModel for CachedFaceDetector {
    fn run(&self, image: &RgbImage) -> Result<Option<FaceBoundingBox>> {
        let key = image_key(image);

        // a poisoned slot only holds a stale detection
        if let Some((cached_key, face)) = *self.last.lock().unwrap_or_else(|e| e.into_inner()) {
            if cached_key == key {
                trace!("face detection cache hit");
                return Ok(face);
            }
        }

        let face = self.inner.run(image)?;
        *self.last.lock().unwrap_or_else(|e| e.into_inner()) = Some((key, face));
        Ok(face)
    }
}
