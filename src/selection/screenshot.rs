//! Screenshot capture (spec §4.2): full-display or rectangular region,
//! encoded as a PNG data URI so the Command Surface can hand it straight to
//! the (out-of-scope) UI without a second round trip for the raw bytes.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screenshot {
    pub id: u64,
    pub width: u32,
    pub height: u32,
    pub data_uri: String,
}

fn encode_png_data_uri(image: &RgbaImage) -> Result<String> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(image, image.width(), image.height(), ExtendedColorType::Rgba8)
        .map_err(|e| CoreError::WindowError(format!("failed to encode screenshot: {e}")))?;
    Ok(format!("data:image/png;base64,{}", BASE64.encode(bytes)))
}

fn crop_to_region(image: RgbaImage, region: Region) -> RgbaImage {
    let (w, h) = (image.width(), image.height());
    let x = region.x.max(0) as u32;
    let y = region.y.max(0) as u32;
    let width = region.width.min(w.saturating_sub(x));
    let height = region.height.min(h.saturating_sub(y));
    image::imageops::crop_imm(&image, x, y, width.max(1), height.max(1)).to_image()
}

/// Capture the primary display in full. Takes the first monitor `xcap`
/// enumerates, matching the teacher's `capture_screen_screenshot`
/// assumption that the first entry is the main display.
pub fn capture_full_display() -> Result<RgbaImage> {
    let monitors = xcap::Monitor::all()
        .map_err(|e| CoreError::WindowError(format!("could not enumerate displays: {e}")))?;
    let monitor = monitors
        .into_iter()
        .next()
        .ok_or_else(|| CoreError::WindowError("no displays found".into()))?;
    monitor
        .capture_image()
        .map_err(|e| CoreError::WindowError(format!("screen capture failed: {e}")))
}

/// Capture a sub-rectangle of the primary display.
pub fn capture_region(region: Region) -> Result<RgbaImage> {
    let full = capture_full_display()?;
    Ok(crop_to_region(full, region))
}

/// In-memory accumulator for screenshots taken during the process lifetime
/// (spec: no on-disk history). Grounded on the teacher's
/// `clipboard_history::monitor` bounded in-memory ring, simplified here
/// because nothing prunes by age; entries are removed explicitly by the
/// command surface (`clear_screenshots`/`remove_screenshot`).
pub struct ScreenshotStore {
    next_id: std::sync::atomic::AtomicU64,
    entries: parking_lot::RwLock<Vec<Screenshot>>,
}

impl ScreenshotStore {
    pub fn new() -> Self {
        ScreenshotStore {
            next_id: std::sync::atomic::AtomicU64::new(1),
            entries: parking_lot::RwLock::new(Vec::new()),
        }
    }

    pub fn add(&self, image: &RgbaImage) -> Result<Screenshot> {
        let id = self.next_id.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let shot = Screenshot {
            id,
            width: image.width(),
            height: image.height(),
            data_uri: encode_png_data_uri(image)?,
        };
        self.entries.write().push(shot.clone());
        Ok(shot)
    }

    pub fn all(&self) -> Vec<Screenshot> {
        self.entries.read().clone()
    }

    pub fn remove(&self, id: u64) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|s| s.id != id);
        entries.len() != before
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl Default for ScreenshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]))
    }

    #[test]
    fn crop_to_region_clamps_to_image_bounds() {
        let image = solid(100, 100);
        let cropped = crop_to_region(image, Region { x: 90, y: 90, width: 50, height: 50 });
        assert_eq!(cropped.width(), 10);
        assert_eq!(cropped.height(), 10);
    }

    #[test]
    fn encode_png_data_uri_produces_a_data_url() {
        let image = solid(4, 4);
        let uri = encode_png_data_uri(&image).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn screenshot_store_add_list_remove_clear() {
        let store = ScreenshotStore::new();
        let first = store.add(&solid(2, 2)).unwrap();
        let second = store.add(&solid(3, 3)).unwrap();
        assert_eq!(store.all().len(), 2);
        assert_ne!(first.id, second.id);

        assert!(store.remove(first.id));
        assert_eq!(store.all().len(), 1);
        assert!(!store.remove(first.id));

        store.clear();
        assert!(store.all().is_empty());
    }
}
