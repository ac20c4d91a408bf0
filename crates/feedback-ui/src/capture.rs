//! Image acquisition: screen, clipboard and files.
//!
//! Every source yields an RGBA bitmap or an error; the dialog drops failures
//! with a debug log.

use crate::error::{DialogError, Result};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Extensions offered by the file browser and accepted from the path field
pub const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "gif", "webp"];

/// Time the window gets to minimize before the screen is captured
pub const CAPTURE_DELAY: Duration = Duration::from_millis(600);

/// Capture the primary monitor
pub fn capture_primary_screen() -> Result<RgbaImage> {
    let monitor = xcap::Monitor::from_point(0, 0)
        .map_err(|e| DialogError::Capture(format!("no monitor at origin: {e}")))?;
    monitor
        .capture_image()
        .map_err(|e| DialogError::Capture(e.to_string()))
}

/// Capture the primary monitor on a worker thread after [`CAPTURE_DELAY`].
///
/// `on_done` runs on the worker once the result is available, so the caller
/// can wake its event loop.
pub fn capture_after_delay<F>(on_done: F) -> Receiver<Result<RgbaImage>>
where
    F: FnOnce() + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        thread::sleep(CAPTURE_DELAY);
        let captured = capture_primary_screen();
        if tx.send(captured).is_err() {
            debug!("[dialog] Capture finished after the dialog went away");
        }
        on_done();
    });
    rx
}

/// Image currently on the system clipboard
pub fn clipboard_image() -> Result<RgbaImage> {
    let mut clipboard = arboard::Clipboard::new()?;
    let data = clipboard.get_image()?;
    RgbaImage::from_raw(
        data.width as u32,
        data.height as u32,
        data.bytes.into_owned(),
    )
    .ok_or_else(|| DialogError::Capture("clipboard image has an unexpected size".to_string()))
}

/// Decode an image file of any format the `image` crate understands
pub fn load_image_file(path: &Path) -> Result<RgbaImage> {
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|source| DialogError::ImageFile {
            path: path.to_path_buf(),
            source,
        })
}

/// Decode image bytes delivered without a path (e.g. some drag-and-drop sources)
pub fn load_image_bytes(bytes: &[u8]) -> Result<RgbaImage> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|source| DialogError::ImageFile {
            path: "<dropped bytes>".into(),
            source,
        })
}

/// Whether `path` has an extension the file picker accepts
pub fn is_supported_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Open the native file browser; empty when the user cancels
pub fn pick_image_files() -> Vec<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Select images")
        .add_filter("Images", &IMAGE_EXTENSIONS[..])
        .pick_files()
        .unwrap_or_default()
}
