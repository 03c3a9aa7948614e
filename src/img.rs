//! Pixel-buffer I/O for the image encryption demo. Everything goes through
//! raw RGB so the ciphertext can be viewed as a picture.

use anyhow::{Context, Result, anyhow};
use image::RgbImage;
use std::path::Path;

/// Decode `path` into a raw RGB byte buffer plus its dimensions.
pub fn load_rgb(path: &Path) -> Result<(Vec<u8>, u32, u32)> {
    let img = image::open(path)
        .with_context(|| format!("loading image {}", path.display()))?
        .to_rgb8();
    let (width, height) = img.dimensions();
    Ok((img.into_raw(), width, height))
}

/// Reinterpret `data` as a `width` x `height` RGB image and write it out.
pub fn save_rgb(path: &Path, data: &[u8], width: u32, height: u32) -> Result<()> {
    let img = RgbImage::from_raw(width, height, data.to_vec())
        .ok_or_else(|| anyhow!("buffer does not match {width}x{height} RGB"))?;
    img.save(path)
        .with_context(|| format!("saving image {}", path.display()))
}
