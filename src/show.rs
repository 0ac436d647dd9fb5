use std::fs;
use std::path::{Path, PathBuf};

use burn::data::dataset::{vision::MnistItem, Dataset};
use image::{GrayImage, Luma};

use crate::{
    data::sample,
    digit::{DigitImage, HEIGHT, WIDTH},
    Result,
};

/// Upscaling applied to saved examples so they are visible in an image viewer.
const EXAMPLE_SCALE: u32 = 4;

/// Save a digit as a grayscale picture, each pixel drawn as a `scale` x `scale` block.
pub fn save_as_img<P: AsRef<Path>>(image: &DigitImage, scale: u32, path: P) -> Result<()> {
    let path = path.as_ref();

    // Ensure the output directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let scale = scale.max(1);
    let mut img = GrayImage::new(WIDTH as u32 * scale, HEIGHT as u32 * scale);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let value = image.get((x / scale) as usize, (y / scale) as usize);
        *pixel = Luma([value]);
    }

    img.save(path)?;
    Ok(())
}

/// Writes `count` sampled items of `dataset` into `dir` as `NNN-<label>.png`.
pub fn save_examples<D, P>(dataset: D, count: usize, seed: u64, dir: P) -> Result<Vec<PathBuf>>
where
    D: Dataset<MnistItem>,
    P: AsRef<Path>,
{
    let dir = dir.as_ref();
    let mut paths = Vec::with_capacity(count);

    for (index, item) in sample::<D, MnistItem>(dataset, count, seed).iter().enumerate() {
        let path = dir.join(format!("{index:03}-{}.png", item.label));
        save_as_img(&DigitImage::from_rows(&item.image), EXAMPLE_SCALE, &path)?;
        paths.push(path);
    }

    log::info!("Saved {} example images to {}", paths.len(), dir.display());
    Ok(paths)
}
