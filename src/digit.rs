use burn::tensor::{backend::Backend, Tensor, TensorData};

use crate::{Error, Result};

pub const WIDTH: usize = 28;
pub const HEIGHT: usize = 28;
pub const PIXELS: usize = WIDTH * HEIGHT;

/// Single-channel 28x28 digit, one intensity byte per pixel in row-major order.
///
/// White strokes on a black background, the same polarity as MNIST.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DigitImage {
    pixels: Vec<u8>,
}

impl DigitImage {
    pub fn new(pixels: Vec<u8>) -> Result<Self> {
        if pixels.len() != PIXELS {
            return Err(Error::InvalidImageSize {
                expected: PIXELS,
                actual: pixels.len(),
            });
        }

        Ok(Self { pixels })
    }

    pub fn blank() -> Self {
        Self {
            pixels: vec![0; PIXELS],
        }
    }

    /// Converts an MNIST image (floats in `[0, 255]`).
    pub fn from_rows(rows: &[[f32; WIDTH]; HEIGHT]) -> Self {
        let pixels = rows
            .iter()
            .flatten()
            .map(|value| value.round().clamp(0.0, 255.0) as u8)
            .collect();

        Self { pixels }
    }

    /// Loads a picture from disk, converted to grayscale and resized to 28x28.
    #[cfg(not(target_family = "wasm"))]
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        use image::imageops::{self, FilterType};

        let mut image = image::open(path)?.to_luma8();
        if image.dimensions() != (WIDTH as u32, HEIGHT as u32) {
            image = imageops::resize(&image, WIDTH as u32, HEIGHT as u32, FilterType::Triangle);
        }

        Self::new(image.into_raw())
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * WIDTH + x]
    }

    /// Returns a `[height, width]` tensor scaled to `[0, 1]`.
    pub fn to_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2> {
        let values: Vec<f32> = self.pixels.iter().map(|pixel| *pixel as f32).collect();
        let data = TensorData::new(values, [HEIGHT, WIDTH]).convert::<B::FloatElem>();

        Tensor::<B, 2>::from_data(data, device) / 255
    }

    /// Stacks images into a `[batch, height, width]` tensor.
    ///
    /// # Panics
    ///
    /// If `images` is empty.
    pub fn batch<B: Backend>(images: &[DigitImage], device: &B::Device) -> Tensor<B, 3> {
        let tensors = images
            .iter()
            .map(|image| image.to_tensor::<B>(device))
            .map(|tensor| tensor.reshape([1, HEIGHT, WIDTH]))
            .collect();

        Tensor::cat(tensors, 0)
    }
}
