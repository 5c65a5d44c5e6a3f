//! Adaptive local thresholding.
//!
//! Pencil and ink marks are locally darker than the surrounding paper even
//! under uneven lighting, so binarization uses a Gaussian-weighted local
//! mean rather than a single global cutoff: a pixel is foreground iff its
//! intensity is below the weighted neighborhood mean minus a bias constant.

use image::RgbImage;

/// Foreground value in a [`BinaryMap`].
pub const FOREGROUND: u8 = 255;

/// Binary foreground/background map derived from a grayscale region.
///
/// Row-major `{0, 255}` buffer with the same dimensions as its source
/// region. Owned by the computation that produced it and discarded after
/// the projection profiles are taken.
#[derive(Debug, Clone)]
pub struct BinaryMap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl BinaryMap {
    /// Build a map from a raw `{0, 255}` buffer.
    ///
    /// Returns `None` when the buffer length does not match the dimensions.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != (width as usize) * (height as usize) {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the pixel at `(x, y)` is foreground.
    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        self.data[(y as usize) * (self.width as usize) + (x as usize)] != 0
    }

    /// Raw row-major buffer, foreground encoded as 255.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// RGB → grayscale using BT.601 luma weights.
pub fn luma(image: &RgbImage) -> Vec<u8> {
    image
        .pixels()
        .map(|p| {
            let [r, g, b] = p.0;
            ((r as u32 * 77 + g as u32 * 150 + b as u32 * 29) >> 8) as u8
        })
        .collect()
}

/// Binarize an RGB image with the given neighborhood size and bias.
pub fn binarize(image: &RgbImage, block_size: u32, c: f32) -> BinaryMap {
    let gray = luma(image);
    binarize_gray(&gray, image.width(), image.height(), block_size, c)
}

/// Binarize a row-major grayscale buffer.
///
/// A pixel becomes foreground iff its intensity is strictly below the
/// Gaussian-weighted mean of its `block_size × block_size` neighborhood
/// minus `c`. Windows clamp at the image borders, so the result is
/// deterministic for a given input.
pub fn binarize_gray(gray: &[u8], width: u32, height: u32, block_size: u32, c: f32) -> BinaryMap {
    let w = width as usize;
    let h = height as usize;
    debug_assert_eq!(gray.len(), w * h);
    debug_assert!(block_size >= 3 && block_size % 2 == 1);

    let kernel = gaussian_kernel(block_size as usize);
    let mean = local_weighted_mean(gray, w, h, &kernel);

    let data = gray
        .iter()
        .zip(mean.iter())
        .map(|(&g, &m)| if (g as f32) < m - c { FOREGROUND } else { 0 })
        .collect();

    BinaryMap {
        width,
        height,
        data,
    }
}

/// Normalized 1-D Gaussian kernel of the given odd length.
///
/// Sigma follows OpenCV's `getGaussianKernel` convention
/// `0.3·((ksize−1)·0.5 − 1) + 0.8`, so window sizes tuned against OpenCV
/// carry over unchanged.
fn gaussian_kernel(ksize: usize) -> Vec<f32> {
    let sigma = 0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let half = (ksize / 2) as isize;
    let mut kernel: Vec<f32> = (-half..=half)
        .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    for weight in &mut kernel {
        *weight /= sum;
    }
    kernel
}

/// Separable Gaussian-weighted mean with clamped (replicate) borders.
fn local_weighted_mean(gray: &[u8], w: usize, h: usize, kernel: &[f32]) -> Vec<f32> {
    let half = (kernel.len() / 2) as isize;
    let mut temp = vec![0f32; w * h];

    // Horizontal pass.
    for y in 0..h {
        let row = y * w;
        for x in 0..w {
            let mut acc = 0f32;
            for (k, &weight) in kernel.iter().enumerate() {
                let sx = (x as isize + k as isize - half).clamp(0, w as isize - 1) as usize;
                acc += gray[row + sx] as f32 * weight;
            }
            temp[row + x] = acc;
        }
    }

    // Vertical pass.
    let mut out = vec![0f32; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0f32;
            for (k, &weight) in kernel.iter().enumerate() {
                let sy = (y as isize + k as isize - half).clamp(0, h as isize - 1) as usize;
                acc += temp[sy * w + x] * weight;
            }
            out[y * w + x] = acc;
        }
    }
    out
}
