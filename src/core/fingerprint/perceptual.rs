//! Perceptual fingerprinting (DCT hash).
//!
//! Visually similar images (same content at different resolution,
//! recompression, minor edits) produce hashes within a small Hamming
//! distance; visually distinct images land far apart.
//!
//! Pipeline: downscale to 32x32, grayscale via standard luma weighting,
//! 2D discrete cosine transform, keep the top-left 8x8 low-frequency
//! block, threshold each coefficient against the block mean (DC term
//! excluded from the mean) into one bit of a 64-bit hash.

use super::decode;
use crate::error::HashError;
use image::imageops::FilterType;
use image::DynamicImage;
use std::path::Path;

/// Side length of the downscaled input
const INPUT_SIZE: usize = 32;

/// Side length of the retained low-frequency block
const BLOCK_SIZE: usize = 8;

/// Maximum Hamming distance at which two hashes count as similar
pub const SIMILARITY_THRESHOLD: u32 = 12;

/// Compute the 64-bit DCT hash of an image file.
///
/// Decode failures are errors here; callers on the placement path treat
/// them as "no perceptual signal" rather than aborting.
pub fn hash_image(path: &Path) -> Result<u64, HashError> {
    let image = decode::decode(path)?;
    Ok(hash_dynamic(&image))
}

/// Compute the hash of an already-decoded image
pub fn hash_dynamic(image: &DynamicImage) -> u64 {
    let small = image.resize_exact(INPUT_SIZE as u32, INPUT_SIZE as u32, FilterType::Triangle);
    let gray = small.to_luma8();

    let mut pixels = [[0f64; INPUT_SIZE]; INPUT_SIZE];
    for (x, y, p) in gray.enumerate_pixels() {
        pixels[y as usize][x as usize] = p[0] as f64;
    }

    let block = dct_low_frequency_block(&pixels);

    // Mean over the block, excluding the DC term whose magnitude would
    // swamp every other coefficient
    let sum: f64 = block.iter().flatten().sum::<f64>() - block[0][0];
    let mean = sum / (BLOCK_SIZE * BLOCK_SIZE - 1) as f64;

    let mut hash = 0u64;
    for (i, coefficient) in block.iter().flatten().enumerate() {
        if *coefficient > mean {
            hash |= 1u64 << i;
        }
    }
    hash
}

/// 2D DCT-II of the input, truncated to the top-left 8x8 block
fn dct_low_frequency_block(pixels: &[[f64; INPUT_SIZE]; INPUT_SIZE]) -> [[f64; BLOCK_SIZE]; BLOCK_SIZE] {
    let n = INPUT_SIZE as f64;
    let mut block = [[0f64; BLOCK_SIZE]; BLOCK_SIZE];

    // Cosine table: cos((2x + 1) * u * pi / 2N) for the frequencies we keep
    let mut cos_table = [[0f64; INPUT_SIZE]; BLOCK_SIZE];
    for (u, row) in cos_table.iter_mut().enumerate() {
        for (x, value) in row.iter_mut().enumerate() {
            *value = ((2.0 * x as f64 + 1.0) * u as f64 * std::f64::consts::PI / (2.0 * n)).cos();
        }
    }

    let alpha = |u: usize| -> f64 {
        if u == 0 {
            (1.0 / n).sqrt()
        } else {
            (2.0 / n).sqrt()
        }
    };

    for u in 0..BLOCK_SIZE {
        for v in 0..BLOCK_SIZE {
            let mut sum = 0.0;
            for x in 0..INPUT_SIZE {
                for y in 0..INPUT_SIZE {
                    sum += pixels[y][x] * cos_table[u][x] * cos_table[v][y];
                }
            }
            block[v][u] = alpha(u) * alpha(v) * sum;
        }
    }

    block
}

/// Hamming distance between two hashes
pub fn hamming_distance(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}

/// True iff the two hashes are identical or within the similarity
/// threshold. Never fails; absence of a hash is handled by the caller.
pub fn are_similar(a: u64, b: u64) -> bool {
    a == b || hamming_distance(a, b) <= SIMILARITY_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma, Rgb};
    use std::f64::consts::PI;

    /// Synthesize an image whose low-frequency spectrum carries a chosen
    /// sign pattern, using the DCT basis functions themselves. The hash
    /// bits should recover the pattern at any resolution.
    fn patterned_image<F>(size: u32, sign: F) -> DynamicImage
    where
        F: Fn(usize, usize) -> f64,
    {
        let img = ImageBuffer::from_fn(size, size, |x, y| {
            let fx = (2.0 * x as f64 + 1.0) / (2.0 * size as f64);
            let fy = (2.0 * y as f64 + 1.0) / (2.0 * size as f64);
            let mut value = 128.0;
            for u in 0..8 {
                for v in 0..8 {
                    if u == 0 && v == 0 {
                        continue;
                    }
                    value += 1.5
                        * sign(u, v)
                        * (PI * u as f64 * fx).cos()
                        * (PI * v as f64 * fy).cos();
                }
            }
            Luma([value.clamp(0.0, 255.0) as u8])
        });
        DynamicImage::ImageLuma8(img)
    }

    fn checker_sign(u: usize, v: usize) -> f64 {
        if (u + v) % 2 == 0 {
            1.0
        } else {
            -1.0
        }
    }

    // Differs from checker_sign at every odd-v bin: 32 of 64 positions
    fn column_sign(u: usize, _v: usize) -> f64 {
        if u % 2 == 0 {
            1.0
        } else {
            -1.0
        }
    }

    fn brightened(image: &DynamicImage, delta: u8) -> DynamicImage {
        let rgb = image.to_rgb8();
        let img = ImageBuffer::from_fn(rgb.width(), rgb.height(), |x, y| {
            let p = rgb.get_pixel(x, y);
            Rgb([
                p[0].saturating_add(delta),
                p[1].saturating_add(delta),
                p[2].saturating_add(delta),
            ])
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn hash_is_deterministic() {
        let image = patterned_image(64, checker_sign);
        assert_eq!(hash_dynamic(&image), hash_dynamic(&image));
    }

    #[test]
    fn rescaled_image_hashes_nearby() {
        let large = patterned_image(96, checker_sign);
        let small = patterned_image(32, checker_sign);

        let distance = hamming_distance(hash_dynamic(&large), hash_dynamic(&small));
        assert!(
            distance <= SIMILARITY_THRESHOLD,
            "rescale moved the hash {} bits",
            distance
        );
    }

    #[test]
    fn brightness_shift_hashes_nearby() {
        let base = patterned_image(64, checker_sign);
        let brighter = brightened(&base, 10);

        assert!(are_similar(hash_dynamic(&base), hash_dynamic(&brighter)));
    }

    #[test]
    fn minor_edit_stays_within_threshold() {
        // Flip three spectral signs: a small visual edit
        let base = patterned_image(64, checker_sign);
        let edited = patterned_image(64, |u, v| {
            if matches!((u, v), (1, 2) | (2, 5) | (7, 7)) {
                -checker_sign(u, v)
            } else {
                checker_sign(u, v)
            }
        });

        let distance = hamming_distance(hash_dynamic(&base), hash_dynamic(&edited));
        assert!(distance <= SIMILARITY_THRESHOLD, "edit moved {} bits", distance);
        assert!(distance > 0, "edit should move at least one bit");
    }

    #[test]
    fn distinct_images_hash_far_apart() {
        let a = hash_dynamic(&patterned_image(64, checker_sign));
        let b = hash_dynamic(&patterned_image(64, column_sign));

        assert!(
            hamming_distance(a, b) > SIMILARITY_THRESHOLD,
            "distinct images only {} bits apart",
            hamming_distance(a, b)
        );
    }

    #[test]
    fn similarity_is_reflexive_and_symmetric() {
        let a = 0xDEAD_BEEF_0123_4567u64;
        let b = a ^ 0b111; // 3 bits apart

        assert!(are_similar(a, a));
        assert_eq!(are_similar(a, b), are_similar(b, a));
    }

    #[test]
    fn similarity_threshold_boundary() {
        let a = 0u64;
        let at_threshold = (1u64 << SIMILARITY_THRESHOLD) - 1; // 12 bits set
        let past_threshold = (1u64 << (SIMILARITY_THRESHOLD + 1)) - 1; // 13 bits set

        assert!(are_similar(a, at_threshold));
        assert!(!are_similar(a, past_threshold));
    }

    #[test]
    fn decode_failure_is_reported_not_panicked() {
        let result = hash_image(Path::new("/nonexistent/photo.jpg"));
        assert!(result.is_err());
    }
}
