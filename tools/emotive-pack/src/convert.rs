//! Conversion between decoded images and 1-bit packed frames

use emotive_core::authoring::{pack_pixels, pixel};
use emotive_core::FrameError;
use image::imageops::{self, FilterType};
use image::{Delay, GrayImage, Rgba, RgbaImage};

/// Delay used when a GIF frame says 0 ms
pub const ZERO_DELAY_FALLBACK_MS: u16 = 100;

/// How a picture becomes lit and dark pixels
#[derive(Debug, Clone, Copy)]
pub struct ConvertOptions {
    pub width: u16,
    pub height: u16,
    /// Pixels brighter than this are lit
    pub threshold: u8,
    /// Light dark pixels instead
    pub invert: bool,
    /// Blur before thresholding and remove isolated dots after
    pub cleanup: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            width: 128,
            height: 64,
            threshold: 140,
            invert: false,
            cleanup: true,
        }
    }
}

/// Turn one decoded frame into row-major, LSB-first packed bytes
pub fn frame_from_image(image: &RgbaImage, options: &ConvertOptions) -> Result<Vec<u8>, FrameError> {
    let (width, height) = (options.width as usize, options.height as usize);

    let resized = imageops::resize(image, options.width as u32, options.height as u32, FilterType::Nearest);
    let mut gray: GrayImage = imageops::grayscale(&resized);
    if options.cleanup {
        // Kills single-pixel sparkle before it survives the threshold
        gray = imageops::blur(&gray, 1.0);
    }

    let mut lit: Vec<bool> = gray
        .pixels()
        .map(|p| (p.0[0] > options.threshold) != options.invert)
        .collect();

    if options.cleanup {
        lit = rank_filter(&lit, width, height, false);
        lit = rank_filter(&lit, width, height, true);
    }

    pack_pixels(options.width, options.height, |x, y| lit[y as usize * width + x as usize])
}

/// 3x3 min (`want = false`, erosion) or max (`want = true`, dilation)
///
/// The window is clipped at the border, which matches edge replication
/// for these two filters.
fn rank_filter(lit: &[bool], width: usize, height: usize, want: bool) -> Vec<bool> {
    let mut out = Vec::with_capacity(lit.len());

    for y in 0..height {
        for x in 0..width {
            let ys = y.saturating_sub(1)..=(y + 1).min(height - 1);
            let hit = ys.into_iter().any(|ny| {
                let xs = x.saturating_sub(1)..=(x + 1).min(width - 1);
                xs.into_iter().any(|nx| lit[ny * width + nx] == want)
            });
            out.push(if hit { want } else { !want });
        }
    }

    out
}

/// Render a packed frame as white-on-black (or black-on-white when inverted)
pub fn image_from_frame(frame: &[u8], width: u16, height: u16, invert: bool) -> RgbaImage {
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    RgbaImage::from_fn(width as u32, height as u32, |x, y| {
        if pixel(frame, width, x as u16, y as u16) != invert {
            WHITE
        } else {
            BLACK
        }
    })
}

/// GIF frame delay in whole milliseconds, clamped to what a pack can hold
pub fn delay_ms(delay: Delay) -> u16 {
    let (numer, denom) = delay.numer_denom_ms();
    let ms = numer / denom.max(1);
    match ms {
        0 => ZERO_DELAY_FALLBACK_MS,
        ms => ms.min(u16::MAX as u32) as u16,
    }
}
