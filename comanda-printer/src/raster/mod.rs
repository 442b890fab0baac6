//! Image processing
//!
//! Turns an image file into an ESC/POS `GS v 0` raster block:
//! auto-crop, resize, optional inline text, center on a paper-wide white
//! canvas, threshold to 1 bit and pack MSB-first.
//!
//! Failures never abort a receipt: a missing or undecodable image yields an
//! empty block and the caller simply prints without it.

mod font;

use crate::error::{PrintError, PrintResult};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use std::path::Path;
use tracing::{debug, instrument, warn};

pub use font::{render_text, text_width};

/// Gap between the image and its inline text, in dots
pub const TEXT_PADDING: u32 = 16;

/// Scale applied to the 5x7 font
pub const TEXT_SCALE: u32 = 4;

/// Contrast boost applied before thresholding
const CONTRAST: f32 = 30.0;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Largest width-in-bytes or height a `GS v 0` header can state
const MAX_HEADER_FIELD: u32 = u16::MAX as u32;

/// Raster conversion options
#[derive(Debug, Clone, Default)]
pub struct RasterOptions {
    /// Printable width; the canvas is this rounded up to a multiple of 8
    pub paper_width_dots: u32,
    pub exact_width: Option<u32>,
    pub exact_height: Option<u32>,
    /// Text drawn to the right of the image
    pub inline_text: Option<String>,
}

impl RasterOptions {
    pub fn new(paper_width_dots: u32) -> Self {
        Self {
            paper_width_dots,
            ..Default::default()
        }
    }
}

/// Process an image file and return ESC/POS raster data
///
/// Returns an empty vector when the image cannot be loaded.
#[instrument(skip(options), fields(path = %path.display()))]
pub fn rasterize(path: &Path, options: &RasterOptions) -> Vec<u8> {
    match load_image(path) {
        Ok(img) => rasterize_image(img, options),
        Err(e) => {
            warn!(error = %e, "image unavailable, printing without it");
            Vec::new()
        }
    }
}

fn load_image(path: &Path) -> PrintResult<DynamicImage> {
    image::open(path).map_err(|e| PrintError::ImageLoad(format!("{}: {}", path.display(), e)))
}

/// Rasterize an already decoded image
pub fn rasterize_image(img: DynamicImage, options: &RasterOptions) -> Vec<u8> {
    let canvas_width = canvas_width(options.paper_width_dots);
    if canvas_width == 0 {
        warn!("paper width is zero, skipping image");
        return Vec::new();
    }

    let mut img = auto_crop(img.to_rgba8());
    img = resize(img, options.exact_width, options.exact_height);

    if let Some(text) = options.inline_text.as_deref()
        && !text.trim().is_empty()
    {
        img = compose_text(&img, text.trim());
    }

    if img.width() > canvas_width {
        let height = scaled(img.height(), canvas_width, img.width());
        img = imageops::resize(&img, canvas_width, height, FilterType::Nearest);
    }

    let canvas = center_on_canvas(&img, canvas_width);
    // xL xH / yL yH are 16-bit fields
    if canvas.width() / 8 > MAX_HEADER_FIELD || canvas.height() > MAX_HEADER_FIELD {
        warn!(
            width = canvas.width(),
            height = canvas.height(),
            "image too large for a raster block, printing without it"
        );
        return Vec::new();
    }
    debug!(width = canvas.width(), height = canvas.height(), "raster canvas ready");
    pack(&canvas)
}

/// Paper width rounded up to whole bytes
pub fn canvas_width(paper_width_dots: u32) -> u32 {
    paper_width_dots.div_ceil(8) * 8
}

/// `GS v 0 m xL xH yL yH`
pub fn raster_header(width_bytes: u32, height: u32) -> [u8; 8] {
    [
        0x1D,
        0x76,
        0x30,
        0x00,
        (width_bytes & 0xFF) as u8,
        ((width_bytes >> 8) & 0xFF) as u8,
        (height & 0xFF) as u8,
        ((height >> 8) & 0xFF) as u8,
    ]
}

/// Crop away a uniform border (the colour of the top-left pixel)
fn auto_crop(img: RgbaImage) -> RgbaImage {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return img;
    }
    let border = *img.get_pixel(0, 0);

    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, p) in img.enumerate_pixels() {
        if *p == border {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }

    match bounds {
        Some((x0, y0, x1, y1)) => {
            imageops::crop_imm(&img, x0, y0, x1 - x0 + 1, y1 - y0 + 1).to_image()
        }
        // Entirely uniform: nothing sensible to crop to
        None => img,
    }
}

fn scaled(value: u32, numerator: u32, denominator: u32) -> u32 {
    let v = (value as f64 * numerator as f64 / denominator as f64).round() as u32;
    v.max(1)
}

/// Resize to the requested size, keeping aspect ratio on an unset axis
fn resize(img: RgbaImage, exact_width: Option<u32>, exact_height: Option<u32>) -> RgbaImage {
    let (w, h) = img.dimensions();
    let (new_w, new_h) = match (exact_width, exact_height) {
        (Some(nw), Some(nh)) => (nw.max(1), nh.max(1)),
        (Some(nw), None) => (nw.max(1), scaled(h, nw.max(1), w)),
        (None, Some(nh)) => (scaled(w, nh.max(1), h), nh.max(1)),
        (None, None) => return img,
    };
    if (new_w, new_h) == (w, h) {
        return img;
    }
    imageops::resize(&img, new_w, new_h, FilterType::Nearest)
}

/// Place rendered text to the right of the image, both vertically centered
fn compose_text(img: &RgbaImage, text: &str) -> RgbaImage {
    let label = render_text(text, TEXT_SCALE);
    let width = img.width() + TEXT_PADDING + label.width();
    let height = img.height().max(label.height());

    let mut out = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    imageops::overlay(&mut out, img, 0, ((height - img.height()) / 2) as i64);
    imageops::overlay(
        &mut out,
        &label,
        (img.width() + TEXT_PADDING) as i64,
        ((height - label.height()) / 2) as i64,
    );
    out
}

fn center_on_canvas(img: &RgbaImage, canvas_width: u32) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(canvas_width, img.height(), WHITE);
    let x = (canvas_width - img.width()) / 2;
    imageops::overlay(&mut canvas, img, x as i64, 0);
    canvas
}

/// Greyscale, contrast, two-level posterize, then pack 8 dots per byte
fn pack(canvas: &RgbaImage) -> Vec<u8> {
    let grey = DynamicImage::ImageRgba8(canvas.clone())
        .grayscale()
        .adjust_contrast(CONTRAST)
        .to_luma_alpha8();

    let (w, h) = grey.dimensions();
    let width_bytes = w / 8;

    let mut data = Vec::with_capacity(8 + (width_bytes * h) as usize);
    data.extend_from_slice(&raster_header(width_bytes, h));

    for y in 0..h {
        for x_byte in 0..width_bytes {
            let mut byte = 0u8;
            for bit in 0..8 {
                let p = grey.get_pixel(x_byte * 8 + bit, y);
                let (luma, alpha) = (p[0], p[1]);
                if alpha > 127 && luma < 128 {
                    byte |= 1 << (7 - bit);
                }
            }
            data.push(byte);
        }
    }

    data
}
