use image::{GrayImage, Luma, RgbaImage};

/// Foreground value used for every binary mask in the crate
pub const MASK_ON: u8 = 255;

/// Alpha value above which a segmentation pixel belongs to the mask
pub const ALPHA_THRESHOLD: u8 = 0;

/// Build a binary mask from the alpha channel of a segmentation
pub fn alpha_mask(image: &RgbaImage) -> GrayImage {
    let (width, height) = image.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        if image.get_pixel(x, y)[3] > ALPHA_THRESHOLD {
            Luma([MASK_ON])
        } else {
            Luma([0])
        }
    })
}

#[inline]
pub fn is_set(mask: &GrayImage, x: u32, y: u32) -> bool {
    mask.get_pixel(x, y)[0] > 0
}

/// Check if a point is inside the image bounds
#[inline]
pub fn in_bounds(x: i64, y: i64, width: u32, height: u32) -> bool {
    x >= 0 && y >= 0 && x < width as i64 && y < height as i64
}

pub fn count_foreground(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p[0] > 0).count()
}

/// Keep `mask` pixels only where `keep` is set
pub fn apply_mask(mask: &GrayImage, keep: &GrayImage) -> GrayImage {
    let (width, height) = mask.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        if is_set(keep, x, y) {
            *mask.get_pixel(x, y)
        } else {
            Luma([0])
        }
    })
}

/// Bring a seed mask to the root segmentation's geometry.
///
/// The seed mask is assumed to span the full image width and to be anchored
/// at the top, so it is scaled to `width` (height scaled by the same factor,
/// nearest-neighbour) and pasted at the top-left of a blank `width` x `height`
/// canvas. Rows past `height` are cropped.
pub fn fit_seed_mask(seed_mask: &GrayImage, width: u32, height: u32) -> GrayImage {
    let (seed_w, seed_h) = seed_mask.dimensions();
    if seed_w == 0 || seed_h == 0 {
        return GrayImage::new(width, height);
    }

    let scale = width as f64 / seed_w as f64;
    let scaled_h = ((seed_h as f64 * scale).round() as u32).max(1);

    let scaled = if (seed_w, seed_h) == (width, scaled_h) {
        seed_mask.clone()
    } else {
        image::imageops::resize(seed_mask, width, scaled_h, image::imageops::FilterType::Nearest)
    };

    let mut canvas = GrayImage::new(width, height);
    for y in 0..scaled_h.min(height) {
        for x in 0..width {
            if is_set(&scaled, x, y) {
                canvas.put_pixel(x, y, Luma([MASK_ON]));
            }
        }
    }
    canvas
}
