// Diagnostic composites. Purely illustrative, nothing here feeds the measured angle.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::drawing::draw_hollow_circle_mut;
use imageproc::morphology::dilate;

use crate::image_utils::{in_bounds, is_set, MASK_ON};

/// Side length of one panel
pub const PANEL_SIZE: u32 = 640;
pub const PANELS_PER_ROW: u32 = 4;
pub const PANEL_COUNT: usize = 8;

/// Margin kept around the outer radius in the cropped panels
const CROP_MARGIN: u32 = 20;
const MARKER_RADIUS: u8 = 5;
const RED: Rgb<u8> = Rgb([255, 0, 0]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Panels collected while measuring one seed
#[derive(Debug, Default)]
pub struct DebugPanels {
    panels: Vec<RgbImage>,
}

impl DebugPanels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, panel: RgbImage) {
        self.panels.push(pad_to_panel(&panel));
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    /// Two rows of four panels. Missing panels stay black so failed seeds still get an image.
    pub fn compose(&self) -> RgbImage {
        let rows = (PANEL_COUNT as u32) / PANELS_PER_ROW;
        let mut merged = RgbImage::new(PANEL_SIZE * PANELS_PER_ROW, PANEL_SIZE * rows);

        for (i, panel) in self.panels.iter().take(PANEL_COUNT).enumerate() {
            let i = i as u32;
            let x = (i % PANELS_PER_ROW) * PANEL_SIZE;
            let y = (i / PANELS_PER_ROW) * PANEL_SIZE;
            imageops::replace(&mut merged, panel, x as i64, y as i64);
        }

        merged
    }
}

/// Crop to the panel size, padding with black
fn pad_to_panel(image: &RgbImage) -> RgbImage {
    let mut canvas = RgbImage::new(PANEL_SIZE, PANEL_SIZE);
    let (width, height) = image.dimensions();
    for y in 0..height.min(PANEL_SIZE) {
        for x in 0..width.min(PANEL_SIZE) {
            canvas.put_pixel(x, y, *image.get_pixel(x, y));
        }
    }
    canvas
}

pub fn mask_to_rgb(mask: &GrayImage) -> RgbImage {
    let (width, height) = mask.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        if is_set(mask, x, y) {
            WHITE
        } else {
            Rgb([0, 0, 0])
        }
    })
}

/// Scale to the panel width keeping the aspect ratio
fn fit_width(image: &RgbImage) -> RgbImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return RgbImage::new(PANEL_SIZE, PANEL_SIZE);
    }
    let new_height = ((height as f64 * PANEL_SIZE as f64 / width as f64).round() as u32).max(1);
    imageops::resize(image, PANEL_SIZE, new_height, FilterType::Triangle)
}

/// Lower half of a circle outline around `center` (row, col)
fn lower_semicircle(width: u32, height: u32, center: (u32, u32), radius: u32) -> GrayImage {
    let mut outline = GrayImage::new(width, height);
    draw_hollow_circle_mut(
        &mut outline,
        (center.1 as i32, center.0 as i32),
        radius as i32,
        Luma([MASK_ON]),
    );
    for y in 0..center.0.min(height) {
        for x in 0..width {
            outline.put_pixel(x, y, Luma([0]));
        }
    }
    outline
}

fn paint(image: &mut RgbImage, mask: &GrayImage, color: Rgb<u8>) {
    for (x, y, p) in mask.enumerate_pixels() {
        if p[0] > 0 && x < image.width() && y < image.height() {
            image.put_pixel(x, y, color);
        }
    }
}

/// Whole-image mask overview
pub fn mask_panel(mask: &GrayImage) -> RgbImage {
    fit_width(&mask_to_rgb(mask))
}

/// Skeleton overview with the outer radius marked
pub fn skeleton_location_panel(skeleton: &GrayImage, center: (u32, u32), outer_radius: u32) -> RgbImage {
    let (width, height) = skeleton.dimensions();
    let mut rgb = mask_to_rgb(skeleton);
    paint(&mut rgb, &lower_semicircle(width, height, center, outer_radius), RED);

    let mut scaled = fit_width(&rgb);
    // brighten so thin lines survive downscaling
    for p in scaled.pixels_mut() {
        for c in p.0.iter_mut() {
            if *c > 0 {
                *c = 255;
            }
        }
    }
    scaled
}

/// Photograph with both radii marked. Radii are given in skeleton pixels.
pub fn photo_panel(
    photo: &RgbImage,
    centroid: (f64, f64),
    inner_radius: u32,
    outer_radius: u32,
    skeleton_height: u32,
) -> RgbImage {
    let (width, height) = photo.dimensions();
    if width == 0 || height == 0 {
        return RgbImage::new(PANEL_SIZE, PANEL_SIZE);
    }

    let scale = if skeleton_height > 0 {
        height as f64 / skeleton_height as f64
    } else {
        1.0
    };
    let center = (
        ((centroid.0 * height as f64).round() as u32).min(height - 1),
        ((centroid.1 * width as f64).round() as u32).min(width - 1),
    );

    let mut marked = photo.clone();
    for radius in [inner_radius, outer_radius] {
        let scaled_radius = (radius as f64 * scale).round() as u32;
        paint(&mut marked, &lower_semicircle(width, height, center, scaled_radius), RED);
    }
    fit_width(&marked)
}

/// Window around the seed that holds the whole annulus
fn crop_window(width: u32, height: u32, center: (u32, u32), outer_radius: u32) -> (u32, u32, u32, u32) {
    let reach = outer_radius.saturating_add(CROP_MARGIN);
    let top = center.0.saturating_sub(reach);
    let left = center.1.saturating_sub(reach);
    let bottom = center.0.saturating_add(reach).min(height);
    let right = center.1.saturating_add(reach).min(width);
    (left, top, right.saturating_sub(left), bottom.saturating_sub(top))
}

fn crop(image: &RgbImage, center: (u32, u32), outer_radius: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    let (x, y, w, h) = crop_window(width, height, center, outer_radius);
    imageops::crop_imm(image, x, y, w, h).to_image()
}

/// Local view of a masking step
pub fn local_panel(mask: &GrayImage, center: (u32, u32), outer_radius: u32) -> RgbImage {
    crop(&mask_to_rgb(mask), center, outer_radius)
}

/// Seed and selected centroids drawn as blobs, all given as (row, col)
pub fn markers_panel(
    width: u32,
    height: u32,
    center: (u32, u32),
    points: &[(f64, f64)],
    outer_radius: u32,
) -> RgbImage {
    let mut markers = GrayImage::new(width, height);
    let all = points
        .iter()
        .map(|&(y, x)| (y.round() as i64, x.round() as i64))
        .chain(std::iter::once((center.0 as i64, center.1 as i64)));

    for (y, x) in all {
        if in_bounds(x, y, width, height) {
            markers.put_pixel(x as u32, y as u32, Luma([MASK_ON]));
        }
    }

    let markers = dilate(&markers, Norm::L1, MARKER_RADIUS);
    local_panel(&markers, center, outer_radius)
}

/// Isolated roots with the measured rays from the seed to each centroid
pub fn angle_panel(
    fragment: &GrayImage,
    center: (u32, u32),
    left: (f64, f64),
    right: (f64, f64),
    outer_radius: u32,
) -> RgbImage {
    let (width, height) = fragment.dimensions();
    let mut rgb = mask_to_rgb(fragment);

    for (y, x) in [left, right] {
        let start = (center.1 as isize, center.0 as isize);
        let end = (x.round() as isize, y.round() as isize);
        for (px, py) in bresenham::Bresenham::new(start, end).chain(std::iter::once(end)) {
            if in_bounds(px as i64, py as i64, width, height) {
                rgb.put_pixel(px as u32, py as u32, RED);
            }
        }
    }

    crop(&rgb, center, outer_radius)
}
