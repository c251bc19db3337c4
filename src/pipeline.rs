use std::fs;
use std::path::Path;

use image::{GrayImage, RgbImage};
use log::{debug, warn};

use crate::angle::emergence_angle;
use crate::annulus::{isolate_annulus, select_root_candidates};
use crate::config::Config;
use crate::debug_image::{self, DebugPanels};
use crate::errors::{Result, SeedError};
use crate::image_io::{base_name, find_photo, load_mask, load_photo, save_debug_image};
use crate::image_utils::fit_seed_mask;
use crate::morphology::root_skeleton;
use crate::output::{AngleMeasurement, ExtractionError, ImageReport, SeedRef};
use crate::point_analysis::{detect_seed_points, SeedPoint};

/// Per-seed measurement parameters
#[derive(Debug, Clone, Copy)]
pub struct AnnulusParams {
    pub inner_radius: u32,
    pub outer_radius: u32,
}

impl From<&Config> for AnnulusParams {
    fn from(config: &Config) -> Self {
        Self {
            inner_radius: config.inner_radius,
            outer_radius: config.outer_radius,
        }
    }
}

/// Inputs shared by every seed of one image
pub struct ImageContext<'a> {
    pub root_mask: &'a GrayImage,
    pub skeleton: &'a GrayImage,
    /// Decoded only when debug images are wanted
    pub photo: Option<&'a RgbImage>,
}

/// Measure one seed. Panels are collected into `panels` when given,
/// including for seeds that fail part-way.
pub fn measure_seed(
    seed: &SeedPoint,
    params: AnnulusParams,
    context: &ImageContext<'_>,
    mut panels: Option<&mut DebugPanels>,
) -> std::result::Result<f64, SeedError> {
    let skeleton = context.skeleton;
    let (width, height) = skeleton.dimensions();
    let center = seed.pixel_position(width, height);

    if let Some(panels) = panels.as_deref_mut() {
        panels.push(debug_image::mask_panel(context.root_mask));
        panels.push(debug_image::mask_panel(&seed.seed_mask));
        panels.push(debug_image::skeleton_location_panel(skeleton, center, params.outer_radius));
        match context.photo {
            Some(photo) => panels.push(debug_image::photo_panel(
                photo,
                seed.centroid,
                params.inner_radius,
                params.outer_radius,
                height,
            )),
            None => panels.push(RgbImage::new(1, 1)),
        }
    }

    let half_disk = isolate_annulus(skeleton, center, 0, params.outer_radius);
    let fragment = isolate_annulus(&half_disk, center, params.inner_radius, params.outer_radius);

    if let Some(panels) = panels.as_deref_mut() {
        panels.push(debug_image::local_panel(&half_disk, center, params.outer_radius));
        panels.push(debug_image::local_panel(&fragment, center, params.outer_radius));
    }

    let candidates = select_root_candidates(&fragment)?;
    debug!(
        "seed at {:?}: {} components in annulus, left centroid {:?}, right centroid {:?}",
        center, candidates.component_count, candidates.left.centroid, candidates.right.centroid
    );

    if let Some(panels) = panels.as_deref_mut() {
        panels.push(debug_image::markers_panel(
            width,
            height,
            center,
            &[candidates.left.centroid, candidates.right.centroid],
            params.outer_radius,
        ));
    }

    let degrees = emergence_angle(center, candidates.left.centroid, candidates.right.centroid)?;

    if let Some(panels) = panels {
        panels.push(debug_image::angle_panel(
            &fragment,
            center,
            candidates.left.centroid,
            candidates.right.centroid,
            params.outer_radius,
        ));
    }

    Ok(degrees)
}

/// Turn the outcome of every seed into exactly one row each
pub fn measure_seeds(
    file_name: &str,
    seeds: &[SeedPoint],
    params: AnnulusParams,
    context: &ImageContext<'_>,
    debug_dir: Option<&Path>,
) -> Result<ImageReport> {
    let mut report = ImageReport::new(file_name);

    for (index, seed) in seeds.iter().enumerate() {
        let seed_ref = SeedRef {
            index,
            centroid: seed.centroid,
            pixel_count: seed.pixel_count,
        };

        let mut panels = debug_dir.map(|_| DebugPanels::new());
        match measure_seed(seed, params, context, panels.as_mut()) {
            Ok(degrees) => report.measurements.push(AngleMeasurement {
                file_name: file_name.to_string(),
                degrees,
                seed: seed_ref,
            }),
            Err(e) => {
                warn!("{}: seed {}: {}", file_name, index, e);
                report.errors.push(ExtractionError {
                    file_name: file_name.to_string(),
                    message: e.to_string(),
                    seed: Some(seed_ref),
                });
            }
        }

        if let (Some(dir), Some(panels)) = (debug_dir, panels) {
            let path = dir.join(format!("{}_{}.jpg", base_name(file_name), index));
            debug!("writing {} debug panels to {}", panels.len(), path.display());
            save_debug_image(&panels.compose(), &path)?;
        }
    }

    Ok(report)
}

/// Measure every seed of one segmentation file.
///
/// Failures of individual seeds end up as error rows in the report; an `Err`
/// means the file as a whole could not be processed.
pub fn process_image(file_name: &str, config: &Config) -> Result<ImageReport> {
    let photo_path = find_photo(&config.photo_dir, file_name)?;

    let root_mask = load_mask(config.root_seg_dir.join(file_name))?;
    let (width, height) = root_mask.dimensions();
    let seed_mask = fit_seed_mask(&load_mask(config.seed_seg_dir.join(file_name))?, width, height);

    let skeleton = root_skeleton(&root_mask, config.min_skeleton_object_size);
    let seeds = detect_seed_points(
        &seed_mask,
        config.max_seed_points_per_image,
        config.min_seed_pixels,
    );
    debug!("{}: {} seeds", file_name, seeds.len());

    let photo = if config.save_debug_images {
        fs::create_dir_all(&config.debug_image_dir)?;
        Some(load_photo(&photo_path)?)
    } else {
        None
    };
    let debug_dir = config
        .save_debug_images
        .then_some(config.debug_image_dir.as_path());

    let context = ImageContext {
        root_mask: &root_mask,
        skeleton: &skeleton,
        photo: photo.as_ref(),
    };

    measure_seeds(file_name, &seeds, AnnulusParams::from(config), &context, debug_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_utils::MASK_ON;
    use image::Luma;

    fn seed_at(row: u32, col: u32, width: u32, height: u32) -> SeedPoint {
        SeedPoint {
            centroid: (row as f64 / height as f64, col as f64 / width as f64),
            seed_mask: GrayImage::new(width, height),
            pixel_count: 200,
        }
    }

    fn draw(mask: &mut GrayImage, from: (u32, u32), to: (u32, u32)) {
        let start = (from.1 as isize, from.0 as isize);
        let end = (to.1 as isize, to.0 as isize);
        for (x, y) in bresenham::Bresenham::new(start, end) {
            mask.put_pixel(x as u32, y as u32, Luma([MASK_ON]));
        }
    }

    fn params() -> AnnulusParams {
        AnnulusParams {
            inner_radius: 20,
            outer_radius: 50,
        }
    }

    #[test]
    fn measures_right_angle_between_diagonal_roots() {
        let mut skeleton = GrayImage::new(200, 200);
        draw(&mut skeleton, (40, 100), (140, 0));
        draw(&mut skeleton, (40, 100), (140, 199));
        let context = ImageContext {
            root_mask: &skeleton,
            skeleton: &skeleton,
            photo: None,
        };

        let seed = seed_at(40, 100, 200, 200);
        let degrees = measure_seed(&seed, params(), &context, None).unwrap();
        assert!((degrees - 90.0).abs() < 1.0, "got {}", degrees);
    }

    #[test]
    fn every_seed_yields_exactly_one_row() {
        let mut skeleton = GrayImage::new(300, 200);
        // two roots under the first seed, one under the second
        draw(&mut skeleton, (40, 80), (120, 20));
        draw(&mut skeleton, (40, 80), (120, 140));
        draw(&mut skeleton, (40, 230), (150, 230));
        let context = ImageContext {
            root_mask: &skeleton,
            skeleton: &skeleton,
            photo: None,
        };

        let seeds = vec![seed_at(40, 80, 300, 200), seed_at(40, 230, 300, 200)];
        let report = measure_seeds("plant.png", &seeds, params(), &context, None).unwrap();

        assert_eq!(report.row_count(), 2);
        assert_eq!(report.measurements.len(), 1);
        assert_eq!(report.measurements[0].seed.index, 0);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].seed.as_ref().unwrap().index, 1);
        assert_eq!(report.errors[0].message, "could not find two roots in local region");
    }

    #[test]
    fn failed_seed_still_collects_panels() {
        let skeleton = GrayImage::new(100, 100);
        let context = ImageContext {
            root_mask: &skeleton,
            skeleton: &skeleton,
            photo: None,
        };

        let mut panels = DebugPanels::new();
        let result = measure_seed(&seed_at(10, 50, 100, 100), params(), &context, Some(&mut panels));
        assert_eq!(result.unwrap_err(), SeedError::InsufficientRootCandidates);
        assert_eq!(panels.len(), 6);
    }

    #[test]
    fn roots_inside_inner_radius_are_ignored() {
        let mut skeleton = GrayImage::new(100, 100);
        draw(&mut skeleton, (40, 50), (50, 40));
        draw(&mut skeleton, (40, 50), (50, 60));
        let context = ImageContext {
            root_mask: &skeleton,
            skeleton: &skeleton,
            photo: None,
        };

        let result = measure_seed(&seed_at(40, 50, 100, 100), params(), &context, None);
        assert_eq!(result.unwrap_err(), SeedError::InsufficientRootCandidates);
    }

    #[test]
    fn no_seeds_no_rows() {
        let skeleton = GrayImage::new(10, 10);
        let context = ImageContext {
            root_mask: &skeleton,
            skeleton: &skeleton,
            photo: None,
        };
        let report = measure_seeds("empty.png", &[], params(), &context, None).unwrap();
        assert_eq!(report.row_count(), 0);
    }
}
