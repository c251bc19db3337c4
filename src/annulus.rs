use image::{GrayImage, Luma};

use crate::errors::SeedError;
use crate::image_utils::{apply_mask, MASK_ON};
use crate::regions::{label_regions, ConnectedRegion};

/// The two root traces found either side of a seed
#[derive(Debug, Clone)]
pub struct RootCandidates {
    /// Component with the smallest centroid column
    pub left: ConnectedRegion,
    /// Component with the largest centroid column
    pub right: ConnectedRegion,
    /// Number of components found in the annulus
    pub component_count: usize,
}

/// Lower half of the annulus around `center` (row, col).
///
/// A pixel is inside when its row is at or below the center row and its
/// squared distance `d2` satisfies `inner^2 <= d2 < outer^2`. Parts of the
/// disks outside the image are clipped. `inner = 0` gives the lower half-disk.
pub fn annulus_mask(width: u32, height: u32, center: (u32, u32), inner: u32, outer: u32) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    if width == 0 || height == 0 || outer == 0 {
        return mask;
    }

    let (cy, cx) = (center.0 as i64, center.1 as i64);
    let outer_sq = (outer as i64) * (outer as i64);
    let inner_sq = (inner as i64) * (inner as i64);

    let row_end = (cy + outer as i64).min(height as i64 - 1);
    let col_start = (cx - outer as i64).max(0);
    let col_end = (cx + outer as i64).min(width as i64 - 1);

    for y in cy.max(0)..=row_end {
        let dy = y - cy;
        for x in col_start..=col_end {
            let dx = x - cx;
            let d2 = dx * dx + dy * dy;
            if d2 < outer_sq && d2 >= inner_sq {
                mask.put_pixel(x as u32, y as u32, Luma([MASK_ON]));
            }
        }
    }

    mask
}

/// Skeleton restricted to the lower annulus around the seed
pub fn isolate_annulus(skeleton: &GrayImage, center: (u32, u32), inner: u32, outer: u32) -> GrayImage {
    let (width, height) = skeleton.dimensions();
    let keep = annulus_mask(width, height, center, inner, outer);
    apply_mask(skeleton, &keep)
}

/// Pick the leftmost and rightmost components of an isolated fragment.
///
/// Ties on the extreme centroid column go to the lower label, i.e. the
/// component whose first pixel comes first in raster order.
pub fn select_root_candidates(fragment: &GrayImage) -> Result<RootCandidates, SeedError> {
    let regions = label_regions(fragment);
    if regions.len() < 2 {
        return Err(SeedError::InsufficientRootCandidates);
    }

    let mut left = &regions[0];
    let mut right = &regions[0];
    for region in &regions[1..] {
        if region.centroid.1 < left.centroid.1 {
            left = region;
        }
        if region.centroid.1 > right.centroid.1 {
            right = region;
        }
    }

    // all centroids share a column: still report two distinct components
    if left.label == right.label {
        right = &regions[1];
    }

    Ok(RootCandidates {
        left: left.clone(),
        right: right.clone(),
        component_count: regions.len(),
    })
}
