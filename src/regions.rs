use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};

/// A labelled 8-connected set of foreground pixels
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectedRegion {
    /// Labels start at 1 and follow raster order of each region's first pixel
    pub label: u32,
    pub pixel_count: usize,
    /// (row, col) mean of the member pixels
    pub centroid: (f64, f64),
    /// (row, col) pairs in raster order
    pub coords: Vec<(u32, u32)>,
}

impl ConnectedRegion {
    /// Topmost row of the region
    pub fn min_row(&self) -> Option<u32> {
        self.coords.first().map(|&(y, _)| y)
    }
}

/// Label the foreground (non-zero) pixels of a mask with 8-connectivity
/// and collect per-region statistics, ordered by label.
pub fn label_regions(mask: &GrayImage) -> Vec<ConnectedRegion> {
    let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));

    let mut regions: Vec<ConnectedRegion> = Vec::new();
    let mut slot_of_label: Vec<Option<usize>> = Vec::new();

    for (x, y, pixel) in labels.enumerate_pixels() {
        let label = pixel[0];
        if label == 0 {
            continue;
        }

        let idx = label as usize;
        if slot_of_label.len() <= idx {
            slot_of_label.resize(idx + 1, None);
        }

        let slot = match slot_of_label[idx] {
            Some(slot) => slot,
            None => {
                regions.push(ConnectedRegion {
                    label,
                    pixel_count: 0,
                    centroid: (0.0, 0.0),
                    coords: Vec::new(),
                });
                slot_of_label[idx] = Some(regions.len() - 1);
                regions.len() - 1
            }
        };

        regions[slot].coords.push((y, x));
    }

    for region in &mut regions {
        region.pixel_count = region.coords.len();
        let (sum_y, sum_x) = region
            .coords
            .iter()
            .fold((0.0, 0.0), |(sy, sx), &(y, x)| (sy + y as f64, sx + x as f64));
        let n = region.pixel_count as f64;
        region.centroid = (sum_y / n, sum_x / n);
    }

    regions.sort_by_key(|r| r.label);
    regions
}

/// Mask holding only the pixels of `region`, copying the source values
pub fn region_mask(source: &GrayImage, region: &ConnectedRegion) -> GrayImage {
    let (width, height) = source.dimensions();
    let mut mask = GrayImage::new(width, height);
    for &(y, x) in &region.coords {
        mask.put_pixel(x, y, *source.get_pixel(x, y));
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn fill(mask: &mut GrayImage, rows: std::ops::Range<u32>, cols: std::ops::Range<u32>) {
        for y in rows {
            for x in cols.clone() {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
    }

    #[test]
    fn empty_mask_has_no_regions() {
        assert!(label_regions(&GrayImage::new(20, 20)).is_empty());
    }

    #[test]
    fn counts_and_centroids() {
        let mut mask = GrayImage::new(30, 20);
        fill(&mut mask, 2..4, 2..6);
        fill(&mut mask, 10..15, 20..25);

        let regions = label_regions(&mask);
        assert_eq!(regions.len(), 2);

        assert_eq!(regions[0].pixel_count, 8);
        assert_approx_eq!(regions[0].centroid.0, 2.5);
        assert_approx_eq!(regions[0].centroid.1, 3.5);

        assert_eq!(regions[1].pixel_count, 25);
        assert_approx_eq!(regions[1].centroid.0, 12.0);
        assert_approx_eq!(regions[1].centroid.1, 22.0);
        assert!(regions[0].label < regions[1].label);
    }

    #[test]
    fn diagonal_neighbours_join() {
        let mut mask = GrayImage::new(5, 5);
        for i in 0..5 {
            mask.put_pixel(i, i, Luma([255]));
        }
        let regions = label_regions(&mask);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].min_row(), Some(0));
    }

    #[test]
    fn region_mask_keeps_only_members() {
        let mut mask = GrayImage::new(10, 10);
        fill(&mut mask, 0..2, 0..2);
        fill(&mut mask, 6..8, 6..8);
        let regions = label_regions(&mask);

        let only_second = region_mask(&mask, &regions[1]);
        assert_eq!(only_second.get_pixel(0, 0)[0], 0);
        assert_eq!(only_second.get_pixel(7, 7)[0], 255);
    }
}
