use image::GrayImage;

use crate::regions::{label_regions, region_mask};

/// A detected seed, located at the top edge of its marker blob
#[derive(Debug, Clone)]
pub struct SeedPoint {
    /// (y, x) normalised by the mask height and width
    pub centroid: (f64, f64),
    /// Seed mask restricted to this seed's region
    pub seed_mask: GrayImage,
    pub pixel_count: usize,
}

impl SeedPoint {
    /// Pixel (row, col) of the seed in an image of the given size, clamped to the image.
    /// Halfway positions round to the even pixel.
    pub fn pixel_position(&self, width: u32, height: u32) -> (u32, u32) {
        let y = (self.centroid.0 * height as f64).round_ties_even().max(0.0) as u32;
        let x = (self.centroid.1 * width as f64).round_ties_even().max(0.0) as u32;
        (y.min(height.saturating_sub(1)), x.min(width.saturating_sub(1)))
    }
}

/// Find seed points in a seed location mask.
///
/// Regions with `min_pixels` or fewer pixels are noise. Each remaining region
/// is anchored at the mean column of its topmost row. Seeds come back largest
/// first, at most `max_seed_points` of them; equal sizes are ordered by
/// descending centroid row, then descending centroid column.
pub fn detect_seed_points(
    seed_mask: &GrayImage,
    max_seed_points: usize,
    min_pixels: usize,
) -> Vec<SeedPoint> {
    let (width, height) = seed_mask.dimensions();
    let regions = label_regions(seed_mask);

    let mut seeds: Vec<SeedPoint> = Vec::new();
    for region in regions.iter().filter(|r| r.pixel_count > min_pixels) {
        let min_y = match region.min_row() {
            Some(y) => y,
            None => continue,
        };

        let top_xs: Vec<u32> = region
            .coords
            .iter()
            .take_while(|&&(y, _)| y == min_y)
            .map(|&(_, x)| x)
            .collect();
        let mean_x = top_xs.iter().map(|&x| x as f64).sum::<f64>() / top_xs.len() as f64;

        seeds.push(SeedPoint {
            centroid: (min_y as f64 / height as f64, mean_x / width as f64),
            seed_mask: region_mask(seed_mask, region),
            pixel_count: region.pixel_count,
        });
    }

    seeds.sort_by(|a, b| {
        b.pixel_count
            .cmp(&a.pixel_count)
            .then_with(|| b.centroid.0.total_cmp(&a.centroid.0))
            .then_with(|| b.centroid.1.total_cmp(&a.centroid.1))
    });
    seeds.truncate(max_seed_points);
    seeds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_utils::{count_foreground, fit_seed_mask, MASK_ON};
    use assert_approx_eq::assert_approx_eq;
    use image::Luma;

    fn rect(mask: &mut GrayImage, top: u32, left: u32, h: u32, w: u32) {
        for y in top..top + h {
            for x in left..left + w {
                mask.put_pixel(x, y, Luma([MASK_ON]));
            }
        }
    }

    #[test]
    fn no_regions_no_seeds() {
        let seeds = detect_seed_points(&GrayImage::new(50, 50), 2, 100);
        assert!(seeds.is_empty());
    }

    #[test]
    fn ranks_by_size_and_drops_noise() {
        let mut mask = GrayImage::new(200, 100);
        rect(&mut mask, 10, 10, 5, 10); // 50
        rect(&mut mask, 10, 50, 15, 20); // 300
        rect(&mut mask, 10, 120, 10, 15); // 150

        let seeds = detect_seed_points(&mask, 5, 100);
        let counts: Vec<usize> = seeds.iter().map(|s| s.pixel_count).collect();
        assert_eq!(counts, vec![300, 150]);
    }

    #[test]
    fn region_of_exactly_floor_size_is_noise() {
        let mut mask = GrayImage::new(50, 50);
        rect(&mut mask, 0, 0, 10, 10);
        assert!(detect_seed_points(&mask, 2, 100).is_empty());
    }

    #[test]
    fn truncates_to_max_seed_points() {
        let mut mask = GrayImage::new(200, 100);
        rect(&mut mask, 10, 10, 15, 15);
        rect(&mut mask, 10, 60, 12, 12);
        rect(&mut mask, 10, 120, 20, 20);

        let seeds = detect_seed_points(&mask, 2, 100);
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].pixel_count, 400);
        assert_eq!(seeds[1].pixel_count, 225);
    }

    #[test]
    fn seed_sits_at_top_edge_of_blob() {
        let mut mask = GrayImage::new(100, 50);
        // wide body with a narrower cap on top
        rect(&mut mask, 20, 30, 10, 20);
        rect(&mut mask, 18, 36, 2, 4);

        let seeds = detect_seed_points(&mask, 1, 100);
        assert_eq!(seeds.len(), 1);
        let seed = &seeds[0];
        assert_approx_eq!(seed.centroid.0, 18.0 / 50.0);
        assert_approx_eq!(seed.centroid.1, 37.5 / 100.0);
        assert_eq!(seed.pixel_position(100, 50), (18, 38));
    }

    #[test]
    fn seed_mask_holds_only_its_region() {
        let mut mask = GrayImage::new(100, 40);
        rect(&mut mask, 5, 5, 12, 12);
        rect(&mut mask, 5, 60, 11, 11);

        let seeds = detect_seed_points(&mask, 2, 100);
        assert_eq!(count_foreground(&seeds[0].seed_mask), 144);
        assert_eq!(count_foreground(&seeds[1].seed_mask), 121);
        assert_eq!(seeds[0].seed_mask.get_pixel(65, 10)[0], 0);
    }

    #[test]
    fn halfway_column_rounds_to_even() {
        let mut mask = GrayImage::new(64, 64);
        // top row spans columns 35..=38, mean 36.5
        rect(&mut mask, 10, 35, 30, 4);

        let seeds = detect_seed_points(&mask, 1, 100);
        assert_approx_eq!(seeds[0].centroid.1 * 64.0, 36.5);
        assert_eq!(seeds[0].pixel_position(64, 64), (10, 36));
    }

    #[test]
    fn equal_sizes_prefer_lower_seed() {
        let mut mask = GrayImage::new(100, 100);
        rect(&mut mask, 10, 10, 12, 12);
        rect(&mut mask, 40, 60, 12, 12);

        let kept = detect_seed_points(&mask, 1, 100);
        assert_eq!(kept.len(), 1);
        assert_approx_eq!(kept[0].centroid.0, 0.4);
        assert_approx_eq!(kept[0].centroid.1, 0.655);

        let both = detect_seed_points(&mask, 2, 100);
        assert_approx_eq!(both[1].centroid.0, 0.1);
    }

    #[test]
    fn equal_sizes_on_one_row_prefer_right_seed() {
        let mut mask = GrayImage::new(100, 50);
        rect(&mut mask, 10, 10, 12, 12);
        rect(&mut mask, 10, 60, 12, 12);

        let seeds = detect_seed_points(&mask, 2, 100);
        assert!(seeds[0].centroid.1 > seeds[1].centroid.1);
        assert_approx_eq!(seeds[0].centroid.1, 0.655);
    }

    #[test]
    fn two_equal_blobs_survive_rescaling() {
        let mut full = GrayImage::new(200, 100);
        rect(&mut full, 10, 20, 20, 20);
        rect(&mut full, 10, 120, 20, 20);

        let small = image::imageops::resize(&full, 100, 50, image::imageops::FilterType::Nearest);
        let fitted = fit_seed_mask(&small, 200, 100);
        let seeds = detect_seed_points(&fitted, 2, 100);

        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].pixel_count, seeds[1].pixel_count);
        assert!(seeds[0].centroid.1 > 0.5);
        assert!(seeds[1].centroid.1 < 0.5);
    }
}
