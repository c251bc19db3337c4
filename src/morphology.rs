use image::{GrayImage, Luma};

use crate::image_utils::MASK_ON;
use crate::regions::label_regions;

/// Neighbour offsets (dx, dy) for bits 0..7 of a neighbourhood code,
/// counter-clockwise starting east
static NEIGHBOURS: [(i32, i32); 8] = [
    (1, 0),   // E
    (1, -1),  // NE
    (0, -1),  // N
    (-1, -1), // NW
    (-1, 0),  // W
    (-1, 1),  // SW
    (0, 1),   // S
    (1, 1),   // SE
];

#[inline]
fn bit(code: u8, i: usize) -> bool {
    (code >> (i % 8)) & 1 == 1
}

/// Whether the centre pixel of neighbourhood `code` may be cleared in
/// sub-iteration `step` (Guo-Hall conditions G1, G2 and G3 / G3').
fn removable(code: u8, step: usize) -> bool {
    // G1: exactly one 8-connected run of foreground around the pixel
    let crossings = [0, 2, 4, 6]
        .iter()
        .filter(|&&i| !bit(code, i) && (bit(code, i + 1) || bit(code, i + 2)))
        .count();
    if crossings != 1 {
        return false;
    }

    // G2: not an end point, not in the middle of a 1-pixel line
    let mut n1 = 0;
    let mut n2 = 0;
    for k in [1, 3, 5, 7] {
        if bit(code, k) || bit(code, k - 1) {
            n1 += 1;
        }
        if bit(code, k) || bit(code, k + 1) {
            n2 += 1;
        }
    }
    if !(2..=3).contains(&n1.min(n2)) {
        return false;
    }

    // G3 removes from the south-east boundary first, G3' from the north-west
    if step == 0 {
        !((bit(code, 1) || bit(code, 2) || !bit(code, 7)) && bit(code, 0))
    } else {
        !((bit(code, 5) || bit(code, 6) || !bit(code, 3)) && bit(code, 4))
    }
}

/// Thin a binary mask to unit-width ridge lines, preserving connectivity.
///
/// Two-subiteration Guo-Hall thinning driven by lookup tables over the 3x3
/// neighbourhood code. Thin diagonal strokes keep a connected line and a
/// 2x2 block keeps a single pixel. Pixels outside the image count as background.
pub fn skeletonize(mask: &GrayImage) -> GrayImage {
    let (width, height) = mask.dimensions();
    let w = width as usize;
    let h = height as usize;

    let tables: [[bool; 256]; 2] = [
        std::array::from_fn(|code| removable(code as u8, 0)),
        std::array::from_fn(|code| removable(code as u8, 1)),
    ];

    let mut grid: Vec<bool> = mask.pixels().map(|p| p[0] > 0).collect();
    let mut to_clear = Vec::new();

    loop {
        let mut changed = false;

        for table in &tables {
            to_clear.clear();

            for y in 0..h {
                for x in 0..w {
                    if !grid[y * w + x] {
                        continue;
                    }

                    let mut code = 0u8;
                    for (i, &(dx, dy)) in NEIGHBOURS.iter().enumerate() {
                        let nx = x as i32 + dx;
                        let ny = y as i32 + dy;
                        if nx >= 0
                            && ny >= 0
                            && (nx as usize) < w
                            && (ny as usize) < h
                            && grid[ny as usize * w + nx as usize]
                        {
                            code |= 1 << i;
                        }
                    }

                    if table[code as usize] {
                        to_clear.push(y * w + x);
                    }
                }
            }

            if !to_clear.is_empty() {
                changed = true;
                for &idx in &to_clear {
                    grid[idx] = false;
                }
            }
        }

        if !changed {
            break;
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        if grid[y as usize * w + x as usize] {
            Luma([MASK_ON])
        } else {
            Luma([0])
        }
    })
}

/// Drop 8-connected components with fewer than `min_size` pixels
pub fn remove_small_objects(mask: &GrayImage, min_size: usize) -> GrayImage {
    let (width, height) = mask.dimensions();
    let mut cleaned = GrayImage::new(width, height);

    for region in label_regions(mask) {
        if region.pixel_count < min_size {
            continue;
        }
        for &(y, x) in &region.coords {
            cleaned.put_pixel(x, y, Luma([MASK_ON]));
        }
    }

    cleaned
}

/// Skeleton of a root segmentation with spurious fragments removed
pub fn root_skeleton(root_mask: &GrayImage, min_object_size: usize) -> GrayImage {
    let skeleton = skeletonize(root_mask);
    remove_small_objects(&skeleton, min_object_size)
}
