use tracing::debug;

use crate::raster::{RasterMask, DEFAULT_THRESHOLD};

/// Erode with a circular structuring element of `radius` pixels.
///
/// A pixel survives only if every pixel within `radius` of it is set; pixels
/// outside the mask count as unset. Survivors keep their original value.
pub fn erode(mask: &RasterMask, radius: u32) -> RasterMask {
    erode_with_level(mask, radius, DEFAULT_THRESHOLD)
}

pub fn erode_with_level(mask: &RasterMask, radius: u32, level: u8) -> RasterMask {
    if radius == 0 || mask.is_empty() {
        return mask.clone();
    }
    let (width, height) = (mask.width() as usize, mask.height() as usize);
    let r = i64::from(radius);

    // Half-width of the disc on each row offset
    let half_widths: Vec<usize> = (-r..=r)
        .map(|dy| (((r * r - dy * dy) as f64).sqrt().floor()) as usize)
        .collect();

    // Length of the set run ending at / starting from each pixel, per row
    let mut run_left = vec![0usize; width * height];
    let mut run_right = vec![0usize; width * height];
    for y in 0..height {
        let row = y * width;
        for x in 0..width {
            if mask.data()[row + x] >= level {
                run_left[row + x] = if x > 0 { run_left[row + x - 1] } else { 0 } + 1;
            }
        }
        for x in (0..width).rev() {
            if mask.data()[row + x] >= level {
                run_right[row + x] = if x + 1 < width { run_right[row + x + 1] } else { 0 } + 1;
            }
        }
    }

    let mut out = RasterMask::new(mask.width(), mask.height());
    let mut survivors = 0usize;
    for y in 0..height {
        for x in 0..width {
            let value = mask.data()[y * width + x];
            if value < level {
                continue;
            }
            let covered = half_widths.iter().enumerate().all(|(i, &half)| {
                let yy = y as i64 + i as i64 - r;
                if yy < 0 || yy >= height as i64 {
                    return false;
                }
                let at = yy as usize * width + x;
                run_left[at] > half && run_right[at] > half
            });
            if covered {
                out.data_mut()[y * width + x] = value;
                survivors += 1;
            }
        }
    }
    debug!(radius, before = mask.count_above(level), after = survivors, "eroded mask");
    out
}
