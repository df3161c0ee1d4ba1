//! Pixel ownership across overlapping masks.

use tracing::debug;

use crate::error::{MaskError, Result};
use crate::raster::RasterMask;

fn check_same_size(masks: &[&RasterMask]) -> Result<Option<(u32, u32)>> {
    let Some(first) = masks.first() else {
        return Ok(None);
    };
    let dims = first.dimensions();
    for mask in &masks[1..] {
        if mask.dimensions() != dims {
            return Err(MaskError::DimensionMismatch { left: dims, right: mask.dimensions() });
        }
    }
    Ok(Some(dims))
}

/// Give every pixel to the mask holding the highest value there and zero it
/// in all the others. Ties go to the earliest mask.
///
/// Afterwards no pixel is non-zero in more than one mask.
pub fn resolve_ownership(masks: &mut [RasterMask]) -> Result<()> {
    {
        let refs: Vec<&RasterMask> = masks.iter().collect();
        if check_same_size(&refs)?.is_none() || masks.len() < 2 {
            return Ok(());
        }
    }

    let len = masks[0].len();
    let mut contested = 0usize;
    for i in 0..len {
        let mut owner = 0;
        let mut best = masks[0].data()[i];
        let mut claimants = usize::from(best > 0);
        for (m, mask) in masks.iter().enumerate().skip(1) {
            let value = mask.data()[i];
            if value > 0 {
                claimants += 1;
            }
            if value > best {
                best = value;
                owner = m;
            }
        }
        if claimants < 2 {
            continue;
        }
        contested += 1;
        for (m, mask) in masks.iter_mut().enumerate() {
            if m != owner {
                mask.data_mut()[i] = 0;
            }
        }
    }
    debug!(masks = masks.len(), contested, "resolved pixel ownership");
    Ok(())
}

/// Pixelwise maximum of all masks; `None` for an empty list.
pub fn union_all(masks: &[&RasterMask]) -> Result<Option<RasterMask>> {
    if check_same_size(masks)?.is_none() {
        return Ok(None);
    }
    let mut union = masks[0].clone();
    for mask in &masks[1..] {
        union.union_with(mask)?;
    }
    Ok(Some(union))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highest_value_wins_and_ties_go_first() {
        let mut masks = vec![
            RasterMask::from_vec(4, 1, vec![255, 100, 200, 0]).unwrap(),
            RasterMask::from_vec(4, 1, vec![255, 150, 0, 0]).unwrap(),
            RasterMask::from_vec(4, 1, vec![10, 150, 50, 90]).unwrap(),
        ];
        resolve_ownership(&mut masks).unwrap();
        assert_eq!(masks[0].data(), &[255, 0, 200, 0]);
        assert_eq!(masks[1].data(), &[0, 150, 0, 0]);
        assert_eq!(masks[2].data(), &[0, 0, 0, 90]);
    }

    #[test]
    fn test_no_pixel_is_claimed_twice() {
        let mut a = RasterMask::new(30, 30);
        let mut b = RasterMask::new(30, 30);
        crate::brush::paint(&mut a, 12.0, 15.0, 8.0, crate::brush::BrushMode::Add);
        crate::brush::paint(&mut b, 18.0, 15.0, 8.0, crate::brush::BrushMode::Add);
        let mut masks = vec![a, b];
        resolve_ownership(&mut masks).unwrap();
        for i in 0..masks[0].len() {
            assert!(masks[0].data()[i] == 0 || masks[1].data()[i] == 0);
        }
        assert!(masks[1].count_above(1) > 0);
    }

    #[test]
    fn test_dimension_mismatch_is_an_error() {
        let mut masks = vec![RasterMask::new(2, 2), RasterMask::new(2, 3)];
        assert!(matches!(
            resolve_ownership(&mut masks),
            Err(MaskError::DimensionMismatch { .. })
        ));
        assert!(resolve_ownership(&mut []).is_ok());
    }

    #[test]
    fn test_union_all() {
        let a = RasterMask::from_vec(3, 1, vec![255, 0, 0]).unwrap();
        let b = RasterMask::from_vec(3, 1, vec![0, 0, 128]).unwrap();
        let union = union_all(&[&a, &b]).unwrap().unwrap();
        assert_eq!(union.data(), &[255, 0, 128]);
        assert!(union_all(&[]).unwrap().is_none());
    }
}
