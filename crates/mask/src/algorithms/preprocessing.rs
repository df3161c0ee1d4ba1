use crate::{error::Result, raster::{RasterMask, DEFAULT_THRESHOLD}, traits::MaskPreprocessor};

/// Simple thresholding preprocessor
#[derive(Debug, Clone)]
pub struct ThresholdPreprocessor {
    pub threshold: u8,
}

impl Default for ThresholdPreprocessor {
    fn default() -> Self {
        Self { threshold: DEFAULT_THRESHOLD }
    }
}

impl MaskPreprocessor for ThresholdPreprocessor {
    fn preprocess(&self, mask: &RasterMask) -> Result<RasterMask> {
        let mut binary = mask.clone();
        binary.binarize(self.threshold);
        Ok(binary)
    }
}

/// Gaussian feathering for soft mask edges
#[derive(Debug, Clone)]
pub struct GaussianBlurPreprocessor {
    pub sigma: f32,
}

impl Default for GaussianBlurPreprocessor {
    fn default() -> Self {
        Self { sigma: 1.0 }
    }
}

impl MaskPreprocessor for GaussianBlurPreprocessor {
    fn preprocess(&self, mask: &RasterMask) -> Result<RasterMask> {
        if mask.is_empty() || self.sigma <= 0.0 {
            return Ok(mask.clone());
        }
        let blurred = imageproc::filter::gaussian_blur_f32(&mask.to_gray_image(), self.sigma);
        Ok(RasterMask::from_gray_image(&blurred))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_binarizes() {
        let mask = RasterMask::from_vec(4, 1, vec![0, 100, 128, 240]).unwrap();
        let out = ThresholdPreprocessor::default().preprocess(&mask).unwrap();
        assert_eq!(out.data(), &[0, 0, 255, 255]);
    }

    #[test]
    fn test_feather_softens_edges() {
        let mut mask = RasterMask::new(20, 20);
        for y in 5..15 {
            for x in 5..15 {
                mask.set(x, y, 255);
            }
        }
        let out = GaussianBlurPreprocessor { sigma: 2.0 }.preprocess(&mask).unwrap();
        let edge = out.get(4, 10);
        assert!(edge > 0 && edge < 255, "edge value {edge} should be soft");
        assert!(out.get(10, 10) > 200);
    }
}
