use image::{imageops, GrayImage, Rgba, RgbaImage};

/// Straight-alpha mask, one byte per pixel, same size as the source image.
/// 0 = background (transparent), 255 = foreground (opaque).
#[derive(Debug, Clone, PartialEq)]
pub struct MaskBuffer {
    alpha: GrayImage,
}

impl MaskBuffer {
    /// Fully transparent mask
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            alpha: GrayImage::new(width, height),
        }
    }

    pub fn from_alpha(alpha: GrayImage) -> Self {
        Self { alpha }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.alpha.dimensions()
    }

    /// True when no pixels are allocated
    pub fn is_empty(&self) -> bool {
        self.alpha.width() == 0 || self.alpha.height() == 0
    }

    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.alpha.get_pixel(x, y)[0]
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.alpha
    }

    pub(crate) fn as_gray_mut(&mut self) -> &mut GrayImage {
        &mut self.alpha
    }

    /// Replace every pixel with `alpha`, resampling first when the
    /// incoming plane has a different resolution.
    pub fn overwrite(&mut self, alpha: GrayImage) {
        let (width, height) = self.dimensions();

        self.alpha = if alpha.dimensions() != (width, height) {
            tracing::debug!(
                "Resizing mask {}x{} -> {}x{}",
                alpha.width(),
                alpha.height(),
                width,
                height
            );
            imageops::resize(&alpha, width, height, imageops::FilterType::Lanczos3)
        } else {
            alpha
        };
    }

    /// Soften the cutout edge with a gaussian blur of the alpha plane
    pub fn feather(&mut self, sigma: f32) {
        if sigma <= 0.0 || self.is_empty() {
            return;
        }
        let _span = tracing::debug_span!("feather", sigma).entered();
        self.alpha = imageops::blur(&self.alpha, sigma);
    }

    /// Opaque grayscale rendering of the mask for visualization
    pub fn preview(&self) -> RgbaImage {
        RgbaImage::from_fn(self.alpha.width(), self.alpha.height(), |x, y| {
            let v = self.alpha.get_pixel(x, y)[0];
            Rgba([v, v, v, 255])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_blank_is_all_zero() {
        let mask = MaskBuffer::blank(100, 100);
        assert_eq!(mask.dimensions(), (100, 100));
        assert!(mask.as_gray().pixels().all(|p| p[0] == 0));
        assert!(!mask.is_empty());
        assert!(MaskBuffer::blank(0, 0).is_empty());
    }

    #[test]
    fn test_overwrite_resamples_to_buffer_size() {
        let mut mask = MaskBuffer::blank(40, 30);
        mask.overwrite(GrayImage::from_pixel(80, 60, Luma([255])));
        assert_eq!(mask.dimensions(), (40, 30));
        assert!(mask.alpha_at(20, 15) >= 250);
    }

    #[test]
    fn test_feather_softens_hard_edge() {
        let mut mask = MaskBuffer::from_alpha(GrayImage::from_fn(40, 10, |x, _| {
            Luma([if x < 20 { 255 } else { 0 }])
        }));
        mask.feather(2.0);
        let edge = mask.alpha_at(20, 5);
        assert!(edge > 0 && edge < 255, "edge alpha {edge}");
        assert!(mask.alpha_at(0, 5) >= 250);
        assert!(mask.alpha_at(39, 5) <= 5);
    }

    #[test]
    fn test_preview_is_opaque_gray() {
        let mask = MaskBuffer::from_alpha(GrayImage::from_pixel(2, 2, Luma([90])));
        assert_eq!(*mask.preview().get_pixel(1, 1), Rgba([90, 90, 90, 255]));
    }

    #[test]
    fn test_feather_zero_is_noop() {
        let original = MaskBuffer::from_alpha(GrayImage::from_fn(8, 8, |x, _| Luma([x as u8 * 30])));
        let mut mask = original.clone();
        mask.feather(0.0);
        assert_eq!(mask, original);
    }
}
