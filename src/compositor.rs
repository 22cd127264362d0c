use crate::error::Result;
use crate::mask::MaskBuffer;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// Display flags read by the compositor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompositeFlags {
    /// The mask holds a result worth showing
    pub cutout: bool,
    /// "Hold to compare" is active
    pub compare: bool,
}

/// Render the visible frame.
///
/// Shows the source unchanged while comparing, or when there is no cutout
/// yet. Otherwise keeps source colour and takes coverage from the mask
/// ("source-in"): `alpha = source_alpha * mask_alpha / 255`, which is just
/// the mask alpha for an opaque source.
pub fn composite(source: &RgbaImage, mask: &MaskBuffer, flags: CompositeFlags) -> RgbaImage {
    if flags.compare || !flags.cutout || mask.is_empty() {
        return source.clone();
    }

    let _span = tracing::debug_span!("composite").entered();
    debug_assert_eq!(source.dimensions(), mask.dimensions());

    let alpha = mask.as_gray();
    RgbaImage::from_fn(source.width(), source.height(), |x, y| {
        let [r, g, b, a] = source.get_pixel(x, y).0;
        let m = alpha.get_pixel(x, y)[0];
        Rgba([r, g, b, source_in(a, m)])
    })
}

fn source_in(source_alpha: u8, mask_alpha: u8) -> u8 {
    ((source_alpha as u16 * mask_alpha as u16 + 127) / 255) as u8
}

/// Encode a frame as PNG for download
pub fn encode_png(frame: &RgbaImage) -> Result<Vec<u8>> {
    let _span = tracing::debug_span!("encode").entered();
    let mut buf = Cursor::new(Vec::new());
    frame.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn checker_source() -> RgbaImage {
        RgbaImage::from_fn(16, 16, |x, y| Rgba([x as u8 * 10, y as u8 * 10, 77, 255]))
    }

    fn half_mask() -> MaskBuffer {
        MaskBuffer::from_alpha(GrayImage::from_fn(16, 16, |x, _| {
            Luma([if x < 8 { 255 } else { 0 }])
        }))
    }

    #[test]
    fn test_compare_returns_source_regardless_of_mask() {
        let source = checker_source();
        let flags = CompositeFlags {
            cutout: true,
            compare: true,
        };
        assert_eq!(composite(&source, &half_mask(), flags), source);
    }

    #[test]
    fn test_no_cutout_returns_source() {
        let source = checker_source();
        assert_eq!(
            composite(&source, &half_mask(), CompositeFlags::default()),
            source
        );
    }

    #[test]
    fn test_cutout_takes_alpha_from_mask() {
        let source = checker_source();
        let flags = CompositeFlags {
            cutout: true,
            compare: false,
        };
        let frame = composite(&source, &half_mask(), flags);

        assert_eq!(frame.get_pixel(3, 5), source.get_pixel(3, 5));
        assert_eq!(frame.get_pixel(12, 5)[3], 0);
        // colour is kept under a transparent pixel (straight alpha)
        assert_eq!(frame.get_pixel(12, 5)[0], 120);
    }

    #[test]
    fn test_source_in_scales_translucent_source() {
        assert_eq!(source_in(255, 128), 128);
        assert_eq!(source_in(128, 255), 128);
        assert_eq!(source_in(128, 128), 64);
        assert_eq!(source_in(0, 255), 0);
    }

    #[test]
    fn test_encode_png_round_trips() {
        let frame = composite(
            &checker_source(),
            &half_mask(),
            CompositeFlags {
                cutout: true,
                compare: false,
            },
        );
        let bytes = encode_png(&frame).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded, frame);
    }
}
