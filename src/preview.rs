use crate::builder::RenderedImage;
use image::RgbaImage;
use image::imageops::{self, FilterType};

/// Side of the square canvas previews are fitted into.
pub const MAX_PREVIEW: u32 = 512;

/// A downscaled copy of a rendered image, ready to show.
#[derive(Debug, Clone)]
pub struct Preview {
    pub thumbnail: RgbaImage,
    pub source_width: u32,
    pub source_height: u32,
}

impl Preview {
    /// Fits `rendered` into a `max_side` square with Lanczos filtering.
    pub fn of(rendered: &RenderedImage, max_side: u32) -> Preview {
        Preview::fitted(&rendered.image, max_side, max_side, FilterType::Lanczos3)
    }

    pub fn fitted(image: &RgbaImage, max_width: u32, max_height: u32, filter: FilterType) -> Preview {
        let (width, height) = image.dimensions();
        let (fit_width, fit_height) = fit_within(width, height, max_width, max_height);

        let thumbnail = if (fit_width, fit_height) == (width, height) {
            image.clone()
        } else {
            imageops::resize(image, fit_width, fit_height, filter)
        };

        Preview {
            thumbnail,
            source_width: width,
            source_height: height,
        }
    }

    /// Dimensions of the full size image, e.g. `230×230 px`.
    pub fn label(&self) -> String {
        format!("{}×{} px", self.source_width, self.source_height)
    }
}

/// Scales `(width, height)` down to fit the bounds, never up.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }

    let scale = (max_width as f64 / width as f64)
        .min(max_height as f64 / height as f64)
        .min(1.0);

    let fitted = |side: u32| ((side as f64 * scale) as u32).max(1);
    (fitted(width), fitted(height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use crate::request::QrRequest;

    #[test]
    fn test_fit_within() {
        assert_eq!(fit_within(230, 230, 512, 512), (230, 230));
        assert_eq!(fit_within(1024, 1024, 512, 512), (512, 512));
        assert_eq!(fit_within(1000, 500, 512, 512), (512, 256));
        assert_eq!(fit_within(700, 700, 100, 50), (50, 50));
        assert_eq!(fit_within(5000, 1, 10, 10), (10, 1));
        assert_eq!(fit_within(0, 0, 10, 10), (0, 0));
    }

    #[test]
    fn test_small_image_is_not_scaled() {
        let rendered = build(&QrRequest::new("HELLO")).unwrap();
        let preview = Preview::of(&rendered, MAX_PREVIEW);

        assert_eq!(preview.thumbnail, rendered.image);
        assert_eq!(preview.label(), "230×230 px");
    }

    #[test]
    fn test_large_image_is_scaled_down() {
        let rendered = build(&QrRequest::new("HELLO").with_module_size(40).with_border(40))
            .unwrap();
        assert_eq!(rendered.width(), 920);

        let preview = Preview::of(&rendered, MAX_PREVIEW);
        assert_eq!(preview.thumbnail.dimensions(), (512, 512));
        assert_eq!(preview.label(), "920×920 px");
    }

    #[test]
    fn test_nearest_keeps_module_colors() {
        let rendered = build(&QrRequest::new("HELLO")).unwrap();
        let preview = Preview::fitted(&rendered.image, 46, 46, FilterType::Nearest);

        assert_eq!(preview.thumbnail.dimensions(), (46, 46));
        for pixel in preview.thumbnail.pixels() {
            assert!(pixel.0 == [0, 0, 0, 255] || pixel.0 == [255, 255, 255, 255]);
        }
    }
}
