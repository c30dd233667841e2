use csscolorparser::Color;
use image::Rgb;

pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Fallback used when a custom fill color is empty or cannot be parsed.
pub const DEFAULT_FILL: Rgb<u8> = BLACK;

/// Fallback used when a custom background color is empty or cannot be parsed.
pub const DEFAULT_BACKGROUND: Rgb<u8> = WHITE;

/// Color of the dark modules.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FillColor {
    #[default]
    Black,
    White,
    /// Any CSS color string (`#ff0000`, `red`, `rgb(255, 0, 0)`, ...).
    Custom(String),
}

/// Color of the light modules and the border.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Background {
    #[default]
    White,
    Black,
    Custom(String),
    /// Rendered as white, then every pure white pixel is made transparent.
    Transparent,
}

impl FillColor {
    pub fn resolve(&self) -> Rgb<u8> {
        match self {
            FillColor::Black => BLACK,
            FillColor::White => WHITE,
            FillColor::Custom(css) => parse_rgb(css).unwrap_or(DEFAULT_FILL),
        }
    }
}

impl Background {
    pub fn resolve(&self) -> Rgb<u8> {
        match self {
            Background::White | Background::Transparent => WHITE,
            Background::Black => BLACK,
            Background::Custom(css) => parse_rgb(css).unwrap_or(DEFAULT_BACKGROUND),
        }
    }

    pub fn is_transparent(&self) -> bool {
        matches!(self, Background::Transparent)
    }
}

// Alpha in the color string is ignored, the rendered image decides opacity.
fn parse_rgb(css: &str) -> Option<Rgb<u8>> {
    let css = css.trim();
    if css.is_empty() {
        return None;
    }

    let color = css.parse::<Color>().ok()?;
    let [r, g, b, _] = color.to_rgba8();
    Some(Rgb([r, g, b]))
}

/// Formats a color as lowercase `#rrggbb`.
pub fn to_hex(color: Rgb<u8>) -> String {
    let Rgb([r, g, b]) = color;
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_literals() {
        assert_eq!(FillColor::Black.resolve(), BLACK);
        assert_eq!(FillColor::White.resolve(), WHITE);
    }

    #[test]
    fn test_custom_fill_formats() {
        assert_eq!(FillColor::Custom("#ff0000".into()).resolve(), Rgb([255, 0, 0]));
        assert_eq!(FillColor::Custom("navy".into()).resolve(), Rgb([0, 0, 128]));
        assert_eq!(
            FillColor::Custom(" rgb(1, 2, 3) ".into()).resolve(),
            Rgb([1, 2, 3])
        );
    }

    #[test]
    fn test_custom_fill_fallback() {
        assert_eq!(FillColor::Custom("".into()).resolve(), DEFAULT_FILL);
        assert_eq!(FillColor::Custom("not a color".into()).resolve(), DEFAULT_FILL);
    }

    #[test]
    fn test_background_resolution() {
        assert_eq!(Background::White.resolve(), WHITE);
        assert_eq!(Background::Black.resolve(), BLACK);
        assert_eq!(Background::Transparent.resolve(), WHITE);
        assert_eq!(Background::Custom("#00ff00".into()).resolve(), Rgb([0, 255, 0]));
        assert_eq!(Background::Custom("".into()).resolve(), DEFAULT_BACKGROUND);
        assert_eq!(Background::Custom("#zzzzzz".into()).resolve(), DEFAULT_BACKGROUND);
    }

    #[test]
    fn test_custom_alpha_is_dropped() {
        assert_eq!(
            Background::Custom("#11223380".into()).resolve(),
            Rgb([0x11, 0x22, 0x33])
        );
    }

    #[test]
    fn test_transparent_flag() {
        assert!(Background::Transparent.is_transparent());
        assert!(!Background::White.is_transparent());
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex(Rgb([255, 16, 0])), "#ff1000");
    }
}
