use crate::builder::{RenderedImage, Symbol};
use crate::color::to_hex;
use crate::error::{ExportError, Result};
use crate::request::QrRequest;
use image::{DynamicImage, ImageError, ImageFormat};
use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Png,
    Jpg,
    Svg,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Png, ExportFormat::Jpg, ExportFormat::Svg];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpg => "jpg",
            ExportFormat::Svg => "svg",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpg),
            "svg" => Ok(ExportFormat::Svg),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Where and how a single export is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTarget {
    pub path: PathBuf,
    pub format: ExportFormat,
}

impl ExportTarget {
    pub fn new(path: impl Into<PathBuf>, format: ExportFormat) -> Self {
        ExportTarget {
            path: path.into(),
            format,
        }
    }

    /// Builds a target from the raw strings of a form.
    pub fn parse(path: &str, format: &str) -> std::result::Result<Self, ExportError> {
        let path = path.trim();
        if path.is_empty() {
            return Err(ExportError::MissingPath);
        }

        Ok(ExportTarget::new(path, format.parse()?))
    }

    pub fn default_path(format: ExportFormat) -> PathBuf {
        PathBuf::from(format!("qrcode.{}", format.extension()))
    }
}

/// Swaps the extension of `path` for the one of `format`. An empty path
/// stays empty.
pub fn retarget_path(path: &str, format: ExportFormat) -> String {
    if path.is_empty() {
        return String::new();
    }

    Path::new(path)
        .with_extension(format.extension())
        .to_string_lossy()
        .into_owned()
}

/// Writes the QR code to `target`.
///
/// Raster formats are written from `rendered`. SVG is regenerated from
/// `request` so that the output stays vector, with the same colors, border
/// and module size as the raster.
pub fn export(request: &QrRequest, rendered: &RenderedImage, target: &ExportTarget) -> Result<()> {
    if target.path.as_os_str().is_empty() {
        return Err(ExportError::MissingPath.into());
    }

    tracing::info!(path = %target.path.display(), format = %target.format, "exporting qr code");

    match target.format {
        ExportFormat::Png => {
            save_raster(&DynamicImage::ImageRgba8(rendered.image.clone()), target)
        }
        ExportFormat::Jpg => {
            // JPEG has no alpha. Transparent pixels keep the RGB they were
            // rendered with, which is the resolved background.
            let flat = DynamicImage::ImageRgba8(rendered.image.clone()).to_rgb8();
            save_raster(&DynamicImage::ImageRgb8(flat), target)
        }
        ExportFormat::Svg => {
            let svg = render_svg(&Symbol::from_request(request)?);
            std::fs::write(&target.path, svg).map_err(|source| ExportError::Io {
                path: target.path.clone(),
                source,
            })?;
            Ok(())
        }
    }
}

fn save_raster(image: &DynamicImage, target: &ExportTarget) -> Result<()> {
    let format = match target.format {
        ExportFormat::Png => ImageFormat::Png,
        ExportFormat::Jpg => ImageFormat::Jpeg,
        ExportFormat::Svg => {
            return Err(ExportError::UnsupportedFormat(target.format.to_string()).into());
        }
    };

    image
        .save_with_format(&target.path, format)
        .map_err(|e| match e {
            ImageError::IoError(source) => ExportError::Io {
                path: target.path.clone(),
                source,
            },
            source => ExportError::Encode {
                path: target.path.clone(),
                source,
            },
        })?;

    Ok(())
}

/// Renders the symbol as an SVG document. Coordinates are in modules, the
/// width and height attributes scale them to the requested pixel size.
pub fn render_svg(symbol: &Symbol) -> String {
    let side = symbol.side_modules();
    let side_px = symbol.side_px();

    let mut svg = String::new();
    svg.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{px}" height="{px}" viewBox="0 0 {side} {side}" shape-rendering="crispEdges">"#,
        px = side_px,
        side = side,
    );

    if !symbol.transparent {
        let _ = writeln!(
            svg,
            r#"<rect width="{side}" height="{side}" fill="{}"/>"#,
            to_hex(symbol.background),
        );
    }

    // One subpath per horizontal run of dark modules.
    let mut path = String::new();
    for y in 0..side {
        let mut x = 0;
        while x < side {
            if !symbol.is_dark(x, y) {
                x += 1;
                continue;
            }

            let start = x;
            while x < side && symbol.is_dark(x, y) {
                x += 1;
            }

            let run = x - start;
            let _ = write!(path, "M{},{}h{}v1h-{}z", start, y, run, run);
        }
    }

    // The raster masks a fill that equals the transparent background, so
    // the vector output draws nothing either.
    let masked = symbol.transparent && symbol.fill == symbol.background;
    if !masked {
        let _ = writeln!(svg, r#"<path fill="{}" d="{}"/>"#, to_hex(symbol.fill), path);
    }
    svg.push_str("</svg>\n");
    svg
}
