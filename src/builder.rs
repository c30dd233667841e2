use crate::error::{Error, Result};
use crate::request::QrRequest;
use image::{Rgb, Rgba, RgbaImage};
use qrcode::types::QrError;
use qrcode::{EcLevel, QrCode};

/// Largest width/height of a rendered image, in pixels.
pub const MAX_IMAGE_SIDE: u32 = 8_192;

/// Error correction level used for every symbol.
pub const EC_LEVEL: EcLevel = EcLevel::M;

/// A QR raster with the layout it was drawn from.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub image: RgbaImage,
    /// Modules per side of the encoded symbol, without the border.
    pub symbol_modules: u32,
    pub border_modules: u32,
    pub module_size_px: u32,
}

impl RenderedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// An encoded symbol together with the resolved drawing parameters.
/// Shared by the raster builder and the vector export.
pub struct Symbol {
    pub code: QrCode,
    pub border_modules: u32,
    pub module_size_px: u32,
    pub fill: Rgb<u8>,
    pub background: Rgb<u8>,
    pub transparent: bool,
}

impl Symbol {
    pub fn from_request(request: &QrRequest) -> Result<Symbol> {
        let payload = request.payload.trim();
        if payload.is_empty() {
            return Err(Error::validation("Enter text or URL."));
        }
        if request.module_size_px < 1 {
            return Err(Error::validation("Module size must be at least 1 px."));
        }
        if request.border_px < 0 {
            return Err(Error::validation("Border cannot be negative."));
        }

        let too_large = || Error::validation("QR image would be too large.");

        let module_size_px = u32::try_from(request.module_size_px).map_err(|_| too_large())?;
        let border_modules = border_in_modules(request.border_px as u64, module_size_px as u64);
        let border_modules = u32::try_from(border_modules).map_err(|_| too_large())?;

        let code = QrCode::with_error_correction_level(payload, EC_LEVEL).map_err(|e| match e {
            QrError::DataTooLong => Error::validation("Text is too long to fit in a QR code."),
            other => Error::validation(format!("Could not encode QR code: {}", other)),
        })?;

        let symbol = Symbol {
            code,
            border_modules,
            module_size_px,
            fill: request.fill.resolve(),
            background: request.background.resolve(),
            transparent: request.background.is_transparent(),
        };

        match symbol.checked_side_px() {
            Some(side) if side <= MAX_IMAGE_SIDE => Ok(symbol),
            _ => Err(too_large()),
        }
    }

    pub fn symbol_modules(&self) -> u32 {
        self.code.width() as u32
    }

    /// Modules per side including the border on both edges.
    pub fn side_modules(&self) -> u32 {
        self.symbol_modules() + 2 * self.border_modules
    }

    /// Only valid on a symbol that came out of `from_request`.
    pub fn side_px(&self) -> u32 {
        self.side_modules() * self.module_size_px
    }

    fn checked_side_px(&self) -> Option<u32> {
        self.border_modules
            .checked_mul(2)?
            .checked_add(self.symbol_modules())?
            .checked_mul(self.module_size_px)
    }

    /// Whether the module at `(x, y)` is dark. Coordinates count the border,
    /// so `(0, 0)` is the top left border module.
    pub fn is_dark(&self, x: u32, y: u32) -> bool {
        let width = self.symbol_modules();
        let (Some(x), Some(y)) = (
            x.checked_sub(self.border_modules),
            y.checked_sub(self.border_modules),
        ) else {
            return false;
        };

        if x >= width || y >= width {
            return false;
        }

        self.code[(x as usize, y as usize)] == qrcode::Color::Dark
    }
}

/// Converts the border from pixels to whole modules, rounding to the nearest
/// module. Exact halves round to the even neighbour, so 15px at 10px modules
/// is 2 modules and 25px is also 2.
pub fn border_in_modules(border_px: u64, module_size_px: u64) -> u64 {
    let quotient = border_px / module_size_px;
    let remainder = border_px % module_size_px;

    match (remainder * 2).cmp(&module_size_px) {
        std::cmp::Ordering::Less => quotient,
        std::cmp::Ordering::Greater => quotient + 1,
        std::cmp::Ordering::Equal => quotient + quotient % 2,
    }
}

/// Builds the RGBA raster for a request.
pub fn build(request: &QrRequest) -> Result<RenderedImage> {
    let symbol = Symbol::from_request(request)?;
    let side = symbol.side_px();
    let module = symbol.module_size_px;

    tracing::debug!(
        symbol_modules = symbol.symbol_modules(),
        border_modules = symbol.border_modules,
        module_size_px = module,
        side,
        "building qr image"
    );

    let Rgb([fr, fg, fb]) = symbol.fill;
    let Rgb([br, bg, bb]) = symbol.background;
    let fill = Rgba([fr, fg, fb, 255]);
    let background = Rgba([br, bg, bb, 255]);

    let mut image = RgbaImage::from_fn(side, side, |x, y| {
        if symbol.is_dark(x / module, y / module) {
            fill
        } else {
            background
        }
    });

    // Exact color match on purpose: anything that is pixel-identical to the
    // background turns transparent, wherever it came from.
    if symbol.transparent {
        for pixel in image.pixels_mut() {
            if pixel.0[..3] == symbol.background.0 {
                pixel.0[3] = 0;
            }
        }
    }

    Ok(RenderedImage {
        image,
        symbol_modules: symbol.symbol_modules(),
        border_modules: symbol.border_modules,
        module_size_px: module,
    })
}
