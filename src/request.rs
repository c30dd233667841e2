use crate::color::{Background, FillColor};
use crate::error::{Error, Result};

pub const DEFAULT_MODULE_SIZE_PX: i64 = 10;
pub const DEFAULT_BORDER_PX: i64 = 10;

/// Everything the image builder needs for one QR image.
///
/// Sizes are signed so that a caller passing a negative value gets a
/// validation error from `builder::build` instead of a wrapped-around size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrRequest {
    pub payload: String,
    pub fill: FillColor,
    pub background: Background,
    pub module_size_px: i64,
    pub border_px: i64,
}

impl QrRequest {
    pub fn new(payload: impl Into<String>) -> Self {
        QrRequest {
            payload: payload.into(),
            fill: FillColor::default(),
            background: Background::default(),
            module_size_px: DEFAULT_MODULE_SIZE_PX,
            border_px: DEFAULT_BORDER_PX,
        }
    }

    pub fn with_fill(mut self, fill: FillColor) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_background(mut self, background: Background) -> Self {
        self.background = background;
        self
    }

    pub fn with_module_size(mut self, px: i64) -> Self {
        self.module_size_px = px;
        self
    }

    pub fn with_border(mut self, px: i64) -> Self {
        self.border_px = px;
        self
    }
}

/// The raw values a form collects, before any parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFields {
    pub text: String,
    pub fill_choice: String,
    pub custom_fill: String,
    pub background_choice: String,
    pub custom_background: String,
    pub module_size: String,
    pub border: String,
}

impl Default for FormFields {
    fn default() -> Self {
        FormFields {
            text: String::new(),
            fill_choice: "black".to_string(),
            custom_fill: "#000000".to_string(),
            background_choice: "white".to_string(),
            custom_background: "#ffffff".to_string(),
            module_size: DEFAULT_MODULE_SIZE_PX.to_string(),
            border: DEFAULT_BORDER_PX.to_string(),
        }
    }
}

impl FormFields {
    /// Parses the fields into a request. Each size is range checked right
    /// after it parses, so the first bad field is the one reported.
    pub fn to_request(&self) -> Result<QrRequest> {
        let payload = self.text.trim();
        if payload.is_empty() {
            return Err(Error::validation("Enter text or URL."));
        }

        let module_size_px = self
            .module_size
            .trim()
            .parse::<i64>()
            .map_err(|_| Error::validation("Module size must be an integer."))?;
        if module_size_px < 1 {
            return Err(Error::validation("Module size must be at least 1 px."));
        }

        let border_px = self
            .border
            .trim()
            .parse::<i64>()
            .map_err(|_| Error::validation("Border must be an integer."))?;
        if border_px < 0 {
            return Err(Error::validation("Border cannot be negative."));
        }

        let fill = match self.fill_choice.as_str() {
            "white" => FillColor::White,
            "custom" => FillColor::Custom(self.custom_fill.clone()),
            _ => FillColor::Black,
        };

        let background = match self.background_choice.as_str() {
            "black" => Background::Black,
            "custom" => Background::Custom(self.custom_background.clone()),
            "transparent" => Background::Transparent,
            _ => Background::White,
        };

        Ok(QrRequest::new(payload)
            .with_fill(fill)
            .with_background(background)
            .with_module_size(module_size_px)
            .with_border(border_px))
    }
}
