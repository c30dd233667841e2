use crate::builder::{RenderedImage, build};
use crate::error::Result;
use crate::export::{ExportTarget, export};
use crate::preview::Preview;
use crate::request::QrRequest;
use std::fmt;
use std::path::PathBuf;

// Supplies the parameters of the current user action. Whatever UI drives
// the core implements this, nothing in the core reads UI state directly.
pub trait RequestSource {
    fn qr_request(&self) -> Result<QrRequest>;

    fn export_target(&self) -> Result<ExportTarget>;
}

// Receives everything an action wants to show the user.
pub trait StatusSink {
    fn show_preview(&mut self, preview: Preview);

    fn report(&mut self, status: Status);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Saved(PathBuf),
    Failed { title: &'static str, message: String },
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Saved(path) => write!(f, "QR saved: {}", path.display()),
            Status::Failed { title, message } => write!(f, "{}: {}", title, message),
        }
    }
}

fn failed(title: &'static str, err: impl fmt::Display) -> Status {
    Status::Failed {
        title,
        message: err.to_string(),
    }
}

fn log_built(rendered: &RenderedImage) {
    tracing::debug!(
        width = rendered.width(),
        height = rendered.height(),
        symbol_modules = rendered.symbol_modules,
        border_modules = rendered.border_modules,
        module_size_px = rendered.module_size_px,
        "qr image built"
    );
}

/// Builds the image and hands a preview of it to the sink.
pub fn preview_action<S, K>(source: &S, sink: &mut K, max_side: u32)
where
    S: RequestSource + ?Sized,
    K: StatusSink + ?Sized,
{
    let rendered = match source.qr_request().and_then(|request| build(&request)) {
        Ok(rendered) => rendered,
        Err(err) => {
            tracing::warn!(%err, "preview failed");
            return sink.report(failed("Preview Error", err));
        }
    };

    log_built(&rendered);
    sink.show_preview(Preview::of(&rendered, max_side));
}

/// Builds the image and writes it to the source's export target.
pub fn generate_action<S, K>(source: &S, sink: &mut K)
where
    S: RequestSource + ?Sized,
    K: StatusSink + ?Sized,
{
    let built = source
        .qr_request()
        .and_then(|request| build(&request).map(|rendered| (request, rendered)));

    let (request, rendered) = match built {
        Ok(built) => built,
        Err(err) => {
            tracing::warn!(%err, "generate failed");
            return sink.report(failed("Error", err));
        }
    };

    log_built(&rendered);

    let target = match source.export_target() {
        Ok(target) => target,
        Err(err) => {
            tracing::warn!(%err, "no usable export target");
            return sink.report(failed("Error", err));
        }
    };

    match export(&request, &rendered, &target) {
        Ok(()) => {
            tracing::info!(path = %target.path.display(), "qr code saved");
            sink.report(Status::Saved(target.path));
        }
        Err(err) => {
            tracing::warn!(%err, "export failed");
            sink.report(failed("Save Error", err));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ExportError};
    use crate::export::ExportFormat;
    use crate::preview::MAX_PREVIEW;
    use tempfile::tempdir;

    struct Fixture {
        request: QrRequest,
        path: String,
        format: &'static str,
    }

    impl RequestSource for Fixture {
        fn qr_request(&self) -> Result<QrRequest> {
            Ok(self.request.clone())
        }

        fn export_target(&self) -> Result<ExportTarget> {
            Ok(ExportTarget::parse(&self.path, self.format)?)
        }
    }

    #[derive(Default)]
    struct Recorder {
        previews: Vec<Preview>,
        statuses: Vec<Status>,
    }

    impl StatusSink for Recorder {
        fn show_preview(&mut self, preview: Preview) {
            self.previews.push(preview);
        }

        fn report(&mut self, status: Status) {
            self.statuses.push(status);
        }
    }

    fn fixture(payload: &str, path: String) -> Fixture {
        Fixture {
            request: QrRequest::new(payload),
            path,
            format: "png",
        }
    }

    #[test]
    fn test_preview() {
        let mut sink = Recorder::default();
        preview_action(&fixture("HELLO", String::new()), &mut sink, MAX_PREVIEW);

        assert!(sink.statuses.is_empty());
        assert_eq!(sink.previews.len(), 1);
        assert_eq!(sink.previews[0].label(), "230×230 px");
    }

    #[test]
    fn test_preview_error() {
        let mut sink = Recorder::default();
        preview_action(&fixture("", String::new()), &mut sink, MAX_PREVIEW);

        assert!(sink.previews.is_empty());
        assert_eq!(
            sink.statuses,
            vec![Status::Failed {
                title: "Preview Error",
                message: "Enter text or URL.".to_string(),
            }]
        );
    }

    #[test]
    fn test_generate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("code.png");

        let mut sink = Recorder::default();
        generate_action(&fixture("HELLO", path.to_string_lossy().into_owned()), &mut sink);

        assert_eq!(sink.statuses, vec![Status::Saved(path.clone())]);
        assert!(path.exists());
    }

    #[test]
    fn test_generate_validation_error() {
        let mut sink = Recorder::default();
        let mut source = fixture("HELLO", "code.png".to_string());
        source.request.module_size_px = 0;
        generate_action(&source, &mut sink);

        assert_eq!(
            sink.statuses,
            vec![Status::Failed {
                title: "Error",
                message: "Module size must be at least 1 px.".to_string(),
            }]
        );
    }

    #[test]
    fn test_generate_missing_path() {
        let mut sink = Recorder::default();
        generate_action(&fixture("HELLO", "  ".to_string()), &mut sink);

        assert_eq!(
            sink.statuses,
            vec![Status::Failed {
                title: "Error",
                message: "Select an output file.".to_string(),
            }]
        );
    }

    #[test]
    fn test_generate_save_error_keeps_going() {
        let dir = tempdir().unwrap();
        let bad = dir.path().join("missing").join("code.png");
        let good = dir.path().join("code.png");

        let mut sink = Recorder::default();
        generate_action(&fixture("HELLO", bad.to_string_lossy().into_owned()), &mut sink);
        generate_action(&fixture("HELLO", good.to_string_lossy().into_owned()), &mut sink);

        assert_eq!(sink.statuses.len(), 2);
        assert!(matches!(
            &sink.statuses[0],
            Status::Failed { title: "Save Error", .. }
        ));
        assert_eq!(sink.statuses[1], Status::Saved(good));
    }

    #[test]
    fn test_unsupported_format() {
        let mut source = fixture("HELLO", "code.gif".to_string());
        source.format = "gif";
        let err = source.export_target().unwrap_err();
        assert!(matches!(err, Error::Export(ExportError::UnsupportedFormat(_))));

        let mut sink = Recorder::default();
        generate_action(&source, &mut sink);
        assert_eq!(sink.statuses[0].to_string(), "Error: Unsupported format: gif");
    }

    #[test]
    fn test_status_display() {
        let status = Status::Saved(PathBuf::from(format!("qr.{}", ExportFormat::Svg)));
        assert_eq!(status.to_string(), "QR saved: qr.svg");
    }
}
