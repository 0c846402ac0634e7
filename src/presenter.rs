use anyhow::{Context, Result};

use crate::controller::{RequestStatus, ToolController};
use crate::error::ToolError;
use crate::tools::{ToolSpec, NO_OUTPUT_MARKER};

pub const SUCCESS_MARKER: &str = "✅";
pub const FAILURE_MARKER: &str = "❌";
pub const COPY_MARKER: &str = "📋";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Display {
    /// Content of the output panel.
    pub body: String,
    /// One-line feedback shown above the panels.
    pub status_line: Option<String>,
}

pub fn present(controller: &ToolController) -> Display {
    render(
        controller.tool(),
        controller.status(),
        controller.result_text(),
        controller.status_message(),
        controller.notice(),
    )
}

pub fn render(
    tool: &ToolSpec,
    status: RequestStatus,
    result_text: &str,
    status_message: &str,
    notice: Option<&str>,
) -> Display {
    let (body, status_line) = match status {
        RequestStatus::Idle => (tool.placeholder.to_string(), None),
        RequestStatus::Pending => (tool.progress.to_string(), None),
        RequestStatus::Success => {
            let body = if result_text.is_empty() {
                NO_OUTPUT_MARKER.to_string()
            } else {
                result_text.to_string()
            };
            let line = (!status_message.is_empty())
                .then(|| format!("{} {}", SUCCESS_MARKER, status_message));
            (body, line)
        }
        RequestStatus::Failed => {
            let failure = format!("{} {}", FAILURE_MARKER, status_message);
            (failure.clone(), Some(failure))
        }
    };

    Display {
        body,
        status_line: notice.map(str::to_string).or(status_line),
    }
}

/// User-facing wording for an error, in the tool's own voice.
pub fn describe_error(tool: &ToolSpec, error: &ToolError) -> String {
    match error {
        ToolError::EmptyInput => tool.empty_input_message.to_string(),
        ToolError::ServiceNotReady => tool.not_ready_message.to_string(),
        ToolError::ServiceError(message) => format!("Error: {}", message),
        ToolError::ClipboardError(message) => message.clone(),
    }
}

pub trait ClipboardSink {
    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// The desktop clipboard. The handle is opened on first use and kept, some
/// platforms drop the contents when the last handle goes away.
#[derive(Default)]
pub struct SystemClipboard {
    handle: Option<arboard::Clipboard>,
}

impl ClipboardSink for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<()> {
        if self.handle.is_none() {
            self.handle = Some(arboard::Clipboard::new().context("clipboard unavailable")?);
        }
        match self.handle.as_mut() {
            Some(clipboard) => clipboard
                .set_text(text.to_string())
                .context("clipboard write failed"),
            None => Ok(()),
        }
    }
}

pub fn copy_to_clipboard(
    text: &str,
    placeholder: &str,
    clipboard: &mut dyn ClipboardSink,
) -> Result<&'static str, ToolError> {
    if text.trim().is_empty() || text == placeholder {
        return Err(ToolError::ClipboardError("Nothing to copy!".to_string()));
    }

    clipboard.write_text(text).map_err(|e| {
        tracing::warn!(error = %e, "copy to clipboard failed");
        ToolError::ClipboardError(format!("Could not copy: {:#}", e))
    })?;

    Ok("Copied to clipboard!")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolKind;
    use anyhow::anyhow;

    struct Sink {
        writes: usize,
        result: fn() -> Result<()>,
    }

    impl ClipboardSink for Sink {
        fn write_text(&mut self, _text: &str) -> Result<()> {
            self.writes += 1;
            (self.result)()
        }
    }

    fn ok_sink() -> Sink {
        Sink {
            writes: 0,
            result: || Ok(()),
        }
    }

    #[test]
    fn idle_shows_tool_placeholder() {
        for kind in ToolKind::ALL {
            let spec = kind.spec();
            let display = render(spec, RequestStatus::Idle, "", "", None);
            assert_eq!(display.body, spec.placeholder);
            assert_eq!(display.status_line, None);
        }
    }

    #[test]
    fn pending_shows_progress_marker() {
        let spec = ToolKind::TimeComplexity.spec();
        let display = render(spec, RequestStatus::Pending, "", "", None);
        assert_eq!(display.body, "🔄 Analyzing time complexity...");
    }

    #[test]
    fn success_preserves_layout() {
        let spec = ToolKind::Explainer.spec();
        let text = "Line one\n\n    indented\nlast";
        let display = render(spec, RequestStatus::Success, text, "", None);
        assert_eq!(display.body, text);
        assert_eq!(display.status_line, None);
    }

    #[test]
    fn empty_success_shows_no_output_marker() {
        let spec = ToolKind::Compiler.spec();
        let display = render(spec, RequestStatus::Success, "", "", None);
        assert_eq!(display.body, NO_OUTPUT_MARKER);
    }

    #[test]
    fn failure_is_prefixed() {
        let spec = ToolKind::Compiler.spec();
        let display = render(spec, RequestStatus::Failed, "", "AI compiler not ready yet", None);
        assert_eq!(display.body, "❌ AI compiler not ready yet");
        assert_eq!(display.status_line.as_deref(), Some("❌ AI compiler not ready yet"));
    }

    #[test]
    fn notice_replaces_status_line() {
        let spec = ToolKind::Converter.spec();
        let display = render(
            spec,
            RequestStatus::Success,
            "code",
            "Successfully converted!",
            Some("📋 Copied to clipboard!"),
        );
        assert_eq!(display.body, "code");
        assert_eq!(display.status_line.as_deref(), Some("📋 Copied to clipboard!"));
    }

    #[test]
    fn describe_uses_tool_wording() {
        let converter = ToolKind::Converter.spec();
        assert_eq!(
            describe_error(converter, &ToolError::EmptyInput),
            "Please enter some code to convert"
        );
        assert_eq!(
            describe_error(converter, &ToolError::ServiceNotReady),
            "AI is getting ready... Please wait a moment"
        );
        assert_eq!(
            describe_error(converter, &ToolError::ServiceError("boom".into())),
            "Error: boom"
        );
    }

    #[test]
    fn copy_rejects_placeholder_and_blank() {
        let placeholder = ToolKind::Converter.spec().placeholder;
        let mut sink = ok_sink();
        for text in [placeholder, "", "  \n"] {
            assert_eq!(
                copy_to_clipboard(text, placeholder, &mut sink),
                Err(ToolError::ClipboardError("Nothing to copy!".to_string()))
            );
        }
        assert_eq!(sink.writes, 0);
    }

    #[test]
    fn copy_writes_text() {
        let mut sink = ok_sink();
        assert_eq!(
            copy_to_clipboard("print(1)", "placeholder", &mut sink),
            Ok("Copied to clipboard!")
        );
        assert_eq!(sink.writes, 1);
    }

    #[test]
    fn copy_reports_write_failure() {
        let mut sink = Sink {
            writes: 0,
            result: || Err(anyhow!("no display")),
        };
        assert_eq!(
            copy_to_clipboard("print(1)", "placeholder", &mut sink),
            Err(ToolError::ClipboardError("Could not copy: no display".to_string()))
        );
        assert_eq!(sink.writes, 1);
    }
}
