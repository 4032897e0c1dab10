// Copying the rendered output to the system clipboard

use anyhow::{Context, Result};

pub const INITIAL_PLACEHOLDER: &str = "Your generated response will appear here...";

#[cfg_attr(test, mockall::automock)]
pub trait ClipboardWriter {
    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// System clipboard through arboard. The handle is opened on first use.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipboardWriter for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<()> {
        let mut clipboard = match self.inner.take() {
            Some(clipboard) => clipboard,
            None => arboard::Clipboard::new().context("Failed to open clipboard")?,
        };
        let result = clipboard
            .set_text(text.to_string())
            .context("Failed to write clipboard");
        self.inner = Some(clipboard);
        result
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied,
    /// Nothing worth copying yet
    Skipped,
    Failed,
}

/// Copy `visible_text` unless it is empty or still the initial placeholder.
/// Failures are logged and otherwise ignored.
pub fn copy_output(clipboard: &mut dyn ClipboardWriter, visible_text: &str) -> CopyOutcome {
    if visible_text.is_empty() || visible_text == INITIAL_PLACEHOLDER {
        return CopyOutcome::Skipped;
    }

    match clipboard.write_text(visible_text) {
        Ok(()) => {
            log::info!("Copied {} characters to clipboard", visible_text.chars().count());
            CopyOutcome::Copied
        }
        Err(e) => {
            log::error!("Failed to copy text: {e:#}");
            CopyOutcome::Failed
        }
    }
}
