// Event types for async communication

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::media::ImageAttachment;
use crate::render::RenderSink;

#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The API accepted a submission and started streaming
    ResponseStarted { submission: Uuid },
    /// The full response accumulated so far for a submission
    ResponseUpdated { submission: Uuid, markdown: String },
    /// The stream for a submission ended normally
    ResponseDone { submission: Uuid },
    /// A submission failed
    GenerationFailed { submission: Uuid, message: String },
    /// An image finished loading from the image field
    ImageLoaded { request: Uuid, image: ImageAttachment },
    /// An image could not be loaded
    ImageFailed { request: Uuid, message: String },
}

/// Forwards every render of a submission to the UI loop.
pub struct ChannelSink {
    submission: Uuid,
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl ChannelSink {
    pub const fn new(submission: Uuid, tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self { submission, tx }
    }
}

impl RenderSink for ChannelSink {
    fn render(&mut self, markdown: &str) {
        // The receiver only goes away on shutdown
        let _ = self.tx.send(AppEvent::ResponseUpdated {
            submission: self.submission,
            markdown: markdown.to_string(),
        });
    }
}
