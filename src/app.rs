use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::api::GenerationRequest;
use crate::clipboard::{self, ClipboardWriter, CopyOutcome, INITIAL_PLACEHOLDER};
use crate::events::AppEvent;
use crate::media::ImageAttachment;
use crate::models::AppConfig;
use crate::prompt::{self, Feature};
use crate::render::RenderSink;
use crate::ui::markdown::MarkdownView;

pub const EMPTY_INPUT_MESSAGE: &str = "Please enter text or upload an image first.";
pub const COPY_LABEL: &str = "Copy";
pub const COPIED_LABEL: &str = "Copied!";
pub const COPY_ACK_DURATION: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Prompt,
    ImagePath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationState {
    Idle,
    /// Request sent, no response yet
    Waiting,
    Streaming,
    Errored(String),
}

impl GenerationState {
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Waiting | Self::Streaming)
    }
}

/// What the output pane currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Placeholder(String),
    Response,
    Error(String),
}

/// One generation request and the id its events carry.
#[derive(Debug, Clone)]
pub struct Submission {
    pub id: Uuid,
    pub request: GenerationRequest,
}

/// A path or data URL to load, and the id its result event carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub id: Uuid,
    pub input: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejected {
    EmptyInput,
    Busy,
}

#[derive(Debug)]
pub struct App {
    pub should_quit: bool,
    pub show_help: bool,
    pub exit_pending: bool,
    pub focus: Focus,
    pub input_buffer: String,
    pub image_input: String,
    pub image: Option<ImageAttachment>,
    pub image_loading: bool,
    pub pending_image: Option<Uuid>,
    pub image_error: Option<String>,
    pub feature: Feature,
    pub languages: Vec<String>,
    pub language_index: usize,
    pub model: String,
    pub output: Output,
    pub view: MarkdownView,
    pub state: GenerationState,
    pub active_submission: Option<Uuid>,
    pub status_message: Option<String>,
    pub scroll_offset: usize,
    pub copy_ack_until: Option<Instant>,
}

impl App {
    pub fn new(config: &AppConfig) -> Self {
        let languages = config.language_choices();
        let language_index = languages
            .iter()
            .position(|l| *l == config.default_language)
            .unwrap_or(0);

        Self {
            should_quit: false,
            show_help: false,
            exit_pending: false,
            focus: Focus::Prompt,
            input_buffer: String::new(),
            image_input: String::new(),
            image: None,
            image_loading: false,
            pending_image: None,
            image_error: None,
            feature: config.initial_feature(),
            languages,
            language_index,
            model: config.model.clone(),
            output: Output::Placeholder(INITIAL_PLACEHOLDER.to_string()),
            view: MarkdownView::new(),
            state: GenerationState::Idle,
            active_submission: None,
            status_message: None,
            scroll_offset: 0,
            copy_ack_until: None,
        }
    }

    pub const fn quit(&mut self) {
        self.should_quit = true;
    }

    pub const fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub const fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Prompt => Focus::ImagePath,
            Focus::ImagePath => Focus::Prompt,
        };
    }

    pub fn language(&self) -> &str {
        self.languages
            .get(self.language_index)
            .map_or("English", String::as_str)
    }

    pub fn next_feature(&mut self) {
        self.feature = self.feature.next();
    }

    pub fn previous_feature(&mut self) {
        self.feature = self.feature.previous();
    }

    pub fn next_language(&mut self) {
        if !self.languages.is_empty() {
            self.language_index = (self.language_index + 1) % self.languages.len();
        }
    }

    /// The field keyboard input currently goes to.
    pub fn focused_input(&mut self) -> &mut String {
        match self.focus {
            Focus::Prompt => &mut self.input_buffer,
            Focus::ImagePath => &mut self.image_input,
        }
    }

    /// Validate the input and snapshot it into a new submission.
    ///
    /// Rejected while another generation is running. With no text and no
    /// image the output pane shows a placeholder message and nothing is sent.
    pub fn begin_submission(&mut self) -> Result<Submission, SubmitRejected> {
        if self.state.is_busy() {
            self.status_message =
                Some("A response is still being generated (Esc to cancel)".to_string());
            return Err(SubmitRejected::Busy);
        }

        let text = self.input_buffer.trim();
        if text.is_empty() && self.image.is_none() {
            self.output = Output::Placeholder(EMPTY_INPUT_MESSAGE.to_string());
            self.view.clear();
            return Err(SubmitRejected::EmptyInput);
        }

        let prompt = prompt::build_prompt(self.feature.id(), text, self.language());
        let request = GenerationRequest::new(prompt, self.image.as_ref());
        let id = Uuid::new_v4();

        self.view.clear();
        self.output = Output::Response;
        self.state = GenerationState::Waiting;
        self.active_submission = Some(id);
        self.status_message = None;
        self.scroll_offset = 0;

        Ok(Submission { id, request })
    }

    /// Stop following the in-flight submission. Its late events are ignored.
    pub fn cancel_generation(&mut self) -> bool {
        if !self.state.is_busy() {
            return false;
        }
        if let Some(id) = self.active_submission.take() {
            log::info!("Submission {id} cancelled");
        }
        self.state = GenerationState::Idle;
        self.status_message = Some("Generation cancelled".to_string());
        true
    }

    fn is_active(&self, submission: Uuid) -> bool {
        self.active_submission == Some(submission)
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ResponseStarted { submission } => {
                if self.is_active(submission) {
                    self.state = GenerationState::Streaming;
                }
            }
            AppEvent::ResponseUpdated { submission, markdown } => {
                if self.is_active(submission) {
                    self.state = GenerationState::Streaming;
                    self.output = Output::Response;
                    self.view.render(&markdown);
                }
            }
            AppEvent::ResponseDone { submission } => {
                if self.is_active(submission) {
                    self.state = GenerationState::Idle;
                    self.active_submission = None;
                }
            }
            AppEvent::GenerationFailed { submission, message } => {
                if self.is_active(submission) {
                    self.view.clear();
                    self.output = Output::Error(message.clone());
                    self.state = GenerationState::Errored(message);
                    self.active_submission = None;
                    self.scroll_offset = 0;
                }
            }
            AppEvent::ImageLoaded { request, image } => {
                if self.take_pending_image(request) {
                    log::info!("Attached image {}", image.describe());
                    self.image = Some(image);
                    self.image_error = None;
                    self.image_input.clear();
                    self.focus = Focus::Prompt;
                } else {
                    log::debug!("Dropping image from superseded load {request}");
                }
            }
            AppEvent::ImageFailed { request, message } => {
                if self.take_pending_image(request) {
                    self.image_error = Some(message);
                }
            }
        }
    }

    /// Take the path typed in the image field, if any, and mark a load as pending.
    ///
    /// A newer request supersedes an older one still in flight.
    pub fn take_image_request(&mut self) -> Option<ImageRequest> {
        let input = self.image_input.trim().to_string();
        if input.is_empty() {
            return None;
        }
        let id = Uuid::new_v4();
        self.pending_image = Some(id);
        self.image_loading = true;
        self.image_error = None;
        Some(ImageRequest { id, input })
    }

    fn take_pending_image(&mut self, request: Uuid) -> bool {
        if self.pending_image != Some(request) {
            return false;
        }
        self.pending_image = None;
        self.image_loading = false;
        true
    }

    /// Drop the attached image and reset the image field so the same file can be chosen again.
    ///
    /// A load still in flight is abandoned as well.
    pub fn remove_image(&mut self) {
        self.image = None;
        self.pending_image = None;
        self.image_input.clear();
        self.image_error = None;
        self.image_loading = false;
    }

    /// The text a reader sees in the output pane.
    pub fn visible_output(&self) -> String {
        match &self.output {
            Output::Placeholder(text) => text.clone(),
            Output::Response => self.view.plain_text().to_string(),
            Output::Error(message) => error_text(message),
        }
    }

    pub fn copy_output(&mut self, writer: &mut dyn ClipboardWriter, now: Instant) -> CopyOutcome {
        let outcome = clipboard::copy_output(writer, &self.visible_output());
        if outcome == CopyOutcome::Copied {
            self.copy_ack_until = Some(now + COPY_ACK_DURATION);
        }
        outcome
    }

    pub fn copy_label(&self, now: Instant) -> &'static str {
        match self.copy_ack_until {
            Some(until) if now < until => COPIED_LABEL,
            _ => COPY_LABEL,
        }
    }

    pub const fn scroll_up(&mut self, amount: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(amount);
    }

    pub const fn scroll_down(&mut self, amount: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(amount);
    }

    pub const fn scroll_to_top(&mut self) {
        self.scroll_offset = 0;
    }

    pub const fn scroll_to_bottom(&mut self) {
        // The rendering code clamps this to the maximum possible scroll
        self.scroll_offset = usize::MAX;
    }
}

pub fn error_text(message: &str) -> String {
    format!("An error occurred: {message}.")
}
