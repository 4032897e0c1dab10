mod api;
mod app;
mod clipboard;
mod config;
mod error;
mod events;
mod logging;
mod media;
mod models;
mod prompt;
mod render;
mod stream;
mod ui;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::Backend, prelude::*};
use std::io;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use api::GeminiClient;
use app::{App, ImageRequest, Submission, SubmitRejected};
use clipboard::{ClipboardWriter, SystemClipboard};
use events::{AppEvent, ChannelSink};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load_config()?;
    config::ensure_api_key(&config)?;

    let config_dir = config::get_config_dir()?;
    let log_path = logging::init(&config_dir)?;
    log::info!("Starting studymate with model {}", config.model);

    let client = GeminiClient::from_config(&config).context("Failed to create HTTP client")?;
    let mut app = App::new(&config);
    let mut clipboard = SystemClipboard::new();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();

    let res = run_app(&mut terminal, &mut app, &client, &mut clipboard, &tx, &mut rx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        log::error!("Application error: {err:?}");
        eprintln!("Error: {err:?}");
        eprintln!("See {} for details", log_path.display());
    }

    Ok(())
}

/// Side effects a key press asks the event loop to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
enum KeyAction {
    None,
    Submit,
    LoadImage(ImageRequest),
    Copy,
    Cancel,
}

const fn handle_help_keys(app: &mut App, key: KeyCode, modifiers: KeyModifiers) -> bool {
    if !app.show_help {
        return false;
    }

    match key {
        KeyCode::Char('h') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.toggle_help();
        }
        KeyCode::Esc => {
            app.show_help = false;
        }
        _ => {}
    }
    true
}

fn handle_keyboard_input(app: &mut App, key: KeyCode, modifiers: KeyModifiers) -> KeyAction {
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);

    match key {
        KeyCode::Char('c') if ctrl => {
            if app.exit_pending {
                app.quit();
            } else {
                app.exit_pending = true;
            }
            return KeyAction::None;
        }
        KeyCode::Esc => {
            if app.exit_pending {
                app.exit_pending = false;
                return KeyAction::None;
            }
            return KeyAction::Cancel;
        }
        _ if app.exit_pending => {
            // Any other key cancels pending exit
            app.exit_pending = false;
        }
        _ => {}
    }

    match key {
        KeyCode::Char('q') if ctrl => app.quit(),
        KeyCode::Char('h') if ctrl => app.toggle_help(),
        KeyCode::Char('f') if ctrl => app.next_feature(),
        KeyCode::Char('b') if ctrl => app.previous_feature(),
        KeyCode::Char('l') if ctrl => app.next_language(),
        KeyCode::Char('x') if ctrl => app.remove_image(),
        KeyCode::Char('y') if ctrl => return KeyAction::Copy,
        KeyCode::Tab | KeyCode::BackTab => app.toggle_focus(),

        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => app.scroll_up(10),
        KeyCode::PageDown => app.scroll_down(10),
        KeyCode::Home => app.scroll_to_top(),
        KeyCode::End => app.scroll_to_bottom(),

        KeyCode::Backspace => {
            app.focused_input().pop();
        }
        KeyCode::Enter => {
            return match app.focus {
                app::Focus::Prompt => KeyAction::Submit,
                app::Focus::ImagePath => app
                    .take_image_request()
                    .map_or(KeyAction::None, KeyAction::LoadImage),
            };
        }
        KeyCode::Char(c) if !ctrl => app.focused_input().push(c),

        _ => {}
    }
    KeyAction::None
}

/// Stream one submission in the background, reporting back through `event_tx`.
fn spawn_generation(
    client: &GeminiClient,
    submission: Submission,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
) -> JoinHandle<()> {
    let client = client.clone();
    let tx = event_tx.clone();

    tokio::spawn(async move {
        let Submission { id, request } = submission;
        log::info!(
            "Submission {id}: sending request to {} (image: {})",
            client.model(),
            request.has_inline_data()
        );

        let result = match client.generate_stream(&request).await {
            Ok(increments) => {
                let _ = tx.send(AppEvent::ResponseStarted { submission: id });
                let mut sink = ChannelSink::new(id, tx.clone());
                stream::consume(increments, &mut sink).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(text) => {
                log::info!("Submission {id}: done, {} characters", text.len());
                let _ = tx.send(AppEvent::ResponseDone { submission: id });
            }
            Err(e) => {
                log::error!("Submission {id}: {e}");
                let _ = tx.send(AppEvent::GenerationFailed {
                    submission: id,
                    message: e.to_string(),
                });
            }
        }
    })
}

fn spawn_image_load(request: ImageRequest, event_tx: &mpsc::UnboundedSender<AppEvent>) {
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let ImageRequest { id, input } = request;
        let event = match media::resolve_input(&input).await {
            Ok(image) => AppEvent::ImageLoaded { request: id, image },
            Err(e) => {
                log::warn!("{e}");
                AppEvent::ImageFailed {
                    request: id,
                    message: e.to_string(),
                }
            }
        };
        let _ = tx.send(event);
    });
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    client: &GeminiClient,
    clipboard: &mut dyn ClipboardWriter,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
    event_rx: &mut mpsc::UnboundedReceiver<AppEvent>,
) -> Result<()> {
    let mut generation: Option<JoinHandle<()>> = None;

    loop {
        terminal.draw(|f| ui::render(f, app, Instant::now()))?;

        while let Ok(app_event) = event_rx.try_recv() {
            app.handle_event(app_event);
        }

        // ~60fps keeps streamed output smooth
        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if handle_help_keys(app, key.code, key.modifiers) {
                        continue;
                    }

                    match handle_keyboard_input(app, key.code, key.modifiers) {
                        KeyAction::None => {}
                        KeyAction::Submit => match app.begin_submission() {
                            Ok(submission) => {
                                generation = Some(spawn_generation(client, submission, event_tx));
                            }
                            Err(SubmitRejected::EmptyInput) => {
                                log::debug!("Ignoring empty submission");
                            }
                            Err(SubmitRejected::Busy) => {
                                log::debug!("Rejected submission while a generation is running");
                            }
                        },
                        KeyAction::LoadImage(request) => spawn_image_load(request, event_tx),
                        KeyAction::Copy => {
                            app.copy_output(clipboard, Instant::now());
                        }
                        KeyAction::Cancel => {
                            if app.cancel_generation() {
                                if let Some(handle) = generation.take() {
                                    handle.abort();
                                }
                            }
                        }
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    if let Some(handle) = generation {
        handle.abort();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppConfig;
    use uuid::Uuid;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app() -> App {
        App::new(&AppConfig::default())
    }

    #[test]
    fn test_typing_and_submit() {
        let mut app = app();
        for c in "why?".chars() {
            assert_eq!(
                handle_keyboard_input(&mut app, KeyCode::Char(c), KeyModifiers::NONE),
                KeyAction::None
            );
        }
        assert_eq!(app.input_buffer, "why?");
        assert_eq!(
            handle_keyboard_input(&mut app, KeyCode::Enter, KeyModifiers::NONE),
            KeyAction::Submit
        );
    }

    #[test]
    fn test_enter_in_image_field_loads_image() {
        let mut app = app();
        handle_keyboard_input(&mut app, KeyCode::Tab, KeyModifiers::NONE);
        for c in "a.png".chars() {
            handle_keyboard_input(&mut app, KeyCode::Char(c), KeyModifiers::NONE);
        }
        let KeyAction::LoadImage(request) =
            handle_keyboard_input(&mut app, KeyCode::Enter, KeyModifiers::NONE)
        else {
            panic!("Enter in the image field should load an image");
        };
        assert_eq!(request.input, "a.png");
        assert_eq!(app.pending_image, Some(request.id));
        assert!(app.image_loading);
        assert!(app.input_buffer.is_empty());
    }

    #[test]
    fn test_ctrl_c_needs_confirmation() {
        let mut app = app();
        handle_keyboard_input(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(app.exit_pending);
        assert!(!app.should_quit);

        handle_keyboard_input(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert!(!app.exit_pending);

        handle_keyboard_input(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
        handle_keyboard_input(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(app.should_quit);
    }

    #[test]
    fn test_control_keys_do_not_type() {
        let mut app = app();
        assert_eq!(
            handle_keyboard_input(&mut app, KeyCode::Char('y'), KeyModifiers::CONTROL),
            KeyAction::Copy
        );
        handle_keyboard_input(&mut app, KeyCode::Char('f'), KeyModifiers::CONTROL);
        assert_eq!(app.feature, prompt::Feature::Mathematics);
        handle_keyboard_input(&mut app, KeyCode::Char('z'), KeyModifiers::CONTROL);
        assert!(app.input_buffer.is_empty());
    }

    #[test]
    fn test_esc_requests_cancel() {
        let mut app = app();
        assert_eq!(
            handle_keyboard_input(&mut app, KeyCode::Esc, KeyModifiers::NONE),
            KeyAction::Cancel
        );
    }

    const STREAM_PATH: &str = "/v1beta/models/gemini-2.5-flash:streamGenerateContent";

    fn client_for(server: &MockServer) -> GeminiClient {
        GeminiClient::new(
            server.uri(),
            "test-key".to_string(),
            "gemini-2.5-flash".to_string(),
            30,
        )
        .unwrap()
    }

    fn submission() -> Submission {
        Submission {
            id: Uuid::new_v4(),
            request: api::GenerationRequest::new("Say hi".to_string(), None),
        }
    }

    async fn drain(
        handle: JoinHandle<()>,
        rx: &mut mpsc::UnboundedReceiver<AppEvent>,
    ) -> Vec<AppEvent> {
        handle.await.unwrap();
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_generation_reports_started_updates_done() {
        let server = MockServer::start().await;
        let body = concat!(
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hello\"}]}}]}\n\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\" there\"}]}}]}\n\n",
        );
        Mock::given(method("POST"))
            .and(path(STREAM_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let submission = submission();
        let id = submission.id;
        let events = drain(spawn_generation(&client_for(&server), submission, &tx), &mut rx).await;

        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], AppEvent::ResponseStarted { submission } if submission == id));
        let renders: Vec<&str> = events[1..3]
            .iter()
            .map(|event| match event {
                AppEvent::ResponseUpdated { submission, markdown } => {
                    assert_eq!(*submission, id);
                    markdown.as_str()
                }
                other => panic!("unexpected event: {other:?}"),
            })
            .collect();
        assert_eq!(renders, vec!["Hello", "Hello there"]);
        assert!(matches!(events[3], AppEvent::ResponseDone { submission } if submission == id));
    }

    #[tokio::test]
    async fn test_generation_reports_http_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(STREAM_PATH))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": {"code": 403, "message": "Permission denied"}
            })))
            .mount(&server)
            .await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let submission = submission();
        let id = submission.id;
        let events = drain(spawn_generation(&client_for(&server), submission, &tx), &mut rx).await;

        assert_eq!(events.len(), 1);
        match &events[0] {
            AppEvent::GenerationFailed { submission, message } => {
                assert_eq!(*submission, id);
                assert_eq!(message, "API request failed with status 403: Permission denied");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_help_keys_swallow_input_while_open() {
        let mut app = app();
        assert!(!handle_help_keys(&mut app, KeyCode::Char('a'), KeyModifiers::NONE));

        app.show_help = true;
        assert!(handle_help_keys(&mut app, KeyCode::Char('a'), KeyModifiers::NONE));
        assert!(app.show_help);
        assert!(handle_help_keys(&mut app, KeyCode::Esc, KeyModifiers::NONE));
        assert!(!app.show_help);
    }
}
