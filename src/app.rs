use std::future::Future;

use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::api::BackendClient;
use crate::conversation::{outgoing_text, Conversation, Message};
use crate::highlight::SyntaxHighlighter;
use crate::tui::AppEvent;

pub const SAVE_FAILED_NOTICE: &str = "Failed to save code. Please try again.";

pub const TIP: &str =
    "You can ask questions about music or Sonic Pi without changing the current music.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Result of a finished backend request, applied on the UI loop
#[derive(Debug)]
pub enum BackendEvent {
    HistoryLoaded(anyhow::Result<Vec<Message>>),
    MessageSent {
        user_text: String,
        result: anyhow::Result<String>,
    },
    ChatCleared(anyhow::Result<()>),
    MusicStopped(anyhow::Result<()>),
    CodeSaved(anyhow::Result<String>),
}

/// Blocking popup, dismissed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Composer
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Chat state
    pub conversation: Conversation,
    pub sending: bool,
    pub notice: Option<Notice>,
    pub status: Option<String>,

    // Chat pane scrolling
    pub scroll: u16,
    pub follow_bottom: bool,
    pub chat_height: u16, // inner height of chat area, updated during render
    pub chat_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub highlighter: SyntaxHighlighter,
    client: BackendClient,
    events: UnboundedSender<AppEvent>,
    tasks: Vec<JoinHandle<()>>,
}

impl App {
    pub fn new(client: BackendClient, events: UnboundedSender<AppEvent>) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,

            input: String::new(),
            cursor: 0,

            conversation: Conversation::new(),
            sending: false,
            notice: None,
            status: None,

            scroll: 0,
            follow_bottom: true,
            chat_height: 0,
            chat_area: None,

            animation_frame: 0,

            highlighter: SyntaxHighlighter::new(),
            client,
            events,
            tasks: Vec::new(),
        }
    }

    pub fn client(&self) -> &BackendClient {
        &self.client
    }

    /// Number of requests still running
    pub fn pending_requests(&self) -> usize {
        self.tasks.iter().filter(|task| !task.is_finished()).count()
    }

    fn spawn_request<F>(&mut self, request: F)
    where
        F: Future<Output = BackendEvent> + Send + 'static,
    {
        self.tasks.retain(|task| !task.is_finished());

        let events = self.events.clone();
        self.tasks.push(tokio::spawn(async move {
            let event = request.await;
            // The UI loop may already be gone
            let _ = events.send(AppEvent::Backend(event));
        }));
    }

    pub fn load_history(&mut self) {
        let client = self.client.clone();
        self.spawn_request(async move { BackendEvent::HistoryLoaded(client.chat_history().await) });
    }

    /// Send the composer text. Returns false if nothing was sent.
    pub fn submit_input(&mut self) -> bool {
        let Some(text) = outgoing_text(&self.input) else {
            return false;
        };
        if self.sending {
            tracing::debug!("send ignored, a message is already in flight");
            return false;
        }

        let user_text = text.to_string();
        let client = self.client.clone();
        self.sending = true;
        self.follow_bottom = true;
        self.status = None;

        self.spawn_request(async move {
            let result = client.send_message(&user_text).await;
            BackendEvent::MessageSent { user_text, result }
        });
        true
    }

    pub fn new_chat(&mut self) {
        let client = self.client.clone();
        self.spawn_request(async move { BackendEvent::ChatCleared(client.new_chat().await) });
    }

    pub fn stop_music(&mut self) {
        let client = self.client.clone();
        self.spawn_request(async move { BackendEvent::MusicStopped(client.stop_music().await) });
    }

    pub fn save_code(&mut self) {
        let client = self.client.clone();
        self.spawn_request(async move { BackendEvent::CodeSaved(client.save_code().await) });
    }

    pub fn apply(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::HistoryLoaded(Ok(messages)) => {
                tracing::info!("loaded {} messages of chat history", messages.len());
                self.conversation.load(messages);
                self.follow_bottom = true;
            }
            BackendEvent::HistoryLoaded(Err(e)) => {
                tracing::warn!("Failed to fetch chat history: {:#}", e);
            }
            BackendEvent::MessageSent { user_text, result } => {
                self.sending = false;
                match result {
                    Ok(reply) => {
                        // Keep anything typed while the request was in flight
                        if self.input == user_text {
                            self.input.clear();
                            self.cursor = 0;
                        }
                        self.conversation.append(user_text, reply);
                        self.follow_bottom = true;
                    }
                    Err(e) => tracing::error!("Failed to send message: {:#}", e),
                }
            }
            BackendEvent::ChatCleared(Ok(())) => {
                self.conversation.clear();
                self.scroll = 0;
                self.follow_bottom = true;
            }
            BackendEvent::ChatCleared(Err(e)) => {
                tracing::error!("Failed to start new chat: {:#}", e);
            }
            BackendEvent::MusicStopped(Ok(())) => {
                tracing::info!("music stopped");
                self.status = Some("Music stopped".to_string());
            }
            BackendEvent::MusicStopped(Err(e)) => {
                tracing::error!("Failed to stop music: {:#}", e);
            }
            BackendEvent::CodeSaved(Ok(message)) => {
                tracing::info!("save code: {}", message);
                self.show_notice("Save code", message);
            }
            BackendEvent::CodeSaved(Err(e)) => {
                tracing::error!("Failed to save code: {:#}", e);
                self.show_notice("Save code", SAVE_FAILED_NOTICE);
            }
        }
    }

    pub fn show_notice(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.notice = Some(Notice {
            title: title.into(),
            message: message.into(),
        });
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.sending {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines);
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
        self.follow_bottom = false;
    }

    pub fn scroll_half_page_down(&mut self) {
        self.scroll_down((self.chat_height / 2).max(1));
    }

    pub fn scroll_half_page_up(&mut self) {
        self.scroll_up((self.chat_height / 2).max(1));
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = 0;
        self.follow_bottom = false;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow_bottom = true;
    }

    /// Clamp scroll to the rendered content; keeps following the newest
    /// message when `follow_bottom` is set.
    pub fn update_scroll(&mut self, total_lines: u16) {
        let max_scroll = total_lines.saturating_sub(self.chat_height);
        if self.follow_bottom || self.scroll >= max_scroll {
            self.scroll = max_scroll;
            self.follow_bottom = true;
        }
    }

    /// Abort every outstanding request so nothing lands after the view is gone.
    pub fn shutdown(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.shutdown();
    }
}
