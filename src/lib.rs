pub mod api;
pub mod app;
pub mod config;
pub mod conversation;
pub mod handler;
pub mod highlight;
pub mod logging;
pub mod render;
pub mod tui;
pub mod ui;

// Re-export main types for convenience
pub use api::BackendClient;
pub use app::{App, BackendEvent};
pub use config::Config;
pub use conversation::{Conversation, Message};
pub use highlight::SyntaxHighlighter;
pub use render::{split_segments, Segment};
