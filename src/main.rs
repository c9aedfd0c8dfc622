use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;

use sonicpi_chat::app::{App, SAVE_FAILED_NOTICE};
use sonicpi_chat::conversation::outgoing_text;
use sonicpi_chat::logging::{self, LogTarget};
use sonicpi_chat::render::{split_segments, Segment};
use sonicpi_chat::{handler, tui, ui, BackendClient, Config, Message, SyntaxHighlighter};

#[derive(Parser)]
#[command(name = "sonicpi-chat")]
#[command(version)]
#[command(about = "Chat with the Sonic Pi controller from your terminal")]
struct Cli {
    /// Backend base URL (overrides REACT_APP_API_URL and the config file)
    #[arg(long, global = true, env = "SONIC_PI_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Full-screen chat (the default)
    Tui,
    /// Print the backend's chat history
    History,
    /// Send one message and print the reply
    Send {
        /// Your message
        message: String,
    },
    /// Line-by-line chat in the terminal, type 'quit' to leave
    Chat,
    /// Start a new chat; the music keeps playing
    NewChat,
    /// Stop the music
    Stop,
    /// Save the code that is currently playing
    Save,
    /// Remember a backend URL in the config file
    SetUrl { url: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().context("Failed to load config")?;
    let api_url = config.resolve_api_url(cli.api_url.as_deref());

    let command = cli.command.unwrap_or(Commands::Tui);
    let _log_guard = match command {
        Commands::Tui => logging::init(LogTarget::File(logging::default_log_dir()?))?,
        _ => logging::init(LogTarget::Stderr)?,
    };
    tracing::info!("using backend at {}", api_url);

    let client = BackendClient::new(&api_url);

    match command {
        Commands::Tui => run_tui(client).await?,
        Commands::History => print_history(&client).await?,
        Commands::Send { message } => send_once(&client, &message).await?,
        Commands::Chat => chat_repl(&client).await?,
        Commands::NewChat => {
            client.new_chat().await.context("Failed to start new chat")?;
            println!("{}", "New chat started. The music keeps playing.".green());
        }
        Commands::Stop => {
            client.stop_music().await.context("Failed to stop music")?;
            println!("{}", "Music stopped.".green());
        }
        Commands::Save => match client.save_code().await {
            Ok(message) => println!("{}", message),
            Err(e) => {
                tracing::error!("Failed to save code: {:#}", e);
                eprintln!("{}", SAVE_FAILED_NOTICE.red());
            }
        },
        Commands::SetUrl { url } => {
            Config::save_api_url(&url)?;
            println!("Saved backend URL to {}", Config::get_config_path()?.display());
        }
    }

    Ok(())
}

async fn run_tui(client: BackendClient) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut events = tui::EventHandler::new();
    let mut app = App::new(client, events.sender());
    app.load_history();

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event)?,
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    app.shutdown();
    tui::restore()?;
    result
}

fn print_message(message: &Message, highlighter: &SyntaxHighlighter) {
    let who = if message.is_user {
        "You:".bold().magenta()
    } else {
        "Sonic Pi:".bold().cyan()
    };
    println!("{}", who);

    for segment in split_segments(&message.content) {
        match segment {
            Segment::Prose(text) => println!("{}", text.trim_end_matches('\n')),
            Segment::Code(code) => print!("{}", highlighter.highlight_ansi(&code)),
        }
    }
    println!();
}

async fn print_history(client: &BackendClient) -> Result<()> {
    let messages = client.chat_history().await.context("Failed to fetch chat history")?;

    if messages.is_empty() {
        println!("{}", "No messages yet.".dimmed());
        return Ok(());
    }

    let highlighter = SyntaxHighlighter::new();
    for message in &messages {
        print_message(message, &highlighter);
    }
    println!("{} messages", messages.len().to_string().bold());
    Ok(())
}

async fn send_once(client: &BackendClient, message: &str) -> Result<()> {
    let Some(text) = outgoing_text(message) else {
        println!("{}", "Nothing to send.".yellow());
        return Ok(());
    };

    let reply = client.send_message(text).await.context("Failed to send message")?;
    print_message(&Message::assistant(reply), &SyntaxHighlighter::new());
    Ok(())
}

async fn chat_repl(client: &BackendClient) -> Result<()> {
    let highlighter = SyntaxHighlighter::new();
    println!("{}", "Welcome to the Sonic Pi Controller!".bold().magenta());
    println!("{}", "Type 'quit' to leave.".dimmed());

    let stdin = io::stdin();
    loop {
        print!("{} ", "You:".bold().magenta());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().eq_ignore_ascii_case("quit") {
            break;
        }
        let Some(text) = outgoing_text(line) else {
            continue;
        };

        match client.send_message(text).await {
            Ok(reply) => print_message(&Message::assistant(reply), &highlighter),
            Err(e) => {
                tracing::error!("Failed to send message: {:#}", e);
                eprintln!("{}", "Could not reach the backend.".red());
            }
        }
    }

    Ok(())
}
