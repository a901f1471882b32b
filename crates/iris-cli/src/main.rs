//! iris - ask a vision model about an eye photo

mod commands;
mod config;
mod ui;

use clap::Parser;
use iris_ai::{Model, OpenAIProvider, Provider, models, providers::get_api_key};
use iris_session::{ConversationSession, Role, SessionConfig, SourceImage};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing_subscriber::EnvFilter;

/// iris - eye disease analysis assistant
#[derive(Parser, Debug)]
#[command(name = "iris")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Eye image to analyze (PNG or JPEG)
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Ask a single question about --image and exit
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Vision model to use (default: llama-3.2-90b-vision-preview)
    #[arg(short, long)]
    model: Option<String>,

    /// Provider (groq, openai, openrouter, custom)
    #[arg(short, long)]
    provider: Option<String>,

    /// API base URL, overriding the provider default
    #[arg(long)]
    base_url: Option<String>,

    /// API key, overriding config and environment
    #[arg(long)]
    api_key: Option<String>,

    /// Seconds to wait for an answer
    #[arg(long)]
    timeout: Option<u64>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Disable TUI mode (use simple stdin/stdout)
    #[arg(long)]
    no_tui: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let cfg = config::Config::load();

    // CLI args take precedence over the config file
    let model_id = args
        .model
        .clone()
        .or(cfg.model.clone())
        .unwrap_or_else(|| models::DEFAULT_MODEL_ID.to_string());

    let provider = match args.provider.as_deref().or(cfg.provider.as_deref()) {
        Some(name) => Provider::parse(name),
        None => models::get_model_by_id(&model_id)
            .map(|m| m.provider)
            .unwrap_or(Provider::Groq),
    };

    let base_url = args.base_url.clone().or(cfg.base_url.clone());
    let model = models::resolve(provider, &model_id, base_url.as_deref());

    let use_tui = args.command.is_none()
        && !args.no_tui
        && cfg.tui.unwrap_or(true)
        && std::io::stdout().is_terminal();

    init_logging(args.verbose, use_tui);

    // CLI, then config file, then the provider's environment variable
    let provided = args
        .api_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .or(cfg.configured_api_key(provider));
    let api_key = match get_api_key(provided, provider) {
        Ok(key) => key,
        // Local OpenAI-compatible servers usually take no key
        Err(_) if provider == Provider::Custom => String::new(),
        Err(_) => {
            let var = provider.api_key_env_var().unwrap_or("GROQ_API_KEY");
            eprintln!("Error: No API key found for {}", provider.name());
            eprintln!();
            eprintln!("Set your API key with: export {}=your-key", var);
            eprintln!("Or add it to the config file: iris --init-config");
            std::process::exit(1);
        }
    };

    if provider == Provider::Custom && model.base_url.is_empty() {
        eprintln!("Error: the custom provider needs --base-url or base_url in the config file");
        std::process::exit(1);
    }

    let mut session_config = SessionConfig::new(model.clone());
    if let Some(secs) = args.timeout.or(cfg.timeout_secs) {
        session_config.timeout = Duration::from_secs(secs.max(1));
    }
    if let Some(temperature) = cfg.temperature {
        session_config.temperature = temperature;
    }
    if let Some(max_tokens) = cfg.max_tokens {
        session_config.max_tokens = max_tokens;
    }
    session_config.normalize = cfg.image.apply(session_config.normalize);

    tracing::debug!(
        model = %model.id,
        provider = model.provider.name(),
        base_url = %model.base_url,
        timeout_secs = session_config.timeout.as_secs(),
        "starting session"
    );

    let client = Arc::new(OpenAIProvider::new(api_key));
    let mut session = ConversationSession::new(session_config, client);

    if let Some(ref path) = args.image {
        if let Err(e) = load_image(&mut session, path) {
            eprintln!("Error loading image {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }

    // Non-interactive mode
    if let Some(question) = args.command {
        return run_command(&mut session, &question).await;
    }

    let available_models = models::get_models(provider);

    if use_tui {
        let theme = iris_tui::Theme::by_name(cfg.theme.as_deref().unwrap_or("dark"));
        return ui::run_tui(&mut session, &available_models, theme).await;
    }

    run_interactive(&mut session, &available_models).await
}

/// Debug logs with `-v`, otherwise warnings or `RUST_LOG`. The TUI owns the
/// terminal, so its logs go to a file.
fn init_logging(verbose: bool, use_tui: bool) {
    let filter = if verbose {
        EnvFilter::new("iris=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("iris=warn"))
    };

    if use_tui {
        if let Some(file) = log_file() {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn log_file() -> Option<std::fs::File> {
    let dir = dirs::data_local_dir()?.join("iris");
    std::fs::create_dir_all(&dir).ok()?;
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("iris.log"))
        .ok()
}

/// Read an image from disk and make it the session's current image
pub(crate) fn load_image(session: &mut ConversationSession, path: &Path) -> iris_session::Result<String> {
    let image = SourceImage::open(path).inspect_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "failed to load image");
    })?;
    let summary = format!(
        "Loaded {} ({}, {})",
        image.name(),
        image.format().extensions_str().first().copied().unwrap_or("image").to_uppercase(),
        commands::format_size(image.len())
    );
    session.set_image(image);
    Ok(summary)
}

/// Answer one question and exit. Failures go to stderr with exit code 1.
async fn run_command(session: &mut ConversationSession, question: &str) -> anyhow::Result<()> {
    session.submit_query(question).await?;

    match session.turns().last() {
        Some(turn) if turn.role() == Role::Assistant && !turn.is_error() => {
            println!("{}", turn.text());
            Ok(())
        }
        Some(turn) => Err(anyhow::anyhow!("{}", turn.text())),
        None => Err(anyhow::anyhow!("no answer received")),
    }
}

async fn run_interactive(session: &mut ConversationSession, available_models: &[Model]) -> anyhow::Result<()> {
    use commands::{CommandResult, execute_command};

    if io::stderr().is_terminal() {
        eprintln!("iris ({})", session.config().model.short_name());
        eprintln!("{}", commands::DISCLAIMER);
        match session.current_image() {
            Some(image) => eprintln!("Image: {}", image.name()),
            None => eprintln!("Load an eye image with /image <path>. Type /help for commands."),
        }
        eprintln!();
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let input = match next_input(&mut lines, interrupted()).await? {
            PromptInput::Line(line) => line,
            PromptInput::Interrupted => {
                // Ctrl+C at an idle prompt quits. The pending stdin read cannot
                // be cancelled, so leave without waiting for runtime shutdown.
                println!();
                std::process::exit(0);
            }
            PromptInput::Eof => break,
        };

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        let question = match execute_command(input, session, available_models) {
            None => input.to_string(),
            Some(CommandResult::Ask(question)) => {
                println!("> {}", question);
                question
            }
            Some(result) => {
                match result {
                    CommandResult::Message(msg) => println!("{}", msg),
                    CommandResult::LoadImage(path) => match load_image(session, &path) {
                        Ok(summary) => println!("{}", summary),
                        Err(e) => println!("Error loading image {}: {}", path.display(), e),
                    },
                    CommandResult::OpenSuggestions => println!("{}", commands::suggestions_text()),
                    CommandResult::ChangeModel(model) => {
                        println!("Switched to: {} ({})", model.id, model.provider.name());
                        session.set_model(model);
                    }
                    CommandResult::Clear => {
                        session.clear();
                        println!("Cleared conversation and image.");
                    }
                    CommandResult::Exit => break,
                    CommandResult::Unknown(cmd) => {
                        println!("Unknown command: /{}", cmd);
                        println!("Type /help for available commands.");
                    }
                    CommandResult::Ask(_) => {}
                }
                println!();
                continue;
            }
        };

        ask(session, &question).await;
        println!();
    }

    Ok(())
}

/// What the plain-mode prompt received
#[derive(Debug, PartialEq, Eq)]
enum PromptInput {
    Line(String),
    Interrupted,
    Eof,
}

/// Wait for the next input line, or for `interrupt` to fire first
async fn next_input<R>(lines: &mut Lines<R>, interrupt: impl Future<Output = ()>) -> io::Result<PromptInput>
where
    R: AsyncBufRead + Unpin,
{
    tokio::select! {
        line = lines.next_line() => Ok(match line? {
            Some(line) => PromptInput::Line(line),
            None => PromptInput::Eof,
        }),
        _ = interrupt => Ok(PromptInput::Interrupted),
    }
}

/// Resolves on Ctrl+C. Never resolves if the handler cannot be installed.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Submit one question in plain mode. Ctrl+C aborts the pending request.
async fn ask(session: &mut ConversationSession, question: &str) {
    let handle = session.handle();
    let is_tty = std::io::stderr().is_terminal();
    if is_tty {
        eprintln!("Analyzing image...");
    }

    let result = {
        let mut pending = std::pin::pin!(session.submit_query(question));
        tokio::select! {
            result = &mut pending => result,
            _ = interrupted() => {
                handle.abort();
                pending.await
            }
        }
    };

    if let Err(e) = result {
        println!("{}", e);
        return;
    }

    if let Some(turn) = session.turns().last() {
        if turn.is_error() {
            eprintln!("{}", turn.text());
        } else {
            println!("{}", turn.text());
        }
    }

    if is_tty {
        let usage = session.total_usage();
        eprintln!("[{} in, {} out]", usage.input, usage.output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_next_input_reads_lines_then_eof() {
        let mut lines = BufReader::new(&b"is this cataract?\n"[..]).lines();
        let first = next_input(&mut lines, std::future::pending()).await.unwrap();
        assert_eq!(first, PromptInput::Line("is this cataract?".into()));
        let second = next_input(&mut lines, std::future::pending()).await.unwrap();
        assert_eq!(second, PromptInput::Eof);
    }

    #[tokio::test]
    async fn test_interrupt_at_idle_prompt() {
        // Writer stays open, so no line ever arrives
        let (reader, _writer) = tokio::io::duplex(64);
        let mut lines = BufReader::new(reader).lines();
        let input = next_input(&mut lines, std::future::ready(())).await.unwrap();
        assert_eq!(input, PromptInput::Interrupted);
    }
}
