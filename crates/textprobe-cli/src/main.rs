use std::io::{IsTerminal, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use textprobe_core::config_file;
use textprobe_core::{
    Config, Detector, FilePayload, HttpBackend, RenderMode, ScanError, escape_html, render_html,
};
use tracing_subscriber::EnvFilter;

mod host;
mod output;

use host::{SystemClipboard, TerminalOpener};
use output::ColorMode;

/// AI text detector - classify text as AI-written or human-written
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Base URL of the detection service
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan text from an argument, a file, the clipboard, Drive or stdin
    Scan {
        /// Text to scan (read from stdin when no source is given)
        #[arg(conflicts_with_all = ["file", "clipboard", "drive", "example"])]
        text: Option<String>,

        /// Upload a document for text extraction
        #[arg(short, long, conflicts_with_all = ["clipboard", "drive", "example"])]
        file: Option<PathBuf>,

        /// Paste from the system clipboard
        #[arg(long, conflicts_with_all = ["drive", "example"])]
        clipboard: bool,

        /// Import a Google Drive document by ID
        #[arg(long, conflicts_with = "example")]
        drive: Option<String>,

        /// Scan the built-in example paragraph
        #[arg(long)]
        example: bool,

        /// Result rendering: basic or highlighted
        #[arg(short, long)]
        mode: Option<RenderMode>,

        /// Write the escaped (and highlighted) text as an HTML fragment
        #[arg(long)]
        html: Option<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Google Drive connection
    Drive {
        #[command(subcommand)]
        action: DriveAction,
    },
}

#[derive(Subcommand, Debug)]
enum DriveAction {
    /// Show whether Drive is connected
    Status,
    /// Authorize Drive access in a browser
    Connect,
}

enum Source {
    Text(String),
    File(PathBuf),
    Clipboard,
    Drive(String),
    Example,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Scan {
            text,
            file,
            clipboard,
            drive,
            example,
            mode,
            html,
            no_color,
        } => {
            let source = if let Some(path) = file {
                Source::File(path)
            } else if clipboard {
                Source::Clipboard
            } else if let Some(id) = drive {
                Source::Drive(id)
            } else if example {
                Source::Example
            } else if let Some(text) = text {
                Source::Text(text)
            } else {
                Source::Text(read_stdin()?)
            };
            let config = resolve_config(cli.url, mode)?;
            let color = ColorMode(!no_color && std::io::stdout().is_terminal());
            scan(config, source, html, color).await
        }
        Command::Drive { action } => {
            let config = resolve_config(cli.url, None)?;
            let color = ColorMode(std::io::stdout().is_terminal());
            drive(config, action, color).await
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve configuration: CLI flags > env vars > config file > defaults.
fn resolve_config(url: Option<String>, mode: Option<RenderMode>) -> anyhow::Result<Config> {
    let mut config = Config::from_file(&config_file::load_config());
    if let Ok(env_url) = std::env::var("TEXTPROBE_URL") {
        config.base_url = env_url;
    }
    if let Ok(env_mode) = std::env::var("TEXTPROBE_MODE") {
        config.render_mode = env_mode
            .parse()
            .map_err(|e: String| anyhow::anyhow!("TEXTPROBE_MODE: {}", e))?;
    }
    if let Some(url) = url {
        config.base_url = url;
    }
    if let Some(mode) = mode {
        config.render_mode = mode;
    }
    tracing::debug!(?config, "resolved configuration");
    Ok(config)
}

fn read_stdin() -> anyhow::Result<String> {
    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        anyhow::bail!(
            "No input given. Pass TEXT, --file, --clipboard, --drive or --example, or pipe text on stdin."
        );
    }
    let mut text = String::new();
    stdin.read_to_string(&mut text)?;
    Ok(text)
}

fn build(config: &Config) -> anyhow::Result<Detector> {
    let backend = Arc::new(HttpBackend::new(config)?);
    let opener = TerminalOpener::new(
        backend.clone(),
        config.poll_interval,
        config.auth_message_type.clone(),
    );
    Ok(Detector::new(
        config,
        backend,
        Some(Arc::new(SystemClipboard)),
        Arc::new(opener),
    ))
}

/// Make sure the Drive session is authorized, running the browser flow if not.
async fn ensure_drive(detector: &Detector) -> Result<bool, ScanError> {
    if detector.drive.check_status().await {
        return Ok(true);
    }
    detector.drive.authenticate().await
}

/// Print the current result panel, then hand back `err`.
fn report(detector: &Detector, err: ScanError, color: ColorMode) -> anyhow::Result<()> {
    let mut out = std::io::stdout();
    output::print_view(&mut out, &detector.scan.ui_state(), &detector.scan.view(), color)?;
    Err(err.into())
}

async fn scan(
    config: Config,
    source: Source,
    html: Option<PathBuf>,
    color: ColorMode,
) -> anyhow::Result<()> {
    let detector = build(&config)?;
    let mut err = std::io::stderr();

    let acquired = match source {
        Source::Text(text) => {
            detector.scan.edit(text);
            Ok(())
        }
        Source::Example => detector.scan.load_example(),
        Source::Clipboard => detector.acquisition.acquire_from_clipboard().await,
        Source::File(path) => {
            let payload = FilePayload::from_path(&path)
                .map_err(|e| anyhow::anyhow!("Cannot read {}: {}", path.display(), e))?;
            detector.acquisition.acquire_from_file(Some(payload)).await
        }
        Source::Drive(id) => match ensure_drive(&detector).await {
            Ok(true) => detector.drive.select_and_download(&id).await.map(|_| ()),
            Ok(false) => Err(ScanError::DriveNotConnected),
            Err(e) => Err(e),
        },
    };
    if let Err(e) = acquired {
        return report(&detector, e, color);
    }
    if let Some(notice) = detector.scan.snapshot().notice {
        output::print_notice(&mut err, &notice, color)?;
    }

    if let Err(e) = detector.scan.submit().await {
        return report(&detector, e, color);
    }

    let snapshot = detector.scan.snapshot();
    let mut out = std::io::stdout();
    output::print_view(&mut out, &snapshot.ui, &detector.scan.view(), color)?;
    output::print_highlight(&mut out, &snapshot.highlight, color)?;

    if let Some(path) = html {
        let fragment = if snapshot.highlight.is_empty() {
            escape_html(&snapshot.text)
        } else {
            render_html(&snapshot.highlight)
        };
        std::fs::write(&path, fragment)
            .map_err(|e| anyhow::anyhow!("Cannot write {}: {}", path.display(), e))?;
        writeln!(err, "Wrote {}", path.display())?;
    }
    Ok(())
}

async fn drive(config: Config, action: DriveAction, color: ColorMode) -> anyhow::Result<()> {
    let detector = build(&config)?;
    let mut out = std::io::stdout();
    match action {
        DriveAction::Status => {
            let message = if detector.drive.check_status().await {
                "Google Drive is connected."
            } else {
                "Google Drive is not connected. Run `textprobe drive connect`."
            };
            output::print_notice(&mut out, message, color)?;
            Ok(())
        }
        DriveAction::Connect => match ensure_drive(&detector).await {
            Ok(true) => {
                output::print_notice(&mut out, "Google Drive connected.", color)?;
                Ok(())
            }
            Ok(false) => anyhow::bail!("Drive authorization was not completed."),
            Err(e) => report(&detector, e, color),
        },
    }
}
