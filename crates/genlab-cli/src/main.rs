mod console;
mod session;

use std::env;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use genlab_contracts::chat::{parse_intent, Intent};
use genlab_contracts::events::EventWriter;
use genlab_contracts::request::{AspectRatio, DurationSeconds, GenerationMode, GenerationRequest};
use genlab_contracts::sink::FanoutSink;
use genlab_engine::{ApiClient, CancellationToken, ClientConfig, Generator};
use uuid::Uuid;

use crate::console::ConsoleSink;
use crate::session::{help_line, ChatSession};

#[derive(Debug, Parser)]
#[command(name = "genlab", version, about = "Image and video generation client")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// API root; defaults to GENLAB_API_BASE or the public endpoint.
    #[arg(long, global = true)]
    api_base: Option<String>,
    /// Bearer key; defaults to GENLAB_API_KEY, then ARK_API_KEY.
    #[arg(long, global = true)]
    api_key: Option<String>,
    #[arg(long, global = true)]
    image_model: Option<String>,
    #[arg(long, global = true)]
    video_model: Option<String>,
    /// Seconds between status checks (0.2 to 30).
    #[arg(long, global = true)]
    poll_interval: Option<f64>,
    /// Status checks before giving up (1 to 1000).
    #[arg(long, global = true)]
    max_attempts: Option<u32>,
    /// Append lifecycle events to this JSONL file.
    #[arg(long, global = true)]
    events: Option<PathBuf>,
    /// Write a receipt per finished generation into this directory.
    #[arg(long, global = true)]
    receipts: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate one image and print its URL.
    Image(ImageArgs),
    /// Generate one video and print its URL.
    Video(VideoArgs),
    /// Interactive session.
    Chat(ChatArgs),
}

#[derive(Debug, Args)]
struct ImageArgs {
    #[arg(long, default_value = "")]
    prompt: String,
    #[arg(long, default_value = "16:9")]
    ratio: AspectRatio,
    #[arg(long)]
    attach: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct VideoArgs {
    #[arg(long, default_value = "")]
    prompt: String,
    #[arg(long, default_value = "5")]
    duration: DurationSeconds,
    #[arg(long)]
    attach: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ChatArgs {
    /// Starting mode.
    #[arg(long, default_value = "image")]
    mode: GenerationMode,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("genlab error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let generator = build_generator(&cli.global)?;
    match cli.command {
        Command::Image(args) => {
            let request = GenerationRequest::image(args.prompt, args.ratio);
            run_once(&generator, request, args.attach.as_deref())
        }
        Command::Video(args) => {
            let request = GenerationRequest::video(args.prompt, args.duration);
            run_once(&generator, request, args.attach.as_deref())
        }
        Command::Chat(args) => {
            run_chat(&generator, args.mode)?;
            Ok(0)
        }
    }
}

fn build_config(args: &GlobalArgs) -> Result<ClientConfig> {
    let lookup = |key: &str| -> Option<String> {
        let flag = match key {
            "GENLAB_API_BASE" => args.api_base.clone(),
            "GENLAB_API_KEY" => args.api_key.clone(),
            "GENLAB_IMAGE_MODEL" => args.image_model.clone(),
            "GENLAB_VIDEO_MODEL" => args.video_model.clone(),
            _ => None,
        };
        flag.or_else(|| env::var(key).ok())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };
    let mut config = ClientConfig::from_lookup(lookup)
        .context("pass --api-key or set GENLAB_API_KEY")?;
    if let Some(seconds) = args.poll_interval {
        config.poll = config
            .poll
            .with_interval_seconds(seconds)
            .context("invalid --poll-interval")?;
    }
    if let Some(attempts) = args.max_attempts {
        config.poll = config.poll.with_max_attempts(attempts);
    }
    Ok(config)
}

fn build_generator(args: &GlobalArgs) -> Result<Generator> {
    let config = build_config(args)?;
    log::debug!("using {config:?}");
    let mut generator = Generator::new(ApiClient::new(config)?);
    if let Some(path) = &args.events {
        let session_id = Uuid::new_v4().to_string();
        generator = generator.with_events(EventWriter::new(path, session_id));
    }
    if let Some(dir) = &args.receipts {
        generator = generator.with_receipts_dir(dir);
    }
    Ok(generator)
}

fn run_once(
    generator: &Generator,
    request: GenerationRequest,
    attach: Option<&Path>,
) -> Result<i32> {
    let attachment = attach
        .map(|path| generator.encode_attachment(path))
        .transpose()?;
    let request = request.with_attachment(attachment);
    let mut console = ConsoleSink::new(io::stdout(), io::stderr());
    match generator.generate(&request, &mut console, &CancellationToken::new()) {
        Ok(_) => Ok(0),
        // Already reported through the sink.
        Err(_) => Ok(1),
    }
}

fn run_chat(generator: &Generator, mode: GenerationMode) -> Result<()> {
    let mut session = ChatSession::new(mode);
    let mut console = ConsoleSink::new(io::stdout(), io::stderr());
    let stdin = io::stdin();
    let mut line = String::new();

    println!("genlab chat started in {mode} mode. Type /help for commands.");

    loop {
        print!("{}> ", session.mode);
        io::stdout().flush()?;

        line.clear();
        let read = match stdin.read_line(&mut line) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if read == 0 {
            break;
        }

        match parse_intent(line.trim_end_matches(['\n', '\r'])) {
            Intent::Noop => {}
            Intent::Generate { prompt } => {
                let request = session.request(&prompt);
                let mut sink = FanoutSink::new()
                    .with(&mut console)
                    .with(&mut session.latest);
                // Outcome is shown by the sinks.
                let _ = generator.generate(&request, &mut sink, &CancellationToken::new());
            }
            Intent::SwitchMode(mode) => {
                let message = session.switch_mode(mode);
                println!("{message} ({})", generator.resolve_model(mode));
            }
            Intent::SetRatio(raw) => println!("{}", session.set_ratio(&raw)),
            Intent::SetDuration(raw) => println!("{}", session.set_duration(&raw)),
            Intent::Attach { path } => {
                if path.is_empty() {
                    println!("/attach requires a path");
                    continue;
                }
                let message =
                    session.attach(Path::new(&path), |path| generator.encode_attachment(path));
                println!("{message}");
            }
            Intent::Detach => println!("{}", session.detach()),
            Intent::Status => {
                let model = generator.resolve_model(session.mode);
                for status in session.status_lines(&model) {
                    println!("{status}");
                }
            }
            Intent::Help => println!("{}", help_line()),
            Intent::Quit => break,
            Intent::Unknown { command, .. } => {
                println!("Unknown command: /{command}. {}", help_line());
            }
        }
    }
    Ok(())
}
