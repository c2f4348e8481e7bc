//! `ollama-stream`: send a prompt, print the answer as it streams and save
//! any fenced code blocks it contains.

mod writer;

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use ollama_stream_client::{
    DEFAULT_GENERATE_URL, Dsn, GenerateRequest, OllamaClient, RequestOptions, StreamHandlers,
    TOKEN_ENV, URL_ENV,
};
use tracing_subscriber::EnvFilter;

use crate::writer::BlockWriter;

const DEFAULT_MODEL: &str = "llama3.2:3b";

#[derive(Parser, Debug)]
#[command(
    name = "ollama-stream",
    version,
    about = "Stream a completion from Ollama or Open WebUI and extract code blocks"
)]
struct CliArgs {
    /// Generate endpoint URL
    #[arg(long, env = URL_ENV, default_value = DEFAULT_GENERATE_URL)]
    url: String,

    /// Bearer token; empty sends no Authorization header
    #[arg(long, env = TOKEN_ENV, default_value = "", hide_env_values = true)]
    token: String,

    /// Model name
    #[arg(long, short, default_value = DEFAULT_MODEL)]
    model: String,

    /// Sampling temperature
    #[arg(long, short)]
    temperature: Option<f64>,

    /// System prompt
    #[arg(long)]
    system: Option<String>,

    /// Directory to save extracted code blocks into
    #[arg(long, short)]
    out: Option<PathBuf>,

    /// List loaded models instead of generating
    #[arg(long)]
    ps: bool,

    /// Prompt text; multiple words are joined with spaces
    #[arg(required_unless_present = "ps")]
    prompt: Vec<String>,
}

impl CliArgs {
    fn request(&self) -> GenerateRequest {
        let mut request = GenerateRequest::new(&self.model, self.prompt.join(" "));
        if let Some(system) = &self.system {
            request = request.system(system);
        }
        if self.temperature.is_some() {
            request = request.options(RequestOptions {
                temperature: self.temperature,
                ..Default::default()
            });
        }
        request
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let client = OllamaClient::new(Dsn::new(&args.url, &args.token));

    if args.ps {
        let status = client.ps().await?;
        for model in status.models {
            println!(
                "{}\t{}\t{}\t{}",
                model.name, model.details.parameter_size, model.details.quant_level, model.size
            );
        }
        return Ok(());
    }

    let mut writer = args.out.clone().map(BlockWriter::new);
    let mut handlers = StreamHandlers::new().on_event(|event| {
        if let Some(fragment) = event.fragment() {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(fragment.as_bytes())?;
            stdout.flush()?;
        }
        Ok(())
    });
    if let Some(writer) = writer.as_mut() {
        handlers = handlers.on_code_blocks(move |blocks| {
            for block in &blocks {
                writer.write(block)?;
            }
            Ok(())
        });
    }

    let summary = client.query(args.request(), &mut handlers).await?;
    drop(handlers);
    println!();

    tracing::info!(
        events = summary.events,
        completed = summary.completed,
        done_reason = ?summary.done_reason,
        "generation finished"
    );
    if let Some(writer) = &writer {
        for path in writer.written() {
            eprintln!("saved {}", path.display());
        }
    }
    Ok(())
}
