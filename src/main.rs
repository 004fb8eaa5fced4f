use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

mod output;
mod pipeline;
mod splitter;
mod telemetry;
mod tokenizer;
mod window;

#[derive(Parser)]
#[command(name = "spanwin", about = "Window documents for span/relation models and merge the predictions back")]
struct Cli {
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split documents into overlapping windows with char/token maps
    Window(pipeline::window::WindowCmd),
    /// Fold per-window predictions back into one record per document
    Merge(pipeline::merge::MergeCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // stderr only; respects RUST_LOG and SPANWIN_LOG_FORMAT
    telemetry::config::init_tracing();

    match cli.command {
        Commands::Window(args) => pipeline::window::run(args).await?,
        Commands::Merge(args) => pipeline::merge::run(args).await?,
    }

    Ok(())
}
