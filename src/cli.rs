use clap::Parser;
use std::path::PathBuf;

/// Ask a chat-completions endpoint from the terminal
#[derive(Debug, Parser)]
#[command(name = "aichat")]
#[command(version)]
#[command(about = "Ask a chat-completions endpoint from the terminal", long_about = None)]
pub struct Args {
    /// Model name (overrides config)
    #[arg(short = 'm', long = "model")]
    pub model: Option<String>,

    /// Config file path (default: config.toml in the aichat config dir)
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Force a streamed response
    #[arg(long = "stream", conflicts_with = "no_stream")]
    pub stream: bool,

    /// Force a single plain JSON response
    #[arg(long = "no-stream")]
    pub no_stream: bool,

    /// Question text (positional)
    #[arg(value_name = "QUESTION")]
    pub question: Vec<String>,
}
