use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use pagesnap_lib::Viewport;

#[derive(Debug, Parser)]
#[command(
    name = "pagesnap",
    version,
    about = "Capture a web page as raw HTML, rendered HTML and a full-page screenshot"
)]
pub struct Cli {
    #[arg(
        value_name = "TARGET",
        help = "Page to capture; a bare host such as example.com is fetched over https"
    )]
    pub target: String,

    #[arg(long, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, value_name = "PATH", help = "Path to a TOML config file")]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        short = 'o',
        value_name = "PATH",
        help = "Base directory for capture sessions (default: outputs)"
    )]
    pub output_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "pretty", help = "Report format")]
    pub format: OutputFormat,

    #[arg(long, help = "Browser viewport as WIDTHxHEIGHT (default: 1920x1080)")]
    pub viewport: Option<Viewport>,

    #[arg(
        long,
        value_name = "SECS",
        help = "Timeout for the static HTTP fetch in seconds (default: 15)"
    )]
    pub fetch_timeout: Option<u64>,

    #[arg(
        long,
        value_name = "SECS",
        help = "Deadline for the whole rendered capture in seconds (default: 120)"
    )]
    pub render_deadline: Option<u64>,

    #[arg(long, help = "Run the browser with a window (placed off-screen)")]
    pub headed: bool,

    #[arg(long, value_name = "PATH", help = "Chrome/Chromium executable to launch")]
    pub chrome: Option<PathBuf>,

    #[arg(
        long,
        help = "Stage artifacts as *.partial files and keep them only when a strategy fully succeeds"
    )]
    pub atomic_writes: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Pretty,
}
