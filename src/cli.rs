use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Simple, file-backed task board.
/// Storage defaults to ~/.taskboard or a directory passed via --dir.
#[derive(Parser)]
#[command(name = "tb", version, about = "Daily task board with deadline-driven priority escalation")]
pub struct Cli {
    /// Directory holding tasks.json and completed_tasks.json.
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    /// Defaults to launching the board UI when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,
}
