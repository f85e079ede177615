use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "ask", version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Prompt to send to the model.
    ///
    /// All words are joined with spaces. When no words are given, the prompt
    /// is read from piped stdin: `cat question.md | ask`.
    pub prompt: Vec<String>,

    /// Model to use for the completion.
    #[arg(long, short = 'm', global = true)]
    pub model: Option<String>,

    /// Width used to wrap prose. Defaults to the terminal width.
    #[arg(long, short = 'w', global = true)]
    pub width: Option<usize>,

    /// Hide markdown punctuation such as backticks and asterisks.
    #[arg(long, default_value_t = false, global = true)]
    pub hide_markdown: bool,

    /// Wait for the complete answer instead of streaming it.
    #[arg(long, default_value_t = false)]
    pub no_stream: bool,

    /// Directory holding the API key, initial prompt and history.
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Enable verbose logging output.
    #[arg(long, default_value_t = false, global = true)]
    pub verbose: bool,

    /// Top-level subcommands.
    #[command(subcommand)]
    pub subcommands: Option<TopLevelCommand>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TopLevelCommand {
    /// Render recent answers from the history again.
    Replay {
        /// Number of answers to render.
        #[arg(default_value_t = 50)]
        count: usize,
    },

    /// Render a local markdown file, or stdin, through the streaming renderer.
    Render {
        /// File to render. Reads stdin when omitted.
        path: Option<PathBuf>,

        /// Number of characters fed to the renderer at a time.
        #[arg(long, default_value_t = 7)]
        chunk_size: usize,
    },
}
