// src/cli.rs

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Generates a responsive stylesheet for a static web project with an LLM.
///
/// autocss walks a project directory, collects the HTML files' classes, ids
/// and structure, asks an OpenAI-compatible chat API for a stylesheet, and
/// writes an enhanced copy of the project (next to the original, in
/// `enhanced/`) with the stylesheet linked from every HTML page. Set
/// `OPENAI_API_KEY` (or put it in a `.env` file) before generating.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand. Unset options fall back to the
/// environment, then to built-in defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Directory holding stored projects and download archives (web server).
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Chat model to request (default: gpt-4, or AUTOCSS_MODEL).
    #[arg(long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Base URL of an OpenAI-compatible API (default: https://api.openai.com/v1).
    #[arg(long, global = true, value_name = "URL")]
    pub api_base: Option<String>,

    /// Maximum characters kept from each HTML body.
    #[arg(long, global = true, value_name = "CHARS")]
    pub excerpt_limit: Option<usize>,

    /// Follow symbolic links while walking a project (cycles are skipped).
    #[arg(long, global = true, action = clap::ArgAction::SetTrue)]
    pub follow_symlinks: bool,

    /// Seconds to wait for each completion attempt.
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Retries after a failed completion attempt.
    #[arg(long, global = true, value_name = "COUNT")]
    pub retries: Option<u32>,

    /// Maximum total size of one upload (e.g., "50MiB").
    #[arg(long, global = true, value_name = "BYTES")]
    pub max_upload_size: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the project summary (files, classes, ids, samples) as JSON.
    Analyze {
        /// Project root directory.
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// Print the prompt that would be sent for a project, without calling the API.
    Prompt {
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Extra requirements appended to the prompt verbatim.
        #[arg(short = 'i', long, value_name = "TEXT")]
        instructions: Option<String>,
    },

    /// Generate a stylesheet and write the enhanced copy of the project.
    Generate {
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Extra requirements appended to the prompt verbatim.
        #[arg(short = 'i', long, value_name = "TEXT")]
        instructions: Option<String>,

        /// Also zip the enhanced copy into this file.
        #[arg(short = 'o', long, value_name = "ZIP")]
        output: Option<PathBuf>,
    },

    /// Apply an existing stylesheet to a project (no API call).
    Apply {
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Stylesheet to install as autocss-generated.css.
        #[arg(long, value_name = "FILE")]
        css: PathBuf,
    },

    /// Zip a directory.
    Archive {
        /// Directory to archive.
        dir: PathBuf,

        /// Destination zip file.
        zip: PathBuf,
    },

    /// Generate code for a free-form prompt and print it.
    Code {
        /// What to generate.
        prompt: String,
    },

    #[cfg(feature = "web")]
    /// Start the web UI server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value_t = 8080, env = "PORT")]
        port: u16,

        /// Do not open the browser automatically.
        #[arg(long, action = clap::ArgAction::SetTrue)]
        no_open: bool,
    },
}
