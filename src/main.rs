// src/main.rs

use anyhow::{Context, Result};
use autocss::analysis::analyze;
use autocss::apply::apply;
use autocss::archive::archive;
use autocss::cancellation::CancellationToken;
use autocss::cli::{Cli, Commands};
use autocss::completion::{generate_code, OpenAiClient};
use autocss::config::{Config, ConfigBuilder};
use autocss::errors::Error;
use autocss::pipeline::enhance;
use autocss::prompt::assemble;
use autocss::signal::setup_signal_handler;
use clap::Parser;

#[cfg(feature = "web")]
use autocss::web::{start_server, AppState};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                if cfg!(debug_assertions) {
                    "autocss=debug".parse()?
                } else {
                    "autocss=info".parse()?
                },
            ),
        )
        .init();

    log::info!("Starting autocss v{}...", env!("CARGO_PKG_VERSION"));
    log::debug!("Raw arguments: {:?}", std::env::args().collect::<Vec<_>>());

    // Keep build paths out of panic output.
    std::panic::set_hook(Box::new(|info| {
        let msg = match info.payload().downcast_ref::<&str>() {
            Some(s) => (*s).to_string(),
            None => match info.payload().downcast_ref::<String>() {
                Some(s) => s.clone(),
                None => "Box<Any>".to_string(),
            },
        };
        eprintln!(
            "Application Error: {}",
            msg.replace(env!("CARGO_MANIFEST_DIR"), "<redacted>")
                .replace(std::path::MAIN_SEPARATOR, "/")
        );
    }));

    let cli = Cli::parse();
    let config = ConfigBuilder::from_cli(&cli.global).build()?;
    let token = setup_signal_handler()?;

    let rt = tokio::runtime::Runtime::new()?;
    if let Err(e) = rt.block_on(dispatch(cli.command, config, token)) {
        if matches!(e.downcast_ref::<Error>(), Some(Error::Interrupted)) {
            eprintln!("\nOperation cancelled.");
            std::process::exit(130);
        }
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn dispatch(command: Commands, config: Config, token: CancellationToken) -> Result<()> {
    match command {
        Commands::Analyze { dir } => {
            let summary = analyze(&dir, &config).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Prompt { dir, instructions } => {
            let summary = analyze(&dir, &config).await?;
            println!(
                "{}",
                assemble(&summary, instructions.as_deref(), config.prompt_excerpt_limit)
            );
        }
        Commands::Generate {
            dir,
            instructions,
            output,
        } => {
            let client = OpenAiClient::new(&config.completion)?;
            let outcome = enhance(&dir, instructions.as_deref(), &client, &config, &token).await?;
            let report = &outcome.generated.report;
            println!("Enhanced project written to {}", outcome.enhanced_dir.display());
            println!(
                "Responsive design: {:?} ({} media queries). {}",
                report.status, report.media_queries, report.message
            );
            if let Some(zip) = output {
                archive(&outcome.enhanced_dir, &zip).await?;
                println!("Archive written to {}", zip.display());
            }
        }
        Commands::Apply { dir, css } => {
            let stylesheet = tokio::fs::read_to_string(&css)
                .await
                .with_context(|| format!("Failed to read stylesheet '{}'", css.display()))?;
            let enhanced = apply(&dir, &stylesheet, &config).await?;
            println!("Enhanced project written to {}", enhanced.display());
        }
        Commands::Archive { dir, zip } => {
            archive(&dir, &zip).await?;
            println!("Archive written to {}", zip.display());
        }
        Commands::Code { prompt } => {
            let client = OpenAiClient::new(&config.completion)?;
            let generated = generate_code(&prompt, &client, &config.completion, &token).await?;
            println!("{}", generated.code);
        }
        #[cfg(feature = "web")]
        Commands::Serve { port, no_open } => {
            let mut state = AppState::from_config(config)?;
            state.shutdown = token;
            start_server(state, port, !no_open).await?;
        }
    }
    Ok(())
}
