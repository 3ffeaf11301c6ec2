use clap::{Parser, Subcommand};
use log::{LevelFilter, info};
use serde::Serialize;
use std::path::PathBuf;
use url::Url;

use vast_creative::async_api;
use vast_creative::config::Settings;
use vast_creative::error::{Result, VastError};

/// VAST creative resolver
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct ResolveArgs {
    /// Path or file:// URL of the VAST document
    #[arg(short, long)]
    input: String,

    /// JSON settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Render width for companions that declare none
    #[arg(long)]
    width: Option<u32>,

    /// Render height for companions that declare none
    #[arg(long)]
    height: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a VAST file and print the document model
    Parse {
        /// Path or file:// URL of the VAST document
        #[arg(short, long)]
        input: String,

        /// Pretty print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// List the companion and non-linear creatives that can be rendered
    Resources {
        #[command(flatten)]
        args: ResolveArgs,

        /// Pretty print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Print the markup and click-through for each renderable creative
    Render {
        #[command(flatten)]
        args: ResolveArgs,

        /// Click-through reported by the creative's own markup
        #[arg(long)]
        web_click: Option<String>,
    },
}

impl ResolveArgs {
    fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::from_path(path)?,
            None => Settings::default(),
        };
        if let Some(width) = self.width {
            settings.width = width;
        }
        if let Some(height) = self.height {
            settings.height = height;
        }
        Ok(settings)
    }
}

/// Read a VAST document from a local path or file:// URL
async fn read_input(input: &str) -> Result<String> {
    let path = if input.starts_with("file://") {
        Url::parse(input)?
            .to_file_path()
            .map_err(|_| VastError::Other(format!("Not a local file URL: {}", input)))?
    } else {
        PathBuf::from(input)
    };

    info!("Reading from file: {}", path.display());
    Ok(tokio::fs::read_to_string(path).await?)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if cli.verbose {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    match &cli.command {
        Commands::Parse { input, pretty } => {
            let content = read_input(input).await?;
            let vast = async_api::parse_vast(&content).await?;
            print_json(&vast, *pretty)?;
        }
        Commands::Resources { args, pretty } => {
            let settings = args.settings()?;
            let content = read_input(&args.input).await?;
            let creatives = async_api::resolve_companions(&content, &settings).await?;
            print_json(&creatives, *pretty)?;
        }
        Commands::Render { args, web_click } => {
            let settings = args.settings()?;
            let web_click = web_click.as_deref().or(settings.web_click_through.as_deref());
            let content = read_input(&args.input).await?;

            for creative in async_api::resolve_companions(&content, &settings).await? {
                let mut markup = String::new();
                creative.resource.render(&mut markup)?;

                println!(
                    "{:?} {} ({}x{})",
                    creative.placement,
                    creative.element_id.as_deref().unwrap_or("-"),
                    creative.resource.width(),
                    creative.resource.height()
                );
                println!("  markup: {}", markup);
                println!(
                    "  click-through: {}",
                    creative.click_through_url(web_click).unwrap_or("(none)")
                );
            }
        }
    }

    Ok(())
}
