use anyhow::{Context, Result};
use clap::Parser;
use fnschema::app::App;
use fnschema::config::Config;
use fnschema::controller::{DescriptorField, SchemaController};
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// fnschema - A terminal editor for function-calling schemas
#[derive(Parser, Debug)]
#[command(name = "fnschema")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to ~/.config/fnschema/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the final JSON to stdout on exit
    #[arg(short, long)]
    print: bool,

    /// Initial function name
    #[arg(short, long)]
    name: Option<String>,

    /// Initial function description
    #[arg(short, long)]
    description: Option<String>,
}

fn init_logging(config: &Config) -> Result<()> {
    let log_file = std::fs::File::create(&config.general.log_file).with_context(|| {
        format!(
            "Failed to create log file: {}",
            config.general.log_file.display()
        )
    })?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(log_file).with_ansi(false))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    // Load .env files (local first, then home directory)
    // Errors are ignored - files are optional
    let _ = dotenvy::from_filename(".env");
    if let Some(home) = dirs::home_dir() {
        let _ = dotenvy::from_path(home.join(".env"));
    }

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    init_logging(&config)?;
    tracing::debug!("Loaded config: {:?}", config);

    let mut controller = SchemaController::new(config.editor.property_naming);
    if let Some(name) = args.name {
        controller.update_field(DescriptorField::Name, name);
    }
    if let Some(description) = args.description {
        controller.update_field(DescriptorField::Description, description);
    }

    // Drop the app before printing so the terminal is restored first
    let buffer = {
        let mut app = App::new(config, controller)?;
        app.run()?
    };

    if args.print {
        println!("{}", buffer);
    }
    Ok(())
}
