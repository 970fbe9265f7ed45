use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, warn};

use imgmeta::{Config, Inspector};

mod display;

#[derive(Parser, Debug)]
#[command(name = "imgmeta-analyzer", version, about = "Loads and displays metadata from image files.")]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Input image files
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /// Print each record as pretty JSON
    #[arg(long)]
    json: bool,

    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => p,
        None => return Ok(Config::default()),
    };
    if !path.exists() {
        warn!("Config file not found at {}. Using defaults.", path.display());
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}

fn run(cli: &Cli) -> Result<bool> {
    let config = load_config(cli.config.as_deref())?;
    debug!("using {:?}", config);
    let inspector = Inspector::new(config);

    let mut all_ok = true;
    for (i, path) in cli.files.iter().enumerate() {
        let md = match inspector.inspect_file(path) {
            Ok(md) => md,
            Err(e) => {
                eprintln!("Cannot load image metadata from {}: {}", path.display(), e);
                all_ok = false;
                continue;
            }
        };

        if cli.json {
            let json = serde_json::to_string_pretty(&md).context("Failed to serialize metadata")?;
            println!("{}", json);
        } else {
            if i > 0 {
                println!();
            }
            print!("{}", display::render(&md));
        }
    }
    Ok(all_ok)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
