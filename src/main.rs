mod cache;
mod ephemeris;
mod feed;
mod geocode;
mod geodesy;
mod service;
mod web;

use clap::{Parser, Subcommand};
use std::fs;
use std::process::ExitCode;

use crate::ephemeris::epoch::{format_epoch, format_feed_epoch};
use crate::ephemeris::{parse_oem, EphemerisSnapshot};
use crate::feed::{FeedSource, HttpFeed};
use crate::web::Config;

#[derive(Parser)]
#[command(name = "iss-tracker")]
#[command(about = "ISS ephemeris REST API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Download and parse the feed once
    Fetch {
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Parse a local OEM XML file
    Validate { feed: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => serve(config.as_deref()).await,
        Commands::Fetch { config } => fetch(config.as_deref()).await,
        Commands::Validate { feed } => validate(&feed),
    }
}

fn load_config(path: Option<&str>) -> Option<Config> {
    match Config::load(path) {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            None
        }
    }
}

async fn serve(config_path: Option<&str>) -> ExitCode {
    let Some(config) = load_config(config_path) else {
        return ExitCode::FAILURE;
    };

    match web::run_server(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn fetch(config_path: Option<&str>) -> ExitCode {
    let Some(config) = load_config(config_path) else {
        return ExitCode::FAILURE;
    };

    let feed = match HttpFeed::new(config.feed.url.clone(), config.feed.timeout) {
        Ok(feed) => feed,
        Err(e) => {
            eprintln!("Error creating HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let body = match feed.fetch().await {
        Ok(body) => body,
        Err(e) => {
            eprintln!("Fetch error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match parse_oem(&body) {
        Ok(snapshot) => {
            println!("Fetched {}", feed.url());
            print_summary(&snapshot);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Parse error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn validate(path: &str) -> ExitCode {
    let xml = match fs::read(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match parse_oem(&xml) {
        Ok(snapshot) => {
            println!("Feed is valid");
            print_summary(&snapshot);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Parse error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_summary(snapshot: &EphemerisSnapshot) {
    println!("  object: {}", snapshot.object_name().unwrap_or("unknown"));
    println!("  state vectors: {}", snapshot.state_vectors.len());
    println!("  comments: {}", snapshot.comments.len());
    if let Some((first, last)) = snapshot.span() {
        println!("  from: {} ({})", format_epoch(&first), format_feed_epoch(&first));
        println!("  to:   {} ({})", format_epoch(&last), format_feed_epoch(&last));
    }
}
