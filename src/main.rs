use clap::Parser;
use tokio::signal;
use tracing::info;

use derivgate::adapter::inbound::cli::command::{Cli, ColorChoice};
use derivgate::adapter::inbound::cli::{dispatch, output, paths};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let _ = dotenvy::from_path(paths::env_file());

    let args = Cli::parse();
    match args.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {}
    }
    output::configure(output::OutputConfig::new(args.json, args.quiet, args.verbose));

    // TLS uses the ring provider.
    let _ = rustls::crypto::ring::default_provider().install_default();

    tokio::select! {
        result = dispatch::run(args) => {
            if let Err(e) = result {
                output::error(&e.to_string());
                std::process::exit(1);
            }
        }
        _ = signal::ctrl_c() => {
            info!("Interrupted");
            output::say(output::Tone::Warn, "Interrupted");
            std::process::exit(130);
        }
    }
}
