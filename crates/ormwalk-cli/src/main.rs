//! ormwalk command-line plan inspector.
//!
//! Loads a schema bundle, plans a criteria query or an entity load and
//! prints the resulting join plan.

mod commands;
mod config;
mod error;
mod formatter;

use clap::Parser;
use config::Args;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    // Logs go to stderr so plan output stays parseable.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ormwalk_cli=info,ormwalk_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let format = args.format;
    let formatter = formatter::create_formatter(format);

    let result = args.into_config().and_then(|config| {
        tracing::debug!(
            schema = %config.schema_path.display(),
            request = ?config.request,
            %format,
            "configuration loaded"
        );
        commands::run(&config)
    });

    match result {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("{}", formatter.format_error(&e.to_string()));
            std::process::exit(1);
        }
    }
}
