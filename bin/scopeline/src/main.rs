//! Scopeline command line front-end.
//!
//! * `tokenize`: print the node tree of a file
//! * `check`: compile grammars and report disabled patterns
//! * `replay`: feed edits through the incremental scheduler

mod cli;
mod commands;

use clap::Parser;
use scopeline_syntax::ScopelineConfig;
use tracing::debug;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	setup_tracing(cli.verbose);

	let config = match &cli.config {
		Some(path) => ScopelineConfig::load(path)?,
		None => ScopelineConfig::default(),
	};
	debug!(config = ?config, "config.loaded");

	match &cli.command {
		Command::Tokenize { grammars, input } => commands::tokenize(&config, grammars, input),
		Command::Check { grammars } => commands::check(&config, grammars),
		Command::Replay { grammars, input, edits } => commands::replay(&config, grammars, input, edits).await,
	}
}

fn setup_tracing(verbose: u8) {
	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::prelude::*;

	let filter = EnvFilter::try_from_env("SCOPELINE_LOG").unwrap_or_else(|_| match verbose {
		0 => EnvFilter::new("warn"),
		1 => EnvFilter::new("scopeline=debug,scopeline_syntax=debug,info"),
		_ => EnvFilter::new("trace"),
	});

	tracing_subscriber::registry()
		.with(filter)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(true))
		.init();
}
