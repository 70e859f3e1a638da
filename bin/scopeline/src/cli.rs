use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};

/// Scopeline command line arguments.
#[derive(Parser, Debug)]
#[command(name = "scopeline")]
#[command(about = "TextMate grammar tokenizer and incremental syntax scheduler")]
pub struct Cli {
	/// Configuration file (TOML)
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Verbose logging (repeat for more)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Tokenize a file and print its node tree
	Tokenize {
		#[command(flatten)]
		grammars: GrammarArgs,

		/// File to tokenize
		input: PathBuf,
	},
	/// Load and compile grammars, reporting broken patterns
	Check {
		/// Grammar files (.json, .yaml)
		#[arg(required = true)]
		grammars: Vec<PathBuf>,
	},
	/// Drive the incremental scheduler with a sequence of edits
	Replay {
		#[command(flatten)]
		grammars: GrammarArgs,

		/// Initial document
		input: PathBuf,

		/// Edit as `offset:delete:insert`, applied in order
		#[arg(long = "edit", value_name = "EDIT")]
		edits: Vec<EditArg>,
	},
}

#[derive(Args, Debug)]
pub struct GrammarArgs {
	/// Grammar files to register (.json, .yaml)
	#[arg(short, long = "grammar", value_name = "FILE", required = true)]
	pub grammars: Vec<PathBuf>,

	/// Scope of the entry grammar; detected from the input when omitted
	#[arg(short, long, value_name = "SCOPE")]
	pub scope: Option<String>,
}

/// One `offset:delete:insert` edit. `\n` in the inserted text is a newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditArg {
	pub offset: usize,
	pub delete: usize,
	pub insert: String,
}

impl FromStr for EditArg {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let mut parts = s.splitn(3, ':');
		let (Some(offset), Some(delete)) = (parts.next(), parts.next()) else {
			return Err(format!("expected offset:delete:insert, got {s:?}"));
		};
		let offset = offset.parse().map_err(|e| format!("bad offset {offset:?}: {e}"))?;
		let delete = delete.parse().map_err(|e| format!("bad delete length {delete:?}: {e}"))?;
		let insert = parts.next().unwrap_or_default().replace("\\n", "\n");
		Ok(Self { offset, delete, insert })
	}
}
