//! Command-line surface of `sufm`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// How command results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable lines on stdout, diagnostics on stderr.
	Text,
	/// One JSON document on stdout.
	Json,
}

#[derive(Parser, Debug)]
#[command(name = "sufm")]
#[command(about = "File operations driven through a shared root shell session")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format
	#[arg(short, long, global = true, value_enum, default_value = "text")]
	pub format: OutputFormat,

	/// Never start a privileged session, even when an elevation helper exists
	#[arg(long, global = true)]
	pub no_root: bool,

	/// Skip the shell entirely and touch the filesystem directly
	#[arg(long, global = true)]
	pub no_shell: bool,

	/// Read settings from FILE instead of the default location
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Report which elevation helper, utility toolset, and interpreter this
	/// host provides
	Probe,

	/// Run a raw command line in the shared session
	Run {
		/// Command line handed to the interpreter verbatim
		line: String,

		/// Discard output and report only the exit status
		#[arg(long)]
		status_only: bool,
	},

	/// Delete files or directories
	#[command(alias = "rm")]
	Delete {
		/// Paths to remove
		#[arg(required = true)]
		paths: Vec<PathBuf>,
	},

	/// Copy files or directories into a destination directory
	#[command(alias = "cp")]
	Copy {
		/// Sources followed by the destination directory
		#[arg(required = true, num_args = 2..)]
		paths: Vec<PathBuf>,
	},

	/// Move files or directories into a destination directory
	#[command(alias = "mv")]
	Move {
		/// Sources followed by the destination directory
		#[arg(required = true, num_args = 2..)]
		paths: Vec<PathBuf>,
	},

	/// Rename a file or directory within its parent
	Rename {
		/// Path to rename
		path: PathBuf,

		/// New name, without any directory component
		new_name: String,
	},

	/// Create an empty file
	Touch {
		/// Path of the file to create
		path: PathBuf,
	},

	/// Create a directory
	Mkdir {
		/// Path of the directory to create
		path: PathBuf,
	},
}
