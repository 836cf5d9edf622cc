//! Error type shared by every `sufm` command.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error(transparent)]
	Shell(#[from] sufm::ShellError),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("output encoding failed: {0}")]
	Json(#[from] serde_json::Error),

	#[error("{0}")]
	Input(String),

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}

impl CliError {
	pub fn input(message: impl Into<String>) -> Self {
		Self::Input(message.into())
	}
}
