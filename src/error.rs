use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
	#[error("could not reach bridge: {0}")]
	Network(#[from] reqwest::Error),
	/// An error entry returned by the bridge API
	#[error("bridge error {kind} at {address}: {description}")]
	Bridge {
		kind: u16,
		address: String,
		description: String,
	},
	#[error("press the link button on the bridge and try again")]
	LinkButtonNotPressed,
	#[error("bridge '{0}' is not initialized, run --init-bridge <NAME> <IP> first")]
	NotInitialized(String),
	#[error("not initialized: no bridge has been paired, run --init-bridge <NAME> <IP> first")]
	NoBridge,
	#[error("{0}")]
	InvalidInput(String),
	#[error("light '{0}' is not connected to the bridge")]
	UnknownLight(String),
	#[error("group '{0}' does not exist")]
	UnknownGroup(String),
	#[error("cannot set parameter {param} for light {light}")]
	UnsupportedParameter { light: String, param: &'static str },
	#[error("bridge '{0}' is locked by another invocation, use --reset-lock to clear a stale lock")]
	Locked(String),
	#[error("{}: {}", .path.display(), .source)]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("malformed JSON: {0}")]
	Json(#[from] serde_json::Error),
}

/// Coarse error category, used for exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	BadInput,
	NotInitialized,
	Network,
	Local,
}

impl Error {
	pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
		Error::Io {
			path: path.into(),
			source,
		}
	}

	pub fn kind(&self) -> ErrorKind {
		match self {
			Error::InvalidInput(_)
			| Error::UnknownLight(_)
			| Error::UnknownGroup(_)
			| Error::UnsupportedParameter { .. } => ErrorKind::BadInput,
			Error::NotInitialized(_) | Error::NoBridge => ErrorKind::NotInitialized,
			Error::Network(_) | Error::Bridge { .. } | Error::LinkButtonNotPressed => {
				ErrorKind::Network
			}
			Error::Locked(_) | Error::Io { .. } | Error::Json(_) => ErrorKind::Local,
		}
	}

	pub fn exit_code(&self) -> i32 {
		match self.kind() {
			ErrorKind::Local => 1,
			ErrorKind::BadInput => 2,
			ErrorKind::NotInitialized => 3,
			ErrorKind::Network => 4,
		}
	}
}
