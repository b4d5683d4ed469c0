//! Per-bridge state kept on disk: the pairing record and the user's light groups.
//!
//! Every bridge gets `<dir>/<name>.json`. While a command runs against a
//! bridge, `<dir>/<name>.lck` marks it as busy.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Environment variable overriding the state directory
pub const HOME_ENV: &str = "HUE_CONTROLLER_HOME";
const DIR_NAME: &str = ".hue_controller";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
/// Address of a paired bridge and the username it issued
pub struct BridgeRecord {
	pub ip: String,
	pub username: String,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct State {
	pub bridge: Option<BridgeRecord>,
	/// Group name to light ids
	pub groups: BTreeMap<String, Vec<String>>,
}

/// State directory: the given one, else `$HUE_CONTROLLER_HOME`, else `~/.hue_controller`.
pub fn state_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
	if let Some(dir) = explicit {
		return Ok(dir);
	}
	if let Some(dir) = std::env::var_os(HOME_ENV) {
		return Ok(PathBuf::from(dir));
	}
	dirs::home_dir()
		.map(|home| home.join(DIR_NAME))
		.ok_or_else(|| {
			Error::InvalidInput(format!(
				"cannot determine home directory, set {}",
				HOME_ENV
			))
		})
}

fn state_path(dir: &Path, name: &str) -> PathBuf {
	dir.join(format!("{}.json", name))
}

fn lock_path(dir: &Path, name: &str) -> PathBuf {
	dir.join(format!("{}.lck", name))
}

fn check_name(name: &str) -> Result<()> {
	if name.is_empty()
		|| name.contains(|c: char| c == '/' || c == '\\')
		|| name.starts_with('.')
	{
		return Err(Error::InvalidInput(format!("invalid bridge name '{}'", name)));
	}
	Ok(())
}

/// Names of all initialized bridges, sorted
pub fn list_bridges(dir: &Path) -> Result<Vec<String>> {
	let entries = match fs::read_dir(dir) {
		Ok(entries) => entries,
		Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
		Err(err) => return Err(Error::io(dir, err)),
	};
	let mut names = Vec::new();
	for entry in entries {
		let path = entry.map_err(|err| Error::io(dir, err))?.path();
		if path.extension().map_or(false, |ext| ext == "json") {
			if let Some(stem) = path.file_stem() {
				names.push(stem.to_string_lossy().into_owned());
			}
		}
	}
	names.sort();
	Ok(names)
}

impl State {
	/// Load the state of bridge `name`. A missing file is an empty state.
	pub fn load(dir: &Path, name: &str) -> Result<State> {
		check_name(name)?;
		let path = state_path(dir, name);
		let content = match fs::read_to_string(&path) {
			Ok(content) => content,
			Err(err) if err.kind() == ErrorKind::NotFound => {
				debug!("no state file at {}", path.display());
				return Ok(State::default());
			}
			Err(err) => return Err(Error::io(path, err)),
		};
		Ok(serde_json::from_str(&content)?)
	}

	pub fn save(&self, dir: &Path, name: &str) -> Result<()> {
		check_name(name)?;
		fs::create_dir_all(dir).map_err(|err| Error::io(dir, err))?;
		let path = state_path(dir, name);
		let content = serde_json::to_string_pretty(self)?;
		debug!("writing {}", path.display());
		fs::write(&path, content).map_err(|err| Error::io(path, err))
	}

	/// The bridge record, or `NotInitialized` naming bridge `name`
	pub fn bridge(&self, name: &str) -> Result<&BridgeRecord> {
		self.bridge
			.as_ref()
			.ok_or_else(|| Error::NotInitialized(name.to_string()))
	}

	pub fn group(&self, name: &str) -> Result<&[String]> {
		self.groups
			.get(name)
			.map(Vec::as_slice)
			.ok_or_else(|| Error::UnknownGroup(name.to_string()))
	}
}

/// Marks a bridge as busy for as long as it lives
#[derive(Debug)]
pub struct Lock {
	path: PathBuf,
}

impl Lock {
	pub fn acquire(dir: &Path, name: &str) -> Result<Lock> {
		check_name(name)?;
		fs::create_dir_all(dir).map_err(|err| Error::io(dir, err))?;
		let path = lock_path(dir, name);
		match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
			Ok(_) => Ok(Lock { path }),
			Err(err) if err.kind() == ErrorKind::AlreadyExists => {
				Err(Error::Locked(name.to_string()))
			}
			Err(err) => Err(Error::io(path, err)),
		}
	}

	/// Remove a stale lock. Returns whether there was one.
	pub fn reset(dir: &Path, name: &str) -> Result<bool> {
		check_name(name)?;
		let path = lock_path(dir, name);
		match fs::remove_file(&path) {
			Ok(()) => Ok(true),
			Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
			Err(err) => Err(Error::io(path, err)),
		}
	}
}

impl Drop for Lock {
	fn drop(&mut self) {
		if let Err(err) = fs::remove_file(&self.path) {
			warn!("could not remove {}: {}", self.path.display(), err);
		}
	}
}
