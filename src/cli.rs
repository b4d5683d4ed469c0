//! Command line parsing and dispatch

use crate::bridge::{self, Bridge};
use crate::controller::{Bsh, Controller, Target};
use crate::error::{Error, Result};
use crate::lights::Light;
use crate::state::{self, BridgeRecord, Lock, State};
use clap::{ArgAction, ArgGroup, Parser};
use std::fmt::Display;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Control Philips Hue lights through a local Hue bridge.
///
/// Lights are addressed by bridge id or by name. Several lights are separated by ';'.
#[derive(Parser, Debug, Clone)]
#[command(name = "hue-controller", version, about)]
#[command(group(ArgGroup::new("action").required(true)))]
pub struct Cli {
	/// Bridge to talk to. May be omitted when only one bridge is initialized.
	#[arg(short, long, value_name = "NAME")]
	pub bridge: Option<String>,

	/// Directory holding bridge state [default: $HUE_CONTROLLER_HOME or ~/.hue_controller]
	#[arg(long, value_name = "DIR")]
	pub state_dir: Option<PathBuf>,

	/// More output, repeat for more detail. RUST_LOG overrides.
	#[arg(short, long, action = ArgAction::Count)]
	pub verbose: u8,

	/// Pair with the bridge at IP. Press the bridge's link button first.
	#[arg(long, num_args = 2, value_names = ["NAME", "IP"], group = "action")]
	pub init_bridge: Option<Vec<String>>,

	/// List initialized bridges
	#[arg(long, group = "action")]
	pub show_bridges: bool,

	/// List lights connected to the bridge
	#[arg(long, group = "action")]
	pub show_lights: bool,

	/// List groups defined for the bridge
	#[arg(long, group = "action")]
	pub show_groups: bool,

	/// Remove a stale lock file of the bridge
	#[arg(long, group = "action")]
	pub reset_lock: bool,

	/// Create a group of lights
	#[arg(long, value_name = "GROUP|LIGHTS", group = "action")]
	pub create_group: Option<Assignment<LightList>>,

	/// Remove a group
	#[arg(long, value_name = "GROUP", group = "action")]
	pub remove_group: Option<String>,

	/// Turn lights on
	#[arg(long, value_name = "LIGHTS", group = "action")]
	pub on: Option<LightList>,

	/// Turn lights off
	#[arg(long, value_name = "LIGHTS", group = "action")]
	pub off: Option<LightList>,

	/// Toggle each light individually
	#[arg(long, value_name = "LIGHTS", group = "action")]
	pub toggle: Option<LightList>,

	/// Turn all lights of a group on
	#[arg(long, value_name = "GROUP", group = "action")]
	pub group_on: Option<String>,

	/// Turn all lights of a group off
	#[arg(long, value_name = "GROUP", group = "action")]
	pub group_off: Option<String>,

	/// Toggle each light of a group individually
	#[arg(long, value_name = "GROUP", group = "action")]
	pub toggle_group: Option<String>,

	/// Set brightness and saturation (percent) and hue (0-65535). Empty values are left unchanged.
	#[arg(long, value_name = "LIGHTS|B;S;H", group = "action")]
	pub set_bsh: Option<Assignment<Bsh>>,

	/// Like --set-bsh, for a group
	#[arg(long, value_name = "GROUP|B;S;H", group = "action")]
	pub set_bsh_group: Option<Assignment<Bsh>>,

	/// Increment brightness and saturation (percent) and hue
	#[arg(long, value_name = "LIGHTS|B;S;H", group = "action")]
	pub inc_bsh: Option<Assignment<Bsh>>,

	/// Like --inc-bsh, for a group
	#[arg(long, value_name = "GROUP|B;S;H", group = "action")]
	pub inc_bsh_group: Option<Assignment<Bsh>>,

	/// Set color temperature in mireds (153-500)
	#[arg(long, value_name = "LIGHTS|MIREDS", group = "action")]
	pub set_ct: Option<Assignment<i64>>,

	/// Like --set-ct, for a group
	#[arg(long, value_name = "GROUP|MIREDS", group = "action")]
	pub set_ct_group: Option<Assignment<i64>>,

	/// Set CIE xy color coordinates (0.0-1.0)
	#[arg(long, value_name = "LIGHTS|X;Y", group = "action")]
	pub set_xy: Option<Assignment<Xy>>,

	/// Like --set-xy, for a group
	#[arg(long, value_name = "GROUP|X;Y", group = "action")]
	pub set_xy_group: Option<Assignment<Xy>>,
}

/// Light references separated by `;`
#[derive(Debug, Clone, PartialEq)]
pub struct LightList(pub Vec<String>);

impl FromStr for LightList {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		let lights: Vec<String> = s
			.split(';')
			.map(str::trim)
			.filter(|light| !light.is_empty())
			.map(String::from)
			.collect();
		if lights.is_empty() {
			return Err("no lights given".to_string());
		}
		Ok(LightList(lights))
	}
}

/// `target|value`
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment<T> {
	pub target: String,
	pub value: T,
}

impl<T> FromStr for Assignment<T>
where
	T: FromStr,
	T::Err: Display,
{
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		let (target, value) = s
			.split_once('|')
			.ok_or_else(|| format!("expected 'TARGET|VALUES', got '{}'", s))?;
		let target = target.trim();
		if target.is_empty() {
			return Err("no target given before '|'".to_string());
		}
		let value = value.trim().parse().map_err(|err: T::Err| err.to_string())?;
		Ok(Assignment {
			target: target.to_string(),
			value,
		})
	}
}

/// CIE xy coordinates, `x;y`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Xy(pub f32, pub f32);

impl FromStr for Xy {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		let (x, y) = s
			.split_once(';')
			.ok_or_else(|| format!("expected 'X;Y', got '{}'", s))?;
		let parse = |v: &str| {
			v.trim()
				.parse::<f32>()
				.map_err(|_| format!("'{}' is not a number", v))
		};
		Ok(Xy(parse(x)?, parse(y)?))
	}
}

fn light_target(spec: &str) -> Result<Target> {
	spec.parse::<LightList>()
		.map(|list| Target::Lights(list.0))
		.map_err(Error::InvalidInput)
}

/// The single thing an invocation does
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
	InitBridge { name: String, ip: String },
	ShowBridges,
	ShowLights,
	ShowGroups,
	ResetLock,
	CreateGroup { group: String, lights: Vec<String> },
	RemoveGroup(String),
	On(Target),
	Off(Target),
	Toggle(Target),
	SetBsh(Target, Bsh),
	IncrementBsh(Target, Bsh),
	SetColorTemperature(Target, i64),
	SetXy(Target, Xy),
}

impl Cli {
	pub fn action(&self) -> Result<Action> {
		let cli = self.clone();
		let action = if let Some(args) = cli.init_bridge {
			match args.as_slice() {
				[name, ip] => Action::InitBridge {
					name: name.clone(),
					ip: ip.clone(),
				},
				_ => return Err(Error::InvalidInput("--init-bridge takes NAME and IP".to_string())),
			}
		} else if cli.show_bridges {
			Action::ShowBridges
		} else if cli.show_lights {
			Action::ShowLights
		} else if cli.show_groups {
			Action::ShowGroups
		} else if cli.reset_lock {
			Action::ResetLock
		} else if let Some(spec) = cli.create_group {
			Action::CreateGroup {
				group: spec.target,
				lights: spec.value.0,
			}
		} else if let Some(group) = cli.remove_group {
			Action::RemoveGroup(group)
		} else if let Some(lights) = cli.on {
			Action::On(Target::Lights(lights.0))
		} else if let Some(lights) = cli.off {
			Action::Off(Target::Lights(lights.0))
		} else if let Some(lights) = cli.toggle {
			Action::Toggle(Target::Lights(lights.0))
		} else if let Some(group) = cli.group_on {
			Action::On(Target::Group(group))
		} else if let Some(group) = cli.group_off {
			Action::Off(Target::Group(group))
		} else if let Some(group) = cli.toggle_group {
			Action::Toggle(Target::Group(group))
		} else if let Some(a) = cli.set_bsh {
			Action::SetBsh(light_target(&a.target)?, a.value)
		} else if let Some(a) = cli.set_bsh_group {
			Action::SetBsh(Target::Group(a.target), a.value)
		} else if let Some(a) = cli.inc_bsh {
			Action::IncrementBsh(light_target(&a.target)?, a.value)
		} else if let Some(a) = cli.inc_bsh_group {
			Action::IncrementBsh(Target::Group(a.target), a.value)
		} else if let Some(a) = cli.set_ct {
			Action::SetColorTemperature(light_target(&a.target)?, a.value)
		} else if let Some(a) = cli.set_ct_group {
			Action::SetColorTemperature(Target::Group(a.target), a.value)
		} else if let Some(a) = cli.set_xy {
			Action::SetXy(light_target(&a.target)?, a.value)
		} else if let Some(a) = cli.set_xy_group {
			Action::SetXy(Target::Group(a.target), a.value)
		} else {
			return Err(Error::InvalidInput(
				"no action given, see --help for the available options".to_string(),
			));
		};
		Ok(action)
	}
}

fn emit<W: Write>(out: &mut W, line: impl Display) -> Result<()> {
	writeln!(out, "{}", line).map_err(|err| Error::io("<stdout>", err))
}

/// Bridge named with `-b`, or the only one initialized
fn select_bridge(dir: &Path, explicit: Option<&str>) -> Result<String> {
	if let Some(name) = explicit {
		return Ok(name.to_string());
	}
	let mut names = state::list_bridges(dir)?;
	match names.len() {
		0 => Err(Error::NoBridge),
		1 => Ok(names.remove(0)),
		_ => Err(Error::InvalidInput(format!(
			"several bridges are initialized ({}), choose one with -b",
			names.join(", ")
		))),
	}
}

fn init_bridge<W: Write>(dir: &Path, name: &str, ip: &str, out: &mut W) -> Result<()> {
	let _lock = Lock::acquire(dir, name)?;
	let mut state = State::load(dir, name)?;
	let username = Bridge::register(ip, bridge::DEVICE_TYPE)?;
	state.bridge = Some(BridgeRecord {
		ip: bridge::base_url(ip),
		username,
	});
	state.save(dir, name)?;
	emit(out, format!("Created Hue Bridge {} at IP {}", name, ip))
}

fn print_lights<W: Write>(out: &mut W, lights: &[Light]) -> Result<()> {
	for light in lights {
		emit(out, light)?;
	}
	Ok(())
}

fn print_changed<W: Write>(out: &mut W, lights: &[Light]) -> Result<()> {
	for light in lights {
		emit(out, format!("{:>3}  {}", light.id, light.name))?;
	}
	Ok(())
}

/// Run one action against bridge `name`, saving its state when groups changed.
fn execute<W: Write>(dir: &Path, name: &str, action: Action, out: &mut W) -> Result<()> {
	let _lock = Lock::acquire(dir, name)?;
	let mut state = State::load(dir, name)?;
	let record = state.bridge(name)?.clone();

	if let Action::ShowGroups = action {
		for (group, ids) in &state.groups {
			emit(out, format!("{:>15}: {}", group, ids.join(", ")))?;
		}
		return Ok(());
	}

	let bridge = Bridge::new(&record.ip, &record.username)?;
	let mut controller = Controller::new(bridge, &mut state);
	let changed = match action {
		Action::ShowLights => {
			print_lights(out, &controller.lights()?)?;
			false
		}
		Action::CreateGroup { group, lights } => {
			let ids = controller.create_group(&group, &lights)?;
			emit(out, format!("Created group {}: {}", group, ids.join(", ")))?;
			true
		}
		Action::RemoveGroup(group) => {
			let ids = controller.remove_group(&group)?;
			emit(out, format!("Removed group {} ({})", group, ids.join(", ")))?;
			true
		}
		Action::On(target) => {
			print_changed(out, &controller.turn_on(&target)?)?;
			false
		}
		Action::Off(target) => {
			print_changed(out, &controller.turn_off(&target)?)?;
			false
		}
		Action::Toggle(target) => {
			print_changed(out, &controller.toggle(&target)?)?;
			false
		}
		Action::SetBsh(target, bsh) => {
			print_changed(out, &controller.set_bsh(&target, bsh)?)?;
			false
		}
		Action::IncrementBsh(target, increments) => {
			print_changed(out, &controller.increment_bsh(&target, increments)?)?;
			false
		}
		Action::SetColorTemperature(target, mireds) => {
			print_changed(out, &controller.set_color_temperature(&target, mireds)?)?;
			false
		}
		Action::SetXy(target, Xy(x, y)) => {
			print_changed(out, &controller.set_xy(&target, x, y)?)?;
			false
		}
		Action::InitBridge { .. }
		| Action::ShowBridges
		| Action::ShowGroups
		| Action::ResetLock => false,
	};
	if changed {
		state.save(dir, name)?;
	}
	Ok(())
}

/// Run what `cli` asks for, writing results to `out`.
pub fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<()> {
	let dir = state::state_dir(cli.state_dir.clone())?;
	debug!("state directory {}", dir.display());
	match cli.action()? {
		Action::InitBridge { name, ip } => init_bridge(&dir, &name, &ip, out),
		Action::ShowBridges => {
			for name in state::list_bridges(&dir)? {
				emit(out, name)?;
			}
			Ok(())
		}
		Action::ResetLock => {
			let name = select_bridge(&dir, cli.bridge.as_deref())?;
			if Lock::reset(&dir, &name)? {
				emit(out, format!("Removed lockfile for bridge '{}'.", name))
			} else {
				emit(out, format!("No lockfile found for bridge '{}'.", name))
			}
		}
		action => {
			let name = select_bridge(&dir, cli.bridge.as_deref())?;
			execute(&dir, &name, action, out)
		}
	}
}
