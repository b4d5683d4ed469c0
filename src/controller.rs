//! Light and group operations behind the command line verbs.
//!
//! Lights are always addressed by their bridge id. References given by the
//! user (an id or a light name) are resolved against the bridge's current
//! light list before anything is sent.

use crate::bridge::Bridge;
use crate::error::{Error, Result};
use crate::lights::{self, Light, StateChange};
use crate::state::State;
use std::str::FromStr;

/// Brightness, saturation and hue values, each optional.
///
/// Brightness and saturation are percentages, hue is on the bridge's 0..=65535 scale.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Bsh {
	pub brightness: Option<i64>,
	pub saturation: Option<i64>,
	pub hue: Option<i64>,
}

impl FromStr for Bsh {
	type Err = String;

	/// Parse `brightness;saturation;hue`. Empty fields are left unset.
	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		let fields: Vec<&str> = s.split(';').map(str::trim).collect();
		if fields.len() > 3 {
			return Err(format!("expected at most three values, got '{}'", s));
		}
		let mut values = [None; 3];
		for (value, field) in values.iter_mut().zip(fields.iter()) {
			if !field.is_empty() {
				*value = Some(
					field
						.parse::<i64>()
						.map_err(|_| format!("'{}' is not a whole number", field))?,
				);
			}
		}
		let bsh = Bsh {
			brightness: values[0],
			saturation: values[1],
			hue: values[2],
		};
		if bsh == Bsh::default() {
			return Err("no brightness, saturation or hue given".to_string());
		}
		Ok(bsh)
	}
}

impl Bsh {
	/// The state change setting these values, clamped to what the bridge accepts.
	///
	/// A brightness of zero switches the light off instead. Any other value
	/// switches it on, as does a saturation or hue given without brightness.
	pub fn to_change(&self) -> StateChange {
		let mut change = StateChange::default();
		if let Some(brightness) = self.brightness {
			let level = lights::percent_to_level(brightness);
			if level == 0 {
				change.on = Some(false);
			} else {
				change.on = Some(true);
				change.bri = Some(level);
			}
		} else if self.saturation.is_some() || self.hue.is_some() {
			change.on = Some(true);
		}
		change.sat = self.saturation.map(lights::percent_to_level);
		change.hue = self.hue.map(lights::clamp_hue);
		change
	}

	fn check_supported(&self, light: &Light) -> Result<()> {
		let state = &light.state;
		let missing = if self.brightness.is_some() && state.bri.is_none() {
			Some("brightness")
		} else if self.saturation.is_some() && state.sat.is_none() {
			Some("saturation")
		} else if self.hue.is_some() && state.hue.is_none() {
			Some("hue")
		} else {
			None
		};
		match missing {
			Some(param) => Err(Error::UnsupportedParameter {
				light: light.name.clone(),
				param,
			}),
			None => Ok(()),
		}
	}

	/// Absolute values after adding `self` as increments to the light's current state.
	///
	/// Without a brightness increment the current brightness is kept, so the
	/// light ends up switched on. It never drops to zero that way.
	fn incremented(&self, light: &Light) -> Result<Bsh> {
		self.check_supported(light)?;
		let state = &light.state;
		let current = state.bri.map(lights::level_to_percent);
		Ok(Bsh {
			brightness: match self.brightness {
				Some(inc) => current.map(|percent| percent + inc),
				None => current.map(|percent| percent.max(1)),
			},
			saturation: self
				.saturation
				.and_then(|inc| state.sat.map(|sat| lights::level_to_percent(sat) + inc)),
			hue: self
				.hue
				.and_then(|inc| state.hue.map(|hue| i64::from(hue) + inc)),
		})
	}
}

/// Which lights an operation applies to
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
	/// Light ids or names
	Lights(Vec<String>),
	/// A group defined with `create_group`
	Group(String),
}

/// Find a light by id, falling back to its name.
pub fn resolve<'a>(lights: &'a [Light], reference: &str) -> Option<&'a Light> {
	lights
		.iter()
		.find(|light| light.id == reference)
		.or_else(|| lights.iter().find(|light| light.name == reference))
}

pub struct Controller<'s> {
	bridge: Bridge,
	state: &'s mut State,
}

impl<'s> Controller<'s> {
	pub fn new(bridge: Bridge, state: &'s mut State) -> Controller<'s> {
		Controller { bridge, state }
	}

	pub fn lights(&self) -> Result<Vec<Light>> {
		self.bridge.lights()
	}

	/// Resolve every reference, failing on the first unknown one. Duplicates are dropped.
	///
	/// Group members are stored ids and only ever match a light id.
	fn targets(&self, target: &Target) -> Result<Vec<Light>> {
		let (references, ids_only) = match target {
			Target::Lights(references) => (references.as_slice(), false),
			Target::Group(group) => (self.state.group(group)?, true),
		};
		let lights = self.bridge.lights()?;
		let mut targets: Vec<Light> = Vec::new();
		for reference in references {
			let found = if ids_only {
				lights.iter().find(|light| light.id == *reference)
			} else {
				resolve(&lights, reference)
			};
			let light = found.ok_or_else(|| Error::UnknownLight(reference.clone()))?;
			if !targets.iter().any(|t| t.id == light.id) {
				targets.push(light.clone());
			}
		}
		Ok(targets)
	}

	/// Send one change per light, computed from its current state
	fn apply<F>(&self, target: &Target, change_for: F) -> Result<Vec<Light>>
	where
		F: Fn(&Light) -> Result<StateChange>,
	{
		let targets = self.targets(target)?;
		let changes = targets
			.iter()
			.map(|light| change_for(light))
			.collect::<Result<Vec<_>>>()?;
		for (light, change) in targets.iter().zip(changes.iter()) {
			info!("{} ({}): {}", light.name, light.id, serde_json::to_string(change)?);
			self.bridge.set_state(&light.id, change)?;
		}
		Ok(targets)
	}

	pub fn turn_on(&self, target: &Target) -> Result<Vec<Light>> {
		self.apply(target, |_| Ok(StateChange::power(true)))
	}

	pub fn turn_off(&self, target: &Target) -> Result<Vec<Light>> {
		self.apply(target, |_| Ok(StateChange::power(false)))
	}

	/// Flip each light individually
	pub fn toggle(&self, target: &Target) -> Result<Vec<Light>> {
		self.apply(target, |light| Ok(StateChange::power(!light.state.on)))
	}

	pub fn set_bsh(&self, target: &Target, bsh: Bsh) -> Result<Vec<Light>> {
		self.apply(target, |light| {
			bsh.check_supported(light)?;
			Ok(bsh.to_change())
		})
	}

	/// Add the same increments to every light. Lights starting from different
	/// states end up in different states.
	pub fn increment_bsh(&self, target: &Target, increments: Bsh) -> Result<Vec<Light>> {
		self.apply(target, |light| Ok(increments.incremented(light)?.to_change()))
	}

	/// Color temperature in mireds
	pub fn set_color_temperature(&self, target: &Target, mireds: i64) -> Result<Vec<Light>> {
		self.apply(target, |light| {
			if light.state.ct.is_none() {
				return Err(Error::UnsupportedParameter {
					light: light.name.clone(),
					param: "color temperature",
				});
			}
			Ok(StateChange {
				ct: Some(lights::clamp_ct(mireds)),
				..StateChange::power(true)
			})
		})
	}

	/// CIE xy color coordinates
	pub fn set_xy(&self, target: &Target, x: f32, y: f32) -> Result<Vec<Light>> {
		self.apply(target, |light| {
			if light.state.xy.is_none() {
				return Err(Error::UnsupportedParameter {
					light: light.name.clone(),
					param: "xy color",
				});
			}
			Ok(StateChange {
				xy: Some(lights::clamp_xy(x, y)),
				..StateChange::power(true)
			})
		})
	}

	/// Create or replace a group. Unknown lights are skipped with a warning.
	/// Returns the ids stored.
	pub fn create_group(&mut self, group: &str, references: &[String]) -> Result<Vec<String>> {
		if group.trim().is_empty() {
			return Err(Error::InvalidInput("group name must not be empty".to_string()));
		}
		let lights = self.bridge.lights()?;
		let mut ids: Vec<String> = Vec::new();
		for reference in references {
			match resolve(&lights, reference) {
				Some(light) if !ids.contains(&light.id) => ids.push(light.id.clone()),
				Some(_) => {}
				None => warn!(
					"could not find light {}, skipped when creating group {}",
					reference, group
				),
			}
		}
		if ids.is_empty() {
			return Err(Error::InvalidInput(format!(
				"none of the given lights exist, group {} not created",
				group
			)));
		}
		self.state.groups.insert(group.to_string(), ids.clone());
		Ok(ids)
	}

	/// Returns the ids the group held
	pub fn remove_group(&mut self, group: &str) -> Result<Vec<String>> {
		self.state
			.groups
			.remove(group)
			.ok_or_else(|| Error::UnknownGroup(group.to_string()))
	}
}
