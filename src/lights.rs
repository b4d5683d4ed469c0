//! Light attributes as reported by the bridge, and the state changes sent back to it.

pub const MAX_LEVEL: u8 = 254;
pub const MAX_HUE: i64 = 65535;
pub const MIN_CT: i64 = 153;
pub const MAX_CT: i64 = 500;

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
#[serde(default)]
/// Attributes of a light
pub struct Light {
	/// Bridge-assigned id. Not part of the light object itself, the bridge
	/// uses it as the key of the lights map.
	#[serde(skip)]
	pub id: String,
	pub uniqueid: String,
	#[serde(rename = "type")]
	pub light_type: String,
	pub name: String,
	pub modelid: String,
	pub manufacturername: String,
	pub productid: String,
	pub state: LightState,
	pub swversion: String,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
/// Current state of a light
pub struct LightState {
	pub on: bool,
	/// Brightness
	#[serde(skip_serializing_if = "Option::is_none")]
	pub bri: Option<u8>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub hue: Option<u16>,
	/// Saturation
	#[serde(skip_serializing_if = "Option::is_none")]
	pub sat: Option<u8>,
	/// Color tone
	#[serde(skip_serializing_if = "Option::is_none")]
	pub ct: Option<u16>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub xy: Option<[f32; 2]>,
	/// Alert mode
	pub alert: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub colormode: Option<String>,
	pub reachable: bool,
}

#[derive(Serialize, Debug, Default, Clone, PartialEq)]
/// Body of a `PUT /lights/<id>/state` request. Unset fields are left untouched by the bridge.
pub struct StateChange {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub on: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub bri: Option<u8>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub hue: Option<u16>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub sat: Option<u8>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub ct: Option<u16>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub xy: Option<[f32; 2]>,
}

impl StateChange {
	pub fn power(on: bool) -> Self {
		StateChange {
			on: Some(on),
			..Default::default()
		}
	}

	pub fn is_empty(&self) -> bool {
		*self == StateChange::default()
	}
}

impl Light {
	/// Key for listing lights in bridge order: numeric ids first, by value.
	pub fn sort_key(&self) -> (u64, &str) {
		(self.id.parse().unwrap_or(u64::MAX), &self.id)
	}
}

impl std::fmt::Display for Light {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(
			f,
			"{:>3}  {:<24} {:<3}",
			self.id,
			self.name,
			if self.state.on { "on" } else { "off" }
		)?;
		if let Some(bri) = self.state.bri {
			write!(f, "  bri {:>3}%", level_to_percent(bri))?;
		}
		if !self.state.reachable {
			write!(f, "  (unreachable)")?;
		}
		Ok(())
	}
}

/// Map a percentage to the bridge's 0..=254 range. Values outside 0..=100 are clamped.
pub fn percent_to_level(percent: i64) -> u8 {
	(percent.max(0).min(100) * i64::from(MAX_LEVEL) / 100) as u8
}

/// Inverse of [`percent_to_level`], rounded to the nearest percent.
pub fn level_to_percent(level: u8) -> i64 {
	let level = i64::from(level.min(MAX_LEVEL));
	(level * 100 + i64::from(MAX_LEVEL) / 2) / i64::from(MAX_LEVEL)
}

pub fn clamp_hue(hue: i64) -> u16 {
	hue.max(0).min(MAX_HUE) as u16
}

/// Color temperature in mireds, limited to what Hue lamps accept.
pub fn clamp_ct(mireds: i64) -> u16 {
	mireds.max(MIN_CT).min(MAX_CT) as u16
}

pub fn clamp_xy(x: f32, y: f32) -> [f32; 2] {
	[x.max(0.0).min(1.0), y.max(0.0).min(1.0)]
}
