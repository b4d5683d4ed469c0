//! Client for the local API of a Hue bridge.

use crate::error::{Error, Result};
use crate::lights::{Light, StateChange};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Device type announced to the bridge when pairing
pub const DEVICE_TYPE: &str = "hue_controller";

const TIMEOUT: Duration = Duration::from_secs(10);
const LINK_BUTTON_NOT_PRESSED: u16 = 101;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "lowercase")]
enum ApiResponse<T> {
	Success(T),
	Error(ApiError),
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct ApiError {
	#[serde(rename = "type")]
	kind: u16,
	address: String,
	description: String,
}

impl ApiError {
	fn into_error(self) -> Error {
		if self.kind == LINK_BUTTON_NOT_PRESSED {
			return Error::LinkButtonNotPressed;
		}
		Error::Bridge {
			kind: self.kind,
			address: self.address,
			description: self.description,
		}
	}
}

#[derive(Deserialize, Debug)]
struct Registration {
	username: String,
}

/// A paired Hue bridge
pub struct Bridge {
	base: String,
	username: String,
	client: Client,
}

/// Turn `192.168.0.2`, `http://192.168.0.2` or `http://192.168.0.2/` into `http://192.168.0.2/`
pub fn base_url(ip: &str) -> String {
	let ip = ip.trim().trim_end_matches('/');
	if ip.starts_with("http://") || ip.starts_with("https://") {
		format!("{}/", ip)
	} else {
		format!("http://{}/", ip)
	}
}

fn client() -> Result<Client> {
	Ok(Client::builder().timeout(TIMEOUT).build()?)
}

/// Decode a bridge reply that is either the expected object or a list of errors.
fn decode<T: DeserializeOwned>(reply: Value) -> Result<T> {
	if let Value::Array(entries) = &reply {
		for entry in entries {
			if let Ok(ApiResponse::Error(err)) = ApiResponse::<Value>::deserialize(entry) {
				return Err(err.into_error());
			}
		}
	}
	Ok(serde_json::from_value(reply)?)
}

/// Check the result list of a write request, returning the first error entry.
fn check_results(reply: Value) -> Result<()> {
	let results: Vec<ApiResponse<Value>> = serde_json::from_value(reply)?;
	for result in results {
		if let ApiResponse::Error(err) = result {
			return Err(err.into_error());
		}
	}
	Ok(())
}

impl Bridge {
	pub fn new(ip: &str, username: &str) -> Result<Bridge> {
		Ok(Bridge {
			base: base_url(ip),
			username: username.to_string(),
			client: client()?,
		})
	}

	/// Pair with the bridge at `ip` and return the issued username.
	///
	/// The link button on the bridge has to be pressed shortly before.
	pub fn register(ip: &str, devicetype: &str) -> Result<String> {
		let url = format!("{}api", base_url(ip));
		debug!("POST {}", url);
		let body = serde_json::json!({ "devicetype": devicetype });
		let reply: Value = client()?
			.post(&url)
			.json(&body)
			.send()?
			.error_for_status()?
			.json()?;
		let mut results: Vec<ApiResponse<Registration>> = serde_json::from_value(reply)?;
		match results.pop() {
			Some(ApiResponse::Success(registration)) => {
				info!("paired with bridge at {}", ip);
				Ok(registration.username)
			}
			Some(ApiResponse::Error(err)) => Err(err.into_error()),
			None => Err(Error::Bridge {
				kind: 0,
				address: "/".to_string(),
				description: "empty response to registration".to_string(),
			}),
		}
	}

	fn url(&self, path: &str) -> String {
		format!("{}api/{}/{}", self.base, self.username, path)
	}

	fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
		let url = self.url(path);
		debug!("GET {}", url);
		let reply: Value = self.client.get(&url).send()?.error_for_status()?.json()?;
		decode(reply)
	}

	fn put<B: Serialize>(&self, path: &str, body: &B) -> Result<()> {
		let url = self.url(path);
		debug!("PUT {} {}", url, serde_json::to_string(body)?);
		let reply: Value = self
			.client
			.put(&url)
			.json(body)
			.send()?
			.error_for_status()?
			.json()?;
		check_results(reply)
	}

	/// All lights known to the bridge, ordered by id
	pub fn lights(&self) -> Result<Vec<Light>> {
		let map: BTreeMap<String, Light> = self.get("lights")?;
		let mut lights: Vec<Light> = map
			.into_iter()
			.map(|(id, mut light)| {
				light.id = id;
				light
			})
			.collect();
		lights.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
		Ok(lights)
	}

	pub fn light(&self, id: &str) -> Result<Light> {
		let mut light: Light = self.get(&format!("lights/{}", id))?;
		light.id = id.to_string();
		Ok(light)
	}

	/// Apply a state change to one light
	pub fn set_state(&self, id: &str, change: &StateChange) -> Result<()> {
		if change.is_empty() {
			return Ok(());
		}
		self.put(&format!("lights/{}/state", id), change)
	}
}
