//! A minimal stand-in for a Hue bridge, serving canned JSON over HTTP on localhost.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;

pub const USERNAME: &str = "testuser";

#[derive(Debug, Clone)]
pub struct Request {
	pub method: String,
	pub path: String,
	pub body: String,
}

impl Request {
	pub fn json(&self) -> Value {
		serde_json::from_str(&self.body).unwrap_or(Value::Null)
	}
}

struct Bridge {
	lights: Value,
	paired: bool,
	requests: Vec<Request>,
}

pub struct MockBridge {
	pub addr: String,
	inner: Arc<Mutex<Bridge>>,
}

/// `count` color lights with ids 1..=count, named "Light <id>". Odd ids are on.
pub fn color_lights(count: usize) -> Value {
	let mut lights = serde_json::Map::new();
	for id in 1..=count {
		lights.insert(
			id.to_string(),
			json!({
				"type": "Extended color light",
				"name": format!("Light {}", id),
				"modelid": "LCT015",
				"manufacturername": "Signify Netherlands B.V.",
				"uniqueid": format!("00:17:88:01:00:00:00:{:02x}-0b", id),
				"swversion": "1.50.2_r30933",
				"state": {
					"on": id % 2 == 1,
					"bri": 127,
					"hue": 8000,
					"sat": 127,
					"ct": 366,
					"xy": [0.4, 0.4],
					"alert": "none",
					"colormode": "ct",
					"reachable": true
				}
			}),
		);
	}
	Value::Object(lights)
}

/// An on/off plug: its state has no brightness, color or color temperature.
pub fn plug(name: &str) -> Value {
	json!({
		"type": "On/Off plug-in unit",
		"name": name,
		"modelid": "LOM001",
		"manufacturername": "Signify Netherlands B.V.",
		"uniqueid": "00:17:88:01:08:00:00:01-0b",
		"swversion": "1.65.11_hB798F2B",
		"state": {
			"on": false,
			"alert": "select",
			"reachable": true
		}
	})
}

impl MockBridge {
	pub fn start(lights: Value) -> MockBridge {
		Self::spawn(lights, true)
	}

	/// A bridge whose link button has not been pressed
	pub fn unpaired() -> MockBridge {
		Self::spawn(json!({}), false)
	}

	fn spawn(lights: Value, paired: bool) -> MockBridge {
		let listener = TcpListener::bind("127.0.0.1:0").unwrap();
		let addr = listener.local_addr().unwrap().to_string();
		let inner = Arc::new(Mutex::new(Bridge {
			lights,
			paired,
			requests: Vec::new(),
		}));
		let shared = Arc::clone(&inner);
		thread::spawn(move || {
			for stream in listener.incoming() {
				if let Ok(stream) = stream {
					handle(stream, &shared);
				}
			}
		});
		MockBridge { addr, inner }
	}

	pub fn requests(&self) -> Vec<Request> {
		self.inner.lock().unwrap().requests.clone()
	}

	/// Bodies of all state changes sent to light `id`
	pub fn state_changes(&self, id: &str) -> Vec<Value> {
		let path = format!("/api/{}/lights/{}/state", USERNAME, id);
		self.requests()
			.into_iter()
			.filter(|r| r.method == "PUT" && r.path == path)
			.map(|r| r.json())
			.collect()
	}

	/// Write a state file pairing bridge `name` with this mock
	pub fn write_state(&self, dir: &Path, name: &str, groups: Value) {
		std::fs::create_dir_all(dir).unwrap();
		let state = json!({
			"bridge": {"ip": format!("http://{}/", self.addr), "username": USERNAME},
			"groups": groups,
		});
		std::fs::write(
			dir.join(format!("{}.json", name)),
			serde_json::to_string_pretty(&state).unwrap(),
		)
		.unwrap();
	}
}

fn read_request(stream: &TcpStream) -> Option<Request> {
	let mut reader = BufReader::new(stream);
	let mut line = String::new();
	reader.read_line(&mut line).ok()?;
	let mut parts = line.split_whitespace();
	let method = parts.next()?.to_string();
	let path = parts.next()?.to_string();

	let mut length = 0;
	loop {
		let mut header = String::new();
		reader.read_line(&mut header).ok()?;
		let header = header.trim();
		if header.is_empty() {
			break;
		}
		if let Some((name, value)) = header.split_once(':') {
			if name.eq_ignore_ascii_case("content-length") {
				length = value.trim().parse().unwrap_or(0);
			}
		}
	}
	let mut body = vec![0; length];
	reader.read_exact(&mut body).ok()?;
	Some(Request {
		method,
		path,
		body: String::from_utf8_lossy(&body).into_owned(),
	})
}

fn error(kind: u16, address: &str, description: &str) -> Value {
	json!([{"error": {"type": kind, "address": address, "description": description}}])
}

fn respond(bridge: &Bridge, request: &Request) -> (u16, Value) {
	let lights_prefix = format!("/api/{}/lights", USERNAME);
	match (request.method.as_str(), request.path.as_str()) {
		("POST", "/api") if bridge.paired => (200, json!([{"success": {"username": USERNAME}}])),
		("POST", "/api") => (200, error(101, "", "link button not pressed")),
		("GET", path) if path == lights_prefix => (200, bridge.lights.clone()),
		(method, path) if path.starts_with(&lights_prefix) => {
			let rest = path[lights_prefix.len()..].trim_start_matches('/');
			let id = rest.trim_end_matches("/state");
			let light = match bridge.lights.get(id) {
				Some(light) => light,
				None => return (200, error(3, path, "resource not available")),
			};
			match method {
				"GET" => (200, light.clone()),
				"PUT" => {
					let results: Vec<Value> = request
						.json()
						.as_object()
						.map(|changes| {
							changes
								.iter()
								.map(|(key, value)| {
									let mut success = serde_json::Map::new();
									success.insert(
										format!("/lights/{}/state/{}", id, key),
										value.clone(),
									);
									json!({ "success": success })
								})
								.collect()
						})
						.unwrap_or_default();
					(200, Value::Array(results))
				}
				_ => (405, json!({})),
			}
		}
		("GET", _) => (200, error(1, &request.path, "unauthorized user")),
		_ => (404, json!({})),
	}
}

fn handle(mut stream: TcpStream, shared: &Arc<Mutex<Bridge>>) {
	let request = match read_request(&stream) {
		Some(request) => request,
		None => return,
	};
	let (status, body) = {
		let mut bridge = shared.lock().unwrap();
		let reply = respond(&bridge, &request);
		bridge.requests.push(request);
		reply
	};
	let body = body.to_string();
	let reason = if status == 200 { "OK" } else { "Error" };
	let _ = write!(
		stream,
		"HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
		status,
		reason,
		body.len(),
		body
	);
	let _ = stream.flush();
}
