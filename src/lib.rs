#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate log;
extern crate reqwest;
extern crate serde;
extern crate serde_json;
pub mod error;
pub use error::{Error, ErrorKind, Result};
pub mod lights;
pub use lights::{Light, LightState, StateChange};
pub mod bridge;
pub use bridge::Bridge;
pub mod state;
pub use state::{BridgeRecord, Lock, State};
pub mod controller;
pub use controller::{Bsh, Controller};
pub mod cli;
