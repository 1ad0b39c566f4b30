mod client;
mod config;
mod decode;
mod diff;
mod error;
mod logger;
pub mod protocol;
pub mod sensors;
mod session;
mod types;

pub use client::{ClientBuilder, DEFAULT_TIMEOUT, PhnixClient};
pub use config::Config;
pub use decode::{
    DeviceStatus, Readings, TelemetryIndex, coerce_flag, coerce_number, decode, decode_climate,
    decode_climate_indexed, decode_indexed,
};
pub use error::{Error, ErrorKind, Result};
pub use logger::MessageLogMode;
pub use protocol::Envelope;
pub use session::Session;
pub use types::*;

pub use secrecy::{ExposeSecret, SecretString};
