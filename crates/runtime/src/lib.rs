//! Runtime plumbing for driving a device UI.
//!
//! - [`tools`]: locating the `adb` and `appium` executables
//! - [`server`]: launching and stopping a local automation server
//! - [`bridge`]: out-of-band device commands through `adb`
//! - [`connection`]: HTTP client for the automation server's session API

pub mod bridge;
pub mod connection;
pub mod error;
pub mod server;
pub mod tools;

pub use bridge::{Adb, CommandOutput, DeviceEntry};
pub use connection::{Connection, RemoteSession};
pub use error::{Error, Result};
pub use server::{AutomationServer, ServerEndpoint};
