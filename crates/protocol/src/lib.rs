//! Wire types for the mobile UI automation protocol.
//!
//! Covers the subset of the W3C WebDriver protocol (Appium flavour) that the
//! export engine consumes: session capabilities, element lookup, pointer
//! actions and error payloads. The protocol itself is implemented by the
//! automation server; these are only the shapes that cross the wire.

pub mod actions;
pub mod capabilities;
pub mod types;

pub use actions::{Actions, InputSource, PointerStep};
pub use capabilities::{Capabilities, NewSessionRequest, NewSessionResponse};
pub use types::*;
