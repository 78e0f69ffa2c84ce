//! Command-line front end for the chatex export engine.

pub mod cli;
pub mod commands;
pub mod config;
pub mod device_select;
pub mod error;
pub mod hook;
pub mod logging;
pub mod output;
pub mod prompt;
pub mod selection;
pub mod styles;
