//! Configuration management for barscope.
//!
//! The configuration lives in a TOML file in the user's config directory. It is
//! created from the built-in default on first run and replaced by that default
//! at load time whenever it cannot be parsed.

pub mod file;
pub mod window_state;

pub use file::{config_path, BarscopeConfig, Rgba};
pub use window_state::WindowHints;
