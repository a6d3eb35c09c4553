// src/config/mod.rs

pub mod loader;
pub mod model;
mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, DefaultSection, FiltersConfig, JobConfig, RawConfigFile, SettingsSection};
