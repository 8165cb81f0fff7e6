//! Layered configuration
//!
//! Layers, lowest precedence first:
//! 1. Built-in defaults
//! 2. User config (~/.config/medid/config.toml, or --config)
//! 3. CLI flags

mod defaults;
mod effective;
mod merge;
mod settings;

pub use defaults::MedidDefaults;
pub use effective::{default_config_path, ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig};
pub use merge::{merge_into, merge_layers};
pub use settings::{ArtifactSettings, HashSettings, MedidSettings, SigningSettings, StagingSettings};
