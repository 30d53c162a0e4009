//! Configuration module.
//!
//! Provides `MimicConfig` (top-level settings), sub-configs for each
//! subsystem, `AppPaths` for cross-platform directories, and TOML persistence
//! via `MimicConfig::load` / `MimicConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    CaptureConfig, IdentityConfig, MimicConfig, PlaybackConfig, StorageConfig, TransferConfig,
};
