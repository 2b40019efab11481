//! Configuration: `AppConfig` with capture and server sub-configs, TOML
//! persistence via `AppConfig::load` / `AppConfig::save`, and `AppPaths`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, CaptureConfig, ServerConfig};
