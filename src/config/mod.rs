pub mod settings;

pub use settings::{ChatConfig, Config, ConfigError, ExecutorConfig, LLMConfig};
