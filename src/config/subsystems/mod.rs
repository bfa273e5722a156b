pub mod input;
pub mod executor;
pub mod logging;

pub use input::InputConfig;
pub use executor::{CacheMode, ExecutorConfig, StrategyChoice};
pub use logging::LoggingConfig;
