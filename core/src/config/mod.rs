pub mod load;
pub mod types;

pub use load::{get_faultd_data_dir, load_default};
pub use types::{AgentConfig, LoggingConfig, RuleStoreConfig};
