pub mod store;
pub mod types;

pub use store::RuleStore;
pub use types::{RuleDocument, RuleFault, RuleUnit};
