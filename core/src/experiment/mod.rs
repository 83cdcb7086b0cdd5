pub mod store;
pub mod transitions;
pub mod types;

pub use store::ExperimentStore;
pub use transitions::PhaseTransition;
pub use types::{ExperimentPhase, ExperimentRecord, TargetInfo};
