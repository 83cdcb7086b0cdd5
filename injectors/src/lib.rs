pub mod factory;
pub mod jvm;

pub use factory::builtin_registry;
