//! Core fault-injection lifecycle: injector contract and registry, target
//! resolution, container-runtime adapters, rule and experiment persistence.

pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod experiment;
pub mod injector;
pub mod process;
pub mod rule;
pub mod runtime;
pub mod util;
