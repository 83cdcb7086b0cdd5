pub mod time;

pub use time::parse_timeout_secs;
