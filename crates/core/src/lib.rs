pub mod config;
pub mod duration;
pub mod logging;

pub use duration::HumanDuration;
