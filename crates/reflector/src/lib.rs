//! Test-origin server: terminates HTTP/1.1, H2, and H3, and echoes every
//! request back as a [`h123_wire::ReflectorResponse`]. Not part of the
//! proxy fleet itself -- a collaborator the backend and its tests dial.

pub mod config;
pub mod dev_cert;
pub mod handler;
pub mod serve;

pub use config::ReflectorConfig;
