pub mod artifact;
pub mod config;
pub mod constants;
pub mod cursor;
pub mod drive;
pub mod error;
pub mod gate;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod runner;
pub mod secrets;
pub mod source;
pub mod transform;
pub mod workers;
