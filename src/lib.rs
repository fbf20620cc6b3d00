// Resin thumbnail service library

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod proxy;
pub mod thumbnail;
