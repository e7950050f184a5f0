pub mod cli;
pub mod config;
pub mod daemon;
pub mod device;
pub mod input;

pub use config::Config;
pub use input::GestureEngine;
