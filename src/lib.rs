// Library exports for the relaunch restart supervisor

pub mod cli;
pub mod config;
pub mod error;
pub mod logs;
pub mod process;
pub mod shutdown;
pub mod state;
