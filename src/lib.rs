pub mod bootstrap;
pub mod compose;
pub mod config;
pub mod errors;
pub mod logging;
pub mod process;
pub mod tasks;
pub mod ui;
