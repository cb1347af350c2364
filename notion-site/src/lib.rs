pub mod cli;
pub mod client;
pub mod init;
pub mod load_config;

pub use cli::{run, Cli, Commands};
