pub mod analyze;
pub mod cli;
pub mod generate;
pub mod ingest;
pub mod load_config;
pub mod records;

pub use cli::{run, Cli, Commands};
