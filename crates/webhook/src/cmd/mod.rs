//! Command layer - Entry points for the webhook subcommands

pub mod print_config;
pub mod serve;

pub use print_config::run_print_config;
pub use serve::run_serve;
