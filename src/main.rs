pub mod cli;
pub mod contract;
pub mod endpoints;
pub mod error;
pub mod fields;
pub mod graph;
pub mod load;
pub mod naming;
pub mod pointer;
pub mod pytree;
pub mod render;
pub mod resolver;
pub mod weigh;

use colored::Colorize;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let command_line_interface = cli::CommandLineInterface::load();
    if let Err(error) = command_line_interface.run() {
        eprintln!("{} {error:#}", "error:".red().bold());
        std::process::exit(1);
    }
}
