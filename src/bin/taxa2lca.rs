use clap::Parser;
use log::LevelFilter;

use taxa_lca::config::{run, Options};
use taxa_lca::errors::exit_with_error;

fn main() {
    let options = Options::parse();

    let level = if options.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let config = match options.into_config() {
        Ok(config) => config,
        Err(e) => exit_with_error(&e),
    };

    if let Err(e) = run(&config) {
        exit_with_error(&e);
    }
}
