use clap::Parser;
use famask::{Args, famask};
use log::{error, info};
use simple_logger::init_with_level;

fn main() {
    let args = Args::parse();

    init_with_level(args.level).unwrap_or_else(|e| panic!("{}", e));
    info!("Starting famask with args: {}", args);

    if let Err(e) = famask(args) {
        error!("{}", e);
        std::process::exit(1);
    }
}
