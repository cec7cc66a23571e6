mod cli;
mod config;
mod devices;
mod display;
mod error;
mod fingers;
mod geometry;
mod landmarks;
mod logging;
mod pipeline;
mod replay;
mod speller;

fn main() -> anyhow::Result<()> {
    logging::init();
    cli::run()
}
