use anyhow::Result;
use clap::Parser;

mod accel;
mod bench;
mod cli;
mod detect;
mod frame;
#[cfg(feature = "image")]
mod img;
mod port;
#[cfg(test)]
mod sim;
mod softaes;
mod stats;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    match args.cmd {
        cli::Cmd::Run(opts) => bench::run(opts),
        cli::Cmd::Bulk(opts) => bench::run_bulk(opts),
        cli::Cmd::Ports => port::print_ports(),
    }
}
