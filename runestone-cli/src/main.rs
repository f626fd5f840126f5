use clap::Parser;

mod cmd;
mod config;

#[derive(Debug, Parser)]
#[command(version, about = "Decode, encode, and index runestones", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: cmd::Subcommand,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    if let Err(err) = args.command.run() {
        log::error!("exit with error: {err:#}");
        return Err(err);
    }

    Ok(())
}
