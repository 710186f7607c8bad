use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = atelier::cli::Cli::parse();
    atelier::init(cli.verbose);
    atelier::cli::run(cli)
}
