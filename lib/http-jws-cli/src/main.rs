use self::args::{ToolArgs, ToolSubcommand};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod args;
mod digest;
mod inspect_certificate;
mod parse_header;
mod util;

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = ToolArgs::parse();
    match args.subcommand {
        ToolSubcommand::ParseHeader(args) => parse_header::do_it(&args.header),
        ToolSubcommand::Digest(args) => digest::do_it(args.file.as_deref(), args.algorithm),
        ToolSubcommand::InspectCertificate(args) => inspect_certificate::do_it(&args.file),
    }
}
