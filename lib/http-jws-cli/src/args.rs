use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Clone, Copy, PartialEq, ValueEnum)]
pub enum DigestAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

#[derive(Args)]
pub struct ParseHeaderArgs {
    /// Value of the `x-jws-signature` header
    pub header: String,
}

#[derive(Args)]
pub struct DigestArgs {
    /// File containing the body. Reads from stdin if omitted
    pub file: Option<PathBuf>,

    /// Hash algorithm of the digest
    #[arg(
        default_value_t = DigestAlgorithm::Sha256,
        long,
        short,
        value_enum,
    )]
    pub algorithm: DigestAlgorithm,
}

#[derive(Args)]
pub struct InspectCertificateArgs {
    /// PEM file containing the certificate
    pub file: PathBuf,
}

#[derive(Subcommand)]
pub enum ToolSubcommand {
    /// Decode the signature header and report any format errors
    ParseHeader(ParseHeaderArgs),

    /// Compute the `digest` header value of a body
    Digest(DigestArgs),

    /// Print the fields of a certificate relevant for signing
    InspectCertificate(InspectCertificateArgs),
}

#[derive(Parser)]
#[command(about, version)]
pub struct ToolArgs {
    #[clap(subcommand)]
    pub subcommand: ToolSubcommand,
}
