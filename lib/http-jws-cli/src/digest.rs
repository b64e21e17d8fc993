use crate::args::DigestAlgorithm;
use http_jws::digest::{self, HashAlgorithm};
use miette::IntoDiagnostic;
use std::{
    fs,
    io::{self, Read},
    path::Path,
};

impl From<DigestAlgorithm> for HashAlgorithm {
    fn from(value: DigestAlgorithm) -> Self {
        match value {
            DigestAlgorithm::Sha256 => Self::Sha256,
            DigestAlgorithm::Sha384 => Self::Sha384,
            DigestAlgorithm::Sha512 => Self::Sha512,
        }
    }
}

pub fn do_it(file: Option<&Path>, algorithm: DigestAlgorithm) -> miette::Result<()> {
    let body = match file {
        Some(path) => fs::read(path).into_diagnostic()?,
        None => {
            let mut body = Vec::new();
            io::stdin().read_to_end(&mut body).into_diagnostic()?;
            body
        }
    };

    println!("{}", digest::compute(algorithm.into(), &body));

    Ok(())
}
