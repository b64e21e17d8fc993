use crate::util::{label, success_kaomoji};
use http_jws::certificate::Certificate;
use miette::IntoDiagnostic;
use std::{fs, path::Path};

pub fn do_it(file: &Path) -> miette::Result<()> {
    let pem = fs::read(file).into_diagnostic()?;
    let certificate = Certificate::from_pem(&pem)?;
    let parsed = certificate.parse()?;
    let validity = parsed.validity();

    println!("{}: {}", label("Subject"), parsed.subject());
    println!("{}: {}", label("Issuer"), parsed.issuer());
    println!(
        "{}: {} - {}",
        label("Valid"),
        validity.not_before,
        validity.not_after
    );
    println!("{}: {}", label("Thumbprint"), certificate.thumbprint());

    match certificate.organization_identifier()? {
        Some(organization_identifier) => println!(
            "{}: {organization_identifier} {}",
            label("Organization identifier"),
            success_kaomoji()
        ),
        None => println!("{}: none", label("Organization identifier")),
    }

    Ok(())
}
