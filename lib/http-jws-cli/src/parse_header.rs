use crate::util::{error_kaomoji, label, success_kaomoji};
use http_jws::{envelope::SignatureEnvelope, protected_header::ProtectedHeader};

pub fn do_it(header: &str) -> miette::Result<()> {
    let parsed = SignatureEnvelope::parse(header)
        .and_then(|envelope| {
            let protected_header = ProtectedHeader::decode(&envelope.encoded_protected_header)?;
            let signature = envelope.signature()?;
            Ok((protected_header, signature))
        })
        .and_then(|(protected_header, signature)| {
            let certificates = protected_header.certificates()?;
            http_jws::algorithm::lookup(protected_header.algorithm_name())?;
            Ok((protected_header, signature, certificates))
        });

    let (protected_header, signature, certificates) = match parsed {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("Header is invalid {}", error_kaomoji());
            return Err(miette::Error::new(err).with_source_code(header.to_string()));
        }
    };

    let json = serde_json::to_string_pretty(&protected_header)
        .map_err(|err| miette::miette!("{err}"))?;
    println!("{json}");
    println!();
    println!(
        "{}: {}",
        label("Signed at"),
        protected_header.signature_time()
    );
    println!(
        "{}: {}",
        label("Covered headers"),
        protected_header.parameters().join(", ")
    );
    println!("{}: {} bytes", label("Signature"), signature.len());

    for (idx, certificate) in certificates.iter().enumerate() {
        let subject = certificate.subject()?;
        println!(
            "{} #{idx}: {subject} ({})",
            label("Certificate"),
            certificate.thumbprint()
        );
    }

    println!("✅ Header is valid! {}", success_kaomoji());

    Ok(())
}
