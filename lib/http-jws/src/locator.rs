//!
//! Loading of signing certificates
//!

use crate::{certificate::SigningCertificate, Result};
use std::{future::Future, path::PathBuf};
use tokio::fs;

/// Source of a signing certificate
pub trait CertificateLocator {
    /// Load the certificate along with its private key, if the source has one
    fn load(&self) -> impl Future<Output = Result<SigningCertificate>> + Send;
}

/// Certificate and PKCS#8 private key stored as PEM files
#[derive(Clone, Debug)]
pub struct PemFileLocator {
    pub certificate: PathBuf,
    pub private_key: Option<PathBuf>,
}

impl CertificateLocator for PemFileLocator {
    async fn load(&self) -> Result<SigningCertificate> {
        let certificate = fs::read(&self.certificate).await?;
        let private_key = match self.private_key {
            Some(ref path) => Some(fs::read_to_string(path).await?),
            None => None,
        };

        SigningCertificate::from_pem(&certificate, private_key.as_deref())
    }
}

#[cfg(test)]
mod test {
    use super::{CertificateLocator, PemFileLocator};
    use crate::Error;
    use std::fs;

    fn write_pem(dir: &tempfile::TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
        let rcgen::CertifiedKey { cert, key_pair } =
            rcgen::generate_simple_self_signed(vec!["bank.example".into()]).unwrap();

        let certificate = dir.path().join("certificate.pem");
        let private_key = dir.path().join("private-key.pem");
        fs::write(&certificate, cert.pem()).unwrap();
        fs::write(&private_key, key_pair.serialize_pem()).unwrap();

        (certificate, private_key)
    }

    #[tokio::test]
    async fn loads_certificate_and_key() {
        let dir = tempfile::tempdir().unwrap();
        let (certificate, private_key) = write_pem(&dir);

        let locator = PemFileLocator {
            certificate,
            private_key: Some(private_key),
        };
        let loaded = locator.load().await.unwrap();

        assert!(loaded.has_private_key());
        assert!(loaded
            .certificate()
            .subject()
            .unwrap()
            .contains("rcgen self signed cert"));
    }

    #[tokio::test]
    async fn private_key_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let (certificate, _private_key) = write_pem(&dir);

        let locator = PemFileLocator {
            certificate,
            private_key: None,
        };
        assert!(!locator.load().await.unwrap().has_private_key());
    }

    #[tokio::test]
    async fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let locator = PemFileLocator {
            certificate: dir.path().join("nope.pem"),
            private_key: None,
        };

        assert!(matches!(locator.load().await, Err(Error::Io(..))));
    }
}
