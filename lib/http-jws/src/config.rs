//!
//! TOML configuration
//!

use crate::{
    algorithm,
    certificate::Certificate,
    chain::{
        CachedChainResolver, ChainPolicy, PolicyChainResolver, RevocationChecker, RevocationMode,
        VerificationFlags,
    },
    locator::{CertificateLocator, PemFileLocator},
    signer::HttpSigner,
    verifier::HttpVerifier,
};
use eyre::eyre;
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tokio::fs;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SigningCertificateConfiguration {
    /// PEM file with the certificate
    pub certificate: PathBuf,

    /// PEM file with the PKCS#8 private key
    pub private_key: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
#[allow(clippy::struct_excessive_bools)]
pub struct Configuration {
    /// Master switch. When off, neither a signer nor a verifier is handed out
    pub enabled: bool,
    pub algorithm: String,
    pub signing_certificate: Option<SigningCertificateConfiguration>,
    pub check_signature_time_constraint: bool,
    pub check_certificate_revocation_list: bool,
    pub check_organization_identifier: bool,
    /// Whether incoming signatures are verified at all
    pub validate_signature: bool,
    pub trusted_roots: Vec<PathBuf>,
    pub intermediates: Vec<PathBuf>,
    pub chain_cache_ttl_secs: u64,
    pub chain_cache_capacity: u64,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            enabled: true,
            algorithm: "RS256".into(),
            signing_certificate: None,
            check_signature_time_constraint: true,
            check_certificate_revocation_list: true,
            check_organization_identifier: true,
            validate_signature: true,
            trusted_roots: Vec::new(),
            intermediates: Vec::new(),
            chain_cache_ttl_secs: 20 * 60,
            chain_cache_capacity: 128,
        }
    }
}

async fn load_certificates(paths: &[PathBuf]) -> eyre::Result<Vec<Certificate>> {
    let mut certificates = Vec::new();
    for path in paths {
        let pem = fs::read(path).await?;
        certificates.extend(Certificate::all_from_pem(&pem)?);
    }

    Ok(certificates)
}

impl Configuration {
    pub async fn load<P>(path: P) -> eyre::Result<Self>
    where
        P: AsRef<Path>,
    {
        let content = fs::read_to_string(path).await?;
        let config: Self = toml::from_str(&content)?;

        // Fail early on typos in the algorithm name
        algorithm::lookup(&config.algorithm)?;

        Ok(config)
    }

    #[must_use]
    pub fn revocation_mode(&self) -> RevocationMode {
        if self.check_certificate_revocation_list {
            RevocationMode::Online
        } else {
            RevocationMode::NoCheck
        }
    }

    /// Chain policy for incoming signatures
    ///
    /// Without a revocation checker, revocation checks report an unknown status
    pub async fn chain_policy(
        &self,
        revocation_checker: Option<Arc<dyn RevocationChecker>>,
    ) -> eyre::Result<ChainPolicy> {
        Ok(ChainPolicy {
            trusted_roots: load_certificates(&self.trusted_roots).await?,
            revocation_mode: self.revocation_mode(),
            verification_flags: VerificationFlags::default(),
            revocation_checker,
        })
    }

    pub async fn verifier(
        &self,
        revocation_checker: Option<Arc<dyn RevocationChecker>>,
    ) -> eyre::Result<HttpVerifier> {
        Ok(HttpVerifier::builder()
            .check_signature_time(self.check_signature_time_constraint)
            .check_organization_identifier(self.check_organization_identifier)
            .chain_policy(self.chain_policy(revocation_checker).await?)
            .build())
    }

    /// Cached resolver for the chain of the own signing certificate
    pub async fn chain_resolver(&self) -> eyre::Result<CachedChainResolver<PolicyChainResolver>> {
        let resolver = PolicyChainResolver::permissive(
            load_certificates(&self.trusted_roots).await?,
            load_certificates(&self.intermediates).await?,
        );

        Ok(CachedChainResolver::new(
            resolver,
            Duration::from_secs(self.chain_cache_ttl_secs),
            self.chain_cache_capacity,
        ))
    }

    /// Signer for outgoing messages, using the configured signing certificate
    pub async fn signer(&self) -> eyre::Result<HttpSigner> {
        let signing_certificate = self
            .signing_certificate
            .as_ref()
            .ok_or_else(|| eyre!("'signing-certificate' isn't configured"))?;

        let locator = PemFileLocator {
            certificate: signing_certificate.certificate.clone(),
            private_key: signing_certificate.private_key.clone(),
        };
        let certificate = locator.load().await?;
        let resolver = self.chain_resolver().await?;

        Ok(HttpSigner::from_certificate(
            &certificate,
            &self.algorithm,
            &resolver,
        )?)
    }

    /// Verifier for incoming signatures, `None` if signing is disabled or incoming signatures aren't validated
    pub async fn verifier_if_enabled(
        &self,
        revocation_checker: Option<Arc<dyn RevocationChecker>>,
    ) -> eyre::Result<Option<HttpVerifier>> {
        if !self.enabled || !self.validate_signature {
            return Ok(None);
        }

        self.verifier(revocation_checker).await.map(Some)
    }

    /// Signer for outgoing messages, `None` if signing is disabled
    pub async fn signer_if_enabled(&self) -> eyre::Result<Option<HttpSigner>> {
        if !self.enabled {
            return Ok(None);
        }

        self.signer().await.map(Some)
    }
}

#[cfg(test)]
mod test {
    use super::{Configuration, SigningCertificateConfiguration};
    use crate::{chain::RevocationMode, message::HttpRequestData};
    use http::{HeaderValue, Method, Uri};
    use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair};
    use std::{fs, path::PathBuf};

    #[tokio::test]
    async fn defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "").unwrap();

        let config = Configuration::load(&path).await.unwrap();
        assert!(config.enabled);
        assert_eq!(config.algorithm, "RS256");
        assert!(config.check_signature_time_constraint);
        assert!(config.check_organization_identifier);
        assert!(config.validate_signature);
        assert_eq!(config.revocation_mode(), RevocationMode::Online);
        assert_eq!(config.chain_cache_ttl_secs, 1200);
    }

    #[tokio::test]
    async fn kebab_case_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
            algorithm = "PS256"
            check-certificate-revocation-list = false
            check-organization-identifier = false
            trusted-roots = ["roots.pem"]

            [signing-certificate]
            certificate = "certificate.pem"
            private-key = "private-key.pem"
            "#,
        )
        .unwrap();

        let config = Configuration::load(&path).await.unwrap();
        assert_eq!(config.algorithm, "PS256");
        assert_eq!(config.revocation_mode(), RevocationMode::NoCheck);
        assert!(!config.check_organization_identifier);
        assert_eq!(config.trusted_roots, [PathBuf::from("roots.pem")]);

        let signing_certificate = config.signing_certificate.unwrap();
        assert_eq!(
            signing_certificate.private_key,
            Some(PathBuf::from("private-key.pem"))
        );
    }

    #[tokio::test]
    async fn unknown_algorithm_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, r#"algorithm = "HS256""#).unwrap();

        assert!(Configuration::load(&path).await.is_err());
    }

    #[tokio::test]
    async fn signer_requires_certificate() {
        assert!(Configuration::default().signer().await.is_err());
    }

    #[tokio::test]
    async fn switches_gate_signer_and_verifier() {
        let disabled = Configuration {
            enabled: false,
            ..Configuration::default()
        };
        assert!(disabled.signer_if_enabled().await.unwrap().is_none());
        assert!(disabled.verifier_if_enabled(None).await.unwrap().is_none());

        let not_validating = Configuration {
            validate_signature: false,
            ..Configuration::default()
        };
        assert!(not_validating.verifier_if_enabled(None).await.unwrap().is_none());
        assert!(Configuration::default()
            .verifier_if_enabled(None)
            .await
            .unwrap()
            .is_some());
    }

    fn ca_params(common_name: &str) -> CertificateParams {
        let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
        params.distinguished_name.push(DnType::CommonName, common_name);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params
    }

    #[tokio::test]
    async fn signer_without_trusted_roots() {
        let root_key = KeyPair::generate().unwrap();
        let root = ca_params("Example Root CA").self_signed(&root_key).unwrap();
        let intermediate_key = KeyPair::generate().unwrap();
        let intermediate = ca_params("Example Issuing CA")
            .signed_by(&intermediate_key, &root, &root_key)
            .unwrap();
        let leaf_key = KeyPair::generate().unwrap();
        let leaf = CertificateParams::new(vec!["bank.example".into()])
            .unwrap()
            .signed_by(&leaf_key, &intermediate, &intermediate_key)
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let certificate = dir.path().join("certificate.pem");
        let private_key = dir.path().join("private-key.pem");
        let intermediates = dir.path().join("intermediates.pem");
        fs::write(&certificate, leaf.pem()).unwrap();
        fs::write(&private_key, leaf_key.serialize_pem()).unwrap();
        fs::write(&intermediates, intermediate.pem()).unwrap();

        let config = Configuration {
            algorithm: "ES256".into(),
            signing_certificate: Some(SigningCertificateConfiguration {
                certificate,
                private_key: Some(private_key),
            }),
            intermediates: vec![intermediates],
            ..Configuration::default()
        };
        let signer = config.signer_if_enabled().await.unwrap().unwrap();

        let mut request = HttpRequestData::new(Method::GET, Uri::from_static("/v1/accounts"));
        request
            .headers
            .insert("host", HeaderValue::from_static("example.com"));
        request
            .headers
            .insert("x-request-id", HeaderValue::from_static("abc123"));

        let output = signer.create_signature(&request).unwrap();
        assert_eq!(output.protected_header.encoded_certificates().len(), 2);
    }
}
