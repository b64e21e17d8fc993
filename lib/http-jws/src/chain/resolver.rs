use super::{ChainPolicy, RevocationMode, VerificationFlags};
use crate::{
    certificate::{Certificate, Thumbprint},
    Error, Result,
};
use moka::sync::Cache;
use std::{sync::Arc, time::Duration};
use time::OffsetDateTime;
use tracing::{debug, instrument};

/// Resolve the chain of a leaf certificate
///
/// The returned chain excludes both the leaf and the root
pub trait ChainResolver: Send + Sync {
    fn resolve_chain(&self, leaf: &Certificate) -> Result<Vec<Certificate>>;
}

impl<T> ChainResolver for Arc<T>
where
    T: ChainResolver + ?Sized,
{
    fn resolve_chain(&self, leaf: &Certificate) -> Result<Vec<Certificate>> {
        (**self).resolve_chain(leaf)
    }
}

/// Resolves chains from a fixed pool of intermediate certificates
#[derive(Clone, Debug)]
pub struct PolicyChainResolver {
    policy: ChainPolicy,
    intermediates: Vec<Certificate>,
}

impl PolicyChainResolver {
    #[must_use]
    pub fn new(policy: ChainPolicy, intermediates: Vec<Certificate>) -> Self {
        Self {
            policy,
            intermediates,
        }
    }

    /// Resolver that only assembles the chain and tolerates every validation problem
    ///
    /// The trust anchors are only used to recognize where the chain ends
    #[must_use]
    pub fn permissive(trusted_roots: Vec<Certificate>, intermediates: Vec<Certificate>) -> Self {
        let policy = ChainPolicy {
            trusted_roots,
            revocation_mode: RevocationMode::NoCheck,
            verification_flags: VerificationFlags::all(),
            revocation_checker: None,
        };

        Self::new(policy, intermediates)
    }
}

impl ChainResolver for PolicyChainResolver {
    #[instrument(skip_all, fields(leaf = %leaf.thumbprint()))]
    fn resolve_chain(&self, leaf: &Certificate) -> Result<Vec<Certificate>> {
        let build = self
            .policy
            .build(leaf, &self.intermediates, OffsetDateTime::now_utc())?
            .into_result()?;

        Ok(build.intermediates().to_vec())
    }
}

/// Caches resolved chains by the thumbprint of the leaf
///
/// Entries expire after they haven't been accessed for the configured time.
/// Failed resolutions aren't cached.
#[derive(Clone)]
pub struct CachedChainResolver<R> {
    inner: R,
    cache: Cache<Thumbprint, Arc<Vec<Certificate>>>,
}

impl<R> CachedChainResolver<R> {
    #[must_use]
    pub fn new(inner: R, time_to_idle: Duration, capacity: u64) -> Self {
        let cache = Cache::builder()
            .time_to_idle(time_to_idle)
            .max_capacity(capacity)
            .build();

        Self { inner, cache }
    }

    /// Drop the cached chain of the leaf
    pub fn invalidate(&self, leaf: &Certificate) {
        self.cache.invalidate(&leaf.thumbprint());
    }
}

impl<R> ChainResolver for CachedChainResolver<R>
where
    R: ChainResolver,
{
    #[instrument(skip_all, fields(leaf = %leaf.thumbprint()))]
    fn resolve_chain(&self, leaf: &Certificate) -> Result<Vec<Certificate>> {
        let chain = self
            .cache
            .try_get_with(leaf.thumbprint(), || {
                debug!("chain not cached, resolving");
                self.inner.resolve_chain(leaf).map(Arc::new)
            })
            // Only concurrent waiters on the same failed resolution share the error
            .map_err(|error| Arc::try_unwrap(error).unwrap_or_else(Error::ChainResolution))?;

        Ok(chain.as_ref().clone())
    }
}
