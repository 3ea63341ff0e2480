use std::sync::Arc;

use futures::{stream, Stream, StreamExt, TryStreamExt};
use tracing::{debug, instrument};

use sponsor_core::{
    InstanceListEntry, ReadTarget, RegistryContract, SponsorError, SponsorResult,
};

use crate::ContractHandle;

/// Enumerates the instances a registry knows about.
#[derive(Debug, Clone)]
pub struct RegistryReader {
    registry: Arc<dyn RegistryContract>,
}

impl RegistryReader {
    /// Read through a registry handle.
    pub fn new(handle: &ContractHandle) -> SponsorResult<Self> {
        Ok(Self {
            registry: handle.registry()?.clone(),
        })
    }

    /// Number of registered instances.
    #[instrument(err, ret, skip(self))]
    pub async fn count(&self) -> SponsorResult<u64> {
        self.registry
            .instance_count()
            .await
            .map_err(|e| SponsorError::read_failed(ReadTarget::RegistryCount, e))
    }

    async fn entry(&self, index: u64) -> SponsorResult<InstanceListEntry> {
        let address = self
            .registry
            .instance_at(index)
            .await
            .map_err(|e| SponsorError::read_failed(ReadTarget::Index(index), e))?;
        debug!(index, ?address, "Read registry entry");
        Ok(InstanceListEntry { index, address })
    }

    /// Lazily read the count and then every entry in index order, one read
    /// at a time. Nothing is read until the stream is polled.
    pub fn entries(&self) -> impl Stream<Item = SponsorResult<InstanceListEntry>> + Send + '_ {
        stream::once(self.count())
            .map_ok(move |count| stream::iter(0..count).then(move |index| self.entry(index)))
            .try_flatten()
    }

    /// Every entry, in index order. A failure at any index fails the whole
    /// listing; no partial list is returned.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> SponsorResult<Vec<InstanceListEntry>> {
        self.entries().try_collect().await
    }
}
