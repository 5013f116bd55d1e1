//! The host-pointer-keyed device buffer registry.
//!
//! At most one device buffer is registered per host identity at any time.
//! Re-registering the same identity overwrites the entry without releasing
//! the previous buffer; buffers are only ever released in bulk, at the
//! synchronization barrier.

use std::collections::HashMap;

use kernelrun_core::error::{Result, RuntimeError};
use kernelrun_core::types::{BufferId, HostId};
use kernelrun_core::DeviceContext;

#[derive(Default)]
pub(crate) struct BufferRegistry {
    entries: HashMap<HostId, BufferId>,
}

impl BufferRegistry {
    /// Register a buffer under a host identity, returning the displaced
    /// buffer if one was already registered (it is NOT released here).
    pub(crate) fn insert(&mut self, host: HostId, buffer: BufferId) -> Option<BufferId> {
        self.entries.insert(host, buffer)
    }

    /// Buffer registered for the given host identity.
    pub(crate) fn get(&self, host: HostId) -> Result<BufferId> {
        self.entries
            .get(&host)
            .copied()
            .ok_or(RuntimeError::UnknownBuffer(host))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Release every registered buffer and clear the registry.
    pub(crate) fn release_all(&mut self, ctx: &dyn DeviceContext) -> Result<()> {
        for (_, buffer) in self.entries.drain() {
            ctx.release_buffer(buffer)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_unregistered_fails() {
        let registry = BufferRegistry::default();
        let host = vec![0u8; 4];
        let err = registry.get(HostId::of(&host)).err().unwrap();
        assert!(matches!(err, RuntimeError::UnknownBuffer(_)));
    }

    #[test]
    fn test_insert_overwrites_without_release() {
        let mut registry = BufferRegistry::default();
        let host = vec![0u8; 4];
        let id = HostId::of(&host);

        assert!(registry.insert(id, BufferId::new(1)).is_none());
        let displaced = registry.insert(id, BufferId::new(2));
        assert_eq!(displaced, Some(BufferId::new(1)));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(id).unwrap(), BufferId::new(2));
    }
}
