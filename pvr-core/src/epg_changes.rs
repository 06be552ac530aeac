//! EPG event changes waiting for the host's EPGs to be created.
//!
//! One queue exists per host process.  It is created at startup, shared by
//! every client through [`HostServices`](crate::host::HostServices), and
//! cleared at shutdown.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::EpgEventChange;

#[derive(Default)]
pub struct EpgChangeQueue {
    pending: Mutex<VecDeque<EpgEventChange>>,
}

impl EpgChangeQueue {
    pub fn new() -> Arc<Self> {
        Arc::new(Default::default())
    }

    /// Delivers a change, or keeps it until the EPGs are ready.
    ///
    /// When `is_ready` answers true, pending changes are applied oldest
    /// first and then `change` itself.  The queue stays locked meanwhile so
    /// that changes submitted concurrently are applied in submission order.
    pub fn submit<R, F>(&self, change: EpgEventChange, is_ready: R, mut apply: F)
    where
        R: FnOnce() -> bool,
        F: FnMut(EpgEventChange),
    {
        let mut pending = self.pending.lock();
        if is_ready() {
            while let Some(queued) = pending.pop_front() {
                apply(queued);
            }
            apply(change);
        } else {
            tracing::debug!(
                client.id = %change.client_id,
                channel.uid = %change.channel_uid,
                pending = pending.len() + 1,
                "EPGs not created yet, queued an EPG event change",
            );
            pending.push_back(change);
        }
    }

    /// Applies all pending changes oldest first.
    pub fn flush<F>(&self, mut apply: F) -> usize
    where
        F: FnMut(EpgEventChange),
    {
        let mut pending = self.pending.lock();
        let n = pending.len();
        while let Some(queued) = pending.pop_front() {
            apply(queued);
        }
        n
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    pub fn clear(&self) {
        let mut pending = self.pending.lock();
        if !pending.is_empty() {
            tracing::debug!(dropped = pending.len(), "Dropped pending EPG event changes");
        }
        pending.clear();
    }
}
