//! In-memory host containers.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Serialize;

use super::*;

#[derive(Default)]
pub struct MemoryStore {
    channels: Mutex<IndexMap<(ClientId, ChannelUid), Arc<Channel>>>,
    channel_groups: Mutex<IndexMap<(ClientId, bool, String), ChannelGroup>>,
    recordings: Mutex<IndexMap<(ClientId, String), Recording>>,
    timers: Mutex<IndexMap<(ClientId, u32), Timer>>,
    epgs: Mutex<IndexMap<(ClientId, ChannelUid), Arc<MemoryEpg>>>,
    epgs_created: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Default::default())
    }

    pub fn channels(&self) -> Vec<Arc<Channel>> {
        self.channels.lock().values().cloned().collect()
    }

    pub fn channel_groups(&self) -> Vec<ChannelGroup> {
        self.channel_groups.lock().values().cloned().collect()
    }

    pub fn recordings(&self) -> Vec<Recording> {
        self.recordings.lock().values().cloned().collect()
    }

    pub fn timers(&self) -> Vec<Timer> {
        self.timers.lock().values().cloned().collect()
    }

    /// Creates an EPG for every known channel and marks EPGs as created.
    ///
    /// Channels added later get their EPG on first access.
    pub fn create_epgs(&self) {
        let channels = self.channels.lock();
        let mut epgs = self.epgs.lock();
        for key in channels.keys() {
            epgs.entry(*key).or_default();
        }
        self.epgs_created.store(true, Ordering::SeqCst);
        tracing::debug!(epgs = epgs.len(), "Created EPGs");
    }

    pub fn channel_epg(&self, uid: ChannelUid, client_id: ClientId) -> Option<Arc<MemoryEpg>> {
        if !self.epgs_created() {
            return None;
        }
        let key = (client_id, uid);
        if !self.channels.lock().contains_key(&key) {
            return None;
        }
        Some(self.epgs.lock().entry(key).or_default().clone())
    }

    /// Removes everything reported by a client.
    pub fn remove_client(&self, client_id: ClientId) {
        self.channels.lock().retain(|(id, _), _| *id != client_id);
        self.channel_groups.lock().retain(|(id, _, _), _| *id != client_id);
        self.recordings.lock().retain(|(id, _), _| *id != client_id);
        self.timers.lock().retain(|(id, _), _| *id != client_id);
        self.epgs.lock().retain(|(id, _), _| *id != client_id);
    }

    pub fn summary(&self) -> StoreSummary {
        let epg_entries = self
            .epgs
            .lock()
            .values()
            .map(|epg| epg.entries.lock().len())
            .sum();
        StoreSummary {
            channels: self.channels.lock().len(),
            channel_groups: self.channel_groups.lock().len(),
            recordings: self.recordings.lock().len(),
            timers: self.timers.lock().len(),
            epg_entries,
        }
    }
}

impl ChannelsContainer for MemoryStore {
    fn update_from_client(&self, channel: Channel) {
        self.channels
            .lock()
            .insert((channel.client_id, channel.uid), Arc::new(channel));
    }
}

impl ChannelGroupsContainer for MemoryStore {
    fn update_from_client(&self, group: ChannelGroup) {
        self.channel_groups
            .lock()
            .insert((group.client_id, group.is_radio, group.name.clone()), group);
    }
}

impl RecordingsContainer for MemoryStore {
    fn update_from_client(&self, recording: Recording) {
        self.recordings.lock().insert(
            (recording.client_id, recording.recording_id.clone()),
            recording,
        );
    }
}

impl TimersContainer for MemoryStore {
    fn update_from_client(&self, timer: Timer) {
        self.timers
            .lock()
            .insert((timer.client_id, timer.client_index), timer);
    }
}

impl ChannelDirectory for MemoryStore {
    fn channel(&self, uid: ChannelUid, client_id: ClientId) -> Option<Arc<Channel>> {
        self.channels.lock().get(&(client_id, uid)).cloned()
    }

    fn epg(&self, uid: ChannelUid, client_id: ClientId) -> Option<Arc<dyn ChannelEpg>> {
        self.channel_epg(uid, client_id)
            .map(|epg| epg as Arc<dyn ChannelEpg>)
    }
}

impl EpgReadiness for MemoryStore {
    fn epgs_created(&self) -> bool {
        self.epgs_created.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSummary {
    pub channels: usize,
    pub channel_groups: usize,
    pub recordings: usize,
    pub timers: usize,
    pub epg_entries: usize,
}

#[derive(Debug, Default)]
pub struct MemoryEpg {
    entries: Mutex<IndexMap<u32, EpgTag>>,
}

impl MemoryEpg {
    pub fn entries(&self) -> Vec<EpgTag> {
        self.entries.lock().values().cloned().collect()
    }

    pub fn entry(&self, unique_broadcast_id: u32) -> Option<EpgTag> {
        self.entries.lock().get(&unique_broadcast_id).cloned()
    }
}

impl ChannelEpg for MemoryEpg {
    fn update_from_client(&self, tag: EpgTag) {
        self.entries.lock().insert(tag.unique_broadcast_id, tag);
    }

    fn update_entry(&self, tag: EpgTag, state: EpgEventState) -> bool {
        let mut entries = self.entries.lock();
        match state {
            EpgEventState::Created | EpgEventState::Updated => {
                entries.insert(tag.unique_broadcast_id, tag);
                true
            }
            EpgEventState::Deleted => entries.shift_remove(&tag.unique_broadcast_id).is_some(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelGroupMember {
    pub channel: Arc<Channel>,
    pub channel_number: u32,
    pub sub_channel_number: u32,
}

pub struct MemoryChannelGroup {
    group: ChannelGroup,
    members: Mutex<Vec<ChannelGroupMember>>,
}

impl MemoryChannelGroup {
    pub fn new(group: ChannelGroup) -> Arc<Self> {
        Arc::new(MemoryChannelGroup {
            group,
            members: Default::default(),
        })
    }

    pub fn members(&self) -> Vec<ChannelGroupMember> {
        self.members.lock().clone()
    }
}

impl ChannelGroupContainer for MemoryChannelGroup {
    fn group(&self) -> ChannelGroup {
        self.group.clone()
    }

    fn add_member(&self, channel: Arc<Channel>, channel_number: u32, sub_channel_number: u32) {
        let mut members = self.members.lock();
        members.retain(|member| member.channel.uid != channel.uid);
        members.push(ChannelGroupMember {
            channel,
            channel_number,
            sub_channel_number,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::stub::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use test_log::test;

    #[test]
    fn test_channels() {
        let store = MemoryStore::new();
        ChannelsContainer::update_from_client(store.as_ref(), channel(1, 1, false));
        ChannelsContainer::update_from_client(store.as_ref(), channel(1, 2, true));
        ChannelsContainer::update_from_client(store.as_ref(), channel(2, 1, false));
        // merge
        ChannelsContainer::update_from_client(store.as_ref(), Channel {
            name: "renamed".to_string(),
            ..channel(1, 1, false)
        });

        assert_eq!(store.channels().len(), 3);
        assert_matches!(store.channel(1.into(), 1.into()), Some(channel) => {
            assert_eq!(channel.name, "renamed");
        });
        assert_matches!(store.channel(3.into(), 1.into()), None);

        store.remove_client(1.into());
        assert_eq!(store.channels().len(), 1);
    }

    #[test]
    fn test_epgs() {
        let store = MemoryStore::new();
        ChannelsContainer::update_from_client(store.as_ref(), channel(1, 1, false));
        assert!(!store.epgs_created());
        assert!(store.epg(1.into(), 1.into()).is_none());

        store.create_epgs();
        assert!(store.epgs_created());
        assert!(store.epg(1.into(), 1.into()).is_some());
        assert!(store.epg(2.into(), 1.into()).is_none());

        ChannelsContainer::update_from_client(store.as_ref(), channel(1, 2, false));
        assert!(store.epg(2.into(), 1.into()).is_some());
    }

    #[test]
    fn test_memory_epg() {
        let epg = MemoryEpg::default();
        assert!(epg.update_entry(epg_tag(1, 1), EpgEventState::Created));
        assert!(epg.update_entry(
            EpgTag {
                title: "updated".to_string(),
                ..epg_tag(1, 1)
            },
            EpgEventState::Updated
        ));
        assert_matches!(epg.entry(1), Some(tag) => assert_eq!(tag.title, "updated"));
        assert!(epg.update_entry(epg_tag(1, 1), EpgEventState::Deleted));
        assert!(!epg.update_entry(epg_tag(1, 1), EpgEventState::Deleted));
        assert!(epg.entries().is_empty());
    }

    #[test]
    fn test_channel_group() {
        let group = MemoryChannelGroup::new(ChannelGroup {
            client_id: 1.into(),
            name: "news".to_string(),
            is_radio: false,
            position: 0,
        });
        assert!(!group.is_radio());
        group.add_member(Arc::new(channel(1, 1, false)), 1, 0);
        group.add_member(Arc::new(channel(1, 1, false)), 2, 0);
        let members = group.members();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].channel_number, 2);
    }

    #[test]
    fn test_summary() {
        let store = MemoryStore::new();
        ChannelsContainer::update_from_client(store.as_ref(), channel(1, 1, false));
        store.create_epgs();
        store
            .channel_epg(1.into(), 1.into())
            .unwrap()
            .update_from_client(epg_tag(1, 1));
        assert_eq!(
            store.summary(),
            StoreSummary {
                channels: 1,
                epg_entries: 1,
                ..Default::default()
            }
        );
    }
}
