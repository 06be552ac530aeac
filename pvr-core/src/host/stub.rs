// <coverage:exclude>
use chrono::DateTime;
use parking_lot::Mutex;

use super::memory::MemoryStore;
use super::*;
use crate::addon::AddonInfo;
use crate::addon::stub::StubAddon;
use crate::addon::stub::StubAddonHost;
use crate::config::Config;
use crate::session::ClientSession;
use crate::update::UpdateJob;

pub(crate) fn channel(client_id: i32, uid: i32, is_radio: bool) -> Channel {
    Channel {
        client_id: client_id.into(),
        uid: uid.into(),
        is_radio,
        channel_number: uid as u32,
        sub_channel_number: 0,
        name: format!("ch#{}", uid),
        icon_path: "".to_string(),
        encryption_system: 0,
        is_hidden: false,
        stream_url: "".to_string(),
        input_format: "".to_string(),
    }
}

pub(crate) fn epg_tag(unique_broadcast_id: u32, channel_uid: i32) -> EpgTag {
    EpgTag {
        unique_broadcast_id,
        channel_uid: channel_uid.into(),
        title: format!("event#{}", unique_broadcast_id),
        plot_outline: "".to_string(),
        plot: "".to_string(),
        original_title: "".to_string(),
        start_time: DateTime::from_timestamp(1_000, 0).unwrap(),
        end_time: DateTime::from_timestamp(2_000, 0).unwrap(),
        genre_type: 0,
        genre_sub_type: 0,
        first_aired: None,
        parental_rating: 0,
        star_rating: 0,
        series_number: None,
        episode_number: None,
        episode_name: "".to_string(),
        icon_path: "".to_string(),
        flags: 0,
    }
}

pub(crate) fn addon_info() -> AddonInfo {
    AddonInfo {
        id: "pvr.stub".to_string(),
        name: "Stub PVR".to_string(),
        version: "1.0.0".to_string(),
        author: "Stub authors".to_string(),
    }
}

/// Records what reaches the observer, notifier and scheduler seams.
#[derive(Default)]
pub(crate) struct RecorderStub {
    pub(crate) states: Mutex<Vec<(ClientId, ConnectionState, String)>>,
    pub(crate) toasts: Mutex<Vec<(ToastLevel, String, String)>>,
    pub(crate) audits: Mutex<Vec<AuditEvent>>,
    pub(crate) jobs: Mutex<Vec<UpdateJob>>,
}

impl ConnectionObserver for RecorderStub {
    fn connection_state_changed(
        &self,
        client_id: ClientId,
        _connection_string: &str,
        state: ConnectionState,
        message: &str,
    ) {
        self.states
            .lock()
            .push((client_id, state, message.to_string()));
    }
}

impl Notifier for RecorderStub {
    fn toast(&self, level: ToastLevel, title: &str, message: &str) {
        self.toasts
            .lock()
            .push((level, title.to_string(), message.to_string()));
    }

    fn audit(&self, event: AuditEvent) {
        self.audits.lock().push(event);
    }
}

impl UpdateScheduler for RecorderStub {
    fn schedule(&self, job: UpdateJob) {
        self.jobs.lock().push(job);
    }
}

pub(crate) struct TestHost {
    pub(crate) addon: Arc<StubAddon>,
    pub(crate) addon_host: Arc<StubAddonHost>,
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) recorder: Arc<RecorderStub>,
    pub(crate) epg_changes: Arc<EpgChangeQueue>,
    pub(crate) config: Arc<Config>,
    pub(crate) services: HostServices,
}

impl TestHost {
    pub(crate) fn new() -> Self {
        Self::with_config(Default::default())
    }

    pub(crate) fn with_config(config: Config) -> Self {
        let addon = Arc::new(StubAddon::default());
        let addon_host = StubAddonHost::new(addon.clone());
        let store = MemoryStore::new();
        let recorder = Arc::new(RecorderStub::default());
        let epg_changes = EpgChangeQueue::new();
        let services = HostServices {
            addon_host: addon_host.clone(),
            directory: store.clone(),
            epg_readiness: store.clone(),
            connection_observer: recorder.clone(),
            notifier: recorder.clone(),
            scheduler: recorder.clone(),
            epg_changes: epg_changes.clone(),
        };
        TestHost {
            addon,
            addon_host,
            store,
            recorder,
            epg_changes,
            config: Arc::new(config),
            services,
        }
    }

    pub(crate) fn session(&self) -> Arc<ClientSession> {
        ClientSession::new(addon_info(), self.config.clone(), self.services.clone())
    }

    /// A ready session for client#1.
    pub(crate) fn ready_session(&self) -> Arc<ClientSession> {
        let session = self.session();
        session.create(1.into()).unwrap();
        self.addon.clear_log();
        session
    }
}
