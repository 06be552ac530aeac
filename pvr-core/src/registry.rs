use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::config::ClientConfig;
use crate::config::Config;
use crate::error::Error;
use crate::events::AuditEvent;
use crate::events::ConnectionStateChanged;
use crate::host::*;
use crate::models::*;
use crate::session::ClientSession;
use crate::update::UpdateJob;
use crate::update::UpdateScheduler;

/// Sessions of all clients running in the host.
pub struct ClientRegistry {
    config: Arc<Config>,
    services: HostServices,
    clients: RwLock<IndexMap<ClientId, Arc<ClientSession>>>,
}

impl ClientRegistry {
    pub fn new(config: Arc<Config>, services: HostServices) -> Self {
        ClientRegistry {
            config,
            services,
            clients: Default::default(),
        }
    }

    /// Starts every client enabled in the config.
    ///
    /// Returns the number of clients started.  Failures are logged.
    pub fn start_all(&self) -> usize {
        self.config
            .clients
            .iter()
            .filter(|client| !client.disabled)
            .filter(|client| match self.start_client(client) {
                Ok(_) => true,
                Err(err) => {
                    tracing::error!(%err, client.id = client.id, addon.id = %client.addon, "Failed to start");
                    false
                }
            })
            .count()
    }

    /// Creates a session for `client`, replacing the one running for the
    /// same client id.
    pub fn start_client(&self, client: &ClientConfig) -> Result<Arc<ClientSession>, Error> {
        let client_id = client.client_id();
        if let Some(session) = self.clients.write().shift_remove(&client_id) {
            session.destroy();
        }
        let session = ClientSession::new(
            client.addon_info(),
            self.config.clone(),
            self.services.clone(),
        );
        session.create(client_id)?;
        self.clients.write().insert(client_id, session.clone());
        tracing::info!(%client_id, addon.id = %client.addon, "Started");
        Ok(session)
    }

    pub fn stop_client(&self, client_id: ClientId) -> Result<(), Error> {
        let session = self
            .clients
            .write()
            .shift_remove(&client_id)
            .ok_or(Error::ClientNotFound)?;
        session.destroy();
        tracing::info!(%client_id, "Stopped");
        Ok(())
    }

    pub fn client(&self, client_id: ClientId) -> Option<Arc<ClientSession>> {
        self.clients.read().get(&client_id).cloned()
    }

    pub fn clients(&self) -> Vec<Arc<ClientSession>> {
        self.clients.read().values().cloned().collect()
    }

    /// Clients taking part in aggregate operations.
    pub fn created_clients(&self) -> Vec<Arc<ClientSession>> {
        self.clients
            .read()
            .values()
            .filter(|session| session.is_ready() && !session.ignore_client())
            .cloned()
            .collect()
    }

    fn for_each_created<F>(&self, what: &'static str, mut f: F) -> Vec<ClientId>
    where
        F: FnMut(&ClientSession) -> Result<(), Error>,
    {
        let mut failed = vec![];
        for session in self.created_clients() {
            match f(&session) {
                Ok(()) | Err(Error::NotImplemented) => (),
                Err(err) => {
                    tracing::warn!(%err, client.id = %session.client_id(), what, "Failed to get");
                    failed.push(session.client_id());
                }
            }
        }
        failed
    }

    /// Returns ids of clients which failed.
    pub fn get_channels_all(
        &self,
        radio: bool,
        container: Arc<dyn ChannelsContainer>,
    ) -> Vec<ClientId> {
        self.for_each_created("channels", |session| {
            session.get_channels(radio, container.clone())
        })
    }

    pub fn get_channel_groups_all(
        &self,
        radio: bool,
        container: Arc<dyn ChannelGroupsContainer>,
    ) -> Vec<ClientId> {
        self.for_each_created("channel-groups", |session| {
            session.get_channel_groups(radio, container.clone())
        })
    }

    pub fn get_recordings_all(
        &self,
        deleted: bool,
        container: Arc<dyn RecordingsContainer>,
    ) -> Vec<ClientId> {
        self.for_each_created("recordings", |session| {
            session.get_recordings(deleted, container.clone())
        })
    }

    pub fn get_timers_all(&self, container: Arc<dyn TimersContainer>) -> Vec<ClientId> {
        self.for_each_created("timers", |session| session.get_timers(container.clone()))
    }

    /// Destroys all sessions and drops EPG changes still pending.
    pub fn shutdown(&self) {
        let clients: Vec<_> = self.clients.write().drain(..).collect();
        for (_, session) in clients {
            session.destroy();
        }
        self.services.epg_changes.clear();
        tracing::info!("Shutdown");
    }
}

/// Reports connection state changes to the user and refreshes a client once
/// it connects.
pub struct ConnectionMonitor {
    config: Arc<Config>,
    notifier: Arc<dyn Notifier>,
    scheduler: Arc<dyn UpdateScheduler>,
}

impl ConnectionMonitor {
    pub fn new(
        config: Arc<Config>,
        notifier: Arc<dyn Notifier>,
        scheduler: Arc<dyn UpdateScheduler>,
    ) -> Self {
        ConnectionMonitor {
            config,
            notifier,
            scheduler,
        }
    }
}

impl ConnectionObserver for ConnectionMonitor {
    fn connection_state_changed(
        &self,
        client_id: ClientId,
        connection_string: &str,
        state: ConnectionState,
        message: &str,
    ) {
        let toast = match state {
            ConnectionState::Connecting => false,
            ConnectionState::Disconnected => !self.config.pvr.hide_connection_lost_warning,
            _ => true,
        };
        if toast {
            let level = if state == ConnectionState::Connected {
                ToastLevel::Info
            } else {
                ToastLevel::Error
            };
            self.notifier.toast(level, connection_string, message);
        }

        self.notifier
            .audit(AuditEvent::ConnectionStateChanged(ConnectionStateChanged {
                client_id,
                connection_string: connection_string.to_string(),
                state,
                message: message.to_string(),
            }));

        if state == ConnectionState::Connected {
            self.scheduler.schedule(UpdateJob::Channels { client_id });
            self.scheduler.schedule(UpdateJob::ChannelGroups { client_id });
            self.scheduler.schedule(UpdateJob::Recordings { client_id });
            self.scheduler.schedule(UpdateJob::Timers { client_id });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addon::types::*;
    use crate::config::PvrConfig;
    use crate::host::stub::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use test_log::test;

    fn client_config(id: i32) -> ClientConfig {
        ClientConfig {
            id,
            addon: "pvr.stub".to_string(),
            name: "".to_string(),
            version: "".to_string(),
            author: "".to_string(),
            disabled: false,
        }
    }

    fn registry(host: &TestHost) -> ClientRegistry {
        ClientRegistry::new(host.config.clone(), host.services.clone())
    }

    #[test]
    fn test_start_all() {
        let host = TestHost::with_config(Config {
            clients: vec![
                client_config(1),
                ClientConfig {
                    disabled: true,
                    ..client_config(2)
                },
            ],
            ..Default::default()
        });
        let registry = registry(&host);
        assert_eq!(registry.start_all(), 1);
        assert_eq!(registry.clients().len(), 1);
        assert_matches!(registry.client(1.into()), Some(session) => {
            assert!(session.is_ready());
            assert_eq!(session.addon().name, "pvr.stub");
        });
        assert_matches!(registry.client(2.into()), None);
    }

    #[test]
    fn test_start_client_failure() {
        let host = TestHost::new();
        host.addon.fail_on("api_version", PvrError::ServerTimeout);
        let registry = registry(&host);
        assert_matches!(
            registry.start_client(&client_config(1)),
            Err(Error::Backend(PvrError::ServerTimeout))
        );
        assert!(registry.clients().is_empty());
    }

    #[test]
    fn test_start_client_replaces() {
        let host = TestHost::new();
        let registry = registry(&host);
        let first = registry.start_client(&client_config(1)).unwrap();
        let second = registry.start_client(&client_config(1)).unwrap();
        assert!(!first.is_ready());
        assert!(second.is_ready());
        assert_eq!(registry.clients().len(), 1);
        assert_eq!(host.addon_host.destroyed(), 1);
    }

    #[test]
    fn test_stop_client() {
        let host = TestHost::new();
        let registry = registry(&host);
        let session = registry.start_client(&client_config(1)).unwrap();
        assert_matches!(registry.stop_client(1.into()), Ok(()));
        assert!(!session.is_ready());
        assert_matches!(registry.stop_client(1.into()), Err(Error::ClientNotFound));
    }

    #[test]
    fn test_aggregate_skips_ignored_clients() {
        let host = TestHost::new();
        host.addon.channels.lock().push(PvrChannel {
            unique_id: 1,
            ..Default::default()
        });
        let registry = registry(&host);
        let session = registry.start_client(&client_config(1)).unwrap();
        assert_eq!(registry.created_clients().len(), 1);

        session
            .relay()
            .connection_state_change("stub:0", ConnectionState::Connecting, "");
        assert!(registry.created_clients().is_empty());
        assert!(registry.get_channels_all(false, host.store.clone()).is_empty());
        assert_eq!(host.addon.calls("channels"), 0);
        assert!(host.store.channels().is_empty());

        session
            .relay()
            .connection_state_change("stub:0", ConnectionState::Connected, "");
        assert!(registry.get_channels_all(false, host.store.clone()).is_empty());
        assert_eq!(host.store.channels().len(), 1);
    }

    #[test]
    fn test_aggregate_failures() {
        let host = TestHost::new();
        host.addon.fail_on("timers", PvrError::ServerError);
        host.addon.fail_on("channel_groups", PvrError::NotImplemented);
        let registry = registry(&host);
        registry.start_client(&client_config(1)).unwrap();

        assert_eq!(registry.get_timers_all(host.store.clone()), vec![ClientId::from(1)]);
        assert!(registry.get_channel_groups_all(false, host.store.clone()).is_empty());
        assert!(registry.get_recordings_all(false, host.store.clone()).is_empty());
    }

    #[test]
    fn test_shutdown() {
        let host = TestHost::new();
        let registry = registry(&host);
        let session = registry.start_client(&client_config(1)).unwrap();
        session
            .relay()
            .epg_event_state_change(&Default::default(), 1, EpgEventState::Created);
        assert_eq!(host.epg_changes.len(), 1);

        registry.shutdown();
        assert!(registry.clients().is_empty());
        assert!(!session.is_ready());
        assert!(host.epg_changes.is_empty());
    }

    #[test]
    fn test_connection_monitor_connected() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_toast()
            .withf(|level, _, _| *level == ToastLevel::Info)
            .times(1)
            .returning(|_, _, _| ());
        notifier
            .expect_audit()
            .withf(|event| {
                matches!(event, AuditEvent::ConnectionStateChanged(event)
                         if event.state == ConnectionState::Connected)
            })
            .times(1)
            .returning(|_| ());
        let mut scheduler = MockScheduler::new();
        scheduler.expect_schedule().times(4).returning(|_| ());

        let monitor = ConnectionMonitor::new(
            Arc::new(Default::default()),
            Arc::new(notifier),
            Arc::new(scheduler),
        );
        monitor.connection_state_changed(
            1.into(),
            "stub:0",
            ConnectionState::Connected,
            "Connection established",
        );
    }

    #[test]
    fn test_connection_monitor_connecting() {
        let mut notifier = MockNotifier::new();
        notifier.expect_toast().never();
        notifier.expect_audit().times(1).returning(|_| ());
        let mut scheduler = MockScheduler::new();
        scheduler.expect_schedule().never();

        let monitor = ConnectionMonitor::new(
            Arc::new(Default::default()),
            Arc::new(notifier),
            Arc::new(scheduler),
        );
        monitor.connection_state_changed(1.into(), "stub:0", ConnectionState::Connecting, "Connecting");
    }

    #[test]
    fn test_connection_monitor_errors() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_toast()
            .withf(|level, _, _| *level == ToastLevel::Error)
            .times(2)
            .returning(|_, _, _| ());
        notifier.expect_audit().times(2).returning(|_| ());
        let mut scheduler = MockScheduler::new();
        scheduler.expect_schedule().never();

        let monitor = ConnectionMonitor::new(
            Arc::new(Default::default()),
            Arc::new(notifier),
            Arc::new(scheduler),
        );
        monitor.connection_state_changed(1.into(), "stub:0", ConnectionState::Disconnected, "Connection lost");
        monitor.connection_state_changed(1.into(), "stub:0", ConnectionState::AccessDenied, "Access denied");
    }

    #[test]
    fn test_connection_monitor_hide_connection_lost_warning() {
        let mut notifier = MockNotifier::new();
        notifier.expect_toast().never();
        notifier.expect_audit().times(1).returning(|_| ());
        let mut scheduler = MockScheduler::new();
        scheduler.expect_schedule().never();

        let config = Config {
            pvr: PvrConfig {
                hide_connection_lost_warning: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let monitor = ConnectionMonitor::new(Arc::new(config), Arc::new(notifier), Arc::new(scheduler));
        monitor.connection_state_changed(1.into(), "stub:0", ConnectionState::Disconnected, "Connection lost");
    }

    mockall::mock! {
        Notifier {}

        impl Notifier for Notifier {
            fn toast(&self, level: ToastLevel, title: &str, message: &str);
            fn audit(&self, event: AuditEvent);
        }
    }

    mockall::mock! {
        Scheduler {}

        impl UpdateScheduler for Scheduler {
            fn schedule(&self, job: UpdateJob);
        }
    }
}
