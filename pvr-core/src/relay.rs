//! Callbacks an addon makes into the host.
//!
//! One [`EventRelay`] exists per session and is handed to the addon when its
//! instance is created.  Callbacks may arrive on any thread, including
//! threads owned by the addon, and never fail: invalid input is logged and
//! dropped.

use std::fmt;
use std::sync::Arc;
use std::sync::Weak;

use chrono::Utc;

use crate::addon::types::*;
use crate::error::Error;
use crate::events::AuditEvent;
use crate::events::RecordingNotification;
use crate::host::*;
use crate::models::*;
use crate::session::ClientSession;
use crate::update::UpdateJob;

/// Where entries transferred by an addon go.
#[derive(Clone)]
pub enum Destination {
    Channels(Arc<dyn ChannelsContainer>),
    ChannelGroups(Arc<dyn ChannelGroupsContainer>),
    ChannelGroupMembers(Arc<dyn ChannelGroupContainer>),
    Recordings(Arc<dyn RecordingsContainer>),
    Timers(Arc<dyn TimersContainer>),
    Epg(Arc<dyn ChannelEpg>),
}

impl Destination {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Channels(_) => "channels",
            Self::ChannelGroups(_) => "channel-groups",
            Self::ChannelGroupMembers(_) => "channel-group-members",
            Self::Recordings(_) => "recordings",
            Self::Timers(_) => "timers",
            Self::Epg(_) => "epg",
        }
    }
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Destination({})", self.kind())
    }
}

/// Passed to the addon along with a request for entries.  The addon hands it
/// back with every entry it transfers.
#[derive(Clone, Debug)]
pub struct TransferHandle {
    pub caller: ClientId,
    pub destination: Destination,
    /// Request specific data, the channel uid for EPG requests.
    pub tag: i32,
}

pub struct EventRelay {
    session: Weak<ClientSession>,
    services: HostServices,
}

impl EventRelay {
    pub(crate) fn new(session: Weak<ClientSession>, services: HostServices) -> Self {
        EventRelay { session, services }
    }

    fn session(&self, func: &'static str) -> Option<Arc<ClientSession>> {
        let session = self.session.upgrade();
        if session.is_none() {
            tracing::warn!(func, "Session gone, ignored a callback");
        }
        session
    }

    fn accept<'a>(
        &self,
        func: &'static str,
        handle: Option<&'a TransferHandle>,
    ) -> Option<(Arc<ClientSession>, &'a TransferHandle)> {
        let session = self.session(func)?;
        match check_handle(handle, session.client_id()) {
            Ok(handle) => Some((session, handle)),
            Err(err) => {
                tracing::error!(
                    %err,
                    addon.id = %session.addon().id,
                    func,
                    client.id = %session.client_id(),
                    "Rejected a transfer",
                );
                None
            }
        }
    }

    fn wrong_destination(&self, session: &ClientSession, func: &'static str, handle: &TransferHandle) {
        let err = Error::InvalidHandle("wrong destination");
        tracing::error!(
            %err,
            addon.id = %session.addon().id,
            func,
            destination = handle.destination.kind(),
            "Rejected a transfer",
        );
    }

    // transfers

    pub fn transfer_channel_entry(&self, handle: Option<&TransferHandle>, entry: &PvrChannel) {
        const FUNC: &str = "transfer_channel_entry";
        let Some((session, handle)) = self.accept(FUNC, handle) else {
            return;
        };
        match handle.destination {
            Destination::Channels(ref container) => {
                container.update_from_client(session.converter().channel(entry))
            }
            _ => self.wrong_destination(&session, FUNC, handle),
        }
    }

    pub fn transfer_channel_group(&self, handle: Option<&TransferHandle>, entry: &PvrChannelGroup) {
        const FUNC: &str = "transfer_channel_group";
        let Some((session, handle)) = self.accept(FUNC, handle) else {
            return;
        };
        match handle.destination {
            Destination::ChannelGroups(ref container) => {
                container.update_from_client(session.converter().channel_group(entry))
            }
            _ => self.wrong_destination(&session, FUNC, handle),
        }
    }

    pub fn transfer_channel_group_member(
        &self,
        handle: Option<&TransferHandle>,
        entry: &PvrChannelGroupMember,
    ) {
        const FUNC: &str = "transfer_channel_group_member";
        let Some((session, handle)) = self.accept(FUNC, handle) else {
            return;
        };
        let Destination::ChannelGroupMembers(ref group) = handle.destination else {
            self.wrong_destination(&session, FUNC, handle);
            return;
        };
        let uid = ChannelUid::from(entry.channel_unique_id);
        match self.services.directory.channel(uid, session.client_id()) {
            Some(channel) if channel.is_radio == group.is_radio() => {
                group.add_member(channel, entry.channel_number, entry.sub_channel_number);
            }
            Some(_) => {
                tracing::warn!(
                    addon.id = %session.addon().id,
                    group = %entry.group_name,
                    channel.uid = %uid,
                    "Radio flag of the channel differs from the group, ignored",
                );
            }
            None => {
                tracing::warn!(
                    addon.id = %session.addon().id,
                    group = %entry.group_name,
                    channel.uid = %uid,
                    "Unknown channel, ignored",
                );
            }
        }
    }

    pub fn transfer_epg_entry(&self, handle: Option<&TransferHandle>, entry: &PvrEpgTag) {
        const FUNC: &str = "transfer_epg_entry";
        let Some((session, handle)) = self.accept(FUNC, handle) else {
            return;
        };
        match handle.destination {
            Destination::Epg(ref epg) => epg.update_from_client(session.converter().epg_tag(entry)),
            _ => self.wrong_destination(&session, FUNC, handle),
        }
    }

    pub fn transfer_recording_entry(&self, handle: Option<&TransferHandle>, entry: &PvrRecording) {
        const FUNC: &str = "transfer_recording_entry";
        let Some((session, handle)) = self.accept(FUNC, handle) else {
            return;
        };
        match handle.destination {
            Destination::Recordings(ref container) => {
                container.update_from_client(session.converter().recording(entry))
            }
            _ => self.wrong_destination(&session, FUNC, handle),
        }
    }

    pub fn transfer_timer_entry(&self, handle: Option<&TransferHandle>, entry: &PvrTimer) {
        const FUNC: &str = "transfer_timer_entry";
        let Some((session, handle)) = self.accept(FUNC, handle) else {
            return;
        };
        let Destination::Timers(ref container) = handle.destination else {
            self.wrong_destination(&session, FUNC, handle);
            return;
        };
        let uid = ChannelUid::from(entry.client_channel_uid);
        let channel = if uid == ChannelUid::ANY {
            None
        } else {
            self.services.directory.channel(uid, session.client_id())
        };
        container.update_from_client(session.converter().timer(entry, channel));
    }

    // state changes

    pub fn connection_state_change(
        &self,
        connection_string: &str,
        state: ConnectionState,
        message: &str,
    ) {
        let Some(session) = self.session("connection_state_change") else {
            return;
        };
        if !session.update_connection_state(state) {
            tracing::debug!(addon.id = %session.addon().id, %state, "Same connection state");
            return;
        }
        let message = if message.is_empty() {
            state.default_message()
        } else {
            message
        };
        tracing::info!(
            addon.id = %session.addon().id,
            client.id = %session.client_id(),
            connection_string,
            %state,
            message,
            "Connection state changed",
        );
        self.services.connection_observer.connection_state_changed(
            session.client_id(),
            connection_string,
            state,
            message,
        );
    }

    /// Applies an EPG event change once the host's EPGs exist.
    ///
    /// Changes arriving earlier are queued and applied, oldest first, right
    /// before the first change arriving after the EPGs are created.
    pub fn epg_event_state_change(&self, tag: &PvrEpgTag, channel_uid: i32, state: EpgEventState) {
        let Some(session) = self.session("epg_event_state_change") else {
            return;
        };
        let change = EpgEventChange {
            client_id: session.client_id(),
            channel_uid: channel_uid.into(),
            tag: session.converter().epg_tag(tag),
            state,
        };
        let directory = self.services.directory.as_ref();
        let readiness = self.services.epg_readiness.as_ref();
        self.services.epg_changes.submit(
            change,
            || readiness.epgs_created(),
            |change| apply_epg_change(directory, change),
        );
    }

    // update triggers

    fn schedule(&self, func: &'static str, job: impl FnOnce(ClientId) -> UpdateJob) {
        if let Some(session) = self.session(func) {
            self.services.scheduler.schedule(job(session.client_id()));
        }
    }

    pub fn trigger_channel_update(&self) {
        self.schedule("trigger_channel_update", |client_id| {
            UpdateJob::Channels { client_id }
        });
    }

    pub fn trigger_channel_groups_update(&self) {
        self.schedule("trigger_channel_groups_update", |client_id| {
            UpdateJob::ChannelGroups { client_id }
        });
    }

    pub fn trigger_timer_update(&self) {
        self.schedule("trigger_timer_update", |client_id| UpdateJob::Timers {
            client_id,
        });
    }

    pub fn trigger_recording_update(&self) {
        self.schedule("trigger_recording_update", |client_id| {
            UpdateJob::Recordings { client_id }
        });
    }

    pub fn trigger_epg_update(&self, channel_uid: i32) {
        self.schedule("trigger_epg_update", |client_id| UpdateJob::Epg {
            client_id,
            channel_uid: channel_uid.into(),
        });
    }

    // misc

    pub fn add_menu_hook(&self, hook: &PvrMenuHook) {
        let Some(session) = self.session("add_menu_hook") else {
            return;
        };
        let hook = session.converter().menu_hook(hook);
        tracing::debug!(
            addon.id = %session.addon().id,
            hook.id = hook.hook_id,
            hook.category = ?hook.category,
            "Added menu hook",
        );
        session.add_menu_hook(hook);
    }

    pub fn recording_notification(&self, name: &str, file_name: &str, on: bool) {
        let Some(session) = self.session("recording_notification") else {
            return;
        };
        let client_name = session.addon().name.clone();
        let title = if on {
            format!("Recording started on: {}", client_name)
        } else {
            format!("Recording finished on: {}", client_name)
        };
        tracing::info!(addon.id = %session.addon().id, name, file_name, on, "Recording");
        self.services.notifier.toast(ToastLevel::Info, &title, name);
        self.services
            .notifier
            .audit(AuditEvent::RecordingNotification(RecordingNotification {
                client_id: session.client_id(),
                client_name,
                name: name.to_string(),
                file_name: file_name.to_string(),
                started: on,
                timestamp: Utc::now(),
            }));
    }
}

fn check_handle(
    handle: Option<&TransferHandle>,
    client_id: ClientId,
) -> Result<&TransferHandle, Error> {
    let handle = handle.ok_or(Error::InvalidHandle("missing"))?;
    if handle.caller != client_id {
        return Err(Error::InvalidHandle("handle of another client"));
    }
    Ok(handle)
}

/// Applies an EPG event change to the EPG of its channel.
///
/// Changes for unknown channels, or channels without an EPG, are dropped.
pub fn apply_epg_change(directory: &dyn ChannelDirectory, change: EpgEventChange) {
    let EpgEventChange {
        client_id,
        channel_uid,
        tag,
        state,
    } = change;
    if directory.channel(channel_uid, client_id).is_none() {
        tracing::debug!(client.id = %client_id, channel.uid = %channel_uid, "Unknown channel, dropped an EPG event change");
        return;
    }
    let Some(epg) = directory.epg(channel_uid, client_id) else {
        tracing::debug!(client.id = %client_id, channel.uid = %channel_uid, "No EPG, dropped an EPG event change");
        return;
    };
    let id = tag.unique_broadcast_id;
    if !epg.update_entry(tag, state) {
        tracing::debug!(
            client.id = %client_id,
            channel.uid = %channel_uid,
            epg.id = id,
            %state,
            "Nothing to update",
        );
    }
}
