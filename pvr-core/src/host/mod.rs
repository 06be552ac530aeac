//! Host-side collaborators of a client session.
//!
//! The host owns channels, groups, recordings, timers and EPGs.  Sessions
//! and relays only hand converted entities to these traits; insert-or-merge
//! policies belong to the implementations.

pub mod memory;

use std::fmt;
use std::sync::Arc;

use crate::addon::AddonHost;
use crate::epg_changes::EpgChangeQueue;
use crate::events::AuditEvent;
use crate::models::*;
use crate::update::UpdateScheduler;

pub trait ChannelsContainer: Send + Sync {
    fn update_from_client(&self, channel: Channel);
}

pub trait ChannelGroupsContainer: Send + Sync {
    fn update_from_client(&self, group: ChannelGroup);
}

/// Members of a single channel group.
pub trait ChannelGroupContainer: Send + Sync {
    fn group(&self) -> ChannelGroup;

    fn is_radio(&self) -> bool {
        self.group().is_radio
    }

    fn add_member(&self, channel: Arc<Channel>, channel_number: u32, sub_channel_number: u32);
}

pub trait RecordingsContainer: Send + Sync {
    fn update_from_client(&self, recording: Recording);
}

pub trait TimersContainer: Send + Sync {
    fn update_from_client(&self, timer: Timer);
}

/// The EPG of a single channel.
pub trait ChannelEpg: Send + Sync {
    fn update_from_client(&self, tag: EpgTag);

    /// Returns `false` when there was nothing to update.
    fn update_entry(&self, tag: EpgTag, state: EpgEventState) -> bool;
}

pub trait ChannelDirectory: Send + Sync {
    fn channel(&self, uid: ChannelUid, client_id: ClientId) -> Option<Arc<Channel>>;

    /// `None` if the channel is unknown or has no EPG yet.
    fn epg(&self, uid: ChannelUid, client_id: ClientId) -> Option<Arc<dyn ChannelEpg>>;
}

pub trait EpgReadiness: Send + Sync {
    fn epgs_created(&self) -> bool;
}

pub trait ConnectionObserver: Send + Sync {
    fn connection_state_changed(
        &self,
        client_id: ClientId,
        connection_string: &str,
        state: ConnectionState,
        message: &str,
    );
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ToastLevel {
    Info,
    Error,
}

impl fmt::Display for ToastLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Error => write!(f, "error"),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn toast(&self, level: ToastLevel, title: &str, message: &str);
    fn audit(&self, event: AuditEvent);
}

/// Everything a session and its relay need from the host.
#[derive(Clone)]
pub struct HostServices {
    pub addon_host: Arc<dyn AddonHost>,
    pub directory: Arc<dyn ChannelDirectory>,
    pub epg_readiness: Arc<dyn EpgReadiness>,
    pub connection_observer: Arc<dyn ConnectionObserver>,
    pub notifier: Arc<dyn Notifier>,
    pub scheduler: Arc<dyn UpdateScheduler>,
    pub epg_changes: Arc<EpgChangeQueue>,
}

/// A [`Notifier`] writing toasts and audit events to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn toast(&self, level: ToastLevel, title: &str, message: &str) {
        match level {
            ToastLevel::Info => tracing::info!(title, message, "Toast"),
            ToastLevel::Error => tracing::error!(title, message, "Toast"),
        }
    }

    fn audit(&self, event: AuditEvent) {
        match serde_json::to_string(&event) {
            Ok(json) => tracing::info!(event = %json, "Audit"),
            Err(err) => tracing::error!(%err, "Failed to serialize an audit event"),
        }
    }
}

#[cfg(test)]
pub(crate) mod stub;
