//! Fire-and-forget refresh requests coming from addons.

use std::fmt;

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::models::ChannelUid;
use crate::models::ClientId;

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
#[serde(rename_all_fields = "camelCase")]
pub enum UpdateJob {
    Channels { client_id: ClientId },
    ChannelGroups { client_id: ClientId },
    Timers { client_id: ClientId },
    Recordings { client_id: ClientId },
    Epg { client_id: ClientId, channel_uid: ChannelUid },
}

impl UpdateJob {
    pub fn client_id(&self) -> ClientId {
        match self {
            Self::Channels { client_id }
            | Self::ChannelGroups { client_id }
            | Self::Timers { client_id }
            | Self::Recordings { client_id }
            | Self::Epg { client_id, .. } => *client_id,
        }
    }
}

impl fmt::Display for UpdateJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channels { client_id } => write!(f, "channels@{}", client_id),
            Self::ChannelGroups { client_id } => write!(f, "channel-groups@{}", client_id),
            Self::Timers { client_id } => write!(f, "timers@{}", client_id),
            Self::Recordings { client_id } => write!(f, "recordings@{}", client_id),
            Self::Epg {
                client_id,
                channel_uid,
            } => write!(f, "epg@{}/{}", client_id, channel_uid),
        }
    }
}

/// Schedules refresh work on the host.
///
/// Implementations must return without waiting for the work to run.
pub trait UpdateScheduler: Send + Sync {
    fn schedule(&self, job: UpdateJob);
}

impl UpdateScheduler for UnboundedSender<UpdateJob> {
    fn schedule(&self, job: UpdateJob) {
        tracing::debug!(%job, "Schedule update");
        if let Err(err) = self.send(job) {
            tracing::warn!(job = %err.0, "No update worker, dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use test_log::test;
    use tokio::sync::mpsc;

    #[test]
    fn test_unbounded_sender_scheduler() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.schedule(UpdateJob::Timers {
            client_id: 1.into(),
        });
        tx.schedule(UpdateJob::Epg {
            client_id: 1.into(),
            channel_uid: 7.into(),
        });
        assert_matches!(rx.try_recv(), Ok(UpdateJob::Timers { client_id }) => {
            assert_eq!(client_id, 1.into());
        });
        assert_matches!(rx.try_recv(), Ok(UpdateJob::Epg { channel_uid, .. }) => {
            assert_eq!(channel_uid, 7.into());
        });

        drop(rx);
        // must not block or panic
        tx.schedule(UpdateJob::Channels {
            client_id: 1.into(),
        });
    }

    #[test]
    fn test_update_job_json() {
        let job = UpdateJob::Epg {
            client_id: 2.into(),
            channel_uid: 5.into(),
        };
        assert_eq!(
            serde_json::to_value(&job).unwrap(),
            serde_json::json!({"type": "epg", "clientId": 2, "channelUid": 5})
        );
        assert_eq!(job.to_string(), "epg@client#2/CUID#5");
        assert_eq!(job.client_id(), 2.into());
    }
}
