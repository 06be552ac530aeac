//! The boundary between the host and PVR backend addons.
//!
//! [`PvrAddon`] is the table of entry points a backend exposes to the host.
//! Calls in the opposite direction go through the
//! [`EventRelay`](crate::relay::EventRelay) handed to the addon when its
//! instance is created.  Every entry point has a default implementation
//! answering [`PvrError::NotImplemented`], so a backend only provides what it
//! declares in its capabilities.

pub mod boundary;
pub mod types;

#[cfg(test)]
pub(crate) mod stub;

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::models::Capabilities;
use crate::relay::EventRelay;
use crate::relay::TransferHandle;
use types::*;

/// Identity of an addon, used for logging and fault attribution.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonInfo {
    pub id: String,
    pub name: String,
    pub version: String,
    pub author: String,
}

impl fmt::Display for AddonInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Kinds of addon instances.  Only `Pvr` instances are created through
/// this crate; the others are listed for the instance-type tag passed to
/// the addon host.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstanceType {
    Pvr,
    Screensaver,
    Visualization,
    InputStream,
    AudioDecoder,
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pvr => write!(f, "pvr"),
            Self::Screensaver => write!(f, "screensaver"),
            Self::Visualization => write!(f, "visualization"),
            Self::InputStream => write!(f, "inputstream"),
            Self::AudioDecoder => write!(f, "audiodecoder"),
        }
    }
}

/// Status reported by the addon host when an instance cannot be created.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AddonStatus {
    LostConnection,
    NeedRestart,
    NeedSettings,
    Unknown,
    PermanentFailure,
}

impl fmt::Display for AddonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LostConnection => write!(f, "lost connection"),
            Self::NeedRestart => write!(f, "need restart"),
            Self::NeedSettings => write!(f, "need settings"),
            Self::Unknown => write!(f, "unknown"),
            Self::PermanentFailure => write!(f, "permanent failure"),
        }
    }
}

impl From<AddonStatus> for crate::error::Error {
    fn from(status: AddonStatus) -> Self {
        Self::InstanceCreationFailed(status)
    }
}

/// Creates and destroys addon instances.
///
/// Loading the shared library and marshalling addon settings are the
/// implementor's business.
pub trait AddonHost: Send + Sync {
    fn create_instance(
        &self,
        kind: InstanceType,
        addon: &AddonInfo,
        relay: Arc<EventRelay>,
    ) -> Result<Arc<dyn PvrAddon>, AddonStatus>;

    fn destroy_instance(&self, kind: InstanceType, addon: &AddonInfo, instance: Arc<dyn PvrAddon>);
}

macro_rules! not_implemented {
    () => {
        Err(PvrError::NotImplemented)
    };
}

/// Entry points of a PVR backend addon.
///
/// Methods taking a [`TransferHandle`] deliver their results by calling the
/// matching `transfer_*` callback of the relay with that handle before they
/// return.
#[allow(unused_variables)]
pub trait PvrAddon: Send + Sync {
    // properties

    fn api_version(&self) -> PvrResult<String>;

    fn capabilities(&self) -> PvrResult<Capabilities>;

    fn backend_name(&self) -> PvrResult<String>;

    fn connection_string(&self) -> PvrResult<String>;

    fn backend_version(&self) -> PvrResult<String>;

    fn backend_hostname(&self) -> PvrResult<String> {
        Ok(String::new())
    }

    /// Returns at most `max` timer types.
    fn timer_types(&self, max: usize) -> PvrResult<Vec<PvrTimerType>> {
        not_implemented!()
    }

    /// Milliseconds to wait after a channel switch before the next tune.
    fn channel_switch_delay(&self) -> u32 {
        0
    }

    fn drive_space(&self) -> PvrResult<DriveSpace> {
        not_implemented!()
    }

    fn call_menu_hook(&self, hook: &PvrMenuHook, data: &PvrMenuHookData) -> PvrResult<()> {
        not_implemented!()
    }

    // channels

    fn open_dialog_channel_scan(&self) -> PvrResult<()> {
        not_implemented!()
    }

    fn open_dialog_channel_add(&self, channel: &PvrChannel) -> PvrResult<()> {
        not_implemented!()
    }

    fn open_dialog_channel_settings(&self, channel: &PvrChannel) -> PvrResult<()> {
        not_implemented!()
    }

    fn delete_channel(&self, channel: &PvrChannel) -> PvrResult<()> {
        not_implemented!()
    }

    fn rename_channel(&self, channel: &PvrChannel) -> PvrResult<()> {
        not_implemented!()
    }

    fn channels_amount(&self) -> PvrResult<i32> {
        not_implemented!()
    }

    fn channels(&self, handle: &TransferHandle, radio: bool) -> PvrResult<()> {
        not_implemented!()
    }

    fn channel_groups_amount(&self) -> PvrResult<i32> {
        not_implemented!()
    }

    fn channel_groups(&self, handle: &TransferHandle, radio: bool) -> PvrResult<()> {
        not_implemented!()
    }

    fn channel_group_members(
        &self,
        handle: &TransferHandle,
        group: &PvrChannelGroup,
    ) -> PvrResult<()> {
        not_implemented!()
    }

    // epg

    fn epg_for_channel(
        &self,
        handle: &TransferHandle,
        channel: &PvrChannel,
        start: i64,
        end: i64,
    ) -> PvrResult<()> {
        not_implemented!()
    }

    fn set_epg_time_frame(&self, days: i32) -> PvrResult<()> {
        not_implemented!()
    }

    // recordings

    fn recordings_amount(&self, deleted: bool) -> PvrResult<i32> {
        not_implemented!()
    }

    fn recordings(&self, handle: &TransferHandle, deleted: bool) -> PvrResult<()> {
        not_implemented!()
    }

    fn delete_recording(&self, recording: &PvrRecording) -> PvrResult<()> {
        not_implemented!()
    }

    fn undelete_recording(&self, recording: &PvrRecording) -> PvrResult<()> {
        not_implemented!()
    }

    fn delete_all_recordings_from_trash(&self) -> PvrResult<()> {
        not_implemented!()
    }

    fn rename_recording(&self, recording: &PvrRecording) -> PvrResult<()> {
        not_implemented!()
    }

    fn set_recording_lifetime(&self, recording: &PvrRecording) -> PvrResult<()> {
        not_implemented!()
    }

    fn set_recording_play_count(&self, recording: &PvrRecording, count: i32) -> PvrResult<()> {
        not_implemented!()
    }

    fn set_recording_last_played_position(
        &self,
        recording: &PvrRecording,
        position: i32,
    ) -> PvrResult<()> {
        not_implemented!()
    }

    fn recording_last_played_position(&self, recording: &PvrRecording) -> PvrResult<i32> {
        not_implemented!()
    }

    fn recording_edl(&self, recording: &PvrRecording) -> PvrResult<Vec<PvrEdlEntry>> {
        not_implemented!()
    }

    // timers

    fn timers_amount(&self) -> PvrResult<i32> {
        not_implemented!()
    }

    fn timers(&self, handle: &TransferHandle) -> PvrResult<()> {
        not_implemented!()
    }

    fn add_timer(&self, timer: &PvrTimer) -> PvrResult<()> {
        not_implemented!()
    }

    fn delete_timer(&self, timer: &PvrTimer, force: bool) -> PvrResult<()> {
        not_implemented!()
    }

    fn update_timer(&self, timer: &PvrTimer) -> PvrResult<()> {
        not_implemented!()
    }

    // live streams

    fn open_live_stream(&self, channel: &PvrChannel) -> PvrResult<()> {
        not_implemented!()
    }

    fn close_live_stream(&self) -> PvrResult<()> {
        Ok(())
    }

    fn switch_channel(&self, channel: &PvrChannel) -> PvrResult<()> {
        not_implemented!()
    }

    fn read_live_stream(&self, buf: &mut [u8]) -> PvrResult<usize> {
        not_implemented!()
    }

    fn seek_live_stream(&self, position: i64, whence: SeekWhence) -> PvrResult<i64> {
        not_implemented!()
    }

    fn position_live_stream(&self) -> PvrResult<i64> {
        not_implemented!()
    }

    fn length_live_stream(&self) -> PvrResult<i64> {
        not_implemented!()
    }

    fn signal_status(&self) -> PvrResult<SignalStatus> {
        not_implemented!()
    }

    fn descramble_info(&self) -> PvrResult<DescrambleInfo> {
        not_implemented!()
    }

    fn stream_properties(&self) -> PvrResult<StreamProperties> {
        not_implemented!()
    }

    // recorded streams

    fn open_recorded_stream(&self, recording: &PvrRecording) -> PvrResult<()> {
        not_implemented!()
    }

    fn close_recorded_stream(&self) -> PvrResult<()> {
        Ok(())
    }

    fn read_recorded_stream(&self, buf: &mut [u8]) -> PvrResult<usize> {
        not_implemented!()
    }

    fn seek_recorded_stream(&self, position: i64, whence: SeekWhence) -> PvrResult<i64> {
        not_implemented!()
    }

    fn position_recorded_stream(&self) -> PvrResult<i64> {
        not_implemented!()
    }

    fn length_recorded_stream(&self) -> PvrResult<i64> {
        not_implemented!()
    }

    // demuxing

    fn demux_read(&self) -> PvrResult<Option<DemuxPacket>> {
        not_implemented!()
    }

    fn demux_reset(&self) -> PvrResult<()> {
        not_implemented!()
    }

    fn demux_abort(&self) -> PvrResult<()> {
        not_implemented!()
    }

    fn demux_flush(&self) -> PvrResult<()> {
        not_implemented!()
    }

    // stream control

    fn can_pause_stream(&self) -> PvrResult<bool> {
        Ok(false)
    }

    fn can_seek_stream(&self) -> PvrResult<bool> {
        Ok(false)
    }

    fn pause_stream(&self, paused: bool) -> PvrResult<()> {
        not_implemented!()
    }

    /// Seeks to `time` (ms); returns the resulting start time (ms).
    fn seek_time(&self, time: f64, backwards: bool) -> PvrResult<f64> {
        not_implemented!()
    }

    fn set_speed(&self, speed: i32) -> PvrResult<()> {
        not_implemented!()
    }

    fn is_real_time_stream(&self) -> PvrResult<bool> {
        Ok(false)
    }

    fn stream_times(&self) -> PvrResult<StreamTimes> {
        not_implemented!()
    }

    // power management

    fn on_system_sleep(&self) -> PvrResult<()> {
        not_implemented!()
    }

    fn on_system_wake(&self) -> PvrResult<()> {
        not_implemented!()
    }

    fn on_power_saving_activated(&self) -> PvrResult<()> {
        not_implemented!()
    }

    fn on_power_saving_deactivated(&self) -> PvrResult<()> {
        not_implemented!()
    }
}
