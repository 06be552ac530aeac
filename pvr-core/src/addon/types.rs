//! Records exchanged with a PVR addon.
//!
//! Field semantics follow the addon API: times are seconds since the UNIX
//! epoch in backend-local time, `0` meaning "not set" unless noted, and
//! optional numbers use `-1`/`0` sentinels the way backends send them.  The
//! conversions into host entities live in `crate::convert`.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::models::Capabilities;
use crate::models::ConnectionState;
use crate::models::EpgEventState;
use crate::models::MenuHookCategory;
use crate::models::TimerState;

/// Result codes returned by addon entry points.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum PvrError {
    Unknown,
    NotImplemented,
    ServerError,
    ServerTimeout,
    Rejected,
    AlreadyPresent,
    InvalidParameters,
    RecordingRunning,
    Failed,
}

impl PvrError {
    pub fn code(&self) -> i32 {
        match self {
            Self::Unknown => -1,
            Self::NotImplemented => -2,
            Self::ServerError => -3,
            Self::ServerTimeout => -4,
            Self::Rejected => -5,
            Self::AlreadyPresent => -6,
            Self::InvalidParameters => -7,
            Self::RecordingRunning => -8,
            Self::Failed => -9,
        }
    }

    /// Maps a raw result code; `0` is success and yields `None`.  Codes the
    /// host doesn't know are treated as `Unknown`.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => None,
            -2 => Some(Self::NotImplemented),
            -3 => Some(Self::ServerError),
            -4 => Some(Self::ServerTimeout),
            -5 => Some(Self::Rejected),
            -6 => Some(Self::AlreadyPresent),
            -7 => Some(Self::InvalidParameters),
            -8 => Some(Self::RecordingRunning),
            -9 => Some(Self::Failed),
            _ => Some(Self::Unknown),
        }
    }
}

impl fmt::Display for PvrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "unknown error",
            Self::NotImplemented => "not implemented",
            Self::ServerError => "server error",
            Self::ServerTimeout => "server timeout",
            Self::Rejected => "rejected by the backend",
            Self::AlreadyPresent => "already present",
            Self::InvalidParameters => "invalid parameters",
            Self::RecordingRunning => "recording running",
            Self::Failed => "failed",
        };
        write!(f, "{} ({})", s, self.code())
    }
}

pub type PvrResult<T> = Result<T, PvrError>;

// Connection and EPG event states are shared with the host model.
pub type PvrConnectionState = ConnectionState;
pub type PvrEpgEventState = EpgEventState;
pub type PvrCapabilities = Capabilities;

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PvrChannel {
    pub unique_id: i32,
    pub is_radio: bool,
    pub channel_number: u32,
    pub sub_channel_number: u32,
    pub channel_name: String,
    pub input_format: String,
    pub stream_url: String,
    pub encryption_system: u32,
    pub icon_path: String,
    pub is_hidden: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PvrChannelGroup {
    pub group_name: String,
    pub is_radio: bool,
    pub position: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PvrChannelGroupMember {
    pub group_name: String,
    pub channel_unique_id: i32,
    pub channel_number: u32,
    pub sub_channel_number: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PvrRecording {
    pub recording_id: String,
    pub title: String,
    pub episode_name: String,
    /// `-1` when unknown.
    pub series_number: i32,
    /// `-1` when unknown.
    pub episode_number: i32,
    /// `0` when unknown.
    pub year: i32,
    pub stream_url: String,
    pub directory: String,
    pub plot_outline: String,
    pub plot: String,
    pub channel_name: String,
    pub icon_path: String,
    pub thumbnail_path: String,
    pub fanart_path: String,
    pub recording_time: i64,
    /// Seconds.
    pub duration: i32,
    pub priority: i32,
    pub lifetime: i32,
    pub genre_type: u32,
    pub genre_sub_type: u32,
    pub play_count: i32,
    pub last_played_position: i32,
    pub is_deleted: bool,
    pub epg_event_id: u32,
    pub channel_uid: i32,
    /// 0: unknown, 1: tv, 2: radio.
    pub channel_type: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PvrTimer {
    pub client_index: u32,
    pub parent_client_index: u32,
    pub client_channel_uid: i32,
    pub start_time: i64,
    pub end_time: i64,
    pub start_any_time: bool,
    pub end_any_time: bool,
    pub state: TimerState,
    pub timer_type: u32,
    pub title: String,
    pub epg_search_string: String,
    pub full_text_epg_search: bool,
    pub directory: String,
    pub summary: String,
    pub priority: i32,
    pub lifetime: i32,
    pub max_recordings: i32,
    pub recording_group: u32,
    pub first_day: i64,
    pub weekdays: u32,
    pub prevent_duplicate_episodes: u32,
    pub epg_uid: u32,
    pub margin_start: u32,
    pub margin_end: u32,
    pub genre_type: u32,
    pub genre_sub_type: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PvrTypeIntValue {
    pub value: i32,
    pub description: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PvrTimerType {
    /// `0` is not a valid id.
    pub id: u32,
    pub attributes: u32,
    pub description: String,
    pub priorities: Vec<PvrTypeIntValue>,
    pub priorities_default: i32,
    pub lifetimes: Vec<PvrTypeIntValue>,
    pub lifetimes_default: i32,
    pub max_recordings: Vec<PvrTypeIntValue>,
    pub max_recordings_default: i32,
    pub prevent_duplicate_episodes: Vec<PvrTypeIntValue>,
    pub prevent_duplicate_episodes_default: u32,
    pub recording_groups: Vec<PvrTypeIntValue>,
    pub recording_groups_default: u32,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PvrMenuHook {
    pub hook_id: u32,
    pub localized_string_id: u32,
    pub category: MenuHookCategory,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PvrEpgTag {
    pub unique_broadcast_id: u32,
    pub unique_channel_id: i32,
    pub title: String,
    pub start_time: i64,
    pub end_time: i64,
    pub plot_outline: String,
    pub plot: String,
    pub original_title: String,
    pub icon_path: String,
    pub genre_type: u32,
    pub genre_sub_type: u32,
    pub first_aired: i64,
    pub parental_rating: u32,
    pub star_rating: u32,
    /// `-1` when unknown.
    pub series_number: i32,
    /// `-1` when unknown.
    pub episode_number: i32,
    pub episode_name: String,
    pub flags: u32,
}

/// Context handed to the addon along with a menu hook invocation.
#[derive(Clone, Debug, PartialEq)]
pub enum PvrMenuHookData {
    None,
    Channel(PvrChannel),
    Timer(PvrTimer),
    EpgTag { unique_broadcast_id: u32 },
    Recording(PvrRecording),
}

// streaming

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SeekWhence {
    Set,
    Current,
    End,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamInfo {
    pub pid: u32,
    pub codec_type: String,
    pub codec_id: u32,
    pub language: String,
    pub fps_scale: i32,
    pub fps_rate: i32,
    pub height: i32,
    pub width: i32,
    pub aspect: f32,
    pub channels: i32,
    pub sample_rate: i32,
    pub block_align: i32,
    pub bit_rate: i32,
    pub bits_per_sample: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamProperties {
    pub streams: Vec<StreamInfo>,
}

/// A demuxed packet.  The addon hands over ownership of the payload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DemuxPacket {
    pub stream_id: i32,
    pub data: Vec<u8>,
    pub pts: f64,
    pub dts: f64,
    pub duration: f64,
    /// Set when the packet announces changed stream properties instead of
    /// carrying payload.
    pub stream_change: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalStatus {
    pub adapter_name: String,
    pub adapter_status: String,
    pub service_name: String,
    pub provider_name: String,
    pub mux_name: String,
    pub snr: i32,
    pub signal: i32,
    pub ber: i64,
    pub unc: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescrambleInfo {
    pub pid: i32,
    pub caid: i32,
    pub provid: i32,
    pub ecm_time: i32,
    pub hops: i32,
    pub cardsystem: String,
    pub reader: String,
    pub from: String,
    pub protocol: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamTimes {
    /// Backend-local time.
    pub start_time: i64,
    /// Microseconds.
    pub pts_start: i64,
    pub pts_begin: i64,
    pub pts_end: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PvrEdlEntry {
    pub start: i64,
    pub end: i64,
    /// 0: cut, 1: mute, 2: scene marker, 3: commercial break.
    pub edl_type: u32,
}

/// Drive space in KiB.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveSpace {
    pub total: u64,
    pub used: u64,
}
