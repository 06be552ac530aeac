use std::fmt;

use bitflags::bitflags;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

// identifiers

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct ClientId(i32);

impl ClientId {
    pub const ANY: ClientId = ClientId(-1);
    pub const INVALID: ClientId = ClientId(-2);

    pub fn value(&self) -> i32 {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client#{}", self.0)
    }
}

impl From<i32> for ClientId {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct ChannelUid(i32);

impl ChannelUid {
    pub const ANY: ChannelUid = ChannelUid(-1);

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for ChannelUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CUID#{}", self.0)
    }
}

impl From<i32> for ChannelUid {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub struct TimerTypeId(u32);

impl TimerTypeId {
    pub const NONE: TimerTypeId = TimerTypeId(0);

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TimerTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TT#{}", self.0)
    }
}

impl From<u32> for TimerTypeId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

// connection

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionState {
    #[default]
    Unknown,
    ServerUnreachable,
    ServerMismatch,
    VersionMismatch,
    AccessDenied,
    Connected,
    Disconnected,
    Connecting,
}

impl ConnectionState {
    /// Message used when the backend doesn't supply its own one.
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown connection state",
            Self::ServerUnreachable => "Server is unreachable",
            Self::ServerMismatch => "Server does not respond properly",
            Self::VersionMismatch => "Server version is not compatible",
            Self::AccessDenied => "Access denied",
            Self::Connected => "Connection established",
            Self::Disconnected => "Connection lost",
            Self::Connecting => "Connecting",
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, Self::Connected | Self::Connecting)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::ServerUnreachable => write!(f, "server-unreachable"),
            Self::ServerMismatch => write!(f, "server-mismatch"),
            Self::VersionMismatch => write!(f, "version-mismatch"),
            Self::AccessDenied => write!(f, "access-denied"),
            Self::Connected => write!(f, "connected"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
        }
    }
}

// capabilities

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub supports_epg: bool,
    pub supports_tv: bool,
    pub supports_radio: bool,
    pub supports_recordings: bool,
    pub supports_recordings_undelete: bool,
    pub supports_timers: bool,
    pub supports_channel_groups: bool,
    pub supports_channel_scan: bool,
    pub supports_channel_settings: bool,
    pub handles_input_stream: bool,
    pub handles_demuxing: bool,
    pub supports_recording_play_count: bool,
    pub supports_last_played_position: bool,
    pub supports_recording_edl: bool,
    pub supports_recordings_rename: bool,
    pub supports_recordings_lifetime_change: bool,
    pub supports_descramble_info: bool,
}

// channels

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub client_id: ClientId,
    pub uid: ChannelUid,
    pub is_radio: bool,
    pub channel_number: u32,
    pub sub_channel_number: u32,
    pub name: String,
    pub icon_path: String,
    pub encryption_system: u32,
    pub is_hidden: bool,
    /// Non-empty when the backend streams the channel from a URL the host
    /// opens by itself.
    pub stream_url: String,
    pub input_format: String,
}

impl Channel {
    pub fn has_stream_url(&self) -> bool {
        !self.stream_url.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelGroup {
    pub client_id: ClientId,
    pub name: String,
    pub is_radio: bool,
    pub position: u32,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelType {
    #[default]
    Unknown,
    Tv,
    Radio,
}

// recordings

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    pub client_id: ClientId,
    pub recording_id: String,
    pub title: String,
    pub episode_name: String,
    pub series_number: Option<u32>,
    pub episode_number: Option<u32>,
    pub year: Option<u32>,
    pub stream_url: String,
    pub directory: String,
    pub plot_outline: String,
    pub plot: String,
    pub genre_type: u32,
    pub genre_sub_type: u32,
    pub channel_name: String,
    pub icon_path: String,
    pub thumbnail_path: String,
    pub fanart_path: String,
    pub recording_time: DateTime<Utc>,
    #[serde(with = "humantime_serde")]
    pub duration: std::time::Duration,
    pub priority: i32,
    pub lifetime: i32,
    pub play_count: u32,
    pub last_played_position: u32,
    pub is_deleted: bool,
    pub epg_event_id: u32,
    pub channel_uid: ChannelUid,
    pub channel_type: ChannelType,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdlType {
    Cut,
    Mute,
    Scene,
    CommercialBreak,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdlEntry {
    pub start_ms: i64,
    pub end_ms: i64,
    pub edl_type: EdlType,
}

// timers

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimerState {
    #[default]
    New,
    Scheduled,
    Recording,
    Completed,
    Aborted,
    Cancelled,
    ConflictOk,
    ConflictNok,
    Error,
    Disabled,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timer {
    pub client_id: ClientId,
    pub client_index: u32,
    pub parent_client_index: u32,
    pub channel_uid: ChannelUid,
    /// `None` for timer rules matching any channel, or when the channel is
    /// not known to the host.
    #[serde(skip)]
    pub channel: Option<std::sync::Arc<Channel>>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub start_any_time: bool,
    pub end_any_time: bool,
    pub state: TimerState,
    pub timer_type: TimerTypeId,
    pub title: String,
    pub directory: String,
    pub summary: String,
    pub epg_search_string: String,
    pub full_text_epg_search: bool,
    pub first_day: Option<DateTime<Utc>>,
    pub weekdays: u32,
    pub priority: i32,
    pub lifetime: i32,
    pub max_recordings: i32,
    pub recording_group: u32,
    pub prevent_duplicate_episodes: u32,
    pub epg_uid: u32,
    pub margin_start: u32,
    pub margin_end: u32,
    pub genre_type: u32,
    pub genre_sub_type: u32,
}

impl Timer {
    pub fn is_any_channel(&self) -> bool {
        self.channel_uid == ChannelUid::ANY
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
    pub struct TimerTypeAttributes: u32 {
        const IS_MANUAL = 1 << 0;
        const IS_REPEATING = 1 << 1;
        const IS_READONLY = 1 << 2;
        const FORBIDS_NEW_INSTANCES = 1 << 3;
        const SUPPORTS_ENABLE_DISABLE = 1 << 4;
        const SUPPORTS_CHANNELS = 1 << 5;
        const SUPPORTS_START_TIME = 1 << 6;
        const SUPPORTS_TITLE_EPG_MATCH = 1 << 7;
        const SUPPORTS_FULLTEXT_EPG_MATCH = 1 << 8;
        const SUPPORTS_FIRST_DAY = 1 << 9;
        const SUPPORTS_WEEKDAYS = 1 << 10;
        const SUPPORTS_RECORD_ONLY_NEW_EPISODES = 1 << 11;
        const SUPPORTS_START_END_MARGIN = 1 << 12;
        const SUPPORTS_PRIORITY = 1 << 13;
        const SUPPORTS_LIFETIME = 1 << 14;
        const SUPPORTS_RECORDING_FOLDERS = 1 << 15;
        const SUPPORTS_RECORDING_GROUP = 1 << 16;
        const SUPPORTS_END_TIME = 1 << 17;
        const SUPPORTS_START_ANYTIME = 1 << 18;
        const SUPPORTS_END_ANYTIME = 1 << 19;
        const SUPPORTS_MAX_RECORDINGS = 1 << 20;
        const REQUIRES_EPG_TAG_ON_CREATE = 1 << 21;
        const FORBIDS_EPG_TAG_ON_CREATE = 1 << 22;
        const REQUIRES_EPG_SERIES_ON_CREATE = 1 << 23;
        const SUPPORTS_ANY_CHANNEL = 1 << 24;
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeValue {
    pub value: i32,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerType {
    pub client_id: ClientId,
    pub id: TimerTypeId,
    pub attributes: TimerTypeAttributes,
    pub description: String,
    pub priorities: Vec<TypeValue>,
    pub priorities_default: i32,
    pub lifetimes: Vec<TypeValue>,
    pub lifetimes_default: i32,
    pub max_recordings: Vec<TypeValue>,
    pub max_recordings_default: i32,
    pub prevent_duplicate_episodes: Vec<TypeValue>,
    pub prevent_duplicate_episodes_default: u32,
    pub recording_groups: Vec<TypeValue>,
    pub recording_groups_default: u32,
}

impl TimerType {
    pub fn is_manual(&self) -> bool {
        self.attributes.contains(TimerTypeAttributes::IS_MANUAL)
    }

    pub fn is_epg_based(&self) -> bool {
        !self.is_manual()
    }

    pub fn is_repeating(&self) -> bool {
        self.attributes.contains(TimerTypeAttributes::IS_REPEATING)
    }

    pub fn is_one_shot(&self) -> bool {
        !self.is_repeating()
    }

    pub fn is_read_only(&self) -> bool {
        self.attributes.contains(TimerTypeAttributes::IS_READONLY)
    }

    /// Description generated for types the backend left undescribed.
    pub fn generated_description(&self) -> &'static str {
        match (self.is_repeating(), self.is_epg_based()) {
            (true, true) => "Timer rule (guide-based)",
            (true, false) => "Timer rule",
            (false, true) => "One time (guide-based)",
            (false, false) => "One time",
        }
    }
}

// menu hooks

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MenuHookCategory {
    #[default]
    Unknown,
    All,
    Channel,
    Timer,
    EpgTag,
    Recording,
    DeletedRecording,
    Setting,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuHook {
    pub hook_id: u32,
    pub localized_string_id: u32,
    pub category: MenuHookCategory,
}

impl MenuHook {
    pub fn matches(&self, category: MenuHookCategory) -> bool {
        self.category == category || self.category == MenuHookCategory::All
    }
}

/// Context a menu hook is invoked on.
#[derive(Clone, Debug)]
pub enum MenuHookData {
    None,
    Channel(std::sync::Arc<Channel>),
    Timer(Timer),
    EpgTag(EpgTag),
    Recording(Recording),
}

// epg

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EpgEventState {
    Created,
    Updated,
    Deleted,
}

impl fmt::Display for EpgEventState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Updated => write!(f, "updated"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpgTag {
    pub unique_broadcast_id: u32,
    pub channel_uid: ChannelUid,
    pub title: String,
    pub plot_outline: String,
    pub plot: String,
    pub original_title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub genre_type: u32,
    pub genre_sub_type: u32,
    pub first_aired: Option<DateTime<Utc>>,
    pub parental_rating: u32,
    pub star_rating: u32,
    pub series_number: Option<u32>,
    pub episode_number: Option<u32>,
    pub episode_name: String,
    pub icon_path: String,
    pub flags: u32,
}

impl EpgTag {
    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }
}

/// An EPG event state change reported by a client.
#[derive(Clone, Debug, PartialEq)]
pub struct EpgEventChange {
    pub client_id: ClientId,
    pub channel_uid: ChannelUid,
    pub tag: EpgTag,
    pub state: EpgEventState,
}
