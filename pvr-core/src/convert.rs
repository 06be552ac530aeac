//! Conversions between addon records and host entities.
//!
//! Times sent by a backend are in backend-local time; the host subtracts the
//! configured time correction when reading them and adds it back when
//! writing records for the backend.

use std::sync::Arc;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::addon::types::*;
use crate::models::*;

#[derive(Clone, Copy, Debug)]
pub struct Converter {
    client_id: ClientId,
    time_correction: Duration,
}

impl Converter {
    pub fn new(client_id: ClientId, time_correction: Duration) -> Self {
        Converter {
            client_id,
            time_correction,
        }
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Saturates at the bounds of `DateTime<Utc>`.
    pub fn host_time(&self, t: i64) -> DateTime<Utc> {
        let wire = DateTime::from_timestamp(t, 0).unwrap_or_default();
        wire.checked_sub_signed(self.time_correction)
            .unwrap_or_else(|| {
                tracing::warn!(client.id = %self.client_id, t, "Backend time out of range");
                if self.time_correction < Duration::zero() {
                    DateTime::<Utc>::MAX_UTC
                } else {
                    DateTime::<Utc>::MIN_UTC
                }
            })
    }

    /// `0` means "not set".
    pub fn host_time_opt(&self, t: i64) -> Option<DateTime<Utc>> {
        if t == 0 { None } else { Some(self.host_time(t)) }
    }

    pub fn wire_time(&self, t: DateTime<Utc>) -> i64 {
        t.checked_add_signed(self.time_correction)
            .unwrap_or(if self.time_correction < Duration::zero() {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            })
            .timestamp()
    }

    pub fn wire_time_opt(&self, t: Option<DateTime<Utc>>) -> i64 {
        t.map(|t| self.wire_time(t)).unwrap_or(0)
    }

    // channels

    pub fn channel(&self, wire: &PvrChannel) -> Channel {
        Channel {
            client_id: self.client_id,
            uid: wire.unique_id.into(),
            is_radio: wire.is_radio,
            channel_number: wire.channel_number,
            sub_channel_number: wire.sub_channel_number,
            name: wire.channel_name.clone(),
            icon_path: wire.icon_path.clone(),
            encryption_system: wire.encryption_system,
            is_hidden: wire.is_hidden,
            stream_url: wire.stream_url.clone(),
            input_format: wire.input_format.clone(),
        }
    }

    pub fn wire_channel(&self, channel: &Channel) -> PvrChannel {
        PvrChannel {
            unique_id: channel.uid.value(),
            is_radio: channel.is_radio,
            channel_number: channel.channel_number,
            sub_channel_number: channel.sub_channel_number,
            channel_name: channel.name.clone(),
            input_format: channel.input_format.clone(),
            stream_url: channel.stream_url.clone(),
            encryption_system: channel.encryption_system,
            icon_path: channel.icon_path.clone(),
            is_hidden: channel.is_hidden,
        }
    }

    pub fn channel_group(&self, wire: &PvrChannelGroup) -> ChannelGroup {
        ChannelGroup {
            client_id: self.client_id,
            name: wire.group_name.clone(),
            is_radio: wire.is_radio,
            position: wire.position,
        }
    }

    pub fn wire_channel_group(&self, group: &ChannelGroup) -> PvrChannelGroup {
        PvrChannelGroup {
            group_name: group.name.clone(),
            is_radio: group.is_radio,
            position: group.position,
        }
    }

    // recordings

    pub fn recording(&self, wire: &PvrRecording) -> Recording {
        Recording {
            client_id: self.client_id,
            recording_id: wire.recording_id.clone(),
            title: wire.title.clone(),
            episode_name: wire.episode_name.clone(),
            series_number: non_negative(wire.series_number),
            episode_number: non_negative(wire.episode_number),
            year: positive(wire.year),
            stream_url: wire.stream_url.clone(),
            directory: wire.directory.clone(),
            plot_outline: wire.plot_outline.clone(),
            plot: wire.plot.clone(),
            genre_type: wire.genre_type,
            genre_sub_type: wire.genre_sub_type,
            channel_name: wire.channel_name.clone(),
            icon_path: wire.icon_path.clone(),
            thumbnail_path: wire.thumbnail_path.clone(),
            fanart_path: wire.fanart_path.clone(),
            recording_time: self.host_time(wire.recording_time),
            duration: std::time::Duration::from_secs(wire.duration.max(0) as u64),
            priority: wire.priority,
            lifetime: wire.lifetime,
            play_count: wire.play_count.max(0) as u32,
            last_played_position: wire.last_played_position.max(0) as u32,
            is_deleted: wire.is_deleted,
            epg_event_id: wire.epg_event_id,
            channel_uid: wire.channel_uid.into(),
            channel_type: match wire.channel_type {
                1 => ChannelType::Tv,
                2 => ChannelType::Radio,
                _ => ChannelType::Unknown,
            },
        }
    }

    pub fn wire_recording(&self, recording: &Recording) -> PvrRecording {
        PvrRecording {
            recording_id: recording.recording_id.clone(),
            title: recording.title.clone(),
            episode_name: recording.episode_name.clone(),
            series_number: recording.series_number.map(|n| n as i32).unwrap_or(-1),
            episode_number: recording.episode_number.map(|n| n as i32).unwrap_or(-1),
            year: recording.year.map(|n| n as i32).unwrap_or(0),
            stream_url: recording.stream_url.clone(),
            directory: recording.directory.clone(),
            plot_outline: recording.plot_outline.clone(),
            plot: recording.plot.clone(),
            channel_name: recording.channel_name.clone(),
            icon_path: recording.icon_path.clone(),
            thumbnail_path: recording.thumbnail_path.clone(),
            fanart_path: recording.fanart_path.clone(),
            recording_time: self.wire_time(recording.recording_time),
            duration: recording.duration.as_secs().min(i32::MAX as u64) as i32,
            priority: recording.priority,
            lifetime: recording.lifetime,
            genre_type: recording.genre_type,
            genre_sub_type: recording.genre_sub_type,
            play_count: recording.play_count as i32,
            last_played_position: recording.last_played_position as i32,
            is_deleted: recording.is_deleted,
            epg_event_id: recording.epg_event_id,
            channel_uid: recording.channel_uid.value(),
            channel_type: match recording.channel_type {
                ChannelType::Unknown => 0,
                ChannelType::Tv => 1,
                ChannelType::Radio => 2,
            },
        }
    }

    pub fn edl_entry(&self, wire: &PvrEdlEntry) -> EdlEntry {
        EdlEntry {
            start_ms: wire.start,
            end_ms: wire.end,
            edl_type: match wire.edl_type {
                1 => EdlType::Mute,
                2 => EdlType::Scene,
                3 => EdlType::CommercialBreak,
                _ => EdlType::Cut,
            },
        }
    }

    // timers

    pub fn timer(&self, wire: &PvrTimer, channel: Option<Arc<Channel>>) -> Timer {
        Timer {
            client_id: self.client_id,
            client_index: wire.client_index,
            parent_client_index: wire.parent_client_index,
            channel_uid: wire.client_channel_uid.into(),
            channel,
            start_time: self.host_time(wire.start_time),
            end_time: self.host_time(wire.end_time),
            start_any_time: wire.start_any_time,
            end_any_time: wire.end_any_time,
            state: wire.state,
            timer_type: wire.timer_type.into(),
            title: wire.title.clone(),
            directory: wire.directory.clone(),
            summary: wire.summary.clone(),
            epg_search_string: wire.epg_search_string.clone(),
            full_text_epg_search: wire.full_text_epg_search,
            first_day: self.host_time_opt(wire.first_day),
            weekdays: wire.weekdays,
            priority: wire.priority,
            lifetime: wire.lifetime,
            max_recordings: wire.max_recordings,
            recording_group: wire.recording_group,
            prevent_duplicate_episodes: wire.prevent_duplicate_episodes,
            epg_uid: wire.epg_uid,
            margin_start: wire.margin_start,
            margin_end: wire.margin_end,
            genre_type: wire.genre_type,
            genre_sub_type: wire.genre_sub_type,
        }
    }

    pub fn wire_timer(&self, timer: &Timer) -> PvrTimer {
        PvrTimer {
            client_index: timer.client_index,
            parent_client_index: timer.parent_client_index,
            client_channel_uid: timer.channel_uid.value(),
            start_time: self.wire_time(timer.start_time),
            end_time: self.wire_time(timer.end_time),
            start_any_time: timer.start_any_time,
            end_any_time: timer.end_any_time,
            state: timer.state,
            timer_type: timer.timer_type.value(),
            title: timer.title.clone(),
            epg_search_string: timer.epg_search_string.clone(),
            full_text_epg_search: timer.full_text_epg_search,
            directory: timer.directory.clone(),
            summary: timer.summary.clone(),
            priority: timer.priority,
            lifetime: timer.lifetime,
            max_recordings: timer.max_recordings,
            recording_group: timer.recording_group,
            first_day: self.wire_time_opt(timer.first_day),
            weekdays: timer.weekdays,
            prevent_duplicate_episodes: timer.prevent_duplicate_episodes,
            epg_uid: timer.epg_uid,
            margin_start: timer.margin_start,
            margin_end: timer.margin_end,
            genre_type: timer.genre_type,
            genre_sub_type: timer.genre_sub_type,
        }
    }

    /// Returns `None` for a type with the reserved id `0`.
    pub fn timer_type(&self, wire: &PvrTimerType) -> Option<TimerType> {
        let id = TimerTypeId::from(wire.id);
        if id == TimerTypeId::NONE {
            return None;
        }
        let mut timer_type = TimerType {
            client_id: self.client_id,
            id,
            attributes: TimerTypeAttributes::from_bits_truncate(wire.attributes),
            description: wire.description.clone(),
            priorities: type_values(&wire.priorities),
            priorities_default: wire.priorities_default,
            lifetimes: type_values(&wire.lifetimes),
            lifetimes_default: wire.lifetimes_default,
            max_recordings: type_values(&wire.max_recordings),
            max_recordings_default: wire.max_recordings_default,
            prevent_duplicate_episodes: type_values(&wire.prevent_duplicate_episodes),
            prevent_duplicate_episodes_default: wire.prevent_duplicate_episodes_default,
            recording_groups: type_values(&wire.recording_groups),
            recording_groups_default: wire.recording_groups_default,
        };
        if timer_type.description.is_empty() {
            timer_type.description = timer_type.generated_description().to_string();
        }
        Some(timer_type)
    }

    // menu hooks

    pub fn menu_hook(&self, wire: &PvrMenuHook) -> MenuHook {
        MenuHook {
            hook_id: wire.hook_id,
            localized_string_id: wire.localized_string_id,
            category: wire.category,
        }
    }

    pub fn wire_menu_hook(&self, hook: &MenuHook) -> PvrMenuHook {
        PvrMenuHook {
            hook_id: hook.hook_id,
            localized_string_id: hook.localized_string_id,
            category: hook.category,
        }
    }

    pub fn wire_menu_hook_data(&self, data: &MenuHookData) -> PvrMenuHookData {
        match data {
            MenuHookData::None => PvrMenuHookData::None,
            MenuHookData::Channel(channel) => PvrMenuHookData::Channel(self.wire_channel(channel)),
            MenuHookData::Timer(timer) => PvrMenuHookData::Timer(self.wire_timer(timer)),
            MenuHookData::EpgTag(tag) => PvrMenuHookData::EpgTag {
                unique_broadcast_id: tag.unique_broadcast_id,
            },
            MenuHookData::Recording(recording) => {
                PvrMenuHookData::Recording(self.wire_recording(recording))
            }
        }
    }

    // epg

    pub fn epg_tag(&self, wire: &PvrEpgTag) -> EpgTag {
        EpgTag {
            unique_broadcast_id: wire.unique_broadcast_id,
            channel_uid: wire.unique_channel_id.into(),
            title: wire.title.clone(),
            plot_outline: wire.plot_outline.clone(),
            plot: wire.plot.clone(),
            original_title: wire.original_title.clone(),
            start_time: self.host_time(wire.start_time),
            end_time: self.host_time(wire.end_time),
            genre_type: wire.genre_type,
            genre_sub_type: wire.genre_sub_type,
            first_aired: self.host_time_opt(wire.first_aired),
            parental_rating: wire.parental_rating,
            star_rating: wire.star_rating,
            series_number: non_negative(wire.series_number),
            episode_number: non_negative(wire.episode_number),
            episode_name: wire.episode_name.clone(),
            icon_path: wire.icon_path.clone(),
            flags: wire.flags,
        }
    }
}

fn non_negative(n: i32) -> Option<u32> {
    if n < 0 { None } else { Some(n as u32) }
}

fn positive(n: i32) -> Option<u32> {
    if n > 0 { Some(n as u32) } else { None }
}

fn type_values(values: &[PvrTypeIntValue]) -> Vec<TypeValue> {
    values
        .iter()
        .map(|v| TypeValue {
            value: v.value,
            description: v.description.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use test_log::test;

    #[test]
    fn test_time_correction() {
        let conv = Converter::new(1.into(), Duration::minutes(5));
        let t = conv.host_time(1_000_000);
        assert_eq!(t.timestamp(), 1_000_000 - 300);
        assert_eq!(conv.wire_time(t), 1_000_000);
        assert_eq!(conv.host_time_opt(0), None);
        assert_eq!(conv.wire_time_opt(None), 0);
    }

    #[test]
    fn test_time_correction_saturates() {
        let max = DateTime::<Utc>::MAX_UTC;
        let min = DateTime::<Utc>::MIN_UTC;

        let conv = Converter::new(1.into(), Duration::minutes(-60));
        assert_eq!(conv.host_time(max.timestamp()), max);
        assert_eq!(conv.wire_time(min), min.timestamp());

        let conv = Converter::new(1.into(), Duration::minutes(60));
        assert_eq!(conv.host_time(min.timestamp()), min);
        assert_eq!(conv.wire_time(max), max.timestamp());

        // out of the representable range
        assert_eq!(conv.host_time(i64::MAX).timestamp(), -3_600);
    }

    #[test]
    fn test_recording() {
        let conv = Converter::new(3.into(), Duration::zero());
        let wire = PvrRecording {
            recording_id: "rec1".to_string(),
            title: "News".to_string(),
            series_number: -1,
            episode_number: 4,
            year: 0,
            recording_time: 1_600_000_000,
            duration: 1800,
            play_count: -1,
            channel_uid: 7,
            channel_type: 2,
            ..Default::default()
        };
        let recording = conv.recording(&wire);
        assert_eq!(recording.client_id, 3.into());
        assert_eq!(recording.series_number, None);
        assert_eq!(recording.episode_number, Some(4));
        assert_eq!(recording.year, None);
        assert_eq!(recording.duration, std::time::Duration::from_secs(1800));
        assert_eq!(recording.play_count, 0);
        assert_eq!(recording.channel_uid, 7.into());
        assert_eq!(recording.channel_type, ChannelType::Radio);

        let back = conv.wire_recording(&recording);
        assert_eq!(back.series_number, -1);
        assert_eq!(back.episode_number, 4);
        assert_eq!(back.recording_time, 1_600_000_000);
        assert_eq!(back.channel_type, 2);
    }

    #[test]
    fn test_timer() {
        let conv = Converter::new(1.into(), Duration::seconds(60));
        let wire = PvrTimer {
            client_index: 5,
            client_channel_uid: -1,
            start_time: 1_000,
            end_time: 2_000,
            timer_type: 2,
            title: "rule".to_string(),
            ..Default::default()
        };
        let timer = conv.timer(&wire, None);
        assert!(timer.is_any_channel());
        assert_eq!(timer.start_time.timestamp(), 940);
        assert_eq!(timer.first_day, None);
        assert_eq!(timer.timer_type, 2.into());
        assert_eq!(conv.wire_timer(&timer), wire);
    }

    #[test]
    fn test_timer_type() {
        let conv = Converter::new(1.into(), Duration::zero());
        assert_matches!(conv.timer_type(&PvrTimerType::default()), None);

        let tt = conv
            .timer_type(&PvrTimerType {
                id: 4,
                attributes: TimerTypeAttributes::IS_MANUAL.bits(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(tt.description, "One time");

        let tt = conv
            .timer_type(&PvrTimerType {
                id: 4,
                attributes: TimerTypeAttributes::IS_MANUAL.bits(),
                description: "Backend label".to_string(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(tt.description, "Backend label");
    }

    #[test]
    fn test_epg_tag() {
        let conv = Converter::new(1.into(), Duration::zero());
        let tag = conv.epg_tag(&PvrEpgTag {
            unique_broadcast_id: 10,
            unique_channel_id: 2,
            start_time: 100,
            end_time: 160,
            series_number: 1,
            episode_number: -1,
            ..Default::default()
        });
        assert_eq!(tag.channel_uid, 2.into());
        assert_eq!(tag.duration(), Duration::seconds(60));
        assert_eq!(tag.series_number, Some(1));
        assert_eq!(tag.episode_number, None);
        assert_eq!(tag.first_aired, None);
    }
}
