//! A loopback backend serving a fixed line-up.

use std::sync::Arc;

use chrono::Utc;
use pvr_core::addon::types::*;
use pvr_core::addon::*;
use pvr_core::models::*;
use pvr_core::negotiation::API_VERSION;
use pvr_core::relay::EventRelay;
use pvr_core::relay::TransferHandle;

pub const ADDON_ID: &str = "pvr.demo";

// (uid, name, radio)
const CHANNELS: &[(i32, &str, bool)] = &[
    (1, "Demo 1", false),
    (2, "Demo 2", false),
    (3, "Demo News", false),
    (101, "Demo Radio", true),
];

const TV_GROUPS: &[&str] = &["All TV", "News"];
const RADIO_GROUPS: &[&str] = &["Radio"];

const CONNECTION_STRING: &str = "loopback";

const PROGRAM_SECS: i64 = 30 * 60;
const PROGRAMS_PER_CHANNEL: i64 = 6;

pub struct DemoAddonHost;

impl AddonHost for DemoAddonHost {
    fn create_instance(
        &self,
        kind: InstanceType,
        addon: &AddonInfo,
        relay: Arc<EventRelay>,
    ) -> Result<Arc<dyn PvrAddon>, AddonStatus> {
        if kind != InstanceType::Pvr || addon.id != ADDON_ID {
            tracing::error!(%kind, addon.id = %addon.id, "Unsupported addon");
            return Err(AddonStatus::PermanentFailure);
        }
        let demo = DemoAddon::new(relay);
        demo.connect();
        Ok(Arc::new(demo))
    }

    fn destroy_instance(&self, kind: InstanceType, addon: &AddonInfo, _instance: Arc<dyn PvrAddon>) {
        tracing::debug!(%kind, addon.id = %addon.id, "Destroyed demo instance");
    }
}

pub struct DemoAddon {
    relay: Arc<EventRelay>,
    epoch: i64,
}

impl DemoAddon {
    fn new(relay: Arc<EventRelay>) -> Self {
        // Programs start at the beginning of the current half hour.
        let now = Utc::now().timestamp();
        DemoAddon {
            relay,
            epoch: now - now % PROGRAM_SECS,
        }
    }

    fn connect(&self) {
        self.relay
            .connection_state_change(CONNECTION_STRING, ConnectionState::Connecting, "");
        self.relay
            .connection_state_change(CONNECTION_STRING, ConnectionState::Connected, "");
        // A breaking news program announced before the host has its EPGs.
        self.relay.epg_event_state_change(
            &PvrEpgTag {
                title: "Breaking News".to_string(),
                ..self.program(3, PROGRAMS_PER_CHANNEL)
            },
            3,
            EpgEventState::Created,
        );
    }

    fn program(&self, channel_uid: i32, n: i64) -> PvrEpgTag {
        let start_time = self.epoch + n * PROGRAM_SECS;
        PvrEpgTag {
            unique_broadcast_id: (channel_uid as u32) * 1000 + n as u32 + 1,
            unique_channel_id: channel_uid,
            title: format!("Program #{}", n + 1),
            start_time,
            end_time: start_time + PROGRAM_SECS,
            series_number: -1,
            episode_number: -1,
            ..Default::default()
        }
    }

    fn wire_channel(uid: i32, name: &str, is_radio: bool) -> PvrChannel {
        PvrChannel {
            unique_id: uid,
            is_radio,
            channel_number: uid as u32,
            channel_name: name.to_string(),
            ..Default::default()
        }
    }

    fn group_names(radio: bool) -> &'static [&'static str] {
        if radio { RADIO_GROUPS } else { TV_GROUPS }
    }
}

impl PvrAddon for DemoAddon {
    fn api_version(&self) -> PvrResult<String> {
        Ok(API_VERSION.to_string())
    }

    fn capabilities(&self) -> PvrResult<Capabilities> {
        Ok(Capabilities {
            supports_epg: true,
            supports_tv: true,
            supports_radio: true,
            supports_recordings: true,
            supports_timers: true,
            supports_channel_groups: true,
            handles_input_stream: true,
            ..Default::default()
        })
    }

    fn backend_name(&self) -> PvrResult<String> {
        Ok("demo".to_string())
    }

    fn connection_string(&self) -> PvrResult<String> {
        Ok(CONNECTION_STRING.to_string())
    }

    fn backend_version(&self) -> PvrResult<String> {
        Ok(env!("CARGO_PKG_VERSION").to_string())
    }

    fn drive_space(&self) -> PvrResult<DriveSpace> {
        Ok(DriveSpace {
            total: 1 << 30,
            used: 1 << 20,
        })
    }

    fn channels_amount(&self) -> PvrResult<i32> {
        Ok(CHANNELS.len() as i32)
    }

    fn channels(&self, handle: &TransferHandle, radio: bool) -> PvrResult<()> {
        for &(uid, name, is_radio) in CHANNELS.iter().filter(|(_, _, is_radio)| *is_radio == radio) {
            self.relay
                .transfer_channel_entry(Some(handle), &Self::wire_channel(uid, name, is_radio));
        }
        Ok(())
    }

    fn channel_groups_amount(&self) -> PvrResult<i32> {
        Ok((Self::group_names(false).len() + Self::group_names(true).len()) as i32)
    }

    fn channel_groups(&self, handle: &TransferHandle, radio: bool) -> PvrResult<()> {
        for (position, name) in Self::group_names(radio).iter().enumerate() {
            self.relay.transfer_channel_group(
                Some(handle),
                &PvrChannelGroup {
                    group_name: name.to_string(),
                    is_radio: radio,
                    position: position as u32 + 1,
                },
            );
        }
        Ok(())
    }

    fn channel_group_members(
        &self,
        handle: &TransferHandle,
        group: &PvrChannelGroup,
    ) -> PvrResult<()> {
        let members = CHANNELS.iter().filter(|(_, name, is_radio)| match group.group_name.as_str() {
            "News" => name.ends_with("News"),
            _ => *is_radio == group.is_radio,
        });
        for &(uid, _, _) in members {
            self.relay.transfer_channel_group_member(
                Some(handle),
                &PvrChannelGroupMember {
                    group_name: group.group_name.clone(),
                    channel_unique_id: uid,
                    channel_number: uid as u32,
                    sub_channel_number: 0,
                },
            );
        }
        Ok(())
    }

    fn epg_for_channel(
        &self,
        handle: &TransferHandle,
        channel: &PvrChannel,
        start: i64,
        end: i64,
    ) -> PvrResult<()> {
        (0..PROGRAMS_PER_CHANNEL)
            .map(|n| self.program(channel.unique_id, n))
            .filter(|tag| tag.end_time > start && tag.start_time < end)
            .for_each(|tag| self.relay.transfer_epg_entry(Some(handle), &tag));
        Ok(())
    }

    fn set_epg_time_frame(&self, _days: i32) -> PvrResult<()> {
        Ok(())
    }

    fn recordings_amount(&self, deleted: bool) -> PvrResult<i32> {
        Ok(if deleted { 0 } else { 1 })
    }

    fn recordings(&self, handle: &TransferHandle, deleted: bool) -> PvrResult<()> {
        if deleted {
            return Ok(());
        }
        let program = self.program(1, 0);
        self.relay.transfer_recording_entry(
            Some(handle),
            &PvrRecording {
                recording_id: "demo-1".to_string(),
                title: program.title,
                series_number: -1,
                episode_number: -1,
                channel_name: CHANNELS[0].1.to_string(),
                recording_time: program.start_time - 24 * 60 * 60,
                duration: PROGRAM_SECS as i32,
                channel_uid: CHANNELS[0].0,
                channel_type: 1,
                ..Default::default()
            },
        );
        Ok(())
    }

    fn timers_amount(&self) -> PvrResult<i32> {
        Ok(1)
    }

    fn timers(&self, handle: &TransferHandle) -> PvrResult<()> {
        let program = self.program(2, 1);
        self.relay.transfer_timer_entry(
            Some(handle),
            &PvrTimer {
                client_index: 1,
                client_channel_uid: 2,
                start_time: program.start_time,
                end_time: program.end_time,
                state: TimerState::Scheduled,
                timer_type: 1,
                title: program.title,
                epg_uid: program.unique_broadcast_id,
                ..Default::default()
            },
        );
        Ok(())
    }

    fn open_live_stream(&self, _channel: &PvrChannel) -> PvrResult<()> {
        Ok(())
    }

    fn read_live_stream(&self, buf: &mut [u8]) -> PvrResult<usize> {
        // null TS packets
        for packet in buf.chunks_mut(188) {
            packet.fill(0xFF);
            packet[0] = 0x47;
            if packet.len() >= 3 {
                packet[1] = 0x1F;
                packet[2] = 0xFF;
            }
        }
        Ok(buf.len())
    }
}
