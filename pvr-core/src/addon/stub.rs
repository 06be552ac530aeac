// <coverage:exclude>
use std::collections::HashMap;
use std::collections::HashSet;

use parking_lot::Mutex;

use super::*;
use crate::models::TimerTypeAttributes;
use crate::negotiation::API_VERSION;

/// A scriptable addon recording every entry point it's called through.
pub(crate) struct StubAddon {
    pub(crate) api_version: Mutex<String>,
    pub(crate) capabilities: Mutex<Capabilities>,
    pub(crate) timer_types: Mutex<PvrResult<Vec<PvrTimerType>>>,
    pub(crate) channel_switch_delay: Mutex<u32>,
    pub(crate) channels: Mutex<Vec<PvrChannel>>,
    pub(crate) channel_groups: Mutex<Vec<PvrChannelGroup>>,
    pub(crate) channel_group_members: Mutex<Vec<PvrChannelGroupMember>>,
    pub(crate) recordings: Mutex<Vec<PvrRecording>>,
    pub(crate) timers: Mutex<Vec<PvrTimer>>,
    pub(crate) epg: Mutex<Vec<PvrEpgTag>>,
    pub(crate) relay: Mutex<Option<Arc<EventRelay>>>,
    log: Mutex<Vec<&'static str>>,
    errors: Mutex<HashMap<&'static str, PvrError>>,
    panics: Mutex<HashSet<&'static str>>,
}

impl Default for StubAddon {
    fn default() -> Self {
        StubAddon {
            api_version: Mutex::new(API_VERSION.to_string()),
            capabilities: Mutex::new(Capabilities {
                supports_epg: true,
                supports_tv: true,
                supports_radio: true,
                supports_recordings: true,
                supports_recordings_undelete: true,
                supports_timers: true,
                supports_channel_groups: true,
                supports_channel_scan: true,
                supports_channel_settings: true,
                handles_input_stream: true,
                handles_demuxing: true,
                supports_recording_play_count: true,
                supports_last_played_position: true,
                supports_recording_edl: true,
                supports_recordings_rename: true,
                supports_recordings_lifetime_change: true,
                supports_descramble_info: true,
            }),
            timer_types: Mutex::new(Ok(vec![
                PvrTimerType {
                    id: 1,
                    attributes: TimerTypeAttributes::IS_MANUAL.bits(),
                    description: "Manual".to_string(),
                    ..Default::default()
                },
                PvrTimerType {
                    id: 2,
                    attributes: (TimerTypeAttributes::IS_MANUAL
                        | TimerTypeAttributes::IS_REPEATING)
                        .bits(),
                    ..Default::default()
                },
            ])),
            channel_switch_delay: Mutex::new(0),
            channels: Default::default(),
            channel_groups: Default::default(),
            channel_group_members: Default::default(),
            recordings: Default::default(),
            timers: Default::default(),
            epg: Default::default(),
            relay: Default::default(),
            log: Default::default(),
            errors: Default::default(),
            panics: Default::default(),
        }
    }
}

impl StubAddon {
    pub(crate) fn fail_on(&self, func: &'static str, err: PvrError) {
        self.errors.lock().insert(func, err);
    }

    pub(crate) fn panic_on(&self, func: &'static str) {
        self.panics.lock().insert(func);
    }

    pub(crate) fn calls(&self, func: &str) -> usize {
        self.log.lock().iter().filter(|name| **name == func).count()
    }

    /// Entry points called so far, oldest first.
    pub(crate) fn log(&self) -> Vec<&'static str> {
        self.log.lock().clone()
    }

    pub(crate) fn clear_log(&self) {
        self.log.lock().clear();
    }

    fn enter(&self, func: &'static str) -> PvrResult<()> {
        self.log.lock().push(func);
        if self.panics.lock().contains(func) {
            panic!("{} panicked", func);
        }
        match self.errors.lock().get(func) {
            Some(err) => Err(*err),
            None => Ok(()),
        }
    }

    fn relay(&self) -> Arc<EventRelay> {
        self.relay.lock().clone().expect("relay")
    }
}

impl PvrAddon for StubAddon {
    fn api_version(&self) -> PvrResult<String> {
        self.enter("api_version")?;
        Ok(self.api_version.lock().clone())
    }

    fn capabilities(&self) -> PvrResult<Capabilities> {
        self.enter("capabilities")?;
        Ok(self.capabilities.lock().clone())
    }

    fn backend_name(&self) -> PvrResult<String> {
        self.enter("backend_name")?;
        Ok("stub".to_string())
    }

    fn connection_string(&self) -> PvrResult<String> {
        self.enter("connection_string")?;
        Ok("stub:0".to_string())
    }

    fn backend_version(&self) -> PvrResult<String> {
        self.enter("backend_version")?;
        Ok("1.0".to_string())
    }

    fn backend_hostname(&self) -> PvrResult<String> {
        self.enter("backend_hostname")?;
        Ok("localhost".to_string())
    }

    fn timer_types(&self, _max: usize) -> PvrResult<Vec<PvrTimerType>> {
        self.enter("timer_types")?;
        self.timer_types.lock().clone()
    }

    fn channel_switch_delay(&self) -> u32 {
        let _ = self.enter("channel_switch_delay");
        *self.channel_switch_delay.lock()
    }

    fn drive_space(&self) -> PvrResult<DriveSpace> {
        self.enter("drive_space")?;
        Ok(DriveSpace {
            total: 1024,
            used: 256,
        })
    }

    fn call_menu_hook(&self, _hook: &PvrMenuHook, _data: &PvrMenuHookData) -> PvrResult<()> {
        self.enter("call_menu_hook")
    }

    fn open_dialog_channel_scan(&self) -> PvrResult<()> {
        self.enter("open_dialog_channel_scan")
    }

    fn open_dialog_channel_settings(&self, _channel: &PvrChannel) -> PvrResult<()> {
        self.enter("open_dialog_channel_settings")
    }

    fn delete_channel(&self, _channel: &PvrChannel) -> PvrResult<()> {
        self.enter("delete_channel")
    }

    fn channels_amount(&self) -> PvrResult<i32> {
        self.enter("channels_amount")?;
        Ok(self.channels.lock().len() as i32)
    }

    fn channels(&self, handle: &TransferHandle, radio: bool) -> PvrResult<()> {
        self.enter("channels")?;
        let relay = self.relay();
        for channel in self.channels.lock().iter().filter(|c| c.is_radio == radio) {
            relay.transfer_channel_entry(Some(handle), channel);
        }
        Ok(())
    }

    fn channel_groups_amount(&self) -> PvrResult<i32> {
        self.enter("channel_groups_amount")?;
        Ok(self.channel_groups.lock().len() as i32)
    }

    fn channel_groups(&self, handle: &TransferHandle, radio: bool) -> PvrResult<()> {
        self.enter("channel_groups")?;
        let relay = self.relay();
        for group in self.channel_groups.lock().iter().filter(|g| g.is_radio == radio) {
            relay.transfer_channel_group(Some(handle), group);
        }
        Ok(())
    }

    fn channel_group_members(
        &self,
        handle: &TransferHandle,
        group: &PvrChannelGroup,
    ) -> PvrResult<()> {
        self.enter("channel_group_members")?;
        let relay = self.relay();
        for member in self
            .channel_group_members
            .lock()
            .iter()
            .filter(|m| m.group_name == group.group_name)
        {
            relay.transfer_channel_group_member(Some(handle), member);
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
        self.enter("epg_for_channel")?;
        let relay = self.relay();
        for tag in self.epg.lock().iter().filter(|tag| {
            tag.unique_channel_id == channel.unique_id && tag.end_time > start && tag.start_time < end
        }) {
            relay.transfer_epg_entry(Some(handle), tag);
        }
        Ok(())
    }

    fn set_epg_time_frame(&self, _days: i32) -> PvrResult<()> {
        self.enter("set_epg_time_frame")
    }

    fn recordings_amount(&self, deleted: bool) -> PvrResult<i32> {
        self.enter("recordings_amount")?;
        Ok(self
            .recordings
            .lock()
            .iter()
            .filter(|r| r.is_deleted == deleted)
            .count() as i32)
    }

    fn recordings(&self, handle: &TransferHandle, deleted: bool) -> PvrResult<()> {
        self.enter("recordings")?;
        let relay = self.relay();
        for recording in self.recordings.lock().iter().filter(|r| r.is_deleted == deleted) {
            relay.transfer_recording_entry(Some(handle), recording);
        }
        Ok(())
    }

    fn delete_recording(&self, _recording: &PvrRecording) -> PvrResult<()> {
        self.enter("delete_recording")
    }

    fn undelete_recording(&self, _recording: &PvrRecording) -> PvrResult<()> {
        self.enter("undelete_recording")
    }

    fn rename_recording(&self, _recording: &PvrRecording) -> PvrResult<()> {
        self.enter("rename_recording")
    }

    fn set_recording_play_count(&self, _recording: &PvrRecording, _count: i32) -> PvrResult<()> {
        self.enter("set_recording_play_count")
    }

    fn recording_last_played_position(&self, _recording: &PvrRecording) -> PvrResult<i32> {
        self.enter("recording_last_played_position")?;
        Ok(42)
    }

    fn recording_edl(&self, _recording: &PvrRecording) -> PvrResult<Vec<PvrEdlEntry>> {
        self.enter("recording_edl")?;
        Ok(vec![])
    }

    fn timers_amount(&self) -> PvrResult<i32> {
        self.enter("timers_amount")?;
        Ok(self.timers.lock().len() as i32)
    }

    fn timers(&self, handle: &TransferHandle) -> PvrResult<()> {
        self.enter("timers")?;
        let relay = self.relay();
        for timer in self.timers.lock().iter() {
            relay.transfer_timer_entry(Some(handle), timer);
        }
        Ok(())
    }

    fn add_timer(&self, timer: &PvrTimer) -> PvrResult<()> {
        self.enter("add_timer")?;
        self.timers.lock().push(timer.clone());
        Ok(())
    }

    fn delete_timer(&self, timer: &PvrTimer, _force: bool) -> PvrResult<()> {
        self.enter("delete_timer")?;
        self.timers
            .lock()
            .retain(|t| t.client_index != timer.client_index);
        Ok(())
    }

    fn update_timer(&self, timer: &PvrTimer) -> PvrResult<()> {
        self.enter("update_timer")?;
        let mut timers = self.timers.lock();
        match timers.iter_mut().find(|t| t.client_index == timer.client_index) {
            Some(t) => {
                *t = timer.clone();
                Ok(())
            }
            None => Err(PvrError::InvalidParameters),
        }
    }

    fn open_live_stream(&self, _channel: &PvrChannel) -> PvrResult<()> {
        self.enter("open_live_stream")
    }

    fn close_live_stream(&self) -> PvrResult<()> {
        self.enter("close_live_stream")
    }

    fn switch_channel(&self, _channel: &PvrChannel) -> PvrResult<()> {
        self.enter("switch_channel")
    }

    fn read_live_stream(&self, buf: &mut [u8]) -> PvrResult<usize> {
        self.enter("read_live_stream")?;
        buf.fill(0x47);
        Ok(buf.len())
    }

    fn signal_status(&self) -> PvrResult<SignalStatus> {
        self.enter("signal_status")?;
        Ok(Default::default())
    }

    fn descramble_info(&self) -> PvrResult<DescrambleInfo> {
        self.enter("descramble_info")?;
        Ok(Default::default())
    }

    fn open_recorded_stream(&self, _recording: &PvrRecording) -> PvrResult<()> {
        self.enter("open_recorded_stream")
    }

    fn close_recorded_stream(&self) -> PvrResult<()> {
        self.enter("close_recorded_stream")
    }

    fn read_recorded_stream(&self, buf: &mut [u8]) -> PvrResult<usize> {
        self.enter("read_recorded_stream")?;
        Ok(buf.len() / 2)
    }

    fn demux_read(&self) -> PvrResult<Option<DemuxPacket>> {
        self.enter("demux_read")?;
        Ok(None)
    }

    fn demux_flush(&self) -> PvrResult<()> {
        self.enter("demux_flush")
    }

    fn can_pause_stream(&self) -> PvrResult<bool> {
        self.enter("can_pause_stream")?;
        Ok(true)
    }

    fn pause_stream(&self, _paused: bool) -> PvrResult<()> {
        self.enter("pause_stream")
    }

    fn on_system_sleep(&self) -> PvrResult<()> {
        self.enter("on_system_sleep")
    }
}

/// Hands out one [`StubAddon`] and counts instance lifecycle calls.
pub(crate) struct StubAddonHost {
    pub(crate) addon: Arc<StubAddon>,
    pub(crate) status: Mutex<Option<AddonStatus>>,
    pub(crate) created: Mutex<usize>,
    pub(crate) destroyed: Mutex<usize>,
}

impl StubAddonHost {
    pub(crate) fn new(addon: Arc<StubAddon>) -> Arc<Self> {
        Arc::new(StubAddonHost {
            addon,
            status: Default::default(),
            created: Default::default(),
            destroyed: Default::default(),
        })
    }

    pub(crate) fn created(&self) -> usize {
        *self.created.lock()
    }

    pub(crate) fn destroyed(&self) -> usize {
        *self.destroyed.lock()
    }
}

impl AddonHost for StubAddonHost {
    fn create_instance(
        &self,
        kind: InstanceType,
        _addon: &AddonInfo,
        relay: Arc<EventRelay>,
    ) -> Result<Arc<dyn PvrAddon>, AddonStatus> {
        assert_eq!(kind, InstanceType::Pvr);
        if let Some(status) = *self.status.lock() {
            return Err(status);
        }
        *self.addon.relay.lock() = Some(relay);
        *self.created.lock() += 1;
        Ok(self.addon.clone())
    }

    fn destroy_instance(&self, kind: InstanceType, _addon: &AddonInfo, _instance: Arc<dyn PvrAddon>) {
        assert_eq!(kind, InstanceType::Pvr);
        *self.addon.relay.lock() = None;
        *self.destroyed.lock() += 1;
    }
}
