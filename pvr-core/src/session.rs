//! A session with one PVR backend addon.
//!
//! A [`ClientSession`] creates the addon instance, negotiates its
//! properties, tracks the connection state reported by the backend and
//! forwards host requests to the addon.  Requests are synchronous and block
//! the calling thread while the addon works.
//!
//! Every request is guarded in this order:
//!
//! 1. the session must be ready, otherwise [`Error::NotReady`],
//! 2. the backend must declare the capability the request needs, otherwise
//!    [`Error::NotImplemented`],
//! 3. the addon is called through [`boundary::invoke`].
//!
//! Addon code is never reached when one of the first two checks fails.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicI32;
use std::sync::atomic::Ordering;
use std::time::Duration;

use chrono::DateTime;
use chrono::Utc;
use parking_lot::Mutex;
use parking_lot::RwLock;

use crate::addon::AddonInfo;
use crate::addon::InstanceType;
use crate::addon::PvrAddon;
use crate::addon::boundary;
use crate::addon::types::*;
use crate::config::Config;
use crate::convert::Converter;
use crate::error::Error;
use crate::host::*;
use crate::models::*;
use crate::negotiation;
use crate::negotiation::ClientProperties;
use crate::relay::Destination;
use crate::relay::EventRelay;
use crate::relay::TransferHandle;

pub struct ClientSession {
    info: AddonInfo,
    config: Arc<Config>,
    services: HostServices,
    relay: Arc<EventRelay>,
    client_id: AtomicI32,
    ready: AtomicBool,
    state: Mutex<SessionState>,
    instance: RwLock<Option<Arc<dyn PvrAddon>>>,
    props: RwLock<Arc<ClientProperties>>,
    menu_hooks: Mutex<Vec<MenuHook>>,
}

#[derive(Default)]
struct SessionState {
    connection_state: ConnectionState,
    previous_connection_state: ConnectionState,
    ignore: bool,
    playing: Playing,
}

/// The stream currently open, at most one per session.
#[derive(Clone, Debug, Default)]
enum Playing {
    #[default]
    Nothing,
    Live(Arc<Channel>),
    Recording(Arc<Recording>),
}

#[derive(Clone, Copy)]
enum StreamKind {
    Live,
    Recorded,
}

fn always(_: &Capabilities) -> bool {
    true
}

impl ClientSession {
    pub fn new(info: AddonInfo, config: Arc<Config>, services: HostServices) -> Arc<Self> {
        Arc::new_cyclic(|session| ClientSession {
            relay: Arc::new(EventRelay::new(session.clone(), services.clone())),
            info,
            config,
            services,
            client_id: AtomicI32::new(ClientId::INVALID.value()),
            ready: AtomicBool::new(false),
            state: Default::default(),
            instance: Default::default(),
            props: Default::default(),
            menu_hooks: Default::default(),
        })
    }

    // lifecycle

    /// Creates the addon instance and negotiates its properties.
    ///
    /// A ready session is destroyed first.  On failure the session is left
    /// non-ready; faults raised by the addon are reported as errors.
    pub fn create(&self, client_id: ClientId) -> Result<(), Error> {
        if !client_id.is_valid() {
            tracing::error!(addon.id = %self.info.id, %client_id, "Invalid client id");
            return Err(Error::InvalidClientId(client_id.value()));
        }

        if self.is_ready() {
            self.destroy();
        }
        self.reset(client_id);

        tracing::debug!(addon.id = %self.info.id, %client_id, "Creating PVR instance...");
        let addon = boundary::invoke(&self.info, "create_instance", || {
            self.services
                .addon_host
                .create_instance(InstanceType::Pvr, &self.info, self.relay.clone())
        })
        .inspect_err(|err| {
            tracing::error!(
                %err,
                addon.id = %self.info.id,
                addon.author = %self.info.author,
                %client_id,
                "Failed to create PVR instance",
            );
        })?;

        let result = negotiation::negotiate(
            &self.info,
            addon.as_ref(),
            &self.converter(),
            self.config.pvr.max_timer_types,
        );
        match result {
            Ok(props) => {
                *self.props.write() = Arc::new(props);
                *self.instance.write() = Some(addon);
                self.ready.store(true, Ordering::SeqCst);
                tracing::info!(
                    addon.id = %self.info.id,
                    %client_id,
                    friendly_name = %self.friendly_name(),
                    "Created",
                );
                Ok(())
            }
            Err(err) => {
                tracing::error!(
                    %err,
                    addon.id = %self.info.id,
                    addon.author = %self.info.author,
                    %client_id,
                    "Failed to negotiate with the addon",
                );
                self.destroy_instance(addon);
                self.reset(client_id);
                Err(err)
            }
        }
    }

    /// Destroys the addon instance.  Does nothing unless the session is ready.
    pub fn destroy(&self) {
        if !self.ready.swap(false, Ordering::SeqCst) {
            return;
        }
        let instance = self.instance.write().take();
        if let Some(addon) = instance {
            self.destroy_instance(addon);
        }
        self.reset(self.client_id());
        tracing::info!(addon.id = %self.info.id, client_id = %self.client_id(), "Destroyed");
    }

    fn destroy_instance(&self, addon: Arc<dyn PvrAddon>) {
        let _ = boundary::invoke(&self.info, "destroy_instance", || {
            self.services
                .addon_host
                .destroy_instance(InstanceType::Pvr, &self.info, addon);
            Ok::<_, Error>(())
        });
    }

    fn reset(&self, client_id: ClientId) {
        self.client_id.store(client_id.value(), Ordering::SeqCst);
        *self.state.lock() = Default::default();
        self.menu_hooks.lock().clear();
        *self.props.write() = Default::default();
    }

    // accessors

    pub fn addon(&self) -> &AddonInfo {
        &self.info
    }

    pub fn relay(&self) -> Arc<EventRelay> {
        self.relay.clone()
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id.load(Ordering::SeqCst).into()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state.lock().connection_state
    }

    pub fn previous_connection_state(&self) -> ConnectionState {
        self.state.lock().previous_connection_state
    }

    /// Whether aggregate operations should skip this client for now.
    pub fn ignore_client(&self) -> bool {
        self.state.lock().ignore
    }

    pub fn properties(&self) -> Arc<ClientProperties> {
        self.props.read().clone()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.props.read().capabilities.clone()
    }

    pub fn timer_types(&self) -> Vec<Arc<TimerType>> {
        self.props.read().timer_types.clone()
    }

    pub fn backend_name(&self) -> String {
        self.props.read().backend_name.clone()
    }

    pub fn connection_string(&self) -> String {
        self.props.read().connection_string.clone()
    }

    pub fn friendly_name(&self) -> String {
        self.props.read().friendly_name.clone()
    }

    pub fn backend_version(&self) -> String {
        self.props.read().backend_version.clone()
    }

    pub fn backend_hostname(&self) -> String {
        self.props.read().backend_hostname.clone()
    }

    pub fn menu_hooks(&self) -> Vec<MenuHook> {
        self.menu_hooks.lock().clone()
    }

    pub fn menu_hooks_for(&self, category: MenuHookCategory) -> Vec<MenuHook> {
        self.menu_hooks
            .lock()
            .iter()
            .filter(|hook| hook.matches(category))
            .cloned()
            .collect()
    }

    pub fn is_playing(&self) -> bool {
        !matches!(self.state.lock().playing, Playing::Nothing)
    }

    pub fn is_playing_live_stream(&self) -> bool {
        matches!(self.state.lock().playing, Playing::Live(_))
    }

    pub fn is_playing_recording(&self) -> bool {
        matches!(self.state.lock().playing, Playing::Recording(_))
    }

    pub fn playing_channel(&self) -> Option<Arc<Channel>> {
        match self.state.lock().playing {
            Playing::Live(ref channel) => Some(channel.clone()),
            _ => None,
        }
    }

    pub fn playing_recording(&self) -> Option<Arc<Recording>> {
        match self.state.lock().playing {
            Playing::Recording(ref recording) => Some(recording.clone()),
            _ => None,
        }
    }

    pub fn can_play_channel(&self, channel: &Channel) -> bool {
        self.is_ready() && Self::supports_channel(&self.props.read().capabilities, channel)
    }

    fn supports_channel(caps: &Capabilities, channel: &Channel) -> bool {
        if channel.is_radio {
            caps.supports_radio
        } else {
            caps.supports_tv
        }
    }

    pub(crate) fn converter(&self) -> Converter {
        Converter::new(self.client_id(), self.config.pvr.time_correction())
    }

    // state changes coming through the relay

    /// Returns `false` if the backend reported the current state again.
    pub(crate) fn update_connection_state(&self, state: ConnectionState) -> bool {
        let mut guard = self.state.lock();
        if guard.connection_state == state {
            return false;
        }
        guard.previous_connection_state = guard.connection_state;
        guard.connection_state = state;
        match state {
            ConnectionState::Connected => guard.ignore = false,
            ConnectionState::Connecting
                if guard.previous_connection_state == ConnectionState::Unknown =>
            {
                guard.ignore = true
            }
            _ => (),
        }
        true
    }

    pub(crate) fn add_menu_hook(&self, hook: MenuHook) {
        self.menu_hooks.lock().push(hook);
    }

    // guards

    fn guard<P>(&self, supported: P) -> Result<Arc<dyn PvrAddon>, Error>
    where
        P: FnOnce(&Capabilities) -> bool,
    {
        if !self.is_ready() {
            return Err(Error::NotReady);
        }
        if !supported(&self.props.read().capabilities) {
            return Err(Error::NotImplemented);
        }
        self.instance.read().clone().ok_or(Error::NotReady)
    }

    fn call<T, P, F>(&self, func: &'static str, supported: P, f: F) -> Result<T, Error>
    where
        P: FnOnce(&Capabilities) -> bool,
        F: FnOnce(&dyn PvrAddon, &Converter) -> PvrResult<T>,
    {
        let addon = self.guard(supported)?;
        let converter = self.converter();
        boundary::invoke(&self.info, func, || f(addon.as_ref(), &converter))
    }

    /// Like `call`, for operations on the stream currently open.
    fn call_stream<T, P, F>(&self, func: &'static str, supported: P, f: F) -> Result<T, Error>
    where
        P: FnOnce(&Capabilities) -> bool,
        F: FnOnce(&dyn PvrAddon, StreamKind) -> PvrResult<T>,
    {
        let addon = self.guard(supported)?;
        let kind = match self.state.lock().playing {
            Playing::Nothing => return Err(Error::NotPlaying),
            Playing::Live(_) => StreamKind::Live,
            Playing::Recording(_) => StreamKind::Recorded,
        };
        boundary::invoke(&self.info, func, || f(addon.as_ref(), kind))
    }

    fn transfer_handle(&self, destination: Destination, tag: i32) -> TransferHandle {
        TransferHandle {
            caller: self.client_id(),
            destination,
            tag,
        }
    }

    // properties

    pub fn drive_space(&self) -> Result<DriveSpace, Error> {
        self.call("drive_space", always, |addon, _| addon.drive_space())
    }

    pub fn call_menu_hook(&self, hook: &MenuHook, data: &MenuHookData) -> Result<(), Error> {
        let addon = self.guard(always)?;
        if !self.menu_hooks.lock().contains(hook) {
            return Err(Error::MenuHookNotFound);
        }
        let converter = self.converter();
        boundary::invoke(&self.info, "call_menu_hook", || {
            addon.call_menu_hook(
                &converter.wire_menu_hook(hook),
                &converter.wire_menu_hook_data(data),
            )
        })
    }

    // channels

    pub fn start_channel_scan(&self) -> Result<(), Error> {
        self.call(
            "open_dialog_channel_scan",
            |caps| caps.supports_channel_scan,
            |addon, _| addon.open_dialog_channel_scan(),
        )
    }

    pub fn open_dialog_channel_add(&self, channel: &Channel) -> Result<(), Error> {
        self.call(
            "open_dialog_channel_add",
            |caps| caps.supports_channel_settings,
            |addon, conv| addon.open_dialog_channel_add(&conv.wire_channel(channel)),
        )
    }

    pub fn open_dialog_channel_settings(&self, channel: &Channel) -> Result<(), Error> {
        self.call(
            "open_dialog_channel_settings",
            |caps| caps.supports_channel_settings,
            |addon, conv| addon.open_dialog_channel_settings(&conv.wire_channel(channel)),
        )
    }

    pub fn delete_channel(&self, channel: &Channel) -> Result<(), Error> {
        self.call(
            "delete_channel",
            |caps| caps.supports_channel_settings,
            |addon, conv| addon.delete_channel(&conv.wire_channel(channel)),
        )
    }

    pub fn rename_channel(&self, channel: &Channel) -> Result<(), Error> {
        self.call(
            "rename_channel",
            |caps| caps.supports_channel_settings,
            |addon, conv| addon.rename_channel(&conv.wire_channel(channel)),
        )
    }

    pub fn get_channels_amount(&self) -> Result<i32, Error> {
        self.call(
            "channels_amount",
            |caps| caps.supports_tv || caps.supports_radio,
            |addon, _| addon.channels_amount(),
        )
    }

    pub fn get_channels(
        &self,
        radio: bool,
        container: Arc<dyn ChannelsContainer>,
    ) -> Result<(), Error> {
        let handle = self.transfer_handle(Destination::Channels(container), 0);
        self.call(
            "channels",
            |caps| if radio { caps.supports_radio } else { caps.supports_tv },
            |addon, _| addon.channels(&handle, radio),
        )
    }

    pub fn get_channel_groups_amount(&self) -> Result<i32, Error> {
        self.call(
            "channel_groups_amount",
            |caps| caps.supports_channel_groups,
            |addon, _| addon.channel_groups_amount(),
        )
    }

    pub fn get_channel_groups(
        &self,
        radio: bool,
        container: Arc<dyn ChannelGroupsContainer>,
    ) -> Result<(), Error> {
        let handle = self.transfer_handle(Destination::ChannelGroups(container), 0);
        self.call(
            "channel_groups",
            |caps| caps.supports_channel_groups,
            |addon, _| addon.channel_groups(&handle, radio),
        )
    }

    pub fn get_channel_group_members(
        &self,
        group: Arc<dyn ChannelGroupContainer>,
    ) -> Result<(), Error> {
        let wire_group = self.converter().wire_channel_group(&group.group());
        let handle = self.transfer_handle(Destination::ChannelGroupMembers(group), 0);
        self.call(
            "channel_group_members",
            |caps| caps.supports_channel_groups,
            |addon, _| addon.channel_group_members(&handle, &wire_group),
        )
    }

    // epg

    pub fn get_epg_for_channel(
        &self,
        channel: &Channel,
        epg: Arc<dyn ChannelEpg>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(), Error> {
        let handle = self.transfer_handle(Destination::Epg(epg), channel.uid.value());
        self.call(
            "epg_for_channel",
            |caps| caps.supports_epg && Self::supports_channel(caps, channel),
            |addon, conv| {
                addon.epg_for_channel(
                    &handle,
                    &conv.wire_channel(channel),
                    conv.wire_time(start),
                    conv.wire_time(end),
                )
            },
        )
    }

    pub fn set_epg_time_frame(&self, days: i32) -> Result<(), Error> {
        self.call(
            "set_epg_time_frame",
            |caps| caps.supports_epg,
            |addon, _| addon.set_epg_time_frame(days),
        )
    }

    // recordings

    fn supports_recordings(caps: &Capabilities, deleted: bool) -> bool {
        caps.supports_recordings && (!deleted || caps.supports_recordings_undelete)
    }

    pub fn get_recordings_amount(&self, deleted: bool) -> Result<i32, Error> {
        self.call(
            "recordings_amount",
            |caps| Self::supports_recordings(caps, deleted),
            |addon, _| addon.recordings_amount(deleted),
        )
    }

    pub fn get_recordings(
        &self,
        deleted: bool,
        container: Arc<dyn RecordingsContainer>,
    ) -> Result<(), Error> {
        let handle = self.transfer_handle(Destination::Recordings(container), 0);
        self.call(
            "recordings",
            |caps| Self::supports_recordings(caps, deleted),
            |addon, _| addon.recordings(&handle, deleted),
        )
    }

    pub fn delete_recording(&self, recording: &Recording) -> Result<(), Error> {
        self.call(
            "delete_recording",
            |caps| caps.supports_recordings,
            |addon, conv| addon.delete_recording(&conv.wire_recording(recording)),
        )
    }

    pub fn undelete_recording(&self, recording: &Recording) -> Result<(), Error> {
        self.call(
            "undelete_recording",
            |caps| caps.supports_recordings_undelete,
            |addon, conv| addon.undelete_recording(&conv.wire_recording(recording)),
        )
    }

    pub fn delete_all_recordings_from_trash(&self) -> Result<(), Error> {
        self.call(
            "delete_all_recordings_from_trash",
            |caps| caps.supports_recordings_undelete,
            |addon, _| addon.delete_all_recordings_from_trash(),
        )
    }

    pub fn rename_recording(&self, recording: &Recording) -> Result<(), Error> {
        self.call(
            "rename_recording",
            |caps| caps.supports_recordings_rename,
            |addon, conv| addon.rename_recording(&conv.wire_recording(recording)),
        )
    }

    pub fn set_recording_lifetime(&self, recording: &Recording) -> Result<(), Error> {
        self.call(
            "set_recording_lifetime",
            |caps| caps.supports_recordings_lifetime_change,
            |addon, conv| addon.set_recording_lifetime(&conv.wire_recording(recording)),
        )
    }

    pub fn set_recording_play_count(&self, recording: &Recording, count: i32) -> Result<(), Error> {
        self.call(
            "set_recording_play_count",
            |caps| caps.supports_recording_play_count,
            |addon, conv| addon.set_recording_play_count(&conv.wire_recording(recording), count),
        )
    }

    pub fn set_recording_last_played_position(
        &self,
        recording: &Recording,
        position: i32,
    ) -> Result<(), Error> {
        self.call(
            "set_recording_last_played_position",
            |caps| caps.supports_last_played_position,
            |addon, conv| {
                addon.set_recording_last_played_position(&conv.wire_recording(recording), position)
            },
        )
    }

    pub fn get_recording_last_played_position(&self, recording: &Recording) -> Result<i32, Error> {
        self.call(
            "recording_last_played_position",
            |caps| caps.supports_last_played_position,
            |addon, conv| addon.recording_last_played_position(&conv.wire_recording(recording)),
        )
    }

    pub fn get_recording_edl(&self, recording: &Recording) -> Result<Vec<EdlEntry>, Error> {
        let entries = self.call(
            "recording_edl",
            |caps| caps.supports_recording_edl,
            |addon, conv| addon.recording_edl(&conv.wire_recording(recording)),
        )?;
        let converter = self.converter();
        Ok(entries
            .iter()
            .map(|entry| converter.edl_entry(entry))
            .collect())
    }

    // timers

    pub fn get_timers_amount(&self) -> Result<i32, Error> {
        self.call(
            "timers_amount",
            |caps| caps.supports_timers,
            |addon, _| addon.timers_amount(),
        )
    }

    pub fn get_timers(&self, container: Arc<dyn TimersContainer>) -> Result<(), Error> {
        let handle = self.transfer_handle(Destination::Timers(container), 0);
        self.call(
            "timers",
            |caps| caps.supports_timers,
            |addon, _| addon.timers(&handle),
        )
    }

    pub fn add_timer(&self, timer: &Timer) -> Result<(), Error> {
        self.call(
            "add_timer",
            |caps| caps.supports_timers,
            |addon, conv| addon.add_timer(&conv.wire_timer(timer)),
        )
    }

    pub fn delete_timer(&self, timer: &Timer, force: bool) -> Result<(), Error> {
        self.call(
            "delete_timer",
            |caps| caps.supports_timers,
            |addon, conv| addon.delete_timer(&conv.wire_timer(timer), force),
        )
    }

    pub fn rename_timer(&self, timer: &Timer, new_name: &str) -> Result<(), Error> {
        self.call(
            "update_timer",
            |caps| caps.supports_timers,
            |addon, conv| {
                let mut wire = conv.wire_timer(timer);
                wire.title = new_name.to_string();
                addon.update_timer(&wire)
            },
        )
    }

    pub fn update_timer(&self, timer: &Timer) -> Result<(), Error> {
        self.call(
            "update_timer",
            |caps| caps.supports_timers,
            |addon, conv| addon.update_timer(&conv.wire_timer(timer)),
        )
    }

    // streams

    /// Opens a live stream of `channel`, closing the stream currently open.
    pub fn open_live_stream(&self, channel: Arc<Channel>) -> Result<(), Error> {
        self.close_stream()?;

        if !self.is_ready() {
            return Err(Error::NotReady);
        }
        if !self.can_play_channel(&channel) {
            tracing::error!(
                addon.id = %self.info.id,
                channel.uid = %channel.uid,
                channel.is_radio = channel.is_radio,
                "Cannot play the channel",
            );
            return Err(Error::ChannelNotPlayable);
        }

        if channel.has_stream_url() {
            // The host opens the stream by itself.
            self.wait_for_channel_switch()?;
        } else {
            self.call("open_live_stream", always, |addon, conv| {
                addon.open_live_stream(&conv.wire_channel(&channel))
            })?;
        }

        tracing::debug!(addon.id = %self.info.id, channel.uid = %channel.uid, "Opened live stream");
        self.state.lock().playing = Playing::Live(channel);
        Ok(())
    }

    fn wait_for_channel_switch(&self) -> Result<(), Error> {
        let min = &self.config.pvr.channel_switch_delay_min_api_version;
        if self.properties().api_version < *min {
            return Ok(());
        }
        let delay = self.call("channel_switch_delay", always, |addon, _| {
            Ok(addon.channel_switch_delay())
        })?;
        if delay > 0 {
            tracing::debug!(addon.id = %self.info.id, delay, "Waiting for the channel switch");
            std::thread::sleep(Duration::from_millis(delay as u64));
        }
        Ok(())
    }

    /// Opens a stream of `recording`, closing the stream currently open.
    pub fn open_recorded_stream(&self, recording: Arc<Recording>) -> Result<(), Error> {
        self.close_stream()?;
        self.call(
            "open_recorded_stream",
            |caps| caps.supports_recordings,
            |addon, conv| addon.open_recorded_stream(&conv.wire_recording(&recording)),
        )?;
        tracing::debug!(
            addon.id = %self.info.id,
            recording.id = %recording.recording_id,
            "Opened recorded stream",
        );
        self.state.lock().playing = Playing::Recording(recording);
        Ok(())
    }

    /// Closes the stream currently open, if any.
    ///
    /// The playing state is cleared even if the addon fails to close it.
    pub fn close_stream(&self) -> Result<(), Error> {
        let playing = std::mem::take(&mut self.state.lock().playing);
        match playing {
            Playing::Nothing => Ok(()),
            Playing::Live(_) => {
                self.call("close_live_stream", always, |addon, _| addon.close_live_stream())
            }
            Playing::Recording(_) => self.call("close_recorded_stream", always, |addon, _| {
                addon.close_recorded_stream()
            }),
        }
    }

    pub fn switch_channel(&self, channel: Arc<Channel>) -> Result<(), Error> {
        if !self.is_ready() {
            return Err(Error::NotReady);
        }
        if !self.is_playing_live_stream() {
            return Err(Error::NotPlaying);
        }
        if !self.can_play_channel(&channel) {
            return Err(Error::ChannelNotPlayable);
        }
        let result = self.call("switch_channel", always, |addon, conv| {
            addon.switch_channel(&conv.wire_channel(&channel))
        });
        match result {
            Ok(()) => {
                self.state.lock().playing = Playing::Live(channel);
                Ok(())
            }
            Err(Error::NotImplemented) => self.open_live_stream(channel),
            Err(err) => Err(err),
        }
    }

    pub fn read_stream(&self, buf: &mut [u8]) -> Result<usize, Error> {
        self.call_stream(
            "read_stream",
            |caps| caps.handles_input_stream,
            |addon, kind| match kind {
                StreamKind::Live => addon.read_live_stream(buf),
                StreamKind::Recorded => addon.read_recorded_stream(buf),
            },
        )
    }

    pub fn seek_stream(&self, position: i64, whence: SeekWhence) -> Result<i64, Error> {
        self.call_stream(
            "seek_stream",
            |caps| caps.handles_input_stream,
            |addon, kind| match kind {
                StreamKind::Live => addon.seek_live_stream(position, whence),
                StreamKind::Recorded => addon.seek_recorded_stream(position, whence),
            },
        )
    }

    pub fn position_stream(&self) -> Result<i64, Error> {
        self.call_stream(
            "position_stream",
            |caps| caps.handles_input_stream,
            |addon, kind| match kind {
                StreamKind::Live => addon.position_live_stream(),
                StreamKind::Recorded => addon.position_recorded_stream(),
            },
        )
    }

    pub fn length_stream(&self) -> Result<i64, Error> {
        self.call_stream(
            "length_stream",
            |caps| caps.handles_input_stream,
            |addon, kind| match kind {
                StreamKind::Live => addon.length_live_stream(),
                StreamKind::Recorded => addon.length_recorded_stream(),
            },
        )
    }

    pub fn can_pause_stream(&self) -> Result<bool, Error> {
        self.call_stream("can_pause_stream", always, |addon, _| addon.can_pause_stream())
    }

    pub fn can_seek_stream(&self) -> Result<bool, Error> {
        self.call_stream("can_seek_stream", always, |addon, _| addon.can_seek_stream())
    }

    pub fn pause_stream(&self, paused: bool) -> Result<(), Error> {
        self.call_stream("pause_stream", always, |addon, _| addon.pause_stream(paused))
    }

    pub fn seek_time(&self, time: f64, backwards: bool) -> Result<f64, Error> {
        self.call_stream("seek_time", always, |addon, _| addon.seek_time(time, backwards))
    }

    pub fn set_speed(&self, speed: i32) -> Result<(), Error> {
        self.call_stream("set_speed", always, |addon, _| addon.set_speed(speed))
    }

    pub fn is_real_time_stream(&self) -> Result<bool, Error> {
        self.call_stream("is_real_time_stream", always, |addon, _| {
            addon.is_real_time_stream()
        })
    }

    pub fn stream_times(&self) -> Result<StreamTimes, Error> {
        self.call_stream("stream_times", always, |addon, _| addon.stream_times())
    }

    pub fn get_stream_properties(&self) -> Result<StreamProperties, Error> {
        self.call_stream("stream_properties", always, |addon, _| {
            addon.stream_properties()
        })
    }

    pub fn signal_status(&self) -> Result<SignalStatus, Error> {
        self.call_live_stream("signal_status", always, |addon| addon.signal_status())
    }

    pub fn get_descramble_info(&self) -> Result<DescrambleInfo, Error> {
        self.call_live_stream(
            "descramble_info",
            |caps| caps.supports_descramble_info,
            |addon| addon.descramble_info(),
        )
    }

    fn call_live_stream<T, P, F>(&self, func: &'static str, supported: P, f: F) -> Result<T, Error>
    where
        P: FnOnce(&Capabilities) -> bool,
        F: FnOnce(&dyn PvrAddon) -> PvrResult<T>,
    {
        self.call_stream(func, supported, |addon, kind| match kind {
            StreamKind::Live => f(addon),
            StreamKind::Recorded => Err(PvrError::NotImplemented),
        })
    }

    // demuxing

    pub fn demux_read(&self) -> Result<Option<DemuxPacket>, Error> {
        self.call_stream(
            "demux_read",
            |caps| caps.handles_demuxing,
            |addon, _| addon.demux_read(),
        )
    }

    pub fn demux_reset(&self) -> Result<(), Error> {
        self.call_stream(
            "demux_reset",
            |caps| caps.handles_demuxing,
            |addon, _| addon.demux_reset(),
        )
    }

    pub fn demux_abort(&self) -> Result<(), Error> {
        self.call_stream(
            "demux_abort",
            |caps| caps.handles_demuxing,
            |addon, _| addon.demux_abort(),
        )
    }

    pub fn demux_flush(&self) -> Result<(), Error> {
        self.call_stream(
            "demux_flush",
            |caps| caps.handles_demuxing,
            |addon, _| addon.demux_flush(),
        )
    }

    // power management

    pub fn on_system_sleep(&self) -> Result<(), Error> {
        self.call("on_system_sleep", always, |addon, _| addon.on_system_sleep())
    }

    pub fn on_system_wake(&self) -> Result<(), Error> {
        self.call("on_system_wake", always, |addon, _| addon.on_system_wake())
    }

    pub fn on_power_saving_activated(&self) -> Result<(), Error> {
        self.call("on_power_saving_activated", always, |addon, _| {
            addon.on_power_saving_activated()
        })
    }

    pub fn on_power_saving_deactivated(&self) -> Result<(), Error> {
        self.call("on_power_saving_deactivated", always, |addon, _| {
            addon.on_power_saving_deactivated()
        })
    }
}

impl fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSession")
            .field("addon", &self.info.id)
            .field("client_id", &self.client_id())
            .field("ready", &self.is_ready())
            .field("connection_state", &self.connection_state())
            .finish_non_exhaustive()
    }
}

impl Drop for ClientSession {
    fn drop(&mut self) {
        self.destroy();
    }
}
