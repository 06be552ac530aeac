mod demo;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use itertools::Itertools;
use serde::Serialize;
use tokio::sync::mpsc;

use pvr_core::error::Error;
use pvr_core::host::memory::MemoryChannelGroup;
use pvr_core::host::memory::MemoryStore;
use pvr_core::host::memory::StoreSummary;
use pvr_core::host::*;
use pvr_core::models::*;
use pvr_core::registry::ClientRegistry;
use pvr_core::registry::ConnectionMonitor;
use pvr_core::relay::apply_epg_change;
use pvr_core::tracing_ext::LogFormat;
use pvr_core::tracing_ext::init_tracing;
use pvr_core::update::UpdateJob;
use pvr_core::*;

const EPG_DAYS: i64 = 3;

#[derive(Parser)]
#[command(author, version, about)]
struct Opt {
    /// Path to a configuration file in a YAML format.
    ///
    /// The PVRHOST_CONFIG environment variable is used if this option is not
    /// specified.
    #[arg(short, long, env = "PVRHOST_CONFIG")]
    config: PathBuf,

    /// Logging format: `text` or `json`.
    #[arg(long, env = "PVRHOST_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// Keep running and process update requests from clients until SIGINT.
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let opt = Opt::parse();

    init_tracing(opt.log_format);

    let config = config::load(&opt.config);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let scheduler = Arc::new(tx);
    let store = MemoryStore::new();
    let notifier = Arc::new(LogNotifier);
    let epg_changes = epg_changes::EpgChangeQueue::new();
    let services = HostServices {
        addon_host: Arc::new(demo::DemoAddonHost),
        directory: store.clone(),
        epg_readiness: store.clone(),
        connection_observer: Arc::new(ConnectionMonitor::new(
            config.clone(),
            notifier.clone(),
            scheduler.clone(),
        )),
        notifier,
        scheduler,
        epg_changes,
    };
    let registry = Arc::new(ClientRegistry::new(config.clone(), services.clone()));

    let started = registry.start_all();
    tracing::info!(started, "Started clients");

    let now = std::time::Instant::now();
    let summary = refresh(&registry, &store, &services);
    tracing::info!(
        elapsed = %humantime::format_duration(now.elapsed()),
        "Refreshed all clients",
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if opt.watch {
        tracing::info!("Waiting for update requests...");
        loop {
            tokio::select! {
                job = rx.recv() => {
                    let Some(job) = job else {
                        break;
                    };
                    let registry = registry.clone();
                    let store = store.clone();
                    let result = tokio::task::spawn_blocking(move || {
                        process_job(&registry, &store, &job)
                    })
                    .await;
                    if let Err(err) = result {
                        tracing::error!(%err, "Update worker panicked");
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("SIGINT received");
                    break;
                }
            }
        }
    }

    tracing::info!("Stopping...");
    registry.shutdown();

    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary {
    clients: Vec<ClientSummary>,
    store: StoreSummary,
    channel_group_members: usize,
    pending_epg_changes: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientSummary {
    client_id: ClientId,
    addon: String,
    friendly_name: String,
    backend_version: String,
    connection_state: ConnectionState,
    timer_types: usize,
}

/// Loads everything from all clients into `store`.
fn refresh(
    registry: &ClientRegistry,
    store: &Arc<MemoryStore>,
    services: &HostServices,
) -> Summary {
    let mut failed = vec![];
    for radio in [false, true] {
        failed.extend(registry.get_channels_all(radio, store.clone()));
        failed.extend(registry.get_channel_groups_all(radio, store.clone()));
    }

    let mut channel_group_members = 0;
    for group in store.channel_groups() {
        let Some(session) = registry.client(group.client_id) else {
            continue;
        };
        let container = MemoryChannelGroup::new(group);
        if session.get_channel_group_members(container.clone()).is_ok() {
            channel_group_members += container.members().len();
        }
    }

    failed.extend(registry.get_recordings_all(false, store.clone()));
    failed.extend(registry.get_timers_all(store.clone()));
    for client_id in failed.into_iter().unique() {
        tracing::warn!(client.id = %client_id, "Failed to refresh some of the client's data");
    }

    store.create_epgs();
    let applied = services
        .epg_changes
        .flush(|change| apply_epg_change(store.as_ref(), change));
    tracing::debug!(applied, "Applied pending EPG event changes");

    let start = Utc::now() - chrono::Duration::days(1);
    let end = Utc::now() + chrono::Duration::days(EPG_DAYS);
    for session in registry.created_clients() {
        if let Err(err) = ignore_not_implemented(session.set_epg_time_frame(EPG_DAYS as i32)) {
            tracing::warn!(
                %err,
                client.id = %session.client_id(),
                "Failed to set the EPG time frame",
            );
        }
        for channel in store.channels() {
            if channel.client_id != session.client_id() {
                continue;
            }
            let Some(epg) = store.channel_epg(channel.uid, channel.client_id) else {
                continue;
            };
            if let Err(err) = session.get_epg_for_channel(&channel, epg, start, end) {
                tracing::warn!(
                    %err,
                    client.id = %channel.client_id,
                    channel.uid = %channel.uid,
                    "Failed to get EPG",
                );
            }
        }
    }

    Summary {
        clients: registry
            .clients()
            .iter()
            .map(|session| ClientSummary {
                client_id: session.client_id(),
                addon: session.addon().id.clone(),
                friendly_name: session.friendly_name(),
                backend_version: session.backend_version(),
                connection_state: session.connection_state(),
                timer_types: session.timer_types().len(),
            })
            .collect(),
        store: store.summary(),
        channel_group_members,
        pending_epg_changes: services.epg_changes.len(),
    }
}

fn process_job(registry: &ClientRegistry, store: &Arc<MemoryStore>, job: &UpdateJob) {
    let Some(session) = registry.client(job.client_id()) else {
        tracing::warn!(%job, "No such client");
        return;
    };
    let for_both = |f: &dyn Fn(bool) -> Result<(), Error>| -> Result<(), Error> {
        for radio in [false, true] {
            ignore_not_implemented(f(radio))?;
        }
        Ok(())
    };
    let result = match *job {
        UpdateJob::Channels { .. } => {
            for_both(&|radio| session.get_channels(radio, store.clone()))
        }
        UpdateJob::ChannelGroups { .. } => {
            for_both(&|radio| session.get_channel_groups(radio, store.clone()))
        }
        UpdateJob::Timers { .. } => session.get_timers(store.clone()),
        UpdateJob::Recordings { .. } => session.get_recordings(false, store.clone()),
        UpdateJob::Epg {
            client_id,
            channel_uid,
        } => match (
            store.channel(channel_uid, client_id),
            store.channel_epg(channel_uid, client_id),
        ) {
            (Some(channel), Some(epg)) => {
                let start = Utc::now() - chrono::Duration::days(1);
                let end = Utc::now() + chrono::Duration::days(EPG_DAYS);
                session.get_epg_for_channel(&channel, epg, start, end)
            }
            _ => {
                tracing::warn!(%job, "No EPG for the channel");
                Ok(())
            }
        },
    };
    match ignore_not_implemented(result) {
        Ok(()) => tracing::info!(%job, "Updated"),
        Err(err) => tracing::error!(%err, %job, "Failed to update"),
    }
}

// Backends are not required to support every request.
fn ignore_not_implemented(result: Result<(), Error>) -> Result<(), Error> {
    match result {
        Err(Error::NotImplemented) => Ok(()),
        _ => result,
    }
}
