use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use itertools::Itertools;
use semver::Version;
use serde::Deserialize;

use crate::addon::AddonInfo;
use crate::models::ClientId;

pub fn load<P: AsRef<Path>>(config_path: P) -> Arc<Config> {
    let config_path = config_path.as_ref();
    let reader = File::open(config_path)
        .unwrap_or_else(|err| panic!("Failed to open {}: {}", config_path.display(), err));
    let config: Config = serde_yaml::from_reader(reader)
        .unwrap_or_else(|err| panic!("Failed to parse {}: {}", config_path.display(), err));

    config.validate();

    Arc::new(config)
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub pvr: PvrConfig,
    #[serde(default)]
    pub clients: Vec<ClientConfig>,
}

impl Config {
    pub fn validate(&self) {
        self.pvr.validate();
        self.clients
            .iter()
            .enumerate()
            .for_each(|(i, config)| config.validate(i));
        assert_eq!(
            self.clients.len(),
            self.clients.iter().map(|config| config.id).unique().count(),
            "config.clients: `id` must be unique"
        );
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct PvrConfig {
    /// Minutes subtracted from every time a backend reports.
    #[serde(default)]
    pub time_correction_mins: i32,
    // Backends using an older API don't need the channel switch delay.
    #[serde(default = "PvrConfig::default_channel_switch_delay_min_api_version")]
    pub channel_switch_delay_min_api_version: Version,
    #[serde(default = "PvrConfig::default_max_timer_types")]
    pub max_timer_types: usize,
    #[serde(default)]
    pub hide_connection_lost_warning: bool,
}

impl PvrConfig {
    const MAX_TIMER_TYPES: usize = 32;
    const MAX_TIME_CORRECTION_MINS: i32 = 24 * 60;

    fn default_channel_switch_delay_min_api_version() -> Version {
        Version::new(1, 1, 0)
    }

    fn default_max_timer_types() -> usize {
        Self::MAX_TIMER_TYPES
    }

    pub fn time_correction(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.time_correction_mins as i64)
    }

    fn validate(&self) {
        assert!(
            self.time_correction_mins.abs() <= Self::MAX_TIME_CORRECTION_MINS,
            "config.pvr: `time-correction-mins` must be within +/-{}",
            Self::MAX_TIME_CORRECTION_MINS
        );
        assert!(
            (1..=Self::MAX_TIMER_TYPES).contains(&self.max_timer_types),
            "config.pvr: `max-timer-types` must be in 1..={}",
            Self::MAX_TIMER_TYPES
        );
    }
}

impl Default for PvrConfig {
    fn default() -> Self {
        PvrConfig {
            time_correction_mins: 0,
            channel_switch_delay_min_api_version:
                Self::default_channel_switch_delay_min_api_version(),
            max_timer_types: Self::default_max_timer_types(),
            hide_connection_lost_warning: false,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub id: i32,
    pub addon: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub disabled: bool,
}

impl ClientConfig {
    pub fn client_id(&self) -> ClientId {
        self.id.into()
    }

    pub fn addon_info(&self) -> AddonInfo {
        AddonInfo {
            id: self.addon.clone(),
            name: if self.name.is_empty() {
                self.addon.clone()
            } else {
                self.name.clone()
            },
            version: self.version.clone(),
            author: self.author.clone(),
        }
    }

    fn validate(&self, index: usize) {
        assert!(
            self.client_id().is_valid(),
            "config.clients[{}]: `id` must be a positive integer",
            index
        );
        assert!(
            !self.addon.is_empty(),
            "config.clients[{}]: `addon` must be a non-empty string",
            index
        );
    }
}
