//! API version check, capability discovery and timer type enumeration.

use std::sync::Arc;

use semver::Version;
use serde::Serialize;

use crate::addon::AddonInfo;
use crate::addon::PvrAddon;
use crate::addon::boundary;
use crate::convert::Converter;
use crate::error::Error;
use crate::models::*;

/// The PVR API version this host implements.
pub const API_VERSION: Version = Version::new(5, 10, 0);
/// The oldest PVR API version still accepted.
pub const MIN_API_VERSION: Version = Version::new(5, 0, 0);

const DEFAULT_PRIORITY: i32 = 50;
const DEFAULT_LIFETIME: i32 = 99;

/// Everything learned from an addon while creating its session.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientProperties {
    pub api_version: Version,
    pub capabilities: Capabilities,
    pub backend_name: String,
    pub connection_string: String,
    pub friendly_name: String,
    pub backend_version: String,
    pub backend_hostname: String,
    pub timer_types: Vec<Arc<TimerType>>,
}

impl Default for ClientProperties {
    fn default() -> Self {
        ClientProperties {
            api_version: Version::new(0, 0, 0),
            capabilities: Default::default(),
            backend_name: String::new(),
            connection_string: String::new(),
            friendly_name: String::new(),
            backend_version: String::new(),
            backend_hostname: String::new(),
            timer_types: Vec::new(),
        }
    }
}

pub fn check_api_version(addon: &AddonInfo, version: &str) -> Result<Version, Error> {
    let version = Version::parse(version.trim())?;
    if version < MIN_API_VERSION || version > API_VERSION {
        tracing::error!(
            addon.id = %addon.id,
            %version,
            min = %MIN_API_VERSION,
            max = %API_VERSION,
            "Incompatible API version",
        );
        return Err(Error::IncompatibleApiVersion(version.to_string()));
    }
    Ok(version)
}

/// Queries all properties of a freshly created addon instance.
///
/// Nothing is returned unless every step succeeds.
pub fn negotiate(
    info: &AddonInfo,
    addon: &dyn PvrAddon,
    converter: &Converter,
    max_timer_types: usize,
) -> Result<ClientProperties, Error> {
    let api_version = boundary::invoke(info, "api_version", || addon.api_version())?;
    let api_version = check_api_version(info, &api_version)?;

    let capabilities = boundary::invoke(info, "capabilities", || addon.capabilities())?;

    let backend_name = boundary::invoke(info, "backend_name", || addon.backend_name())?;
    let connection_string =
        boundary::invoke(info, "connection_string", || addon.connection_string())?;
    let backend_version = boundary::invoke(info, "backend_version", || addon.backend_version())?;
    let backend_hostname =
        boundary::invoke(info, "backend_hostname", || addon.backend_hostname())?;
    let friendly_name = format!("{}:{}", backend_name, connection_string);

    let timer_types = if capabilities.supports_timers {
        timer_types(info, addon, converter, &capabilities, max_timer_types)?
    } else {
        vec![]
    };

    tracing::debug!(
        addon.id = %info.id,
        client.id = %converter.client_id(),
        %api_version,
        %friendly_name,
        timer_types = timer_types.len(),
        "Negotiated",
    );

    Ok(ClientProperties {
        api_version,
        capabilities,
        backend_name,
        connection_string,
        friendly_name,
        backend_version,
        backend_hostname,
        timer_types,
    })
}

fn timer_types(
    info: &AddonInfo,
    addon: &dyn PvrAddon,
    converter: &Converter,
    capabilities: &Capabilities,
    max: usize,
) -> Result<Vec<Arc<TimerType>>, Error> {
    let mut wire_types = match boundary::invoke(info, "timer_types", || addon.timer_types(max)) {
        Ok(wire_types) => wire_types,
        Err(Error::NotImplemented) => {
            tracing::debug!(addon.id = %info.id, "Synthesize timer types");
            return Ok(fallback_timer_types(converter.client_id(), capabilities));
        }
        Err(err) => return Err(err),
    };

    if wire_types.len() > max {
        tracing::warn!(
            addon.id = %info.id,
            max,
            actual = wire_types.len(),
            "Too many timer types, dropped the rest",
        );
        wire_types.truncate(max);
    }

    let timer_types = wire_types
        .iter()
        .filter_map(|wire| match converter.timer_type(wire) {
            Some(timer_type) => Some(Arc::new(timer_type)),
            None => {
                tracing::error!(
                    addon.id = %info.id,
                    addon.author = %info.author,
                    description = %wire.description,
                    "Invalid timer type id, please contact the author of the addon",
                );
                None
            }
        })
        .collect();
    Ok(timer_types)
}

/// Timer types for addons predating typed timers.
pub fn fallback_timer_types(
    client_id: ClientId,
    capabilities: &Capabilities,
) -> Vec<Arc<TimerType>> {
    use TimerTypeAttributes as A;

    let common = A::SUPPORTS_ENABLE_DISABLE
        | A::SUPPORTS_CHANNELS
        | A::SUPPORTS_START_TIME
        | A::SUPPORTS_END_TIME
        | A::SUPPORTS_PRIORITY
        | A::SUPPORTS_LIFETIME
        | A::SUPPORTS_RECORDING_FOLDERS;

    let mut attributes = vec![
        A::IS_MANUAL | common,
        A::IS_MANUAL | A::IS_REPEATING | A::SUPPORTS_FIRST_DAY | A::SUPPORTS_WEEKDAYS | common,
    ];
    if capabilities.supports_epg {
        attributes.push(A::REQUIRES_EPG_TAG_ON_CREATE | common);
    }

    attributes
        .into_iter()
        .zip(1..)
        .map(|(attributes, id)| {
            let mut timer_type = TimerType {
                client_id,
                id: TimerTypeId::from(id),
                attributes,
                description: String::new(),
                priorities: vec![],
                priorities_default: DEFAULT_PRIORITY,
                lifetimes: vec![],
                lifetimes_default: DEFAULT_LIFETIME,
                max_recordings: vec![],
                max_recordings_default: 0,
                prevent_duplicate_episodes: vec![],
                prevent_duplicate_episodes_default: 0,
                recording_groups: vec![],
                recording_groups_default: 0,
            };
            timer_type.description = timer_type.generated_description().to_string();
            Arc::new(timer_type)
        })
        .collect()
}
