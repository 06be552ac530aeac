use crate::addon::AddonStatus;
use crate::addon::types::PvrError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Backend unavailable")]
    NotReady,
    #[error("Not implemented")]
    NotImplemented,
    #[error("Backend error: {0}")]
    Backend(PvrError),
    #[error("Unknown error")]
    Unknown,
    #[error("Invalid handle: {0}")]
    InvalidHandle(&'static str),
    #[error("Invalid client id: {0}")]
    InvalidClientId(i32),
    #[error("Client not found")]
    ClientNotFound,
    #[error("Incompatible API version: {0}")]
    IncompatibleApiVersion(String),
    #[error("Failed to create addon instance: {0}")]
    InstanceCreationFailed(AddonStatus),
    #[error("Channel not playable")]
    ChannelNotPlayable,
    #[error("Not playing")]
    NotPlaying,
    #[error("Menu hook not found")]
    MenuHookNotFound,
    #[error("semver error: {0}")]
    SemverError(semver::Error),
    #[error("std::io error: {0}")]
    IoError(std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(serde_json::Error),
    #[error("YAML error: {0}")]
    YamlError(serde_yaml::Error),
    #[error(transparent)]
    AnyhowError(#[from] anyhow::Error),
}

impl From<PvrError> for Error {
    fn from(err: PvrError) -> Self {
        match err {
            PvrError::NotImplemented => Self::NotImplemented,
            PvrError::Unknown => Self::Unknown,
            _ => Self::Backend(err),
        }
    }
}

impl From<semver::Error> for Error {
    fn from(err: semver::Error) -> Self {
        Self::SemverError(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Self::YamlError(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use test_log::test;

    #[test]
    fn test_from_pvr_error() {
        assert_matches!(Error::from(PvrError::NotImplemented), Error::NotImplemented);
        assert_matches!(Error::from(PvrError::Unknown), Error::Unknown);
        assert_matches!(
            Error::from(PvrError::Rejected),
            Error::Backend(PvrError::Rejected)
        );
    }
}
