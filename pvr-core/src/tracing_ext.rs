//! Log output of processes hosting PVR clients.

use std::fmt;
use std::str::FromStr;

use is_terminal::IsTerminal;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::fmt::time::FormatTime;

use crate::error::Error;

/// Used when `RUST_LOG` is not set.
const DEFAULT_DIRECTIVES: &str = "info";

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(anyhow::anyhow!("Unsupported log format: {}", s).into()),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    let ansi = std::io::stdout().is_terminal();
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_timer(EpochTime)
            .with_env_filter(filter)
            .with_ansi(ansi)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_timer(ChronoLocal::rfc_3339())
            .with_env_filter(filter)
            .with_ansi(ansi)
            .with_thread_names(true)
            .init(),
    }
}

struct EpochTime;

impl FormatTime for EpochTime {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        write_epoch_nanos(w, nanos)
    }
}

// <secs>.<nanos>
fn write_epoch_nanos<W: fmt::Write>(w: &mut W, nanos: i64) -> fmt::Result {
    const NANOS_IN_SEC: i64 = 1_000_000_000;
    write!(w, "{}.{:09}", nanos / NANOS_IN_SEC, nanos % NANOS_IN_SEC)
}
