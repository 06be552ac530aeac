//! The one place where faults raised inside addon code are translated into
//! host results.

use std::any::Any;
use std::fmt;
use std::panic;
use std::panic::AssertUnwindSafe;

use crate::addon::AddonInfo;
use crate::error::Error;

/// Calls into addon code.
///
/// A panic unwinding out of `f` is caught, logged with the addon's identity
/// and author, and reported as [`Error::Unknown`].  An error returned by the
/// addon is converted into an [`Error`] and logged unless it merely says the
/// entry point isn't implemented.
pub fn invoke<T, E, F>(addon: &AddonInfo, func: &'static str, f: F) -> Result<T, Error>
where
    F: FnOnce() -> Result<T, E>,
    E: Into<Error> + fmt::Display,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => {
            let msg = err.to_string();
            let err = err.into();
            match err {
                Error::NotImplemented => {
                    tracing::debug!(addon.id = %addon.id, func, "Not implemented");
                }
                _ => {
                    tracing::error!(addon.id = %addon.id, func, err = %msg, "Addon returned an error");
                }
            }
            Err(err)
        }
        Err(payload) => {
            tracing::error!(
                addon.id = %addon.id,
                addon.name = %addon.name,
                addon.author = %addon.author,
                func,
                fault = fault_message(payload.as_ref()),
                "Fault in addon call, please contact the author of the addon",
            );
            Err(Error::Unknown)
        }
    }
}

fn fault_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown fault"
    }
}
