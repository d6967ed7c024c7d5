//! Process-wide logs provider.
//!
//! One slot, filled by [`crate::telemetry::init`] and emptied by the matching
//! [`crate::telemetry::ShutdownHandle`]. Code that can be handed a
//! [`crate::telemetry::Telemetry`] should use it directly; this slot is for
//! call sites that only know a component name.

use std::borrow::Cow;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use opentelemetry::logs::LoggerProvider as _;
use opentelemetry_sdk::logs::SdkLoggerProvider;

use crate::telemetry::emit::LoggerHandle;

static PROVIDER: ArcSwapOption<SdkLoggerProvider> = ArcSwapOption::const_empty();

/// Named component logger from the global provider ("http", "db", "worker"...).
///
/// Never fails: without an installed provider the handle is inert and every
/// emit on it is a no-op.
pub fn logger(name: impl Into<Cow<'static, str>>) -> LoggerHandle {
    let name = name.into();
    match PROVIDER.load_full() {
        Some(provider) => LoggerHandle::active(name.clone(), provider.logger(name)),
        None => LoggerHandle::inert(name),
    }
}

/// Whether a provider is currently installed
pub fn is_installed() -> bool {
    PROVIDER.load().is_some()
}

/// Install `provider`, returning the one it replaces
pub(crate) fn install(provider: Arc<SdkLoggerProvider>) -> Option<Arc<SdkLoggerProvider>> {
    PROVIDER.swap(Some(provider))
}

/// Empty the slot if it still holds `provider`. A newer provider is left alone.
pub(crate) fn uninstall(provider: &Arc<SdkLoggerProvider>) -> bool {
    let previous = PROVIDER.rcu(|current| match current {
        Some(active) if Arc::ptr_eq(active, provider) => None,
        other => other.clone(),
    });

    matches!(previous, Some(active) if Arc::ptr_eq(&active, provider))
}

#[cfg(test)]
pub(crate) fn clear() -> Option<Arc<SdkLoggerProvider>> {
    PROVIDER.swap(None)
}
