//! Logging and error-tracking setup.
//!
//! Call [`init`] once at startup and keep the returned guard alive; dropping it
//! flushes pending Sentry events.

use std::borrow::Cow;

use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::StorefrontConfig;

/// Filter applied when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "solarmart_storefront=info";

/// Keeps Sentry alive for the lifetime of the session.
#[must_use = "dropping the guard shuts down error tracking"]
pub struct TelemetryGuard {
    sentry: Option<sentry::ClientInitGuard>,
}

impl TelemetryGuard {
    /// Whether Sentry was configured.
    #[must_use]
    pub const fn sentry_enabled(&self) -> bool {
        self.sentry.is_some()
    }
}

/// Initialize Sentry error tracking; `None` without a DSN.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config.sentry_environment.clone().map(Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Install the global tracing subscriber and, if configured, Sentry.
///
/// Sentry is initialized before the subscriber so the tracing layer can attach
/// to it. Calling this twice leaves the first subscriber in place.
pub fn init(config: &StorefrontConfig) -> TelemetryGuard {
    let sentry = init_sentry(config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .try_init();

    if installed.is_err() {
        tracing::debug!("Global subscriber already installed");
    }

    TelemetryGuard { sentry }
}
