//! Subscriber setup shared by the binaries. `RUST_LOG` wins over the
//! configured level.

use tracing_subscriber::EnvFilter;

use crate::LogSettings;

/// Directives used when `RUST_LOG` is unset.
pub fn default_directives(settings: &LogSettings) -> String {
    format!("{},tower_http=debug", settings.level)
}

pub fn init(settings: &LogSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(settings)));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if settings.json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}
