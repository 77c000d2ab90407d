pub mod config;
pub mod routes;
pub mod templates;
pub mod weather;

pub use config::Config;
pub use routes::{router, AppState};
pub use templates::{render_page, PageState};
pub use weather::{OpenWeatherProvider, WeatherError, WeatherProvider, WeatherReport};

/// Installs the global tracing subscriber, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
