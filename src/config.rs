use anyhow::{anyhow, Context, Result};
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_UNITS: &str = "imperial";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_STATIC_DIR: &str = "public";

const PLACEHOLDER_KEY: &str = "YOUR_API_KEY_HERE";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_url: String,
    pub units: String,
    pub host: IpAddr,
    pub port: u16,
    pub static_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_key = non_empty("OPENWEATHER_API_KEY")
            .filter(|key| key != PLACEHOLDER_KEY)
            .ok_or_else(|| anyhow!("OPENWEATHER_API_KEY must be set to an OpenWeatherMap API key"))?;

        let api_url = non_empty("OPENWEATHER_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let units = non_empty("WEATHER_UNITS").unwrap_or_else(|| DEFAULT_UNITS.to_string());

        let host = match non_empty("HOST") {
            Some(raw) => raw
                .parse::<IpAddr>()
                .with_context(|| format!("HOST is not a valid IP address: {raw}"))?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };

        let port = match non_empty("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("PORT is not a valid port number: {raw}"))?,
            None => DEFAULT_PORT,
        };

        let static_dir = non_empty("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR));

        Ok(Self {
            api_key,
            api_url,
            units,
            host,
            port,
            static_dir,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
