use anyhow::{Context, Result};
use reqwest::{Client, Request};
use serde::Deserialize;
use serde_json::Number;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;

/// Current conditions for one city, with numbers exactly as the provider sent them.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub city_name: String,
    pub temperature: Number,
    pub humidity: Number,
}

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("weather provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("weather provider returned an unreadable body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("weather provider response has no temperature/humidity data")]
    MissingMeasurements,
}

#[async_trait::async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current_weather(&self, city: &str) -> Result<WeatherReport, WeatherError>;
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: Option<Number>,
    humidity: Option<Number>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: Option<OwMain>,
    name: Option<String>,
}

/// Interprets a current-weather body. Provider error payloads such as
/// `{"cod":"404","message":"city not found"}` carry no `main` block.
pub fn parse_report(body: &str, requested_city: &str) -> Result<WeatherReport, WeatherError> {
    let parsed: OwCurrentResponse = serde_json::from_str(body)?;

    let (temperature, humidity) = match parsed.main {
        Some(OwMain {
            temp: Some(temp),
            humidity: Some(humidity),
        }) => (temp, humidity),
        _ => return Err(WeatherError::MissingMeasurements),
    };

    Ok(WeatherReport {
        city_name: parsed.name.unwrap_or_else(|| requested_city.to_string()),
        temperature,
        humidity,
    })
}

pub struct OpenWeatherProvider {
    client: Client,
    api_key: String,
    base_url: String,
    units: String,
}

impl OpenWeatherProvider {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build weather HTTP client")?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.api_url.clone(),
            units: config.units.clone(),
        })
    }

    /// Builds the outbound current-weather request without sending it.
    pub fn request(&self, city: &str) -> reqwest::Result<Request> {
        self.client
            .get(&self.base_url)
            .query(&[
                ("q", city),
                ("units", self.units.as_str()),
                ("appid", self.api_key.as_str()),
            ])
            .build()
    }
}

#[async_trait::async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current_weather(&self, city: &str) -> Result<WeatherReport, WeatherError> {
        info!(city, "🌤️  Fetching current weather from OpenWeatherMap");

        let request = self.request(city)?;
        // reqwest errors carry the URL, which includes the appid
        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                let e = e.without_url();
                warn!(city, error = %e, "❌ Weather request failed");
                return Err(WeatherError::Transport(e));
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                let e = e.without_url();
                warn!(city, %status, error = %e, "❌ Failed to read weather response body");
                return Err(WeatherError::Transport(e));
            }
        };

        parse_report(&body, city).map_err(|e| {
            warn!(city, %status, error = %e, "❌ Unusable weather response");
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use std::path::PathBuf;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(api_url: String) -> Config {
        Config {
            api_key: "test-key".to_string(),
            api_url,
            units: "imperial".to_string(),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            static_dir: PathBuf::from("public"),
        }
    }

    #[test]
    fn parses_measurements_and_city_name() {
        let report = parse_report(
            r#"{"main":{"temp":75,"humidity":60,"pressure":1012},"name":"Testville"}"#,
            "testville",
        )
        .expect("body has measurements");

        assert_eq!(report.city_name, "Testville");
        assert_eq!(report.temperature.to_string(), "75");
        assert_eq!(report.humidity.to_string(), "60");
    }

    #[test]
    fn fractional_values_are_kept_verbatim() {
        let report = parse_report(r#"{"main":{"temp":71.6,"humidity":48},"name":"Oslo"}"#, "Oslo")
            .expect("body has measurements");

        assert_eq!(report.temperature.to_string(), "71.6");
    }

    #[test]
    fn missing_main_is_a_failure() {
        let err = parse_report(r#"{"name":"NoMainDataCity"}"#, "NoMainDataCity").unwrap_err();
        assert!(matches!(err, WeatherError::MissingMeasurements));
    }

    #[test]
    fn provider_not_found_payload_is_a_failure() {
        let err = parse_report(r#"{"cod":"404","message":"city not found"}"#, "Atlantis").unwrap_err();
        assert!(matches!(err, WeatherError::MissingMeasurements));
    }

    #[test]
    fn partial_main_is_a_failure() {
        let err = parse_report(r#"{"main":{"temp":12},"name":"Half"}"#, "Half").unwrap_err();
        assert!(matches!(err, WeatherError::MissingMeasurements));
    }

    #[test]
    fn non_json_body_is_a_decode_failure() {
        let err = parse_report("<html>bad gateway</html>", "Anywhere").unwrap_err();
        assert!(matches!(err, WeatherError::Decode(_)));
    }

    #[test]
    fn missing_name_falls_back_to_requested_city() {
        let report = parse_report(r#"{"main":{"temp":1,"humidity":2}}"#, "Reykjavik")
            .expect("body has measurements");
        assert_eq!(report.city_name, "Reykjavik");
    }

    #[test]
    fn request_targets_current_weather_endpoint_with_city() {
        let provider =
            OpenWeatherProvider::new(&config_for(crate::config::DEFAULT_API_URL.to_string()))
                .expect("client builds");

        let request = provider.request("Testville").expect("request builds");
        let url = request.url().as_str();

        assert_eq!(request.method(), &reqwest::Method::GET);
        assert!(url.starts_with("https://api.openweathermap.org/data/2.5/weather?"));
        assert!(url.contains("q=Testville"));
        assert!(url.contains("units=imperial"));
        assert!(url.contains("appid=test-key"));
    }

    #[test]
    fn empty_city_is_forwarded_as_is() {
        let provider =
            OpenWeatherProvider::new(&config_for(crate::config::DEFAULT_API_URL.to_string()))
                .expect("client builds");

        let request = provider.request("").expect("request builds");
        assert!(request.url().as_str().contains("q=&"));
    }

    #[tokio::test]
    async fn fetches_report_with_a_single_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", "Testville"))
            .and(query_param("units", "imperial"))
            .and(query_param("appid", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"main":{"temp":75,"humidity":60},"name":"Testville"}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenWeatherProvider::new(&config_for(format!(
            "{}/data/2.5/weather",
            server.uri()
        )))
        .expect("client builds");

        let report = provider
            .current_weather("Testville")
            .await
            .expect("provider answered with measurements");

        assert_eq!(report.city_name, "Testville");
        assert_eq!(report.temperature.to_string(), "75");
        assert_eq!(report.humidity.to_string(), "60");
    }

    #[tokio::test]
    async fn not_found_status_with_error_body_is_missing_measurements() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_string(r#"{"cod":"404","message":"city not found"}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenWeatherProvider::new(&config_for(format!("{}/weather", server.uri())))
            .expect("client builds");

        let err = provider.current_weather("Atlantis").await.unwrap_err();
        assert!(matches!(err, WeatherError::MissingMeasurements));
    }

    #[tokio::test]
    async fn unreachable_provider_is_a_transport_failure() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .and_then(|listener| listener.local_addr())
            .expect("ephemeral port")
            .port();
        let url = format!("http://127.0.0.1:{port}/weather");

        let provider = OpenWeatherProvider::new(&config_for(url)).expect("client builds");

        let err = provider.current_weather("ErrorCity").await.unwrap_err();
        assert!(matches!(err, WeatherError::Transport(_)));
    }
}
