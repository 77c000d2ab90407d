use askama::Template;
use tracing::error;

use crate::weather::WeatherReport;

/// What the form page shows below the input.
#[derive(Debug, Clone, PartialEq)]
pub enum PageState {
    Blank,
    Weather(WeatherReport),
    Error,
}

// Fields stay private: a page is only ever built from a `PageState`, so the
// weather block and the error block never render together.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    weather: Option<WeatherReport>,
    error: bool,
}

impl From<PageState> for IndexTemplate {
    fn from(state: PageState) -> Self {
        match state {
            PageState::Blank => Self {
                weather: None,
                error: false,
            },
            PageState::Weather(report) => Self {
                weather: Some(report),
                error: false,
            },
            PageState::Error => Self {
                weather: None,
                error: true,
            },
        }
    }
}

pub fn render_page(state: PageState) -> String {
    IndexTemplate::from(state).render().unwrap_or_else(|e| {
        error!("Template rendering error: {}", e);
        "Weather page is temporarily unavailable".to_string()
    })
}
