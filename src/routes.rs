use axum::{
    async_trait,
    extract::{FromRequest, Request, State},
    http::header,
    response::{Html, IntoResponse},
    routing::get,
    Form, Json, Router,
};
use serde::Deserialize;
use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;

use crate::templates::{render_page, PageState};
use crate::weather::WeatherProvider;

#[derive(Clone)]
pub struct AppState {
    provider: Arc<dyn WeatherProvider>,
}

impl AppState {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }
}

#[derive(Debug, Deserialize)]
pub struct CityForm {
    city: Option<String>,
}

/// The submitted city, from either a urlencoded form or a JSON body.
/// Any body that does not decode yields `None`.
#[derive(Debug)]
pub struct CityInput(pub Option<String>);

#[async_trait]
impl<S> FromRequest<S> for CityInput
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|content_type| content_type.starts_with("application/json"));

        let form = if is_json {
            Json::<CityForm>::from_request(req, state)
                .await
                .ok()
                .map(|Json(form)| form)
        } else {
            Form::<CityForm>::from_request(req, state)
                .await
                .ok()
                .map(|Form(form)| form)
        };

        Ok(Self(form.and_then(|form| form.city)))
    }
}

pub fn router(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/", get(index).post(lookup))
        .nest_service("/static", ServeDir::new(static_dir.as_ref()))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> impl IntoResponse {
    Html(render_page(PageState::Blank))
}

// Lookup failures are reported in the page body; the status is always 200.
// A body that does not decode, or one without `city`, gets the blank page.
async fn lookup(State(state): State<AppState>, CityInput(city): CityInput) -> impl IntoResponse {
    let Some(city) = city else {
        return Html(render_page(PageState::Blank));
    };

    let page = match state.provider.current_weather(&city).await {
        Ok(report) => {
            info!(city = %report.city_name, "✅ Weather lookup succeeded");
            PageState::Weather(report)
        }
        Err(_) => PageState::Error,
    };

    Html(render_page(page))
}
