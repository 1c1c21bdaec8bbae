//! HTTP adapter for the route backend.

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{Route, RouteStatus, StopOrder};
use crate::traits::{Credentials, RouteRepository, SessionProvider};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Blocking client for the route REST API, authenticated with a bearer token.
#[derive(Debug, Clone)]
pub struct RouteApiClient {
    config: ApiConfig,
    client: Client,
    token: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Debug, Serialize)]
struct StatusUpdate {
    status: RouteStatus,
}

#[derive(Debug, Serialize)]
struct CompleteStop<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct OptimizedOrder<'a> {
    stops: &'a [StopOrder],
}

impl RouteApiClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            config,
            client,
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.token.as_deref().ok_or(Error::NotAuthenticated)?;
        Ok(builder.bearer_auth(token))
    }

    fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = self.authorized(builder)?.send()?;
        check_status(response)
    }
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(Error::NotAuthenticated);
    }
    let body = response.text().unwrap_or_default();
    Err(Error::Status {
        status: status.as_u16(),
        body,
    })
}

impl RouteRepository for RouteApiClient {
    fn list_routes(&self) -> Result<Vec<Route>> {
        let routes: Vec<Route> = self.send(self.client.get(self.url("/routes")))?.json()?;
        debug!(count = routes.len(), "fetched routes");
        Ok(routes)
    }

    fn route_details(&self, route_id: &str) -> Result<Route> {
        let url = self.url(&format!("/routes/{}", route_id));
        Ok(self.send(self.client.get(url))?.json()?)
    }

    fn update_route_status(&self, route_id: &str, status: RouteStatus) -> Result<()> {
        let url = self.url(&format!("/routes/{}/status", route_id));
        self.send(self.client.patch(url).json(&StatusUpdate { status }))?;
        Ok(())
    }

    fn complete_stop(&self, stop_id: &str, notes: Option<&str>) -> Result<()> {
        let url = self.url(&format!("/stops/{}/complete", stop_id));
        self.send(self.client.post(url).json(&CompleteStop { notes }))?;
        Ok(())
    }

    fn save_optimized_order(&self, route_id: &str, order: &[StopOrder]) -> Result<()> {
        let url = self.url(&format!("/routes/{}/optimized-order", route_id));
        self.send(self.client.put(url).json(&OptimizedOrder { stops: order }))?;
        debug!(route_id, stops = order.len(), "saved optimized order");
        Ok(())
    }

    fn delete_route(&self, route_id: &str) -> Result<()> {
        let url = self.url(&format!("/routes/{}", route_id));
        self.send(self.client.delete(url))?;
        Ok(())
    }
}

impl SessionProvider for RouteApiClient {
    fn login(&mut self, credentials: &Credentials) -> Result<String> {
        let request = LoginRequest {
            email: &credentials.email,
            password: &credentials.password,
        };
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(&request)
            .send()?;
        let body: LoginResponse = check_status(response)?.json()?;
        self.token = Some(body.token.clone());
        Ok(body.token)
    }

    fn logout(&mut self) -> Result<()> {
        self.token = None;
        Ok(())
    }

    fn restore(&mut self, token: String) {
        self.token = Some(token);
    }

    fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}
