use anyhow::Result;
use async_trait::async_trait;

use crate::model::GlobalConditions;

use super::{GlobalProvider, http::HttpClient};

const BASE_URL: &str = "https://wttr.in";

/// wttr.in serves plain text only to terminal clients.
pub const TERMINAL_USER_AGENT: &str = "curl/8.5.0";

/// condition | temperature | wind | humidity | precipitation
const CONDITIONS_FORMAT: &str = "%C|%t|%w|%h|%p";

#[derive(Debug, Clone)]
pub struct WttrClient {
    http: HttpClient,
}

impl WttrClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    fn url(location: &str) -> String {
        let path = location.split_whitespace().collect::<Vec<_>>().join("+");
        format!("{BASE_URL}/{}", urlencoding::encode(&path).replace("%2B", "+"))
    }
}

/// `None` for an empty body or wttr.in's "Unknown location" reply.
pub fn parse_conditions(body: &str) -> Option<GlobalConditions> {
    let line = body.trim();
    if line.is_empty() || line.to_lowercase().starts_with("unknown location") {
        return None;
    }

    let mut parts = line.split('|').map(|p| p.trim().to_string());
    let mut next = || parts.next().unwrap_or_default();

    let condition = next();
    Some(GlobalConditions {
        condition: if condition.is_empty() { "Unknown".to_string() } else { condition },
        temperature: next(),
        wind: next(),
        humidity: next(),
        precipitation: next(),
    })
}

fn parse_outlook(body: &str) -> Option<String> {
    let text = body.trim_end();
    if text.trim().is_empty() || text.to_lowercase().starts_with("unknown location") {
        None
    } else {
        Some(text.to_string())
    }
}

#[async_trait]
impl GlobalProvider for WttrClient {
    async fn conditions(&self, location: &str) -> Result<Option<GlobalConditions>> {
        let body = self
            .http
            .get_text(&Self::url(location), &[("format", CONDITIONS_FORMAT)], "wttr.in current")
            .await?;
        Ok(parse_conditions(&body))
    }

    async fn outlook(&self, location: &str) -> Result<Option<String>> {
        let body = self
            .http
            .get_text(&Self::url(location), &[("format", "v2")], "wttr.in outlook")
            .await?;
        Ok(parse_outlook(&body))
    }
}
