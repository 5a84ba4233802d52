use crate::domain::ports::Analytics;
use crate::domain::request::RequestContext;
use uuid::Uuid;

pub const GA_COOKIE: &str = "_ga";

/// Reads the client id from the Google Analytics cookie (`GA1.2.<id>.<timestamp>`),
/// falling back to a fresh random id.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookieAnalytics;

impl CookieAnalytics {
    fn parse_ga_cookie(value: &str) -> Option<String> {
        let parts: Vec<&str> = value.split('.').collect();
        if parts.len() < 4 || parts[parts.len() - 2..].iter().any(|part| part.is_empty()) {
            return None;
        }
        Some(parts[parts.len() - 2..].join("."))
    }
}

impl Analytics for CookieAnalytics {
    fn get_client_id(&self, request: &RequestContext) -> String {
        request
            .cookies
            .get(GA_COOKIE)
            .and_then(|value| Self::parse_ga_cookie(value))
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }
}
