//! Audit-log middleware.
//!
//! Records one audit entry per request on protected routes: user, ip,
//! method, route. The write runs on a spawned task and its failure never
//! interrupts the request. Handlers that want business metadata attached
//! (e.g. transfer amounts) record their own event with `with_meta`.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::AppState;
use tally_db::repositories::{AuditEvent, AuditLogRepository};
use tally_shared::Claims;

/// Best-effort header-based client IP (behind a proxy).
fn client_ip(request: &Request) -> Option<String> {
    for header in ["x-forwarded-for", "x-real-ip"] {
        if let Some(value) = request.headers().get(header).and_then(|h| h.to_str().ok()) {
            let first = value.split(',').next().unwrap_or(value).trim();
            if !first.is_empty() {
                return Some(first.to_string());
            }
        }
    }
    None
}

/// Records an audit entry for each request passing through.
///
/// Must be layered inside the auth middleware so the claims extension is
/// already populated.
pub async fn audit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let user_id = request
        .extensions()
        .get::<Claims>()
        .map(tally_shared::Claims::user_id);
    let ip = client_ip(&request);
    let method = request.method().to_string();
    let route = request.uri().path().to_string();

    let repo = AuditLogRepository::new((*state.db).clone());
    tokio::spawn(async move {
        repo.record(AuditEvent::new(user_id, ip, &method, &route))
            .await;
    });

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;

    fn request_with_header(name: &str, value: &str) -> Request {
        HttpRequest::builder()
            .uri("/api/v1/transfers")
            .header(name, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_client_ip_from_forwarded_for() {
        let request = request_with_header("x-forwarded-for", "203.0.113.7, 10.0.0.1");
        assert_eq!(client_ip(&request), Some("203.0.113.7".to_string()));
    }

    #[test]
    fn test_client_ip_from_real_ip() {
        let request = request_with_header("x-real-ip", "198.51.100.4");
        assert_eq!(client_ip(&request), Some("198.51.100.4".to_string()));
    }

    #[test]
    fn test_client_ip_missing() {
        let request = HttpRequest::builder()
            .uri("/")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&request), None);
    }
}
