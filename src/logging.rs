//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{HeaderMap, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::Error;

/// The number of bytes of a body to log at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

const REDACTED: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
///
/// Passwords and session tokens are redacted, PDF bodies are summarised by their length.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match read_body(body).await {
        Ok(bytes) => bytes,
        Err(error) => return error.into_response(),
    };

    let display_text = display_body(&parts.headers, &body_bytes);
    log_body(
        &format!("Received request: {} {}", parts.method, parts.uri),
        &display_text,
    );

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match read_body(body).await {
        Ok(bytes) => bytes,
        Err(error) => return error.into_response(),
    };

    let display_text = display_body(&parts.headers, &body_bytes);
    log_body(
        &format!("Sending response: {}", parts.status),
        &display_text,
    );

    Response::from_parts(parts, Body::from(body_bytes))
}

async fn read_body(body: Body) -> Result<Bytes, Error> {
    axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|error| Error::BodyReadError(error.to_string()))
}

fn display_body(headers: &HeaderMap, body: &Bytes) -> String {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let text = String::from_utf8_lossy(body);

    if content_type.starts_with("application/pdf") {
        format!("<PDF document, {} bytes>", body.len())
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        redact_form_field(&text, "password")
    } else if content_type.starts_with("application/json") {
        redact_json_fields(&text, &["password", "access_token"])
    } else {
        text.into_owned()
    }
}

fn redact_form_field(form_text: &str, field_name: &str) -> String {
    form_text
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if key == field_name => format!("{key}={REDACTED}"),
            _ => pair.to_owned(),
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn redact_json_fields(json_text: &str, field_names: &[&str]) -> String {
    let Ok(mut value) = serde_json::from_str::<Value>(json_text) else {
        return json_text.to_owned();
    };

    if let Value::Object(object) = &mut value {
        for field_name in field_names {
            if let Some(field) = object.get_mut(*field_name) {
                *field = Value::String(REDACTED.to_owned());
            }
        }
    }

    value.to_string()
}

fn truncate(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }

    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    &text[..end]
}

fn log_body(message: &str, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "{message}\nbody: {}...",
            truncate(body, LOG_BODY_LENGTH_LIMIT)
        );
        tracing::debug!("Full body: {body:?}");
    } else {
        tracing::info!("{message}\nbody: {body:?}");
    }
}

#[cfg(test)]
mod logging_tests {
    use axum::{
        Json, Router,
        body::Bytes,
        http::{HeaderMap, HeaderValue, header::CONTENT_TYPE},
        middleware,
        routing::post,
    };
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use super::{display_body, logging_middleware, redact_form_field, truncate};

    fn headers(content_type: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers
    }

    #[test]
    fn redacts_form_password() {
        let redacted = redact_form_field("username=alice&password=hunter2", "password");

        assert_eq!(redacted, "username=alice&password=********");
    }

    #[test]
    fn leaves_form_without_password() {
        let redacted = redact_form_field("username=alice", "password");

        assert_eq!(redacted, "username=alice");
    }

    #[test]
    fn redacts_json_password_and_token() {
        let body = Bytes::from(
            r#"{"password":"hunter2","access_token":"abc.def","token_type":"bearer"}"#,
        );

        let text = display_body(&headers("application/json"), &body);

        assert!(!text.contains("hunter2"));
        assert!(!text.contains("abc.def"));
        assert!(text.contains("bearer"));
    }

    #[test]
    fn summarises_pdf() {
        let body = Bytes::from_static(b"%PDF-1.4\n\xE2\xE3");

        let text = display_body(&headers("application/pdf"), &body);

        assert_eq!(text, "<PDF document, 11 bytes>");
    }

    #[test]
    fn truncates_on_char_boundary() {
        assert_eq!(truncate("héllo", 2), "h");
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[tokio::test]
    async fn passes_bodies_through_unchanged() {
        async fn echo(Json(body): Json<Value>) -> Json<Value> {
            Json(body)
        }

        let app = Router::new()
            .route("/echo", post(echo))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::new(app).expect("Could not create test server.");
        let body = json!({"password": "hunter2", "name": "alice"});

        let response = server.post("/echo").json(&body).await;

        response.assert_status_ok();
        response.assert_json(&body);
    }
}
