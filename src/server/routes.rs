use crate::server::api::{self, ApiError};

pub struct HttpResponse {
    pub status_code: u16,
    pub status_text: &'static str,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    pub fn to_http_string(&self) -> String {
        format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status_code,
            self.status_text,
            self.content_type,
            self.body.len(),
            self.body
        )
    }

    fn json(body: String) -> Self {
        Self {
            status_code: 200,
            status_text: "OK",
            content_type: "application/json",
            body,
        }
    }
}

const MATCHES_PREFIX: &str = "/api/matches/";

pub fn route_request(method: &str, path: &str, body: &str) -> HttpResponse {
    let path = path.split('?').next().unwrap_or(path);
    let result = match (method, path) {
        ("GET", "/api/health") => api::health_payload(),
        ("GET", "/api/cards") => api::cards_payload(),
        ("POST", "/api/matches") => api::create_match_payload(body),
        (method, path) if path.starts_with(MATCHES_PREFIX) => {
            let rest = &path[MATCHES_PREFIX.len()..];
            let (id, action) = rest.split_once('/').unwrap_or((rest, ""));
            match (method, action) {
                ("GET", "") => api::match_payload(id),
                ("DELETE", "") => api::delete_match_payload(id),
                ("GET", "events") => api::events_payload(id),
                ("POST", "select") => api::select_payload(id, body),
                ("POST", "confirm") => api::confirm_payload(id),
                ("POST", "back") => api::back_payload(id),
                ("POST", "roll") => api::roll_payload(id),
                ("POST", "override") => api::override_payload(id, body),
                ("POST", "reset") => api::reset_payload(id),
                _ => return error_response(404, "Not Found", "Route not found"),
            }
        }
        _ => return error_response(404, "Not Found", "Route not found"),
    };

    match result {
        Ok(payload) => HttpResponse::json(payload),
        Err(err @ ApiError::NotFound) => error_response(404, "Not Found", &err.to_string()),
        Err(err @ (ApiError::Parse(_) | ApiError::BadRequest(_))) => {
            error_response(400, "Bad Request", &err.to_string())
        }
        Err(err @ ApiError::Internal(_)) => {
            error_response(500, "Internal Server Error", &err.to_string())
        }
    }
}

fn error_response(status_code: u16, status_text: &'static str, message: &str) -> HttpResponse {
    HttpResponse {
        status_code,
        status_text,
        content_type: "application/json",
        body: format!(
            "{{\n  \"status\": \"error\",\n  \"message\": {}\n}}",
            serde_json::to_string(message).unwrap_or_else(|_| "\"Unknown error\"".to_string())
        ),
    }
}
