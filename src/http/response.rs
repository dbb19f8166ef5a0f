use crate::error::ServerError;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: String,
    pub headers: HashMap<String, String>,
}

impl Response {
    pub fn new(status: u16) -> Response {
        Response {
            status,
            headers: HashMap::new(),
            body: String::new(),
        }
    }

    pub fn status(&mut self, status: u16) -> &mut Self {
        self.status = status;
        self
    }

    pub fn body<T: AsRef<str>>(&mut self, body: T) -> &mut Self {
        self.body = body.as_ref().to_string();
        self
    }

    pub fn header<K: AsRef<str>, V: AsRef<str>>(&mut self, name: K, value: V) -> &mut Self {
        self.headers.insert(name.as_ref().to_string(), value.as_ref().to_string());
        self
    }

    pub fn json<T: Serialize>(&mut self, value: &T) -> Result<&mut Self, ServerError> {
        let json_string = serde_json::to_string(value)
            .map_err(|e| ServerError::InternalError(format!("JSON serialization error: {}", e)))?;
        self.header("Content-Type", "application/json");
        self.body(json_string);
        Ok(self)
    }

    pub fn ok<T: Serialize>(data: &T) -> Result<Response, ServerError> {
        let mut response = Response::new(200);
        response.json(data)?;
        Ok(response)
    }

    pub fn created<T: Serialize>(data: &T) -> Result<Response, ServerError> {
        let mut response = Response::new(201);
        response.json(data)?;
        Ok(response)
    }

    pub fn no_content() -> Response {
        Response::new(204)
    }

    pub fn text<T: AsRef<str>>(content: T) -> Response {
        let mut response = Response::new(200);
        response.header("Content-Type", "text/plain").body(content);
        response
    }

    pub fn html<T: AsRef<str>>(content: T) -> Response {
        let mut response = Response::new(200);
        response.header("Content-Type", "text/html").body(content);
        response
    }

    pub fn redirect(location: &str) -> Response {
        let mut response = Response::new(302);
        response.header("Location", location);
        response
    }

    /// JSON error body for a [`ServerError`], with the error's status code.
    pub fn error(err: ServerError) -> Response {
        let status = err.status_code();
        let body = serde_json::json!({
            "error": {
                "message": err.to_string(),
                "status": status
            }
        });
        let mut response = Response::new(status);
        response
            .header("Content-Type", "application/json")
            .body(body.to_string());
        response
    }
}

#[macro_export]
macro_rules! ok_json {
    ($($json:tt)+) => {{
        $crate::http::Response::ok(&$crate::json!($($json)+))
    }};
}
