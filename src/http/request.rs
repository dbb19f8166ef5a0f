use crate::app::AppContext;
use crate::error::ServerError;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Eq, Hash, PartialEq, Copy, Clone, Debug)]
pub enum Method {
    GET,
    POST,
    PUT,
    DELETE,
    HEAD,
    CONNECT,
    OPTIONS,
    TRACE,
    PATCH,
}

impl Method {
    pub const ALL: [Method; 9] = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::HEAD,
        Method::CONNECT,
        Method::OPTIONS,
        Method::TRACE,
        Method::PATCH,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::HEAD => "HEAD",
            Method::CONNECT => "CONNECT",
            Method::OPTIONS => "OPTIONS",
            Method::TRACE => "TRACE",
            Method::PATCH => "PATCH",
        }
    }
}

impl FromStr for Method {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ServerError::BadRequest(format!("unsupported method `{}`", s)))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Body {
    pub(crate) content_type: String,
    pub(crate) data: Vec<u8>,
}

impl Body {
    pub fn new() -> Body {
        Body::default()
    }

    pub fn from_string(s: &str) -> Body {
        Body {
            content_type: "text/plain".to_string(),
            data: s.as_bytes().to_vec(),
        }
    }

    pub fn from_bytes(b: Vec<u8>) -> Body {
        Body {
            content_type: "application/octet-stream".to_string(),
            data: b,
        }
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn as_string(&self) -> String {
        String::from_utf8_lossy(&self.data).to_string()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn json<T>(&self) -> Option<T>
    where
        T: serde::de::DeserializeOwned,
    {
        if self.content_type.starts_with("application/json") {
            serde_json::from_slice(&self.data).ok()
        } else {
            None
        }
    }

    /// Decodes an `application/x-www-form-urlencoded` body into a flat map.
    pub fn form(&self) -> Option<HashMap<String, String>> {
        if self.content_type.starts_with("application/x-www-form-urlencoded") {
            Some(parse_urlencoded(&String::from_utf8_lossy(&self.data)))
        } else {
            None
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(b: Vec<u8>) -> Body {
        Body::from_bytes(b)
    }
}

/// An inbound request as seen by middleware, hooks and route targets.
///
/// `params` and `args` are filled in per matched route: `params` by name,
/// `args` in the order the parameters appear in the route pattern.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub params: HashMap<String, String>,
    pub args: Vec<String>,
    pub headers: HashMap<String, String>,
    pub data: HashMap<String, Value>,
    pub body: Body,
    pub(crate) context: AppContext,
}

impl Request {
    /// Builds a request from a method and a request target such as
    /// `/users/7?fields=name`.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, parse_urlencoded(query)),
            None => (target, HashMap::new()),
        };
        Self {
            method,
            path: normalize_path(path),
            query,
            params: HashMap::new(),
            args: Vec::new(),
            headers: HashMap::new(),
            data: HashMap::new(),
            body: Body::new(),
            context: AppContext::default(),
        }
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_lowercase(), value.to_string());
        self
    }

    pub fn with_body(mut self, content_type: &str, data: impl Into<Vec<u8>>) -> Self {
        self.body = Body {
            content_type: content_type.to_string(),
            data: data.into(),
        };
        self
    }

    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers.get(&key.to_lowercase()).map(String::as_str)
    }

    pub fn get_method(&self) -> &Method {
        &self.method
    }

    /// Named route parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Route parameters in pattern order.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub fn get_data(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn set_data<T>(&mut self, key: &str, value: T)
    where
        T: serde::Serialize,
    {
        if let Ok(value) = serde_json::to_value(value) {
            self.data.insert(key.to_string(), value);
        }
    }

    pub fn get_typed_data<T>(&self, key: &str) -> Option<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.data
            .get(key)
            .and_then(|value| serde_json::from_value(value.to_owned()).ok())
    }

    pub(crate) fn with_route_params(&self, params: Vec<(String, String)>) -> Request {
        let mut req = self.clone();
        req.args = params.iter().map(|(_, value)| value.clone()).collect();
        req.params = params.into_iter().collect();
        req
    }
}

fn normalize_path(path: &str) -> String {
    let path = path.trim_end_matches('/');
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}

fn parse_urlencoded(input: &str) -> HashMap<String, String> {
    input
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let raw = raw.replace('+', " ");
    urlencoding::decode(&raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or(raw)
}
