//! Transport layer: one HTTP primitive every endpoint slice builds on.
//!
//! A [`Transport`] takes an [`ApiRequest`] (relative path, method, query, body) and
//! returns the decoded JSON body on 2xx, or an [`ApiError::Http`] carrying
//! `{ status, data }` otherwise. There are no retries.

use futures::future::BoxFuture;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::errors::{ApiError, ApiResult};

/// HTTP verbs used by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// One field of a `multipart/form-data` body
#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        mime: Option<String>,
        bytes: Vec<u8>,
    },
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        FormPart::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: Option<String>,
        bytes: Vec<u8>,
    ) -> Self {
        FormPart::File {
            name: name.into(),
            file_name: file_name.into(),
            mime,
            bytes,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FormPart::Text { name, .. } | FormPart::File { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(Vec<FormPart>),
}

/// A request relative to the configured base origin
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Append the fields of `params` as query-string pairs.
    ///
    /// `null` and empty-string fields are skipped; arrays repeat the key.
    pub fn with_query<Q: Serialize + ?Sized>(mut self, params: &Q) -> ApiResult<Self> {
        let value = serde_json::to_value(params)?;
        match value {
            Value::Object(map) => {
                for (key, value) in map {
                    push_query_value(&mut self.query, &key, value);
                }
            }
            Value::Null => {}
            other => {
                return Err(ApiError::Parsing(format!(
                    "query parameters must serialize to an object, got {other}"
                )));
            }
        }
        Ok(self)
    }

    /// Append a single query-string pair
    pub fn query_pair(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Use `body` serialized as JSON
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> ApiResult<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Use a `multipart/form-data` body
    pub fn multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }

    /// The JSON body, if any
    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            RequestBody::Json(value) => Some(value),
            _ => None,
        }
    }

    /// The value of the first query pair named `key`
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

fn push_query_value(query: &mut Vec<(String, String)>, key: &str, value: Value) {
    match value {
        Value::Null => {}
        Value::String(text) if text.is_empty() => {}
        Value::String(text) => query.push((key.to_string(), text)),
        Value::Array(items) => {
            for item in items {
                push_query_value(query, key, item);
            }
        }
        other => query.push((key.to_string(), other.to_string())),
    }
}

/// The seam between endpoint slices and the network
pub trait Transport: Send + Sync + 'static {
    /// Perform `request`, returning the JSON body on 2xx
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, ApiResult<Value>>;
}

/// [`Transport`] over `reqwest` against a fixed base origin
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn execute(&self, request: ApiRequest) -> ApiResult<Value> {
        let ApiRequest {
            method,
            path,
            query,
            body,
        } = request;
        let url = self.url(&path);
        crate::debug_log!("🌐 [HTTP] {} {}", method.as_str(), url);

        let mut builder = self.client.request(method.into(), url);
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(parts) => builder.multipart(build_form(parts)?),
        };

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_str(&text)?);
        }

        let data = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));
        crate::debug_log!("❌ [HTTP] {} {} -> {}", method.as_str(), path, status.as_u16());
        Err(ApiError::Http {
            status: status.as_u16(),
            data,
        })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, ApiResult<Value>> {
        Box::pin(self.execute(request))
    }
}

fn build_form(parts: Vec<FormPart>) -> ApiResult<Form> {
    let mut form = Form::new();
    for part in parts {
        form = match part {
            FormPart::Text { name, value } => form.text(name, value),
            FormPart::File {
                name,
                file_name,
                mime,
                bytes,
            } => {
                let mut file = Part::bytes(bytes).file_name(file_name);
                if let Some(mime) = mime {
                    file = file.mime_str(&mime)?;
                }
                form.part(name, file)
            }
        };
    }
    Ok(form)
}
