//! Replayable request descriptions.
//!
//! An [`ApiRequest`] is rebuilt into a fresh `reqwest::Request` for every attempt.
//! The caller passes the credential per build, so transport retries and the
//! post-refresh replay each carry whatever the store holds at that moment.

use bytes::Bytes;
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::credential::Credential;
use crate::error::MofuError;

/// Body of an [`ApiRequest`]
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    /// No body
    #[default]
    Empty,
    /// JSON body
    Json(Value),
    /// `multipart/form-data` body
    Multipart(MultipartBody),
}

/// A single field of a [`MultipartBody`]
#[derive(Debug, Clone)]
enum MultipartPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        mime: String,
        bytes: Bytes,
    },
}

/// Cloneable multipart form
///
/// `reqwest::multipart::Form` is consumed when sent, so the parts are kept here and
/// a new form is produced for each attempt.
#[derive(Debug, Clone, Default)]
pub struct MultipartBody {
    parts: Vec<MultipartPart>,
}

impl MultipartBody {
    /// Creates an empty form
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a text field
    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(MultipartPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Adds a file field
    #[must_use]
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        self.parts.push(MultipartPart::File {
            name: name.into(),
            file_name: file_name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        });
        self
    }

    /// Number of fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// True when the form has no fields
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    fn to_form(&self) -> Result<reqwest::multipart::Form, MofuError> {
        let mut form = reqwest::multipart::Form::new();
        for part in &self.parts {
            form = match part {
                MultipartPart::Text { name, value } => form.text(name.clone(), value.clone()),
                MultipartPart::File {
                    name,
                    file_name,
                    mime,
                    bytes,
                } => {
                    let part = reqwest::multipart::Part::bytes(bytes.to_vec())
                        .file_name(file_name.clone())
                        .mime_str(mime)
                        .map_err(|e| MofuError::Config(format!("Invalid mime type {mime}: {e}")))?;
                    form.part(name.clone(), part)
                }
            };
        }
        Ok(form)
    }
}

/// Method, path, query and body of an API call
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: RequestBody,
}

impl ApiRequest {
    /// Creates a request with no query and no body
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    /// `GET path`
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST path`
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PUT path`
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// `PATCH path`
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// `DELETE path`
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Appends a single query parameter
    #[must_use]
    pub fn query_pair(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Appends the fields of a flat serializable struct as query parameters
    ///
    /// `null` fields are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if `query` does not serialize to a flat JSON object.
    pub fn with_query<Q: Serialize + ?Sized>(mut self, query: &Q) -> Result<Self, MofuError> {
        let value = serde_json::to_value(query).map_err(|e| MofuError::Serde(e.to_string()))?;
        let Value::Object(fields) = value else {
            return Err(MofuError::Serde("query must serialize to an object".into()));
        };
        for (key, value) in fields {
            let value = match value {
                Value::Null => continue,
                Value::String(s) => s,
                Value::Bool(_) | Value::Number(_) => value.to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(MofuError::Serde(format!("query field {key} is not a scalar")));
                }
            };
            self.query.push((key, value));
        }
        Ok(self)
    }

    /// Sets a JSON body
    ///
    /// # Errors
    ///
    /// Returns an error if `body` cannot be serialized.
    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, MofuError> {
        let value = serde_json::to_value(body).map_err(|e| MofuError::Serde(e.to_string()))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    /// Sets a multipart body
    #[must_use]
    pub fn with_multipart(mut self, form: MultipartBody) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    /// HTTP method
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Path relative to the configured base URL
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters added to the request
    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Request body
    #[must_use]
    pub const fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Builds the wire request, attaching `credential` as a bearer token when present
    pub(crate) fn build<C: Config>(
        &self,
        http: &reqwest::Client,
        config: &C,
        credential: &Credential,
    ) -> Result<reqwest::Request, MofuError> {
        let mut headers = config.headers()?;
        if let Some(token) = credential.expose() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| MofuError::Config("Invalid bearer token value".into()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let builder = http
            .request(self.method.clone(), config.url(&self.path))
            .query(&config.query())
            .query(&self.query);

        let builder = match &self.body {
            RequestBody::Empty => builder.headers(headers),
            RequestBody::Json(value) => builder.headers(headers).json(value),
            RequestBody::Multipart(form) => {
                // reqwest sets the multipart boundary itself
                headers.remove(CONTENT_TYPE);
                builder.headers(headers).multipart(form.to_form()?)
            }
        };

        Ok(builder.build()?)
    }
}
