use std::collections::BTreeMap;

use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Method,
};
use serde::Serialize;

use crate::{Result, SensorLinkError};

/// One logical API call fed into the request pipeline.
///
/// Resource modules build these; callers can also build them directly to
/// reach endpoints without a typed wrapper.
///
/// ```
/// use sensorlink_http::ApiRequest;
///
/// let request = ApiRequest::get("sensors.get", "sensors/123").route("sensors/:id");
/// assert_eq!(request.endpoint(), "sensors/123");
/// ```
#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub(crate) operation: String,
    pub(crate) method: Method,
    pub(crate) endpoint: String,
    pub(crate) route: Option<String>,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<Vec<u8>>,
    pub(crate) attributes: BTreeMap<String, String>,
}

impl ApiRequest {
    /// Creates a request with an arbitrary method.
    pub fn new(method: Method, operation: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            method,
            endpoint: endpoint.into(),
            route: None,
            headers: HeaderMap::new(),
            body: None,
            attributes: BTreeMap::new(),
        }
    }

    /// `GET` request.
    pub fn get(operation: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, operation, endpoint)
    }

    /// `POST` request.
    pub fn post(operation: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, operation, endpoint)
    }

    /// `PUT` request.
    pub fn put(operation: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new(Method::PUT, operation, endpoint)
    }

    /// `PATCH` request.
    pub fn patch(operation: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new(Method::PATCH, operation, endpoint)
    }

    /// `DELETE` request.
    pub fn delete(operation: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new(Method::DELETE, operation, endpoint)
    }

    /// Sets the parameterized route reported to telemetry.
    pub fn route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    /// Serializes `body` as the JSON request body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        let bytes = serde_json::to_vec(body).map_err(|err| {
            SensorLinkError::Encode(format!(
                "could not serialize body for {}: {err}",
                self.operation
            ))
        })?;
        self.body = Some(bytes);
        Ok(self)
    }

    /// Adds a caller header. Repeating a name keeps every value; caller
    /// values replace the default of the same name.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| SensorLinkError::Config(format!("invalid header name '{name}': {err}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|err| SensorLinkError::Config(format!("invalid header value: {err}")))?;
        self.headers.append(name, value);
        Ok(self)
    }

    /// Attaches a free-form telemetry attribute.
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Logical operation name.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Concrete endpoint relative to the base URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }
}
