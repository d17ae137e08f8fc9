use anyhow::{Context, Result};
use reqwest::blocking::Client;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::collect::global_variables::{BC_OWS_URL, FUEL_TYPE_LAYER};
use crate::error::FuelTypesError;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// WFS GetFeature query: a base endpoint and an ordered list of parameters
///
/// Parameters are joined as `key=value` pairs without escaping, so values
/// must already be safe to place in a query string.
#[derive(Debug, Clone, PartialEq)]
pub struct WfsQuery {
    pub base_url: String,
    pub params: Vec<(String, String)>,
}

impl WfsQuery {
    /// GetFeature request for `type_name`, returned as GeoJSON
    pub fn new(base_url: &str, type_name: &str) -> Self {
        let params = [
            ("service", "WFS"),
            ("version", "2.0.0"),
            ("request", "GetFeature"),
            ("typeName", type_name),
            ("outputFormat", "application/json"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        WfsQuery {
            base_url: base_url.to_string(),
            params,
        }
    }

    /// The BC fire fuel types layer on the BC OWS endpoint
    pub fn fuel_types() -> Self {
        WfsQuery::new(BC_OWS_URL, FUEL_TYPE_LAYER)
    }

    pub fn with_param(mut self, key: &str, value: &str) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    /// Limit the number of returned features (WFS 2.0 `count`)
    pub fn with_count(self, count: u64) -> Self {
        self.with_param("count", &count.to_string())
    }

    /// GeoServer vendor filter; the expression is percent-encoded
    pub fn with_cql_filter(self, cql_filter: &str) -> Self {
        let encoded = urlencoding::encode(cql_filter).into_owned();
        self.with_param("CQL_FILTER", &encoded)
    }

    pub fn get_param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn to_url(&self) -> String {
        let param_string = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.base_url, param_string)
    }
}

/// Something that yields the raw bytes of a GeoJSON feature collection
pub trait FeatureSource {
    /// Label printed in front of `location()`
    fn kind(&self) -> &'static str {
        "URL"
    }

    /// Where the data comes from, for progress output
    fn location(&self) -> String;

    fn fetch(&mut self) -> Result<Vec<u8>>;
}

/// Blocking WFS client for a single GetFeature request
pub struct WfsCollect {
    pub query: WfsQuery,
    pub content: Option<Vec<u8>>,
    /// `None` waits for the server indefinitely
    pub timeout: Option<Duration>,
}

impl WfsCollect {
    pub fn new(query: WfsQuery) -> Self {
        WfsCollect {
            query,
            content: None,
            timeout: None,
        }
    }

    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    /// Send the GetFeature request and keep the response body in `content`
    pub fn execute(&mut self) -> Result<()> {
        let request_url = self.query.to_url();
        log::debug!("Request URL WFS: {}", request_url);

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let response = client
            .get(&request_url)
            .send()
            .with_context(|| format!("Failed to send WFS request to {}", self.query.base_url))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(FuelTypesError::HttpStatus { status, body }.into());
        }

        let content_bytes = response
            .bytes()
            .context("Failed to read WFS response body")?
            .to_vec();
        log::debug!("Received {} bytes", content_bytes.len());

        if let Some(text) = service_exception_text(&content_bytes) {
            return Err(FuelTypesError::ServiceException(text).into());
        }

        self.content = Some(content_bytes);
        Ok(())
    }
}

impl FeatureSource for WfsCollect {
    fn location(&self) -> String {
        self.query.to_url()
    }

    fn fetch(&mut self) -> Result<Vec<u8>> {
        self.execute()?;
        self.content
            .take()
            .context("No content received from WFS service")
    }
}

/// GeoJSON file already on disk, e.g. a saved GetFeature response
pub struct FileCollect {
    pub path: PathBuf,
}

impl FileCollect {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileCollect { path: path.into() }
    }
}

impl FeatureSource for FileCollect {
    fn kind(&self) -> &'static str {
        "File"
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&mut self) -> Result<Vec<u8>> {
        fs::read(&self.path).with_context(|| format!("Failed to read {}", self.path.display()))
    }
}

/// Extract the message of an OGC exception report
///
/// GeoServer answers unknown layers or bad parameters with HTTP 200 and an
/// XML `ExceptionReport`, so a body starting with `<` is never features.
pub fn service_exception_text(body: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim_start();
    if !trimmed.starts_with('<') {
        return None;
    }

    let message = trimmed
        .find("ExceptionText>")
        .and_then(|start| {
            let rest = &trimmed[start + "ExceptionText>".len()..];
            rest.find("</").map(|end| rest[..end].trim().to_string())
        })
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| trimmed.chars().take(500).collect());

    Some(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuel_types_url() {
        let query = WfsQuery::fuel_types();
        assert_eq!(
            query.to_url(),
            "https://openmaps.gov.bc.ca/geo/pub/ows?service=WFS&version=2.0.0&request=GetFeature\
             &typeName=pub:WHSE_LAND_AND_NATURAL_RESOURCE.PROT_FUEL_TYPE_SP\
             &outputFormat=application/json"
        );
    }

    #[test]
    fn test_param_order_and_lookup() {
        let query = WfsQuery::new("http://localhost/ows", "pub:LAYER").with_count(10);
        let keys: Vec<&str> = query.params.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec!["service", "version", "request", "typeName", "outputFormat", "count"]
        );
        assert_eq!(query.get_param("typeName"), Some("pub:LAYER"));
        assert_eq!(query.get_param("count"), Some("10"));
        assert_eq!(query.get_param("bbox"), None);
    }

    #[test]
    fn test_cql_filter_is_encoded() {
        let query = WfsQuery::fuel_types().with_cql_filter("FUEL_TYPE_CD='M-1'");
        assert_eq!(query.get_param("CQL_FILTER"), Some("FUEL_TYPE_CD%3D%27M-1%27"));
        assert!(query.to_url().ends_with("&CQL_FILTER=FUEL_TYPE_CD%3D%27M-1%27"));
    }

    #[test]
    fn test_service_exception_text() {
        let body = br#"<?xml version="1.0" encoding="UTF-8"?>
<ows:ExceptionReport xmlns:ows="http://www.opengis.net/ows/1.1" version="2.0.0">
  <ows:Exception exceptionCode="InvalidParameterValue" locator="typeName">
    <ows:ExceptionText>Feature type pub:NOPE unknown</ows:ExceptionText>
  </ows:Exception>
</ows:ExceptionReport>"#;
        assert_eq!(
            service_exception_text(body).as_deref(),
            Some("Feature type pub:NOPE unknown")
        );
        assert_eq!(service_exception_text(br#"{"type":"FeatureCollection"}"#), None);
    }

    #[test]
    fn test_file_collect_missing_file() {
        let mut source = FileCollect::new("does/not/exist.geojson");
        assert!(source.fetch().is_err());
        assert_eq!(source.location(), "does/not/exist.geojson");
    }
}
