//! Network round trips against a WFS endpoint.
//!
//! [`WfstService`] owns the endpoint URLs and headers and turns raw
//! transport results into the classified [`RemoteError`] buckets:
//! 2xx bodies pass through, 400 bodies are mined for their OWS
//! exception, the remaining statuses map onto their fixed categories.

use std::sync::Arc;

use geowfst_protocol::parse_exception_report;
use log::debug;
use url::Url;

use crate::error::{RemoteError, Result, WfstError};
use crate::transport::{HttpMethod, HttpRequest, Transport};

/// Accept / Content-Type value for every WFS request.
const XML_MIME: &str = "text/xml";

/// Endpoint configuration shared by all requests of one service.
#[derive(Clone, Debug, Default)]
pub struct ServiceConfig {
    /// Base URL for GET requests (DescribeFeatureType).
    pub service_url: String,
    /// URL for POST bodies when it differs from `service_url`.
    pub post_service_url: Option<String>,
    /// Extra headers sent with every request.
    pub request_headers: Vec<(String, String)>,
    /// Whether ambient credentials travel with requests.
    pub credentials: bool,
}

/// Handles all WFS network operations for one endpoint.
pub struct WfstService {
    config: ServiceConfig,
    get_url: Url,
    post_url: Url,
    transport: Arc<dyn Transport>,
}

impl WfstService {
    /// Validates the configured URLs and binds the transport.
    ///
    /// # Errors
    ///
    /// Returns [`WfstError::InvalidUrl`] when either URL does not parse.
    pub fn new(config: ServiceConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let get_url = parse_url(&config.service_url)?;
        let post_url = match &config.post_service_url {
            Some(url) => parse_url(url)?,
            None => get_url.clone(),
        };
        Ok(Self {
            config,
            get_url,
            post_url,
            transport,
        })
    }

    /// Sends a DescribeFeatureType request and returns the schema body.
    ///
    /// # Errors
    ///
    /// Returns the classified [`RemoteError`] for non-2xx statuses and
    /// transport failures.
    pub async fn describe_feature_type(
        &self,
        type_name: &str,
        version: &str,
    ) -> std::result::Result<String, RemoteError> {
        let mut url = self.get_url.clone();
        url.query_pairs_mut()
            .append_pair("REQUEST", "DescribeFeatureType")
            .append_pair("SERVICE", "WFS")
            .append_pair("VERSION", version)
            .append_pair("typeNames", type_name);
        debug!("DescribeFeatureType: {url}");

        let request = HttpRequest {
            url: url.to_string(),
            method: HttpMethod::Get,
            body: None,
            headers: self.headers(false),
            credentials: self.config.credentials,
        };
        self.send(request).await
    }

    /// POSTs a WFS-T request document and returns the response body.
    ///
    /// Queries ride this channel too; the endpoint answers GetFeature
    /// documents on the same POST URL as transactions.
    ///
    /// # Errors
    ///
    /// Returns the classified [`RemoteError`] for non-2xx statuses and
    /// transport failures.
    pub async fn transaction(&self, body: String) -> std::result::Result<String, RemoteError> {
        debug!("POST {} ({} bytes)", self.post_url, body.len());
        let request = HttpRequest {
            url: self.post_url.to_string(),
            method: HttpMethod::Post,
            body: Some(body),
            headers: self.headers(true),
            credentials: self.config.credentials,
        };
        self.send(request).await
    }

    async fn send(&self, request: HttpRequest) -> std::result::Result<String, RemoteError> {
        let response = self
            .transport
            .send(request)
            .await
            .map_err(|err| RemoteError::Transport {
                message: err.message,
            })?;
        if response.is_success() {
            return Ok(response.body);
        }
        Err(classify_status(response.status, &response.body))
    }

    fn headers(&self, with_content_type: bool) -> Vec<(String, String)> {
        let mut headers = self.config.request_headers.clone();
        headers.push(("Accept".to_string(), XML_MIME.to_string()));
        if with_content_type {
            headers.push(("Content-Type".to_string(), XML_MIME.to_string()));
        }
        headers
    }
}

/// Maps a non-2xx response onto its error bucket, reading the OWS
/// exception out of 400 bodies.
#[must_use]
pub fn classify_status(status: u16, body: &str) -> RemoteError {
    match status {
        400 => {
            let exception = parse_exception_report(body);
            RemoteError::Rejected {
                code: exception.code.unwrap_or_else(|| "Error 400".to_string()),
                text: exception.text.unwrap_or_else(|| "Bad Request".to_string()),
            }
        },
        401 => RemoteError::Unauthorized,
        500 => RemoteError::Server,
        status => RemoteError::Other { status },
    }
}

fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|err| WfstError::InvalidUrl {
        url: url.to_string(),
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;

    const EXCEPTION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ows:ExceptionReport xmlns:ows="http://www.opengis.net/ows/1.1" version="2.0.0">
  <ows:Exception exceptionCode="InvalidParameterValue" locator="typeName">
    <ows:ExceptionText>Unknown typeName: dummy:dummy</ows:ExceptionText>
  </ows:Exception>
</ows:ExceptionReport>"#;

    fn service(transport: Arc<MockTransport>) -> WfstService {
        let config = ServiceConfig {
            service_url: "http://example.com/geoserver/wfs".to_string(),
            post_service_url: None,
            request_headers: vec![("X-Token".to_string(), "abc".to_string())],
            credentials: true,
        };
        WfstService::new(config, transport).expect("valid config")
    }

    #[tokio::test]
    async fn describe_builds_the_query_string_and_headers() {
        let transport = MockTransport::new();
        transport.push_response(200, "<schema/>");
        let body = service(Arc::clone(&transport))
            .describe_feature_type("topp:states", "2.0.0")
            .await
            .expect("schema");
        assert_eq!(body, "<schema/>");

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, HttpMethod::Get);
        assert_eq!(
            requests[0].url,
            "http://example.com/geoserver/wfs?REQUEST=DescribeFeatureType&SERVICE=WFS&VERSION=2.0.0&typeNames=topp%3Astates"
        );
        assert!(requests[0].body.is_none());
        assert!(requests[0].credentials);
        let headers = &requests[0].headers;
        assert!(headers.contains(&("X-Token".to_string(), "abc".to_string())));
        assert!(headers.contains(&("Accept".to_string(), "text/xml".to_string())));
        assert!(!headers.iter().any(|(name, _)| name == "Content-Type"));
    }

    #[tokio::test]
    async fn transactions_post_xml_to_the_post_url() {
        let transport = MockTransport::new();
        transport.push_response(200, "<ok/>");
        let config = ServiceConfig {
            service_url: "http://example.com/geoserver/wfs".to_string(),
            post_service_url: Some("http://example.com/geoserver/post".to_string()),
            request_headers: Vec::new(),
            credentials: false,
        };
        let service = WfstService::new(config, Arc::clone(&transport) as Arc<dyn Transport>)
            .expect("valid config");
        service
            .transaction("<wfs:Transaction/>".to_string())
            .await
            .expect("response");

        let requests = transport.requests();
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert_eq!(requests[0].url, "http://example.com/geoserver/post");
        assert_eq!(requests[0].body.as_deref(), Some("<wfs:Transaction/>"));
        assert!(
            requests[0]
                .headers
                .contains(&("Content-Type".to_string(), "text/xml".to_string()))
        );
    }

    #[tokio::test]
    async fn a_400_body_surfaces_its_exception() {
        let transport = MockTransport::new();
        transport.push_response(400, EXCEPTION);
        let err = service(transport)
            .transaction("<bad/>".to_string())
            .await
            .expect_err("rejection");
        match err {
            RemoteError::Rejected { code, text } => {
                assert_eq!(code, "InvalidParameterValue");
                assert_eq!(text, "Unknown typeName: dummy:dummy");
            },
            other => panic!("expected a rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn a_bare_400_falls_back_to_the_generic_wording() {
        let transport = MockTransport::new();
        transport.push_response(400, "not xml at all");
        let err = service(transport)
            .transaction("<bad/>".to_string())
            .await
            .expect_err("rejection");
        assert_eq!(err.to_string(), "Error 400: Bad Request");
    }

    #[tokio::test]
    async fn statuses_map_to_their_buckets() {
        assert!(matches!(
            classify_status(401, ""),
            RemoteError::Unauthorized
        ));
        assert!(matches!(classify_status(500, ""), RemoteError::Server));
        assert!(matches!(
            classify_status(404, ""),
            RemoteError::Other { status: 404 }
        ));
    }

    #[tokio::test]
    async fn transport_failures_keep_their_message() {
        let transport = MockTransport::new();
        transport.push_failure("connection refused");
        let err = service(transport)
            .transaction("<doc/>".to_string())
            .await
            .expect_err("failure");
        match err {
            RemoteError::Transport { message } => assert_eq!(message, "connection refused"),
            other => panic!("expected a transport failure, got {other:?}"),
        }
    }

    #[test]
    fn an_unparsable_url_is_rejected_up_front() {
        let config = ServiceConfig {
            service_url: "not a url".to_string(),
            ..ServiceConfig::default()
        };
        let err = WfstService::new(config, MockTransport::new()).err();
        assert!(matches!(err, Some(WfstError::InvalidUrl { .. })));
    }
}
