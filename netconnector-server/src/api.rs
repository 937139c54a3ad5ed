//! `POST /connector/{ip}/{method}`.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use log::{debug, info, warn};
use netconnector::error::ErrorKind;
use netconnector::model::ConfigFile;
use netconnector::remote::{AuthSpec, ConnectionSpec, Method, MethodOutput, MethodParams, RemoteFactory};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use subtle::ConstantTimeEq;

pub const TOKEN_HEADER: &str = "Token";

#[derive(Clone)]
pub struct AppState {
    pub remote: Arc<RemoteFactory>,
    pub token: Arc<SecretString>,
}

/// Request body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConnectorRequest {
    connection: ConnectionSpec,
    auth: AuthSpec,
    params: MethodParams,
}

/// `{type, message}` error body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: ErrorKind,
    message: String,
}

impl ApiError {
    fn unauthorized(message: &str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            kind: ErrorKind::AuthenticationFailed,
            message: message.to_string(),
        }
    }

    fn device(kind: ErrorKind, message: String) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind,
            message,
        }
    }
}

impl From<netconnector::Error> for ApiError {
    fn from(err: netconnector::Error) -> Self {
        Self::device(err.kind(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "type": self.kind.as_str(),
            "message": self.message,
        });
        (self.status, axum::Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/connector/{ip}/{method}", post(connector))
        .with_state(state)
}

async fn connector(
    State(state): State<AppState>,
    Path((ip, method)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    check_token(&headers, &state.token)?;

    let method: Method = method.parse()?;
    let request: ConnectorRequest = if body.is_empty() {
        ConnectorRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::device(ErrorKind::InvalidRequest, format!("invalid request body: {e}")))?
    };

    debug!("{ip}: {method} requested");
    let credentials = request.auth.into_credentials();
    let output = state
        .remote
        .perform(&ip, &request.connection, &credentials, method, &request.params)
        .await
        .map_err(|e| {
            warn!("{ip}: {method} failed: {e}");
            ApiError::from(e)
        })?;
    info!("{ip}: {method} done");

    Ok(match output {
        MethodOutput::File(file) => file_response(file),
        other => axum::Json(serde_json::json!({ "data": other })).into_response(),
    })
}

fn check_token(headers: &HeaderMap, token: &SecretString) -> Result<(), ApiError> {
    let Some(given) = headers.get(TOKEN_HEADER) else {
        return Err(ApiError::unauthorized("missing Token header"));
    };
    let matches: bool = given.as_bytes().ct_eq(token.expose_secret().as_bytes()).into();
    if !matches {
        return Err(ApiError::unauthorized("invalid token"));
    }
    Ok(())
}

fn file_response(file: ConfigFile) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", file.filename.replace('"', ""));
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(file.content),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::http::Request;
    use netconnector::error::{Result, TransportError};
    use netconnector::model::Credentials;
    use netconnector::remote::{RemoteConfig, SessionConnector};
    use netconnector::snmp::{SnmpCollector, SnmpWalker, oids};
    use netconnector::{ConnectConfig, GenericDriver};
    use tower::ServiceExt;

    use super::*;

    /// Every device is unreachable.
    struct Unreachable;

    #[async_trait]
    impl SessionConnector for Unreachable {
        async fn open(
            &self,
            _address: &str,
            _config: &ConnectConfig,
            _credentials: &Credentials,
        ) -> Result<GenericDriver> {
            Err(TransportError::Timeout(std::time::Duration::from_secs(10)).into())
        }
    }

    struct OnePort;

    #[async_trait]
    impl SnmpWalker for OnePort {
        async fn walk(&self, _address: &str, _community: &str, oid: &str) -> Result<Vec<(u32, String)>> {
            let value = match oid {
                oids::IF_NAME | oids::IF_DESCR => "Gi0/1",
                oids::IF_ALIAS => "uplink",
                _ => "1",
            };
            Ok(vec![(1, value.to_string())])
        }
    }

    fn app() -> Router {
        let remote = RemoteFactory::new(Arc::new(Unreachable), RemoteConfig::default())
            .with_snmp(Arc::new(SnmpCollector::new(Arc::new(OnePort))));
        router(AppState {
            remote: Arc::new(remote),
            token: Arc::new(SecretString::from("s3cret".to_string())),
        })
    }

    fn request(uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(TOKEN_HEADER, token);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_token() {
        let response = app()
            .oneshot(request("/connector/10.0.0.1/getVlans", None, serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["type"], "AuthenticationFailed");
    }

    #[tokio::test]
    async fn test_wrong_token() {
        let response = app()
            .oneshot(request("/connector/10.0.0.1/getVlans", Some("guess"), serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_token_compares_whole_value() {
        for token in ["s3creT", "s3cre", "s3crets"] {
            let response = app()
                .oneshot(request("/connector/10.0.0.1/getVlans", Some(token), serde_json::json!({})))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{token}");
        }
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = app()
            .oneshot(request("/connector/10.0.0.1/formatFlash", Some("s3cret"), serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["type"], "InvalidRequest");
    }

    #[tokio::test]
    async fn test_unreachable_device() {
        let body = serde_json::json!({
            "connection": {"cmd_protocol": "telnet"},
            "auth": {"login": "admin", "password": ["one", "two"]},
            "params": {}
        });
        let response = app()
            .oneshot(request("/connector/10.0.0.1/getVlans", Some("s3cret"), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["type"], "ConnectionUnavailable");
        assert!(body["message"].as_str().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_snmp_interfaces() {
        let body = serde_json::json!({
            "connection": {"cmd_protocol": "telnet", "port_scan_protocol": "snmp", "snmp_community": "public"},
            "auth": {"login": "admin", "password": "secret"},
        });
        let response = app()
            .oneshot(request("/connector/10.0.0.1/getInterfaces", Some("s3cret"), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["data"][0]["name"], "Gi0/1");
        assert_eq!(body["data"][0]["status"], "up");
        assert_eq!(body["data"][0]["description"], "uplink");
    }

    #[tokio::test]
    async fn test_unsupported_method_is_empty_data() {
        let remote = RemoteFactory::new(Arc::new(Unreachable), RemoteConfig::default());
        let app = router(AppState {
            remote: Arc::new(remote),
            token: Arc::new(SecretString::from("s3cret".to_string())),
        });
        let body = serde_json::json!({
            "connection": {"cmd_protocol": "telnet", "port_scan_protocol": "snmp", "snmp_community": "public"},
            "auth": {"login": "admin", "password": "secret"},
        });
        let response = app
            .oneshot(request("/connector/10.0.0.1/getInterfaces", Some("s3cret"), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert!(body["data"].is_null());
    }

    #[test]
    fn test_file_response_headers() {
        let response = file_response(ConfigFile {
            filename: "10.0.0.1.cfg".into(),
            content: "hostname sw1\n".into(),
        });
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"10.0.0.1.cfg\""
        );
    }
}
