//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use syncline_domain::SynclineError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub SynclineError);

impl From<InfraError> for SynclineError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SynclineError> for InfraError {
    fn from(value: SynclineError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoSynclineError {
    fn into_syncline(self) -> SynclineError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → SynclineError */
/* -------------------------------------------------------------------------- */

impl IntoSynclineError for HttpError {
    fn into_syncline(self) -> SynclineError {
        if self.is_timeout() {
            return SynclineError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return SynclineError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => SynclineError::Auth(message),
                404 => SynclineError::NotFound(message),
                429 => SynclineError::Network(message),
                400..=499 => SynclineError::InvalidInput(message),
                500..=599 => SynclineError::Network(message),
                _ => SynclineError::Network(message),
            };
        }

        SynclineError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_syncline())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use reqwest::{Client, StatusCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn http_status_401_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::UNAUTHORIZED))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped: SynclineError = InfraError::from(error).into();
        match mapped {
            SynclineError::Auth(msg) => assert!(msg.contains("401")),
            other => panic!("expected auth error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn http_status_404_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::NOT_FOUND))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped: SynclineError = InfraError::from(error).into();
        assert!(matches!(mapped, SynclineError::NotFound(_)));
    }

    #[tokio::test]
    async fn connection_refused_maps_to_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener); // release the port so the request fails with ECONNREFUSED

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(format!("http://{}", addr)).send().await.unwrap_err();

        let mapped: SynclineError = InfraError::from(error).into();
        assert!(matches!(mapped, SynclineError::Network(_)));
    }
}
