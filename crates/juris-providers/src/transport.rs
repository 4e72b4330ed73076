//! Production transport over reqwest.

use tracing::debug;

use juris_invoke::{KeyAuth, ProviderRequest, RawResponse, Transport};

/// Sends provider requests with a shared reqwest client. The credential
/// is attached per the request's `KeyAuth` and never logged.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl Transport for HttpTransport {
    async fn send(
        &self,
        request: &ProviderRequest,
        credential: &str,
    ) -> Result<RawResponse, String> {
        debug!("POST {}", request.url);

        let builder = match &request.auth {
            KeyAuth::QueryParam(name) => self
                .client
                .post(&request.url)
                .query(&[(name.as_str(), credential)]),
            KeyAuth::Header(name) => self.client.post(&request.url).header(name.as_str(), credential),
            KeyAuth::Bearer => self
                .client
                .post(&request.url)
                .header("Authorization", format!("Bearer {}", credential)),
        };

        let response = builder
            .header("Content-Type", "application/json")
            .json(&request.body)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| format!("body read failed: {}", e))?
            .to_vec();

        Ok(RawResponse { status, body })
    }
}
