use http::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::constants::http::{CONTENT_TYPE_JSON, USER_AGENT};
use crate::error::{FulcrumError, Result};

/// Authenticated JSON transport shared by the dispatch and improvements clients.
///
/// The whole exchange of every request, body included, is bounded by the
/// configured timeout. Any status outside 2xx is an error.
pub struct FulcrumHttpClient {
    client: Client,
    token: String,
}

impl FulcrumHttpClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client, token: config.token.clone() })
    }

    pub async fn post_json<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<()> {
        let body = serde_json::to_vec(body)?;
        self.execute(self.client.post(url).header(CONTENT_TYPE, CONTENT_TYPE_JSON).body(body))
            .await?;
        Ok(())
    }

    pub async fn patch_json<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<()> {
        let body = serde_json::to_vec(body)?;
        self.execute(self.client.patch(url).header(CONTENT_TYPE, CONTENT_TYPE_JSON).body(body))
            .await?;
        Ok(())
    }

    pub async fn delete(&self, url: &str, query: &[(&str, &str)]) -> Result<()> {
        self.execute(self.client.delete(url).query(query)).await?;
        Ok(())
    }

    pub async fn get_json<R: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<R> {
        let res = self.execute(self.client.get(url).query(query)).await?;
        let bytes = res.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let res = request.bearer_auth(&self.token).send().await?;

        let status = res.status();
        if !status.is_success() {
            return Err(FulcrumError::Http { status: status.as_u16() });
        }

        Ok(res)
    }
}

/// Append percent-encoded path segments to `base`.
pub fn join_url(base: &str, segments: &[&str]) -> Result<String> {
    let mut url = Url::parse(base).map_err(|e| FulcrumError::InvalidUrl(format!("{base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| FulcrumError::InvalidUrl(format!("{base} cannot be a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url.to_string())
}
