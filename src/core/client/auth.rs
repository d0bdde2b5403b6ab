//! API-key to access-token exchange.

use serde::{Deserialize, Serialize};

use crate::core::error::CcError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest<'a> {
    api_key: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: String,
}

impl super::CcClient {
    pub(crate) async fn ensure_credentials(&self) -> Result<(), CcError> {
        // Fast path: check for an existing token with a read lock.
        if self.state.read().await.access_token.is_some() {
            return Ok(());
        }

        // Slow path: acquire the dedicated fetch lock so only one task proceeds.
        let _guard = self.credential_fetch_lock.lock().await;

        // Double-check: another task might have fetched a token while this one waited.
        if self.state.read().await.access_token.is_some() {
            return Ok(());
        }

        self.fetch_token().await
    }

    pub(crate) async fn clear_access_token(&self) {
        let mut state = self.state.write().await;
        state.access_token = None;
    }

    pub(crate) async fn access_token(&self) -> Option<String> {
        let state = self.state.read().await;
        state.access_token.clone()
    }

    async fn fetch_token(&self) -> Result<(), CcError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| CcError::Auth("no API key configured".into()))?;

        let req = self
            .http
            .post(self.token_url.clone())
            .json(&TokenRequest { api_key });
        let resp = self.send_with_retry(req, None).await?;

        if !resp.status().is_success() {
            return Err(CcError::Auth(format!(
                "token endpoint returned status {}",
                resp.status().as_u16()
            )));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| CcError::Auth(format!("invalid token response: {e}")))?;

        if token.access_token.is_empty() {
            return Err(CcError::Auth("received empty access token".into()));
        }

        self.state.write().await.access_token = Some(token.access_token);
        Ok(())
    }
}
