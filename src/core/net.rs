use serde::de::DeserializeOwned;

use crate::core::CcError;

/// Parse a JSON body into `T`, tagging parse failures with the endpoint name.
pub(crate) fn from_json<T: DeserializeOwned>(body: &str, what: &str) -> Result<T, CcError> {
    serde_json::from_str(body).map_err(|e| CcError::Data(format!("{what} json parse: {e}")))
}

/// Map a non-success response status to [`CcError::Status`].
pub(crate) fn check_status(resp: &reqwest::Response) -> Result<(), CcError> {
    if resp.status().is_success() {
        return Ok(());
    }
    Err(CcError::Status {
        status: resp.status().as_u16(),
        url: resp.url().to_string(),
    })
}
