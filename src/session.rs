// MIT License - Copyright (c) 2026 Peter Wright
// Bearer-token session state

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};

use crate::constants::JSON_CONTENT_TYPE;
use crate::error::{Result, SectorError};

/// Token and derived request headers for one login.
///
/// Owned by [`SectorAlarmClient`](crate::SectorAlarmClient) and only written
/// through `&mut self`, so a token refresh can never race a request on the
/// same client.
#[derive(Debug, Default)]
pub struct Session {
    access_token: Option<String>,
    headers: HeaderMap,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Headers to attach to an authenticated request, or `None` before login.
    pub fn headers(&self) -> Option<&HeaderMap> {
        self.access_token.as_ref().map(|_| &self.headers)
    }

    /// Store a freshly issued token and rebuild the header set.
    pub fn authenticate(&mut self, token: &str) -> Result<()> {
        let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| SectorError::authentication("Token is not a valid header value"))?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_CONTENT_TYPE));

        self.headers = headers;
        self.access_token = Some(token.to_string());
        Ok(())
    }
}
