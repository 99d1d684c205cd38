//! In-memory transport for tests.

use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use playport_core::CancelFlag;

use crate::{error::FetchError, fetcher::AssetFetcher};

#[derive(Default)]
pub(crate) struct ScriptedFetcher {
    responses: HashMap<String, Result<Vec<u8>, u16>>,
    requests: Mutex<Vec<String>>,
    cancel_on_fetch: Option<CancelFlag>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(mut self, url: &str, body: &[u8]) -> Self {
        self.responses.insert(url.to_string(), Ok(body.to_vec()));
        self
    }

    pub fn status(mut self, url: &str, code: u16) -> Self {
        self.responses.insert(url.to_string(), Err(code));
        self
    }

    /// Trips `flag` as soon as any request is made.
    pub fn cancelling(mut self, flag: CancelFlag) -> Self {
        self.cancel_on_fetch = Some(flag);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        if let Some(flag) = &self.cancel_on_fetch {
            flag.cancel();
        }
        match self.responses.get(url) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(code)) => Err(FetchError::Status {
                code: *code,
                url: url.to_string(),
            }),
            None => Err(FetchError::Status {
                code: 404,
                url: url.to_string(),
            }),
        }
    }
}
