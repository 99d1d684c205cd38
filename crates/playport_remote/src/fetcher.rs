use std::{io::Read, sync::LazyLock};

use async_trait::async_trait;
use playport_core::AssetId;
use regex::Regex;

use crate::{config::RemoteConfig, error::FetchError};

/// HTTP transport seam. The scheduler only ever sees bytes or a [`FetchError`].
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Blocking `ureq` agent driven from the I/O runtime's blocking pool.
#[derive(Clone)]
pub struct UreqFetcher {
    agent: ureq::Agent,
    token: String,
}

impl UreqFetcher {
    pub fn new(config: &RemoteConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self {
            agent,
            token: config.token.clone(),
        }
    }

    fn get_blocking(agent: &ureq::Agent, token: &str, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = agent
            .get(url)
            .set("Authorization", &format!("Bearer {}", token))
            .call()
            .map_err(|e| convert_error(e, url))?;

        let mut bytes = Vec::new();
        response.into_reader().read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

fn convert_error(e: ureq::Error, url: &str) -> FetchError {
    match e {
        ureq::Error::Status(code, _) => FetchError::Status {
            code,
            url: url.to_string(),
        },
        other => FetchError::Transport {
            url: url.to_string(),
            message: other.to_string(),
        },
    }
}

#[async_trait]
impl AssetFetcher for UreqFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let agent = self.agent.clone();
        let token = self.token.clone();
        let url = url.to_string();

        log::debug!("GET {}", url);
        tokio::task::spawn_blocking(move || Self::get_blocking(&agent, &token, &url)).await?
    }
}

static ASSET_FILE_URL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)^(.*/api/assets/)\d+(/file/.+?)\.glb(.*)$").ok());

/// URL of the original source file behind a converted `.glb`: the asset ID is
/// swapped for `source_id` and the extension for `.fbx`. `None` when nothing changes.
pub fn alternate_source_url(url: &str, source_id: AssetId) -> Option<String> {
    if source_id == 0 || !url.to_ascii_lowercase().contains(".glb") {
        return None;
    }
    let pattern = ASSET_FILE_URL.as_ref()?;
    let alternate = pattern
        .replace(url, format!("${{1}}{}${{2}}.fbx${{3}}", source_id).as_str())
        .into_owned();
    (alternate != url).then_some(alternate)
}
