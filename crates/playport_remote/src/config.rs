use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://playcanvas.com";
pub const DEFAULT_MAX_CONCURRENT: usize = 5;
pub const DEFAULT_PAGE_SIZE: usize = 10_000;

/// Everything needed to talk to the remote project.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    pub project_id: String,
    pub branch_id: String,
    pub token: String,
    pub max_concurrent: usize,
    pub page_size: usize,
    pub timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id: String::new(),
            branch_id: String::new(),
            token: String::new(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            page_size: DEFAULT_PAGE_SIZE,
            timeout: Duration::from_secs(60),
        }
    }
}

impl RemoteConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        if self.project_id.trim().is_empty() {
            return Err(ConfigError::MissingProjectId);
        }
        if self.branch_id.trim().is_empty() {
            return Err(ConfigError::MissingBranchId);
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(self.base_url.clone()));
        }
        if self.max_concurrent == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }

    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Makes a possibly relative asset URL absolute on the API host and
    /// attaches the branch when the URL does not carry one.
    pub fn resolve_url(&self, url: &str) -> String {
        let mut resolved = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if url.starts_with('/') {
            format!("{}{}", self.base(), url)
        } else {
            format!("{}/{}", self.base(), url)
        };

        if !self.branch_id.is_empty() && !resolved.contains("branchId=") {
            let separator = if resolved.contains('?') { '&' } else { '?' };
            resolved.push(separator);
            resolved.push_str("branchId=");
            resolved.push_str(&urlencoding::encode(&self.branch_id));
        }
        resolved
    }

    pub fn listing_url(&self, skip: usize) -> String {
        format!(
            "{}/api/projects/{}/assets?branchId={}&skip={}&limit={}",
            self.base(),
            urlencoding::encode(&self.project_id),
            urlencoding::encode(&self.branch_id),
            skip,
            self.page_size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RemoteConfig {
        RemoteConfig {
            project_id: "123".into(),
            branch_id: "main-branch".into(),
            token: "secret".into(),
            ..Default::default()
        }
    }

    #[test]
    fn validate_reports_first_missing_field() {
        assert_eq!(RemoteConfig::default().validate(), Err(ConfigError::MissingToken));

        let mut cfg = config();
        cfg.branch_id = " ".into();
        assert_eq!(cfg.validate(), Err(ConfigError::MissingBranchId));

        assert_eq!(config().validate(), Ok(()));
    }

    #[test]
    fn resolve_url_makes_relative_paths_absolute() {
        let cfg = config();
        assert_eq!(
            cfg.resolve_url("/api/assets/5/file/car.glb"),
            "https://playcanvas.com/api/assets/5/file/car.glb?branchId=main-branch"
        );
        assert_eq!(
            cfg.resolve_url("https://cdn.example.com/a.png?t=1"),
            "https://cdn.example.com/a.png?t=1&branchId=main-branch"
        );
        assert_eq!(
            cfg.resolve_url("/api/assets/5/file/a.png?branchId=other"),
            "https://playcanvas.com/api/assets/5/file/a.png?branchId=other"
        );
    }

    #[test]
    fn listing_url_pages() {
        let mut cfg = config();
        cfg.page_size = 50;
        assert_eq!(
            cfg.listing_url(100),
            "https://playcanvas.com/api/projects/123/assets?branchId=main-branch&skip=100&limit=50"
        );
    }
}
