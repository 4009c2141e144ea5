//! GitLab provider configuration and endpoint derivation.

use serde::{Deserialize, Serialize};

const AUTH_RESOURCE: &str = "/oauth/authorize";
const TOKEN_RESOURCE: &str = "/oauth/token";
const PROFILE_RESOURCE: &str = "/api/v4/user";

const API_SCOPE: &str = "api";
const SCOPE_OPENID: &str = "openid";

/// Configuration for a single GitLab-compatible provider instance.
///
/// The three endpoint URLs and the effective scope are derived once at
/// construction and frozen; everything else is supplied by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitLabConfig {
    /// Base URL of the GitLab-compatible site, e.g. `https://gitlab.example.com`.
    pub site_url: String,
    /// Unique alias for this provider instance. Used as the issuer-matching
    /// key for token exchange and as the namespace prefix for broker user ids.
    pub alias: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: String,
    /// Scope requested from the authorization server.
    pub default_scope: String,
}

impl GitLabConfig {
    /// Derives the authorize/token/userinfo endpoints from `site_url` and
    /// augments a bare `openid` scope with GitLab's `api` scope, which the
    /// userinfo endpoint requires.
    pub fn new(
        site_url: impl Into<String>,
        alias: impl Into<String>,
        default_scope: impl Into<String>,
    ) -> Self {
        let site_url = site_url.into();
        let default_scope = default_scope.into();

        let default_scope = if default_scope == SCOPE_OPENID {
            format!("{} {}", API_SCOPE, default_scope).trim().to_string()
        } else {
            default_scope
        };

        Self {
            authorization_endpoint: format!("{}{}", site_url, AUTH_RESOURCE),
            token_endpoint: format!("{}{}", site_url, TOKEN_RESOURCE),
            userinfo_endpoint: format!("{}{}", site_url, PROFILE_RESOURCE),
            site_url,
            alias: alias.into(),
            default_scope,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_derivation() {
        let config = GitLabConfig::new("https://gitlab.example.com", "gitlab1", "openid");

        assert_eq!(
            config.authorization_endpoint,
            "https://gitlab.example.com/oauth/authorize"
        );
        assert_eq!(
            config.token_endpoint,
            "https://gitlab.example.com/oauth/token"
        );
        assert_eq!(
            config.userinfo_endpoint,
            "https://gitlab.example.com/api/v4/user"
        );
    }

    #[test]
    fn test_endpoints_are_valid_urls() {
        let config = GitLabConfig::new("https://gitlab.example.com", "gitlab1", "openid");

        let url = url::Url::parse(&config.userinfo_endpoint).unwrap();
        assert_eq!(url.host_str(), Some("gitlab.example.com"));
        assert_eq!(url.path(), "/api/v4/user");
    }

    #[test]
    fn test_bare_openid_scope_gains_api_scope() {
        let config = GitLabConfig::new("https://gitlab.example.com", "gitlab1", "openid");
        assert_eq!(config.default_scope, "api openid");
    }

    #[test]
    fn test_compound_scope_left_untouched() {
        let config = GitLabConfig::new("https://gitlab.example.com", "gitlab1", "openid profile");
        assert_eq!(config.default_scope, "openid profile");
    }

    #[test]
    fn test_custom_scope_left_untouched() {
        let config = GitLabConfig::new("https://gitlab.example.com", "gitlab1", "custom");
        assert_eq!(config.default_scope, "custom");
    }
}
