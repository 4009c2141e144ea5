//! GitLab identity provider implementation.

use crate::client::ProfileClient;
use crate::config::GitLabConfig;
use crate::types::SUBJECT_ISSUER;
use async_trait::async_trait;
use identity_broker_core::{
    BrokerError, BrokerResult, BrokeredIdentity, ExternalIdentityProvider, IdentityContext,
    TokenGrant,
};
use std::collections::HashMap;
use tracing::info;

/// External identity provider for GitLab-compatible authorization servers.
pub struct GitLabIdentityProvider {
    config: GitLabConfig,
    client: ProfileClient,
}

impl GitLabIdentityProvider {
    pub fn new(config: GitLabConfig) -> Self {
        Self {
            config,
            client: ProfileClient::new(),
        }
    }

    /// Builds a provider around a pre-configured client, e.g. one with test
    /// retry knobs or an overall deadline.
    pub fn with_client(config: GitLabConfig, client: ProfileClient) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &GitLabConfig {
        &self.config
    }

    /// Reads a profile field as a string, coercing JSON numbers; anything
    /// else (including null) counts as absent.
    fn json_str(profile: &serde_json::Value, key: &str) -> Option<String> {
        match profile.get(key) {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Pre-checks the `id` claim before handing the profile to the
    /// normalizer. The normalizer re-checks it; both paths must fail with the
    /// same error kind.
    pub fn extract_identity_from_profile(
        &self,
        profile: &serde_json::Value,
    ) -> BrokerResult<BrokeredIdentity> {
        if Self::json_str(profile, "id").is_none() {
            return Err(BrokerError::InvalidProfile(
                "id claim is null from user info json".to_string(),
            ));
        }
        self.identity_from_profile(profile)
    }

    fn identity_from_profile(
        &self,
        profile: &serde_json::Value,
    ) -> BrokerResult<BrokeredIdentity> {
        let id = Self::json_str(profile, "id").ok_or_else(|| {
            BrokerError::InvalidProfile("id claim missing from user profile".to_string())
        })?;

        let name = Self::json_str(profile, "name");
        let username = Self::json_str(profile, "username");
        let email = Self::json_str(profile, "email");

        // username, then email, then id; step 1 guarantees id is present
        let username = username
            .or_else(|| email.clone())
            .unwrap_or_else(|| id.clone());

        let alias = &self.config.alias;
        Ok(BrokeredIdentity {
            provider_alias: alias.clone(),
            broker_user_id: format!("{}.{}", alias, id),
            external_id: id,
            username,
            display_name: name,
            email,
            profile_snapshot: profile.clone(),
            context: IdentityContext::default(),
        })
    }
}

#[async_trait]
impl ExternalIdentityProvider for GitLabIdentityProvider {
    fn alias(&self) -> &str {
        &self.config.alias
    }

    fn is_issuer(&self, issuer: &str, params: &HashMap<String, String>) -> bool {
        let requested = params
            .get(SUBJECT_ISSUER)
            .map(String::as_str)
            .unwrap_or(issuer);
        requested == self.config.alias
    }

    async fn resolve_identity(&self, grant: &TokenGrant) -> BrokerResult<BrokeredIdentity> {
        let profile = self
            .client
            .fetch_profile(&self.config.userinfo_endpoint, &grant.access_token)
            .await?;

        let mut identity = self.extract_identity_from_profile(&profile)?;
        identity.context.federated_access_token_response = grant.token_response.clone();
        identity.context.validated_id_token = grant.id_token.clone();

        info!(
            alias = %self.config.alias,
            broker_user_id = %identity.broker_user_id,
            "resolved brokered identity"
        );
        Ok(identity)
    }

    async fn exchange_validate_only(&self, access_token: &str) -> BrokerResult<BrokeredIdentity> {
        let profile = self
            .client
            .fetch_profile(&self.config.userinfo_endpoint, access_token)
            .await?;
        self.extract_identity_from_profile(&profile)
    }
}
