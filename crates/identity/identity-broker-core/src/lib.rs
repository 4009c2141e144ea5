//! Core identity-brokering traits and types.
//!
//! An identity broker authenticates a user against a third-party system and
//! translates the result into a local identity record. This crate defines the
//! capability interface providers implement and the canonical record they
//! produce; concrete providers (e.g. the GitLab provider) live in sibling
//! crates.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    /// Every userinfo attempt failed; carries the last HTTP status seen (absent
    /// if the upstream was never reached) and the last transport cause.
    #[error("user profile request failed (last status: {status:?})")]
    ProfileFetch {
        status: Option<u16>,
        cause: Option<String>,
    },

    /// The upstream returned 200 but the body was not valid structured content.
    #[error("user profile response is not valid JSON: {0}")]
    ProfileParse(String),

    /// The profile lacked a usable identifier; an invalid-token class error,
    /// distinguishable from transport failures.
    #[error("invalid user profile: {0}")]
    InvalidProfile(String),

    /// The calling context was torn down while the provider was still working.
    #[error("identity resolution cancelled: {0}")]
    Cancelled(String),

    #[error("invalid provider configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type BrokerResult<T> = Result<T, BrokerError>;

/// Token material handed over by the parent OIDC flow once the
/// authorization-code exchange has completed. The token response and ID token
/// are opaque to the broker core and stored verbatim on the identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub token_response: Option<serde_json::Value>,
    pub id_token: Option<serde_json::Value>,
}

/// Context attached to an identity right after creation. Only these two
/// entries are ever stored, so this is a struct rather than a generic map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityContext {
    pub federated_access_token_response: Option<serde_json::Value>,
    pub validated_id_token: Option<serde_json::Value>,
}

/// The canonical, provider-agnostic record of an authenticated external user.
///
/// Created once per successful authentication or exchange validation and
/// handed to the host for persistence; never mutated afterwards except for
/// context additions performed immediately after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokeredIdentity {
    /// Alias of the provider instance that produced this identity.
    pub provider_alias: String,
    /// Upstream identifier, exactly as the provider reported it.
    pub external_id: String,
    /// `alias + "." + external_id`, the host-side linking key.
    pub broker_user_id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    /// Verbatim copy of the upstream profile document, retained for
    /// downstream attribute mapping and tagged by `provider_alias`.
    pub profile_snapshot: serde_json::Value,
    pub context: IdentityContext,
}

#[async_trait]
pub trait ExternalIdentityProvider: Send + Sync {
    /// Configured alias naming this provider instance.
    fn alias(&self) -> &str;

    /// Whether a federated token-exchange request belongs to this provider.
    ///
    /// `issuer` is the fallback used when the request parameters carry no
    /// explicit `subject_issuer`. Matching is exact string equality against
    /// the configured alias.
    fn is_issuer(&self, issuer: &str, params: &HashMap<String, String>) -> bool;

    /// Resolve the canonical identity for a completed login.
    async fn resolve_identity(&self, grant: &TokenGrant) -> BrokerResult<BrokeredIdentity>;

    /// Validate an externally presented access token against the upstream
    /// server and resolve the identity it names. No new token is minted.
    async fn exchange_validate_only(&self, access_token: &str) -> BrokerResult<BrokeredIdentity>;
}
