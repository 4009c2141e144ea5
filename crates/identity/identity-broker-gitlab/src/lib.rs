//! GitLab-compatible external identity provider.
//!
//! Authenticates a user against a GitLab-compatible authorization server and
//! converts its profile/token responses into the canonical identity record
//! defined by identity-broker-core. The authorization-code flow itself
//! (redirects, state, code exchange) belongs to the parent OIDC broker; this
//! crate covers endpoint derivation from a site URL, the retrying userinfo
//! fetch, profile normalization and validate-only token exchange.

mod client;
mod config;
mod provider;
mod types;


pub use client::{ProfileClient, RETRY_DELAY, USERINFO_ATTEMPTS};
pub use config::GitLabConfig;
pub use provider::GitLabIdentityProvider;
pub use types::{SUBJECT_ISSUER, TokenResponse};

// Re-export common types for convenience
pub use identity_broker_core::{
    BrokerError, BrokerResult, BrokeredIdentity, ExternalIdentityProvider, IdentityContext,
    TokenGrant,
};
