//! Wire types consumed from the parent OIDC flow.

use identity_broker_core::{BrokerResult, TokenGrant};
use serde::{Deserialize, Serialize};

/// Token-exchange request parameter naming the issuer whose token is being
/// presented.
pub const SUBJECT_ISSUER: &str = "subject_issuer";

/// Token endpoint response produced by the parent flow's code exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: Option<u64>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
}

impl TokenResponse {
    /// Packages this response as the grant consumed by identity resolution,
    /// keeping the full response verbatim for the identity's context bag.
    /// `validated_id_token` is the decoded ID token the parent flow already
    /// verified, when one was issued.
    pub fn into_grant(self, validated_id_token: Option<serde_json::Value>) -> BrokerResult<TokenGrant> {
        let token_response = serde_json::to_value(&self)?;
        Ok(TokenGrant {
            access_token: self.access_token,
            token_response: Some(token_response),
            id_token: validated_id_token,
        })
    }
}
