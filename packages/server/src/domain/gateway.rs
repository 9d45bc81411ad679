//! External identity/token gateway trait definition.
//!
//! Token issuance and verification live outside the relay; the core calls
//! the collaborator through this narrow interface only.

use async_trait::async_trait;

use super::entity::MediaCredential;
use super::error::GatewayError;
use super::value_object::IdentityId;

/// External auth/token collaborator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    /// Verify an identity token; `None` means the token was declined
    async fn verify_identity(&self, token: &str) -> Option<IdentityId>;

    /// Issue a media-session credential for `user_id`
    async fn issue_media_credential(&self, user_id: &str)
    -> Result<MediaCredential, GatewayError>;

    /// Whether credential issuance is configured (for the health endpoint)
    fn is_configured(&self) -> bool;
}
