//! HMAC-SHA256 backed identity/credential gateway.
//!
//! Mirrors the credential format of the upstream media SDK: the signature
//! is an HMAC-SHA256 over `TLS.*` content lines, base64-encoded, and the
//! credential string is `"{issued}:{expiry}:{signature}"`. Identity tokens
//! are credentials presented back with the user id prepended
//! (`"{user_id}:{issued}:{expiry}:{signature}"`).

use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use hiroba_shared::time::Clock;

use crate::domain::{GatewayError, IdentityGateway, IdentityId, MediaCredential};

type HmacSha256 = Hmac<Sha256>;

/// Media gateway configuration, read from the environment by the binary
#[derive(Debug, Clone, Default)]
pub struct MediaGatewayConfig {
    pub app_id: Option<String>,
    pub secret: Option<String>,
    /// Credential lifetime in seconds (default 24h)
    pub expire_secs: u64,
}

impl MediaGatewayConfig {
    pub const DEFAULT_EXPIRE_SECS: u64 = 86_400;

    /// Read `HIROBA_MEDIA_APP_ID` / `HIROBA_MEDIA_SECRET` from the environment
    pub fn from_env() -> Self {
        Self {
            app_id: std::env::var("HIROBA_MEDIA_APP_ID").ok().filter(|v| !v.is_empty()),
            secret: std::env::var("HIROBA_MEDIA_SECRET").ok().filter(|v| !v.is_empty()),
            expire_secs: Self::DEFAULT_EXPIRE_SECS,
        }
    }
}

/// HMAC-SHA256 credential issuer and verifier
pub struct HmacMediaGateway {
    config: MediaGatewayConfig,
    clock: Arc<dyn Clock>,
}

impl HmacMediaGateway {
    pub fn new(config: MediaGatewayConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.config.app_id, &self.config.secret) {
            (Some(app_id), Some(secret)) => Some((app_id, secret)),
            _ => None,
        }
    }

    /// Content lines covered by the signature
    fn content_to_sign(user_id: &str, app_id: &str, issued: i64, expiry: i64) -> String {
        format!(
            "TLS.identifier:{user_id}\nTLS.sdkappid:{app_id}\nTLS.time:{issued}\nTLS.expire:{expiry}\n"
        )
    }

    fn sign(secret: &str, content: &str) -> Result<String, GatewayError> {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| GatewayError::SigningFailed(e.to_string()))?;
        mac.update(content.as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }
}

#[async_trait]
impl IdentityGateway for HmacMediaGateway {
    async fn verify_identity(&self, token: &str) -> Option<IdentityId> {
        let (app_id, secret) = self.credentials()?;

        // Token layout: "{user_id}:{issued}:{expiry}:{signature}". The user
        // id may itself contain ':', so split from the right.
        let mut parts = token.rsplitn(4, ':');
        let signature = parts.next()?;
        let expiry: i64 = parts.next()?.parse().ok()?;
        let issued: i64 = parts.next()?.parse().ok()?;
        let user_id = parts.next()?;
        if user_id.is_empty() {
            return None;
        }

        let now_secs = self.clock.now_millis() / 1000;
        if expiry <= now_secs {
            tracing::debug!("Identity token expired (expiry: {})", expiry);
            return None;
        }

        let content = Self::content_to_sign(user_id, app_id, issued, expiry);
        let expected = Self::sign(secret, &content).ok()?;
        if expected != signature {
            tracing::debug!("Identity token signature mismatch for '{}'", user_id);
            return None;
        }

        IdentityId::new(user_id.to_string()).ok()
    }

    async fn issue_media_credential(
        &self,
        user_id: &str,
    ) -> Result<MediaCredential, GatewayError> {
        let (app_id, secret) = self.credentials().ok_or(GatewayError::NotConfigured)?;

        let issued = self.clock.now_millis() / 1000;
        let expiry = issued + self.config.expire_secs as i64;
        let content = Self::content_to_sign(user_id, app_id, issued, expiry);
        let signature = Self::sign(secret, &content)?;

        Ok(MediaCredential {
            app_id: app_id.to_string(),
            user_id: user_id.to_string(),
            signature: format!("{issued}:{expiry}:{signature}"),
            expires_in: self.config.expire_secs,
        })
    }

    fn is_configured(&self) -> bool {
        self.credentials().is_some()
    }
}
