//! UseCase: メディアクレデンシャル発行処理

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{GatewayError, IdentityGateway, MediaCredential};

/// メディアクレデンシャル発行のユースケース
pub struct IssueMediaCredentialUseCase {
    gateway: Arc<dyn IdentityGateway>,
}

impl IssueMediaCredentialUseCase {
    pub fn new(gateway: Arc<dyn IdentityGateway>) -> Self {
        Self { gateway }
    }

    /// クレデンシャルを発行する
    ///
    /// # Arguments
    ///
    /// * `user_id` - 省略時はランダムなユーザー id を生成する
    pub async fn execute(
        &self,
        user_id: Option<String>,
    ) -> Result<MediaCredential, GatewayError> {
        let user_id = user_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("user_{}", Uuid::new_v4().simple()));

        self.gateway.issue_media_credential(&user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::gateway::MockIdentityGateway;

    #[tokio::test]
    async fn test_issue_with_explicit_user_id() {
        // テスト項目: 指定したユーザー id でクレデンシャルが発行される
        // given (前提条件):
        let mut gateway = MockIdentityGateway::new();
        gateway
            .expect_issue_media_credential()
            .withf(|user_id| user_id == "alice")
            .returning(|user_id| {
                Ok(MediaCredential {
                    app_id: "1".to_string(),
                    user_id: user_id.to_string(),
                    signature: "sig".to_string(),
                    expires_in: 3600,
                })
            });
        let usecase = IssueMediaCredentialUseCase::new(Arc::new(gateway));

        // when (操作):
        let credential = usecase.execute(Some("alice".to_string())).await.unwrap();

        // then (期待する結果):
        assert_eq!(credential.user_id, "alice");
    }

    #[tokio::test]
    async fn test_issue_without_user_id_generates_one() {
        // テスト項目: ユーザー id 省略時に user_ プレフィックスの id が生成される
        // given (前提条件):
        let mut gateway = MockIdentityGateway::new();
        gateway
            .expect_issue_media_credential()
            .withf(|user_id| user_id.starts_with("user_"))
            .returning(|user_id| {
                Ok(MediaCredential {
                    app_id: "1".to_string(),
                    user_id: user_id.to_string(),
                    signature: "sig".to_string(),
                    expires_in: 3600,
                })
            });
        let usecase = IssueMediaCredentialUseCase::new(Arc::new(gateway));

        // when (操作):
        let credential = usecase.execute(None).await.unwrap();

        // then (期待する結果):
        assert!(credential.user_id.starts_with("user_"));
    }

    #[tokio::test]
    async fn test_unconfigured_gateway_error_is_propagated() {
        // テスト項目: 未設定ゲートウェイのエラーがそのまま返る
        // given (前提条件):
        let mut gateway = MockIdentityGateway::new();
        gateway
            .expect_issue_media_credential()
            .returning(|_| Err(GatewayError::NotConfigured));
        let usecase = IssueMediaCredentialUseCase::new(Arc::new(gateway));

        // when (操作):
        let result = usecase.execute(None).await;

        // then (期待する結果):
        assert_eq!(result, Err(GatewayError::NotConfigured));
    }
}
