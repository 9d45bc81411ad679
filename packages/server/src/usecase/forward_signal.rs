//! UseCase: WebRTC シグナリング転送処理
//!
//! 転送はステートレスで、ペイロードを検査しない。宛先が存在しない場合は
//! 黙って破棄する。ピアの消失はこの層ではなく、上位のシグナリング層が
//! タイムアウトで扱う。

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionRegistry, MessagePusher};

/// シグナリング転送のユースケース
pub struct ForwardSignalUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    pusher: Arc<dyn MessagePusher>,
}

impl ForwardSignalUseCase {
    pub fn new(registry: Arc<dyn ConnectionRegistry>, pusher: Arc<dyn MessagePusher>) -> Self {
        Self { registry, pusher }
    }

    /// シリアライズ済みイベントを宛先接続へそのまま届ける
    ///
    /// # Returns
    ///
    /// * `true` - 宛先が存在し、イベントが配送キューに入った
    /// * `false` - 宛先が存在しない（黙って破棄）
    pub async fn execute(&self, target: &ConnectionId, event_json: &str) -> bool {
        if self.registry.get(target).await.is_none() {
            tracing::debug!("Signal target '{}' is gone, dropping", target);
            return false;
        }

        match self.pusher.push_to(target, event_json).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("Failed to forward signal to '{}': {}", target, e);
                false
            }
        }
    }
}
