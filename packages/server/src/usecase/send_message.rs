//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - メッセージ送信処理（メンバー検証、履歴への追加、ブロードキャスト対象選定）
//!
//! ### なぜこのテストが必要か
//! - 非メンバーからの送信が拒否され、履歴に残らないことを保証
//! - メッセージが送信者を含む全メンバーに配信されることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：メンバーによる送信
//! - 異常系：非メンバーによる送信、別ルームを指定した送信

use std::sync::Arc;

use hiroba_shared::time::now_unix_millis;

use crate::domain::{
    ChatMessage, ConnectionId, ConnectionRegistry, MessageText, RoomError, RoomId, RoomStore,
    Timestamp,
};

use super::resolve_member;

/// Fan-out decision of a sent message
#[derive(Debug, Clone)]
pub struct SendMessageOutcome {
    /// The appended message
    pub message: ChatMessage,
    /// Every member of the room, sender included
    pub targets: Vec<ConnectionId>,
}

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    store: Arc<dyn RoomStore>,
    registry: Arc<dyn ConnectionRegistry>,
}

impl SendMessageUseCase {
    pub fn new(store: Arc<dyn RoomStore>, registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { store, registry }
    }

    /// メッセージ送信を実行
    ///
    /// # Returns
    ///
    /// * `Ok(SendMessageOutcome)` - 追加されたメッセージとブロードキャスト対象
    /// * `Err(RoomError)` - 送信失敗（履歴は変更されない）
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
        text: MessageText,
    ) -> Result<SendMessageOutcome, RoomError> {
        // 1. 送信者がそのルームのメンバーであること
        let binding = resolve_member(&self.registry, connection_id, room_id).await?;

        // 2. メッセージを構築して履歴に追加
        let message = ChatMessage::member(
            binding.name,
            text,
            Timestamp::new(now_unix_millis()),
            connection_id.clone(),
        );
        self.store.append_message(room_id, message.clone()).await?;

        // 3. 送信者を含む全メンバーへ配信
        let targets = self
            .store
            .list_members(room_id)
            .await?
            .into_iter()
            .map(|m| m.connection_id)
            .collect();

        Ok(SendMessageOutcome { message, targets })
    }
}
