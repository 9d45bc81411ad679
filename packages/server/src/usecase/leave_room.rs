//! UseCase: ルーム退出処理
//!
//! 明示的な leave_room イベントと transport 切断の両方がこの単一の
//! ユースケースを通る。退出処理は冪等で、未所属の接続に対しては何もしない。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - LeaveRoomUseCase::execute() メソッド
//! - 退出処理（スロット解放の連鎖、最終退出によるルーム削除、冪等性）
//!
//! ### なぜこのテストが必要か
//! - 切断時のクリーンアップが明示的退出と同一経路であることを保証
//! - 保持中のマイクスロットが退出で必ず解放されることを確認
//! - 未参加接続の退出が安全な no-op であることを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：通常退出、スロット保持中の退出
//! - エッジケース：最終メンバーの退出（ルーム削除）、未所属接続の退出

use std::sync::Arc;

use hiroba_shared::time::now_unix_millis;

use crate::domain::{
    ChatMessage, ConnectionId, ConnectionRegistry, Member, MessageText, RoomId, RoomStore,
    Timestamp,
};

/// Fan-out decision of a leave
#[derive(Debug, Clone)]
pub struct LeaveRoomOutcome {
    pub room_id: RoomId,
    pub member: Member,
    /// Mic slot released as part of the leave, if any
    pub freed_slot: Option<u8>,
    /// System "has left" message; appended unless the room was deleted
    pub left_message: Option<ChatMessage>,
    /// Remaining members to notify (empty when the room was deleted)
    pub notify_targets: Vec<ConnectionId>,
    /// Remaining members, for the member-list update
    pub remaining: Vec<Member>,
    pub room_deleted: bool,
}

/// ルーム退出のユースケース
pub struct LeaveRoomUseCase {
    store: Arc<dyn RoomStore>,
    registry: Arc<dyn ConnectionRegistry>,
}

impl LeaveRoomUseCase {
    pub fn new(store: Arc<dyn RoomStore>, registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { store, registry }
    }

    /// ルーム退出を実行（冪等）
    ///
    /// # Returns
    ///
    /// * `Some(LeaveRoomOutcome)` - 退出が発生した（通知対象を含む）
    /// * `None` - 接続はどのルームにも所属していなかった（no-op）
    pub async fn execute(&self, connection_id: &ConnectionId) -> Option<LeaveRoomOutcome> {
        // 1. 所属を取り外す（二重実行しても 2 回目は None になる）
        let binding = self.registry.clear_binding(connection_id).await?;
        let room_id = binding.room_id;

        // 2. Store からメンバーを削除（スロット解放・ルーム削除が連鎖する）
        let outcome = match self.store.leave(&room_id, connection_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                // The binding pointed at a room the store no longer knows.
                // Cleanup already happened elsewhere; nothing to notify.
                tracing::warn!(
                    "Leave for '{}' found no membership in room '{}': {}",
                    connection_id,
                    room_id,
                    e
                );
                return None;
            }
        };

        // 3. ルームが残っている場合のみ退出メッセージを追加
        let left_message = if outcome.room_deleted {
            None
        } else {
            let message = ChatMessage::system(
                MessageText::new(format!(
                    "{} has left the room",
                    outcome.member.name.as_str()
                ))
                .expect("system notice text is non-empty"),
                Timestamp::new(now_unix_millis()),
            );
            if let Err(e) = self.store.append_message(&room_id, message.clone()).await {
                tracing::warn!("Failed to append leave notice to '{}': {}", room_id, e);
            }
            Some(message)
        };

        let notify_targets = outcome
            .remaining
            .iter()
            .map(|m| m.connection_id.clone())
            .collect();

        tracing::info!(
            "'{}' left room '{}'{}",
            outcome.member.name,
            room_id,
            if outcome.room_deleted {
                " (room deleted)"
            } else {
                ""
            }
        );

        Some(LeaveRoomOutcome {
            room_id,
            member: outcome.member,
            freed_slot: outcome.freed_slot,
            left_message,
            notify_targets,
            remaining: outcome.remaining,
            room_deleted: outcome.room_deleted,
        })
    }
}
