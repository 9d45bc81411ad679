//! UseCase: マイクスロット参加処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinMicUseCase::execute() メソッド
//! - スロット割り当て処理（単一占有、移動時の解放、競合時の無変更）
//!
//! ### なぜこのテストが必要か
//! - スロット競合（SlotTaken）が送信者のみへのエラーで、状態を変えないことを保証
//! - スロット移動が「解放 → 占有」として 1 回の呼び出しで完結することを確認
//! - 非メンバーのスロット操作を拒否する
//!
//! ### どのような状況を想定しているか
//! - 正常系：空きスロットへの参加、スロット間の移動
//! - 異常系：競合、範囲外スロット、非メンバー
//! - エッジケース：保持中スロットへの再参加（no-op）

use std::sync::Arc;

use hiroba_shared::time::now_unix_millis;

use crate::domain::{
    ChatMessage, ConnectionId, ConnectionRegistry, DisplayName, MessageText, RoomError, RoomId,
    RoomStore, SlotAssignment, SlotNumber, Timestamp,
};

use super::resolve_member;

/// Fan-out decision of a mic join.
///
/// For an `AlreadyHeld` no-op, `notice_message` is `None` and the caller
/// broadcasts nothing (no state changed).
#[derive(Debug, Clone)]
pub struct JoinMicOutcome {
    pub assignment: SlotAssignment,
    pub name: DisplayName,
    /// Full slot map after the change
    pub slots: std::collections::BTreeMap<u8, DisplayName>,
    /// System "joined mic slot" chat line, already appended
    pub notice_message: Option<ChatMessage>,
    /// Every member of the room
    pub targets: Vec<ConnectionId>,
}

/// マイクスロット参加のユースケース
pub struct JoinMicUseCase {
    store: Arc<dyn RoomStore>,
    registry: Arc<dyn ConnectionRegistry>,
}

impl JoinMicUseCase {
    pub fn new(store: Arc<dyn RoomStore>, registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { store, registry }
    }

    /// スロット参加を実行
    ///
    /// # Returns
    ///
    /// * `Ok(JoinMicOutcome)` - 割り当て結果とブロードキャスト対象
    /// * `Err(RoomError)` - 割り当て失敗（スロットマップは変更されない）
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
        slot: SlotNumber,
    ) -> Result<JoinMicOutcome, RoomError> {
        // 1. 送信者がそのルームのメンバーであること
        let binding = resolve_member(&self.registry, connection_id, room_id).await?;
        let name = binding.name;

        // 2. スロット割り当て（移動時の解放は store 側で原子的に行われる）
        let assignment = self.store.assign_slot(room_id, slot, &name).await?;

        let slots = self.store.mic_slots(room_id).await?;
        let targets = self
            .store
            .list_members(room_id)
            .await?
            .into_iter()
            .map(|m| m.connection_id)
            .collect();

        // 3. 実際に占有が変わった場合のみシステムメッセージを残す
        let notice_message = match &assignment {
            SlotAssignment::AlreadyHeld { .. } => None,
            SlotAssignment::Joined { slot } | SlotAssignment::Moved { to: slot, .. } => {
                let message = ChatMessage::system(
                    MessageText::new(format!("{} joined mic slot {}", name.as_str(), slot))
                        .expect("system notice text is non-empty"),
                    Timestamp::new(now_unix_millis()),
                );
                self.store.append_message(room_id, message.clone()).await?;
                tracing::info!("'{}' joined mic slot {} in room '{}'", name, slot, room_id);
                Some(message)
            }
        };

        Ok(JoinMicOutcome {
            assignment,
            name,
            slots,
            notice_message,
            targets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use hiroba_shared::time::FixedClock;

    use crate::domain::gateway::MockIdentityGateway;
    use crate::infrastructure::{InMemoryConnectionRegistry, InMemoryRoomStore};
    use crate::usecase::join_room::JoinRoomUseCase;

    struct Fixture {
        store: Arc<InMemoryRoomStore>,
        registry: Arc<InMemoryConnectionRegistry>,
        join: JoinRoomUseCase,
        join_mic: JoinMicUseCase,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryRoomStore::new(4, Arc::new(FixedClock::new(5000))));
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let join = JoinRoomUseCase::new(
            store.clone(),
            registry.clone(),
            Arc::new(MockIdentityGateway::new()),
        );
        let join_mic = JoinMicUseCase::new(store.clone(), registry.clone());
        Fixture {
            store,
            registry,
            join,
            join_mic,
        }
    }

    async fn join_as(f: &Fixture, room: &str, name: &str) -> ConnectionId {
        let conn = ConnectionId::generate();
        f.registry.register(conn.clone()).await;
        f.join
            .execute(
                conn.clone(),
                RoomId::new(room.to_string()).unwrap(),
                DisplayName::new(name.to_string()).unwrap(),
                None,
            )
            .await
            .unwrap();
        conn
    }

    fn room(value: &str) -> RoomId {
        RoomId::new(value.to_string()).unwrap()
    }

    fn slot(value: u8) -> SlotNumber {
        SlotNumber::new(value).unwrap()
    }

    #[tokio::test]
    async fn test_join_free_slot_broadcasts_to_room() {
        // テスト項目: 空きスロットへの参加が成功し、全メンバーが対象になる
        // given (前提条件):
        let f = fixture();
        let alice = join_as(&f, "lobby", "alice").await;
        let bob = join_as(&f, "lobby", "bob").await;

        // when (操作):
        let outcome = f
            .join_mic
            .execute(&alice, &room("lobby"), slot(1))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(outcome.assignment, SlotAssignment::Joined { slot: 1 });
        assert_eq!(outcome.slots.get(&1).map(|n| n.as_str()), Some("alice"));
        assert_eq!(outcome.targets.len(), 2);
        assert!(outcome.targets.contains(&bob));
        let notice = outcome.notice_message.unwrap();
        assert_eq!(notice.text.as_str(), "alice joined mic slot 1");
    }

    #[tokio::test]
    async fn test_join_taken_slot_fails_and_slot_map_unchanged() {
        // テスト項目: 他人のスロットへの参加が SlotTaken で失敗し、マップが変わらない
        // given (前提条件):
        let f = fixture();
        let alice = join_as(&f, "lobby", "alice").await;
        let bob = join_as(&f, "lobby", "bob").await;
        f.join_mic
            .execute(&alice, &room("lobby"), slot(1))
            .await
            .unwrap();

        // when (操作):
        let result = f.join_mic.execute(&bob, &room("lobby"), slot(1)).await;

        // then (期待する結果): スロット 1 は alice のまま
        assert_eq!(
            result.err(),
            Some(RoomError::SlotTaken {
                slot: 1,
                holder: "alice".to_string(),
            })
        );
        let slots = f.store.mic_slots(&room("lobby")).await.unwrap();
        assert_eq!(slots.get(&1).map(|n| n.as_str()), Some("alice"));
        assert_eq!(slots.len(), 1);
    }

    #[tokio::test]
    async fn test_moving_between_slots_vacates_previous() {
        // テスト項目: スロット移動で元のスロットが解放され、移動として報告される
        // given (前提条件):
        let f = fixture();
        let alice = join_as(&f, "lobby", "alice").await;
        f.join_mic
            .execute(&alice, &room("lobby"), slot(1))
            .await
            .unwrap();

        // when (操作):
        let outcome = f
            .join_mic
            .execute(&alice, &room("lobby"), slot(2))
            .await
            .unwrap();

        // then (期待する結果): {2: alice} のみ、スロット 1 は不在
        assert_eq!(outcome.assignment, SlotAssignment::Moved { from: 1, to: 2 });
        assert_eq!(outcome.slots.len(), 1);
        assert_eq!(outcome.slots.get(&2).map(|n| n.as_str()), Some("alice"));
        assert!(!outcome.slots.contains_key(&1));
    }

    #[tokio::test]
    async fn test_rejoining_held_slot_is_silent_noop() {
        // テスト項目: 保持中スロットへの再参加が通知なしの no-op になる
        // given (前提条件):
        let f = fixture();
        let alice = join_as(&f, "lobby", "alice").await;
        f.join_mic
            .execute(&alice, &room("lobby"), slot(3))
            .await
            .unwrap();

        // when (操作):
        let outcome = f
            .join_mic
            .execute(&alice, &room("lobby"), slot(3))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(outcome.assignment, SlotAssignment::AlreadyHeld { slot: 3 });
        assert!(outcome.notice_message.is_none());
    }

    #[tokio::test]
    async fn test_out_of_range_slot_is_rejected() {
        // テスト項目: 範囲外スロット（N=4 で 5）が InvalidSlot になる
        // given (前提条件):
        let f = fixture();
        let alice = join_as(&f, "lobby", "alice").await;

        // when (操作):
        let result = f.join_mic.execute(&alice, &room("lobby"), slot(5)).await;

        // then (期待する結果):
        assert_eq!(result.err(), Some(RoomError::InvalidSlot { slot: 5, max: 4 }));
    }

    #[tokio::test]
    async fn test_non_member_cannot_take_slot() {
        // テスト項目: 非メンバーのスロット参加が拒否される
        // given (前提条件):
        let f = fixture();
        let _alice = join_as(&f, "lobby", "alice").await;
        let outsider = ConnectionId::generate();
        f.registry.register(outsider.clone()).await;

        // when (操作):
        let result = f.join_mic.execute(&outsider, &room("lobby"), slot(1)).await;

        // then (期待する結果):
        assert_eq!(result.err(), Some(RoomError::NotAMember));
        assert!(f.store.mic_slots(&room("lobby")).await.unwrap().is_empty());
    }
}
