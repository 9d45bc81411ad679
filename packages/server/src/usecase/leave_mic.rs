//! UseCase: マイクスロット退出処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - LeaveMicUseCase::execute() メソッド
//! - スロット解放処理（名前による解放、スロット指定の絞り込み）
//!
//! ### なぜこのテストが必要か
//! - 実際に解放が起きた場合のみ通知されることを保証
//! - スロット指定が一致しない解放が no-op であることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：保持スロットの解放（指定あり・なし）
//! - エッジケース：未保持での解放、不一致スロット指定

use std::sync::Arc;

use hiroba_shared::time::now_unix_millis;

use crate::domain::{
    ChatMessage, ConnectionId, ConnectionRegistry, DisplayName, MessageText, RoomError, RoomId,
    RoomStore, SlotNumber, Timestamp,
};

use super::resolve_member;

/// Fan-out decision of a mic leave.
///
/// `freed_slot` is `None` when nothing was actually freed; the caller
/// broadcasts nothing in that case.
#[derive(Debug, Clone)]
pub struct LeaveMicOutcome {
    pub freed_slot: Option<u8>,
    pub name: DisplayName,
    /// Full slot map after the change
    pub slots: std::collections::BTreeMap<u8, DisplayName>,
    /// System "left mic slot" chat line, appended when a slot was freed
    pub notice_message: Option<ChatMessage>,
    /// Every member of the room
    pub targets: Vec<ConnectionId>,
}

/// マイクスロット退出のユースケース
pub struct LeaveMicUseCase {
    store: Arc<dyn RoomStore>,
    registry: Arc<dyn ConnectionRegistry>,
}

impl LeaveMicUseCase {
    pub fn new(store: Arc<dyn RoomStore>, registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { store, registry }
    }

    /// スロット退出を実行
    ///
    /// # Arguments
    ///
    /// * `slot` - 指定した場合、そのスロットを保持しているときのみ解放する。
    ///   省略した場合、保持しているスロットを解放する。
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
        slot: Option<SlotNumber>,
    ) -> Result<LeaveMicOutcome, RoomError> {
        // 1. 送信者がそのルームのメンバーであること
        let binding = resolve_member(&self.registry, connection_id, room_id).await?;
        let name = binding.name;

        // 2. スロット解放
        let freed_slot = self.store.release_slot(room_id, slot, &name).await?;

        let slots = self.store.mic_slots(room_id).await?;
        let targets = self
            .store
            .list_members(room_id)
            .await?
            .into_iter()
            .map(|m| m.connection_id)
            .collect();

        // 3. 実際に解放が起きた場合のみシステムメッセージを残す
        let notice_message = match freed_slot {
            None => None,
            Some(freed) => {
                let message = ChatMessage::system(
                    MessageText::new(format!("{} left mic slot {}", name.as_str(), freed))
                        .expect("system notice text is non-empty"),
                    Timestamp::new(now_unix_millis()),
                );
                self.store.append_message(room_id, message.clone()).await?;
                tracing::info!("'{}' left mic slot {} in room '{}'", name, freed, room_id);
                Some(message)
            }
        };

        Ok(LeaveMicOutcome {
            freed_slot,
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
    use crate::usecase::join_mic::JoinMicUseCase;
    use crate::usecase::join_room::JoinRoomUseCase;

    struct Fixture {
        store: Arc<InMemoryRoomStore>,
        registry: Arc<InMemoryConnectionRegistry>,
        join: JoinRoomUseCase,
        join_mic: JoinMicUseCase,
        leave_mic: LeaveMicUseCase,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryRoomStore::new(10, Arc::new(FixedClock::new(5000))));
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let join = JoinRoomUseCase::new(
            store.clone(),
            registry.clone(),
            Arc::new(MockIdentityGateway::new()),
        );
        let join_mic = JoinMicUseCase::new(store.clone(), registry.clone());
        let leave_mic = LeaveMicUseCase::new(store.clone(), registry.clone());
        Fixture {
            store,
            registry,
            join,
            join_mic,
            leave_mic,
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
    async fn test_leave_held_slot_without_scope() {
        // テスト項目: スロット指定なしの退出が保持スロットを解放する
        // given (前提条件):
        let f = fixture();
        let alice = join_as(&f, "lobby", "alice").await;
        f.join_mic
            .execute(&alice, &room("lobby"), slot(2))
            .await
            .unwrap();

        // when (操作):
        let outcome = f
            .leave_mic
            .execute(&alice, &room("lobby"), None)
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(outcome.freed_slot, Some(2));
        assert!(outcome.slots.is_empty());
        let notice = outcome.notice_message.unwrap();
        assert_eq!(notice.text.as_str(), "alice left mic slot 2");
    }

    #[tokio::test]
    async fn test_leave_with_matching_scope() {
        // テスト項目: 保持スロットと一致する指定で解放される
        // given (前提条件):
        let f = fixture();
        let alice = join_as(&f, "lobby", "alice").await;
        f.join_mic
            .execute(&alice, &room("lobby"), slot(2))
            .await
            .unwrap();

        // when (操作):
        let outcome = f
            .leave_mic
            .execute(&alice, &room("lobby"), Some(slot(2)))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(outcome.freed_slot, Some(2));
    }

    #[tokio::test]
    async fn test_leave_with_mismatched_scope_frees_nothing() {
        // テスト項目: 保持スロットと異なる指定では解放も通知も発生しない
        // given (前提条件):
        let f = fixture();
        let alice = join_as(&f, "lobby", "alice").await;
        f.join_mic
            .execute(&alice, &room("lobby"), slot(2))
            .await
            .unwrap();

        // when (操作):
        let outcome = f
            .leave_mic
            .execute(&alice, &room("lobby"), Some(slot(3)))
            .await
            .unwrap();

        // then (期待する結果): スロット 2 は保持されたまま
        assert_eq!(outcome.freed_slot, None);
        assert!(outcome.notice_message.is_none());
        assert_eq!(outcome.slots.get(&2).map(|n| n.as_str()), Some("alice"));
    }

    #[tokio::test]
    async fn test_leave_without_holding_is_noop() {
        // テスト項目: スロット未保持での退出が no-op になる
        // given (前提条件):
        let f = fixture();
        let alice = join_as(&f, "lobby", "alice").await;

        // when (操作):
        let outcome = f
            .leave_mic
            .execute(&alice, &room("lobby"), None)
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(outcome.freed_slot, None);
        assert!(outcome.notice_message.is_none());
    }

    #[tokio::test]
    async fn test_non_member_cannot_release() {
        // テスト項目: 非メンバーのスロット退出が拒否される
        // given (前提条件):
        let f = fixture();
        let _alice = join_as(&f, "lobby", "alice").await;
        let outsider = ConnectionId::generate();
        f.registry.register(outsider.clone()).await;

        // when (操作):
        let result = f.leave_mic.execute(&outsider, &room("lobby"), None).await;

        // then (期待する結果):
        assert_eq!(result.err(), Some(RoomError::NotAMember));
    }
}
