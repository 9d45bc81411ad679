//! InMemory RoomStore 実装
//!
//! ドメイン層が定義する RoomStore trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! ## Locking
//!
//! Rooms are held as `HashMap<RoomId, Arc<Mutex<Room>>>` behind an outer
//! mutex. The outer lock guards the map structure only; each room's state
//! is serialized by its own mutex, so independent rooms never block each
//! other on message/slot traffic. Lifecycle operations (`join`, `leave`)
//! hold the outer lock across the room mutation, because create/delete
//! decisions must not race with concurrent membership changes. Lock order
//! is always map -> room.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use hiroba_shared::time::Clock;

use crate::domain::{
    ChatMessage, ConnectionId, DisplayName, LeaveOutcome, Member, Room, RoomDetail, RoomError,
    RoomId, RoomOverview, RoomSnapshot, RoomStore, SlotAssignment, SlotNumber, Timestamp,
};

/// インメモリ RoomStore 実装
pub struct InMemoryRoomStore {
    rooms: Mutex<HashMap<RoomId, Arc<Mutex<Room>>>>,
    slot_count: u8,
    clock: Arc<dyn Clock>,
}

impl InMemoryRoomStore {
    /// Create a new store; `slot_count` is the mic slot range [1, N] for
    /// every room it creates.
    pub fn new(slot_count: u8, clock: Arc<dyn Clock>) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            slot_count,
            clock,
        }
    }

    /// Fetch the handle of an existing room without touching its state
    async fn room_handle(&self, room_id: &RoomId) -> Result<Arc<Mutex<Room>>, RoomError> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room_id)
            .cloned()
            .ok_or_else(|| RoomError::RoomNotFound(room_id.as_str().to_string()))
    }
}

#[async_trait]
impl RoomStore for InMemoryRoomStore {
    async fn join(&self, room_id: RoomId, member: Member) -> Result<RoomSnapshot, RoomError> {
        // Outer lock held across the insert so a concurrent last-leave
        // cannot delete the room between lookup and membership change
        let mut rooms = self.rooms.lock().await;
        let created = !rooms.contains_key(&room_id);
        let handle = rooms
            .entry(room_id.clone())
            .or_insert_with(|| {
                Arc::new(Mutex::new(Room::new(
                    room_id.clone(),
                    member.joined_at,
                    self.slot_count,
                )))
            })
            .clone();

        let mut room = handle.lock().await;
        let your_name = member.name.clone();
        if let Err(e) = room.add_member(member) {
            drop(room);
            // A freshly created room must not be left behind empty
            if created {
                rooms.remove(&room_id);
            }
            return Err(e);
        }
        if created {
            tracing::info!("Room '{}' created", room_id.as_str());
        }

        Ok(room.snapshot_for(your_name))
    }

    async fn leave(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
    ) -> Result<LeaveOutcome, RoomError> {
        let mut rooms = self.rooms.lock().await;
        let handle = rooms
            .get(room_id)
            .cloned()
            .ok_or_else(|| RoomError::RoomNotFound(room_id.as_str().to_string()))?;

        let mut room = handle.lock().await;
        let now = Timestamp::new(self.clock.now_millis());
        let (member, freed_slot) = room
            .remove_member(connection_id, now)
            .ok_or(RoomError::NotAMember)?;

        let room_deleted = room.is_empty();
        let remaining = room.members().to_vec();
        drop(room);

        if room_deleted {
            rooms.remove(room_id);
            tracing::info!("Room '{}' deleted (empty)", room_id.as_str());
        }

        Ok(LeaveOutcome {
            member,
            freed_slot,
            remaining,
            room_deleted,
        })
    }

    async fn append_message(
        &self,
        room_id: &RoomId,
        message: ChatMessage,
    ) -> Result<(), RoomError> {
        let handle = self.room_handle(room_id).await?;
        let mut room = handle.lock().await;
        room.push_message(message);
        Ok(())
    }

    async fn assign_slot(
        &self,
        room_id: &RoomId,
        slot: SlotNumber,
        name: &DisplayName,
    ) -> Result<SlotAssignment, RoomError> {
        let handle = self.room_handle(room_id).await?;
        let mut room = handle.lock().await;
        let now = Timestamp::new(self.clock.now_millis());
        room.assign_slot(slot, name, now)
    }

    async fn release_slot(
        &self,
        room_id: &RoomId,
        slot: Option<SlotNumber>,
        name: &DisplayName,
    ) -> Result<Option<u8>, RoomError> {
        let handle = self.room_handle(room_id).await?;
        let mut room = handle.lock().await;
        let now = Timestamp::new(self.clock.now_millis());
        room.release_slot(slot, name, now)
    }

    async fn slot_of(
        &self,
        room_id: &RoomId,
        name: &DisplayName,
    ) -> Result<Option<u8>, RoomError> {
        let handle = self.room_handle(room_id).await?;
        let room = handle.lock().await;
        Ok(room.slot_of(name))
    }

    async fn list_members(&self, room_id: &RoomId) -> Result<Vec<Member>, RoomError> {
        let handle = self.room_handle(room_id).await?;
        let room = handle.lock().await;
        Ok(room.members().to_vec())
    }

    async fn mic_slots(
        &self,
        room_id: &RoomId,
    ) -> Result<BTreeMap<u8, DisplayName>, RoomError> {
        let handle = self.room_handle(room_id).await?;
        let room = handle.lock().await;
        Ok(room.mic_slots())
    }

    async fn list_rooms(&self) -> Vec<RoomOverview> {
        let handles: Vec<Arc<Mutex<Room>>> = {
            let rooms = self.rooms.lock().await;
            rooms.values().cloned().collect()
        };

        let mut overviews = Vec::with_capacity(handles.len());
        for handle in handles {
            let room = handle.lock().await;
            overviews.push(RoomOverview {
                id: room.id.clone(),
                user_count: room.member_count(),
                active_mics: room.active_mic_count(),
                created_at: room.created_at,
                updated_at: room.updated_at,
            });
        }
        overviews.sort_by(|a, b| a.id.cmp(&b.id));
        overviews
    }

    async fn room_detail(&self, room_id: &RoomId) -> Result<RoomDetail, RoomError> {
        let handle = self.room_handle(room_id).await?;
        let room = handle.lock().await;
        Ok(RoomDetail {
            id: room.id.clone(),
            members: room.members().to_vec(),
            mic_slots: room.mic_slots(),
            message_count: room.message_count(),
            created_at: room.created_at,
            updated_at: room.updated_at,
        })
    }

    async fn room_count(&self) -> usize {
        let rooms = self.rooms.lock().await;
        rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hiroba_shared::time::FixedClock;

    use crate::domain::{IdentityId, MessageText};

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - InMemoryRoomStore のルームライフサイクル（初回 join で作成、最終 leave で削除）
    // - メンバー・スロット・メッセージ操作が Room に反映されること
    // - 存在しないルームへの操作が RoomNotFound を返すこと
    //
    // 【なぜこのテストが必要か】
    // - Store は UseCase から呼ばれるデータアクセス層の中核
    // - 「ルームはメンバーがいる間のみ存在する」不変条件を保証する必要がある
    //
    // 【どのようなシナリオをテストするか】
    // 1. 初回 join によるルーム作成とスナップショット
    // 2. 最終 leave によるルーム削除と状態破棄
    // 3. スロット操作の委譲
    // 4. 未知のルームへの操作（エラーケース）
    // ========================================

    fn create_store() -> InMemoryRoomStore {
        InMemoryRoomStore::new(10, Arc::new(FixedClock::new(5000)))
    }

    fn room_id(value: &str) -> RoomId {
        RoomId::new(value.to_string()).unwrap()
    }

    fn member(name: &str, at: i64) -> Member {
        Member::new(
            ConnectionId::generate(),
            DisplayName::new(name.to_string()).unwrap(),
            IdentityId::guest(),
            Timestamp::new(at),
        )
    }

    #[tokio::test]
    async fn test_first_join_creates_room() {
        // テスト項目: 初回 join でルームが作成され、自分を含むスナップショットが返る
        // given (前提条件):
        let store = create_store();

        // when (操作):
        let snapshot = store.join(room_id("lobby"), member("alice", 1000)).await.unwrap();

        // then (期待する結果):
        assert_eq!(store.room_count().await, 1);
        assert_eq!(snapshot.room_id.as_str(), "lobby");
        assert_eq!(snapshot.members.len(), 1);
        assert!(snapshot.messages.is_empty());
        assert!(snapshot.mic_slots.is_empty());
    }

    #[tokio::test]
    async fn test_second_join_reuses_room() {
        // テスト項目: 2 人目の join が既存ルームに追加され、スナップショットに両名が含まれる
        // given (前提条件):
        let store = create_store();
        store.join(room_id("lobby"), member("alice", 1000)).await.unwrap();

        // when (操作):
        let snapshot = store.join(room_id("lobby"), member("bob", 2000)).await.unwrap();

        // then (期待する結果):
        assert_eq!(store.room_count().await, 1);
        assert_eq!(snapshot.members.len(), 2);
        assert_eq!(snapshot.members[0].name.as_str(), "alice");
        assert_eq!(snapshot.members[1].name.as_str(), "bob");
    }

    #[tokio::test]
    async fn test_last_leave_deletes_room() {
        // テスト項目: 最後のメンバーの leave でルームと全状態が破棄される
        // given (前提条件):
        let store = create_store();
        let alice = member("alice", 1000);
        let conn = alice.connection_id.clone();
        let id = room_id("lobby");
        store.join(id.clone(), alice).await.unwrap();
        store
            .append_message(
                &id,
                ChatMessage::system(
                    MessageText::new("alice has joined the room".to_string()).unwrap(),
                    Timestamp::new(1100),
                ),
            )
            .await
            .unwrap();

        // when (操作):
        let outcome = store.leave(&id, &conn).await.unwrap();

        // then (期待する結果): ルームが消え、再 join は空の履歴で始まる
        assert!(outcome.room_deleted);
        assert!(outcome.remaining.is_empty());
        assert_eq!(store.room_count().await, 0);

        let snapshot = store.join(id, member("carol", 3000)).await.unwrap();
        assert!(snapshot.messages.is_empty());
    }

    #[tokio::test]
    async fn test_leave_releases_held_slot() {
        // テスト項目: leave が保持中のマイクスロットを解放して報告する
        // given (前提条件):
        let store = create_store();
        let alice = member("alice", 1000);
        let conn = alice.connection_id.clone();
        let name = alice.name.clone();
        let id = room_id("lobby");
        store.join(id.clone(), alice).await.unwrap();
        store.join(id.clone(), member("bob", 1500)).await.unwrap();
        store
            .assign_slot(&id, SlotNumber::new(3).unwrap(), &name)
            .await
            .unwrap();

        // when (操作):
        let outcome = store.leave(&id, &conn).await.unwrap();

        // then (期待する結果):
        assert_eq!(outcome.freed_slot, Some(3));
        assert!(!outcome.room_deleted);
        assert_eq!(outcome.remaining.len(), 1);
        assert!(store.mic_slots(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_leave_unknown_connection_reports_not_a_member() {
        // テスト項目: 非メンバー connection の leave が NotAMember を返す
        // given (前提条件):
        let store = create_store();
        let id = room_id("lobby");
        store.join(id.clone(), member("alice", 1000)).await.unwrap();

        // when (操作):
        let result = store.leave(&id, &ConnectionId::generate()).await;

        // then (期待する結果):
        assert_eq!(result.err(), Some(RoomError::NotAMember));
        assert_eq!(store.room_count().await, 1);
    }

    #[tokio::test]
    async fn test_operations_on_unknown_room_report_room_not_found() {
        // テスト項目: 未知のルームへの操作が RoomNotFound を返す
        // given (前提条件):
        let store = create_store();
        let id = room_id("nowhere");
        let name = DisplayName::new("alice".to_string()).unwrap();

        // when (操作) / then (期待する結果):
        assert!(matches!(
            store.leave(&id, &ConnectionId::generate()).await,
            Err(RoomError::RoomNotFound(_))
        ));
        assert!(matches!(
            store
                .assign_slot(&id, SlotNumber::new(1).unwrap(), &name)
                .await,
            Err(RoomError::RoomNotFound(_))
        ));
        assert!(matches!(
            store.list_members(&id).await,
            Err(RoomError::RoomNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_slot_conflict_is_propagated() {
        // テスト項目: 別名が保持するスロットへの割り当てが SlotTaken になる
        // given (前提条件):
        let store = create_store();
        let id = room_id("lobby");
        let alice = DisplayName::new("alice".to_string()).unwrap();
        let bob = DisplayName::new("bob".to_string()).unwrap();
        store.join(id.clone(), member("alice", 1000)).await.unwrap();
        store.join(id.clone(), member("bob", 1100)).await.unwrap();
        store
            .assign_slot(&id, SlotNumber::new(1).unwrap(), &alice)
            .await
            .unwrap();

        // when (操作):
        let result = store.assign_slot(&id, SlotNumber::new(1).unwrap(), &bob).await;

        // then (期待する結果): スロット 1 は alice のまま
        assert_eq!(
            result,
            Err(RoomError::SlotTaken {
                slot: 1,
                holder: "alice".to_string(),
            })
        );
        let slots = store.mic_slots(&id).await.unwrap();
        assert_eq!(slots.get(&1).map(|n| n.as_str()), Some("alice"));
    }

    #[tokio::test]
    async fn test_list_rooms_reports_counts() {
        // テスト項目: list_rooms が各ルームの人数とマイク使用数を報告する
        // given (前提条件):
        let store = create_store();
        let lobby = room_id("lobby");
        let stage = room_id("stage");
        let alice = DisplayName::new("alice".to_string()).unwrap();
        store.join(lobby.clone(), member("alice", 1000)).await.unwrap();
        store.join(lobby.clone(), member("bob", 1100)).await.unwrap();
        store.join(stage.clone(), member("carol", 1200)).await.unwrap();
        store
            .assign_slot(&lobby, SlotNumber::new(1).unwrap(), &alice)
            .await
            .unwrap();

        // when (操作):
        let overviews = store.list_rooms().await;

        // then (期待する結果): ルーム id 順
        assert_eq!(overviews.len(), 2);
        assert_eq!(overviews[0].id.as_str(), "lobby");
        assert_eq!(overviews[0].user_count, 2);
        assert_eq!(overviews[0].active_mics, 1);
        assert_eq!(overviews[1].id.as_str(), "stage");
        assert_eq!(overviews[1].user_count, 1);
        assert_eq!(overviews[1].active_mics, 0);
    }

    #[tokio::test]
    async fn test_room_detail_reports_message_count() {
        // テスト項目: room_detail がメッセージ数とスロットマップを報告する
        // given (前提条件):
        let store = create_store();
        let id = room_id("lobby");
        store.join(id.clone(), member("alice", 1000)).await.unwrap();
        store
            .append_message(
                &id,
                ChatMessage::system(
                    MessageText::new("alice has joined the room".to_string()).unwrap(),
                    Timestamp::new(1100),
                ),
            )
            .await
            .unwrap();

        // when (操作):
        let detail = store.room_detail(&id).await.unwrap();

        // then (期待する結果):
        assert_eq!(detail.id.as_str(), "lobby");
        assert_eq!(detail.members.len(), 1);
        assert_eq!(detail.message_count, 1);
    }
}
