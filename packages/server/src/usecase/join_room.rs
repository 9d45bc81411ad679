//! UseCase: ルーム参加処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() メソッド
//! - ルーム参加処理（identity 検証、ルーム作成、スナップショット構築）
//!
//! ### なぜこのテストが必要か
//! - ビジネスロジックの検証：スナップショットは参加者本人のみに送られる
//! - identity トークン拒否時に参加が発生しないことを保証
//! - 二重参加（別ルームへの同時所属）を防ぐ
//!
//! ### どのような状況を想定しているか
//! - 正常系：ゲスト参加、トークン参加
//! - 異常系：トークン拒否、既に別ルームに所属
//! - エッジケース：初回参加によるルーム作成

use std::sync::Arc;

use hiroba_shared::time::now_unix_millis;

use crate::domain::{
    ChatMessage, ConnectionId, ConnectionRegistry, DisplayName, IdentityGateway, IdentityId,
    Member, MessageText, RoomBinding, RoomId, RoomSnapshot, RoomStore, Timestamp,
};

use super::error::JoinRoomError;

/// Fan-out decision of a successful join
#[derive(Debug, Clone)]
pub struct JoinRoomOutcome {
    /// Sent to the joining connection only, never re-broadcast
    pub snapshot: RoomSnapshot,
    /// System "has joined" message, already appended to the room log
    pub joined_message: ChatMessage,
    /// Existing members (everyone except the joiner)
    pub notify_targets: Vec<ConnectionId>,
    /// Every member including the joiner, for the member-list update
    pub all_targets: Vec<ConnectionId>,
}

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    store: Arc<dyn RoomStore>,
    registry: Arc<dyn ConnectionRegistry>,
    gateway: Arc<dyn IdentityGateway>,
}

impl JoinRoomUseCase {
    pub fn new(
        store: Arc<dyn RoomStore>,
        registry: Arc<dyn ConnectionRegistry>,
        gateway: Arc<dyn IdentityGateway>,
    ) -> Self {
        Self {
            store,
            registry,
            gateway,
        }
    }

    /// ルーム参加を実行
    ///
    /// # Returns
    ///
    /// * `Ok(JoinRoomOutcome)` - 参加成功（スナップショットと通知対象）
    /// * `Err(JoinRoomError)` - 参加失敗（状態は変更されない）
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        room_id: RoomId,
        name: DisplayName,
        identity_token: Option<String>,
    ) -> Result<JoinRoomOutcome, JoinRoomError> {
        // 1. 接続の確認（既に所属している場合は拒否）
        let connection = self.registry.get(&connection_id).await.ok_or(
            crate::domain::RegistryError::ConnectionNotFound(connection_id.as_str().to_string()),
        )?;
        if connection.binding.is_some() {
            return Err(JoinRoomError::AlreadyInRoom);
        }

        // 2. identity の解決（トークンなしはゲスト扱い）
        let identity = match identity_token {
            Some(token) => self
                .gateway
                .verify_identity(&token)
                .await
                .ok_or(JoinRoomError::AuthenticationFailed)?,
            None => IdentityId::guest(),
        };

        // 3. Store にメンバーを追加（ルームは初回参加時に作成される）
        let joined_at = Timestamp::new(now_unix_millis());
        let member = Member::new(
            connection_id.clone(),
            name.clone(),
            identity.clone(),
            joined_at,
        );
        let snapshot = self.store.join(room_id.clone(), member).await?;

        // 4. Registry に所属を記録
        let binding = RoomBinding {
            room_id: room_id.clone(),
            name: name.clone(),
            identity,
        };
        if let Err(e) = self.registry.bind_room(&connection_id, binding).await {
            // The connection vanished between upgrade and join; undo the
            // membership so the room does not keep a dead member
            tracing::warn!(
                "Connection '{}' disappeared during join, rolling back: {}",
                connection_id,
                e
            );
            let _ = self.store.leave(&room_id, &connection_id).await;
            return Err(e.into());
        }

        // 5. システムメッセージをログに追加（スナップショットには含まれない）
        let joined_message = ChatMessage::system(
            MessageText::new(format!("{} has joined the room", name.as_str()))
                .expect("system notice text is non-empty"),
            Timestamp::new(now_unix_millis()),
        );
        self.store
            .append_message(&room_id, joined_message.clone())
            .await?;

        let notify_targets = snapshot
            .members
            .iter()
            .filter(|m| m.connection_id != connection_id)
            .map(|m| m.connection_id.clone())
            .collect();
        let all_targets = snapshot
            .members
            .iter()
            .map(|m| m.connection_id.clone())
            .collect();

        tracing::info!(
            "'{}' joined room '{}' ({} members)",
            name,
            room_id,
            snapshot.members.len()
        );

        Ok(JoinRoomOutcome {
            snapshot,
            joined_message,
            notify_targets,
            all_targets,
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

    fn create_store() -> Arc<InMemoryRoomStore> {
        Arc::new(InMemoryRoomStore::new(10, Arc::new(FixedClock::new(5000))))
    }

    fn guest_gateway() -> Arc<MockIdentityGateway> {
        Arc::new(MockIdentityGateway::new())
    }

    async fn registered_connection(registry: &Arc<InMemoryConnectionRegistry>) -> ConnectionId {
        let id = ConnectionId::generate();
        registry.register(id.clone()).await;
        id
    }

    fn room(value: &str) -> RoomId {
        RoomId::new(value.to_string()).unwrap()
    }

    fn name(value: &str) -> DisplayName {
        DisplayName::new(value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_guest_join_creates_room_and_snapshot() {
        // テスト項目: ゲスト参加が成功し、本人を含むスナップショットが返る
        // given (前提条件):
        let store = create_store();
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let usecase = JoinRoomUseCase::new(store.clone(), registry.clone(), guest_gateway());
        let conn = registered_connection(&registry).await;

        // when (操作):
        let outcome = usecase
            .execute(conn.clone(), room("lobby"), name("alice"), None)
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(outcome.snapshot.members.len(), 1);
        assert!(outcome.notify_targets.is_empty());
        assert_eq!(outcome.all_targets.len(), 1);
        assert!(outcome.joined_message.author.is_system());

        // Registry に所属が記録されている
        let connection = registry.get(&conn).await.unwrap();
        assert_eq!(connection.room_id().map(|r| r.as_str()), Some("lobby"));

        // ゲスト identity が割り当てられている
        assert!(
            connection
                .binding
                .unwrap()
                .identity
                .as_str()
                .starts_with("guest_")
        );
    }

    #[tokio::test]
    async fn test_second_join_notifies_existing_members_only() {
        // テスト項目: 2 人目の参加で既存メンバーのみが通知対象になる
        // given (前提条件):
        let store = create_store();
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let usecase = JoinRoomUseCase::new(store.clone(), registry.clone(), guest_gateway());
        let alice_conn = registered_connection(&registry).await;
        let bob_conn = registered_connection(&registry).await;
        usecase
            .execute(alice_conn.clone(), room("lobby"), name("alice"), None)
            .await
            .unwrap();

        // when (操作):
        let outcome = usecase
            .execute(bob_conn.clone(), room("lobby"), name("bob"), None)
            .await
            .unwrap();

        // then (期待する結果): bob のスナップショットは [alice, bob]、通知対象は alice のみ
        assert_eq!(outcome.snapshot.members.len(), 2);
        assert_eq!(outcome.notify_targets, vec![alice_conn]);
        assert_eq!(outcome.all_targets.len(), 2);

        // bob のスナップショットには alice の参加メッセージが含まれる
        // （bob 自身の参加メッセージは含まれない）
        assert_eq!(outcome.snapshot.messages.len(), 1);
        assert_eq!(
            outcome.snapshot.messages[0].text.as_str(),
            "alice has joined the room"
        );
    }

    #[tokio::test]
    async fn test_join_with_valid_token_uses_verified_identity() {
        // テスト項目: 有効なトークンで外部 identity が使われる
        // given (前提条件):
        let store = create_store();
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let mut gateway = MockIdentityGateway::new();
        gateway
            .expect_verify_identity()
            .returning(|_| Some(IdentityId::new("user-42".to_string()).unwrap()));
        let usecase = JoinRoomUseCase::new(store, registry.clone(), Arc::new(gateway));
        let conn = registered_connection(&registry).await;

        // when (操作):
        usecase
            .execute(
                conn.clone(),
                room("lobby"),
                name("alice"),
                Some("token".to_string()),
            )
            .await
            .unwrap();

        // then (期待する結果):
        let binding = registry.get(&conn).await.unwrap().binding.unwrap();
        assert_eq!(binding.identity.as_str(), "user-42");
    }

    #[tokio::test]
    async fn test_join_with_rejected_token_fails_without_mutation() {
        // テスト項目: トークン拒否時に参加が発生しない
        // given (前提条件):
        let store = create_store();
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let mut gateway = MockIdentityGateway::new();
        gateway.expect_verify_identity().returning(|_| None);
        let usecase = JoinRoomUseCase::new(store.clone(), registry.clone(), Arc::new(gateway));
        let conn = registered_connection(&registry).await;

        // when (操作):
        let result = usecase
            .execute(
                conn.clone(),
                room("lobby"),
                name("alice"),
                Some("bad-token".to_string()),
            )
            .await;

        // then (期待する結果): ルームは作られず、所属も記録されない
        assert_eq!(result.err(), Some(JoinRoomError::AuthenticationFailed));
        assert_eq!(store.room_count().await, 0);
        assert!(registry.get(&conn).await.unwrap().binding.is_none());
    }

    #[tokio::test]
    async fn test_join_while_already_in_room_is_rejected() {
        // テスト項目: 既にルームに所属している接続の再参加が拒否される
        // given (前提条件):
        let store = create_store();
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let usecase = JoinRoomUseCase::new(store.clone(), registry.clone(), guest_gateway());
        let conn = registered_connection(&registry).await;
        usecase
            .execute(conn.clone(), room("lobby"), name("alice"), None)
            .await
            .unwrap();

        // when (操作):
        let result = usecase
            .execute(conn.clone(), room("stage"), name("alice"), None)
            .await;

        // then (期待する結果): 2 つ目のルームは作られない
        assert_eq!(result.err(), Some(JoinRoomError::AlreadyInRoom));
        assert_eq!(store.room_count().await, 1);
    }

    #[tokio::test]
    async fn test_join_from_unregistered_connection_is_rejected() {
        // テスト項目: 未登録接続からの参加が拒否される
        // given (前提条件):
        let store = create_store();
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let usecase = JoinRoomUseCase::new(store.clone(), registry, guest_gateway());

        // when (操作):
        let result = usecase
            .execute(ConnectionId::generate(), room("lobby"), name("alice"), None)
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(JoinRoomError::Registry(_))));
        assert_eq!(store.room_count().await, 0);
    }
}
