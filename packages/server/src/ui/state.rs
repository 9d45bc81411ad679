//! Server state and dependency wiring.

use std::sync::Arc;

use crate::domain::{ConnectionRegistry, IdentityGateway, MessagePusher, RoomStore};
use crate::usecase::{
    ForwardSignalUseCase, GetRoomDetailUseCase, GetRoomsUseCase, GetUserSlotUseCase,
    IssueMediaCredentialUseCase, JoinMicUseCase, JoinRoomUseCase, LeaveMicUseCase,
    LeaveRoomUseCase, SendMessageUseCase,
};

/// Shared application state.
///
/// Holds one instance of every usecase plus the ports the handlers drive
/// directly (pusher for fan-out, registry for connection lifecycle, store
/// and gateway for the health endpoint).
pub struct AppState {
    pub join_room_usecase: JoinRoomUseCase,
    pub leave_room_usecase: LeaveRoomUseCase,
    pub send_message_usecase: SendMessageUseCase,
    pub join_mic_usecase: JoinMicUseCase,
    pub leave_mic_usecase: LeaveMicUseCase,
    pub get_user_slot_usecase: GetUserSlotUseCase,
    pub forward_signal_usecase: ForwardSignalUseCase,
    pub issue_credential_usecase: IssueMediaCredentialUseCase,
    pub get_rooms_usecase: GetRoomsUseCase,
    pub get_room_detail_usecase: GetRoomDetailUseCase,

    /// Registry（接続ライフサイクルの管理）
    pub registry: Arc<dyn ConnectionRegistry>,
    /// MessagePusher（メッセージ通知の抽象化）
    pub pusher: Arc<dyn MessagePusher>,
    /// RoomStore（ヘルスチェック用の読み取り）
    pub store: Arc<dyn RoomStore>,
    /// IdentityGateway（ヘルスチェック用の設定確認）
    pub gateway: Arc<dyn IdentityGateway>,
}

impl AppState {
    /// Wire every usecase to the given port implementations
    pub fn new(
        store: Arc<dyn RoomStore>,
        registry: Arc<dyn ConnectionRegistry>,
        pusher: Arc<dyn MessagePusher>,
        gateway: Arc<dyn IdentityGateway>,
    ) -> Self {
        Self {
            join_room_usecase: JoinRoomUseCase::new(
                store.clone(),
                registry.clone(),
                gateway.clone(),
            ),
            leave_room_usecase: LeaveRoomUseCase::new(store.clone(), registry.clone()),
            send_message_usecase: SendMessageUseCase::new(store.clone(), registry.clone()),
            join_mic_usecase: JoinMicUseCase::new(store.clone(), registry.clone()),
            leave_mic_usecase: LeaveMicUseCase::new(store.clone(), registry.clone()),
            get_user_slot_usecase: GetUserSlotUseCase::new(store.clone()),
            forward_signal_usecase: ForwardSignalUseCase::new(registry.clone(), pusher.clone()),
            issue_credential_usecase: IssueMediaCredentialUseCase::new(gateway.clone()),
            get_rooms_usecase: GetRoomsUseCase::new(store.clone()),
            get_room_detail_usecase: GetRoomDetailUseCase::new(store.clone()),
            registry,
            pusher,
            store,
            gateway,
        }
    }
}
