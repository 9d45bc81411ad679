//! UseCase: ルーム詳細取得処理

use std::sync::Arc;

use crate::domain::{RoomDetail, RoomError, RoomId, RoomStore};

/// ルーム詳細取得のユースケース（読み取り専用）
pub struct GetRoomDetailUseCase {
    store: Arc<dyn RoomStore>,
}

impl GetRoomDetailUseCase {
    pub fn new(store: Arc<dyn RoomStore>) -> Self {
        Self { store }
    }

    /// ルーム詳細を取得
    pub async fn execute(&self, room_id: &RoomId) -> Result<RoomDetail, RoomError> {
        self.store.room_detail(room_id).await
    }
}
