//! UseCase: ルーム一覧取得処理

use std::sync::Arc;

use crate::domain::{RoomOverview, RoomStore};

/// ルーム一覧取得のユースケース（読み取り専用）
pub struct GetRoomsUseCase {
    store: Arc<dyn RoomStore>,
}

impl GetRoomsUseCase {
    pub fn new(store: Arc<dyn RoomStore>) -> Self {
        Self { store }
    }

    /// 全ルームの概要を取得
    pub async fn execute(&self) -> Vec<RoomOverview> {
        self.store.list_rooms().await
    }
}
