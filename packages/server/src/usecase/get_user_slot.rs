//! UseCase: ユーザーのスロット照会処理

use std::sync::Arc;

use crate::domain::{DisplayName, RoomError, RoomId, RoomStore};

/// ユーザーのスロット照会のユースケース（読み取り専用）
pub struct GetUserSlotUseCase {
    store: Arc<dyn RoomStore>,
}

impl GetUserSlotUseCase {
    pub fn new(store: Arc<dyn RoomStore>) -> Self {
        Self { store }
    }

    /// 指定した表示名が保持しているスロットを返す
    ///
    /// # Returns
    ///
    /// * `Ok(Some(slot))` - ユーザーがスロットを保持している
    /// * `Ok(None)` - ユーザーはスロットを保持していない
    /// * `Err(RoomError)` - ルームが存在しない
    pub async fn execute(
        &self,
        room_id: &RoomId,
        user_name: &DisplayName,
    ) -> Result<Option<u8>, RoomError> {
        self.store.slot_of(room_id, user_name).await
    }
}
