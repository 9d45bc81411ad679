//! HTTP API request/response DTOs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Response of `GET /api/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
    pub timestamp: String,
    pub rooms_count: usize,
    pub media_configured: bool,
}

/// One room entry of `GET /api/rooms`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub id: String,
    pub user_count: usize,
    pub active_mics: usize,
    pub created_at: String,
    pub updated_at: String,
}

/// Response of `GET /api/rooms`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomListDto {
    pub rooms: Vec<RoomSummaryDto>,
    pub total: usize,
}

/// Member entry of `GET /api/rooms/{room_id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberDetailDto {
    pub name: String,
    pub joined_at: String,
}

/// Response of `GET /api/rooms/{room_id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomDetailDto {
    pub id: String,
    pub users: Vec<MemberDetailDto>,
    pub mic_slots: BTreeMap<u8, String>,
    pub message_count: usize,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body of `POST /api/media/credential`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRequestDto {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Response of `POST /api/media/credential`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialResponseDto {
    pub app_id: String,
    pub user_id: String,
    pub signature: String,
    pub expires_in: u64,
}

/// Error body shared by the HTTP endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDto {
    pub error: String,
}
