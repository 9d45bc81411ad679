//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use hiroba_shared::time::{millis_to_rfc3339, now_unix_millis};

use crate::domain::{GatewayError, RoomId};
use crate::infrastructure::dto::http::{
    CredentialRequestDto, CredentialResponseDto, ErrorDto, HealthDto, MemberDetailDto,
    RoomDetailDto, RoomListDto, RoomSummaryDto,
};

use super::super::state::AppState;

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthDto> {
    Json(HealthDto {
        status: "healthy".to_string(),
        timestamp: millis_to_rfc3339(now_unix_millis()),
        rooms_count: state.store.room_count().await,
        media_configured: state.gateway.is_configured(),
    })
}

/// Get list of rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<RoomListDto> {
    let overviews = state.get_rooms_usecase.execute().await;

    // Domain Model から DTO への変換
    let rooms: Vec<RoomSummaryDto> = overviews
        .into_iter()
        .map(|room| RoomSummaryDto {
            id: room.id.into_string(),
            user_count: room.user_count,
            active_mics: room.active_mics,
            created_at: millis_to_rfc3339(room.created_at.value()),
            updated_at: millis_to_rfc3339(room.updated_at.value()),
        })
        .collect();

    let total = rooms.len();
    Json(RoomListDto { rooms, total })
}

/// Get room detail by ID
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    let room_id = RoomId::new(room_id).map_err(|_| StatusCode::NOT_FOUND)?;

    match state.get_room_detail_usecase.execute(&room_id).await {
        Ok(detail) => {
            // Domain Model から DTO への変換
            let room_detail = RoomDetailDto {
                id: detail.id.into_string(),
                users: detail
                    .members
                    .iter()
                    .map(|m| MemberDetailDto {
                        name: m.name.as_str().to_string(),
                        joined_at: millis_to_rfc3339(m.joined_at.value()),
                    })
                    .collect(),
                mic_slots: detail
                    .mic_slots
                    .into_iter()
                    .map(|(slot, name)| (slot, name.into_string()))
                    .collect(),
                message_count: detail.message_count,
                created_at: millis_to_rfc3339(detail.created_at.value()),
                updated_at: millis_to_rfc3339(detail.updated_at.value()),
            };
            Ok(Json(room_detail))
        }
        Err(_) => Err(StatusCode::NOT_FOUND),
    }
}

/// Issue a media-session credential
pub async fn issue_credential(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CredentialRequestDto>,
) -> Result<Json<CredentialResponseDto>, (StatusCode, Json<ErrorDto>)> {
    match state
        .issue_credential_usecase
        .execute(request.user_id)
        .await
    {
        Ok(credential) => Ok(Json(CredentialResponseDto {
            app_id: credential.app_id,
            user_id: credential.user_id,
            signature: credential.signature,
            expires_in: credential.expires_in,
        })),
        Err(GatewayError::NotConfigured) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorDto {
                error: "media credential issuer is not configured".to_string(),
            }),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorDto {
                error: e.to_string(),
            }),
        )),
    }
}
