use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::Ticket;

/// Request payload for creating a new room
#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
}

/// Response for room creation
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomResponse {
    pub join_code: String,
}

/// Request payload for joining a room
///
/// `owner: true` forcibly claims ownership after joining (used by the room
/// creator's first join).
#[derive(Debug, Deserialize)]
pub struct JoinRoomRequest {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub spectator: bool,
    #[serde(default)]
    pub owner: bool,
}

/// Request payload for casting a vote; `value: null` retracts
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub value: Option<u32>,
}

/// Request payload for a permanent ownership transfer
#[derive(Debug, Deserialize)]
pub struct SetHostRequest {
    pub user: Uuid,
}

/// Request payload for queueing tracker issues as tickets
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueTicketRequest {
    pub resource_id: String,
    pub ids: Vec<String>,
}

/// Query parameters for reordering (`toIndex` present) or removing a ticket
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyQueueParams {
    pub from_index: usize,
    pub to_index: Option<usize>,
}

/// Response for every queue modification
#[derive(Debug, Serialize, Deserialize)]
pub struct ModifyTicketQueueResponse {
    pub tickets: Vec<Ticket>,
    pub success: bool,
}

/// Query parameters for the room event stream
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamParams {
    pub player_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PingResponse {
    pub message: String,
}
