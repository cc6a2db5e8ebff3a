use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A participant in a planning poker room
///
/// Identity is the id; the display name doubles as a secondary reconnection
/// key for clients that lost their stored id. Flags are mutated in place so
/// every snapshot reflects the player's current role.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub is_spectator: bool,
    pub is_owner: bool,
    pub is_connected: bool,
}

impl Player {
    pub fn new(id: Uuid, name: String) -> Self {
        Self {
            id,
            name,
            is_spectator: false,
            is_owner: false,
            is_connected: true,
        }
    }
}

/// A single player's estimate for the current round
///
/// `value: None` is a recorded abstention (a retracted vote), distinct from
/// not having voted at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub voter: Uuid,
    pub value: Option<u32>,
}

/// One unit of work being estimated, sourced from the ticket tracker
///
/// Immutable once constructed; the room only appends, reorders or removes
/// tickets, it never edits their fields. The description is sanitized HTML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub key: String,
    pub type_name: String,
    pub title: String,
    pub icon: String,
    pub description: String,
    pub url: String,
    pub labels: Vec<String>,
}

impl Ticket {
    /// Sentinel for "no ticket in progress" (queue empty or exhausted)
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Role-scoped view of a room, sent as the `Init` payload on connect and as
/// every `Heartbeat` payload
///
/// `tickets` and `current_ticket_index` are present only when the receiving
/// player is the owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub player_id: Uuid,
    pub owner: bool,
    pub friendly_name: String,
    pub players: Vec<Player>,
    pub votes: Vec<Vote>,
    pub owner_id: Uuid,
    pub revealed: bool,
    pub current_ticket: Ticket,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickets: Option<Vec<Ticket>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_ticket_index: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player_starts_connected_without_roles() {
        let player = Player::new(Uuid::new_v4(), "alice".to_string());

        assert!(player.is_connected);
        assert!(!player.is_spectator);
        assert!(!player.is_owner);
    }

    #[test]
    fn test_empty_ticket_sentinel_has_blank_fields() {
        let ticket = Ticket::empty();

        assert!(ticket.id.is_empty());
        assert!(ticket.key.is_empty());
        assert!(ticket.labels.is_empty());
    }

    #[test]
    fn test_snapshot_omits_queue_fields_for_non_owner() {
        let snapshot = RoomSnapshot {
            player_id: Uuid::new_v4(),
            owner: false,
            friendly_name: "Sprint Planning".to_string(),
            players: vec![],
            votes: vec![],
            owner_id: Uuid::nil(),
            revealed: false,
            current_ticket: Ticket::empty(),
            tickets: None,
            current_ticket_index: None,
        };

        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json.get("tickets").is_none());
        assert!(json.get("currentTicketIndex").is_none());
        assert_eq!(json["friendlyName"], "Sprint Planning");
    }
}
