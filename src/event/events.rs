use serde_json::{json, Value};

use crate::room::models::{Player, RoomSnapshot, Ticket, Vote};

/// Events that can occur in a planning poker room
///
/// Events represent facts about things that have already happened. They are
/// broadcast to every subscriber of the room's event stream; clients apply
/// them on top of the `Init` snapshot they received when connecting.
///
/// `Init` and `Heartbeat` are synthesized per subscriber (their snapshots are
/// role-scoped: only the owner sees the ticket queue), the rest carry the
/// canonical payload shared by all subscribers.
#[derive(Debug, Clone)]
pub enum RoomEvent {
    /// Initial room state sent once to a newly connected subscriber
    Init(RoomSnapshot),

    /// A new player has joined the room
    Join(Player),

    /// A player has left the room for good
    Leave(Player),

    /// A player has cast, changed or retracted a vote
    Vote(Vote),

    /// The current round's votes are now visible
    Reveal,

    /// Votes were cleared and the next ticket (or the empty sentinel) is up
    NextRound(Ticket),

    /// Room ownership moved to this player
    OwnerChange(Player),

    /// A player's flags changed (connected, spectator, owner)
    PlayerUpdate(Player),

    /// Periodic keep-alive carrying the subscriber's current snapshot
    Heartbeat(RoomSnapshot),
}

impl RoomEvent {
    /// Wire name of the event, used as the SSE event field
    pub fn event_type(&self) -> &'static str {
        match self {
            RoomEvent::Init(_) => "Init",
            RoomEvent::Join(_) => "Join",
            RoomEvent::Leave(_) => "Leave",
            RoomEvent::Vote(_) => "Vote",
            RoomEvent::Reveal => "Reveal",
            RoomEvent::NextRound(_) => "NextRound",
            RoomEvent::OwnerChange(_) => "OwnerChange",
            RoomEvent::PlayerUpdate(_) => "PlayerUpdate",
            RoomEvent::Heartbeat(_) => "Heartbeat",
        }
    }

    /// JSON payload of the event as sent on the wire
    pub fn payload(&self) -> Value {
        match self {
            RoomEvent::Init(snapshot) | RoomEvent::Heartbeat(snapshot) => {
                json!(snapshot)
            }
            RoomEvent::Join(player)
            | RoomEvent::Leave(player)
            | RoomEvent::OwnerChange(player)
            | RoomEvent::PlayerUpdate(player) => json!(player),
            RoomEvent::Vote(vote) => json!(vote),
            RoomEvent::Reveal => json!("reveal"),
            RoomEvent::NextRound(ticket) => json!(ticket),
        }
    }
}
