use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use super::models::{Player, RoomSnapshot, Ticket, Vote};
use crate::event::{EventBus, RoomEvent, RoomSubscription};

/// Failures a room reports to its caller
///
/// Everything else (unknown player, spectator voting, out-of-range queue
/// index) is a silent no-op or a boolean result, never an error.
#[derive(Debug, Error)]
pub enum RoomError {
    /// The room was disposed; a join against it means the client is stale
    #[error("room {0} has been disposed")]
    Disposed(String),

    /// Reveal was requested before anyone voted
    #[error("no votes cast")]
    NoVotesCast,
}

/// One planning poker session: players, votes, ownership and ticket queue
///
/// All state lives behind a single mutex so mutations are serialized per
/// room; rooms never contend with each other. Events are collected while the
/// lock is held and published to the bus only after it is released, so a slow
/// subscriber can never stall a mutation.
pub struct Room {
    code: String,
    name: String,
    bus: EventBus,
    inner: Mutex<RoomInner>,
}

struct RoomInner {
    players: Vec<Player>,
    votes: Vec<Vote>,
    tickets: Vec<Ticket>,
    current_ticket_index: usize,
    owner_id: Option<Uuid>,
    original_owner_id: Option<Uuid>,
    original_owner_name: Option<String>,
    revealed: bool,
    disconnected_since: HashMap<Uuid, DateTime<Utc>>,
    empty_since: Option<DateTime<Utc>>,
    disposed: bool,
}

impl Room {
    pub fn new(name: &str, code: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            bus: EventBus::new(),
            inner: Mutex::new(RoomInner {
                players: Vec::new(),
                votes: Vec::new(),
                tickets: Vec::new(),
                current_ticket_index: 0,
                owner_id: None,
                original_owner_id: None,
                original_owner_name: None,
                revealed: false,
                disconnected_since: HashMap::new(),
                empty_since: None,
                disposed: false,
            }),
        }
    }

    /// Unique routing code, assigned at creation
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.lock().unwrap().disposed
    }

    /// Registers a live event stream for this room and clears the empty-room
    /// marker
    pub fn subscribe(&self) -> Result<RoomSubscription, RoomError> {
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.disposed {
                return Err(RoomError::Disposed(self.code.clone()));
            }
            inner.empty_since = None;
        }
        self.bus
            .subscribe()
            .map_err(|_| RoomError::Disposed(self.code.clone()))
    }

    pub fn has_subscribers(&self) -> bool {
        self.bus.has_subscribers()
    }

    /// Joins a player into the room, reconciling reconnections
    ///
    /// Reconciliation order: known id, then known name (client lost its id),
    /// then a fresh player that may inherit ownership if it is the founding
    /// owner coming back. Returns the joining player's role-scoped snapshot.
    pub fn join(
        &self,
        player_id: Uuid,
        player_name: &str,
        wants_spectator: bool,
    ) -> Result<RoomSnapshot, RoomError> {
        let (snapshot, events) = {
            let mut inner = self.inner.lock().unwrap();
            if inner.disposed {
                return Err(RoomError::Disposed(self.code.clone()));
            }

            if let Some(pos) = inner.players.iter().position(|p| p.id == player_id) {
                let events = inner.reactivate(pos);
                (inner.snapshot(&self.name, player_id), events)
            } else if let Some(pos) = inner.players.iter().position(|p| p.name == player_name) {
                // Same display name means the same logical player whose
                // client lost its stored id. Ambiguous when two players pick
                // the same name; the first match wins.
                let reconnected_id = inner.players[pos].id;
                let events = inner.reactivate(pos);
                (inner.snapshot(&self.name, reconnected_id), events)
            } else {
                let inherits_ownership = inner.is_reconnecting_owner(player_id, player_name);

                let mut player = Player::new(player_id, player_name.to_string());
                // The first joiner and a returning founder are always voters.
                player.is_spectator =
                    !inner.players.is_empty() && wants_spectator && !inherits_ownership;
                inner.players.push(player);

                let mut events = Vec::new();
                if inner.owner_id.is_none() || inherits_ownership {
                    events.extend(inner.assign_owner(player_id, false));
                }
                inner.disconnected_since.remove(&player_id);

                let joined = inner
                    .players
                    .iter()
                    .find(|p| p.id == player_id)
                    .cloned()
                    .unwrap_or_else(|| Player::new(player_id, player_name.to_string()));
                events.push(RoomEvent::Join(joined));

                (inner.snapshot(&self.name, player_id), events)
            }
        };

        debug!(room = %self.code, player = %player_id, "Player joined room");
        self.publish_all(events);
        Ok(snapshot)
    }

    /// Subscribe-without-join: returns the snapshot for an already-joined
    /// player, or an anonymous non-owner snapshot for an unknown id
    ///
    /// Does not create a player and does not touch disconnect bookkeeping.
    pub fn connect(&self, player_id: Uuid) -> RoomSnapshot {
        let mut inner = self.inner.lock().unwrap();
        inner.empty_since = None;
        inner.snapshot(&self.name, player_id)
    }

    /// Role-scoped snapshot of the current state for the given player
    pub fn state(&self, player_id: Uuid) -> RoomSnapshot {
        self.inner.lock().unwrap().snapshot(&self.name, player_id)
    }

    /// Assigns ownership to a known player
    ///
    /// Exactly one owner at a time; the new owner cannot be a spectator.
    /// `permanent` also rewrites the sticky original-owner record, so the
    /// room no longer restores ownership to the founding player.
    pub fn set_owner(&self, player_id: Uuid, permanent: bool) {
        let events = {
            let mut inner = self.inner.lock().unwrap();
            if inner.disposed {
                return;
            }
            inner.assign_owner(player_id, permanent)
        };
        self.publish_all(events);
    }

    /// Toggles spectator state; the current owner can never become one
    pub fn set_spectator(&self, player_id: Uuid, is_spectator: bool) {
        let events = {
            let mut inner = self.inner.lock().unwrap();
            if inner.disposed || inner.owner_id == Some(player_id) {
                return;
            }
            let Some(player) = inner.players.iter_mut().find(|p| p.id == player_id) else {
                return;
            };
            player.is_spectator = is_spectator;
            vec![RoomEvent::PlayerUpdate(player.clone())]
        };
        self.publish_all(events);
    }

    /// Connection drop: the player stays a member (vote included) until the
    /// grace window expires, and keeps ownership in the meantime
    pub fn leave_transient(&self, player_id: Uuid) {
        let events = {
            let mut inner = self.inner.lock().unwrap();
            if inner.disposed {
                return;
            }
            let Some(player) = inner.players.iter_mut().find(|p| p.id == player_id) else {
                return;
            };
            player.is_connected = false;
            let update = RoomEvent::PlayerUpdate(player.clone());
            inner.disconnected_since.insert(player_id, Utc::now());
            vec![update]
        };
        self.publish_all(events);
    }

    /// User-initiated leave: removes the player and their vote immediately;
    /// an owner leaving makes the room ownerless until the next join or sweep
    pub fn leave_explicit(&self, player_id: Uuid) {
        let events = {
            let mut inner = self.inner.lock().unwrap();
            let Some(pos) = inner.players.iter().position(|p| p.id == player_id) else {
                return;
            };
            let player = inner.players.remove(pos);
            inner.votes.retain(|v| v.voter != player_id);
            inner.disconnected_since.remove(&player_id);

            if inner.disposed {
                return;
            }
            if inner.owner_id == Some(player_id) {
                inner.owner_id = None;
            }
            vec![RoomEvent::Leave(player)]
        };
        self.publish_all(events);
    }

    /// Records a vote, replacing any prior vote from the same player
    ///
    /// `None` is a recorded abstention and also overwrites a numeric vote.
    /// Unknown players and spectators are ignored.
    pub fn vote(&self, player_id: Uuid, value: Option<u32>) {
        let events = {
            let mut inner = self.inner.lock().unwrap();
            if inner.disposed {
                return;
            }
            match inner.players.iter().find(|p| p.id == player_id) {
                Some(player) if !player.is_spectator => {}
                _ => return,
            }
            inner.votes.retain(|v| v.voter != player_id);
            let vote = Vote {
                voter: player_id,
                value,
            };
            inner.votes.push(vote.clone());
            vec![RoomEvent::Vote(vote)]
        };
        self.publish_all(events);
    }

    pub fn has_votes(&self) -> bool {
        !self.inner.lock().unwrap().votes.is_empty()
    }

    /// Makes the current round's votes visible; idempotent once votes exist
    pub fn reveal(&self) -> Result<(), RoomError> {
        let events = {
            let mut inner = self.inner.lock().unwrap();
            if inner.disposed {
                return Ok(());
            }
            if inner.votes.is_empty() {
                return Err(RoomError::NoVotesCast);
            }
            inner.revealed = true;
            vec![RoomEvent::Reveal]
        };
        self.publish_all(events);
        Ok(())
    }

    /// Clears votes, hides results and advances to the next queued ticket
    /// (or the empty sentinel once the queue is exhausted)
    pub fn next_round(&self) {
        let events = {
            let mut inner = self.inner.lock().unwrap();
            if inner.disposed {
                return;
            }
            inner.votes.clear();
            inner.revealed = false;
            if inner.current_ticket_index < inner.tickets.len() {
                inner.current_ticket_index += 1;
            }
            vec![RoomEvent::NextRound(inner.current_ticket())]
        };
        self.publish_all(events);
    }

    /// Clears votes and hides results without advancing the ticket queue
    pub fn reset(&self) {
        let events = {
            let mut inner = self.inner.lock().unwrap();
            if inner.disposed {
                return;
            }
            inner.votes.clear();
            inner.revealed = false;
            vec![RoomEvent::NextRound(inner.current_ticket())]
        };
        self.publish_all(events);
    }

    /// Appends a ticket to the queue
    pub fn queue_ticket(&self, ticket: Ticket) {
        let mut inner = self.inner.lock().unwrap();
        if inner.disposed {
            return;
        }
        inner.tickets.push(ticket);
    }

    /// Moves a queued ticket; the in-progress ticket may not be moved and
    /// the current index keeps pointing at the same logical ticket
    pub fn reorder_ticket(&self, from_index: usize, to_index: usize) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if inner.disposed {
            return false;
        }
        if from_index >= inner.tickets.len() || to_index >= inner.tickets.len() {
            return false;
        }
        if from_index == to_index
            || from_index == inner.current_ticket_index
            || to_index == inner.current_ticket_index
        {
            return false;
        }

        let ticket = inner.tickets.remove(from_index);
        inner.tickets.insert(to_index, ticket);

        if from_index < inner.current_ticket_index && to_index > inner.current_ticket_index {
            inner.current_ticket_index -= 1;
        } else if from_index > inner.current_ticket_index && to_index < inner.current_ticket_index {
            inner.current_ticket_index += 1;
        }
        true
    }

    /// Removes a queued ticket; the in-progress ticket may not be removed
    pub fn remove_ticket(&self, index: usize) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if inner.disposed {
            return false;
        }
        if index >= inner.tickets.len() || index == inner.current_ticket_index {
            return false;
        }

        inner.tickets.remove(index);
        if index < inner.current_ticket_index {
            inner.current_ticket_index -= 1;
        }
        true
    }

    /// Current ticket queue (for queue-modification responses)
    pub fn tickets(&self) -> Vec<Ticket> {
        self.inner.lock().unwrap().tickets.clone()
    }

    /// Permanently removes players disconnected for longer than the grace
    /// window, then re-establishes the owner invariant: a non-empty room
    /// always converges to having an owner (first non-spectator, falling
    /// back to the first player)
    pub fn evict_stale_players(&self, grace: Duration) {
        let events = {
            let mut inner = self.inner.lock().unwrap();
            if inner.disposed {
                return;
            }

            let cutoff = Utc::now()
                - chrono::Duration::from_std(grace).unwrap_or_else(|_| chrono::Duration::MAX);

            let timed_out: Vec<Uuid> = inner
                .disconnected_since
                .iter()
                .filter(|(_, since)| **since < cutoff)
                .map(|(id, _)| *id)
                .collect();

            for player_id in timed_out {
                inner.disconnected_since.remove(&player_id);
                if let Some(pos) = inner.players.iter().position(|p| p.id == player_id) {
                    info!(room = %self.code, player = %player_id, "Evicting timed-out player");
                    inner.players.remove(pos);
                    inner.votes.retain(|v| v.voter != player_id);
                }
                if inner.owner_id == Some(player_id) {
                    inner.owner_id = None;
                }
            }

            if inner.players.is_empty() || inner.owner_id.is_some() {
                Vec::new()
            } else {
                let new_owner = inner
                    .players
                    .iter()
                    .find(|p| !p.is_spectator)
                    .unwrap_or(&inner.players[0])
                    .id;
                inner.assign_owner(new_owner, false)
            }
        };
        self.publish_all(events);
    }

    /// Reconciles the empty-room marker with the current subscriber count
    /// and returns it: `None` while anyone is connected, otherwise the time
    /// the room first became empty
    pub fn empty_marker(&self) -> Option<DateTime<Utc>> {
        let has_subscribers = self.bus.has_subscribers();
        let mut inner = self.inner.lock().unwrap();
        if has_subscribers {
            inner.empty_since = None;
            None
        } else {
            Some(*inner.empty_since.get_or_insert_with(Utc::now))
        }
    }

    /// Terminal: rejects all further mutation and ends every subscription
    pub fn dispose(&self) {
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.disposed {
                return;
            }
            inner.disposed = true;
        }
        self.bus.close();
        info!(room = %self.code, "Room disposed");
    }

    fn publish_all(&self, events: Vec<RoomEvent>) {
        for event in events {
            self.bus.publish(event);
        }
    }
}

impl RoomInner {
    /// Marks a known player reconnected and clears their disconnect record
    fn reactivate(&mut self, pos: usize) -> Vec<RoomEvent> {
        let player_id = self.players[pos].id;
        self.disconnected_since.remove(&player_id);
        self.players[pos].is_connected = true;
        vec![RoomEvent::PlayerUpdate(self.players[pos].clone())]
    }

    /// Whether a fresh join should inherit ownership: the current owner
    /// rejoining within the grace window under the same id, or the recorded
    /// founding owner returning to an ownerless room they are absent from
    fn is_reconnecting_owner(&self, player_id: Uuid, player_name: &str) -> bool {
        (self.disconnected_since.contains_key(&player_id) && self.owner_id == Some(player_id))
            || (self.original_owner_id.is_some()
                && self.original_owner_name.as_deref() == Some(player_name)
                && self.owner_id.is_none()
                && self.players.iter().all(|p| Some(p.id) != self.original_owner_id))
    }

    /// Moves ownership to the given player; no-op for unknown ids
    fn assign_owner(&mut self, player_id: Uuid, permanent: bool) -> Vec<RoomEvent> {
        let Some(pos) = self.players.iter().position(|p| p.id == player_id) else {
            return Vec::new();
        };

        if self.original_owner_id.is_none() || permanent {
            self.original_owner_id = Some(player_id);
            self.original_owner_name = Some(self.players[pos].name.clone());
        }

        for player in &mut self.players {
            player.is_owner = false;
        }
        let owner = &mut self.players[pos];
        owner.is_owner = true;
        owner.is_spectator = false;
        self.owner_id = Some(player_id);

        let owner = owner.clone();
        vec![
            RoomEvent::PlayerUpdate(owner.clone()),
            RoomEvent::OwnerChange(owner),
        ]
    }

    fn current_ticket(&self) -> Ticket {
        self.tickets
            .get(self.current_ticket_index)
            .cloned()
            .unwrap_or_else(Ticket::empty)
    }

    fn snapshot(&self, friendly_name: &str, player_id: Uuid) -> RoomSnapshot {
        let is_owner = self.owner_id == Some(player_id);
        RoomSnapshot {
            player_id,
            owner: is_owner,
            friendly_name: friendly_name.to_string(),
            players: self.players.clone(),
            votes: self.votes.clone(),
            owner_id: self.owner_id.unwrap_or_else(Uuid::nil),
            revealed: self.revealed,
            current_ticket: self.current_ticket(),
            tickets: is_owner.then(|| self.tickets.clone()),
            current_ticket_index: is_owner.then_some(self.current_ticket_index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ticket(key: &str) -> Ticket {
        Ticket {
            id: key.to_string(),
            key: key.to_string(),
            title: format!("Ticket {key}"),
            ..Ticket::default()
        }
    }

    fn room_with_tickets(keys: &[&str]) -> Room {
        let room = Room::new("Sprint Planning", "test-room");
        for key in keys {
            room.queue_ticket(ticket(key));
        }
        room
    }

    #[test]
    fn test_first_joiner_becomes_owner_and_voter() {
        let room = Room::new("Sprint Planning", "test-room");
        let alice = Uuid::new_v4();

        let snapshot = room.join(alice, "alice", true).unwrap();

        // Spectator request is overridden for the very first joiner.
        assert!(snapshot.owner);
        assert_eq!(snapshot.owner_id, alice);
        assert!(!snapshot.players[0].is_spectator);
        assert!(snapshot.tickets.is_some());
    }

    #[test]
    fn test_second_joiner_can_spectate_and_is_not_owner() {
        let room = Room::new("Sprint Planning", "test-room");
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        room.join(alice, "alice", false).unwrap();
        let snapshot = room.join(bob, "bob", true).unwrap();

        assert!(!snapshot.owner);
        assert_eq!(snapshot.owner_id, alice);
        let bob_player = snapshot.players.iter().find(|p| p.id == bob).unwrap();
        assert!(bob_player.is_spectator);
        assert!(snapshot.tickets.is_none());
    }

    #[test]
    fn test_rejoin_with_known_id_keeps_identity() {
        let room = Room::new("Sprint Planning", "test-room");
        let alice = Uuid::new_v4();

        room.join(alice, "alice", false).unwrap();
        room.leave_transient(alice);
        let snapshot = room.join(alice, "alice", true).unwrap();

        assert_eq!(snapshot.players.len(), 1);
        assert!(snapshot.owner);
        assert!(snapshot.players[0].is_connected);
        // Spectator request is ignored for existing players.
        assert!(!snapshot.players[0].is_spectator);
    }

    #[test]
    fn test_rejoin_by_name_reclaims_identity_with_new_id() {
        let room = Room::new("Sprint Planning", "test-room");
        let old_id = Uuid::new_v4();
        let new_id = Uuid::new_v4();

        room.join(old_id, "alice", false).unwrap();
        room.leave_transient(old_id);
        let snapshot = room.join(new_id, "alice", false).unwrap();

        // The snapshot is issued for the original identity.
        assert_eq!(snapshot.player_id, old_id);
        assert_eq!(snapshot.players.len(), 1);
        assert!(snapshot.owner);
    }

    #[test]
    fn test_vote_replaces_prior_vote() {
        let room = Room::new("Sprint Planning", "test-room");
        let alice = Uuid::new_v4();
        room.join(alice, "alice", false).unwrap();

        room.vote(alice, Some(3));
        room.vote(alice, Some(8));

        let snapshot = room.state(alice);
        assert_eq!(snapshot.votes.len(), 1);
        assert_eq!(snapshot.votes[0].value, Some(8));
    }

    #[test]
    fn test_retracted_vote_is_still_recorded() {
        let room = Room::new("Sprint Planning", "test-room");
        let alice = Uuid::new_v4();
        room.join(alice, "alice", false).unwrap();

        room.vote(alice, Some(5));
        room.vote(alice, None);

        let snapshot = room.state(alice);
        assert_eq!(snapshot.votes.len(), 1);
        assert_eq!(snapshot.votes[0].value, None);
        assert!(room.has_votes());
    }

    #[test]
    fn test_spectator_and_unknown_votes_are_ignored() {
        let room = Room::new("Sprint Planning", "test-room");
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        room.join(alice, "alice", false).unwrap();
        room.join(bob, "bob", true).unwrap();

        room.vote(bob, Some(5));
        room.vote(Uuid::new_v4(), Some(5));

        assert!(!room.has_votes());
    }

    #[test]
    fn test_reveal_requires_votes_and_is_idempotent() {
        let room = Room::new("Sprint Planning", "test-room");
        let alice = Uuid::new_v4();
        room.join(alice, "alice", false).unwrap();

        assert!(matches!(room.reveal(), Err(RoomError::NoVotesCast)));

        room.vote(alice, Some(5));
        room.reveal().unwrap();
        room.reveal().unwrap();

        assert!(room.state(alice).revealed);
    }

    #[test]
    fn test_next_round_clears_votes_and_advances_ticket() {
        let room = room_with_tickets(&["PP-1", "PP-2"]);
        let alice = Uuid::new_v4();
        room.join(alice, "alice", false).unwrap();
        room.vote(alice, Some(5));
        room.reveal().unwrap();

        room.next_round();

        let snapshot = room.state(alice);
        assert!(snapshot.votes.is_empty());
        assert!(!snapshot.revealed);
        assert_eq!(snapshot.current_ticket.key, "PP-2");
    }

    #[test]
    fn test_next_round_past_queue_end_yields_empty_sentinel() {
        let room = room_with_tickets(&["PP-1"]);
        let alice = Uuid::new_v4();
        room.join(alice, "alice", false).unwrap();

        room.next_round();
        room.next_round();
        room.next_round();

        let snapshot = room.state(alice);
        assert_eq!(snapshot.current_ticket, Ticket::empty());
        assert_eq!(snapshot.current_ticket_index, Some(1));
    }

    #[test]
    fn test_reset_clears_round_without_advancing() {
        let room = room_with_tickets(&["PP-1", "PP-2"]);
        let alice = Uuid::new_v4();
        room.join(alice, "alice", false).unwrap();
        room.vote(alice, Some(5));
        room.reveal().unwrap();

        room.reset();

        let snapshot = room.state(alice);
        assert!(snapshot.votes.is_empty());
        assert!(!snapshot.revealed);
        assert_eq!(snapshot.current_ticket.key, "PP-1");
    }

    #[rstest]
    #[case(0, 0)] // same index
    #[case(5, 1)] // from out of bounds
    #[case(1, 5)] // to out of bounds
    fn test_reorder_rejects_invalid_indices(#[case] from: usize, #[case] to: usize) {
        let room = room_with_tickets(&["PP-1", "PP-2", "PP-3"]);
        assert!(!room.reorder_ticket(from, to));
    }

    #[test]
    fn test_reorder_protects_current_ticket() {
        let room = room_with_tickets(&["PP-1", "PP-2", "PP-3"]);

        // Index 0 is in progress: neither endpoint may touch it.
        assert!(!room.reorder_ticket(0, 2));
        assert!(!room.reorder_ticket(2, 0));
        assert!(room.reorder_ticket(1, 2));

        let keys: Vec<_> = room.tickets().into_iter().map(|t| t.key).collect();
        assert_eq!(keys, vec!["PP-1", "PP-3", "PP-2"]);
    }

    #[test]
    fn test_reorder_across_current_keeps_pointer_on_same_ticket() {
        let room = room_with_tickets(&["PP-1", "PP-2", "PP-3", "PP-4"]);
        let alice = Uuid::new_v4();
        room.join(alice, "alice", false).unwrap();
        room.next_round(); // current is now PP-2 at index 1

        assert!(room.reorder_ticket(0, 3));
        assert_eq!(room.state(alice).current_ticket.key, "PP-2");
        assert_eq!(room.state(alice).current_ticket_index, Some(0));

        assert!(room.reorder_ticket(3, 1)); // move PP-1 back below current
        assert_eq!(room.state(alice).current_ticket.key, "PP-2");
        assert_eq!(room.state(alice).current_ticket_index, Some(1));
    }

    #[test]
    fn test_remove_protects_current_and_adjusts_index() {
        let room = room_with_tickets(&["PP-1", "PP-2", "PP-3"]);
        let alice = Uuid::new_v4();
        room.join(alice, "alice", false).unwrap();
        room.next_round(); // current is PP-2 at index 1

        assert!(!room.remove_ticket(1));
        assert!(!room.remove_ticket(7));
        assert!(room.remove_ticket(0));

        let snapshot = room.state(alice);
        assert_eq!(snapshot.current_ticket.key, "PP-2");
        assert_eq!(snapshot.current_ticket_index, Some(0));
    }

    #[test]
    fn test_eviction_reassigns_owner_to_first_non_spectator() {
        let room = Room::new("Sprint Planning", "test-room");
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let carol = Uuid::new_v4();
        room.join(alice, "alice", false).unwrap();
        room.join(bob, "bob", true).unwrap(); // spectator
        room.join(carol, "carol", false).unwrap();

        room.leave_transient(alice);
        room.evict_stale_players(Duration::ZERO);

        let snapshot = room.state(carol);
        assert_eq!(snapshot.players.len(), 2);
        assert_eq!(snapshot.owner_id, carol);
    }

    #[test]
    fn test_eviction_within_grace_window_preserves_owner() {
        let room = Room::new("Sprint Planning", "test-room");
        let alice = Uuid::new_v4();
        room.join(alice, "alice", false).unwrap();
        room.leave_transient(alice);

        room.evict_stale_players(Duration::from_secs(30 * 60));

        let snapshot = room.state(alice);
        assert_eq!(snapshot.players.len(), 1);
        assert_eq!(snapshot.owner_id, alice);
    }

    #[test]
    fn test_non_empty_room_converges_to_having_an_owner() {
        let room = Room::new("Sprint Planning", "test-room");
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        room.join(alice, "alice", false).unwrap();
        room.join(bob, "bob", true).unwrap(); // only a spectator remains

        room.leave_transient(alice);
        room.evict_stale_players(Duration::ZERO);

        // Fallback: even a spectator is promoted rather than leaving the
        // room ownerless (and loses spectator status in the process).
        let snapshot = room.state(bob);
        assert_eq!(snapshot.owner_id, bob);
        assert!(!snapshot.players[0].is_spectator);
    }

    #[test]
    fn test_original_owner_reclaims_ownership_after_eviction() {
        let room = Room::new("Sprint Planning", "test-room");
        let alice = Uuid::new_v4();
        room.join(alice, "alice", false).unwrap();

        // Alice drops, gets evicted, room is ownerless and empty of her.
        room.leave_transient(alice);
        room.leave_explicit(alice);

        // She returns under a brand-new id but her recorded name.
        let new_id = Uuid::new_v4();
        let snapshot = room.join(new_id, "alice", false).unwrap();

        assert!(snapshot.owner);
        assert_eq!(snapshot.owner_id, new_id);
    }

    #[test]
    fn test_explicit_leave_removes_player_and_vote() {
        let room = Room::new("Sprint Planning", "test-room");
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        room.join(alice, "alice", false).unwrap();
        room.join(bob, "bob", false).unwrap();
        room.vote(bob, Some(3));

        room.leave_explicit(bob);

        let snapshot = room.state(alice);
        assert_eq!(snapshot.players.len(), 1);
        assert!(snapshot.votes.is_empty());
    }

    #[test]
    fn test_owner_cannot_become_spectator() {
        let room = Room::new("Sprint Planning", "test-room");
        let alice = Uuid::new_v4();
        room.join(alice, "alice", false).unwrap();

        room.set_spectator(alice, true);

        assert!(!room.state(alice).players[0].is_spectator);
    }

    #[test]
    fn test_set_owner_transfers_and_clears_spectator_flag() {
        let room = Room::new("Sprint Planning", "test-room");
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        room.join(alice, "alice", false).unwrap();
        room.join(bob, "bob", true).unwrap();

        room.set_owner(bob, true);

        let snapshot = room.state(bob);
        assert_eq!(snapshot.owner_id, bob);
        let bob_player = snapshot.players.iter().find(|p| p.id == bob).unwrap();
        assert!(bob_player.is_owner);
        assert!(!bob_player.is_spectator);
        let alice_player = snapshot.players.iter().find(|p| p.id == alice).unwrap();
        assert!(!alice_player.is_owner);
    }

    #[test]
    fn test_disposed_room_rejects_join_and_ignores_mutations() {
        let room = Room::new("Sprint Planning", "test-room");
        let alice = Uuid::new_v4();
        room.join(alice, "alice", false).unwrap();
        room.dispose();

        assert!(matches!(
            room.join(Uuid::new_v4(), "bob", false),
            Err(RoomError::Disposed(_))
        ));
        assert!(room.subscribe().is_err());

        room.vote(alice, Some(5));
        assert!(!room.has_votes());
        room.queue_ticket(ticket("PP-1"));
        assert!(room.tickets().is_empty());
    }

    #[tokio::test]
    async fn test_reconnect_within_grace_emits_no_owner_change() {
        let room = Room::new("Sprint Planning", "test-room");
        let alice = Uuid::new_v4();
        room.join(alice, "alice", false).unwrap();

        let mut subscription = room.subscribe().unwrap();
        room.leave_transient(alice);
        room.join(alice, "alice", false).unwrap();
        drop(room);

        let mut seen = Vec::new();
        while let Some(event) = subscription.recv().await {
            seen.push(event.event_type());
        }
        assert_eq!(seen, vec!["PlayerUpdate", "PlayerUpdate"]);
    }

    #[tokio::test]
    async fn test_eviction_emits_owner_change_to_subscribers() {
        let room = Room::new("Sprint Planning", "test-room");
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        room.join(alice, "alice", false).unwrap();
        room.join(bob, "bob", false).unwrap();
        room.leave_transient(alice);

        let mut subscription = room.subscribe().unwrap();
        room.evict_stale_players(Duration::ZERO);
        drop(room);

        let mut seen = Vec::new();
        while let Some(event) = subscription.recv().await {
            seen.push(event.event_type());
        }
        assert!(seen.contains(&"OwnerChange"));
    }
}
