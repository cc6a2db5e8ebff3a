use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::moniker::RoomCodeGenerator;
use super::room::Room;

/// Process-wide directory of live rooms
///
/// The directory has its own lock, independent of per-room locks: creation
/// and eviction race with lookups from many rooms' handlers concurrently,
/// but never with the rooms' own mutations.
pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, Arc<Room>>>,
    code_generator: Arc<dyn RoomCodeGenerator>,
}

impl RoomRegistry {
    pub fn new(code_generator: Arc<dyn RoomCodeGenerator>) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            code_generator,
        }
    }

    /// Creates a room under a freshly generated code, regenerating until the
    /// code does not collide with a live room
    ///
    /// The check-and-insert is atomic under the directory lock, so two
    /// concurrent creations racing on the same generated code resolve to two
    /// distinct rooms.
    #[instrument(skip(self))]
    pub async fn create(&self, name: &str) -> Arc<Room> {
        loop {
            let code = self.code_generator.generate().await;

            let mut rooms = self.rooms.lock().unwrap();
            if rooms.contains_key(&code) {
                debug!(code = %code, "Generated room code collides, retrying");
                continue;
            }

            let room = Arc::new(Room::new(name, &code));
            rooms.insert(code.clone(), Arc::clone(&room));
            info!(code = %code, name = %name, "Room created");
            return room;
        }
    }

    pub fn get(&self, code: &str) -> Option<Arc<Room>> {
        self.rooms.lock().unwrap().get(code).cloned()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.lock().unwrap().len()
    }

    /// On-demand empty check after a subscriber disconnects: starts the
    /// empty-room clock if nobody is connected anymore
    pub fn note_disconnect(&self, code: &str) {
        if let Some(room) = self.get(code) {
            if room.empty_marker().is_some() {
                debug!(code = %code, "Room has no subscribers, empty clock running");
            }
        }
    }

    /// Periodic maintenance pass over all rooms
    ///
    /// Evicts timed-out players per room, reconciles empty-room markers, and
    /// disposes rooms that have been empty for longer than the grace window.
    /// Work on one room never touches another, so a misbehaving room cannot
    /// abort the sweep. Returns the number of rooms disposed.
    #[instrument(skip(self))]
    pub fn sweep(&self, empty_room_grace: Duration, player_grace: Duration) -> usize {
        let rooms: Vec<(String, Arc<Room>)> = {
            let rooms = self.rooms.lock().unwrap();
            rooms
                .iter()
                .map(|(code, room)| (code.clone(), Arc::clone(room)))
                .collect()
        };

        let cutoff = Utc::now()
            - chrono::Duration::from_std(empty_room_grace)
                .unwrap_or_else(|_| chrono::Duration::MAX);

        let mut disposed = 0;
        for (code, room) in rooms {
            room.evict_stale_players(player_grace);

            match room.empty_marker() {
                Some(empty_since) if empty_since < cutoff => {
                    info!(code = %code, empty_since = %empty_since, "Removing empty room");
                    self.rooms.lock().unwrap().remove(&code);
                    room.dispose();
                    disposed += 1;
                }
                Some(empty_since) => {
                    debug!(code = %code, empty_since = %empty_since, "Room is empty, within grace");
                }
                None => {}
            }
        }

        disposed
    }
}
