use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::Rng;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::game::{self, Room, RoomCommand, RoomEvent};
use crate::types::GameConfig;
use crate::words::WordBank;

const ROOM_CODE_LEN: usize = 6;
const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

fn create_room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LEN)
        .map(|_| char::from(ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())]))
        .collect()
}

/// Canonical form of a user-typed room code.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// A cheap, cloneable reference to a running room task.
#[derive(Clone)]
pub struct RoomHandle {
    /// Distinguishes room instances that reuse a code.
    pub id: Uuid,
    pub code: String,
    pub cmd_tx: mpsc::Sender<RoomCommand>,
    pub event_tx: broadcast::Sender<RoomEvent>,
}

impl RoomHandle {
    /// Queues a command. Returns false if the room has already shut down.
    pub async fn send(&self, cmd: RoomCommand) -> bool {
        self.cmd_tx.send(cmd).await.is_ok()
    }
}

/// Registry holds all active rooms, keyed by room code.
pub struct Registry {
    rooms: DashMap<String, RoomHandle>,
    config: GameConfig,
    words: Arc<WordBank>,
}

impl Registry {
    pub fn new(config: GameConfig, words: WordBank) -> Arc<Self> {
        Arc::new(Self {
            rooms: DashMap::new(),
            config,
            words: Arc::new(words),
        })
    }

    /// Create a new room under a fresh code and spawn its task.
    pub fn create(self: &Arc<Self>) -> RoomHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(256);
        let (event_tx, _) = broadcast::channel(1024);
        let id = Uuid::new_v4();

        let handle = loop {
            let code = create_room_code();
            match self.rooms.entry(code.clone()) {
                Entry::Occupied(_) => {
                    tracing::debug!("Room code {} already taken, retrying", code);
                }
                Entry::Vacant(slot) => {
                    let handle = RoomHandle {
                        id,
                        code,
                        cmd_tx: cmd_tx.clone(),
                        event_tx: event_tx.clone(),
                    };
                    slot.insert(handle.clone());
                    break handle;
                }
            }
        };

        let room = Room::new(
            handle.code.clone(),
            self.config.clone(),
            self.words.clone(),
            event_tx,
            cmd_tx.downgrade(),
        );

        let task = tokio::spawn(game::room_task(room, cmd_rx, self.clone(), id));

        // A panicking room only takes itself down.
        let registry = self.clone();
        let code = handle.code.clone();
        tokio::spawn(async move {
            if let Err(e) = task.await {
                tracing::error!("Room {} task failed: {}", code, e);
                registry.remove(&code, id);
            }
        });

        tracing::info!("Room created: {}", handle.code);
        handle
    }

    pub fn find(&self, code: &str) -> Option<RoomHandle> {
        self.rooms.get(&normalize_code(code)).map(|r| r.value().clone())
    }

    /// Drops the entry for `code` if it still belongs to room `id`.
    pub fn remove(&self, code: &str, id: Uuid) {
        self.rooms.remove_if(code, |_, handle| handle.id == id);
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
