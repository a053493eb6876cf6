use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::JoinError;

/// A participant in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Connection currently bound to this player.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: String,
    pub score: u32,
    pub is_drawer: bool,
    pub has_guessed: bool,
}

impl Player {
    pub fn new(id: impl Into<String>, name: impl Into<String>, avatar: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            avatar: avatar.into(),
            score: 0,
            is_drawer: false,
            has_guessed: false,
        }
    }
}

/// One drawn line primitive. Coordinates are fractions of the canvas size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeSegment {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub color: String,
    pub width: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_id: Option<String>,
}

impl StrokeSegment {
    /// Clamps the endpoints onto the canvas. Returns `None` for segments that
    /// cannot be drawn at all.
    pub fn normalized(mut self) -> Option<Self> {
        let coords = [self.x0, self.y0, self.x1, self.y1];
        if coords.iter().any(|c| !c.is_finite()) || !self.width.is_finite() || self.width <= 0.0 {
            return None;
        }
        self.x0 = self.x0.clamp(0.0, 1.0);
        self.y0 = self.y0.clamp(0.0, 1.0);
        self.x1 = self.x1.clamp(0.0, 1.0);
        self.y1 = self.y1.clamp(0.0, 1.0);
        Some(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Info,
    Success,
    Error,
}

/// An entry of the room's message log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatMessage {
    Chat {
        id: String,
        sender: String,
        text: String,
    },
    System {
        text: String,
        kind: MessageKind,
    },
}

impl ChatMessage {
    pub fn chat(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Chat {
            id: Uuid::new_v4().to_string(),
            sender: sender.into(),
            text: text.into(),
        }
    }
}

/// Client-visible room status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Waiting,
    ChoosingWord,
    Drawing,
    GameEnd,
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::ChoosingWord => write!(f, "choosing_word"),
            Self::Drawing => write!(f, "drawing"),
            Self::GameEnd => write!(f, "game_end"),
        }
    }
}

/// Snapshot of a room as one connection is allowed to see it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicRoom {
    pub code: String,
    pub players: Vec<Player>,
    pub status: RoomStatus,
    pub current_round: u32,
    pub total_rounds: u32,
    pub drawer_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_word: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub word_choices: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_hint: Option<String>,
    /// Unix epoch milliseconds at which the drawing turn ends.
    pub round_end_time: Option<u64>,
    /// Set between turns while the last answer is on show. `status` still
    /// reads `drawing` then, but no guesses are taken and `currentWord` is
    /// visible to everyone.
    pub revealing: bool,
    pub messages: Vec<ChatMessage>,
}

/// Game configuration loaded from game.json.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameConfig {
    pub total_rounds: u32,
    pub max_players: usize,
    pub choose_seconds: u64,
    pub draw_seconds: u64,
    pub reveal_seconds: u64,
    pub word_hints: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            total_rounds: 3,
            max_players: 10,
            choose_seconds: 15,
            draw_seconds: 60,
            reveal_seconds: 3,
            word_hints: true,
        }
    }
}

impl GameConfig {
    pub fn choose_duration(&self) -> Duration {
        Duration::from_secs(self.choose_seconds)
    }

    pub fn draw_duration(&self) -> Duration {
        // A zero-length turn would make every score computation divide by zero.
        Duration::from_secs(self.draw_seconds.max(1))
    }

    pub fn reveal_duration(&self) -> Duration {
        Duration::from_secs(self.reveal_seconds)
    }
}

/// Messages sent from server to clients via WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMsg {
    Ack {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        room: Option<PublicRoom>,
        #[serde(skip_serializing_if = "Option::is_none")]
        player: Option<Player>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    RoomUpdate(PublicRoom),
    SystemMessage {
        text: String,
        kind: MessageKind,
    },
    ChatMessage {
        id: String,
        sender: String,
        text: String,
    },
    ChooseWord {
        word_choices: Vec<String>,
    },
    DrawLine {
        line: StrokeSegment,
    },
    ClearCanvas,
    CanvasHistory {
        strokes: Vec<StrokeSegment>,
    },
}

impl ServerMsg {
    pub fn joined(room: PublicRoom, player: Player) -> Self {
        Self::Ack {
            success: true,
            room: Some(room),
            player: Some(player),
            message: None,
        }
    }

    pub fn rejected(err: &JoinError) -> Self {
        Self::Ack {
            success: false,
            room: None,
            player: None,
            message: Some(err.to_string()),
        }
    }
}

/// Messages sent from clients to server via WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMsg {
    CreateRoom {
        player_name: String,
        #[serde(default)]
        avatar: String,
    },
    JoinRoom {
        room_code: String,
        player_name: String,
        #[serde(default)]
        avatar: String,
    },
    SendMessage { room_code: String, text: String },
    DrawLine { room_code: String, line: StrokeSegment },
    Undo { room_code: String },
    ClearCanvas { room_code: String },
    StartGame { room_code: String },
    WordSelected { room_code: String, word: String },
    PlayAgain { room_code: String },
    LeaveRoom,
}
