use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use rand::seq::IndexedRandom;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::{self, JoinError};
use crate::projector::{self, Viewer};
use crate::registry::Registry;
use crate::types::*;
use crate::words::WordBank;

/// Number of words offered to the drawer each turn.
pub const WORD_CHOICES: usize = 3;
/// Flat bonus for the drawer on every correct guess.
pub const DRAWER_BONUS: u32 = 50;
/// The room log keeps only this many of the newest entries.
const MAX_MESSAGES: usize = 200;
const MAX_MESSAGE_LEN: usize = 200;

/// Commands the WebSocket sessions (and the room's own timers) send to a
/// room task.
#[derive(Debug)]
pub enum RoomCommand {
    Join {
        conn_id: String,
        name: String,
        avatar: String,
        reply: oneshot::Sender<Result<Player, JoinError>>,
    },
    Leave {
        conn_id: String,
    },
    SendMessage {
        conn_id: String,
        text: String,
    },
    DrawLine {
        conn_id: String,
        line: StrokeSegment,
    },
    Undo {
        conn_id: String,
    },
    ClearCanvas {
        conn_id: String,
    },
    StartGame {
        conn_id: String,
    },
    SelectWord {
        conn_id: String,
        word: String,
    },
    PlayAgain {
        conn_id: String,
    },
    TimerFired {
        timer: TimerKind,
        generation: u64,
    },
}

/// Events broadcast from the room to WebSocket connections.
#[derive(Debug, Clone)]
pub enum RoomEvent {
    /// Send a message to a specific connection.
    SendTo { conn_id: String, msg: ServerMsg },
    /// Broadcast a message to every connection in the room.
    Broadcast { msg: ServerMsg },
    /// Broadcast a message to all except one connection.
    BroadcastExcept { exclude: String, msg: ServerMsg },
}

impl RoomEvent {
    /// The message this event carries for `conn_id`, if any.
    pub fn message_for(&self, conn_id: &str) -> Option<&ServerMsg> {
        match self {
            Self::SendTo { conn_id: target, msg } => (target == conn_id).then_some(msg),
            Self::Broadcast { msg } => Some(msg),
            Self::BroadcastExcept { exclude, msg } => (exclude != conn_id).then_some(msg),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Drawer has to pick a word before this fires.
    ChooseWord,
    /// End of the drawing period.
    Draw,
    /// Halfway through the drawing period; reveals a sub-word.
    Hint,
    /// End of the answer display between turns.
    Reveal,
}

impl TimerKind {
    const ALL: [TimerKind; 4] = [Self::ChooseWord, Self::Draw, Self::Hint, Self::Reveal];
}

/// Where the room is in its game loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Waiting,
    ChoosingWord {
        choices: Vec<String>,
    },
    Drawing {
        word: String,
        deadline: Instant,
        revealed_words: BTreeSet<String>,
    },
    /// The turn is over and the answer is shown until the next one starts.
    Reveal {
        word: String,
    },
    GameEnd,
}

impl Phase {
    pub fn status(&self) -> RoomStatus {
        match self {
            Self::Waiting => RoomStatus::Waiting,
            Self::ChoosingWord { .. } => RoomStatus::ChoosingWord,
            Self::Drawing { .. } | Self::Reveal { .. } => RoomStatus::Drawing,
            Self::GameEnd => RoomStatus::GameEnd,
        }
    }

    fn turn_active(&self) -> bool {
        matches!(self, Self::ChoosingWord { .. } | Self::Drawing { .. })
    }
}

/// Pending timer tasks. Dropping the set aborts all of them.
#[derive(Default)]
struct Timers {
    choose: Option<JoinHandle<()>>,
    draw: Option<JoinHandle<()>>,
    hint: Option<JoinHandle<()>>,
    reveal: Option<JoinHandle<()>>,
}

impl Timers {
    fn slot(&mut self, timer: TimerKind) -> &mut Option<JoinHandle<()>> {
        match timer {
            TimerKind::ChooseWord => &mut self.choose,
            TimerKind::Draw => &mut self.draw,
            TimerKind::Hint => &mut self.hint,
            TimerKind::Reveal => &mut self.reveal,
        }
    }

    fn set(&mut self, timer: TimerKind, handle: JoinHandle<()>) {
        if let Some(old) = self.slot(timer).replace(handle) {
            old.abort();
        }
    }

    fn cancel(&mut self, timer: TimerKind) {
        if let Some(handle) = self.slot(timer).take() {
            handle.abort();
        }
    }

    fn cancel_all(&mut self) {
        for timer in TimerKind::ALL {
            self.cancel(timer);
        }
    }

    #[cfg(test)]
    fn is_pending(&mut self, timer: TimerKind) -> bool {
        self.slot(timer).as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Timers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

/// Points for a correct guess with `remaining` time left in a turn of
/// `total` length: 100 at the buzzer up to 600 for an instant guess.
pub fn guess_points(remaining: Duration, total: Duration) -> u32 {
    let total = total.as_secs_f64();
    if total <= 0.0 {
        return 100;
    }
    let fraction = (remaining.as_secs_f64() / total).clamp(0.0, 1.0);
    (fraction * 500.0).floor() as u32 + 100
}

/// The authoritative state of one room. Owned by its room task; every
/// mutation goes through [`Room::handle`].
pub struct Room {
    pub(crate) code: String,
    pub(crate) players: Vec<Player>,
    pub(crate) phase: Phase,
    pub(crate) current_round: u32,
    pub(crate) total_rounds: u32,
    pub(crate) drawer_index: usize,
    pub(crate) strokes: Vec<StrokeSegment>,
    pub(crate) messages: Vec<ChatMessage>,

    config: GameConfig,
    words: Arc<WordBank>,
    /// Bumped on every phase transition; timers scheduled in an older
    /// generation are stale.
    generation: u64,
    timers: Timers,

    events: broadcast::Sender<RoomEvent>,
    commands: mpsc::WeakSender<RoomCommand>,
}

impl Room {
    pub fn new(
        code: String,
        config: GameConfig,
        words: Arc<WordBank>,
        events: broadcast::Sender<RoomEvent>,
        commands: mpsc::WeakSender<RoomCommand>,
    ) -> Self {
        Self {
            code,
            players: Vec::new(),
            phase: Phase::Waiting,
            current_round: 0,
            total_rounds: config.total_rounds,
            drawer_index: 0,
            strokes: Vec::new(),
            messages: Vec::new(),
            config,
            words,
            generation: 0,
            timers: Timers::default(),
            events,
            commands,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn handle(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join { conn_id, name, avatar, reply } => {
                let result = self.join(&conn_id, &name, avatar);
                if let Err(err) = &result {
                    tracing::debug!("Room {}: join refused: {}", self.code, err);
                }
                let _ = reply.send(result);
            }
            RoomCommand::Leave { conn_id } => self.leave(&conn_id),
            RoomCommand::SendMessage { conn_id, text } => self.send_message(&conn_id, &text),
            RoomCommand::DrawLine { conn_id, line } => self.draw_line(&conn_id, line),
            RoomCommand::Undo { conn_id } => self.undo(&conn_id),
            RoomCommand::ClearCanvas { conn_id } => self.clear_canvas(&conn_id),
            RoomCommand::StartGame { conn_id } => {
                if self.is_host(&conn_id) && self.phase == Phase::Waiting {
                    self.start_game();
                }
            }
            RoomCommand::PlayAgain { conn_id } => {
                if self.is_host(&conn_id) && self.phase == Phase::GameEnd {
                    self.start_game();
                }
            }
            RoomCommand::SelectWord { conn_id, word } => self.select_word(&conn_id, &word),
            RoomCommand::TimerFired { timer, generation } => self.on_timer(timer, generation),
        }
    }

    /// Cancels everything still scheduled. Called when the room shuts down.
    pub fn close(&mut self) {
        self.generation += 1;
        self.timers.cancel_all();
    }

    // ─── Fan-out ──────────────────────────────────────────────────────

    fn send_to(&self, conn_id: &str, msg: ServerMsg) {
        let _ = self.events.send(RoomEvent::SendTo {
            conn_id: conn_id.to_string(),
            msg,
        });
    }

    fn broadcast(&self, msg: ServerMsg) {
        let _ = self.events.send(RoomEvent::Broadcast { msg });
    }

    fn broadcast_except(&self, exclude: &str, msg: ServerMsg) {
        let _ = self.events.send(RoomEvent::BroadcastExcept {
            exclude: exclude.to_string(),
            msg,
        });
    }

    /// Pushes a fresh room view to everybody: the drawer view to the active
    /// drawer, the guesser view to the rest.
    fn broadcast_room(&self) {
        match self.active_drawer() {
            Some(drawer) => {
                self.send_to(
                    &drawer.id,
                    ServerMsg::RoomUpdate(projector::public_room(self, Viewer::Drawer)),
                );
                self.broadcast_except(
                    &drawer.id,
                    ServerMsg::RoomUpdate(projector::public_room(self, Viewer::Guesser)),
                );
            }
            None => self.broadcast(ServerMsg::RoomUpdate(projector::public_room(
                self,
                Viewer::Guesser,
            ))),
        }
    }

    fn system_message(&mut self, kind: MessageKind, text: impl Into<String>) {
        let text = text.into();
        self.log(ChatMessage::System {
            text: text.clone(),
            kind,
        });
        self.broadcast(ServerMsg::SystemMessage { text, kind });
    }

    fn log(&mut self, message: ChatMessage) {
        self.messages.push(message);
        if self.messages.len() > MAX_MESSAGES {
            let overflow = self.messages.len() - MAX_MESSAGES;
            self.messages.drain(..overflow);
        }
    }

    // ─── Lookups ──────────────────────────────────────────────────────

    fn index_of(&self, conn_id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.id == conn_id)
    }

    fn player(&self, conn_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == conn_id)
    }

    fn is_host(&self, conn_id: &str) -> bool {
        self.players.first().is_some_and(|p| p.id == conn_id)
    }

    fn active_drawer(&self) -> Option<&Player> {
        if !self.phase.turn_active() {
            return None;
        }
        self.players.iter().find(|p| p.is_drawer)
    }

    fn is_drawing(&self, conn_id: &str) -> bool {
        matches!(self.phase, Phase::Drawing { .. })
            && self.player(conn_id).is_some_and(|p| p.is_drawer)
    }

    fn view_for(&self, conn_id: &str) -> PublicRoom {
        let viewer = match self.active_drawer() {
            Some(drawer) if drawer.id == conn_id => Viewer::Drawer,
            _ => Viewer::Guesser,
        };
        projector::public_room(self, viewer)
    }

    /// True once every non-drawer has guessed (and there is at least one).
    fn all_guessed(&self) -> bool {
        let mut guessers = self.players.iter().filter(|p| !p.is_drawer).peekable();
        guessers.peek().is_some() && guessers.all(|p| p.has_guessed)
    }

    // ─── Timers ───────────────────────────────────────────────────────

    /// Enters `phase`, invalidating every timer scheduled before.
    fn enter(&mut self, phase: Phase) {
        self.generation += 1;
        self.phase = phase;
    }

    fn schedule(&mut self, timer: TimerKind, after: Duration) {
        let generation = self.generation;
        let deadline = Instant::now() + after;
        let commands = self.commands.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(tx) = commands.upgrade() {
                let _ = tx.send(RoomCommand::TimerFired { timer, generation }).await;
            }
        });
        self.timers.set(timer, handle);
    }

    fn on_timer(&mut self, timer: TimerKind, generation: u64) {
        if generation != self.generation {
            tracing::debug!("Room {}: stale {:?} timer ignored", self.code, timer);
            return;
        }

        match (timer, &self.phase) {
            (TimerKind::ChooseWord, Phase::ChoosingWord { choices }) => {
                let Some(word) = choices.first().cloned() else {
                    return;
                };
                self.timers.choose = None;
                self.begin_drawing(word);
                self.system_message(
                    MessageKind::Info,
                    "Drawer took too long, a word was randomly selected!",
                );
            }
            (TimerKind::Draw, Phase::Drawing { word, .. }) => {
                let text = format!("Time's up! The word was {word}");
                self.timers.draw = None;
                self.system_message(MessageKind::Error, text);
                self.next_turn();
            }
            (TimerKind::Hint, Phase::Drawing { .. }) => {
                self.timers.hint = None;
                self.reveal_hint();
            }
            (TimerKind::Reveal, Phase::Reveal { .. }) => {
                self.timers.reveal = None;
                if self.current_round > self.total_rounds {
                    self.end_game();
                } else {
                    self.start_turn();
                }
            }
            _ => {
                tracing::debug!(
                    "Room {}: {:?} timer fired in {} status, ignored",
                    self.code,
                    timer,
                    self.phase.status()
                );
            }
        }
    }

    // ─── Game loop ────────────────────────────────────────────────────

    pub fn start_game(&mut self) {
        self.timers.cancel_all();
        self.current_round = 1;
        self.total_rounds = self.config.total_rounds;
        self.drawer_index = 0;
        self.strokes.clear();
        self.messages.clear();
        for player in &mut self.players {
            player.score = 0;
            player.has_guessed = false;
            player.is_drawer = false;
        }

        tracing::info!(
            "Room {}: game started with {} players, {} rounds",
            self.code,
            self.players.len(),
            self.total_rounds
        );
        self.start_turn();
    }

    pub fn start_turn(&mut self) {
        self.strokes.clear();
        for player in &mut self.players {
            player.has_guessed = false;
        }

        if self.players.is_empty() {
            return;
        }
        if self.drawer_index >= self.players.len() {
            self.drawer_index = 0;
        }
        for (i, player) in self.players.iter_mut().enumerate() {
            player.is_drawer = i == self.drawer_index;
        }

        let choices = self.words.sample(WORD_CHOICES);
        self.enter(Phase::ChoosingWord {
            choices: choices.clone(),
        });

        let drawer = self.players[self.drawer_index].clone();
        self.broadcast(ServerMsg::ClearCanvas);
        self.broadcast_room();
        self.system_message(
            MessageKind::Info,
            format!(
                "Round {} - It is {}'s turn to draw!",
                self.current_round, drawer.name
            ),
        );
        self.send_to(&drawer.id, ServerMsg::ChooseWord { word_choices: choices });

        self.schedule(TimerKind::ChooseWord, self.config.choose_duration());
    }

    fn select_word(&mut self, conn_id: &str, word: &str) {
        let Some(player) = self.player(conn_id) else {
            return;
        };
        if !player.is_drawer {
            return;
        }
        let Phase::ChoosingWord { choices } = &self.phase else {
            return;
        };
        let Some(word) = choices
            .iter()
            .find(|c| c.eq_ignore_ascii_case(word.trim()))
            .cloned()
        else {
            tracing::debug!("Room {}: word {:?} was not offered", self.code, word);
            return;
        };

        self.timers.cancel(TimerKind::ChooseWord);
        self.begin_drawing(word);
        self.system_message(MessageKind::Info, "Drawer has selected a word!");
    }

    fn begin_drawing(&mut self, word: String) {
        let draw = self.config.draw_duration();
        let sub_words = word.split(' ').filter(|w| !w.is_empty()).count();

        self.enter(Phase::Drawing {
            word,
            deadline: Instant::now() + draw,
            revealed_words: BTreeSet::new(),
        });
        self.broadcast_room();

        self.schedule(TimerKind::Draw, draw);
        if self.config.word_hints && sub_words > 1 {
            self.schedule(TimerKind::Hint, draw / 2);
        }
    }

    /// Reveals one hidden sub-word, never the last one.
    fn reveal_hint(&mut self) {
        let Phase::Drawing { word, revealed_words, .. } = &mut self.phase else {
            return;
        };
        let lower = word.to_lowercase();
        let hidden: Vec<&str> = lower
            .split(' ')
            .filter(|w| !w.is_empty() && !revealed_words.contains(*w))
            .collect();
        if hidden.len() < 2 {
            return;
        }
        if let Some(pick) = hidden.choose(&mut rand::rng()) {
            revealed_words.insert(pick.to_string());
        }
        self.broadcast_room();
    }

    /// Scores a guess from the player at `index`. Returns whether it counted.
    pub fn check_guess(&mut self, index: usize, text: &str) -> bool {
        let Phase::Drawing { word, deadline, .. } = &self.phase else {
            return false;
        };
        let Some(player) = self.players.get(index) else {
            return false;
        };
        if player.is_drawer || player.has_guessed {
            return false;
        }
        if text.trim().to_lowercase() != word.to_lowercase() {
            return false;
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        let points = guess_points(remaining, self.config.draw_duration());

        let player = &mut self.players[index];
        player.has_guessed = true;
        player.score += points;
        if let Some(drawer) = self.players.iter_mut().find(|p| p.is_drawer) {
            drawer.score += DRAWER_BONUS;
        }
        true
    }

    fn send_message(&mut self, conn_id: &str, text: &str) {
        let text: String = text.trim().chars().take(MAX_MESSAGE_LEN).collect();
        if text.is_empty() {
            return;
        }
        let Some(index) = self.index_of(conn_id) else {
            return;
        };

        if self.check_guess(index, &text) {
            let name = self.players[index].name.clone();
            self.system_message(MessageKind::Success, format!("{name} guessed the word!"));
            self.broadcast_room();

            if self.all_guessed() {
                self.system_message(MessageKind::Info, "Everyone guessed the word!");
                self.strokes.clear();
                self.broadcast(ServerMsg::ClearCanvas);
                self.next_turn();
            }
            return;
        }

        let sender = &self.players[index];
        if (sender.is_drawer || sender.has_guessed) && self.mentions_word(&text) {
            self.tell_informed(ChatMessage::chat(sender.name.clone(), text));
            return;
        }

        let sender = sender.name.clone();
        let message = ChatMessage::chat(sender, text);
        if let ChatMessage::Chat { id, sender, text } = &message {
            self.broadcast(ServerMsg::ChatMessage {
                id: id.clone(),
                sender: sender.clone(),
                text: text.clone(),
            });
        }
        self.log(message);
    }

    /// True while drawing when `text` contains the secret word.
    fn mentions_word(&self, text: &str) -> bool {
        let Phase::Drawing { word, .. } = &self.phase else {
            return false;
        };
        text.to_lowercase().contains(&word.to_lowercase())
    }

    /// Delivers chat only to the drawer and those who already guessed. It
    /// stays out of the room log, which every guesser receives.
    fn tell_informed(&self, message: ChatMessage) {
        let ChatMessage::Chat { id, sender, text } = message else {
            return;
        };
        for player in self.players.iter().filter(|p| p.is_drawer || p.has_guessed) {
            self.send_to(&player.id, ServerMsg::ChatMessage {
                id: id.clone(),
                sender: sender.clone(),
                text: text.clone(),
            });
        }
    }

    /// Ends the current turn and hands the pencil to the next player.
    pub fn next_turn(&mut self) {
        self.drawer_index += 1;
        self.finish_turn();
    }

    /// Wraps the rotation, enters the reveal and schedules what comes next.
    /// `drawer_index` must already point at the upcoming drawer.
    fn finish_turn(&mut self) {
        self.timers.cancel(TimerKind::ChooseWord);
        self.timers.cancel(TimerKind::Draw);
        self.timers.cancel(TimerKind::Hint);

        if self.drawer_index >= self.players.len() {
            self.drawer_index = 0;
            self.current_round += 1;
        }

        let word = match &self.phase {
            Phase::Drawing { word, .. } => word.clone(),
            _ => String::new(),
        };
        self.enter(Phase::Reveal { word });
        self.broadcast_room();
        self.schedule(TimerKind::Reveal, self.config.reveal_duration());
    }

    pub fn end_game(&mut self) {
        self.timers.cancel_all();
        for player in &mut self.players {
            player.is_drawer = false;
        }
        self.enter(Phase::GameEnd);
        self.broadcast_room();
        self.system_message(MessageKind::Info, "Game Over! Look at the final scores.");

        if let Some(winner) = self.players.iter().max_by_key(|p| p.score) {
            tracing::info!(
                "Room {}: game over, {} wins with {} points",
                self.code,
                winner.name,
                winner.score
            );
        }
    }

    // ─── Canvas ───────────────────────────────────────────────────────

    fn draw_line(&mut self, conn_id: &str, line: StrokeSegment) {
        if !self.is_drawing(conn_id) {
            return;
        }
        let Some(line) = line.normalized() else {
            tracing::debug!("Room {}: dropped malformed stroke", self.code);
            return;
        };
        self.strokes.push(line.clone());
        self.broadcast_except(conn_id, ServerMsg::DrawLine { line });
    }

    /// Removes the most recent stroke group (or the last segment when it has
    /// no group id).
    fn undo(&mut self, conn_id: &str) {
        if !self.is_drawing(conn_id) {
            return;
        }
        let Some(last) = self.strokes.last() else {
            return;
        };
        match last.stroke_id.clone() {
            Some(stroke_id) => self
                .strokes
                .retain(|s| s.stroke_id.as_deref() != Some(stroke_id.as_str())),
            None => {
                self.strokes.pop();
            }
        }
        self.broadcast(ServerMsg::CanvasHistory {
            strokes: self.strokes.clone(),
        });
    }

    fn clear_canvas(&mut self, conn_id: &str) {
        if !self.is_drawing(conn_id) {
            return;
        }
        self.strokes.clear();
        self.broadcast(ServerMsg::ClearCanvas);
    }

    // ─── Membership ───────────────────────────────────────────────────

    fn join(&mut self, conn_id: &str, name: &str, avatar: String) -> Result<Player, JoinError> {
        let name = error::validate_name(name)?;
        let key = name.to_lowercase();

        if let Some(index) = self.players.iter().position(|p| p.name.to_lowercase() == key) {
            let player = &mut self.players[index];
            let old_id = std::mem::replace(&mut player.id, conn_id.to_string());
            if !avatar.is_empty() {
                player.avatar = avatar;
            }
            let player = player.clone();
            tracing::info!(
                "Room {}: {} reconnected ({} -> {})",
                self.code,
                player.name,
                old_id,
                conn_id
            );

            self.send_to(conn_id, ServerMsg::joined(self.view_for(conn_id), player.clone()));
            self.send_to(conn_id, ServerMsg::CanvasHistory {
                strokes: self.strokes.clone(),
            });
            if let Phase::ChoosingWord { choices } = &self.phase {
                if player.is_drawer {
                    self.send_to(conn_id, ServerMsg::ChooseWord {
                        word_choices: choices.clone(),
                    });
                }
            }
            return Ok(player);
        }

        if self.players.len() >= self.config.max_players {
            return Err(JoinError::RoomFull);
        }

        let player = Player::new(conn_id, name, avatar);
        self.players.push(player.clone());
        tracing::info!(
            "Room {}: {} joined ({} players)",
            self.code,
            player.name,
            self.players.len()
        );

        self.send_to(conn_id, ServerMsg::joined(self.view_for(conn_id), player.clone()));
        self.broadcast_room();
        self.system_message(MessageKind::Info, format!("{} joined the room!", player.name));
        self.send_to(conn_id, ServerMsg::CanvasHistory {
            strokes: self.strokes.clone(),
        });
        Ok(player)
    }

    fn leave(&mut self, conn_id: &str) {
        let Some(index) = self.index_of(conn_id) else {
            return;
        };
        let player = self.players.remove(index);
        tracing::info!("Room {}: {} left", self.code, player.name);

        if self.players.is_empty() {
            self.close();
            return;
        }

        // Keep the rotation pointing at the same upcoming drawer.
        if index < self.drawer_index {
            self.drawer_index -= 1;
        }

        self.system_message(MessageKind::Error, format!("{} left the game", player.name));

        if player.is_drawer && self.phase.turn_active() {
            self.system_message(MessageKind::Error, "Drawer left! Turn ended.");
            // The next player slid into the drawer's slot.
            self.finish_turn();
            return;
        }

        self.broadcast_room();
        if matches!(self.phase, Phase::Drawing { .. }) && self.all_guessed() {
            self.system_message(MessageKind::Info, "Everyone guessed the word!");
            self.strokes.clear();
            self.broadcast(ServerMsg::ClearCanvas);
            self.next_turn();
        }
    }
}

/// Drains a room's command queue until its last player is gone.
pub async fn room_task(
    mut room: Room,
    mut cmd_rx: mpsc::Receiver<RoomCommand>,
    registry: Arc<Registry>,
    room_id: Uuid,
) {
    while let Some(cmd) = cmd_rx.recv().await {
        room.handle(cmd);
        if room.is_empty() {
            break;
        }
    }

    room.close();
    registry.remove(&room.code, room_id);
    tracing::info!("Room {} closed, {} rooms active", room.code, registry.len());
}
