use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::{self, JoinError};
use crate::game::{RoomCommand, RoomEvent};
use crate::registry::{Registry, RoomHandle, normalize_code};
use crate::types::{ClientMsg, ServerMsg};

type Subscription = Option<broadcast::Receiver<RoomEvent>>;

/// The room a connection is seated in, and under which name.
struct Binding {
    room: RoomHandle,
    name: String,
}

impl Binding {
    fn is_seat(&self, room: &RoomHandle, name: &str) -> bool {
        self.room.id == room.id && self.name.to_lowercase() == name.trim().to_lowercase()
    }
}

/// Binds one WebSocket connection to at most one room and routes its
/// intents there. Outbound messages are pushed onto `outbox`.
pub struct Session {
    conn_id: String,
    registry: Arc<Registry>,
    outbox: mpsc::UnboundedSender<ServerMsg>,
    subscriptions: mpsc::UnboundedSender<Subscription>,
    forwarder: JoinHandle<()>,
    binding: Option<Binding>,
}

impl Session {
    pub fn new(registry: Arc<Registry>, outbox: mpsc::UnboundedSender<ServerMsg>) -> Self {
        let conn_id = Uuid::new_v4().to_string();
        let (subscriptions, subscription_rx) = mpsc::unbounded_channel();
        let forwarder = tokio::spawn(forward_events(
            conn_id.clone(),
            outbox.clone(),
            subscription_rx,
        ));

        Self {
            conn_id,
            registry,
            outbox,
            subscriptions,
            forwarder,
            binding: None,
        }
    }

    pub fn conn_id(&self) -> &str {
        &self.conn_id
    }

    pub async fn dispatch(&mut self, msg: ClientMsg) {
        match msg {
            ClientMsg::CreateRoom { player_name, avatar } => {
                if let Err(err) = error::validate_name(&player_name) {
                    self.reply(ServerMsg::rejected(&err));
                    return;
                }
                let handle = self.registry.create();
                self.join(handle, player_name, avatar).await;
            }

            ClientMsg::JoinRoom { room_code, player_name, avatar } => {
                let Some(handle) = self.registry.find(&room_code) else {
                    self.reply(ServerMsg::rejected(&JoinError::RoomNotFound));
                    return;
                };
                self.join(handle, player_name, avatar).await;
            }

            ClientMsg::SendMessage { room_code, text } => {
                self.forward(&room_code, |conn_id| RoomCommand::SendMessage { conn_id, text })
                    .await;
            }

            ClientMsg::DrawLine { room_code, line } => {
                self.forward(&room_code, |conn_id| RoomCommand::DrawLine { conn_id, line })
                    .await;
            }

            ClientMsg::Undo { room_code } => {
                self.forward(&room_code, |conn_id| RoomCommand::Undo { conn_id }).await;
            }

            ClientMsg::ClearCanvas { room_code } => {
                self.forward(&room_code, |conn_id| RoomCommand::ClearCanvas { conn_id })
                    .await;
            }

            ClientMsg::StartGame { room_code } => {
                self.forward(&room_code, |conn_id| RoomCommand::StartGame { conn_id })
                    .await;
            }

            ClientMsg::WordSelected { room_code, word } => {
                self.forward(&room_code, |conn_id| RoomCommand::SelectWord { conn_id, word })
                    .await;
            }

            ClientMsg::PlayAgain { room_code } => {
                self.forward(&room_code, |conn_id| RoomCommand::PlayAgain { conn_id })
                    .await;
            }

            ClientMsg::LeaveRoom => self.leave().await,
        }
    }

    /// Leaves the current room, if any.
    pub async fn leave(&mut self) {
        let Some(Binding { room, .. }) = self.binding.take() else {
            return;
        };
        let _ = self.subscriptions.send(None);
        room.send(RoomCommand::Leave {
            conn_id: self.conn_id.clone(),
        })
        .await;
        tracing::debug!("Connection {} left room {}", self.conn_id, room.code);
    }

    /// Tears the session down after the socket closed.
    pub async fn close(&mut self) {
        self.leave().await;
        self.forwarder.abort();
    }

    /// Seats the connection in `room`. Joining the seat it already holds is
    /// a reconnect: the player keeps its place and score and the current
    /// subscription stays live. Any other seat is given up first.
    async fn join(&mut self, room: RoomHandle, name: String, avatar: String) {
        let rejoining = self.binding.as_ref().is_some_and(|b| b.is_seat(&room, &name));
        if !rejoining {
            self.leave().await;
            // Subscribe first so nothing the room sends in reply to the join is missed.
            let _ = self.subscriptions.send(Some(room.event_tx.subscribe()));
        }

        let (reply, reply_rx) = oneshot::channel();
        let sent = room
            .send(RoomCommand::Join {
                conn_id: self.conn_id.clone(),
                name,
                avatar,
                reply,
            })
            .await;
        let result = if sent {
            reply_rx.await.unwrap_or(Err(JoinError::RoomNotFound))
        } else {
            Err(JoinError::RoomNotFound)
        };

        match result {
            Ok(player) => {
                tracing::info!(
                    "Connection {} joined room {} as {}",
                    self.conn_id,
                    room.code,
                    player.name
                );
                self.binding = Some(Binding {
                    room,
                    name: player.name,
                });
            }
            Err(err) => {
                if !rejoining {
                    let _ = self.subscriptions.send(None);
                }
                self.reply(ServerMsg::rejected(&err));
            }
        }
    }

    async fn forward(&self, room_code: &str, command: impl FnOnce(String) -> RoomCommand) {
        let Some(Binding { room, .. }) = &self.binding else {
            return;
        };
        if room.code != normalize_code(room_code) {
            tracing::debug!(
                "Connection {} sent an intent for {} while in {}",
                self.conn_id,
                room_code,
                room.code
            );
            return;
        }
        if !room.send(command(self.conn_id.clone())).await {
            tracing::debug!("Room {} is gone", room.code);
        }
    }

    fn reply(&self, msg: ServerMsg) {
        let _ = self.outbox.send(msg);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}

/// Copies room events addressed to `conn_id` onto its outbox. A new
/// subscription replaces the previous one; `None` unsubscribes.
async fn forward_events(
    conn_id: String,
    outbox: mpsc::UnboundedSender<ServerMsg>,
    mut subscriptions: mpsc::UnboundedReceiver<Subscription>,
) {
    enum Next {
        Subscription(Option<Subscription>),
        Event(Result<RoomEvent, RecvError>),
    }

    let mut current: Subscription = None;
    loop {
        let next = match current.as_mut() {
            Some(events) => tokio::select! {
                sub = subscriptions.recv() => Next::Subscription(sub),
                event = events.recv() => Next::Event(event),
            },
            None => Next::Subscription(subscriptions.recv().await),
        };

        match next {
            Next::Subscription(Some(sub)) => current = sub,
            Next::Subscription(None) => return,
            Next::Event(Ok(event)) => {
                if let Some(msg) = event.message_for(&conn_id) {
                    if outbox.send(msg.clone()).is_err() {
                        return;
                    }
                }
            }
            Next::Event(Err(RecvError::Lagged(skipped))) => {
                tracing::warn!("Connection {} lagged, {} events skipped", conn_id, skipped);
            }
            Next::Event(Err(RecvError::Closed)) => current = None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::types::{GameConfig, RoomStatus};
    use crate::words::WordBank;

    fn registry() -> Arc<Registry> {
        Registry::new(GameConfig::default(), WordBank::default())
    }

    fn session(registry: &Arc<Registry>) -> (Session, mpsc::UnboundedReceiver<ServerMsg>) {
        let (outbox, outbox_rx) = mpsc::unbounded_channel();
        (Session::new(registry.clone(), outbox), outbox_rx)
    }

    /// Reads messages until `pick` matches one.
    async fn next_matching<T>(
        rx: &mut mpsc::UnboundedReceiver<ServerMsg>,
        mut pick: impl FnMut(ServerMsg) -> Option<T>,
    ) -> T {
        tokio::time::timeout(Duration::from_secs(1), async {
            loop {
                let msg = rx.recv().await.expect("outbox closed");
                if let Some(found) = pick(msg) {
                    return found;
                }
            }
        })
        .await
        .expect("message never arrived")
    }

    async fn ack(rx: &mut mpsc::UnboundedReceiver<ServerMsg>) -> ServerMsg {
        next_matching(rx, |msg| matches!(msg, ServerMsg::Ack { .. }).then_some(msg)).await
    }

    fn room_code(ack: &ServerMsg) -> String {
        match ack {
            ServerMsg::Ack { success: true, room: Some(room), .. } => room.code.clone(),
            other => panic!("expected a successful ack, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_then_join_by_code() {
        let registry = registry();
        let (mut host, mut host_rx) = session(&registry);
        let (mut guest, mut guest_rx) = session(&registry);

        host.dispatch(ClientMsg::CreateRoom {
            player_name: "Ann".into(),
            avatar: "cat.png".into(),
        })
        .await;
        let code = room_code(&ack(&mut host_rx).await);

        guest
            .dispatch(ClientMsg::JoinRoom {
                room_code: code.to_lowercase(),
                player_name: "Bob".into(),
                avatar: String::new(),
            })
            .await;
        let ServerMsg::Ack { player: Some(player), .. } = ack(&mut guest_rx).await else {
            panic!("guest ack without player");
        };
        assert_eq!(player.id, guest.conn_id());

        let players = next_matching(&mut host_rx, |msg| match msg {
            ServerMsg::RoomUpdate(room) if room.players.len() == 2 => Some(room.players),
            _ => None,
        })
        .await;
        assert_eq!(players[0].name, "Ann");
        assert_eq!(players[1].name, "Bob");

        host.dispatch(ClientMsg::StartGame { room_code: code.clone() }).await;
        let choices = next_matching(&mut host_rx, |msg| match msg {
            ServerMsg::ChooseWord { word_choices } => Some(word_choices),
            _ => None,
        })
        .await;
        assert_eq!(choices.len(), 3);
        let view = next_matching(&mut guest_rx, |msg| match msg {
            ServerMsg::RoomUpdate(room) if room.status != RoomStatus::Waiting => Some(room),
            _ => None,
        })
        .await;
        assert_eq!(view.status, RoomStatus::ChoosingWord);
        assert!(view.word_choices.is_empty());
    }

    #[tokio::test]
    async fn unknown_room_and_bad_names_are_rejected() {
        let registry = registry();
        let (mut s, mut rx) = session(&registry);

        s.dispatch(ClientMsg::JoinRoom {
            room_code: "ZZZZZZ".into(),
            player_name: "Bob".into(),
            avatar: String::new(),
        })
        .await;
        let ServerMsg::Ack { success, message, .. } = ack(&mut rx).await else {
            unreachable!()
        };
        assert!(!success);
        assert_eq!(message.as_deref(), Some("Room not found"));

        s.dispatch(ClientMsg::CreateRoom {
            player_name: " ".into(),
            avatar: String::new(),
        })
        .await;
        let ServerMsg::Ack { success, message, .. } = ack(&mut rx).await else {
            unreachable!()
        };
        assert!(!success);
        assert_eq!(message.as_deref(), Some("Please enter a nickname"));
        assert_eq!(registry.len(), 0);
    }

    #[tokio::test]
    async fn closing_the_last_session_deletes_the_room() {
        let registry = registry();
        let (mut s, mut rx) = session(&registry);
        s.dispatch(ClientMsg::CreateRoom {
            player_name: "Ann".into(),
            avatar: String::new(),
        })
        .await;
        let code = room_code(&ack(&mut rx).await);
        assert!(registry.find(&code).is_some());

        s.close().await;
        for _ in 0..100 {
            if registry.find(&code).is_none() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("room {code} outlived its last player");
    }

    #[tokio::test]
    async fn intents_for_other_rooms_are_ignored() {
        let registry = registry();
        let (mut s, mut rx) = session(&registry);
        s.dispatch(ClientMsg::CreateRoom {
            player_name: "Ann".into(),
            avatar: String::new(),
        })
        .await;
        let code = room_code(&ack(&mut rx).await);

        s.dispatch(ClientMsg::SendMessage {
            room_code: "OTHER1".into(),
            text: "hello?".into(),
        })
        .await;
        s.dispatch(ClientMsg::SendMessage {
            room_code: code,
            text: "hello!".into(),
        })
        .await;

        let text = next_matching(&mut rx, |msg| match msg {
            ServerMsg::ChatMessage { text, .. } => Some(text),
            _ => None,
        })
        .await;
        assert_eq!(text, "hello!");
    }

    async fn create(s: &mut Session, rx: &mut mpsc::UnboundedReceiver<ServerMsg>, name: &str) -> String {
        s.dispatch(ClientMsg::CreateRoom {
            player_name: name.into(),
            avatar: String::new(),
        })
        .await;
        room_code(&ack(rx).await)
    }

    async fn join_room(s: &mut Session, code: &str, name: &str) {
        s.dispatch(ClientMsg::JoinRoom {
            room_code: code.into(),
            player_name: name.into(),
            avatar: String::new(),
        })
        .await;
    }

    #[tokio::test]
    async fn repeating_join_keeps_the_seat() {
        let registry = registry();
        let (mut host, mut host_rx) = session(&registry);
        let (mut guest, mut guest_rx) = session(&registry);
        let code = create(&mut host, &mut host_rx, "Ann").await;
        join_room(&mut guest, &code, "Bob").await;
        assert!(matches!(ack(&mut guest_rx).await, ServerMsg::Ack { success: true, .. }));

        join_room(&mut host, &code, "ann").await;
        let ServerMsg::Ack { success: true, room: Some(room), player: Some(player), .. } =
            ack(&mut host_rx).await
        else {
            panic!("rejoin was refused");
        };
        assert_eq!(player.id, host.conn_id());
        let names: Vec<_> = room.players.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Ann", "Bob"]);

        // Still the host, so starting the game works.
        host.dispatch(ClientMsg::StartGame { room_code: code }).await;
        next_matching(&mut host_rx, |msg| match msg {
            ServerMsg::ChooseWord { .. } => Some(()),
            _ => None,
        })
        .await;
    }

    #[tokio::test]
    async fn repeating_join_alone_does_not_close_the_room() {
        let registry = registry();
        let (mut s, mut rx) = session(&registry);
        let code = create(&mut s, &mut rx, "Cat").await;

        join_room(&mut s, &code, "Cat").await;
        let ServerMsg::Ack { success, room, .. } = ack(&mut rx).await else {
            unreachable!()
        };
        assert!(success);
        assert_eq!(room.map(|r| r.players.len()), Some(1));
        assert!(registry.find(&code).is_some());
    }

    #[tokio::test]
    async fn unknown_code_keeps_the_current_room() {
        let registry = registry();
        let (mut s, mut rx) = session(&registry);
        let code = create(&mut s, &mut rx, "Ann").await;

        join_room(&mut s, "NOPE00", "Ann").await;
        let ServerMsg::Ack { success, message, .. } = ack(&mut rx).await else {
            unreachable!()
        };
        assert!(!success);
        assert_eq!(message.as_deref(), Some("Room not found"));

        s.dispatch(ClientMsg::SendMessage {
            room_code: code.clone(),
            text: "still here".into(),
        })
        .await;
        let text = next_matching(&mut rx, |msg| match msg {
            ServerMsg::ChatMessage { text, .. } => Some(text),
            _ => None,
        })
        .await;
        assert_eq!(text, "still here");
        assert!(registry.find(&code).is_some());
    }
}
