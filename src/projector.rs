//! Client-visible projections of a room.
//!
//! Every `room-update` goes through [`public_room`]. The drawer and the
//! guessers get different views: only the drawer ever sees the word choices or
//! the secret word while a turn runs, guessers get the masked hint instead.

use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::time::Instant;

use crate::game::{Phase, Room};
use crate::types::PublicRoom;

/// Who a projection is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Drawer,
    Guesser,
}

pub fn public_room(room: &Room, viewer: Viewer) -> PublicRoom {
    let mut view = PublicRoom {
        code: room.code.clone(),
        players: room.players.clone(),
        status: room.phase.status(),
        current_round: room.current_round,
        total_rounds: room.total_rounds,
        drawer_index: room.drawer_index,
        current_word: None,
        word_choices: Vec::new(),
        word_hint: None,
        round_end_time: None,
        revealing: false,
        messages: room.messages.clone(),
    };

    match (&room.phase, viewer) {
        (Phase::ChoosingWord { choices }, Viewer::Drawer) => {
            view.word_choices = choices.clone();
        }
        (Phase::Drawing { word, deadline, .. }, Viewer::Drawer) => {
            view.current_word = Some(word.clone());
            view.round_end_time = Some(epoch_millis(*deadline));
        }
        (Phase::Drawing { word, deadline, revealed_words }, Viewer::Guesser) => {
            view.word_hint = Some(word_hint(word, revealed_words));
            view.round_end_time = Some(epoch_millis(*deadline));
        }
        (Phase::Reveal { word }, _) => {
            view.revealing = true;
            if !word.is_empty() {
                view.current_word = Some(word.clone());
            }
        }
        _ => {}
    }

    view
}

/// Masks `word` for guessers. Letters and digits become `_` unless their whole
/// sub-word is in `revealed` (lower-cased); other characters stay visible.
/// Letters are separated by one space and sub-words by three.
pub fn word_hint(word: &str, revealed: &BTreeSet<String>) -> String {
    word.split(' ')
        .map(|part| {
            let shown = revealed.contains(&part.to_lowercase());
            part.chars()
                .map(|c| {
                    if !c.is_alphanumeric() {
                        c.to_string()
                    } else if shown {
                        c.to_uppercase().to_string()
                    } else {
                        "_".to_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("   ")
}

/// Converts a runtime deadline into wall-clock milliseconds for clients.
fn epoch_millis(deadline: Instant) -> u64 {
    let remaining = deadline.saturating_duration_since(Instant::now());
    (SystemTime::now() + remaining)
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
