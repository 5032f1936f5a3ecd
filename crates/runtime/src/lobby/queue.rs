//! Waiting queue with atomic scan-and-remove matchmaking.
use std::collections::VecDeque;

use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::debug;

use crate::protocol::ServerMessage;
use crate::room::Seat;
use crate::types::{PlayerSummary, SessionId, TeamSnapshot};

/// A player waiting for an opponent.
#[derive(Debug)]
pub(crate) struct QueueEntry {
    pub session: SessionId,
    pub player: PlayerSummary,
    pub team: TeamSnapshot,
    pub outbound: mpsc::Sender<ServerMessage>,
    /// Delivers the room seat once matched. Dropped unanswered when the room
    /// could not be built.
    pub seat: oneshot::Sender<Seat>,
}

pub(crate) struct WaitingQueue {
    window: u32,
    entries: Mutex<VecDeque<QueueEntry>>,
}

impl WaitingQueue {
    pub fn new(window: u32) -> Self {
        Self {
            window,
            entries: Mutex::new(VecDeque::new()),
        }
    }

    /// Pairs `arriving` with the first waiting entry whose games-played count
    /// differs by less than the window, or queues it.
    ///
    /// Returns `(waiting, arriving)` on a match. The scan and the removal run
    /// under one lock, so a waiting entry is handed out at most once.
    pub async fn arrive(&self, arriving: QueueEntry) -> Option<(QueueEntry, QueueEntry)> {
        let mut entries = self.entries.lock().await;
        let games = arriving.player.games_played;
        let position = entries
            .iter()
            .position(|waiting| waiting.player.games_played.abs_diff(games) < self.window);

        match position.and_then(|index| entries.remove(index)) {
            Some(waiting) => {
                debug!(
                    target: "runtime::matchmaking",
                    waiting = %waiting.session,
                    arriving = %arriving.session,
                    queued = entries.len(),
                    "paired"
                );
                Some((waiting, arriving))
            }
            None => {
                entries.push_back(arriving);
                None
            }
        }
    }

    /// Removes a still-waiting session. `None` once it has been matched.
    pub async fn remove(&self, session: SessionId) -> Option<QueueEntry> {
        let mut entries = self.entries.lock().await;
        let index = entries.iter().position(|entry| entry.session == session)?;
        entries.remove(index)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
