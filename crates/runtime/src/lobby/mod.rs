//! Lobby: sessions, the waiting queue and room creation.
mod queue;
mod registry;
mod session;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use duel_core::{Battle, CharacterId, GridField, Roster, Side, Slot};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};

use crate::api::Result;
use crate::config::RuntimeConfig;
use crate::events::{Event, EventBus, LobbyEvent};
use crate::oracle::OracleManager;
use crate::room::{Player, RoomInput, RoomWorker, Seat};
use crate::types::{RoomId, SessionId};

pub(crate) use queue::{QueueEntry, WaitingQueue};
pub use registry::{RoomInfo, RoomRegistry};
pub(crate) use session::Session;

/// State shared by every session of one lobby.
pub(crate) struct Lobby {
    pub config: RuntimeConfig,
    pub oracles: OracleManager,
    pub queue: WaitingQueue,
    pub rooms: RoomRegistry,
    pub bus: EventBus,
    next_session: AtomicU64,
    next_room: AtomicU64,
}

impl Lobby {
    pub fn new(config: RuntimeConfig, oracles: OracleManager) -> Self {
        Self {
            queue: WaitingQueue::new(config.match_window),
            rooms: RoomRegistry::new(),
            bus: EventBus::with_capacity(config.event_buffer_size),
            oracles,
            config,
            next_session: AtomicU64::new(1),
            next_room: AtomicU64::new(1),
        }
    }

    pub fn next_session(&self) -> SessionId {
        SessionId(self.next_session.fetch_add(1, Ordering::Relaxed))
    }

    /// Queues `entry`, starting a room if it found an opponent.
    pub async fn enqueue(&self, entry: QueueEntry) {
        let session = entry.session;
        let username = entry.player.username.clone();
        let games_played = entry.player.games_played;

        match self.queue.arrive(entry).await {
            Some((waiting, arriving)) => self.start_room(waiting, arriving).await,
            None => {
                info!(target: "runtime::matchmaking", %session, %username, games_played, "queued");
                self.bus.publish(Event::Lobby(LobbyEvent::Queued {
                    session,
                    username,
                    games_played,
                }));
            }
        }
    }

    /// Seats the longer-waiting player on side one.
    async fn start_room(&self, waiting: QueueEntry, arriving: QueueEntry) {
        let id = RoomId(self.next_room.fetch_add(1, Ordering::Relaxed));
        let entries = [waiting, arriving];

        let battle = match self.build_battle(id, &entries) {
            Ok(battle) => battle,
            Err(error) => {
                // Dropping the entries drops their seat senders, which sends
                // both sessions back to team selection.
                error!(target: "runtime::lobby", room = %id, %error, "room could not be built");
                return;
            }
        };

        let (input_tx, input_rx) = mpsc::channel(self.config.room_buffer_size);
        let names = entries.each_ref().map(|entry| entry.player.username.clone());
        let [one, two] = entries;
        let players = [
            seat_player(id, Side::One, one, &input_tx).await,
            seat_player(id, Side::Two, two, &input_tx).await,
        ];
        drop(input_tx);

        self.rooms
            .open(
                id,
                RoomInfo {
                    players: names.clone(),
                },
            )
            .await;
        info!(
            target: "runtime::lobby",
            room = %id,
            one = %names[0],
            two = %names[1],
            "match found"
        );
        self.bus.publish(Event::Lobby(LobbyEvent::Matched {
            room: id,
            players: names,
        }));

        let worker = RoomWorker::new(
            id,
            battle,
            players,
            input_rx,
            &self.config,
            self.rooms.clone(),
            self.bus.clone(),
        );
        tokio::spawn(worker.run());
    }

    /// Seats both teams on one grid. Characters get room-local ids because
    /// both teams may field the same catalog characters.
    fn build_battle(&self, id: RoomId, entries: &[QueueEntry; 2]) -> Result<Battle> {
        let mut roster = Roster::new();
        let mut field = GridField::new(self.config.field_rows, self.config.field_columns);
        let mut next = 1;

        for (side, entry) in Side::BOTH.into_iter().zip(entries) {
            for member in &entry.team.members {
                let character = CharacterId(next);
                next += 1;
                field.place(character, Slot::new(side, member.slot.row, member.slot.column))?;
                roster.insert(member.state.clone().with_id(character).on_side(side));
            }
        }

        let seed = self.config.battle_seed.unwrap_or_else(|| room_seed(id));
        Ok(Battle::new(roster, field, self.oracles.teams.skills(), seed))
    }
}

fn room_seed(room: RoomId) -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default();
    nanos ^ room.0.rotate_left(32)
}

/// Hands `entry` its seat. A session that vanished before taking it
/// forfeits at once.
async fn seat_player(
    room: RoomId,
    side: Side,
    entry: QueueEntry,
    input: &mpsc::Sender<RoomInput>,
) -> Player {
    let (release, released) = oneshot::channel();
    let seat = Seat {
        room,
        side,
        input: input.clone(),
        released,
    };
    if entry.seat.send(seat).is_err() {
        let _ = input.send(RoomInput::Disconnect { side }).await;
    }
    Player {
        name: entry.player.username,
        outbound: entry.outbound,
        release: Some(release),
    }
}
