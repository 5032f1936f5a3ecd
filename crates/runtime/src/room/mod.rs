//! Per-room worker: the phase state machine of one match.
//!
//! A room owns its [`Battle`] outright and talks to the two player sessions
//! only through channels: decisions and disconnects come in on one input
//! queue, results go out on each player's outbound queue.
mod decisions;

use std::time::Duration;

use duel_core::{Battle, Outcome, Side};
use tokio::sync::{mpsc, oneshot};
use tokio::sync::mpsc::error::SendTimeoutError;
use tracing::{error, info, warn};

use crate::api::{Result, RuntimeError};
use crate::config::RuntimeConfig;
use crate::events::{Event, EventBus, RoomEvent};
use crate::lobby::RoomRegistry;
use crate::protocol::{DecisionAction, FinishReason, ServerMessage, relabel};
use crate::types::{RoomId, SeatedCharacter};

pub(crate) use decisions::RoomInput;

/// A session's place in a room.
#[derive(Debug)]
pub(crate) struct Seat {
    pub room: RoomId,
    pub side: Side,
    pub input: mpsc::Sender<RoomInput>,
    /// Resolves once when the room closes.
    pub released: oneshot::Receiver<()>,
}

pub(crate) struct Player {
    pub name: String,
    pub outbound: mpsc::Sender<ServerMessage>,
    pub release: Option<oneshot::Sender<()>>,
}

/// How a room ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Finish {
    Decided(Outcome),
    Forfeit { loser: Side },
    /// Both sessions went away, or the battle failed.
    Abandoned,
}

pub(crate) struct RoomWorker {
    id: RoomId,
    battle: Battle,
    players: [Player; 2],
    input: mpsc::Receiver<RoomInput>,
    timeout: Duration,
    send_timeout: Duration,
    /// Sides whose outbound queue stayed full past the send timeout.
    stalled: [bool; 2],
    registry: RoomRegistry,
    bus: EventBus,
}

impl RoomWorker {
    pub fn new(
        id: RoomId,
        battle: Battle,
        players: [Player; 2],
        input: mpsc::Receiver<RoomInput>,
        config: &RuntimeConfig,
        registry: RoomRegistry,
        bus: EventBus,
    ) -> Self {
        Self {
            id,
            battle,
            players,
            input,
            timeout: config.decision_timeout,
            send_timeout: config.send_timeout,
            stalled: [false; 2],
            registry,
            bus,
        }
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        let played = match self.announce().await {
            Ok(()) => self.play().await,
            Err(error) => Err(error),
        };

        let finish = match played {
            Ok(finish) => finish,
            Err(RuntimeError::ConnectionLost(loser)) => Finish::Forfeit { loser },
            Err(error) => {
                error!(target: "runtime::room", room = %self.id, %error, "battle aborted");
                let _ = self
                    .broadcast(ServerMessage::error("the battle could not continue"))
                    .await;
                Finish::Abandoned
            }
        };

        self.close(finish).await;
    }

    async fn announce(&mut self) -> Result<()> {
        for side in Side::BOTH {
            let rival = &self.players[side.opposite().index()];
            let messages = [
                ServerMessage::MatchFound {
                    room: self.id,
                    side,
                    team: self.seated(side),
                },
                ServerMessage::RivalInfo {
                    name: rival.name.clone(),
                    team: self.seated(side.opposite()),
                },
            ];
            for message in messages {
                self.send(side, message).await?;
            }
        }
        Ok(())
    }

    /// Runs rounds until one side is defeated or a player leaves.
    async fn play(&mut self) -> Result<Finish> {
        loop {
            let round = self.battle.current_round();
            let decisions = match self.collect_decisions(round).await? {
                Some(decisions) => decisions,
                None => return Ok(Finish::Abandoned),
            };
            self.broadcast(ServerMessage::DecisionPhaseEnd { round }).await?;

            let casts = self.build_casts(decisions);
            let report = self.battle.play_round(&casts)?;
            for side in Side::BOTH {
                let entries = relabel(&report, self.battle.roster(), side);
                self.send(side, ServerMessage::RoundResults { round, entries })
                    .await?;
            }
            info!(
                target: "runtime::room",
                room = %self.id,
                %round,
                casts = casts.len(),
                commits = report.commits.len(),
                warnings = report.failures.len(),
                "round committed"
            );
            self.bus.publish(Event::Room(RoomEvent::RoundCommitted {
                room: self.id,
                report,
            }));

            if let Some(loser) = self.pending_disconnect() {
                return Err(RuntimeError::ConnectionLost(loser));
            }
            if let Some(outcome) = self.battle.outcome() {
                return Ok(Finish::Decided(outcome));
            }
            self.battle.finish_round()?;
        }
    }

    async fn close(&mut self, finish: Finish) {
        let (outcome, forfeit) = match finish {
            Finish::Decided(Outcome::Winner { side }) => {
                self.announce_winner(side, FinishReason::Defeat).await;
                (Outcome::Winner { side }, false)
            }
            Finish::Forfeit { loser } => {
                let side = loser.opposite();
                self.announce_winner(side, FinishReason::Forfeit).await;
                (Outcome::Winner { side }, true)
            }
            Finish::Decided(Outcome::Draw) | Finish::Abandoned => {
                let _ = self.broadcast(ServerMessage::Draw).await;
                (Outcome::Draw, finish == Finish::Abandoned)
            }
        };

        for player in &mut self.players {
            if let Some(release) = player.release.take() {
                let _ = release.send(());
            }
        }

        if self.registry.close(self.id).await {
            info!(
                target: "runtime::room",
                room = %self.id,
                round = %self.battle.current_round(),
                ?outcome,
                forfeit,
                "room closed"
            );
            self.bus.publish(Event::Room(RoomEvent::Finished {
                room: self.id,
                outcome,
                forfeit,
            }));
        }
    }

    async fn announce_winner(&mut self, winner: Side, reason: FinishReason) {
        let _ = self.send(winner, ServerMessage::Win { reason }).await;
        let _ = self
            .send(winner.opposite(), ServerMessage::Lose { reason })
            .await;
    }

    fn seated(&self, side: Side) -> Vec<SeatedCharacter> {
        self.battle
            .roster()
            .members(side)
            .filter_map(|character| {
                Some(SeatedCharacter {
                    slot: self.battle.field().slot(character.id())?,
                    character: character.clone(),
                })
            })
            .collect()
    }

    /// Queues a message for one player. A player whose queue stays full
    /// past the send timeout is dropped from the room as disconnected.
    async fn send(&mut self, side: Side, message: ServerMessage) -> Result<()> {
        if self.stalled[side.index()] {
            return Ok(());
        }
        let outbound = &self.players[side.index()].outbound;
        let sent = outbound.send_timeout(message, self.send_timeout).await;
        match sent {
            // A closed queue means the session is gone; its disconnect
            // arrives on the input queue.
            Ok(()) | Err(SendTimeoutError::Closed(_)) => Ok(()),
            Err(SendTimeoutError::Timeout(_)) => {
                self.stalled[side.index()] = true;
                warn!(
                    target: "runtime::room",
                    room = %self.id,
                    %side,
                    timeout = ?self.send_timeout,
                    "player stopped reading"
                );
                Err(RuntimeError::ConnectionLost(side))
            }
        }
    }

    async fn broadcast(&mut self, message: ServerMessage) -> Result<()> {
        for side in Side::BOTH {
            self.send(side, message.clone()).await?;
        }
        Ok(())
    }
}

/// Actions per side, indexed by [`Side::index`].
type Decisions = [Vec<DecisionAction>; 2];
