//! Per-connection session state machine.
//!
//! welcome -> login -> team selection -> queued -> in room, and back to team
//! selection once the room closes. Dropping the inbound sender is the
//! disconnect signal.
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::{Lobby, QueueEntry};
use crate::events::{Event, LobbyEvent};
use crate::protocol::{ClientMessage, PROTOCOL_VERSION, ServerMessage};
use crate::room::{RoomInput, Seat};
use crate::types::{PlayerSummary, SessionId, TeamSnapshot};

/// How a wait or a match ended for this session.
enum Step<T> {
    Next(T),
    Disconnected,
}

pub(crate) struct Session {
    id: SessionId,
    lobby: Arc<Lobby>,
    inbound: mpsc::Receiver<ClientMessage>,
    outbound: mpsc::Sender<ServerMessage>,
}

impl Session {
    pub fn new(
        id: SessionId,
        lobby: Arc<Lobby>,
        inbound: mpsc::Receiver<ClientMessage>,
        outbound: mpsc::Sender<ServerMessage>,
    ) -> Self {
        Self {
            id,
            lobby,
            inbound,
            outbound,
        }
    }

    pub async fn run(mut self) {
        self.send(ServerMessage::Welcome {
            version: PROTOCOL_VERSION,
        })
        .await;

        let Step::Next(player) = self.login().await else {
            return self.disconnected();
        };

        loop {
            let Step::Next(team) = self.select_team(&player).await else {
                return self.disconnected();
            };

            let (seat_tx, seat_rx) = oneshot::channel();
            self.send(ServerMessage::Queued).await;
            self.lobby
                .enqueue(QueueEntry {
                    session: self.id,
                    player: player.clone(),
                    team,
                    outbound: self.outbound.clone(),
                    seat: seat_tx,
                })
                .await;

            let seat = match self.wait_for_seat(&player, seat_rx).await {
                Step::Next(Some(seat)) => seat,
                Step::Next(None) => {
                    self.send(ServerMessage::error("the match could not be started"))
                        .await;
                    continue;
                }
                Step::Disconnected => return self.disconnected(),
            };

            if let Step::Disconnected = self.play(seat).await {
                return self.disconnected();
            }
        }
    }

    async fn login(&mut self) -> Step<PlayerSummary> {
        loop {
            let Some(message) = self.inbound.recv().await else {
                return Step::Disconnected;
            };
            let ClientMessage::Login { username, password } = message else {
                self.send(ServerMessage::error("log in first")).await;
                continue;
            };

            match self
                .lobby
                .oracles
                .accounts()
                .authenticate(&username, &password)
                .await
            {
                Ok(player) => {
                    info!(target: "runtime::lobby", session = %self.id, %username, "logged in");
                    self.send(ServerMessage::LoginSucceeded {
                        username: player.username.clone(),
                        games_played: player.games_played,
                    })
                    .await;
                    return Step::Next(player);
                }
                Err(error) => {
                    debug!(
                        target: "runtime::lobby",
                        session = %self.id,
                        %username,
                        %error,
                        "login failed"
                    );
                    self.send(ServerMessage::LoginFailed {
                        reason: error.to_string(),
                    })
                    .await;
                }
            }
        }
    }

    async fn select_team(&mut self, player: &PlayerSummary) -> Step<TeamSnapshot> {
        loop {
            let Some(message) = self.inbound.recv().await else {
                return Step::Disconnected;
            };
            let ClientMessage::SelectTeam { team } = message else {
                self.send(ServerMessage::error("select a team first")).await;
                continue;
            };

            match self
                .lobby
                .oracles
                .teams()
                .team(&player.username, team)
                .await
            {
                Ok(snapshot) => {
                    self.send(ServerMessage::ValidTeam {
                        team,
                        name: snapshot.name.clone(),
                    })
                    .await;
                    return Step::Next(snapshot);
                }
                Err(error) => {
                    self.send(ServerMessage::InvalidTeam {
                        team,
                        reason: error.to_string(),
                    })
                    .await;
                }
            }
        }
    }

    /// Waits in the queue. `Next(None)` when the room could not be built.
    async fn wait_for_seat(
        &mut self,
        player: &PlayerSummary,
        mut seat_rx: oneshot::Receiver<Seat>,
    ) -> Step<Option<Seat>> {
        loop {
            tokio::select! {
                seat = &mut seat_rx => return Step::Next(seat.ok()),
                message = self.inbound.recv() => {
                    if message.is_some() {
                        self.send(ServerMessage::error("waiting for an opponent")).await;
                        continue;
                    }
                    if self.lobby.queue.remove(self.id).await.is_some() {
                        self.lobby.bus.publish(Event::Lobby(LobbyEvent::Left {
                            session: self.id,
                            username: player.username.clone(),
                        }));
                        return Step::Disconnected;
                    }
                    // Matched concurrently: take the seat only to forfeit it.
                    if let Ok(seat) = seat_rx.await {
                        let _ = seat.input.send(RoomInput::Disconnect { side: seat.side }).await;
                    }
                    return Step::Disconnected;
                }
            }
        }
    }

    /// Forwards decisions until the room closes.
    async fn play(&mut self, mut seat: Seat) -> Step<()> {
        debug!(
            target: "runtime::lobby",
            session = %self.id,
            room = %seat.room,
            side = %seat.side,
            "seated"
        );
        loop {
            tokio::select! {
                biased;
                _ = &mut seat.released => return Step::Next(()),
                message = self.inbound.recv() => match message {
                    Some(ClientMessage::Decision { actions }) => {
                        let input = RoomInput::Decision { side: seat.side, actions };
                        if seat.input.send(input).await.is_err() {
                            warn!(
                                target: "runtime::lobby",
                                session = %self.id,
                                room = %seat.room,
                                "room input closed"
                            );
                        }
                    }
                    Some(_) => self.send(ServerMessage::error("a battle is in progress")).await,
                    None => {
                        let _ = seat.input.send(RoomInput::Disconnect { side: seat.side }).await;
                        return Step::Disconnected;
                    }
                },
            }
        }
    }

    async fn send(&self, message: ServerMessage) {
        let _ = self.outbound.send(message).await;
    }

    fn disconnected(&self) {
        debug!(target: "runtime::lobby", session = %self.id, "disconnected");
    }
}
