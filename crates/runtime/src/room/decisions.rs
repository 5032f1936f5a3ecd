//! Decision collection and cast construction.
use std::collections::BTreeSet;

use duel_core::{CastId, Round, Side};
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, info, warn};

use super::{Decisions, RoomWorker};
use crate::api::{Result, RuntimeError};
use crate::protocol::{DecisionAction, ServerMessage};

/// Input a session forwards to its room.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum RoomInput {
    Decision {
        side: Side,
        actions: Vec<DecisionAction>,
    },
    Disconnect {
        side: Side,
    },
}

impl RoomWorker {
    /// Opens the decision window and waits until both players submitted or
    /// the timeout elapses. A missing submission counts as no actions.
    ///
    /// Returns `None` when both sessions are gone without a disconnect
    /// notice, and `ConnectionLost` when a player disconnects.
    pub(super) async fn collect_decisions(&mut self, round: Round) -> Result<Option<Decisions>> {
        let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        self.broadcast(ServerMessage::DecisionPhaseStart { round, timeout_ms })
            .await?;

        let mut submitted: [Option<Vec<DecisionAction>>; 2] = [None, None];
        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        while submitted.iter().any(Option::is_none) {
            tokio::select! {
                _ = &mut deadline => {
                    info!(
                        target: "runtime::room",
                        room = %self.id,
                        %round,
                        missing = submitted.iter().filter(|s| s.is_none()).count(),
                        "decision window elapsed"
                    );
                    break;
                }
                input = self.input.recv() => match input {
                    Some(RoomInput::Decision { side, actions }) => {
                        let slot = &mut submitted[side.index()];
                        if slot.is_some() {
                            warn!(
                                target: "runtime::anticheat",
                                room = %self.id,
                                %round,
                                %side,
                                "second decision in one round ignored"
                            );
                        } else {
                            debug!(
                                target: "runtime::room",
                                room = %self.id,
                                %round,
                                %side,
                                actions = actions.len(),
                                "decision received"
                            );
                            *slot = Some(actions);
                        }
                    }
                    Some(RoomInput::Disconnect { side }) => {
                        return Err(RuntimeError::ConnectionLost(side));
                    }
                    None => return Ok(None),
                },
            }
        }

        let [one, two] = submitted;
        Ok(Some([one.unwrap_or_default(), two.unwrap_or_default()]))
    }

    /// Drains input that arrived while the round resolved. Decisions outside
    /// the window are dropped; a disconnect is reported.
    pub(super) fn pending_disconnect(&mut self) -> Option<Side> {
        loop {
            match self.input.try_recv() {
                Ok(RoomInput::Disconnect { side }) => return Some(side),
                Ok(RoomInput::Decision { side, .. }) => {
                    warn!(
                        target: "runtime::anticheat",
                        room = %self.id,
                        %side,
                        "decision outside the decision window ignored"
                    );
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return None,
            }
        }
    }

    /// Turns both players' actions into casts, player one's first.
    ///
    /// Invalid actions never enter the firing order; they are logged for
    /// review instead.
    pub(super) fn build_casts(&mut self, decisions: Decisions) -> Vec<CastId> {
        let mut casts = Vec::new();
        for (side, actions) in Side::BOTH.into_iter().zip(decisions) {
            let mut callers = BTreeSet::new();
            for action in actions {
                let owner = self.battle.roster().get(action.caller).map(|c| c.side());
                if owner != Some(side) {
                    warn!(
                        target: "runtime::anticheat",
                        room = %self.id,
                        %side,
                        caller = %action.caller,
                        "caller is not on the submitting side"
                    );
                    continue;
                }
                if !callers.insert(action.caller) {
                    warn!(
                        target: "runtime::anticheat",
                        room = %self.id,
                        %side,
                        caller = %action.caller,
                        "caller already acted this round"
                    );
                    continue;
                }
                match self.battle.cast(action.caller, &action.targets, action.skill) {
                    Ok(cast) => casts.push(cast),
                    Err(error) => warn!(
                        target: "runtime::anticheat",
                        room = %self.id,
                        %side,
                        caller = %action.caller,
                        skill = %action.skill,
                        %error,
                        "invalid cast rejected"
                    ),
                }
            }
        }
        casts
    }
}
