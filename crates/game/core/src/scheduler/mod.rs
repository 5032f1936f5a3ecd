//! Round scheduler: callbacks keyed by (rounds ahead, phase).
//!
//! The scheduler is a pure in-memory primitive with no knowledge of combat
//! rules. Tasks are opaque payloads of type `T`; [`RoundScheduler::run_phase`]
//! hands each due task to an executor closure together with `&mut self`, so
//! the executor may schedule, cancel or record commits while the phase runs.
//!
//! # Firing order
//!
//! Within a phase, one-shot entries fire first in the order they were
//! scheduled (entries scheduled during the phase for that same phase are
//! appended and fire before the phase ends). Recurring entries fire next, in
//! registration order; registrations made while a phase runs take effect from
//! the next run of that phase.
//!
//! # Tokens
//!
//! A token is valid from creation until it is cancelled, consumed (a one-shot
//! entry fired) or unregistered (a recurring entry). Only live tokens are
//! tracked; operations on a spent token are rejected with
//! [`SchedulerError::Spent`], which callers log and move on from.
mod commit;
mod phase;

use std::collections::{HashMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SchedulerError;
use crate::ids::Round;

pub use commit::{Commit, CommitFlags, EffectFailure, PhaseReport};
pub use phase::Phase;

/// Cancellation handle returned by every scheduling operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(u64);

/// Whether a token belongs to a one-shot or a recurring registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    Once,
    Each,
}

#[derive(Clone, Debug)]
struct Entry<T> {
    token: Token,
    task: T,
}

type PhaseQueues<T> = [Vec<Entry<T>>; Phase::COUNT];

fn empty_queues<T>() -> PhaseQueues<T> {
    std::array::from_fn(|_| Vec::new())
}

/// A task handed to the executor by [`RoundScheduler::run_phase`].
#[derive(Clone, Debug)]
pub struct Fired<T> {
    pub token: Token,
    pub phase: Phase,
    pub recurring: bool,
    pub task: T,
}

/// Queues of callbacks keyed by rounds-ahead and phase, plus per-phase
/// recurring registrations and the current round's commit log.
pub struct RoundScheduler<T> {
    round: Round,
    /// Index 0 holds the current round.
    pending: VecDeque<PhaseQueues<T>>,
    recurring: PhaseQueues<T>,
    /// Live tokens only.
    tokens: HashMap<Token, TokenKind>,
    next_token: u64,
    /// Last phase that finished running in the current round.
    completed: Option<Phase>,
    commits: Vec<Commit>,
    failures: Vec<EffectFailure>,
}

impl<T: Clone> RoundScheduler<T> {
    pub fn new() -> Self {
        let mut pending = VecDeque::new();
        pending.push_back(empty_queues());
        Self {
            round: Round::ZERO,
            pending,
            recurring: empty_queues(),
            tokens: HashMap::new(),
            next_token: 0,
            completed: None,
            commits: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn current_round(&self) -> Round {
        self.round
    }

    /// Next phase expected to run this round, or `None` once the round is done.
    pub fn next_phase(&self) -> Option<Phase> {
        match self.completed {
            None => Some(Phase::BeforeOrder),
            Some(phase) => phase.next(),
        }
    }

    /// Commit entries recorded so far this round, in firing order.
    pub fn changes(&self) -> &[Commit] {
        &self.commits
    }

    /// Callback failures collected so far this round.
    pub fn failures(&self) -> &[EffectFailure] {
        &self.failures
    }

    /// Appends a commit entry to the current round's log.
    pub fn record(&mut self, commit: Commit) {
        self.commits.push(commit);
    }

    /// Attaches a failure raised outside a callback to this round's log.
    pub fn report_failure(&mut self, phase: Phase, message: impl Into<String>) {
        let message = message.into();
        warn!(target: "duel::scheduler", round = %self.round, %phase, %message, "effect failed");
        self.failures.push(EffectFailure {
            round: self.round,
            phase,
            token: None,
            message,
        });
    }

    /// Enqueues `task` for `phase` of the current round.
    pub fn schedule_now(&mut self, phase: Phase, task: T) -> Result<Token, SchedulerError> {
        self.schedule_in(0, phase, task)
    }

    /// Enqueues `task` to fire `rounds` rounds from now at `phase`.
    ///
    /// With `rounds == 0` the phase must not have run yet this round.
    pub fn schedule_in(
        &mut self,
        rounds: u32,
        phase: Phase,
        task: T,
    ) -> Result<Token, SchedulerError> {
        if rounds == 0 && self.completed.is_some_and(|done| phase <= done) {
            return Err(SchedulerError::PhaseElapsed {
                phase,
                round: self.round,
            });
        }

        let ahead = rounds as usize;
        while self.pending.len() <= ahead {
            self.pending.push_back(empty_queues());
        }

        let token = self.issue(TokenKind::Once);
        self.pending[ahead][phase.index()].push(Entry { token, task });

        debug!(
            target: "duel::scheduler",
            token = ?token,
            round = %self.round,
            rounds,
            %phase,
            "scheduled callback"
        );
        Ok(token)
    }

    /// Prevents a pending one-shot callback from firing. Its queue entry is
    /// skipped when its phase runs.
    pub fn cancel(&mut self, token: Token) -> Result<(), SchedulerError> {
        self.spend(token, TokenKind::Once)?;
        debug!(target: "duel::scheduler", token = ?token, "cancelled callback");
        Ok(())
    }

    /// Registers `task` to fire at `phase` of every round until unregistered.
    pub fn register_each(&mut self, phase: Phase, task: T) -> Token {
        let token = self.issue(TokenKind::Each);
        self.recurring[phase.index()].push(Entry { token, task });
        debug!(target: "duel::scheduler", token = ?token, %phase, "registered recurring callback");
        token
    }

    /// Removes a recurring registration.
    pub fn unregister_each(&mut self, token: Token) -> Result<(), SchedulerError> {
        self.spend(token, TokenKind::Each)?;
        for queue in self.recurring.iter_mut() {
            queue.retain(|entry| entry.token != token);
        }
        debug!(target: "duel::scheduler", token = ?token, "unregistered recurring callback");
        Ok(())
    }

    /// True while a one-shot token can still fire or a recurring token is registered.
    pub fn is_pending(&self, token: Token) -> bool {
        self.tokens.contains_key(&token)
    }

    /// Number of callbacks still waiting to fire, including recurring ones.
    pub fn pending_count(&self) -> usize {
        self.tokens.len()
    }

    /// Tasks of every callback that can still fire, in no particular order.
    pub fn live_tasks(&self) -> impl Iterator<Item = &T> {
        self.pending
            .iter()
            .flat_map(|queues| queues.iter().flatten())
            .chain(self.recurring.iter().flatten())
            .filter(|entry| self.tokens.contains_key(&entry.token))
            .map(|entry| &entry.task)
    }

    /// Runs every callback due at `phase` of the current round.
    ///
    /// Phases must run in [`Phase::SEQUENCE`] order. A failing callback is
    /// recorded as an [`EffectFailure`] and does not stop its siblings.
    pub fn run_phase<F, E>(
        &mut self,
        phase: Phase,
        mut run: F,
    ) -> Result<PhaseReport, SchedulerError>
    where
        F: FnMut(&mut Self, Fired<T>) -> Result<(), E>,
        E: fmt::Display,
    {
        match self.next_phase() {
            Some(expected) if expected == phase => {}
            Some(expected) => {
                return Err(SchedulerError::PhaseOutOfOrder {
                    expected,
                    requested: phase,
                });
            }
            None => return Err(SchedulerError::RoundComplete { round: self.round }),
        }

        let mut report = PhaseReport {
            round: self.round,
            phase,
            fired: 0,
            failed: 0,
        };

        loop {
            let batch = std::mem::take(&mut self.pending[0][phase.index()]);
            if batch.is_empty() {
                break;
            }
            for entry in batch {
                if !self.consume(entry.token) {
                    continue;
                }
                let fired = Fired {
                    token: entry.token,
                    phase,
                    recurring: false,
                    task: entry.task,
                };
                self.execute(fired, &mut run, &mut report);
            }
        }

        let registered: Vec<Entry<T>> = self.recurring[phase.index()].clone();
        for entry in registered {
            // A sibling may have unregistered it during this phase.
            if !self.is_pending(entry.token) {
                continue;
            }
            let fired = Fired {
                token: entry.token,
                phase,
                recurring: true,
                task: entry.task,
            };
            self.execute(fired, &mut run, &mut report);
        }

        self.completed = Some(phase);
        Ok(report)
    }

    /// Advances to the next round once every phase of the current one ran.
    ///
    /// Clears the commit log and failures and shifts every pending entry one
    /// round closer.
    pub fn finish_round(&mut self) -> Result<Round, SchedulerError> {
        if let Some(next) = self.next_phase() {
            return Err(SchedulerError::RoundIncomplete {
                round: self.round,
                next,
            });
        }

        if let Some(consumed) = self.pending.pop_front() {
            debug_assert!(consumed.iter().all(Vec::is_empty));
        }
        if self.pending.is_empty() {
            self.pending.push_back(empty_queues());
        }

        self.round = self.round.next();
        self.completed = None;
        self.commits.clear();
        self.failures.clear();
        Ok(self.round)
    }

    fn issue(&mut self, kind: TokenKind) -> Token {
        let token = Token(self.next_token);
        self.next_token += 1;
        self.tokens.insert(token, kind);
        token
    }

    /// Forgets a live token of kind `expected`.
    fn spend(&mut self, token: Token, expected: TokenKind) -> Result<(), SchedulerError> {
        match self.tokens.get(&token) {
            Some(kind) if *kind == expected => {
                self.tokens.remove(&token);
                Ok(())
            }
            Some(_) => Err(SchedulerError::WrongKind { token, expected }),
            None if token.0 < self.next_token => Err(SchedulerError::Spent(token)),
            None => Err(SchedulerError::UnknownToken(token)),
        }
    }

    /// Spends a one-shot token as it fires. Returns false if it was cancelled.
    fn consume(&mut self, token: Token) -> bool {
        self.tokens.remove(&token).is_some()
    }

    fn execute<F, E>(&mut self, fired: Fired<T>, run: &mut F, report: &mut PhaseReport)
    where
        F: FnMut(&mut Self, Fired<T>) -> Result<(), E>,
        E: fmt::Display,
    {
        let token = fired.token;
        let phase = fired.phase;
        report.fired += 1;

        if let Err(error) = run(self, fired) {
            report.failed += 1;
            warn!(
                target: "duel::scheduler",
                token = ?token,
                round = %self.round,
                %phase,
                error = %error,
                "callback failed"
            );
            self.failures.push(EffectFailure {
                round: self.round,
                phase,
                token: Some(token),
                message: error.to_string(),
            });
        }
    }
}

impl<T: Clone> Default for RoundScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for RoundScheduler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoundScheduler")
            .field("round", &self.round)
            .field("completed", &self.completed)
            .field("rounds_queued", &self.pending.len())
            .field("commits", &self.commits.len())
            .finish()
    }
}
