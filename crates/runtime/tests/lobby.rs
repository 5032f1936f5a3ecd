use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use duel_content::{
    Account, Catalog, CharacterDefinition, ClassDefinition, TeamDefinition, TeamId, TeamMember,
};
use duel_core::{
    ArmorType, CharacterId, ClassId, DamageType, Outcome, Round, Side, SkillDefinition, SkillId,
    SkillKind, StatKind, TargetingMode,
};
use duel_runtime::{
    ClientMessage, Connection, DecisionAction, Event, FinishReason, LobbyEvent, LobbyHandle,
    OracleManager, Perspective, RoomEvent, RuntimeConfig, ServerMessage, Topic,
};
use tokio::time::{Instant, timeout};

const JAB: SkillId = SkillId(1);
const EXECUTE: SkillId = SkillId(2);
const DECISION_TIMEOUT: Duration = Duration::from_secs(30);

const PLAYERS: [(&str, u32); 4] = [("p0", 0), ("p19", 19), ("p20", 20), ("p40", 40)];

fn catalog() -> Catalog {
    let class = ClassDefinition {
        id: ClassId(1),
        name: "Duelist".into(),
        stats: BTreeMap::from([(StatKind::Health, 40), (StatKind::Speed, 5)]),
        armor: ArmorType::Unarmored,
        ward: ArmorType::Unarmored,
    };
    let skills = vec![
        SkillDefinition::new(JAB, "Jab", SkillKind::Strike, TargetingMode::Single)
            .with_damage(DamageType::Pure, 5),
        SkillDefinition::new(EXECUTE, "Execute", SkillKind::Strike, TargetingMode::Single)
            .with_damage(DamageType::Pure, 100),
    ];
    let character = CharacterDefinition {
        id: CharacterId(1),
        name: "Blade".into(),
        class: ClassId(1),
        equipment: Vec::new(),
        skills: vec![JAB, EXECUTE],
    };
    let teams = PLAYERS
        .iter()
        .zip(1..)
        .map(|((owner, _), id)| TeamDefinition {
            id: TeamId(id),
            name: format!("{owner}'s team"),
            owner: owner.to_string(),
            members: vec![TeamMember {
                character: CharacterId(1),
                row: 0,
                column: 0,
            }],
        })
        .collect();
    let accounts = PLAYERS
        .iter()
        .map(|(username, games_played)| Account {
            username: username.to_string(),
            password: "secret".into(),
            games_played: *games_played,
        })
        .collect();

    Catalog::new(vec![class], Vec::new(), skills, vec![character], teams, accounts)
}

fn lobby() -> LobbyHandle {
    let config = RuntimeConfig::default()
        .with_decision_timeout(DECISION_TIMEOUT)
        .with_battle_seed(42);
    LobbyHandle::new(config, OracleManager::from_catalog(Arc::new(catalog())))
}

fn team_of(username: &str) -> TeamId {
    let index = PLAYERS
        .iter()
        .position(|(name, _)| *name == username)
        .expect("known player");
    TeamId(index as u32 + 1)
}

async fn next(connection: &mut Connection) -> ServerMessage {
    timeout(Duration::from_secs(120), connection.recv())
        .await
        .expect("message before timeout")
        .expect("session still open")
}

/// Connects, logs in and selects the player's team, consuming every reply up
/// to `Queued`.
async fn join(lobby: &LobbyHandle, username: &str) -> Connection {
    let mut connection = lobby.connect();
    assert!(matches!(next(&mut connection).await, ServerMessage::Welcome { .. }));

    connection
        .send(ClientMessage::Login {
            username: username.into(),
            password: "secret".into(),
        })
        .await
        .unwrap();
    assert!(matches!(next(&mut connection).await, ServerMessage::LoginSucceeded { .. }));

    connection
        .send(ClientMessage::SelectTeam {
            team: team_of(username),
        })
        .await
        .unwrap();
    assert!(matches!(next(&mut connection).await, ServerMessage::ValidTeam { .. }));
    assert_eq!(next(&mut connection).await, ServerMessage::Queued);
    connection
}

/// Consumes the match announcement and returns (own character, rival character).
async fn seated(connection: &mut Connection) -> (CharacterId, CharacterId) {
    let ServerMessage::MatchFound { team, .. } = next(connection).await else {
        panic!("expected match found");
    };
    let ServerMessage::RivalInfo { team: rival, .. } = next(connection).await else {
        panic!("expected rival info");
    };
    (team[0].character.id(), rival[0].character.id())
}

async fn wait_for_queue(lobby: &LobbyHandle, expected: usize) {
    while lobby.queue_len().await != expected {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

async fn decision_phase_start(connection: &mut Connection) -> Round {
    match next(connection).await {
        ServerMessage::DecisionPhaseStart { round, timeout_ms } => {
            assert_eq!(timeout_ms, DECISION_TIMEOUT.as_millis() as u64);
            round
        }
        other => panic!("expected decision phase start, got {other:?}"),
    }
}

fn decide(caller: CharacterId, skill: SkillId, target: CharacterId) -> ClientMessage {
    ClientMessage::Decision {
        actions: vec![DecisionAction {
            caller,
            skill,
            targets: vec![target],
        }],
    }
}

#[tokio::test(start_paused = true)]
async fn pairs_players_within_window_on_second_arrival() {
    let lobby = lobby();
    let mut matches = lobby.subscribe(Topic::Lobby);

    let mut first = join(&lobby, "p0").await;
    let _far = join(&lobby, "p40").await;
    wait_for_queue(&lobby, 2).await;
    let mut second = join(&lobby, "p19").await;

    assert!(matches!(
        next(&mut first).await,
        ServerMessage::MatchFound { side: Side::One, .. }
    ));
    assert!(matches!(
        next(&mut second).await,
        ServerMessage::MatchFound { side: Side::Two, .. }
    ));
    assert_eq!(lobby.queue_len().await, 1);
    assert_eq!(lobby.active_rooms().await, 1);

    loop {
        if let Event::Lobby(LobbyEvent::Matched { players, .. }) = matches.recv().await.unwrap() {
            assert_eq!(players, ["p0".to_string(), "p19".to_string()]);
            break;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn never_pairs_at_window_bound() {
    let lobby = lobby();
    let mut low = join(&lobby, "p0").await;
    let _high = join(&lobby, "p20").await;
    wait_for_queue(&lobby, 2).await;

    assert!(timeout(Duration::from_secs(300), low.recv()).await.is_err());
    assert_eq!(lobby.queue_len().await, 2);
    assert_eq!(lobby.active_rooms().await, 0);
}

#[tokio::test(start_paused = true)]
async fn disconnect_while_queued_leaves_the_queue() {
    let lobby = lobby();
    let mut events = lobby.subscribe(Topic::Lobby);
    let waiting = join(&lobby, "p0").await;
    wait_for_queue(&lobby, 1).await;

    drop(waiting);
    wait_for_queue(&lobby, 0).await;
    loop {
        if let Event::Lobby(LobbyEvent::Left { username, .. }) = events.recv().await.unwrap() {
            assert_eq!(username, "p0");
            break;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn disconnect_during_decisions_forfeits_once() {
    let lobby = lobby();
    let mut rooms = lobby.subscribe(Topic::Room);

    let mut one = join(&lobby, "p0").await;
    wait_for_queue(&lobby, 1).await;
    let mut two = join(&lobby, "p19").await;
    seated(&mut one).await;
    seated(&mut two).await;
    decision_phase_start(&mut one).await;
    decision_phase_start(&mut two).await;

    drop(one);
    assert_eq!(
        next(&mut two).await,
        ServerMessage::Win {
            reason: FinishReason::Forfeit
        }
    );

    match rooms.recv().await.unwrap() {
        Event::Room(RoomEvent::Finished {
            outcome, forfeit, ..
        }) => {
            assert_eq!(outcome, Outcome::Winner { side: Side::Two });
            assert!(forfeit);
        }
        other => panic!("unexpected room event {other:?}"),
    }
    tokio::time::sleep(DECISION_TIMEOUT * 2).await;
    assert!(rooms.try_recv().is_err());
    assert_eq!(lobby.active_rooms().await, 0);

    // The winner is back at team selection.
    two.send(ClientMessage::SelectTeam {
        team: team_of("p19"),
    })
    .await
    .unwrap();
    assert!(matches!(next(&mut two).await, ServerMessage::ValidTeam { .. }));
}

#[tokio::test(start_paused = true)]
async fn missing_decisions_time_out() {
    let lobby = lobby();
    let mut one = join(&lobby, "p0").await;
    wait_for_queue(&lobby, 1).await;
    let mut two = join(&lobby, "p19").await;
    seated(&mut one).await;
    seated(&mut two).await;

    assert_eq!(decision_phase_start(&mut one).await, Round(0));
    let opened = Instant::now();

    assert_eq!(next(&mut one).await, ServerMessage::DecisionPhaseEnd { round: Round(0) });
    assert!(opened.elapsed() >= DECISION_TIMEOUT);
    assert_eq!(
        next(&mut one).await,
        ServerMessage::RoundResults {
            round: Round(0),
            entries: Vec::new(),
        }
    );
    assert_eq!(decision_phase_start(&mut one).await, Round(1));
}

#[tokio::test(start_paused = true)]
async fn both_decisions_resolve_before_timeout() {
    let lobby = lobby();
    let mut one = join(&lobby, "p0").await;
    wait_for_queue(&lobby, 1).await;
    let mut two = join(&lobby, "p19").await;
    let (mine, rival) = seated(&mut one).await;
    seated(&mut two).await;
    decision_phase_start(&mut one).await;
    decision_phase_start(&mut two).await;
    let opened = Instant::now();

    one.send(decide(mine, JAB, rival)).await.unwrap();
    two.send(decide(rival, JAB, mine)).await.unwrap();

    assert_eq!(next(&mut one).await, ServerMessage::DecisionPhaseEnd { round: Round(0) });
    assert!(opened.elapsed() < DECISION_TIMEOUT);

    let ServerMessage::RoundResults { entries, .. } = next(&mut one).await else {
        panic!("expected round results");
    };
    assert_eq!(entries.len(), 2);
    // Equal speed: player one's decision fires first.
    assert_eq!(entries[0].actor, Perspective::Own);
    assert_eq!(entries[0].caller, mine);
    assert_eq!(entries[0].changes.len(), 1);
    assert_eq!(entries[0].changes[0].character(), rival);
    assert_eq!(entries[0].changes[0].stat_delta(), Some((StatKind::Health, -5)));
    assert_eq!(entries[1].actor, Perspective::Rival);

    next(&mut two).await;
    let ServerMessage::RoundResults { entries, .. } = next(&mut two).await else {
        panic!("expected round results");
    };
    assert_eq!(entries[0].actor, Perspective::Rival);
    assert_eq!(entries[1].actor, Perspective::Own);
}

#[tokio::test(start_paused = true)]
async fn invalid_decisions_never_fire() {
    let lobby = lobby();
    let mut one = join(&lobby, "p0").await;
    wait_for_queue(&lobby, 1).await;
    let mut two = join(&lobby, "p19").await;
    let (mine, rival) = seated(&mut one).await;
    seated(&mut two).await;
    decision_phase_start(&mut one).await;
    decision_phase_start(&mut two).await;

    // Player one commands the rival's character; player two uses an unknown skill.
    one.send(decide(rival, JAB, mine)).await.unwrap();
    two.send(decide(rival, SkillId(99), mine)).await.unwrap();

    assert_eq!(next(&mut one).await, ServerMessage::DecisionPhaseEnd { round: Round(0) });
    assert_eq!(
        next(&mut one).await,
        ServerMessage::RoundResults {
            round: Round(0),
            entries: Vec::new(),
        }
    );
}

#[tokio::test(start_paused = true)]
async fn defeat_ends_the_match() {
    let lobby = lobby();
    let mut rooms = lobby.subscribe(Topic::Room);
    let mut one = join(&lobby, "p0").await;
    wait_for_queue(&lobby, 1).await;
    let mut two = join(&lobby, "p19").await;
    let (mine, rival) = seated(&mut one).await;
    seated(&mut two).await;
    decision_phase_start(&mut one).await;
    decision_phase_start(&mut two).await;

    one.send(decide(mine, EXECUTE, rival)).await.unwrap();
    two.send(decide(rival, EXECUTE, mine)).await.unwrap();

    next(&mut one).await;
    let ServerMessage::RoundResults { entries, .. } = next(&mut one).await else {
        panic!("expected round results");
    };
    // The rival fell before acting, so only player one's cast is reported.
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].actor, Perspective::Own);
    assert_eq!(
        next(&mut one).await,
        ServerMessage::Win {
            reason: FinishReason::Defeat
        }
    );

    next(&mut two).await;
    next(&mut two).await;
    assert_eq!(
        next(&mut two).await,
        ServerMessage::Lose {
            reason: FinishReason::Defeat
        }
    );

    loop {
        if let Event::Room(RoomEvent::Finished {
            outcome, forfeit, ..
        }) = rooms.recv().await.unwrap()
        {
            assert_eq!(outcome, Outcome::Winner { side: Side::One });
            assert!(!forfeit);
            break;
        }
    }
    tokio::time::sleep(DECISION_TIMEOUT * 2).await;
    assert!(rooms.try_recv().is_err());
    assert_eq!(lobby.active_rooms().await, 0);
}

#[tokio::test(start_paused = true)]
async fn lone_decision_resolves_at_timeout() {
    let lobby = lobby();
    let mut one = join(&lobby, "p0").await;
    wait_for_queue(&lobby, 1).await;
    let mut two = join(&lobby, "p19").await;
    let (mine, rival) = seated(&mut one).await;
    seated(&mut two).await;
    decision_phase_start(&mut one).await;
    decision_phase_start(&mut two).await;
    let opened = Instant::now();

    one.send(decide(mine, JAB, rival)).await.unwrap();

    assert_eq!(next(&mut one).await, ServerMessage::DecisionPhaseEnd { round: Round(0) });
    assert!(opened.elapsed() >= DECISION_TIMEOUT);

    let ServerMessage::RoundResults { round, entries } = next(&mut one).await else {
        panic!("expected round results");
    };
    assert_eq!(round, Round(0));
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].actor, Perspective::Own);
    assert_eq!(entries[0].caller, mine);
    assert_eq!(entries[0].changes.len(), 1);
    assert_eq!(entries[0].changes[0].stat_delta(), Some((StatKind::Health, -5)));
}

#[tokio::test(start_paused = true)]
async fn disconnect_between_rounds_forfeits() {
    let lobby = lobby();
    let mut rooms = lobby.subscribe(Topic::Room);
    let mut one = join(&lobby, "p0").await;
    wait_for_queue(&lobby, 1).await;
    let mut two = join(&lobby, "p19").await;
    let (mine, rival) = seated(&mut one).await;
    seated(&mut two).await;
    decision_phase_start(&mut one).await;
    decision_phase_start(&mut two).await;

    // The second decision closes the window; the disconnect behind it is
    // only seen once the round has resolved.
    one.send(decide(mine, JAB, rival)).await.unwrap();
    two.send(decide(rival, JAB, mine)).await.unwrap();
    drop(two);

    assert_eq!(next(&mut one).await, ServerMessage::DecisionPhaseEnd { round: Round(0) });
    assert!(matches!(
        next(&mut one).await,
        ServerMessage::RoundResults { round: Round(0), .. }
    ));
    assert_eq!(
        next(&mut one).await,
        ServerMessage::Win {
            reason: FinishReason::Forfeit
        }
    );

    loop {
        if let Event::Room(RoomEvent::Finished {
            outcome, forfeit, ..
        }) = rooms.recv().await.unwrap()
        {
            assert_eq!(outcome, Outcome::Winner { side: Side::One });
            assert!(forfeit);
            break;
        }
    }
    assert_eq!(lobby.active_rooms().await, 0);
}

#[tokio::test(start_paused = true)]
async fn stalled_reader_forfeits() {
    let config = RuntimeConfig::default()
        .with_decision_timeout(DECISION_TIMEOUT)
        .with_battle_seed(42)
        .with_outbound_buffer(2)
        .with_send_timeout(Duration::from_secs(1));
    let lobby = LobbyHandle::new(config, OracleManager::from_catalog(Arc::new(catalog())));
    let mut rooms = lobby.subscribe(Topic::Room);

    let mut one = join(&lobby, "p0").await;
    wait_for_queue(&lobby, 1).await;
    // Player two never reads past its queue confirmation.
    let _two = join(&lobby, "p19").await;
    seated(&mut one).await;
    decision_phase_start(&mut one).await;
    let opened = Instant::now();

    assert_eq!(
        next(&mut one).await,
        ServerMessage::Win {
            reason: FinishReason::Forfeit
        }
    );
    assert!(opened.elapsed() < DECISION_TIMEOUT);

    loop {
        if let Event::Room(RoomEvent::Finished {
            outcome, forfeit, ..
        }) = rooms.recv().await.unwrap()
        {
            assert_eq!(outcome, Outcome::Winner { side: Side::One });
            assert!(forfeit);
            break;
        }
    }
}
