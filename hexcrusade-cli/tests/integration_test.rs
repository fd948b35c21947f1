//! Integration tests for HEX CRUSADE
//!
//! Tests the full stack: engine, autopilot policies, campaign runner and batches

use hexcrusade_core::{
    compute_score, ActionKind, BattleDef, Battlefield, Campaign, CampaignError, Cell, Dice, EngineConfig,
    EngineEvent, GameState, Phase, Recorder, Team, TerrainProfile, UnitKind,
};
use hexcrusade_runner::{run_batch, CampaignRunner, PolicyKind, RunResult, RunnerConfig};

// ============================================================================
// TEST FIXTURES
// ============================================================================

/// A single battle on open plains with no defenders
fn undefended() -> Campaign {
    Campaign {
        name: "Undefended".to_string(),
        battles: vec![BattleDef::new(
            "Empty Keep",
            &[],
            Cell::new(15, 2),
            TerrainProfile::new(-1.0, -1.0, None),
        )],
    }
}

fn greedy(seed: u64) -> RunnerConfig {
    RunnerConfig::default().with_policy(PolicyKind::Greedy).with_seed(seed)
}

// ============================================================================
// CAMPAIGN TESTS
// ============================================================================

#[test]
fn test_greedy_campaign_is_reproducible() {
    let first = CampaignRunner::new(greedy(11)).play().unwrap();
    let second = CampaignRunner::new(greedy(11)).play().unwrap();

    assert_eq!(first.result, second.result);
    assert_eq!(first.turns, second.turns);
    assert_eq!(first.kills, second.kills);
    assert_eq!(first.score, second.score);
}

#[test]
fn test_outcome_score_matches_formula() {
    for seed in [1, 2, 3] {
        let outcome = CampaignRunner::new(greedy(seed)).play().unwrap();
        let completed = outcome.battle_index as u32 + u32::from(outcome.result == RunResult::Victory);
        assert_eq!(
            outcome.score,
            compute_score(completed, outcome.kills, outcome.survivors, outcome.turns),
            "seed {}",
            seed
        );
        assert!(outcome.battles_won as usize <= Campaign::standard().len());
    }
}

#[test]
fn test_story_stream_brackets_the_run() {
    let mut story = Recorder::default();
    let mut scores = Recorder::default();
    let outcome = CampaignRunner::new(greedy(5))
        .play_with_sinks(&mut story, &mut scores)
        .unwrap();

    let nodes: Vec<&str> = story.payloads.iter().map(|p| p.current_node.as_str()).collect();
    assert_eq!(&nodes[..2], &["intro", "battle-1"]);

    match outcome.result {
        RunResult::Victory => {
            assert_eq!(nodes.last(), Some(&"victory"));
            assert_eq!(scores.scores, vec![outcome.score]);
        }
        RunResult::Defeat => {
            assert_eq!(nodes.last(), Some(&"defeat"));
            assert_eq!(scores.scores, vec![outcome.score]);
        }
        RunResult::TurnLimit => assert!(scores.scores.is_empty()),
        RunResult::Stalled => panic!("runner stalled: {outcome:?}"),
    }
}

#[test]
fn test_undefended_castle_falls() {
    let engine = EngineConfig::default().with_campaign(undefended());
    let config = greedy(8).with_engine(engine).with_seed(8);
    let mut story = Recorder::default();
    let mut scores = Recorder::default();
    let outcome = CampaignRunner::new(config)
        .play_with_sinks(&mut story, &mut scores)
        .unwrap();

    assert_eq!(outcome.result, RunResult::Victory);
    assert_eq!(outcome.battles_won, 1);
    assert_eq!(outcome.kills, 1);
    assert_eq!(outcome.survivors, 4);
    assert_eq!(outcome.score, 1000 + 10 + 2000 - 5 * i64::from(outcome.turns));
    assert_eq!(scores.scores, vec![outcome.score]);
    assert_eq!(story.payloads.last().map(|p| p.current_node.as_str()), Some("victory"));
}

#[test]
fn test_batch_summary_counts() {
    let config = RunnerConfig::default().with_policy(PolicyKind::Greedy).with_max_turns(60);
    let summary = run_batch(&config, 6, 40).unwrap();

    assert_eq!(summary.games, 6);
    assert_eq!(summary.victories + summary.defeats + summary.turn_limits, 6);
    assert_eq!(summary.stalled, 0);
    assert!(summary.best_score >= summary.worst_score);
    for (i, outcome) in summary.outcomes.iter().enumerate() {
        assert_eq!(outcome.seed, Some(40 + i as u64));
    }
}

// ============================================================================
// ENGINE TESTS
// ============================================================================

#[test]
fn test_manual_turn_through_public_api() {
    let mut state = GameState::with_dice(EngineConfig::default(), Dice::fixed(1.0, 12)).unwrap();
    state.on_ready("manual").unwrap();
    state.start().unwrap();

    // Warrior spawns at (0,3)
    state.click_cell(Cell::new(0, 3)).unwrap();
    assert_eq!(state.phase(), Phase::SelectAction);
    state.choose_action(ActionKind::Move).unwrap();
    let dest = *state
        .context()
        .targets()
        .iter()
        .max_by_key(|c| (c.col, -c.row))
        .unwrap();
    state.click_cell(dest).unwrap();
    assert_eq!(state.field().unit(0).cell, dest);

    state.end_turn().unwrap();
    assert_eq!(state.phase(), Phase::EnemyTurn);
    // Enemy steps wait for the clock
    assert!(state.click_cell(Cell::new(0, 6)).is_err());
    while state.phase() == Phase::EnemyTurn {
        let delay = state.schedule().time_to_next().unwrap();
        state.tick(delay);
    }
    assert_eq!(state.phase(), Phase::PlayerTurn);
    assert_eq!(state.total_turns(), 2);

    let events = state.drain_events();
    assert!(events.iter().all(|e| matches!(e, EngineEvent::Narrative(_))));
}

#[test]
fn test_battle_setup_is_deterministic() {
    let campaign = Campaign::standard();
    for (index, def) in campaign.battles.iter().enumerate() {
        let a = Battlefield::setup(index, def, 0);
        let b = Battlefield::setup(index, def, 0);
        assert_eq!(a, b);
        assert_eq!(a.living_count(Team::Player), 4);
        assert_eq!(a.living_count(Team::Enemy), def.enemies.len() + 1);
    }
}

// ============================================================================
// CONFIGURATION TESTS
// ============================================================================

#[test]
fn test_campaign_file_roundtrip() {
    let path = std::env::temp_dir().join(format!("hexcrusade-campaign-{}.json", std::process::id()));
    let campaign = undefended();
    campaign.save(&path).unwrap();
    let loaded = Campaign::load(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded, campaign);
}

#[test]
fn test_invalid_campaign_rejected() {
    let empty = Campaign {
        name: "Nothing".to_string(),
        battles: Vec::new(),
    };
    let config = EngineConfig::default().with_campaign(empty);
    assert!(matches!(GameState::new(config), Err(CampaignError::Empty)));

    let crowded = Campaign {
        name: "Crowded".to_string(),
        battles: vec![BattleDef::new(
            "Crowd",
            &[UnitKind::Warrior; 11],
            Cell::new(15, 2),
            TerrainProfile::default(),
        )],
    };
    assert!(matches!(crowded.validate(), Err(CampaignError::TooManyEnemies { .. })));
}

#[test]
fn test_engine_config_partial_json() {
    let config: EngineConfig = serde_json::from_str(r#"{ "seed": 7 }"#).unwrap();
    assert_eq!(config.seed, Some(7));
    assert_eq!(config.enemy_step_delay, 300);
    assert_eq!(config.enemy_settle_delay, 400);
    assert_eq!(config.campaign, Campaign::standard());
}
