//! Turn/phase state machine
//!
//! `GameState` owns the battlefield, the turn context and the step queue.
//! Every input maps to one method; an input that does not apply to the
//! current phase returns a `Rejection` and leaves the state as it was.
//!
//! Enemy turns are not run inline. Entering `EnemyTurn` queues one
//! `Step::EnemyAct` per enemy plus a closing `Step::FinishEnemyTurn`, and the
//! host releases them with `tick` (real time) or `run_enemy_turn` (headless).

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::ai;
use crate::battlefield::Battlefield;
use crate::campaign::{BattleDef, Campaign};
use crate::combat::{self, Dice};
use crate::error::{CampaignError, Rejection};
use crate::grid::Grid;
use crate::hex::Cell;
use crate::narrative::{self, EngineEvent, Narrative, NarrativeSink, ScoreSink};
use crate::pathfinding;
use crate::schedule::{Schedule, Step};
use crate::score::compute_score;
use crate::units::{Team, UnitId};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Gap between consecutive enemy actions
pub const ENEMY_STEP_DELAY: u64 = 300;

/// Pause after the last enemy action before control returns
pub const ENEMY_SETTLE_DELAY: u64 = 400;

/// Fraction of max hp restored to survivors between battles
pub const BATTLE_HEAL_RATIO: f64 = 0.4;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Top-level mode; exactly one is active
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Menu,
    PlayerTurn,
    SelectAction,
    SelectTarget,
    /// Reserved for presentation; never entered by the engine
    Animating,
    EnemyTurn,
    BattleEnd,
    GameOver,
}

impl Phase {
    /// Phases in which the player is issuing orders
    pub fn is_player_input(self) -> bool {
        matches!(self, Phase::PlayerTurn | Phase::SelectAction | Phase::SelectTarget)
    }
}

/// Pending action for the selected unit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Move,
    Attack,
    /// Index into the unit's ability list
    Ability(usize),
}

/// Ephemeral selection state, cleared after every completed action
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TurnContext {
    selected: Option<UnitId>,
    reachable: FxHashSet<Cell>,
    targets: FxHashSet<Cell>,
    pending: Option<ActionKind>,
}

impl TurnContext {
    pub fn selected(&self) -> Option<UnitId> {
        self.selected
    }

    /// Cells the selected unit may move to
    pub fn reachable(&self) -> &FxHashSet<Cell> {
        &self.reachable
    }

    /// Candidate cells for the pending action
    pub fn targets(&self) -> &FxHashSet<Cell> {
        &self.targets
    }

    pub fn pending(&self) -> Option<ActionKind> {
        self.pending
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Engine tuning and the campaign to play
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// RNG seed; entropy when absent
    pub seed: Option<u64>,
    pub enemy_step_delay: u64,
    pub enemy_settle_delay: u64,
    pub heal_ratio: f64,
    pub campaign: Campaign,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            enemy_step_delay: ENEMY_STEP_DELAY,
            enemy_settle_delay: ENEMY_SETTLE_DELAY,
            heal_ratio: BATTLE_HEAL_RATIO,
            campaign: Campaign::standard(),
        }
    }
}

impl EngineConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_campaign(mut self, campaign: Campaign) -> Self {
        self.campaign = campaign;
        self
    }

    /// Zero delays; steps still go through the queue
    pub fn instant(mut self) -> Self {
        self.enemy_step_delay = 0;
        self.enemy_settle_delay = 0;
        self
    }
}

// ============================================================================
// GAME STATE
// ============================================================================

/// The whole simulation
#[derive(Clone, Debug)]
pub struct GameState {
    config: EngineConfig,
    field: Battlefield,
    phase: Phase,
    ctx: TurnContext,
    battle_index: usize,
    battles_won: u32,
    total_turns: u32,
    ready: bool,
    dice: Dice,
    schedule: Schedule,
    narrative: Narrative,
    events: Vec<EngineEvent>,
}

impl GameState {
    /// New engine waiting for the host's ready signal
    pub fn new(config: EngineConfig) -> Result<Self, CampaignError> {
        let dice = match config.seed {
            Some(seed) => Dice::seeded(seed),
            None => Dice::from_entropy(),
        };
        Self::with_dice(config, dice)
    }

    /// New engine with an explicit randomness source
    pub fn with_dice(config: EngineConfig, dice: Dice) -> Result<Self, CampaignError> {
        config.campaign.validate()?;
        if !(0.0..=1.0).contains(&config.heal_ratio) {
            return Err(CampaignError::BadHealRatio(config.heal_ratio));
        }
        Ok(Self {
            config,
            field: Battlefield::new(Grid::default()),
            phase: Phase::Menu,
            ctx: TurnContext::default(),
            battle_index: 0,
            battles_won: 0,
            total_turns: 0,
            ready: false,
            dice,
            schedule: Schedule::default(),
            narrative: Narrative::default(),
            events: Vec::new(),
        })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn field(&self) -> &Battlefield {
        &self.field
    }

    pub fn context(&self) -> &TurnContext {
        &self.ctx
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn battle_index(&self) -> usize {
        self.battle_index
    }

    pub fn battle(&self) -> &BattleDef {
        &self.config.campaign.battles[self.battle_index]
    }

    pub fn battles_won(&self) -> u32 {
        self.battles_won
    }

    pub fn total_turns(&self) -> u32 {
        self.total_turns
    }

    pub fn kills(&self) -> u32 {
        self.field.kills
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn narrative(&self) -> &Narrative {
        &self.narrative
    }

    /// Score of the run as it stands
    pub fn score(&self) -> i64 {
        let completed = self.battle_index + usize::from(self.phase == Phase::BattleEnd);
        compute_score(
            completed as u32,
            self.field.kills,
            self.field.living_count(Team::Player) as u32,
            self.total_turns,
        )
    }

    // ------------------------------------------------------------------
    // Host signals
    // ------------------------------------------------------------------

    /// Host readiness; sets up the first board and opens the story
    pub fn on_ready(&mut self, session: &str) -> Result<(), Rejection> {
        if self.ready {
            return self.reject(Rejection::WrongPhase { phase: self.phase, action: "ready" });
        }
        tracing::info!(session, campaign = %self.config.campaign.name, "host ready");
        self.ready = true;
        self.field = Battlefield::setup(0, self.battle(), 0);
        let event = self.narrative.transition("intro", "Hex Crusade loaded");
        self.events.push(event);
        Ok(())
    }

    /// Leave the menu and begin the first battle
    pub fn start(&mut self) -> Result<(), Rejection> {
        if !self.ready {
            return self.reject(Rejection::NotReady);
        }
        if self.phase != Phase::Menu {
            return self.reject(Rejection::WrongPhase { phase: self.phase, action: "start" });
        }
        self.battle_index = 0;
        self.battles_won = 0;
        self.total_turns = 0;
        self.schedule.clear();
        self.field = Battlefield::setup(0, self.battle(), 0);

        let message = format!("The crusade begins - Battle 1: {}", self.battle().name);
        let event = self.narrative.transition("battle-1", message);
        self.events.push(event);
        tracing::info!(battle = %self.battle().name, "campaign started");
        self.start_player_turn();
        Ok(())
    }

    /// Continue from `BattleEnd` or `GameOver`
    pub fn advance(&mut self) -> Result<(), Rejection> {
        match self.phase {
            Phase::BattleEnd if self.battle_index < self.config.campaign.last_index() => {
                self.next_battle();
                Ok(())
            }
            Phase::BattleEnd => {
                let score = self.score();
                tracing::info!(score, "campaign won");
                let event = self
                    .narrative
                    .transition("victory", format!("The crusade is complete! Final score: {}", score));
                self.finish_run(event, score);
                Ok(())
            }
            Phase::GameOver => {
                let score = self.score();
                tracing::info!(score, battle = self.battle_index + 1, "campaign lost");
                let event = self
                    .narrative
                    .transition("defeat", format!("The crusade has failed. Score: {}", score));
                self.finish_run(event, score);
                Ok(())
            }
            phase => self.reject(Rejection::WrongPhase { phase, action: "advance" }),
        }
    }

    // ------------------------------------------------------------------
    // Player input
    // ------------------------------------------------------------------

    /// Select a living player unit
    pub fn select_unit(&mut self, cell: Cell) -> Result<(), Rejection> {
        if !matches!(self.phase, Phase::PlayerTurn | Phase::SelectAction) {
            return self.reject(Rejection::WrongPhase { phase: self.phase, action: "select" });
        }
        if !cell.is_valid() {
            return self.reject(Rejection::OutOfBounds(cell));
        }
        let Some(id) = self.field.unit_at(cell).filter(|&id| self.field.unit(id).team == Team::Player) else {
            return self.reject(Rejection::NotPlayerUnit(cell));
        };

        let reachable = if self.field.unit(id).moved {
            FxHashSet::default()
        } else {
            pathfinding::reachable(&self.field, id).cells().into_iter().collect()
        };
        self.ctx = TurnContext {
            selected: Some(id),
            reachable,
            targets: FxHashSet::default(),
            pending: None,
        };
        self.phase = Phase::SelectAction;
        tracing::debug!(unit = id, %cell, "selected");
        Ok(())
    }

    /// Choose what the selected unit does next and offer its candidates
    pub fn choose_action(&mut self, kind: ActionKind) -> Result<(), Rejection> {
        if !self.phase.is_player_input() {
            return self.reject(Rejection::WrongPhase { phase: self.phase, action: "choose action" });
        }
        let Some(id) = self.ctx.selected else {
            return self.reject(Rejection::NoSelection);
        };
        let unit = self.field.unit(id);

        let targets: FxHashSet<Cell> = match kind {
            ActionKind::Move => {
                if unit.moved {
                    return self.reject(Rejection::AlreadyMoved);
                }
                pathfinding::reachable(&self.field, id).cells().into_iter().collect()
            }
            ActionKind::Attack => {
                if unit.acted {
                    return self.reject(Rejection::AlreadyActed);
                }
                pathfinding::hostile_targets(&self.field, id, unit.range).into_iter().collect()
            }
            ActionKind::Ability(slot) => {
                let Some(&ability) = unit.abilities.get(slot) else {
                    return self.reject(Rejection::UnknownAbility(slot));
                };
                if unit.acted {
                    return self.reject(Rejection::AlreadyActed);
                }
                let range = unit.range + ability.range_bonus();
                let cells = if ability.targets_allies() {
                    pathfinding::friendly_targets(&self.field, id, range)
                } else {
                    pathfinding::hostile_targets(&self.field, id, range)
                };
                cells.into_iter().collect()
            }
        };

        tracing::debug!(unit = id, action = ?kind, candidates = targets.len(), "awaiting target");
        self.ctx.targets = targets;
        self.ctx.pending = Some(kind);
        self.phase = Phase::SelectTarget;
        Ok(())
    }

    /// A click on a board cell
    ///
    /// While a target is pending, a candidate cell resolves the action and
    /// any other cell cancels back to `SelectAction`. Otherwise a reachable
    /// cell moves the selected unit and a player unit becomes the selection.
    pub fn click_cell(&mut self, cell: Cell) -> Result<(), Rejection> {
        if !self.phase.is_player_input() {
            return self.reject(Rejection::WrongPhase { phase: self.phase, action: "click" });
        }
        if !cell.is_valid() {
            return self.reject(Rejection::OutOfBounds(cell));
        }

        if self.phase == Phase::SelectTarget {
            return match (self.ctx.selected, self.ctx.pending) {
                (Some(id), Some(kind)) if self.ctx.targets.contains(&cell) => {
                    self.resolve(id, kind, cell);
                    Ok(())
                }
                _ => self.cancel(),
            };
        }

        if let Some(id) = self.ctx.selected {
            if !self.field.unit(id).moved && self.ctx.reachable.contains(&cell) {
                self.resolve(id, ActionKind::Move, cell);
                return Ok(());
            }
        }
        self.select_unit(cell)
    }

    /// Back out of target selection, or drop the selection
    pub fn cancel(&mut self) -> Result<(), Rejection> {
        match self.phase {
            Phase::SelectTarget => {
                self.ctx.targets.clear();
                self.ctx.pending = None;
                self.phase = Phase::SelectAction;
                Ok(())
            }
            Phase::SelectAction => {
                self.ctx.clear();
                self.phase = Phase::PlayerTurn;
                Ok(())
            }
            phase => self.reject(Rejection::WrongPhase { phase, action: "cancel" }),
        }
    }

    /// Hand the turn to the enemy
    pub fn end_turn(&mut self) -> Result<(), Rejection> {
        if !self.phase.is_player_input() {
            return self.reject(Rejection::WrongPhase { phase: self.phase, action: "end turn" });
        }
        self.ctx.clear();
        self.enter_enemy_turn();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Driving the queue
    // ------------------------------------------------------------------

    /// Advance the clock and run every step that fell due
    pub fn tick(&mut self, elapsed: u64) {
        self.schedule.advance(elapsed);
        while let Some(step) = self.schedule.pop_due() {
            self.run_step(step);
        }
    }

    /// Run the next queued step regardless of its due time
    pub fn step_scheduled(&mut self) -> Option<Step> {
        let step = self.schedule.pop_next()?;
        self.run_step(step);
        Some(step)
    }

    /// Drain the queue, finishing the enemy turn
    pub fn run_enemy_turn(&mut self) {
        while self.step_scheduled().is_some() {}
    }

    // ------------------------------------------------------------------
    // Outbound events
    // ------------------------------------------------------------------

    /// Take the events queued since the last drain
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drain events into the host's sinks
    pub fn flush(&mut self, story: &mut dyn NarrativeSink, scores: &mut dyn ScoreSink) {
        narrative::dispatch(self.drain_events(), story, scores);
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    fn reject<T>(&self, rejection: Rejection) -> Result<T, Rejection> {
        tracing::debug!(phase = ?self.phase, %rejection, "input rejected");
        Err(rejection)
    }

    fn start_player_turn(&mut self) {
        self.total_turns += 1;
        self.field.reset_team_flags(Team::Player);
        self.ctx.clear();
        self.phase = Phase::PlayerTurn;
        tracing::info!(turn = self.total_turns, battle = self.battle_index + 1, "player turn");
    }

    fn enter_enemy_turn(&mut self) {
        self.phase = Phase::EnemyTurn;
        self.field.reset_team_flags(Team::Enemy);

        let actors: Vec<UnitId> = self
            .field
            .living(Team::Enemy)
            .filter(|&id| !self.field.unit(id).is_castle())
            .collect();
        let mut delay = 0;
        for &id in &actors {
            delay += self.config.enemy_step_delay;
            self.schedule.push(delay, Step::EnemyAct(id));
        }
        self.schedule
            .push(delay + self.config.enemy_settle_delay, Step::FinishEnemyTurn);
        tracing::info!(enemies = actors.len(), "enemy turn");
    }

    fn run_step(&mut self, step: Step) {
        // Leftover steps of a turn that already ended the battle
        if self.phase != Phase::EnemyTurn {
            tracing::debug!(?step, phase = ?self.phase, "step skipped");
            return;
        }
        match step {
            Step::EnemyAct(id) => {
                let decision = ai::act(&mut self.field, id, &mut self.dice);
                tracing::debug!(unit = id, ?decision, "enemy acted");
                self.check_battle_end();
            }
            Step::FinishEnemyTurn => {
                if !self.check_battle_end() {
                    self.start_player_turn();
                }
            }
        }
    }

    /// Apply a confirmed action, then settle the phase
    fn resolve(&mut self, id: UnitId, kind: ActionKind, cell: Cell) {
        match kind {
            ActionKind::Move => {
                self.field.move_unit(id, cell);
                tracing::debug!(unit = id, to = %cell, "moved");
            }
            ActionKind::Attack => {
                if let Some(target) = self.field.unit_at(cell) {
                    combat::attack(&mut self.field, id, target, &mut self.dice);
                }
            }
            ActionKind::Ability(slot) => {
                let ability = self.field.unit(id).abilities.get(slot).copied();
                if let (Some(ability), Some(target)) = (ability, self.field.unit_at(cell)) {
                    combat::use_ability(&mut self.field, id, target, ability, &mut self.dice);
                }
            }
        }

        self.ctx.clear();
        if self.check_battle_end() {
            return;
        }
        if self.field.all_players_done() {
            self.enter_enemy_turn();
        } else {
            self.phase = Phase::PlayerTurn;
        }
    }

    /// Victory when the castle is down, defeat when the squad is gone
    fn check_battle_end(&mut self) -> bool {
        if self.field.castle_fallen() {
            self.battles_won += 1;
            let won = self.narrative.int_var("battles_won") + 1;
            let event = self.narrative.set_var(
                "battles_won",
                won,
                Some(format!("Castle destroyed - Battle {} won!", self.battle_index + 1)),
            );
            self.events.push(event);
            self.phase = Phase::BattleEnd;
            tracing::info!(battle = self.battle_index + 1, turns = self.total_turns, "battle won");
            return true;
        }
        if self.field.living_count(Team::Player) == 0 {
            let lost = self.narrative.int_var("casualties") + self.field.squad().len() as i64;
            let event = self
                .narrative
                .set_var("casualties", lost, Some("All units lost!".to_string()));
            self.events.push(event);
            self.phase = Phase::GameOver;
            tracing::info!(battle = self.battle_index + 1, turns = self.total_turns, "squad wiped out");
            return true;
        }
        false
    }

    /// Patch up the survivors, then set up the next battle.
    ///
    /// The next board gets a freshly built squad at full strength, so the
    /// heal only shows in the survivors' last state before the rebuild.
    fn next_battle(&mut self) {
        let ratio = self.config.heal_ratio;
        let survivors: Vec<UnitId> = self.field.living(Team::Player).collect();
        for id in survivors {
            let unit = self.field.unit_mut(id);
            let bonus = ((f64::from(unit.max_hp) * ratio).floor() as i32).max(0);
            unit.hp = (unit.hp + bonus).min(unit.max_hp);
        }

        self.battle_index += 1;
        self.schedule.clear();
        let kills = self.field.kills;
        self.field = Battlefield::setup(self.battle_index, self.battle(), kills);

        let number = self.battle_index + 1;
        let message = format!("Advancing to Battle {}: {}", number, self.battle().name);
        let event = self.narrative.transition(&format!("battle-{}", number), message);
        self.events.push(event);
        tracing::info!(battle = number, name = %self.battle().name, "next battle");
        self.start_player_turn();
    }

    fn finish_run(&mut self, event: EngineEvent, score: i64) {
        self.events.push(event);
        self.events.push(EngineEvent::Score { score });
        self.schedule.clear();
        self.ctx.clear();
        self.phase = Phase::Menu;
        self.battle_index = 0;
        self.battles_won = 0;
        self.total_turns = 0;
        self.field.kills = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narrative::Recorder;
    use crate::units::{Unit, UnitKind};

    fn engine() -> GameState {
        GameState::with_dice(EngineConfig::default().instant(), Dice::fixed(1.0, 12)).unwrap()
    }

    /// Engine in `PlayerTurn` on a custom all-plains board
    fn skirmish(units: &[(UnitKind, Team, (i32, i32))], castle_hp: i32) -> GameState {
        let mut state = engine();
        state.on_ready("test").unwrap();
        state.start().unwrap();

        let mut field = Battlefield::new(Grid::default());
        for &(kind, team, (col, row)) in units {
            field.spawn(Unit::new(kind, team, Cell::new(col, row)));
        }
        let castle = field.spawn_castle(Unit::castle(Cell::new(15, 0), 0));
        field.unit_mut(castle).hp = castle_hp;
        state.field = field;
        state
    }

    #[test]
    fn test_start_requires_ready() {
        let mut state = engine();
        assert_eq!(state.start(), Err(Rejection::NotReady));
        state.on_ready("abc").unwrap();
        state.start().unwrap();
        assert_eq!(state.phase(), Phase::PlayerTurn);
        assert_eq!(state.total_turns(), 1);

        let events = state.drain_events();
        assert_eq!(events.len(), 2);
        let EngineEvent::Narrative(payload) = &events[1] else {
            panic!("expected narrative event");
        };
        assert_eq!(payload.current_node, "battle-1");
    }

    #[test]
    fn test_clicks_ignored_outside_player_input() {
        let mut state = engine();
        state.on_ready("abc").unwrap();
        assert!(matches!(state.click_cell(Cell::new(0, 3)), Err(Rejection::WrongPhase { .. })));

        state.start().unwrap();
        state.end_turn().unwrap();
        assert_eq!(state.phase(), Phase::EnemyTurn);
        let before = state.field().clone();
        assert!(state.click_cell(Cell::new(0, 3)).is_err());
        assert!(state.select_unit(Cell::new(0, 3)).is_err());
        assert_eq!(state.field(), &before);
    }

    #[test]
    fn test_rejections_leave_state_unchanged() {
        let mut state = skirmish(&[(UnitKind::Warrior, Team::Player, (2, 2))], 40);
        let field = state.field().clone();

        assert_eq!(state.choose_action(ActionKind::Attack), Err(Rejection::NoSelection));
        assert_eq!(state.select_unit(Cell::new(9, 9)), Err(Rejection::NotPlayerUnit(Cell::new(9, 9))));
        assert_eq!(
            state.click_cell(Cell::new(20, 2)),
            Err(Rejection::OutOfBounds(Cell::new(20, 2)))
        );
        assert_eq!(state.phase(), Phase::PlayerTurn);
        assert_eq!(state.context(), &TurnContext::default());

        state.select_unit(Cell::new(2, 2)).unwrap();
        let ctx = state.context().clone();
        assert_eq!(state.choose_action(ActionKind::Ability(5)), Err(Rejection::UnknownAbility(5)));
        state.field.unit_mut(0).acted = true;
        assert_eq!(state.choose_action(ActionKind::Attack), Err(Rejection::AlreadyActed));
        state.field.unit_mut(0).acted = false;

        assert_eq!(state.context(), &ctx);
        assert_eq!(state.phase(), Phase::SelectAction);
        assert_eq!(state.field(), &field);
    }

    #[test]
    fn test_select_and_move() {
        let mut state = skirmish(&[(UnitKind::Warrior, Team::Player, (2, 2))], 40);
        state.select_unit(Cell::new(2, 2)).unwrap();
        assert_eq!(state.phase(), Phase::SelectAction);
        assert_eq!(state.context().reachable().len(), pathfinding::reachable(state.field(), 0).len());

        state.choose_action(ActionKind::Move).unwrap();
        assert_eq!(state.phase(), Phase::SelectTarget);
        state.click_cell(Cell::new(4, 2)).unwrap();

        assert_eq!(state.field().unit(0).cell, Cell::new(4, 2));
        assert_eq!(state.phase(), Phase::PlayerTurn);
        assert_eq!(state.context().selected(), None);

        state.select_unit(Cell::new(4, 2)).unwrap();
        assert!(state.context().reachable().is_empty());
        assert_eq!(state.choose_action(ActionKind::Move), Err(Rejection::AlreadyMoved));
    }

    #[test]
    fn test_non_candidate_click_cancels() {
        let mut state = skirmish(
            &[
                (UnitKind::Warrior, Team::Player, (2, 2)),
                (UnitKind::Warrior, Team::Enemy, (3, 2)),
            ],
            40,
        );
        state.select_unit(Cell::new(2, 2)).unwrap();
        state.choose_action(ActionKind::Attack).unwrap();
        assert!(state.context().targets().contains(&Cell::new(3, 2)));

        state.click_cell(Cell::new(8, 8)).unwrap();
        assert_eq!(state.phase(), Phase::SelectAction);
        assert_eq!(state.context().selected(), Some(0));
        assert!(!state.field().unit(0).acted);
        assert_eq!(state.field().unit(1).hp, 30);
    }

    #[test]
    fn test_move_only_does_not_end_turn() {
        let mut state = skirmish(
            &[
                (UnitKind::Warrior, Team::Player, (2, 2)),
                (UnitKind::Warrior, Team::Player, (2, 8)),
                (UnitKind::Warrior, Team::Enemy, (4, 8)),
            ],
            40,
        );
        state.field.unit_mut(0).moved = true;
        state.field.unit_mut(0).acted = true;

        // Direct move click with the unit selected
        state.select_unit(Cell::new(2, 8)).unwrap();
        state.click_cell(Cell::new(3, 8)).unwrap();
        assert!(state.field().unit(1).moved);
        assert_eq!(state.phase(), Phase::PlayerTurn);

        state.select_unit(Cell::new(3, 8)).unwrap();
        state.choose_action(ActionKind::Attack).unwrap();
        state.click_cell(Cell::new(4, 8)).unwrap();
        assert_eq!(state.field().unit(2).hp, 28);
        assert_eq!(state.phase(), Phase::EnemyTurn);
        assert!(!state.schedule().is_empty());
    }

    #[test]
    fn test_enemy_turn_returns_to_player() {
        let mut state = skirmish(
            &[
                (UnitKind::Warrior, Team::Player, (2, 2)),
                (UnitKind::Warrior, Team::Enemy, (8, 2)),
            ],
            40,
        );
        state.end_turn().unwrap();
        state.run_enemy_turn();

        assert_eq!(state.phase(), Phase::PlayerTurn);
        assert_eq!(state.total_turns(), 2);
        assert_ne!(state.field().unit(1).cell, Cell::new(8, 2));
        assert!(state.schedule().is_empty());
    }

    #[test]
    fn test_tick_paces_enemy_steps() {
        let config = EngineConfig::default();
        let mut state = GameState::with_dice(config, Dice::fixed(1.0, 12)).unwrap();
        state.on_ready("pace").unwrap();
        state.start().unwrap();
        let mut field = Battlefield::new(Grid::default());
        field.spawn(Unit::new(UnitKind::Warrior, Team::Player, Cell::new(2, 2)));
        field.spawn(Unit::new(UnitKind::Warrior, Team::Enemy, Cell::new(9, 2)));
        field.spawn(Unit::new(UnitKind::Warrior, Team::Enemy, Cell::new(9, 6)));
        field.spawn_castle(Unit::castle(Cell::new(15, 0), 0));
        state.field = field;

        state.end_turn().unwrap();
        state.tick(299);
        assert!(!state.field().unit(1).moved);
        state.tick(1);
        assert!(state.field().unit(1).moved);
        assert!(!state.field().unit(2).moved);
        state.tick(300);
        assert!(state.field().unit(2).moved);
        assert_eq!(state.phase(), Phase::EnemyTurn);
        state.tick(399);
        assert_eq!(state.phase(), Phase::EnemyTurn);
        state.tick(1);
        assert_eq!(state.phase(), Phase::PlayerTurn);
    }

    #[test]
    fn test_castle_kill_ends_battle_at_once() {
        let mut state = skirmish(
            &[
                (UnitKind::Warrior, Team::Player, (14, 0)),
                (UnitKind::Warrior, Team::Player, (2, 8)),
                (UnitKind::Warrior, Team::Enemy, (8, 8)),
            ],
            1,
        );
        state.select_unit(Cell::new(14, 0)).unwrap();
        state.choose_action(ActionKind::Attack).unwrap();
        state.click_cell(Cell::new(15, 0)).unwrap();

        assert_eq!(state.phase(), Phase::BattleEnd);
        assert_eq!(state.battles_won(), 1);
        assert_eq!(state.narrative().int_var("battles_won"), 1);
        // Enemy warrior untouched
        assert!(state.field().unit(2).alive);
    }

    #[test]
    fn test_last_player_death_is_game_over() {
        let mut state = skirmish(
            &[
                (UnitKind::Warrior, Team::Player, (5, 5)),
                (UnitKind::Warrior, Team::Enemy, (6, 5)),
                (UnitKind::Warrior, Team::Enemy, (4, 5)),
            ],
            40,
        );
        state.field.unit_mut(0).hp = 1;
        state.end_turn().unwrap();
        state.run_enemy_turn();

        assert_eq!(state.phase(), Phase::GameOver);
        assert!(!state.field().unit(0).alive);
        assert_eq!(state.narrative().int_var("casualties"), 1);
        // Second enemy's step ran after the defeat and did nothing
        assert!(!state.field().unit(2).acted);
    }

    #[test]
    fn test_freeze_holds_enemy_for_one_turn() {
        let mut state = skirmish(
            &[
                (UnitKind::Mage, Team::Player, (5, 5)),
                (UnitKind::Warrior, Team::Enemy, (7, 5)),
            ],
            40,
        );
        let freeze = state.field().unit(0).abilities.iter().position(|a| a.name() == "Freeze").unwrap();
        state.select_unit(Cell::new(5, 5)).unwrap();
        state.choose_action(ActionKind::Ability(freeze)).unwrap();
        state.click_cell(Cell::new(7, 5)).unwrap();
        assert!(state.field().unit(1).frozen);

        state.end_turn().unwrap();
        state.run_enemy_turn();
        assert_eq!(state.field().unit(1).cell, Cell::new(7, 5));

        state.end_turn().unwrap();
        state.run_enemy_turn();
        assert_ne!(state.field().unit(1).cell, Cell::new(7, 5));
    }

    #[test]
    fn test_defeat_submits_score_once() {
        let mut state = skirmish(
            &[
                (UnitKind::Warrior, Team::Player, (5, 5)),
                (UnitKind::Warrior, Team::Enemy, (6, 5)),
            ],
            40,
        );
        state.field.unit_mut(0).hp = 1;
        state.end_turn().unwrap();
        state.run_enemy_turn();
        state.advance().unwrap();
        assert_eq!(state.phase(), Phase::Menu);
        assert_eq!(state.total_turns(), 0);
        assert_eq!(state.advance(), Err(Rejection::WrongPhase { phase: Phase::Menu, action: "advance" }));

        let mut sink = Recorder::default();
        let mut scores = Recorder::default();
        state.flush(&mut sink, &mut scores);
        // 0 battles, 0 kills, 0 survivors, 1 turn
        assert_eq!(scores.scores, vec![-5]);
        assert_eq!(sink.payloads.last().map(|p| p.current_node.as_str()), Some("defeat"));
    }

    #[test]
    fn test_fallen_units_return_for_next_battle() {
        let mut state = engine();
        state.on_ready("regroup").unwrap();
        state.start().unwrap();

        combat::apply_damage(&mut state.field, 1, 1000);
        state.field.unit_mut(0).hp = 5;
        let base_def = state.field().unit(3).def;
        state.field.unit_mut(3).def += 3;
        let castle = state.field().castle().unwrap();
        combat::apply_damage(&mut state.field, castle, 1000);
        assert!(state.check_battle_end());
        assert_eq!(state.kills(), 1);
        state.advance().unwrap();

        assert_eq!(state.battle_index(), 1);
        assert_eq!(state.narrative().current_node(), "battle-2");
        assert_eq!(state.field().living_count(Team::Player), 4);
        for id in 0..4 {
            let unit = state.field().unit(id);
            assert!(unit.alive, "{}", unit.name());
            assert_eq!(unit.hp, unit.max_hp, "{}", unit.name());
        }
        assert_eq!(state.field().unit(3).def, base_def);
        assert_eq!(state.kills(), 1);
    }

    #[test]
    fn test_heal_ratio_must_be_a_fraction() {
        for ratio in [-0.5, 1.5, f64::NAN] {
            let config = EngineConfig {
                heal_ratio: ratio,
                ..EngineConfig::default()
            };
            assert!(matches!(
                GameState::with_dice(config, Dice::fixed(1.0, 12)),
                Err(CampaignError::BadHealRatio(_))
            ));
        }
        let config = EngineConfig {
            heal_ratio: 0.0,
            ..EngineConfig::default()
        };
        assert!(GameState::with_dice(config, Dice::fixed(1.0, 12)).is_ok());
    }

    #[test]
    fn test_full_campaign_victory() {
        let mut state = engine();
        state.on_ready("run").unwrap();
        state.start().unwrap();

        for battle in 0..3 {
            assert_eq!(state.battle_index(), battle);
            let castle = state.field().castle().unwrap();
            combat::apply_damage(&mut state.field, castle, 1000);
            assert!(state.check_battle_end());
            assert_eq!(state.phase(), Phase::BattleEnd);
            state.advance().unwrap();
        }

        assert_eq!(state.phase(), Phase::Menu);
        let scores: Vec<i64> = state
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                EngineEvent::Score { score } => Some(score),
                _ => None,
            })
            .collect();
        // 3 battles, 3 castle kills, 4 survivors, 3 turns
        assert_eq!(scores, vec![3000 + 30 + 2000 - 15]);
    }
}
