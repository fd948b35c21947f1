//! Ordered queue of delayed engine steps
//!
//! Enemy turns are paced so a presentation layer can animate between steps.
//! Steps are queued with a due time on the engine's clock and released in
//! due-time order (FIFO among equal times) as the driver advances the clock.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::units::UnitId;

/// A deferred engine step
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    /// Run the AI for one enemy
    EnemyAct(UnitId),
    /// Close the enemy turn: battle-end check, then back to the player
    FinishEnemyTurn,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct Scheduled {
    due: u64,
    step: Step,
}

/// Clocked step queue
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    now: u64,
    queue: VecDeque<Scheduled>,
}

impl Schedule {
    /// Current clock value
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Queue a step `delay` units from now
    pub fn push(&mut self, delay: u64, step: Step) {
        let due = self.now + delay;
        // Keep sorted by due time, stable for equal times
        let at = self.queue.iter().position(|s| s.due > due).unwrap_or(self.queue.len());
        self.queue.insert(at, Scheduled { due, step });
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Move the clock forward
    pub fn advance(&mut self, elapsed: u64) {
        self.now = self.now.saturating_add(elapsed);
    }

    /// Pop the earliest step if it is due
    pub fn pop_due(&mut self) -> Option<Step> {
        match self.queue.front() {
            Some(s) if s.due <= self.now => self.queue.pop_front().map(|s| s.step),
            _ => None,
        }
    }

    /// Pop the earliest step, jumping the clock to its due time
    pub fn pop_next(&mut self) -> Option<Step> {
        let next = self.queue.pop_front()?;
        self.now = self.now.max(next.due);
        Some(next.step)
    }

    /// Time until the next step is due
    pub fn time_to_next(&self) -> Option<u64> {
        self.queue.front().map(|s| s.due.saturating_sub(self.now))
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
