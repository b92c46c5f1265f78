//! Population statistics collected between ticks.

use std::collections::VecDeque;

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use super::environment::Environment;

/// Snapshot of an environment right after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickStats {
    /// Number of completed ticks.
    pub tick: u64,
    /// Live organisms.
    pub organisms: usize,
    /// Food items left.
    pub food: usize,
    /// Organisms that died during the tick.
    pub deaths: usize,
    /// Energy of the food eaten during the tick.
    pub food_consumed: f32,
    /// Mean energy of the live organisms (`0.0` without organisms).
    pub mean_energy: f32,
}

impl TickStats {
    /// Collects statistics for the tick `env` just completed.
    pub fn from_environment(env: &Environment) -> Self {
        let (organisms, total_energy) = env
            .organisms()
            .fold((0, 0.0), |(count, energy), (_, organism)| {
                (count + 1, energy + organism.energy)
            });
        let mean_energy = if organisms == 0 {
            0.0
        } else {
            total_energy / organisms as f32
        };

        Self {
            tick: env.tick(),
            organisms,
            food: env.food_count(),
            deaths: env.dead_organisms().len(),
            food_consumed: env.food_consumed(),
            mean_energy,
        }
    }
}

/// Mean and standard deviation of the genetic traits of a population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraitSummary {
    /// Mean `[speed, size, awareness]`.
    pub mean: [f32; 3],
    /// Population standard deviation of `[speed, size, awareness]`.
    pub std_dev: [f32; 3],
}

impl TraitSummary {
    /// Summarises the traits of every live organism.
    ///
    /// # Returns
    ///
    /// `None` when the environment holds no organisms.
    pub fn from_environment(env: &Environment) -> Option<Self> {
        let traits: Vec<f32> = env
            .organisms()
            .flat_map(|(_, organism)| [organism.speed(), organism.size(), organism.awareness()])
            .collect();
        let rows = traits.len() / 3;
        if rows == 0 {
            return None;
        }

        let traits = Array2::from_shape_vec((rows, 3), traits).ok()?;
        let mean = traits.mean_axis(Axis(0))?;
        let std_dev = traits.std_axis(Axis(0), 0.0);

        Some(Self {
            mean: [mean[0], mean[1], mean[2]],
            std_dev: [std_dev[0], std_dev[1], std_dev[2]],
        })
    }
}

/// Bounded history of tick statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsHistory {
    /// Most recent statistics, oldest first.
    pub ticks: VecDeque<TickStats>,
    /// Maximum number of ticks to keep.
    pub max_history: usize,
}

impl Default for StatsHistory {
    fn default() -> Self {
        Self::new(100)
    }
}

impl StatsHistory {
    /// Creates an empty history keeping at most `max_history` ticks.
    pub fn new(max_history: usize) -> Self {
        Self {
            ticks: VecDeque::with_capacity(max_history),
            max_history,
        }
    }

    /// Records the statistics of the tick `env` just completed.
    pub fn record(&mut self, env: &Environment) {
        self.push(TickStats::from_environment(env));
    }

    /// Appends `stats`, dropping the oldest entry once full.
    pub fn push(&mut self, stats: TickStats) {
        self.ticks.push_back(stats);
        while self.ticks.len() > self.max_history {
            self.ticks.pop_front();
        }
    }

    /// Most recently recorded statistics.
    pub fn latest(&self) -> Option<&TickStats> {
        self.ticks.back()
    }

    /// Number of ticks tracked.
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    /// Returns `true` when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Average number of live organisms over the tracked ticks.
    pub fn avg_organisms(&self) -> f32 {
        self.average(|stats| stats.organisms as f32)
    }

    /// Average food energy consumed per tick over the tracked ticks.
    pub fn avg_food_consumed(&self) -> f32 {
        self.average(|stats| stats.food_consumed)
    }

    /// Total deaths over the tracked ticks.
    pub fn total_deaths(&self) -> usize {
        self.ticks.iter().map(|stats| stats.deaths).sum()
    }

    fn average(&self, value: impl Fn(&TickStats) -> f32) -> f32 {
        if self.ticks.is_empty() {
            0.0
        } else {
            self.ticks.iter().map(value).sum::<f32>() / self.ticks.len() as f32
        }
    }
}
