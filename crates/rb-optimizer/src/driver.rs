//! The seam between the bridge and a black-box optimizer.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rb_types::{BridgeResult, Cost, RunStatistics};

use crate::descriptor::BlackBoxDescriptor;

/// Per-candidate callback the optimizer drives.
pub trait Objective {
    /// Cost of one candidate vector, positions ordered as in the descriptor.
    fn evaluate(&mut self, point: &[f64]) -> BridgeResult<Cost>;
}

/// What an optimizer reports once it terminates.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationOutcome {
    pub cost: Cost,
    pub optimum: Vec<f64>,
    pub iterations: usize,
    pub evaluations: usize,
    pub fast_evaluations: usize,
}

impl OptimizationOutcome {
    pub fn statistics(&self) -> RunStatistics {
        RunStatistics {
            iterations: self.iterations,
            evaluations: self.evaluations,
            fast_evaluations: self.fast_evaluations,
        }
    }
}

/// A derivative-free optimizer that only observes (vector -> cost) pairs.
///
/// Candidates are proposed one at a time; each call to
/// [`Objective::evaluate`] blocks until the cost is known. An error from the
/// objective must abort the run and be returned unchanged.
pub trait BlackBoxOptimizer {
    fn optimize(
        &mut self,
        descriptor: &BlackBoxDescriptor,
        objective: &mut dyn Objective,
    ) -> BridgeResult<OptimizationOutcome>;

    /// Human-readable optimizer name.
    fn name(&self) -> &str;
}

// ---- Random search ----

/// Uniform random sampling of integer points inside the bounds.
///
/// Stands in for a model-based optimizer when none is wired up; it spends
/// `min(max_evaluations, max_iterations)` evaluations and keeps the lowest
/// cost seen.
#[derive(Debug, Clone, Default)]
pub struct RandomSearchOptimizer {
    seed: Option<u64>,
}

impl RandomSearchOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the seed instead of using the descriptor's wall-clock seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn sample_one(rng: &mut StdRng, descriptor: &BlackBoxDescriptor) -> Vec<f64> {
        descriptor
            .parameters()
            .iter()
            .map(|param| rng.random_range(param.bound.left..=param.bound.right) as f64)
            .collect()
    }
}

impl BlackBoxOptimizer for RandomSearchOptimizer {
    fn optimize(
        &mut self,
        descriptor: &BlackBoxDescriptor,
        objective: &mut dyn Objective,
    ) -> BridgeResult<OptimizationOutcome> {
        let settings = descriptor.settings();
        let seed = self.seed.unwrap_or(settings.rand_seed);
        let budget = settings.max_evaluations.min(settings.max_iterations);
        let mut rng = StdRng::seed_from_u64(seed);

        tracing::info!("Random search: budget {} evaluations, seed {}", budget, seed);

        let mut best: Option<(Cost, Vec<f64>)> = None;
        for _ in 0..budget {
            let point = Self::sample_one(&mut rng, descriptor);
            let cost = objective.evaluate(&point)?;

            let improved = match &best {
                None => true,
                Some((best_cost, _)) => cost < *best_cost,
            };
            if improved {
                best = Some((cost, point));
            }
        }

        let (cost, optimum) = match best {
            Some(best) => best,
            // budget is never zero for a validated config
            None => (Cost::INFINITY, descriptor.var_lower().to_vec()),
        };

        Ok(OptimizationOutcome {
            cost,
            optimum,
            iterations: budget,
            evaluations: budget,
            fast_evaluations: 0,
        })
    }

    fn name(&self) -> &str {
        "random"
    }
}
