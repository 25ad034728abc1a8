// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains a random search optimizer for the controller parameters.
//!
//! Every trial draws each parameter uniformly from its bounds. The optimizer remembers the
//! cheapest trial which satisfied the constraint.
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::exception::{create_invalid_parameters, ControllerException, ControllerResult};

/// Configuration of one optimization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hyperparameters {
    max_iterations: usize,
    lower_bounds: Vec<f64>,
    upper_bounds: Vec<f64>,
}

impl Hyperparameters {
    /// # Errors
    /// [`InvalidParameters`](`ControllerException::InvalidParameters`) if the bounds differ in
    /// length, are not finite, a lower bound exceeds its upper bound or the width of an interval
    /// overflows.
    pub fn new(
        max_iterations: usize,
        lower_bounds: Vec<f64>,
        upper_bounds: Vec<f64>,
    ) -> ControllerResult<Self> {
        if lower_bounds.len() != upper_bounds.len() {
            return Err(create_invalid_parameters(format!(
                "got {} lower bounds but {} upper bounds",
                lower_bounds.len(),
                upper_bounds.len()
            )));
        }
        for (i, (lower, upper)) in lower_bounds.iter().zip(upper_bounds.iter()).enumerate() {
            if !lower.is_finite()
                || !upper.is_finite()
                || lower > upper
                || !(upper - lower).is_finite()
            {
                return Err(create_invalid_parameters(format!(
                    "bounds of parameter {} are not a finite interval: [{}, {}]",
                    i, lower, upper
                )));
            }
        }
        Ok(Hyperparameters {
            max_iterations,
            lower_bounds,
            upper_bounds,
        })
    }
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }
    pub fn param_count(&self) -> usize {
        self.lower_bounds.len()
    }
    pub fn lower_bounds(&self) -> &[f64] {
        &self.lower_bounds
    }
    pub fn upper_bounds(&self) -> &[f64] {
        &self.upper_bounds
    }
}

/// A finished trial.
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    pub iteration: usize,
    pub sample: Vec<f64>,
    pub cost: f64,
    pub constraint_satisfied: bool,
}

/// Random search over a box of parameters.
pub struct RandomSearch<G: Rng = StdRng> {
    hyperparameters: Hyperparameters,
    distributions: Vec<Uniform<f64>>,
    rng: G,
    current_iteration: usize,
    last_sample: Option<Vec<f64>>,
    trials: Vec<Trial>,
    best: Option<usize>,
}

impl RandomSearch<StdRng> {
    /// Creates an uninitialized optimizer seeded from the operating system.
    pub fn new() -> Self {
        RandomSearch::with_rng(StdRng::from_entropy())
    }
}

impl Default for RandomSearch<StdRng> {
    fn default() -> Self {
        RandomSearch::new()
    }
}

impl<G: Rng> RandomSearch<G> {
    /// Creates an uninitialized optimizer which draws from `rng`.
    pub fn with_rng(rng: G) -> Self {
        RandomSearch {
            hyperparameters: Hyperparameters::default(),
            distributions: Vec::new(),
            rng,
            current_iteration: 0,
            last_sample: None,
            trials: Vec::new(),
            best: None,
        }
    }

    /// Starts a new optimization and forgets all previous trials.
    pub fn init(&mut self, hyperparameters: Hyperparameters) {
        self.distributions = hyperparameters
            .lower_bounds
            .iter()
            .zip(hyperparameters.upper_bounds.iter())
            .map(|(lower, upper)| Uniform::new_inclusive(*lower, *upper))
            .collect();
        self.hyperparameters = hyperparameters;
        self.current_iteration = 0;
        self.last_sample = None;
        self.trials.clear();
        self.best = None;
    }

    /// Draws the parameters for the next trial.
    pub fn next_sample(&mut self) -> Vec<f64> {
        let rng = &mut self.rng;
        let sample: Vec<f64> = self
            .distributions
            .iter()
            .map(|distribution| distribution.sample(&mut *rng))
            .collect();
        self.last_sample = Some(sample.clone());
        sample
    }

    /// Reports the result of the trial with the last drawn sample.
    ///
    /// Returns true if the optimization has finished.
    /// # Errors
    /// [`NotFound`](`ControllerException::NotFound`) if no sample was drawn since
    /// [`init`](`Self::init`).
    pub fn set_result(&mut self, cost: f64, constraint_satisfied: bool) -> ControllerResult<bool> {
        let sample = self
            .last_sample
            .clone()
            .ok_or_else(|| ControllerException::NotFound {
                message: "No sample has been drawn so far!".to_string(),
            })?;
        let best_cost = self.best_trial().map_or(f64::MAX, |trial| trial.cost);
        if constraint_satisfied && cost < best_cost {
            self.best = Some(self.trials.len());
        }
        self.trials.push(Trial {
            iteration: self.current_iteration,
            sample,
            cost,
            constraint_satisfied,
        });

        let best = self.best_trial();
        info!(
            iteration = self.current_iteration,
            parameters = ?self.last_sample,
            cost,
            success = constraint_satisfied,
            best_parameters = ?best.map(|trial| &trial.sample),
            best_cost = ?best.map(|trial| trial.cost),
            "random search trial finished"
        );
        self.current_iteration += 1;
        Ok(self.has_finished())
    }

    /// true once `max_iterations` results were reported
    pub fn has_finished(&self) -> bool {
        self.current_iteration >= self.hyperparameters.max_iterations
    }

    /// Parameters of the cheapest trial which satisfied the constraint.
    /// # Errors
    /// [`NotFound`](`ControllerException::NotFound`) if no trial satisfied the constraint yet.
    pub fn best_sample(&self) -> ControllerResult<&[f64]> {
        self.best_trial()
            .map(|trial| trial.sample.as_slice())
            .ok_or_else(|| ControllerException::NotFound {
                message: "App hasn't been learned so far!".to_string(),
            })
    }

    pub fn best_trial(&self) -> Option<&Trial> {
        self.best.and_then(|index| self.trials.get(index))
    }

    pub fn current_iteration(&self) -> usize {
        self.current_iteration
    }

    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyperparameters
    }
}
