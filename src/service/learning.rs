// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the `learning` service which exposes a [`RandomSearch`] optimizer.
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::exception::{create_invalid_parameters, ControllerResult};
use crate::random_search::{Hyperparameters, RandomSearch};
use crate::service::{decode, encode, unknown_operation, OperationResponse, Service};

pub const SERVICE_NAME: &str = "learning";
pub const INIT: &str = "init";
pub const GET_PARAMS: &str = "getParams";
pub const SET_RESULT: &str = "setResult";
pub const GET_BEST_PARAMS: &str = "getBestParams";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InitRequest {
    pub max_iteration: u32,
    pub param_count: u32,
    pub lower_bounds: Vec<f64>,
    pub upper_bounds: Vec<f64>,
}

impl InitRequest {
    fn hyperparameters(&self) -> ControllerResult<Hyperparameters> {
        let param_count = self.param_count as usize;
        if self.lower_bounds.len() != param_count || self.upper_bounds.len() != param_count {
            return Err(create_invalid_parameters(format!(
                "expected {} bounds, got {} lower and {} upper bounds",
                param_count,
                self.lower_bounds.len(),
                self.upper_bounds.len()
            )));
        }
        Hyperparameters::new(
            self.max_iteration as usize,
            self.lower_bounds.clone(),
            self.upper_bounds.clone(),
        )
    }
}

pub type InitResponse = OperationResponse<()>;

/// Request of `getParams` and `getBestParams`.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq)]
pub struct GetParamsRequest {}

pub type GetParamsResponse = OperationResponse<Vec<f64>>;

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct SetResultRequest {
    pub cost: f64,
    pub success: bool,
}

/// Holds true once the optimization has finished.
pub type SetResultResponse = OperationResponse<bool>;

pub struct LearningService<G: Rng = StdRng> {
    optimizer: RandomSearch<G>,
}

impl LearningService<StdRng> {
    pub fn new() -> Self {
        LearningService::with_optimizer(RandomSearch::new())
    }
}

impl Default for LearningService<StdRng> {
    fn default() -> Self {
        LearningService::new()
    }
}

impl<G: Rng> LearningService<G> {
    pub fn with_optimizer(optimizer: RandomSearch<G>) -> Self {
        LearningService { optimizer }
    }

    pub fn optimizer(&self) -> &RandomSearch<G> {
        &self.optimizer
    }

    pub fn init(&mut self, request: &InitRequest) -> InitResponse {
        let result = request.hyperparameters().map(|hyperparameters| {
            info!(
                max_iterations = hyperparameters.max_iterations(),
                param_count = hyperparameters.param_count(),
                "initializing random search"
            );
            self.optimizer.init(hyperparameters)
        });
        result.into()
    }

    pub fn get_params(&mut self) -> GetParamsResponse {
        OperationResponse::success(self.optimizer.next_sample())
    }

    pub fn set_result(&mut self, request: &SetResultRequest) -> SetResultResponse {
        self.optimizer
            .set_result(request.cost, request.success)
            .into()
    }

    pub fn get_best_params(&self) -> GetParamsResponse {
        let result = self.optimizer.best_sample().map(|sample| sample.to_vec());
        if let Err(exception) = &result {
            warn!("{}.{}: {}", SERVICE_NAME, GET_BEST_PARAMS, exception);
        }
        result.into()
    }
}

impl<G: Rng> Service for LearningService<G> {
    fn name(&self) -> &'static str {
        SERVICE_NAME
    }

    fn operations(&self) -> &'static [&'static str] {
        &[INIT, GET_PARAMS, SET_RESULT, GET_BEST_PARAMS]
    }

    fn handle(&mut self, operation: &str, request: &[u8]) -> ControllerResult<Vec<u8>> {
        match operation {
            INIT => {
                let request: InitRequest = decode(request)?;
                encode(&self.init(&request))
            }
            GET_PARAMS => {
                let _: GetParamsRequest = decode(request)?;
                encode(&self.get_params())
            }
            SET_RESULT => {
                let request: SetResultRequest = decode(request)?;
                encode(&self.set_result(&request))
            }
            GET_BEST_PARAMS => {
                let _: GetParamsRequest = decode(request)?;
                encode(&self.get_best_params())
            }
            _ => Err(unknown_operation(SERVICE_NAME, operation)),
        }
    }
}
