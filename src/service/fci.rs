// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the `fci` service which runs the plug in controller on request.
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::controller::{connect_and_run, ControllerParameters, StopSignal, TaskGoal};
use crate::exception::ControllerResult;
use crate::robot::RobotConnector;
use crate::service::{decode, encode, unknown_operation, OperationResponse, Service};

pub const SERVICE_NAME: &str = "fci";
pub const PLUG_IN: &str = "plugIn";

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct PlugInRequest {
    pub plug_in_params: ControllerParameters,
    pub duration: f64,
    pub target_position: [f64; 3],
    pub tolerance: [f64; 3],
}

impl PlugInRequest {
    pub fn new(parameters: ControllerParameters, goal: TaskGoal) -> Self {
        PlugInRequest {
            plug_in_params: parameters,
            duration: goal.duration,
            target_position: goal.target_position,
            tolerance: goal.tolerance,
        }
    }
    pub fn goal(&self) -> TaskGoal {
        TaskGoal::new(self.duration, self.target_position, self.tolerance)
    }
}

pub type PlugInResponse = OperationResponse<()>;

/// Runs the plug in controller on the robot at a fixed endpoint.
pub struct FciService<C: RobotConnector> {
    connector: C,
    endpoint: String,
    stop: Option<StopSignal>,
}

impl<C: RobotConnector> FciService<C> {
    pub fn new<S: Into<String>>(connector: C, endpoint: S) -> Self {
        FciService {
            connector,
            endpoint: endpoint.into(),
            stop: None,
        }
    }

    /// Every run of this service can be stopped through `stop`.
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Connects to the robot and runs the controller. Errors are returned as message.
    pub fn plug_in(&self, request: &PlugInRequest) -> PlugInResponse {
        info!(endpoint = %self.endpoint, "{}.{} called", SERVICE_NAME, PLUG_IN);
        let result = connect_and_run(
            &self.connector,
            &self.endpoint,
            &request.plug_in_params,
            &request.goal(),
            self.stop.clone(),
        );
        if let Err(exception) = &result {
            error!("{}.{} failed: {}", SERVICE_NAME, PLUG_IN, exception);
        }
        result.into()
    }
}

impl<C: RobotConnector> Service for FciService<C> {
    fn name(&self) -> &'static str {
        SERVICE_NAME
    }

    fn operations(&self) -> &'static [&'static str] {
        &[PLUG_IN]
    }

    fn handle(&mut self, operation: &str, request: &[u8]) -> ControllerResult<Vec<u8>> {
        match operation {
            PLUG_IN => {
                let request: PlugInRequest = decode(request)?;
                encode(&self.plug_in(&request))
            }
            _ => Err(unknown_operation(SERVICE_NAME, operation)),
        }
    }
}
