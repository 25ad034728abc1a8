// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the configuration file of a plug in run.
//!
//! Every key is optional. Missing keys take the values of the standalone program:
//! ```toml
//! [robot]
//! hostname = "172.16.0.2"
//! realtime = true
//!
//! [parameters]
//! translational_stiffness = 1000.0
//! rotational_stiffness = 30.0
//! desired_force = 3.0
//! wiggle_frequency_x = 0.8
//! wiggle_frequency_y = 0.5
//! wiggle_amplitude_x = 0.5
//! wiggle_amplitude_y = 0.8
//!
//! [parameters.force_gains]
//! k_p = 0.0
//! k_i = 1.0
//!
//! [goal]
//! duration = 5.0
//! target_position = [0.0, 0.0, 0.0]
//! tolerance = [0.0, 0.0, 0.0]
//! ```
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::controller::{ControllerParameters, TaskGoal};
use crate::exception::{ControllerException, ControllerResult};

/// Connection settings of the robot.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RobotConfig {
    /// IP address or hostname of the robot.
    pub hostname: String,
    /// Whether the control loop requires a real-time kernel.
    pub realtime: bool,
}

impl Default for RobotConfig {
    fn default() -> Self {
        RobotConfig {
            hostname: String::new(),
            realtime: true,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct PlugInConfig {
    pub robot: RobotConfig,
    pub parameters: ControllerParameters,
    pub goal: TaskGoal,
}

impl PlugInConfig {
    /// Parses and validates a configuration.
    pub fn from_toml_str(content: &str) -> ControllerResult<Self> {
        let config: PlugInConfig =
            toml::from_str(content).map_err(|error| ControllerException::ConfigException {
                message: format!("could not parse configuration: {}", error),
            })?;
        config.parameters.validate()?;
        config.goal.validate()?;
        Ok(config)
    }

    /// Reads the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ControllerResult<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).map_err(|error| ControllerException::ConfigException {
                message: format!("could not read {}: {}", path.display(), error),
            })?;
        PlugInConfig::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> ControllerResult<String> {
        toml::to_string(self).map_err(|error| ControllerException::ConfigException {
            message: format!("could not serialize configuration: {}", error),
        })
    }
}
