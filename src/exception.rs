// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains exception and Result definitions
use crate::robot::logger::Record;
use thiserror::Error;

/// Represents all kind of errors which can occur while running the plug in controller or one of
/// the services around it.
#[derive(Error, Debug)]
pub enum ControllerException {
    /// ControlException is returned if an error occurs inside a running control loop.
    /// It holds the error that ended the loop and the last states and commands exchanged with the
    /// robot. The number of recorded cycles is configured by the robot backend.
    #[error("{error}")]
    ControlException {
        /// Vector of states and commands logged just before the error occurred.
        log: Option<Vec<Record>>,
        /// The error which ended the control loop.
        error: Box<ControllerException>,
    },

    /// Timeout is returned if the end effector did not reach the target within the tolerance
    /// before the duration ran out.
    #[error(
        "Timeout: Plug in controller failed! Elapsed time {elapsed:.3} s exceeds duration \
         {duration:.3} s. Position error {position_error:?} m, tolerance {tolerance:?} m"
    )]
    Timeout {
        /// Elapsed controller time in \[s\].
        elapsed: f64,
        /// Configured duration in \[s\].
        duration: f64,
        /// Per-axis absolute distance to the target at the last cycle in \[m\].
        position_error: [f64; 3],
        /// Per-axis tolerance in \[m\].
        tolerance: [f64; 3],
    },

    /// ConnectionFault is returned if the communication with the robot or its model is lost.
    #[error("{message}")]
    ConnectionFault { message: String },

    /// CommandException is returned if a command cannot be sent to the robot, e.g. because it is
    /// not finite or no motion is running.
    #[error("{message}")]
    CommandException { message: String },

    /// InvalidParameters is returned before the control loop starts if a parameter is out of range.
    #[error("Invalid parameters: {message}")]
    InvalidParameters { message: String },

    /// NotFound is returned by the optimizer if a result is requested which does not exist yet.
    #[error("{message}")]
    NotFound { message: String },

    /// Stopped is returned if a stop was requested while the controller was running.
    #[error("Plug in controller stopped after {elapsed:.3} s on request")]
    Stopped {
        /// Elapsed controller time in \[s\].
        elapsed: f64,
    },

    /// ConfigException is returned if a configuration cannot be read or parsed.
    #[error("{message}")]
    ConfigException { message: String },

    /// MessageException is returned if a service message cannot be encoded or decoded.
    #[error("{message}")]
    MessageException { message: String },
}

impl ControllerException {
    /// Returns the error which caused this exception.
    ///
    /// Errors raised inside a control loop are wrapped into a
    /// [`ControlException`](`Self::ControlException`) together with the log. This strips
    /// that layer.
    pub fn cause(&self) -> &ControllerException {
        match self {
            ControllerException::ControlException { error, .. } => error.cause(),
            other => other,
        }
    }
}

/// creates an InvalidParameters exception
pub(crate) fn create_invalid_parameters<S: Into<String>>(message: S) -> ControllerException {
    ControllerException::InvalidParameters {
        message: message.into(),
    }
}

/// Result type which can have ControllerException as Error
pub type ControllerResult<T> = Result<T, ControllerException>;
