// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the logging type definitions for [`ControlException`](`crate::exception::ControllerException::ControlException`)
use crate::robot::control_types::Torques;
use crate::robot::robot_state::RobotState;
use std::collections::VecDeque;

/// One row of the log contains a robot state of timestamp n and the torque command
/// computed from it.
/// Provided by the [`ControlException`](`crate::exception::ControllerException::ControlException`).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Record {
    /// Robot state of timestamp n.
    pub state: RobotState,
    /// Torque command computed for timestamp n.
    pub command: Torques,
}

impl Record {
    /// creates a string representation based on the debug formatter
    pub fn log(&self) -> String {
        format!("{:?}", self)
    }
}

/// Ring buffer over the last `log_size` control cycles.
///
/// Memory is reserved up front, logging inside the control loop does not allocate.
pub(crate) struct Logger {
    records: VecDeque<Record>,
    log_size: usize,
}

impl Logger {
    pub fn new(log_size: usize) -> Self {
        Logger {
            records: VecDeque::with_capacity(log_size),
            log_size,
        }
    }
    pub fn log(&mut self, state: &RobotState, command: &Torques) {
        if self.log_size == 0 {
            return;
        }
        if self.records.len() == self.log_size {
            self.records.pop_front();
        }
        self.records.push_back(Record {
            state: *state,
            command: *command,
        });
    }
    /// returns the records from oldest to newest and clears the log
    pub fn flush(&mut self) -> Vec<Record> {
        self.records.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::robot::control_types::Torques;
    use crate::robot::logger::Logger;
    use crate::robot::robot_state::RobotState;
    use std::time::Duration;

    fn state_at(millis: u64) -> RobotState {
        RobotState {
            time: Duration::from_millis(millis),
            ..Default::default()
        }
    }

    #[test]
    fn keeps_only_the_newest_records() {
        let mut logger = Logger::new(3);
        for i in 0..5 {
            logger.log(&state_at(i), &Torques::new([i as f64; 7]));
        }
        let records = logger.flush();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].state.time, Duration::from_millis(2));
        assert_eq!(records[2].command.tau_J, [4.; 7]);
        assert!(logger.flush().is_empty());
    }

    #[test]
    fn zero_sized_logger_records_nothing() {
        let mut logger = Logger::new(0);
        logger.log(&state_at(1), &Torques::new([0.; 7]));
        assert!(logger.flush().is_empty());
    }
}
