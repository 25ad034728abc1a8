// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the messages and operation handlers of the services around the controller.
//!
//! The transport is not part of this crate. A transport receives the name of an operation and the
//! encoded request, passes both to [`Service::handle`] and sends the returned bytes back.
//! Messages are encoded with bincode. Failures of an operation are part of the encoded response,
//! [`Service::handle`] only fails if the request cannot be decoded or the operation is unknown.
use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::exception::{ControllerException, ControllerResult};

pub mod fci;
pub mod learning;

#[derive(Serialize_repr, Deserialize_repr, Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum OperationStatus {
    Success,
    Error,
}

/// Response of an operation. Holds a result on success and an error message otherwise.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OperationResponse<T> {
    pub status: OperationStatus,
    pub result: Option<T>,
    pub error: Option<String>,
}

impl<T> OperationResponse<T> {
    pub fn success(result: T) -> Self {
        OperationResponse {
            status: OperationStatus::Success,
            result: Some(result),
            error: None,
        }
    }
    pub fn failure<S: Into<String>>(message: S) -> Self {
        OperationResponse {
            status: OperationStatus::Error,
            result: None,
            error: Some(message.into()),
        }
    }
    pub fn is_success(&self) -> bool {
        self.status == OperationStatus::Success
    }
}

impl<T> From<ControllerResult<T>> for OperationResponse<T> {
    fn from(result: ControllerResult<T>) -> Self {
        match result {
            Ok(value) => OperationResponse::success(value),
            Err(error) => OperationResponse::failure(error.to_string()),
        }
    }
}

/// A named set of operations.
pub trait Service {
    /// Name under which the service is registered.
    fn name(&self) -> &'static str;
    /// Names of all operations this service handles.
    fn operations(&self) -> &'static [&'static str];
    /// Decodes `request`, executes `operation` and returns the encoded response.
    /// # Errors
    /// * [`MessageException`](`ControllerException::MessageException`) if the request cannot be
    ///   decoded or the response cannot be encoded.
    /// * [`NotFound`](`ControllerException::NotFound`) if the operation is unknown.
    fn handle(&mut self, operation: &str, request: &[u8]) -> ControllerResult<Vec<u8>>;
}

pub fn encode<T: Serialize>(message: &T) -> ControllerResult<Vec<u8>> {
    bincode::serialize(message).map_err(|error| ControllerException::MessageException {
        message: format!("could not encode message: {}", error),
    })
}

pub fn decode<T: Debug + DeserializeOwned>(encoded: &[u8]) -> ControllerResult<T> {
    bincode::deserialize(encoded).map_err(|error| ControllerException::MessageException {
        message: format!("could not decode message: {}", error),
    })
}

fn unknown_operation(service: &str, operation: &str) -> ControllerException {
    ControllerException::NotFound {
        message: format!("Unknown operation '{}.{}'", service, operation),
    }
}
