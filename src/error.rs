// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the bridge.
//!
//! The hierarchy mirrors the failure domains of the bridge: talking to the
//! controller ([`TransportError`]), establishing a session ([`AuthError`]),
//! understanding what the controller returned ([`ParseError`]) and reading
//! the bridge configuration ([`ConfigError`]).
//!
//! A query that has been waiting too long for an answer is not an error: the
//! pending query ledger reports it as a retry and the poll loop re-sends it.

use thiserror::Error;

use crate::types::NodeId;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The controller could not be reached or answered with a failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// No session could be established with the controller.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// The controller returned data of an unexpected shape.
    #[error("malformed response: {0}")]
    Parse(#[from] ParseError),

    /// The bridge configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A command was addressed to a node that has no tracked accessory.
    #[error("no accessory is tracked for node {0}")]
    UnknownAccessory(NodeId),

    /// A set event was received for a characteristic that cannot be written.
    #[error("characteristic {0} is read-only")]
    ReadOnlyCharacteristic(String),
}

/// Errors related to communication with the controller.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The controller answered with a non-success status.
    #[error("controller returned HTTP {status} for {path}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The request path relative to the controller host.
        path: String,
    },

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Internal channel was closed.
    #[error("channel closed: {0}")]
    ChannelClosed(String),
}

/// Errors related to the controller session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The login request was answered with a non-200 status.
    #[error("login rejected with HTTP {status}, check the configured credentials")]
    LoginRejected {
        /// The HTTP status code of the login response.
        status: u16,
    },

    /// The login succeeded but no session token could be found in the response.
    #[error("login response did not carry a session token")]
    MissingSessionToken,

    /// A fresh session was rejected by the controller.
    #[error("session rejected with HTTP {status} even after logging in again")]
    SessionRejected {
        /// The HTTP status code of the rejected request.
        status: u16,
    },
}

/// Errors related to parsing controller responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the response.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// Unexpected response format.
    #[error("unexpected response format: {0}")]
    UnexpectedFormat(String),

    /// Failed to parse a specific value.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },
}

/// Errors related to the bridge configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration is not valid JSON or has the wrong shape.
    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value is out of its allowed domain.
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// The offending configuration key.
        field: &'static str,
        /// Why the value was rejected.
        message: String,
    },
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
