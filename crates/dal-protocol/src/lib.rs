//! Wire protocol for remote data access.
//!
//! A remote node runs a [`DataAccessService`] in front of any
//! [`DataAccess`](dal_access::DataAccess) implementation. Clients talk to it
//! through [`RemoteDataAccess`], which itself implements `DataAccess`, over
//! whatever [`RemoteTransport`] carries the frames.
//!
//! # Key Types
//!
//! - [`DataAccessRequest`] / [`DataAccessResponse`] -- the messages exchanged
//! - [`DalCodec`] -- `[4-byte length][1-byte tag][JSON payload]` framing
//! - [`RemoteTransport`] -- moves one request frame and returns the response frame
//! - [`RemoteDataAccess`] -- client; polls for write confirmations
//! - [`DataAccessService`] -- server-side dispatcher; records confirmations by transaction hash
//! - [`RemoteConfig`] -- confirmation polling settings

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod message;
pub mod service;
pub mod transport;

pub use client::RemoteDataAccess;
pub use codec::DalCodec;
pub use config::RemoteConfig;
pub use error::{codes, ProtocolError, ProtocolResult};
pub use message::{
    endpoints, DataAccessRequest, DataAccessResponse, WireMessage, MAX_MESSAGE_SIZE,
};
pub use service::{ConfirmationRecord, DataAccessService, DEFAULT_MAX_CONFIRMATION_RECORDS};
pub use transport::RemoteTransport;
