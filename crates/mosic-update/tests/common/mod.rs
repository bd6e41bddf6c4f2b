//! Common test infrastructure for mosic-update tests
//!
//! # Usage
//!
//! ```ignore
//! mod common;
//! use common::*;
//! ```
//!
//! # Modules
//!
//! - `constants`: tags, asset names, binary payloads
//! - `builders`: release JSON as served by the release service
//! - `archives`: in-memory zip and tarball construction
//! - `mock_server`: wiremock setup for release and download endpoints
//! - `fakes`: recording prompt and process control for the update flow

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod archives;
pub mod builders;
pub mod constants;
pub mod fakes;
pub mod mock_server;

pub use archives::*;
pub use builders::*;
pub use constants::*;
pub use fakes::*;
pub use mock_server::*;
