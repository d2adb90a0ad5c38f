//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Data Flow
//! - `DispatchRequest` (address + payload) goes in
//! - `PayloadEncoder` / `PathResolver` produce the wire form
//! - `RegistryClient` performs the remote call
//! - `DispatchResult` comes out and is rendered by a `ResultSink`

mod address;
mod dispatch;
mod error;
mod payload;
mod profile;
mod registry;
mod sink;

pub use address::*;
pub use dispatch::*;
pub use error::*;
pub use payload::*;
pub use profile::*;
pub use registry::{CallContext, LocalRegistryClient, RegistryClient};
pub use sink::*;
