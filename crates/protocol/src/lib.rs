//! Wire types for the session driver bridge.
//!
//! The gateway talks to an external driver process that hosts the chat-web
//! client. This crate contains the serde-serializable shapes exchanged with
//! that process, plus the lifecycle events the driver reports.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! - **Pure data**: No behavior beyond serialization/deserialization and decoding
//!   of driver events into [`SessionEvent`]
//! - **1:1 with the bridge**: Field names match what the driver sends and expects
//! - **Stable**: Changes only when the bridge protocol changes

pub mod event;
pub mod frame;
pub mod methods;
pub mod types;

pub use event::*;
pub use frame::*;
pub use methods::*;
pub use types::*;
