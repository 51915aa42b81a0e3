//! # hourmeter-server
//!
//! HTTP host for the hourmeter engine.
//!
//! This library provides the API handlers, the tick loop and state
//! management; the binary wires them to a listener.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod api;
pub mod logging;
pub mod state;
pub mod ticker;
