//! Common test utilities for the ScreenLogic integration
//!
//! A mock gateway that serves fixture data, a fixed discovery, and a
//! harness wiring them into config entries backed by temporary storage.

#![allow(dead_code)]

mod fixtures;
mod harness;
mod mock_gateway;

pub use fixtures::*;
pub use harness::*;
pub use mock_gateway::*;
