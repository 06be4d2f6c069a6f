//! Domain services used by websocket and HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the store, the channel registry and fan-out so route
//! handlers can stay focused on protocol translation.

pub mod broadcast;
pub mod registry;
pub mod workspace;
