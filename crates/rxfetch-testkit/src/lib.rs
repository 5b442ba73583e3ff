//! Test doubles for rxfetch.
//!
//! - [`ScriptedEngine`] - in-memory `FetchEnginePort` with deferred delivery
//!   and scriptable rejections
//! - [`ScriptedFactory`] - `FetchModuleFactory` that counts builds

mod engine;
mod factory;

pub use engine::ScriptedEngine;
pub use factory::ScriptedFactory;
