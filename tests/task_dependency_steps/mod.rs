//! Step definitions for task dependency BDD scenarios.

pub mod given;
pub mod then;
pub mod when;
