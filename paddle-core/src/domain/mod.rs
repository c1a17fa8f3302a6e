//! Core domain types
//!
//! This module contains the structures shared between the compiler (which
//! turns pipeline definitions into pods) and the runner (which moves data in
//! and out of the object store on behalf of a pod).

pub mod data;
pub mod pipeline;
pub mod secret;
