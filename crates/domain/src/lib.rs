//! # airhub-domain
//!
//! Pure domain model for the airhub home automation hub.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers and error conventions
//! - Define **Entities** (state holders with identity: fans, sensors, …)
//! - Define **Devices** (physical things that expose one or more entities)
//! - Define **Services** (named commands with parameter schemas, and the
//!   calls that target them)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;

pub mod device;
pub mod entity;
pub mod service;
