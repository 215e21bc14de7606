//! Core library components.
//!
//! This module contains the environment lifecycle logic, the cloud provider
//! abstraction and configuration handling. Nothing here prints; output is
//! left to `cli`.

pub mod config;
pub mod constants;
pub mod dns;
pub mod domain;
pub mod lifecycle;
pub mod naming;
pub mod personality;
pub mod poller;
pub mod policy;
pub mod provider;
pub mod provisioner;
pub mod template;
pub mod types;
