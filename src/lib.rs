//! Touch and motion input engine for a handheld remote-control client.
//!
//! Raw contacts, rotation rates and orientation samples go in; discrete JSON
//! control messages come out on a [`transport::MessageChannel`].

pub mod config;
pub mod controller;
pub mod emission;
pub mod layout;
pub mod mapping;
pub mod persistence;
pub mod runtime;
pub mod sensor;
pub mod transport;
