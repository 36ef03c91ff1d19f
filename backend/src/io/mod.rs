//! # IO Layer
//!
//! Interfaces exposing the domain services to clients. Currently only the
//! HTTP REST API.

pub mod rest;
