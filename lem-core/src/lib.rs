#![warn(missing_docs)]
//! Models and ports for clearing a peer-to-peer local energy market.
//!
//! A trading period is cleared in two steps. A uniform-price auction first
//! matches the bids that cross in merit order; the bids it leaves uncovered are
//! then settled by one of several pluggable mechanisms. This crate holds the
//! vocabulary shared by both steps, while `lem-solver` holds the algorithms.

/// Core domain models for local energy market clearing.
///
/// This module contains the fundamental data structures that represent the domain entities:
/// bids and their admission rules, mechanism parameters, transactions and clearing outcomes.
///
/// The models in this module are primarily data structures with minimal business logic,
/// keeping the domain entities apart from the algorithms that process them.
pub mod models;

/// Interface traits for residual settlement.
///
/// These traits define the contract between the clearing engine and the
/// interchangeable settlement mechanisms (and the welfare functions some of
/// them evaluate), without specifying implementation details.
pub mod ports;
