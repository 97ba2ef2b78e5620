//! Simulated web graph for driving the crawl engine without a network.

pub mod web;

pub use web::{SimulatedWeb, SimulatedWebBuilder};
