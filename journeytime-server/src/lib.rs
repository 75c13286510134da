//! Journey time prediction server.
//!
//! Takes the bus legs of a routing suggestion, works out which scheduled
//! trip and stops each leg rides, and predicts how long it will take from
//! pre-trained regression models, the time of day and the weather.

pub mod catalog;
pub mod config;
pub mod domain;
pub mod features;
pub mod inference;
pub mod predict;
pub mod resolve;
pub mod schedule;
pub mod weather;
pub mod web;

#[cfg(test)]
mod fixtures;
