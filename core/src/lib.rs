//! Trip aggregation and reporting for an offline booking desk.
//!
//! Booking data enters through `gateway::BookingSourceGateway`, is
//! normalized into `trip::Trip`, narrowed by `visibility` and `filter`,
//! enriched with payments and reduced by `reports`. `engine::ReportEngine`
//! wires the stages together.

pub mod clock;
pub mod config;
pub mod demo;
pub mod engine;
pub mod error;
pub mod feed;
pub mod filter;
pub mod gateway;
pub mod name_generator;
pub mod normalizer;
pub mod payments;
pub mod reports;
pub mod rng;
pub mod source;
pub mod store;
pub mod trip;
pub mod types;
pub mod visibility;
