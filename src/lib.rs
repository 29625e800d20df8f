//! salesdb - SQL exercise portfolio
//!
//! A small sales dataset kept in four schema shapes (raw operational, 3NF,
//! star and a flattened reporting table) with the exercise queries run
//! against them, a stored-procedure registry, and indexing advice.

pub mod config;
pub mod indexing;
pub mod interfaces;
pub mod model;
pub mod portfolio;
pub mod procedures;
pub mod result_set;
pub mod seed;
pub mod storage;
pub mod utils;
