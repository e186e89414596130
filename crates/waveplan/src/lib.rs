#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod dataset;
pub mod planner;
pub mod report;
