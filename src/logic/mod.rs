//! Logic Module - Pipeline & Session Engines
//!
//! - `dataset/` - load, label, select, split
//! - `model/` - classifier capability and the random forest
//! - `artifact/` - persisted model + holdout predictions
//! - `session/` - interactive replay and aggregate run

pub mod artifact;
pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluate;
pub mod features;
pub mod model;
pub mod pipeline;
pub mod session;
