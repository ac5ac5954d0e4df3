//! API Module - session command layer and terminal front end

pub mod commands;
pub mod console;
