// src/lib.rs

pub mod config;
pub mod error;
pub mod table;
pub mod time;
pub mod tree;
