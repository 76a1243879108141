//! Core: chain allow-list and address helpers shared by every layer.

pub mod address;
pub mod chains;
