//! Application orchestration: state management, card content and input handling.

pub mod deck;
pub mod event;
pub mod handler;
pub mod state;
