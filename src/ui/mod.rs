//! UI / rendering layer: everything that touches Ratatui widgets.
//!
//! This layer takes the surface the engine writes into and turns it into
//! cells on the terminal.  No stacking math happens here.

pub mod layout;
pub mod stack_item;
pub mod stack_view;
pub mod theme;
