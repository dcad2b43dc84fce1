//! Core stacking engine: configuration, layout host, scroll sources,
//! measurement, transform math and frame scheduling.
//!
//! Nothing in this module depends on any TUI or rendering crate.  The
//! engine only ever talks to a [`surface::Surface`]; whoever paints the
//! surface (see `crate::ui`) is free to interpret the transforms.

pub mod completion;
pub mod engine;
pub mod inertia;
pub mod measure;
pub mod scheduler;
pub mod scroll_source;
pub mod stack_config;
pub mod surface;
pub mod transform;
