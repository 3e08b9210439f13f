//! Row models and DTOs.
//!
//! Each submodule contains:
//! - `FromRow` + `Serialize` structs matching database rows
//! - `Deserialize` DTOs for inserts and updates
//! - for overlay resources, a candidate row and the view it resolves into

pub mod buffer;
pub mod event;
pub mod functional_zone;
pub mod geometry;
pub mod indicator;
pub mod physical_object;
pub mod project;
pub mod scenario;
pub mod service;
pub mod territory;
pub mod urban_object;

use urban_core::overlay::Source;

/// Map the `is_scenario_object` column of a candidate row to its source.
pub(crate) fn source_of(is_scenario_object: bool) -> Source {
    if is_scenario_object {
        Source::Private
    } else {
        Source::Public
    }
}
