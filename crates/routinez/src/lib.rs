//! Client-side core of the Routinez course-routine planner.
//!
//! Everything here is the logic behind the planner UI: the wire model
//! for courses and sections, the cascading course/faculty/section
//! selection state, assembly of the weekly routine grid, normalization
//! of the generate endpoint's loosely shaped responses, and the HTTP
//! plus server-sent-events client that talks to the routine API.

pub mod api;
pub mod classify;
pub mod exam;
pub mod model;
pub mod schedule;
pub mod selection;
pub mod suggest;
