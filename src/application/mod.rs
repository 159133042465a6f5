//! Application layer - use case orchestration.
//!
//! Handlers coordinate domain logic with ports. They own no business rules
//! beyond sequencing and error translation.

pub mod handlers;
