//! Test modules for the delivery handler and worker
//!
//! Tests are organized by functional area for better maintainability.

mod worker_preconditions;
