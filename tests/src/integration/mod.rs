//! Cross-component integration tests.

pub mod correlation;
pub mod flows;
