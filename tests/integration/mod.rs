//! End-to-end tests that drive the coherence-build binary

mod helpers;
mod test_plan;
mod test_publish;
mod test_verify;
