//! Hardware-independent test support.
//!
//! Always compiled (not `cfg(test)`-gated) so that integration tests under
//! `tests/` — which link against this crate like any other external
//! crate — can use the same fakes as the in-tree unit tests.

pub mod fake_bridge;
