// src/testing/mod.rs
// Test harness for the orchestration core: in-memory fakes for every
// external collaborator plus a builder that assembles a fully-wired
// `Orchestrator` from them, grounded in the teacher's `testing::harness`
// shape (a constructible test client standing in for the real transport)
// but adapted from a websocket test client to direct in-process calls,
// since this crate's "transport" is a function call, not a socket.

pub mod fakes;
pub mod harness;

pub use harness::TestHarness;
