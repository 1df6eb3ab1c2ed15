//! Integration tests for Layer 3: Runtime
//!
//! Tests for the embedder interface: arena regions, running images and
//! reporting outcomes.

mod host;
