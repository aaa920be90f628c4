//! Integration tests: fixture-backed scans through the library and the
//! HTTP surface.

mod mock_source;
mod pipeline;
mod http;
