//! Integration tests

mod api_tests;
mod sync_tests;
