//! Unit test suites.

#[path = "../helpers/fixtures.rs"]
#[allow(dead_code)]
mod fixtures;

mod router_test;
