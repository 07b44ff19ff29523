mod common;
mod plan_tests;
mod repo_tests;
mod resolve_tests;
