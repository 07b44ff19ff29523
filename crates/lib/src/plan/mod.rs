//! Build plan compilation.
//!
//! A [`BuildPlan`] is an ordered, side-effect-free description of how to
//! build one resolved spec: environment mutations followed by external tool
//! invocations. Executing plans is left to the caller.

mod compile;
pub mod dag;
mod types;

pub use compile::Compiler;
pub use dag::ClosureDag;
pub use types::{BuildPlan, CompileError, CompileOptions, Step, ToolInvocation, WorkDir};
