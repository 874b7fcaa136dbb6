//! Code playground: the editable buffer next to each lesson.
//!
//! [`runtime::PlaygroundRuntime`] debounces edits and drives compile/run round
//! trips; [`worker`] defines the out-of-process compiler and runner it talks to.

pub mod runtime;
pub mod worker;

pub use runtime::{
    CompileMode, OutputPane, OutputStatus, PlaygroundError, PlaygroundOptions, PlaygroundRuntime,
};
pub use worker::{
    CompileRequest, CompileResult, Compiler, Diagnostic, ProcessCompiler, ProcessRunner, Runner,
    Severity, WorkerError,
};
