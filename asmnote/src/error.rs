use std::collections::BTreeMap;

use thiserror::Error;

use crate::run::RunError;

#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error("function {0:?} not present in the perf map index")]
    FunctionNotFound(String),

    #[error(transparent)]
    Tool(#[from] RunError),

    #[error("profiler reported counts for addresses never seen in disassembly: {residual:?}")]
    ResidualSamples { residual: BTreeMap<String, u64> },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
