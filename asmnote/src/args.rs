use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "asmnote",
    version,
    about = "Annotate perf samples onto disassembly of a JIT-emitted function"
)]
pub struct Args {
    /// Function to annotate, as named in the perf map index.
    #[arg(value_name = "FUNC_NAME")]
    pub func_name: String,

    /// Collapse nop runs spanning more than N addresses into one line.
    #[arg(long = "collapse-nops", default_value_t = 5, value_name = "N")]
    pub collapse_nops: u64,

    /// Print every nop individually.
    #[arg(long = "no-collapse-nops", default_value_t = false)]
    pub no_collapse_nops: bool,

    /// Command providing heap map information, typically:
    /// --heap-map-args ./pyston_release -i BENCHMARK
    #[arg(long = "heap-map-args", num_args = 1.., value_name = "CMD", allow_hyphen_values = true)]
    pub heap_map_args: Vec<String>,

    /// Benchmark that was run. '--heap-map-target BENCHMARK' is equivalent
    /// to '--heap-map-args ./pyston_release -i BENCHMARK'.
    #[arg(long = "heap-map-target", value_name = "BENCHMARK")]
    pub heap_map_target: Option<String>,

    /// perf recording to read samples from.
    #[arg(long = "perf-data", default_value = "perf.data", value_name = "PATH")]
    pub perf_data: PathBuf,

    /// Directory holding index.txt and one raw code blob per function.
    #[arg(long = "perf-map-dir", default_value = "perf_map", value_name = "DIR")]
    pub perf_map_dir: PathBuf,

    /// Binary whose symbol table resolves constant operands.
    #[arg(long = "binary", default_value = "pyston_release", value_name = "PATH")]
    pub binary: PathBuf,

    /// Give up on a heap-map reply after this many milliseconds. Off by
    /// default: the session blocks indefinitely, like the runtime it talks to.
    #[arg(long = "heap-map-timeout-ms", value_name = "MS")]
    pub heap_map_timeout_ms: Option<u64>,

    /// More diagnostics on stderr.
    #[arg(long = "verbose", default_value_t = false)]
    pub verbose: bool,
}

impl Args {
    pub fn collapse_threshold(&self) -> u64 {
        if self.no_collapse_nops {
            0
        } else {
            self.collapse_nops
        }
    }

    pub fn heap_launch(&self) -> Option<Vec<String>> {
        if !self.heap_map_args.is_empty() {
            return Some(self.heap_map_args.clone());
        }
        self.heap_map_target.as_ref().map(|target| {
            vec![
                "./pyston_release".to_string(),
                "-i".to_string(),
                target.clone(),
            ]
        })
    }

    pub fn heap_timeout(&self) -> Option<Duration> {
        self.heap_map_timeout_ms.map(Duration::from_millis)
    }
}
