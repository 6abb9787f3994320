use std::collections::BTreeMap;
use std::path::Path;

use crate::run::{RunError, run_tool_checked};

// perf emits one aggregate-total line under this pseudo-address.
const SUM_SENTINEL: &str = "h->sum";

/// Per-instruction sample counts, keyed by trimmed hex address token.
/// Entries are removed as they are matched against disassembly lines; a
/// non-empty table at end of run is an integrity violation.
#[derive(Debug, Default)]
pub struct SampleTable {
    counts: BTreeMap<String, u64>,
}

impl SampleTable {
    pub fn parse(raw: &str) -> Self {
        let counts = raw
            .lines()
            .filter_map(|line| {
                let (addr, count) = line.split_once(':')?;
                let addr = addr.trim();
                if addr == SUM_SENTINEL {
                    return None;
                }
                Some((addr.to_string(), count.trim().parse::<u64>().ok()?))
            })
            .collect();
        Self { counts }
    }

    /// Removes and returns the count for `addr`; absent addresses count 0.
    pub fn take(&mut self, addr: &str) -> u64 {
        self.counts.remove(addr).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn into_residual(self) -> BTreeMap<String, u64> {
        self.counts
    }
}

impl FromIterator<(String, u64)> for SampleTable {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().collect(),
        }
    }
}

pub fn load_samples(func: &str, perf_data: &Path) -> Result<SampleTable, RunError> {
    let args = vec![
        "annotate".to_string(),
        "-i".to_string(),
        perf_data.to_string_lossy().into_owned(),
        "-v".to_string(),
        func.to_string(),
    ];
    let raw = run_tool_checked("perf", &args)?;
    Ok(SampleTable::parse(&raw))
}
