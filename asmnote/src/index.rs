use std::path::Path;

use crate::error::AnnotateError;

/// One line of `index.txt`: the load address (hex, no `0x` prefix) the JIT
/// reported for a function, and the function's name.
#[derive(Debug, Clone)]
pub struct FunctionEntry {
    pub name: String,
    pub load_addr: String,
}

pub struct AddressIndex {
    entries: Vec<FunctionEntry>,
}

impl AddressIndex {
    pub fn load(perf_map_dir: &Path) -> Result<Self, AnnotateError> {
        let raw = std::fs::read_to_string(perf_map_dir.join("index.txt"))?;
        let entries = raw
            .lines()
            .filter_map(|line| {
                let mut parts = line.split_whitespace();
                let addr = parts.next()?;
                let name = parts.next()?;
                Some(FunctionEntry {
                    name: name.to_string(),
                    load_addr: addr.to_string(),
                })
            })
            .collect();
        Ok(Self { entries })
    }

    pub fn lookup(&self, func: &str) -> Result<&FunctionEntry, AnnotateError> {
        self.entries
            .iter()
            .find(|e| e.name == func)
            .ok_or_else(|| AnnotateError::FunctionNotFound(func.to_string()))
    }
}
