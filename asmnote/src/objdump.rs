use std::path::Path;

use crate::index::FunctionEntry;
use crate::run::{RunError, run_tool_checked};

// objdump prints a fixed preamble (file format, disassembly header) before
// the first instruction.
const BANNER_LINES: usize = 7;

#[derive(Debug, Clone)]
pub struct DisassemblyLine {
    pub text: String,
    /// Leading address token, trimmed, without the trailing colon. Empty for
    /// blank or section-header lines.
    pub addr: String,
    pub is_nop: bool,
}

impl DisassemblyLine {
    pub fn parse(line: &str) -> Self {
        let addr = line.split(':').next().unwrap_or("").trim().to_string();
        DisassemblyLine {
            addr,
            is_nop: line.ends_with("\tnop"),
            text: line.to_string(),
        }
    }
}

/// Disassembles the raw machine-code blob for one function, with the virtual
/// address base adjusted so printed addresses match the profiler's address
/// space.
pub fn disassemble(
    perf_map_dir: &Path,
    entry: &FunctionEntry,
) -> Result<Vec<DisassemblyLine>, RunError> {
    let blob = perf_map_dir.join(&entry.name);
    let args = vec![
        "-b".to_string(),
        "binary".to_string(),
        "-m".to_string(),
        "i386:x86-64".to_string(),
        "-D".to_string(),
        blob.to_string_lossy().into_owned(),
        format!("--adjust-vma=0x{}", entry.load_addr),
    ];
    let text = run_tool_checked("objdump", &args)?;
    Ok(text
        .lines()
        .skip(BANNER_LINES)
        .map(DisassemblyLine::parse)
        .collect())
}
