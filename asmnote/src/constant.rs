use once_cell::sync::Lazy;
use regex::Regex;

use crate::run::RunError;

// Ordered operand patterns; first match wins. Spacing matches objdump's
// column layout exactly.
static OPERAND_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"movabs \$0x([0-9a-f]+),",
        r"mov    \$0x([0-9a-f]+),",
        r"cmpq   \$0x([0-9a-f]+),",
        r"callq  0x([0-9a-f]+)",
    ]
    .into_iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

pub fn extract_operand(inst: &str) -> Option<u64> {
    OPERAND_PATTERNS
        .iter()
        .find_map(|re| re.captures(inst))
        .and_then(|c| u64::from_str_radix(&c[1], 16).ok())
}

pub trait SymbolLookup {
    fn resolve_symbol(&mut self, addr: u64) -> Result<Option<String>, RunError>;
}

pub trait HeapLookup {
    fn resolve_heap(&mut self, addr: u64) -> Result<Option<String>, RunError>;
}

/// Turns a disassembly line into a `; <meaning>` comment for its embedded
/// constant, if any. Static symbols take precedence over heap descriptions;
/// a zero literal is never a meaningful pointer and is never looked up.
pub struct ConstantResolver<'a> {
    symbols: &'a mut dyn SymbolLookup,
    heap: &'a mut dyn HeapLookup,
}

impl<'a> ConstantResolver<'a> {
    pub fn new(symbols: &'a mut dyn SymbolLookup, heap: &'a mut dyn HeapLookup) -> Self {
        Self { symbols, heap }
    }

    pub fn comment_for(&mut self, inst: &str) -> Result<String, RunError> {
        let Some(value) = extract_operand(inst).filter(|v| *v != 0) else {
            return Ok(String::new());
        };
        if let Some(name) = self.symbols.resolve_symbol(value)? {
            return Ok(format!("; {name}"));
        }
        if let Some(description) = self.heap.resolve_heap(value)? {
            return Ok(format!("; {description}"));
        }
        Ok(String::new())
    }
}
