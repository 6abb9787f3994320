use std::collections::HashMap;
use std::path::{Path, PathBuf};

use once_cell::unsync::OnceCell;
use which::which;

use crate::constant::SymbolLookup;
use crate::run::{RunError, run_tool_checked};

const DEMANGLE_FAILURE: &str = "Error: unable to demangle";

/// Static address-to-name table built from a full `nm` dump of the target
/// binary. The dump runs at most once per run; demangled display names are
/// memoized per address.
pub struct SymbolResolver {
    binary: PathBuf,
    table: OnceCell<HashMap<u64, String>>,
    display: HashMap<u64, String>,
}

impl SymbolResolver {
    pub fn new(binary: &Path) -> Self {
        Self {
            binary: binary.to_path_buf(),
            table: OnceCell::new(),
            display: HashMap::new(),
        }
    }

    pub fn resolve(&mut self, addr: u64) -> Result<Option<String>, RunError> {
        if let Some(done) = self.display.get(&addr) {
            return Ok(Some(done.clone()));
        }
        let binary = self.binary.clone();
        let sym = match self
            .table
            .get_or_try_init(|| load_symbol_table(&binary))?
            .get(&addr)
        {
            Some(sym) => sym.clone(),
            None => return Ok(None),
        };
        let name = if sym.starts_with('_') {
            demangle(&sym)?
        } else {
            sym
        };
        self.display.insert(addr, name.clone());
        Ok(Some(name))
    }
}

impl SymbolLookup for SymbolResolver {
    fn resolve_symbol(&mut self, addr: u64) -> Result<Option<String>, RunError> {
        self.resolve(addr)
    }
}

fn load_symbol_table(binary: &Path) -> Result<HashMap<u64, String>, RunError> {
    let dump = run_tool_checked("nm", &[binary.to_string_lossy().into_owned()])?;
    Ok(dump.lines().filter_map(parse_symbol_line).collect())
}

/// nm prints a fixed-width 16-digit hex address column, a type character, and
/// the symbol name. Lines with a blank address column (undefined symbols) or
/// an empty name are skipped; an empty name must stay a miss so resolution
/// can fall through to the heap resolver.
pub(crate) fn parse_symbol_line(line: &str) -> Option<(u64, String)> {
    let addr_field = line.get(..16)?;
    if !addr_field.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let addr = u64::from_str_radix(addr_field, 16).ok()?;
    let name = line.get(19..)?;
    if name.is_empty() {
        return None;
    }
    Some((addr, name.to_string()))
}

fn demangle(sym: &str) -> Result<String, RunError> {
    // A project demangler takes precedence over the generic one when it is
    // on the search path.
    let tool = if which("demangle").is_ok() {
        "demangle"
    } else {
        "c++filt"
    };
    let output = run_tool_checked(tool, &[sym.to_string()])?;
    Ok(demangled_display(sym, output.trim_end()))
}

/// Keeps the mangled name verbatim when the demangler reports its explicit
/// failure string; otherwise substitutes angle brackets, which downstream
/// report consumers cannot render.
pub(crate) fn demangled_display(mangled: &str, demangler_output: &str) -> String {
    if demangler_output == DEMANGLE_FAILURE {
        mangled.to_string()
    } else {
        demangler_output.replace(['<', '>'], "_")
    }
}
