#![cfg(unix)]

use std::path::Path;

use asmnote::annotate::annotate;
use asmnote::constant::ConstantResolver;
use asmnote::error::AnnotateError;
use asmnote::heap::HeapResolver;
use asmnote::index::AddressIndex;
use asmnote::objdump;
use asmnote::samples;
use asmnote::symbols::SymbolResolver;
use asmnote_tests::{PathPrepend, write_script};

const OBJDUMP_SCRIPT: &str = r#"#!/bin/sh
printf 'banner1\nbanner2\nbanner3\nbanner4\nbanner5\nbanner6\nbanner7\n'
printf '  400010:\t48 b8 00 10 40 00 00 \tmovabs $0x401000,%%rax\n'
printf '  400018:\t48 81 78 08 00 20 40 \tcmpq   $0x402000,0x8(%%rax)\n'
printf '  400020:\t90                   \tnop\n'
printf '  400021:\t90                   \tnop\n'
printf '  400022:\tc3                   \tretq\n'
"#;

const NM_SCRIPT: &str = r#"#!/bin/sh
printf '0000000000401000 T bar\n'
printf '0000000000402000 t _Z4blahv\n'
printf '                 U malloc\n'
"#;

const DEMANGLE_SCRIPT: &str = r#"#!/bin/sh
printf 'Error: unable to demangle\n'
"#;

fn write_perf_map(root: &Path) {
    let map_dir = root.join("perf_map");
    std::fs::create_dir(&map_dir).unwrap();
    std::fs::write(map_dir.join("index.txt"), "400000 foo\n").unwrap();
    std::fs::write(map_dir.join("foo"), b"\x90").unwrap();
}

#[test]
fn annotates_a_function_end_to_end_against_fake_tools() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("bin");
    std::fs::create_dir(&bin).unwrap();
    write_script(&bin, "objdump", OBJDUMP_SCRIPT);
    write_script(&bin, "nm", NM_SCRIPT);
    write_script(&bin, "demangle", DEMANGLE_SCRIPT);
    write_script(
        &bin,
        "perf",
        "#!/bin/sh\nprintf '  400010: 5\\n  400022: 2\\n h->sum: 7\\n'\n",
    );
    write_perf_map(dir.path());
    let _path = PathPrepend::new(&bin);

    let map_dir = dir.path().join("perf_map");
    let index = AddressIndex::load(&map_dir).unwrap();
    let entry = index.lookup("foo").unwrap();
    let lines = objdump::disassemble(&map_dir, entry).unwrap();
    assert_eq!(lines.len(), 5);

    let table = samples::load_samples("foo", Path::new("perf.data")).unwrap();
    let mut symbols = SymbolResolver::new(Path::new("pyston_release"));
    let mut heap = HeapResolver::new(None, None);
    let mut resolver = ConstantResolver::new(&mut symbols, &mut heap);

    let report = annotate(&lines, table, &mut resolver, 5).unwrap();
    let out: Vec<&str> = report.lines().collect();
    assert_eq!(out.len(), 5);

    assert!(out[0].starts_with("       5 "));
    assert!(out[0].contains("movabs $0x401000,%rax"));
    assert!(out[0].ends_with("; bar"));

    // Fake demangler reports failure, so the mangled name stays verbatim.
    assert!(out[1].starts_with("       0 "));
    assert!(out[1].ends_with("; _Z4blahv"));

    // Two-instruction nop run, under the threshold: expanded back out.
    assert!(out[2].starts_with("       0 "));
    assert!(out[2].contains("400020:      90"));
    assert!(out[3].contains("400021:      90"));

    assert!(out[4].starts_with("       2 "));
    assert!(out[4].contains("retq"));
}

#[test]
fn profiler_counts_for_unknown_addresses_abort_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("bin");
    std::fs::create_dir(&bin).unwrap();
    write_script(&bin, "objdump", OBJDUMP_SCRIPT);
    write_script(&bin, "nm", NM_SCRIPT);
    write_script(&bin, "demangle", DEMANGLE_SCRIPT);
    write_script(
        &bin,
        "perf",
        "#!/bin/sh\nprintf '  400010: 1\\n  999999: 4\\n'\n",
    );
    write_perf_map(dir.path());
    let _path = PathPrepend::new(&bin);

    let map_dir = dir.path().join("perf_map");
    let index = AddressIndex::load(&map_dir).unwrap();
    let entry = index.lookup("foo").unwrap();
    let lines = objdump::disassemble(&map_dir, entry).unwrap();
    let table = samples::load_samples("foo", Path::new("perf.data")).unwrap();

    let mut symbols = SymbolResolver::new(Path::new("pyston_release"));
    let mut heap = HeapResolver::new(None, None);
    let mut resolver = ConstantResolver::new(&mut symbols, &mut heap);

    let err = annotate(&lines, table, &mut resolver, 5).unwrap_err();
    match err {
        AnnotateError::ResidualSamples { residual } => {
            let expected: std::collections::BTreeMap<String, u64> =
                [("999999".to_string(), 4)].into_iter().collect();
            similar_asserts::assert_eq!(residual, expected);
        }
        other => panic!("expected ResidualSamples, got {other:?}"),
    }
}

#[test]
fn a_failing_disassembler_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("bin");
    std::fs::create_dir(&bin).unwrap();
    write_script(&bin, "objdump", "#!/bin/sh\necho 'no such file' >&2\nexit 1\n");
    write_perf_map(dir.path());
    let _path = PathPrepend::new(&bin);

    let map_dir = dir.path().join("perf_map");
    let index = AddressIndex::load(&map_dir).unwrap();
    let entry = index.lookup("foo").unwrap();
    let err = objdump::disassemble(&map_dir, entry).unwrap_err();
    assert!(err.to_string().contains("no such file"));
}
