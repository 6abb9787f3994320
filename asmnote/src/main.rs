use clap::Parser;

use asmnote::annotate;
use asmnote::args::Args;
use asmnote::constant::ConstantResolver;
use asmnote::error::AnnotateError;
use asmnote::heap::HeapResolver;
use asmnote::index::AddressIndex;
use asmnote::objdump;
use asmnote::samples;
use asmnote::symbols::SymbolResolver;

fn main() {
    let args = Args::parse();
    match run(&args) {
        Ok(report) => print!("{report}"),
        Err(err) => {
            eprintln!("asmnote: {err}");
            std::process::exit(1);
        }
    }
}

fn run(args: &Args) -> Result<String, AnnotateError> {
    let index = AddressIndex::load(&args.perf_map_dir)?;
    let entry = index.lookup(&args.func_name)?;
    if args.verbose {
        eprintln!(
            "asmnote: func={} load_addr=0x{} collapse_nops={}",
            entry.name,
            entry.load_addr,
            args.collapse_threshold()
        );
    }

    let lines = objdump::disassemble(&args.perf_map_dir, entry)?;
    let table = samples::load_samples(&args.func_name, &args.perf_data)?;
    if args.verbose {
        eprintln!(
            "asmnote: {} disassembly lines, {} sampled addresses",
            lines.len(),
            table.len()
        );
    }

    let mut symbols = SymbolResolver::new(&args.binary);
    let mut heap = HeapResolver::new(args.heap_launch(), args.heap_timeout());
    let mut resolver = ConstantResolver::new(&mut symbols, &mut heap);
    let report = annotate::annotate(&lines, table, &mut resolver, args.collapse_threshold())?;
    heap.close();
    Ok(report)
}
