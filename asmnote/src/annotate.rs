use crate::constant::ConstantResolver;
use crate::error::AnnotateError;
use crate::objdump::DisassemblyLine;
use crate::samples::SampleTable;

/// Accumulator for a maximal contiguous sequence of padding instructions.
struct NopRun {
    count: u64,
    instructions: u64,
    start: String,
    end: String,
}

/// Merges sample counts into disassembly lines by address, annotates each
/// instruction's constant operand, and collapses long nop runs. Consumes the
/// sample table destructively; any count left unmatched afterwards is a
/// fatal inconsistency between profiler and disassembly.
pub fn annotate(
    lines: &[DisassemblyLine],
    mut samples: SampleTable,
    resolver: &mut ConstantResolver<'_>,
    collapse_nops: u64,
) -> Result<String, AnnotateError> {
    let mut out = String::new();
    let mut run: Option<NopRun> = None;

    for line in lines {
        let count = samples.take(&line.addr);

        if collapse_nops != 0 && line.is_nop {
            match run.as_mut() {
                None => {
                    run = Some(NopRun {
                        count,
                        instructions: 1,
                        start: line.addr.clone(),
                        end: line.addr.clone(),
                    });
                }
                Some(r) => {
                    r.count += count;
                    r.instructions += 1;
                    r.end = line.addr.clone();
                }
            }
            continue;
        }

        if let Some(r) = run.take() {
            flush_nop_run(&mut out, &r, collapse_nops);
        }
        let comment = resolver.comment_for(&line.text)?;
        render_line(&mut out, count, &line.text, &comment);
    }
    if let Some(r) = run.take() {
        flush_nop_run(&mut out, &r, collapse_nops);
    }

    if !samples.is_empty() {
        return Err(AnnotateError::ResidualSamples {
            residual: samples.into_residual(),
        });
    }
    Ok(out)
}

fn flush_nop_run(out: &mut String, run: &NopRun, collapse_nops: u64) {
    let start = u64::from_str_radix(&run.start, 16).unwrap_or(0);
    let end = u64::from_str_radix(&run.end, 16).unwrap_or(start);
    let span = end.saturating_sub(start) + 1;

    if span <= collapse_nops {
        // Short run: expand back into one synthesized line per original
        // address. The run's whole count stays on the head line, mirroring
        // the per-run total attributed upstream.
        let mut remaining = run.count;
        for addr in start..=end {
            let text = format!("    {:<29}              nop", format!("{addr:x}:      90"));
            render_line(out, remaining, &text, "");
            remaining = 0;
        }
    } else {
        let text = format!(
            "    {:<29}              nop*{}",
            format!("{}-{}", run.start, run.end),
            run.instructions
        );
        render_line(out, run.count, &text, "");
    }
}

fn render_line(out: &mut String, count: u64, text: &str, comment: &str) {
    let line = format!("{count:>8} {text:<70} {comment}");
    out.push_str(line.trim_end());
    out.push('\n');
}
