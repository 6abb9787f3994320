use crate::samples::SampleTable;

#[test]
fn parse_keeps_address_count_pairs_and_trims_whitespace() {
    let raw = "  400010: 5\n   400014:  2\nnothing here\n";
    let mut table = SampleTable::parse(raw);
    assert_eq!(table.len(), 2);
    assert_eq!(table.take("400010"), 5);
    assert_eq!(table.take("400014"), 2);
    assert!(table.is_empty());
}

#[test]
fn parse_discards_the_aggregate_sum_sentinel() {
    let raw = " h->sum: 42\n 400010: 7\n";
    let mut table = SampleTable::parse(raw);
    assert_eq!(table.len(), 1);
    assert_eq!(table.take("h->sum"), 0);
    assert_eq!(table.take("400010"), 7);
}

#[test]
fn parse_skips_lines_without_a_colon_or_count() {
    let raw = "Executing perf annotate\n400010: 1\n400011: not-a-count\n";
    let mut table = SampleTable::parse(raw);
    assert_eq!(table.len(), 1);
    assert_eq!(table.take("400010"), 1);
}

#[test]
fn take_defaults_to_zero_and_drains_matched_entries() {
    let mut table: SampleTable = [("400010".to_string(), 3)].into_iter().collect();
    assert_eq!(table.take("deadbeef"), 0);
    assert!(!table.is_empty());
    assert_eq!(table.take("400010"), 3);
    assert_eq!(table.take("400010"), 0);
    assert!(table.is_empty());
}

#[test]
fn into_residual_exposes_unmatched_entries() {
    let table: SampleTable = [("400010".to_string(), 3), ("400020".to_string(), 1)]
        .into_iter()
        .collect();
    let residual = table.into_residual();
    assert_eq!(residual.get("400010"), Some(&3));
    assert_eq!(residual.get("400020"), Some(&1));
}
