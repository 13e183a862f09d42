//! # Statistics Tests

use sisd_core::stats::{STATS_SECTIONS, SimStats, ThroughputWindow};

use crate::common::harness::TestContext;

#[test]
fn test_sections_are_listed() {
    assert_eq!(STATS_SECTIONS, &["summary", "pipeline", "instruction_mix", "fetch"]);
}

#[test]
fn test_print_on_empty_stats() {
    let stats = SimStats::default();
    stats.print_sections(&[], 12);
    stats.print_sections(&["fetch".to_string()], 12);
    assert!(stats.ipc().abs() < f64::EPSILON);
}

#[test]
fn test_window_tracks_recent_ticks() {
    let mut window = ThroughputWindow::new(4);
    for retired in [1, 1, 0, 0, 0, 0] {
        window.push(retired);
    }
    assert!(window.ipc().abs() < f64::EPSILON);
    window.push(1);
    assert!((window.ipc() - 0.25).abs() < f64::EPSILON);
    assert!((window.ips(12) - 3.0).abs() < f64::EPSILON);
}

#[test]
fn test_run_counters_are_consistent() {
    let mut ctx = TestContext::new(TestContext::config());
    let _ = ctx.run(600);
    let stats = ctx.core.stats();
    assert_eq!(stats.cycles, 600);
    assert_eq!(
        stats.instructions_retired,
        stats.inst_alu + stats.inst_load + stats.inst_store + stats.inst_branch
    );
    assert!(stats.icache_fills <= stats.icache_misses);
    assert!(stats.iterate_exits <= stats.iterate_entries);

    let snapshot = ctx.core.snapshot();
    assert_eq!(snapshot.cycle, 600);
    assert_eq!(snapshot.retired_total, stats.instructions_retired);
    assert_eq!(snapshot.registers.len(), 16);
    assert_eq!(snapshot.memory.len(), 64);
    assert_eq!(snapshot.cache_lines.len(), 4);
}
