use std::fs;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use diffsync::{
    AlignmentRegion, DiffSyncConfig, DiffSyncError, EditSession, LineMatcher, Position,
    RecomputeScope, RegionKind, Side, SyncState,
};

fn session(left: &[&str], right: &[&str]) -> EditSession {
    EditSession::from_lines(
        left.iter().copied(),
        right.iter().copied(),
        DiffSyncConfig::default(),
    )
    .expect("Failed to create session")
}

fn region(kind: RegionKind, l: (usize, usize), r: (usize, usize)) -> AlignmentRegion {
    AlignmentRegion::new(kind, l.0..l.1, r.0..r.1)
}

#[test]
fn test_changed_middle_line_scenario() {
    let mut s = session(&["a", "b", "c"], &["a", "x", "c"]);
    let model = s.diff();
    assert_eq!(
        model.regions(),
        &[
            region(RegionKind::Equal, (0, 1), (0, 1)),
            region(RegionKind::Changed, (1, 2), (1, 2)),
            region(RegionKind::Equal, (2, 3), (2, 3)),
        ]
    );
}

#[test]
fn test_appended_line_scenario() {
    let mut s = session(&["a", "b"], &["a", "b", "c"]);
    let model = s.diff();
    assert_eq!(
        model.regions(),
        &[
            region(RegionKind::Equal, (0, 2), (0, 2)),
            region(RegionKind::InsertOnly, (2, 2), (2, 3)),
        ]
    );
}

#[test]
fn test_accept_change_scenario() {
    let mut s = session(&["a", "b", "c"], &["a", "x", "c"]);
    s.accept_change(1, Side::Left).expect("Failed to accept change");

    assert_eq!(s.buffer(Side::Left).line(1).unwrap(), "x");
    assert!(s.is_stale());
    let model = s.diff();
    assert_eq!(model.regions(), &[region(RegionKind::Equal, (0, 3), (0, 3))]);
}

#[test]
fn test_edit_then_recompute_keeps_untouched_mapping() {
    let left: Vec<String> = (0..40).map(|i| format!("line {}", i)).collect();
    let mut right = left.clone();
    right.insert(5, "inserted".to_string());
    right[30] = "changed".to_string();
    let mut s = EditSession::from_lines(left, right, DiffSyncConfig::default()).unwrap();

    let before = s.diff();

    s.set_line(Side::Left, 20, "edited").unwrap();
    assert!(s.is_stale());
    let after = s.diff();
    assert!(!s.is_stale());

    for line in (0..15).chain(25..29) {
        assert_eq!(
            before.corresponding_line(Side::Left, line).unwrap(),
            after.corresponding_line(Side::Left, line).unwrap(),
            "line {}",
            line
        );
    }
    assert_eq!(after.region_at(Side::Left, 20).unwrap().kind, RegionKind::Changed);
}

#[test]
fn test_scoped_and_full_sessions_agree_under_edits() {
    let base: Vec<String> = (0..30).map(|i| format!("fn f{}() {{}}", i % 7)).collect();
    let mut full_config = DiffSyncConfig::default();
    full_config.sync.scope = RecomputeScope::Full;

    let mut scoped = EditSession::from_lines(base.clone(), base.clone(), DiffSyncConfig::default())
        .unwrap();
    let mut full = EditSession::from_lines(base.clone(), base, full_config).unwrap();

    let edits: &[(Side, usize, &str)] = &[
        (Side::Left, 3, "fn changed() {}"),
        (Side::Right, 28, "fn f0() {}"),
        (Side::Left, 0, "fn f1() {}"),
        (Side::Right, 14, ""),
    ];
    for &(side, line, text) in edits {
        for s in [&mut scoped, &mut full] {
            s.set_line(side, line, text).unwrap();
            s.insert_text(side, Position::new(line, 0), "// ").unwrap();
        }
        assert_eq!(scoped.diff().regions(), full.diff().regions());
    }
    assert!(scoped.sync().stats().scoped_recomputes > 0);
    assert_eq!(full.sync().stats().scoped_recomputes, 0);
}

#[test]
fn test_debounced_ticks() {
    let mut config = DiffSyncConfig::default();
    config.sync.debounce_ms = 60_000;
    let mut s = EditSession::from_lines(["a", "b"], ["a", "b"], config).unwrap();
    s.diff();

    s.insert_text(Side::Left, Position::new(0, 1), "1").unwrap();
    s.insert_text(Side::Left, Position::new(0, 2), "2").unwrap();
    assert_eq!(s.state(), SyncState::Dirty);
    assert!(!s.tick(Instant::now()));
    assert_eq!(s.state(), SyncState::Dirty);

    assert!(s.tick(Instant::now() + Duration::from_secs(120)));
    assert_eq!(s.state(), SyncState::Idle);
    assert_eq!(s.snapshot().regions()[0].kind, RegionKind::Changed);
}

#[test]
fn test_out_of_range_queries_do_not_poison_session() {
    let mut s = session(&["a"], &["a", "b"]);
    assert!(matches!(
        s.region_at(Side::Left, 5),
        Err(DiffSyncError::OutOfRange { side: Side::Left, index: 5, len: 1 })
    ));
    assert!(matches!(
        s.delete_lines(Side::Right, 1..4),
        Err(DiffSyncError::InvalidRange { .. })
    ));
    assert_eq!(s.region_at(Side::Left, 1).unwrap().kind, RegionKind::InsertOnly);
    assert_eq!(s.corresponding_line(Side::Right, 1).unwrap(), None);
    assert_eq!(s.equivalent_line(Side::Right, 1).unwrap(), 0);
}

#[test]
fn test_whitespace_insensitive_session() {
    let mut config = DiffSyncConfig::default();
    config.matcher.ignore_whitespace = true;
    let mut s = EditSession::from_lines(
        ["fn main() {", "\tbody();"],
        ["fn main(){", "    body();"],
        config,
    )
    .unwrap();
    assert!(!s.stats().has_differences());
    assert_eq!(s.buffer(Side::Right).line(1).unwrap(), "    body();");
}

#[test]
fn test_save_round_trip() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let left_path = temp_dir.path().join("left.txt");
    let right_path = temp_dir.path().join("right.txt");
    fs::write(&left_path, "one\ntwo\nthree\n").unwrap();
    fs::write(&right_path, "one\n2\nthree\nfour\n").unwrap();

    let left = fs::read_to_string(&left_path).unwrap();
    let right = fs::read_to_string(&right_path).unwrap();
    let mut s = EditSession::from_texts(&left, &right, DiffSyncConfig::default()).unwrap();
    assert_eq!(s.stats().regions, 2);

    s.accept_change_at(Side::Right, 1, Side::Left).unwrap();
    s.accept_change_at(Side::Right, 3, Side::Left).unwrap();
    assert!(s.is_dirty(Side::Left));

    fs::write(&left_path, s.text(Side::Left)).unwrap();
    s.mark_saved(Side::Left);
    assert!(!s.is_dirty(Side::Left));

    assert_eq!(fs::read_to_string(&left_path).unwrap(), right);
    assert!(!s.stats().has_differences());
}

#[test]
fn test_empty_buffers() {
    let mut s = EditSession::new(DiffSyncConfig::default()).unwrap();
    assert!(s.diff().is_empty());
    assert!(s.region_at(Side::Left, 0).is_err());

    s.insert_text(Side::Right, Position::new(0, 0), "hello\nworld").unwrap();
    let model = s.diff();
    assert_eq!(model.regions(), &[region(RegionKind::InsertOnly, (0, 0), (0, 2))]);
    assert_eq!(s.region_at(Side::Left, 0).unwrap().kind, RegionKind::InsertOnly);
}

#[test]
fn test_background_session_matches_inline() {
    let mut config = DiffSyncConfig::default();
    config.sync.background = true;
    config.sync.debounce_ms = 0;
    let left: Vec<String> = (0..200).map(|i| format!("{}", i)).collect();
    let mut right = left.clone();
    right.retain(|line| !line.ends_with('7'));

    let mut s = EditSession::from_lines(left.clone(), right.clone(), config).unwrap();
    for i in 0..5 {
        s.set_line(Side::Left, i * 10, "x").unwrap();
        s.tick(Instant::now());
    }
    let model = s.diff();

    let expected = LineMatcher::default()
        .match_lines(s.buffer(Side::Left).all_lines(), s.buffer(Side::Right).all_lines());
    assert_eq!(model.regions(), expected.as_slice());
    assert_eq!(model.computed_at(), Some(s.revisions()));
}
