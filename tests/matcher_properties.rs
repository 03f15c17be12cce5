use proptest::prelude::*;

use diffsync::matcher::{covers, myers, Budget, Window};
use diffsync::{AlignmentRegion, LineMatcher, RegionKind};

/// Small alphabets produce plenty of repeated lines, which is where
/// alignments get ambiguous.
fn lines(max_len: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(prop::sample::select(vec!["a", "b", "c", "d", ""]), 0..max_len)
        .prop_map(|v| v.into_iter().map(String::from).collect())
}

proptest! {
    /// Regions partition both sides in order.
    #[test]
    fn regions_cover_both_sides(left in lines(40), right in lines(40)) {
        let regions = LineMatcher::default().match_lines(&left, &right);
        prop_assert!(covers(&regions, left.len(), right.len()));
    }

    #[test]
    fn matching_is_deterministic(left in lines(30), right in lines(30)) {
        let matcher = LineMatcher::default();
        prop_assert_eq!(matcher.match_lines(&left, &right), matcher.match_lines(&left, &right));
    }

    #[test]
    fn identity_is_one_equal_region(text in lines(30)) {
        let regions = LineMatcher::default().match_lines(&text, &text);
        if text.is_empty() {
            prop_assert!(regions.is_empty());
        } else {
            prop_assert_eq!(regions.len(), 1);
            prop_assert_eq!(regions[0].kind, RegionKind::Equal);
            prop_assert_eq!(regions[0].left.clone(), 0..text.len());
        }
    }

    /// Swapping sides turns insertions into deletions at the same places
    /// and keeps everything else.
    #[test]
    fn swapping_sides_mirrors_regions(left in lines(30), right in lines(30)) {
        let matcher = LineMatcher::default();
        let forward = matcher.match_lines(&left, &right);
        let backward = matcher.match_lines(&right, &left);
        let mirrored: Vec<AlignmentRegion> = forward.iter().map(AlignmentRegion::mirrored).collect();
        prop_assert_eq!(backward, mirrored);
    }

    #[test]
    fn swapping_characters_mirrors_regions(left in "[ab ]{0,12}", right in "[ab ]{0,12}") {
        let matcher = LineMatcher::default();
        let a: Vec<char> = left.chars().collect();
        let b: Vec<char> = right.chars().collect();
        let mirrored: Vec<AlignmentRegion> =
            matcher.match_tokens(&a, &b).iter().map(AlignmentRegion::mirrored).collect();
        prop_assert_eq!(matcher.match_tokens(&b, &a), mirrored);
    }

    /// Any trusted window that underestimates the common edges gives the
    /// same alignment as matching everything.
    #[test]
    fn windowed_matching_equals_full(
        left in lines(30),
        right in lines(30),
        prefix_frac in 0.0f64..=1.0,
        suffix_frac in 0.0f64..=1.0,
    ) {
        let matcher = LineMatcher::default();
        let full = matcher.match_lines(&left, &right);

        let prefix = left.iter().zip(&right).take_while(|(a, b)| a == b).count();
        let rest = left.len().min(right.len()) - prefix;
        let suffix = left[prefix..]
            .iter()
            .rev()
            .zip(right[prefix..].iter().rev())
            .take(rest)
            .take_while(|(a, b)| a == b)
            .count();

        let window = Window::new(
            (prefix as f64 * prefix_frac) as usize,
            (suffix as f64 * suffix_frac) as usize,
        );
        let windowed = matcher.match_window(&left, &right, window, None).unwrap();
        prop_assert_eq!(windowed, full);
    }

    /// Our script is never longer than the one from `similar`'s Myers.
    #[test]
    fn edit_cost_is_minimal(left in lines(30), right in lines(30)) {
        let ops = myers::diff(&left, &right, &Budget::unlimited()).unwrap();
        let ours = myers::edit_cost(&ops);

        let theirs: usize = similar::capture_diff_slices(similar::Algorithm::Myers, &left, &right)
            .iter()
            .map(|op| match *op {
                similar::DiffOp::Equal { .. } => 0,
                similar::DiffOp::Delete { old_len, .. } => old_len,
                similar::DiffOp::Insert { new_len, .. } => new_len,
                similar::DiffOp::Replace { old_len, new_len, .. } => old_len + new_len,
            })
            .sum();
        prop_assert!(ours <= theirs, "ours {} > similar {}", ours, theirs);
    }
}
