use clap::ValueEnum;
use serde::Serialize;

use crate::matcher::{AlignmentRegion, RegionKind};
use crate::model::{DiffModel, DiffStats, RevisionPair};

/// Different output formats for a diff model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DiffFormat {
    /// One line per alignment region
    #[default]
    Regions,
    /// Unified diff with context lines
    Unified,
    /// Two columns, left and right
    SideBySide,
    /// Single-line summary
    Stats,
    /// JSON for scripting
    Json,
}

/// Lines of both sides a rendering reads from.
#[derive(Debug, Clone, Copy)]
pub struct Sides<'a> {
    pub left: &'a [String],
    pub right: &'a [String],
    pub left_name: &'a str,
    pub right_name: &'a str,
}

#[derive(Serialize)]
struct Report<'a> {
    computed_at: Option<RevisionPair>,
    stats: DiffStats,
    regions: &'a [AlignmentRegion],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Equal,
    Delete,
    Insert,
}

/// One unified-diff row with the positions it sits at on both sides.
struct Row<'a> {
    tag: Tag,
    text: &'a str,
    left: usize,
    right: usize,
}

/// Formats diff models into various text representations
pub struct DiffFormatter;

impl DiffFormatter {
    /// Format every region on its own line
    pub fn format_regions(model: &DiffModel) -> String {
        model
            .regions()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn rows<'a>(model: &DiffModel, sides: &Sides<'a>) -> Vec<Row<'a>> {
        let mut rows = Vec::new();
        for region in model.regions() {
            if region.kind == RegionKind::Equal {
                for (offset, text) in sides.left[region.left.clone()].iter().enumerate() {
                    rows.push(Row {
                        tag: Tag::Equal,
                        text,
                        left: region.left.start + offset,
                        right: region.right.start + offset,
                    });
                }
                continue;
            }
            for (offset, text) in sides.left[region.left.clone()].iter().enumerate() {
                rows.push(Row {
                    tag: Tag::Delete,
                    text,
                    left: region.left.start + offset,
                    right: region.right.start,
                });
            }
            for (offset, text) in sides.right[region.right.clone()].iter().enumerate() {
                rows.push(Row {
                    tag: Tag::Insert,
                    text,
                    left: region.left.end,
                    right: region.right.start + offset,
                });
            }
        }
        rows
    }

    /// Format a diff model as unified diff
    pub fn format_unified(model: &DiffModel, sides: &Sides<'_>, context: usize) -> String {
        let mut output = Vec::new();
        output.push(format!("--- {}", sides.left_name));
        output.push(format!("+++ {}", sides.right_name));

        let rows = Self::rows(model, sides);
        let changed: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.tag != Tag::Equal)
            .map(|(idx, _)| idx)
            .collect();

        // Group changed rows whose context windows touch
        let mut hunks: Vec<(usize, usize)> = Vec::new();
        for idx in changed {
            let start = idx.saturating_sub(context);
            let end = (idx + context + 1).min(rows.len());
            match hunks.last_mut() {
                Some(last) if start <= last.1 => last.1 = end,
                _ => hunks.push((start, end)),
            }
        }

        for (start, end) in hunks {
            let hunk = &rows[start..end];
            let old_len = hunk.iter().filter(|r| r.tag != Tag::Insert).count();
            let new_len = hunk.iter().filter(|r| r.tag != Tag::Delete).count();
            let old_start = if old_len == 0 { hunk[0].left } else { hunk[0].left + 1 };
            let new_start = if new_len == 0 { hunk[0].right } else { hunk[0].right + 1 };

            // Add hunk header
            output.push(format!(
                "@@ -{},{} +{},{} @@",
                old_start, old_len, new_start, new_len
            ));

            for row in hunk {
                let marker = match row.tag {
                    Tag::Equal => ' ',
                    Tag::Delete => '-',
                    Tag::Insert => '+',
                };
                output.push(format!("{}{}", marker, row.text.trim_end()));
            }
        }

        output.join("\n")
    }

    /// Format a diff model as side-by-side comparison
    ///
    /// The gutter marks `|` for changed, `<` for left-only and `>` for
    /// right-only lines.
    pub fn format_side_by_side(model: &DiffModel, sides: &Sides<'_>, width: usize) -> String {
        let mut output = Vec::new();
        let half_width = width.saturating_sub(3) / 2; // Account for gutter " x "

        output.push(format!(
            "{:<width$} | {}",
            Self::truncate_line(sides.left_name, half_width),
            Self::truncate_line(sides.right_name, half_width),
            width = half_width
        ));
        output.push("-".repeat(width));

        for region in model.regions() {
            let left = &sides.left[region.left.clone()];
            let right = &sides.right[region.right.clone()];
            let marker = match region.kind {
                RegionKind::Equal => ' ',
                RegionKind::Changed => '|',
                RegionKind::DeleteOnly => '<',
                RegionKind::InsertOnly => '>',
            };
            for row in 0..left.len().max(right.len()) {
                let l = left.get(row).map_or("", |s| s.trim_end());
                let r = right.get(row).map_or("", |s| s.trim_end());
                let line = format!(
                    "{:<width$} {} {}",
                    Self::truncate_line(l, half_width),
                    marker,
                    Self::truncate_line(r, half_width),
                    width = half_width
                );
                output.push(line.trim_end().to_string());
            }
        }

        output.join("\n")
    }

    /// Format diff statistics as a summary
    pub fn format_stats(stats: &DiffStats) -> String {
        if !stats.has_differences() {
            return "No changes".to_string();
        }

        let plural = |n: usize| if n == 1 { "" } else { "s" };
        let insertions = stats.inserted + stats.changed_right;
        let deletions = stats.deleted + stats.changed_left;

        let mut parts = Vec::new();
        if insertions > 0 {
            parts.push(format!("{} insertion{}", insertions, plural(insertions)));
        }
        if deletions > 0 {
            parts.push(format!("{} deletion{}", deletions, plural(deletions)));
        }
        parts.push(format!("{} region{}", stats.regions, plural(stats.regions)));

        parts.join(", ")
    }

    pub fn format_json(model: &DiffModel) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&Report {
            computed_at: model.computed_at(),
            stats: model.stats(),
            regions: model.regions(),
        })
    }

    /// Format with the specified format type
    pub fn format(
        model: &DiffModel,
        format: DiffFormat,
        sides: &Sides<'_>,
        context: usize,
        width: usize,
    ) -> serde_json::Result<String> {
        Ok(match format {
            DiffFormat::Regions => Self::format_regions(model),
            DiffFormat::Unified => Self::format_unified(model, sides, context),
            DiffFormat::SideBySide => Self::format_side_by_side(model, sides, width),
            DiffFormat::Stats => Self::format_stats(&model.stats()),
            DiffFormat::Json => Self::format_json(model)?,
        })
    }

    fn truncate_line(line: &str, max_width: usize) -> String {
        if line.chars().count() <= max_width {
            return line.to_string();
        }
        if max_width > 3 {
            let kept: String = line.chars().take(max_width - 3).collect();
            format!("{}...", kept)
        } else {
            line.chars().take(max_width).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::TextBuffer;
    use crate::matcher::{LineMatcher, Side};

    fn fixture(left: &[&str], right: &[&str]) -> (DiffModel, Vec<String>, Vec<String>) {
        let l = TextBuffer::from_lines(Side::Left, left.iter().copied());
        let r = TextBuffer::from_lines(Side::Right, right.iter().copied());
        let model = DiffModel::compute(&LineMatcher::default(), &l, &r);
        (model, l.all_lines().to_vec(), r.all_lines().to_vec())
    }

    fn sides<'a>(left: &'a [String], right: &'a [String]) -> Sides<'a> {
        Sides {
            left,
            right,
            left_name: "old.txt",
            right_name: "new.txt",
        }
    }

    #[test]
    fn test_format_unified() {
        let (model, left, right) =
            fixture(&["line1", "line2", "line3"], &["line1", "modified", "line3"]);
        let formatted = DiffFormatter::format_unified(&model, &sides(&left, &right), 3);

        assert!(formatted.contains("--- old.txt"));
        assert!(formatted.contains("+++ new.txt"));
        assert!(formatted.contains("@@ -1,3 +1,3 @@"));
        assert!(formatted.contains("-line2"));
        assert!(formatted.contains("+modified"));
    }

    #[test]
    fn test_unified_hunks_split_on_distance() {
        let left: Vec<String> = (0..20).map(|i| i.to_string()).collect();
        let mut right = left.clone();
        right[2] = "two".to_string();
        right[17] = "seventeen".to_string();
        let l = TextBuffer::from_lines(Side::Left, left.clone());
        let r = TextBuffer::from_lines(Side::Right, right.clone());
        let model = DiffModel::compute(&LineMatcher::default(), &l, &r);

        let formatted = DiffFormatter::format_unified(&model, &sides(&left, &right), 1);
        assert_eq!(formatted.matches("@@").count(), 4);
        assert!(formatted.contains("@@ -2,3 +2,3 @@"));
        assert!(formatted.contains("@@ -17,3 +17,3 @@"));
    }

    #[test]
    fn test_format_side_by_side() {
        let (model, left, right) = fixture(&["same", "old"], &["same", "new", "extra"]);
        let formatted = DiffFormatter::format_side_by_side(&model, &sides(&left, &right), 31);
        let lines: Vec<&str> = formatted.lines().collect();
        assert_eq!(lines[2], format!("{:<14}   {}", "same", "same"));
        assert_eq!(lines[3], format!("{:<14} | {}", "old", "new"));
        assert_eq!(lines[4], format!("{:<14} | {}", "", "extra"));
    }

    #[test]
    fn test_format_stats() {
        let (model, _, _) =
            fixture(&["line1", "line2", "line3"], &["line1", "modified", "line3"]);
        let stats = DiffFormatter::format_stats(&model.stats());

        assert_eq!(stats, "1 insertion, 1 deletion, 1 region");
        assert_eq!(DiffFormatter::format_stats(&DiffStats::default()), "No changes");
    }

    #[test]
    fn test_format_regions_and_json() {
        let (model, _, _) = fixture(&["a", "b"], &["a", "b", "c"]);
        assert_eq!(
            DiffFormatter::format_regions(&model),
            "Equal([0,2),[0,2))\nInsertOnly([2,2),[2,3))"
        );

        let json = DiffFormatter::format_json(&model).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["stats"]["inserted"], 1);
        assert_eq!(value["regions"][1]["kind"], "InsertOnly");
        assert_eq!(value["regions"][1]["right"]["end"], 3);
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(DiffFormatter::truncate_line("héllo wörld", 8), "héllo...");
        assert_eq!(DiffFormatter::truncate_line("short", 8), "short");
    }
}
