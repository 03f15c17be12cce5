use std::borrow::Cow;
use std::collections::HashMap;

/// Form of a line used for matching; the original text is kept for display.
pub fn normalize(line: &str, ignore_whitespace: bool) -> Cow<'_, str> {
    if ignore_whitespace && line.chars().any(char::is_whitespace) {
        Cow::Owned(line.chars().filter(|c| !c.is_whitespace()).collect())
    } else {
        Cow::Borrowed(line)
    }
}

/// Whether two lines match under the given whitespace policy.
pub fn lines_match(a: &str, b: &str, ignore_whitespace: bool) -> bool {
    if ignore_whitespace {
        normalize(a, true) == normalize(b, true)
    } else {
        a == b
    }
}

/// Maps lines to small integer ids so the matcher compares integers.
///
/// Lines that normalize to the same text share an id.
#[derive(Debug)]
pub struct LineInterner<'a> {
    ids: HashMap<Cow<'a, str>, u32>,
    ignore_whitespace: bool,
}

impl<'a> LineInterner<'a> {
    pub fn new(ignore_whitespace: bool) -> Self {
        Self {
            ids: HashMap::new(),
            ignore_whitespace,
        }
    }

    pub fn intern(&mut self, line: &'a str) -> u32 {
        let next = self.ids.len() as u32;
        *self
            .ids
            .entry(normalize(line, self.ignore_whitespace))
            .or_insert(next)
    }

    pub fn intern_all<S: AsRef<str>>(&mut self, lines: &'a [S]) -> Vec<u32> {
        lines.iter().map(|line| self.intern(line.as_ref())).collect()
    }

    /// Number of distinct lines seen.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_all_whitespace() {
        assert_eq!(normalize("  let x =\t1; ", true), "letx=1;");
        assert_eq!(normalize("  let x", false), "  let x");
        assert!(matches!(normalize("plain", true), Cow::Borrowed(_)));
    }

    #[test]
    fn test_interner_shares_ids() {
        let left = vec!["a", "b", "a"];
        let right = vec!["b", "c"];
        let mut interner = LineInterner::new(false);
        let l = interner.intern_all(&left);
        let r = interner.intern_all(&right);
        assert_eq!(l, vec![0, 1, 0]);
        assert_eq!(r, vec![1, 2]);
        assert_eq!(interner.len(), 3);
    }

    #[test]
    fn test_interner_whitespace_insensitive() {
        let left = vec!["fn main() {"];
        let right = vec!["fn main(){"];
        let mut interner = LineInterner::new(true);
        assert_eq!(interner.intern_all(&left), interner.intern_all(&right));
        assert!(lines_match("a b", "ab", true));
        assert!(!lines_match("a b", "ab", false));
    }
}
