use serde::{Deserialize, Serialize};

/// A half-open byte range within one logical read of a technology.
///
/// `stream` is the logical file-role the range lives in. A `stop` of `None`
/// means "to the end of the read" and is only used for the sequence role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReadSubstring {
    pub stream: usize,
    #[serde(default)]
    pub start: usize,
    #[serde(default)]
    pub stop: Option<usize>,
}

impl ReadSubstring {
    #[must_use]
    pub const fn new(stream: usize, start: usize, stop: Option<usize>) -> Self {
        Self {
            stream,
            start,
            stop,
        }
    }

    /// Number of bases covered, `None` when the range is unbounded
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        self.stop.map(|stop| stop.saturating_sub(self.start))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Whether a read of `read_len` bases is long enough to hold this range.
    ///
    /// A read must extend past `start`, and when the range is bounded it must
    /// reach `stop`.
    #[must_use]
    pub fn fits(&self, read_len: usize) -> bool {
        if read_len <= self.start {
            return false;
        }
        self.stop.map_or(true, |stop| read_len >= stop)
    }

    /// Slice this range out of a read. Callers check [`Self::fits`] first.
    #[must_use]
    pub fn slice<'r>(&self, read: &'r str) -> &'r str {
        match self.stop {
            Some(stop) => &read[self.start..stop],
            None => &read[self.start..],
        }
    }
}

impl std::fmt::Display for ReadSubstring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.stop {
            Some(stop) => write!(f, "{}:{}-{}", self.stream, self.start, stop),
            None => write!(f, "{}:{}-", self.stream, self.start),
        }
    }
}

/// Which physical input file fills each logical stream of a technology.
///
/// If the permutation is `(1, 0, 2)`, logical stream 0 is read from input
/// file 1, stream 1 from input file 0 and stream 2 from input file 2.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Permutation(pub Vec<usize>);

impl Permutation {
    #[must_use]
    pub fn identity(n: usize) -> Self {
        Self((0..n).collect())
    }

    /// Physical file index for a logical stream
    #[must_use]
    pub fn file_for(&self, stream: usize) -> usize {
        self.0[stream]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reorder `items` so that position `i` holds the item for logical stream `i`.
    #[must_use]
    pub fn apply<T: Clone>(&self, items: &[T]) -> Vec<T> {
        self.0.iter().map(|&idx| items[idx].clone()).collect()
    }
}

impl std::fmt::Display for Permutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "({})", parts.join(", "))
    }
}

/// Pair of alignment tags carrying a raw sequence and its quality string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagPair {
    pub sequence: String,
    pub quality: String,
}

/// Alignment tags a combined file uses to carry the barcode and UMI reads
/// (10x: `CR`/`CY` and `UR`/`UY`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentTags {
    pub barcode: TagPair,
    pub umi: TagPair,
}

impl AlignmentTags {
    /// All tag names, sequence tags first
    #[must_use]
    pub fn names(&self) -> [&str; 4] {
        [
            &self.barcode.sequence,
            &self.barcode.quality,
            &self.umi.sequence,
            &self.umi.quality,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_substring_fits() {
        let bounded = ReadSubstring::new(0, 16, Some(26));
        assert!(bounded.fits(26));
        assert!(bounded.fits(100));
        assert!(!bounded.fits(25));
        assert!(!bounded.fits(16));

        // Rest-of-read ranges only need the read to extend past start
        let open = ReadSubstring::new(1, 0, None);
        assert!(open.fits(1));
        assert!(!open.fits(0));
    }

    #[test]
    fn test_read_substring_slice() {
        let read = "AAAACCCCGGGG";
        assert_eq!(ReadSubstring::new(0, 4, Some(8)).slice(read), "CCCC");
        assert_eq!(ReadSubstring::new(0, 8, None).slice(read), "GGGG");
        assert_eq!(ReadSubstring::new(0, 4, Some(8)).len(), Some(4));
        assert_eq!(ReadSubstring::new(0, 4, None).len(), None);
    }

    #[test]
    fn test_permutation_apply_and_display() {
        let perm = Permutation(vec![1, 0, 2]);
        assert_eq!(perm.file_for(0), 1);
        assert_eq!(perm.apply(&["a", "b", "c"]), vec!["b", "a", "c"]);
        assert_eq!(perm.to_string(), "(1, 0, 2)");
        assert_eq!(Permutation::identity(2), Permutation(vec![0, 1]));
    }

    #[test]
    fn test_permutation_ordering_is_lexicographic() {
        let mut perms = vec![
            Permutation(vec![1, 0]),
            Permutation(vec![0, 1]),
        ];
        perms.sort();
        assert_eq!(perms[0], Permutation(vec![0, 1]));
    }
}
