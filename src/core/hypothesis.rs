use crate::core::technology::Technology;
use crate::core::types::Permutation;

/// A candidate explanation of the input files: a technology together with
/// the assignment of input files to its logical streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hypothesis<'a> {
    pub technology: &'a Technology,
    pub permutation: Permutation,
}

impl<'a> Hypothesis<'a> {
    pub fn new(technology: &'a Technology, permutation: Permutation) -> Self {
        Self {
            technology,
            permutation,
        }
    }

    /// Input files reordered so that position `i` is logical stream `i`
    #[must_use]
    pub fn ordered_files<T: Clone>(&self, files: &[T]) -> Vec<T> {
        self.permutation.apply(files)
    }
}

impl std::fmt::Display for Hypothesis<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.technology.name, self.permutation)
    }
}
