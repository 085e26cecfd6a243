use itertools::Itertools;
use tracing::debug;

use crate::core::hypothesis::Hypothesis;
use crate::core::technology::Technology;
use crate::core::types::Permutation;

/// Every (technology, permutation) pair that could explain `file_count` inputs.
///
/// Technologies are visited in the given order and permutations of
/// `0..file_count` in lexicographic order, so the result order is stable and
/// can be used for tie-breaking. A technology whose `file_count` differs from
/// the input contributes nothing; an empty result means no technology
/// accepts this many files.
pub fn enumerate<'a>(
    file_count: usize,
    technologies: impl IntoIterator<Item = &'a Technology>,
) -> Vec<Hypothesis<'a>> {
    let hypotheses: Vec<Hypothesis<'a>> = technologies
        .into_iter()
        .filter(|technology| technology.file_count == file_count)
        .flat_map(|technology| {
            (0..file_count)
                .permutations(file_count)
                .map(move |perm| Hypothesis::new(technology, Permutation(perm)))
        })
        .collect();

    if hypotheses.is_empty() {
        debug!(file_count, "No technology accepts this number of files");
    }
    hypotheses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::store::TechnologyRegistry;
    use crate::core::types::ReadSubstring;

    fn factorial(n: usize) -> usize {
        (1..=n).product()
    }

    #[test]
    fn test_two_file_technology_permutations() {
        let tech = Technology::new("t", "test", 2, ReadSubstring::new(1, 0, None));
        let hypotheses = enumerate(2, [&tech]);

        let perms: Vec<Permutation> = hypotheses.into_iter().map(|h| h.permutation).collect();
        assert_eq!(perms, vec![Permutation(vec![0, 1]), Permutation(vec![1, 0])]);
    }

    #[test]
    fn test_factorial_count_per_technology() {
        let registry = TechnologyRegistry::embedded();
        for file_count in 1..=3 {
            let hypotheses = enumerate(file_count, registry.technologies());
            for technology in registry.technologies() {
                let count = hypotheses
                    .iter()
                    .filter(|h| h.technology.name == technology.name)
                    .count();
                if technology.file_count == file_count {
                    assert_eq!(count, factorial(file_count), "{technology}");
                } else {
                    assert_eq!(count, 0, "{technology}");
                }
            }
        }
    }

    #[test]
    fn test_lexicographic_order_within_technology() {
        let tech = Technology::new("t", "test", 3, ReadSubstring::new(2, 0, None));
        let perms: Vec<Permutation> = enumerate(3, [&tech])
            .into_iter()
            .map(|h| h.permutation)
            .collect();

        let mut sorted = perms.clone();
        sorted.sort();
        assert_eq!(perms, sorted);
        assert_eq!(perms.first(), Some(&Permutation(vec![0, 1, 2])));
        assert_eq!(perms.last(), Some(&Permutation(vec![2, 1, 0])));
    }

    #[test]
    fn test_unsupported_file_count() {
        let registry = TechnologyRegistry::embedded();
        assert!(enumerate(7, registry.technologies()).is_empty());
        assert!(enumerate(0, registry.technologies()).is_empty());
    }
}
