//! Fuzzy similar-name search for "did you mean" hints.

use crate::SimilarName;

/// Levenshtein edit distance between two strings, by character.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Whether two names share a four-character prefix or suffix, ignoring case.
fn shares_affix(a: &str, b: &str) -> bool {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a.len() < 4 || b.len() < 4 {
        return false;
    }
    a[..4] == b[..4] || a[a.len() - 4..] == b[b.len() - 4..]
}

/// Find up to three candidates similar to `name`.
///
/// A candidate qualifies if its edit distance is within
/// `max(3, name.len() / 2)`, or if it shares a four-character prefix or
/// suffix with `name` (case-insensitive). Results are sorted by distance.
pub fn find_similar(name: &str, candidates: &[SimilarName]) -> Vec<SimilarName> {
    let threshold = 3usize.max(name.chars().count() / 2);
    let mut scored: Vec<(usize, &SimilarName)> = candidates
        .iter()
        .filter(|c| c.name != name)
        .filter_map(|c| {
            let distance = levenshtein(name, &c.name);
            if distance <= threshold || shares_affix(name, &c.name) {
                Some((distance, c))
            } else {
                None
            }
        })
        .collect();
    scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.name.cmp(&b.1.name)));
    scored.into_iter().take(3).map(|(_, c)| c.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[(&str, u32)]) -> Vec<SimilarName> {
        items
            .iter()
            .map(|(n, l)| SimilarName {
                name: n.to_string(),
                declared_line: *l,
            })
            .collect()
    }

    #[test]
    fn distance_basics() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }

    #[test]
    fn close_candidate_is_found() {
        let found = find_similar("usrname", &names(&[("username", 3), ("zzz", 9)]));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "username");
        assert_eq!(found[0].declared_line, 3);
    }

    #[test]
    fn affix_match_is_included_even_when_distant() {
        // Shares the "conf" prefix; distance alone would exclude it.
        let found = find_similar(
            "confx",
            &names(&[("configurationManager", 1)]),
        );
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn results_sorted_and_capped_at_three() {
        let found = find_similar(
            "val",
            &names(&[("vale", 1), ("valu", 2), ("value", 3), ("vault", 4)]),
        );
        assert_eq!(found.len(), 3);
        assert_eq!(found[0].name, "vale");
    }

    #[test]
    fn exact_name_is_not_its_own_suggestion() {
        let found = find_similar("count", &names(&[("count", 1)]));
        assert!(found.is_empty());
    }
}
