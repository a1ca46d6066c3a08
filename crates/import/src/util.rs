use std::collections::BTreeSet;

/// Token-set similarity in the range [0.0, 100.0]: both strings are reduced
/// to lowercase alphanumeric word sets, and the score is the best pairwise
/// ratio between the set intersection and each side's full (sorted) token
/// string. Word order and repeated words do not affect the score, and a
/// string whose tokens are a subset of the other's scores 100.
pub fn token_set_ratio(s1: &str, s2: &str) -> f64 {
    let t1 = tokenize(s1);
    let t2 = tokenize(s2);

    let sect: Vec<&str> = t1.intersection(&t2).map(String::as_str).collect();
    let only1: Vec<&str> = t1.difference(&t2).map(String::as_str).collect();
    let only2: Vec<&str> = t2.difference(&t1).map(String::as_str).collect();

    let base = sect.join(" ");
    let combined1 = join_parts(&base, &only1.join(" "));
    let combined2 = join_parts(&base, &only2.join(" "));

    ratio(&base, &combined1)
        .max(ratio(&base, &combined2))
        .max(ratio(&combined1, &combined2))
}

/// Lowercased alphanumeric words, deduplicated and sorted.
fn tokenize(s: &str) -> BTreeSet<String> {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_string())
        .collect()
}

fn join_parts(a: &str, b: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (true, _) => b.to_string(),
        (_, true) => a.to_string(),
        _ => format!("{a} {b}"),
    }
}

/// Levenshtein similarity scaled to [0.0, 100.0].
fn ratio(s1: &str, s2: &str) -> f64 {
    let max_len = s1.len().max(s2.len());
    if max_len == 0 {
        return 100.0;
    }
    (1.0 - levenshtein_distance(s1, s2) as f64 / max_len as f64) * 100.0
}

/// Levenshtein edit distance using the two-row O(min(m,n)) space algorithm.
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let a = s1.as_bytes();
    let b = s2.as_bytes();
    let (m, n) = (a.len(), b.len());

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    // Keep the shorter string in the inner loop to minimise allocation.
    let (a, b, m, n) = if m <= n { (a, b, m, n) } else { (b, a, n, m) };

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0usize; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_100() {
        assert_eq!(token_set_ratio("ACME CORP", "ACME CORP"), 100.0);
    }

    #[test]
    fn word_order_is_ignored() {
        assert_eq!(token_set_ratio("CORP ACME", "ACME CORP"), 100.0);
    }

    #[test]
    fn case_is_ignored() {
        assert_eq!(token_set_ratio("Acme Corp", "ACME CORP"), 100.0);
    }

    #[test]
    fn token_subset_scores_100() {
        // A remittance memo usually wraps the customer name in extra words.
        assert_eq!(
            token_set_ratio("ACH PAYMENT ACME CORP INVOICE 2041", "ACME CORP"),
            100.0
        );
    }

    #[test]
    fn repeated_tokens_collapse() {
        assert_eq!(token_set_ratio("ACME ACME CORP", "ACME CORP"), 100.0);
    }

    #[test]
    fn punctuation_is_stripped() {
        assert_eq!(token_set_ratio("ACME, CORP.", "ACME CORP"), 100.0);
    }

    #[test]
    fn unrelated_names_score_low() {
        assert!(token_set_ratio("ACME CORP", "ZENITH HOLDINGS") < 50.0);
    }

    #[test]
    fn partial_overlap_scores_between() {
        let score = token_set_ratio("ACME CORP WEST", "ACME CORP EAST");
        assert!(score > 50.0 && score < 100.0, "score was {score}");
    }

    // ── levenshtein primitive ─────────────────────────────────────────────────

    #[test]
    fn levenshtein_identical_is_zero() {
        assert_eq!(levenshtein_distance("abc", "abc"), 0);
        assert_eq!(levenshtein_distance("", ""), 0);
    }

    #[test]
    fn levenshtein_empty_is_length_of_other() {
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", ""), 3);
    }

    #[test]
    fn levenshtein_single_edits() {
        assert_eq!(levenshtein_distance("cat", "bat"), 1);
        assert_eq!(levenshtein_distance("abc", "abcd"), 1);
        assert_eq!(levenshtein_distance("abcd", "abc"), 1);
    }

    #[test]
    fn levenshtein_commutative() {
        assert_eq!(
            levenshtein_distance("acme corp", "acme co"),
            levenshtein_distance("acme co", "acme corp")
        );
    }
}
