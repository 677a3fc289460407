//! "Did you mean" matching for mistyped commands.

/// Minimum similarity for a command to be suggested.
pub const SUGGESTION_CUTOFF: f64 = 0.6;

/// Levenshtein distance over chars.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut dp = vec![vec![0; n + 1]; m + 1];
    for (i, row) in dp.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=n {
        dp[0][j] = j;
    }

    for i in 1..=m {
        for j in 1..=n {
            let cost = if a_chars[i - 1] == b_chars[j - 1] { 0 } else { 1 };
            dp[i][j] = (dp[i - 1][j] + 1)
                .min(dp[i][j - 1] + 1)
                .min(dp[i - 1][j - 1] + cost);
        }
    }

    dp[m][n]
}

/// Similarity in `0.0..=1.0`: one minus the edit distance over the longer length.
pub fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - edit_distance(a, b) as f64 / longest as f64
}

/// The most similar candidate at or above [`SUGGESTION_CUTOFF`].
///
/// Ties go to the earlier candidate.
pub fn suggest<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return None;
    }
    let mut best: Option<(&'a str, f64)> = None;
    for candidate in candidates {
        let score = similarity(&input, candidate);
        if score < SUGGESTION_CUTOFF {
            continue;
        }
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((*candidate, score));
        }
    }
    best.map(|(name, _)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("add row", "add row"), 0);
        assert_eq!(edit_distance("adx row", "add row"), 1);
    }

    #[test]
    fn test_suggests_close_command() {
        let commands = ["add column", "add row", "remove row", "exit"];
        assert_eq!(suggest("add rwo", &commands), Some("add row"));
        assert_eq!(suggest("ADD COLUMM", &commands), Some("add column"));
        assert_eq!(suggest("exitt", &commands), Some("exit"));
    }

    #[test]
    fn test_no_suggestion_below_cutoff() {
        let commands = ["add column", "add row"];
        assert_eq!(suggest("banana", &commands), None);
        assert_eq!(suggest("", &commands), None);
    }

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(similarity("help", "help"), 1.0);
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("abcd", "wxyz"), 0.0);
    }
}
