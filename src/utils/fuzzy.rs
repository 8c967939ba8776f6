// Name and id matching for command-line lead/stage references

/// Calculate Levenshtein distance between two strings
/// Returns the minimum number of single-character edits (insertions, deletions, substitutions)
/// needed to transform one string into another
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();
    let s1_len = s1_chars.len();
    let s2_len = s2_chars.len();

    if s1_len == 0 {
        return s2_len;
    }
    if s2_len == 0 {
        return s1_len;
    }

    let mut matrix = vec![vec![0; s2_len + 1]; s1_len + 1];

    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=s2_len {
        matrix[0][j] = j;
    }

    for i in 1..=s1_len {
        for j in 1..=s2_len {
            let cost = if s1_chars[i - 1] == s2_chars[j - 1] { 0 } else { 1 };

            matrix[i][j] = (matrix[i - 1][j] + 1)                    // deletion
                .min(matrix[i][j - 1] + 1)                          // insertion
                .min(matrix[i - 1][j - 1] + cost);                  // substitution
        }
    }

    matrix[s1_len][s2_len]
}

/// Result of resolving a user-typed reference against a list of records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenMatch {
    /// Exactly one record matched
    Found(usize),
    /// Several records matched the prefix or name
    Ambiguous(Vec<usize>),
    /// Nothing matched; carries the closest names (may be empty)
    NotFound(Vec<String>),
}

/// Resolve `token` against `(id, name)` pairs.
///
/// Precedence: exact id, then case-insensitive exact name, then unique id prefix.
/// On failure, names within edit distance 2 are offered as suggestions.
pub fn resolve_token(token: &str, candidates: &[(&str, &str)]) -> TokenMatch {
    let token = token.trim();

    if let Some(idx) = candidates.iter().position(|(id, _)| *id == token) {
        return TokenMatch::Found(idx);
    }

    let token_lower = token.to_lowercase();
    let by_name: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, (_, name))| name.to_lowercase() == token_lower)
        .map(|(idx, _)| idx)
        .collect();
    match by_name.len() {
        1 => return TokenMatch::Found(by_name[0]),
        n if n > 1 => return TokenMatch::Ambiguous(by_name),
        _ => {}
    }

    if !token.is_empty() {
        let by_prefix: Vec<usize> = candidates
            .iter()
            .enumerate()
            .filter(|(_, (id, _))| id.starts_with(token))
            .map(|(idx, _)| idx)
            .collect();
        match by_prefix.len() {
            1 => return TokenMatch::Found(by_prefix[0]),
            n if n > 1 => return TokenMatch::Ambiguous(by_prefix),
            _ => {}
        }
    }

    TokenMatch::NotFound(find_near_matches(token, candidates.iter().map(|(_, name)| *name), 2))
}

/// Find names within `max_distance` edits of `search` (case-insensitive)
/// Returns up to 3 names sorted by distance (closest first)
pub fn find_near_matches<'a>(
    search: &str,
    names: impl Iterator<Item = &'a str>,
    max_distance: usize,
) -> Vec<String> {
    let search_lower = search.to_lowercase();
    let mut matches: Vec<(String, usize)> = names
        .filter_map(|name| {
            let distance = levenshtein_distance(&search_lower, &name.to_lowercase());
            (distance <= max_distance).then(|| (name.to_string(), distance))
        })
        .collect();

    matches.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    matches.dedup_by(|a, b| a.0 == b.0);
    matches.into_iter().take(3).map(|(name, _)| name).collect()
}
