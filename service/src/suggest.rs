//! "Did you mean" matching

/// Levenshtein distance, counted in characters
#[must_use]
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b_len = b.chars().count();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev_row: Vec<usize> = (0..=b_len).collect();
    let mut curr_row = vec![0; b_len + 1];

    for (i, a_char) in a.chars().enumerate() {
        curr_row[0] = i + 1;
        for (j, b_char) in b.chars().enumerate() {
            let cost = usize::from(a_char != b_char);
            curr_row[j + 1] = (prev_row[j + 1] + 1)
                .min(curr_row[j] + 1)
                .min(prev_row[j] + cost);
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b_len]
}

/// The closest candidate to `unknown`, if one is close enough
///
/// Case-insensitive. A candidate qualifies when its distance is at most
/// `max_distance` and shorter than `unknown` itself; the first of equally
/// close candidates wins.
pub fn suggest_similar<'a, I>(unknown: &str, candidates: I, max_distance: usize) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let unknown_lower = unknown.to_lowercase();
    candidates
        .into_iter()
        .filter_map(|candidate| {
            let distance = levenshtein(&unknown_lower, &candidate.to_lowercase());
            (distance <= max_distance && distance < unknown.chars().count().max(1))
                .then_some((candidate, distance))
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}
