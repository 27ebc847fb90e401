//! "Did you mean" suggestions for typo'd names and keys

/// Closest candidate to `input` by edit distance, if it is close enough to be
/// a plausible typo.
pub fn suggest<'a, I>(input: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let threshold = (input.chars().count() / 2).clamp(1, 3);

    candidates
        .into_iter()
        .map(|candidate| (strsim::levenshtein(input, candidate), candidate))
        .filter(|(distance, _)| *distance <= threshold)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate)
}

/// Owned variant of [`suggest`]
pub fn did_you_mean<'a, I>(input: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    suggest(input, candidates).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggests_close_match() {
        let keys = ["routes", "excludeRoutes", "params", "queryParams"];
        assert_eq!(suggest("rotues", keys), Some("routes"));
        assert_eq!(suggest("queryParam", keys), Some("queryParams"));
    }

    #[test]
    fn test_no_suggestion_for_distant_input() {
        let keys = ["none", "outletArgs", "object"];
        assert_eq!(suggest("completely-different", keys), None);
    }
}
