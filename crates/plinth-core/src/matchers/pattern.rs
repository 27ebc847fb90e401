//! Regular-expression literals (`/pattern/flags`) embedded in rule values

use parking_lot::Mutex;
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{debug, warn};

const SUPPORTED_FLAGS: &str = "gimsu";

/// Compiled literals kept before the cache is cleared
const REGEX_CACHE_LIMIT: usize = 256;

/// Split `/pattern/flags` into its pattern and flags
pub fn parse_regex_literal(literal: &str) -> Option<(&str, &str)> {
    let rest = literal.strip_prefix('/')?;
    let end = rest.rfind('/')?;
    let (pattern, flags) = (&rest[..end], &rest[end + 1..]);
    if pattern.is_empty() || !flags.chars().all(|c| SUPPORTED_FLAGS.contains(c)) {
        return None;
    }
    Some((pattern, flags))
}

pub fn is_regex_literal(value: &str) -> bool {
    parse_regex_literal(value).is_some()
}

/// Compile a `/pattern/flags` literal. `Ok(None)` when `literal` is not one.
pub fn compile_regex_literal(literal: &str) -> Result<Option<Regex>, regex::Error> {
    let Some((pattern, flags)) = parse_regex_literal(literal) else {
        return Ok(None);
    };
    RegexBuilder::new(pattern)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .build()
        .map(Some)
}

fn regex_cache() -> &'static Mutex<HashMap<String, Option<Regex>>> {
    static CACHE: OnceLock<Mutex<HashMap<String, Option<Regex>>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Test `text` against a regex literal; invalid literals never match.
pub fn regex_literal_matches(literal: &str, text: &str) -> bool {
    let mut cache = regex_cache().lock();
    if cache.len() >= REGEX_CACHE_LIMIT && !cache.contains_key(literal) {
        debug!("Regex cache full ({} entries); clearing", cache.len());
        cache.clear();
    }
    let compiled = cache.entry(literal.to_string()).or_insert_with(|| {
        compile_regex_literal(literal).unwrap_or_else(|e| {
            warn!("Invalid regular expression {}: {}", literal, e);
            None
        })
    });
    compiled.as_ref().map_or(false, |re| re.is_match(text))
}
