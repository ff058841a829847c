use crate::models::AnswerMap;
use regex::Regex;
use std::sync::OnceLock;

/// One "question, answer" pair: digits, an optional separator out of
/// `) - : .`, optional whitespace, then a single option letter.
fn pair_regex() -> &'static Regex {
    static PAIR: OnceLock<Regex> = OnceLock::new();
    PAIR.get_or_init(|| Regex::new(r"(\d+)\s*[)\-:.]?\s*([A-D])").unwrap())
}

pub struct KeyService;

impl KeyService {
    /// Parses free-form answer-key text ("1 A, 2 B", "1-a; 2-b",
    /// "1) i, 2) ii", ...) into a canonical answer map. Returns an
    /// empty map when nothing is recognizable; the caller decides
    /// whether that is an error.
    pub fn normalize(raw: &str) -> AnswerMap {
        let raw = raw.to_uppercase();

        // Roman numerals are substituted longest-first: IV before III
        // before II before I, otherwise "III" would be eaten by the
        // I->A rule. IV->D also collides with the literal letter D;
        // inherited behavior, kept as is.
        let raw = raw
            .replace("IV", "D")
            .replace("III", "C")
            .replace("II", "B")
            .replace("I", "A");

        let mut map = AnswerMap::new();
        for caps in pair_regex().captures_iter(&raw) {
            map.insert(&caps[1], &caps[2]);
        }
        map
    }
}
