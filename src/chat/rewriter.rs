//! Follow-up question rewriting.
//!
//! Short or pronoun-laden questions ("e lá?", "quanto custa?") get the last
//! few conversation turns appended so downstream search has something to
//! match on.

use std::sync::OnceLock;

use regex::Regex;

/// Questions shorter than this (in characters, after trimming) are always
/// expanded when history exists.
pub const SHORT_QUESTION_CHARS: usize = 24;

/// Number of trailing history turns appended.
pub const HISTORY_TURNS: usize = 3;

const FOLLOW_UP_PATTERN: &str =
    r"(?i)\b(isso aí|isso|ali|lá|então|e agora|qual|quanto|quando|onde|como)\b";

fn follow_up_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(FOLLOW_UP_PATTERN).ok()).as_ref()
}

/// Whether `question` refers back to earlier turns.
pub fn is_follow_up(question: &str) -> bool {
    question.trim().chars().count() < SHORT_QUESTION_CHARS
        || follow_up_regex().is_some_and(|re| re.is_match(question))
}

/// Rewrite with the default [`HISTORY_TURNS`].
pub fn rewrite_query(question: &str, history: &[String]) -> String {
    rewrite_query_with(question, history, HISTORY_TURNS)
}

/// Append the last `turns` non-blank history entries as
/// `" (contexto anterior: a | b | c)"` when the question looks like a
/// follow-up. Without usable history the question is returned unchanged.
pub fn rewrite_query_with(question: &str, history: &[String], turns: usize) -> String {
    let usable: Vec<&str> = history
        .iter()
        .map(|h| h.trim())
        .filter(|h| !h.is_empty())
        .collect();
    if usable.is_empty() || turns == 0 {
        return question.to_string();
    }
    if !is_follow_up(question) {
        return question.to_string();
    }

    let tail = &usable[usable.len().saturating_sub(turns)..];
    format!("{question} (contexto anterior: {})", tail.join(" | "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn history(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_history_is_identity() {
        assert_eq!(rewrite_query("e lá?", &[]), "e lá?");
        assert_eq!(rewrite_query("e lá?", &history(&["  ", ""])), "e lá?");
    }

    #[test]
    fn short_question_gets_exactly_last_three_turns() {
        let out = rewrite_query("e o preço?", &history(&["A", "B", "C", "D"]));
        assert_eq!(out, "e o preço? (contexto anterior: B | C | D)");
        assert!(!out.contains('A'));
    }

    #[test]
    fn fewer_turns_than_window() {
        let out = rewrite_query("e lá?", &history(&["Bonito"]));
        assert_eq!(out, "e lá? (contexto anterior: Bonito)");
    }

    #[test_case("Qual a melhor época para visitar o Pantanal?", true ; "interrogative")]
    #[test_case("E como faço para chegar até a cidade de Bonito?", true ; "como")]
    #[test_case("Quero conhecer as grutas e cachoeiras da região", false ; "long statement")]
    #[test_case("Me fala mais sobre a gastronomia regional do estado", false ; "no pronoun")]
    #[test_case("Preciso de dicas sobre o aquário de Campo Grande", false ; "aquário is not qual")]
    fn long_questions_depend_on_pattern(question: &str, expanded: bool) {
        let out = rewrite_query(question, &history(&["Bonito"]));
        assert_eq!(out != question, expanded, "{out}");
    }

    #[test]
    fn custom_window() {
        let out = rewrite_query_with("e agora?", &history(&["A", "B", "C"]), 1);
        assert_eq!(out, "e agora? (contexto anterior: C)");
        assert_eq!(rewrite_query_with("e agora?", &history(&["A"]), 0), "e agora?");
    }
}
