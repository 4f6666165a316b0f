//! Cross-source aggregation: re-scoring, best-answer selection, fallback
//! answers and the human-readable analysis report.
//!
//! Scoring is multiplicative:
//!
//! ```text
//! final = base × relevance/100 × source_reliability/100 × (0.8 if stale)
//! ```
//!
//! then clamped into `[0, 100]`. The best answer gets flat bonuses for
//! curated tags and cross-references and is capped at 100.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::types::{clamp_confidence, SearchAnalysis, SearchResult, TAG_REAL_DATA, TAG_VERIFIED};

/// Candidates whose `last_verified` is at least this old are stale.
pub const STALE_AFTER_DAYS: i64 = 365;
pub const STALE_FACTOR: f64 = 0.8;

pub const VERIFIED_BONUS: f64 = 10.0;
pub const REAL_DATA_BONUS: f64 = 15.0;
pub const CROSS_REFERENCE_BONUS: f64 = 3.0;

/// Candidates above this confidence can corroborate or extend the answer.
pub const SUPPORT_THRESHOLD: f64 = 70.0;
/// The answer is extended with an excerpt only above this confidence.
pub const COMBINE_THRESHOLD: f64 = 80.0;
const EXCERPT_WORDS: usize = 20;
const EXCERPT_PROBE_CHARS: usize = 20;

// ---------------------------------------------------------------------------
// Per-candidate scoring
// ---------------------------------------------------------------------------

/// Fixed trust by source label suffix.
pub fn source_reliability(source: &str) -> f64 {
    let source = source.to_lowercase();
    if source.contains(".gov.br") {
        95.0
    } else if source.contains("tripadvisor.com") {
        80.0
    } else if source.contains("google.com") {
        75.0
    } else {
        50.0
    }
}

fn tokens(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|t| {
            t.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|t| !t.is_empty())
        .collect()
}

/// Percentage of query words present in `content`. Empty query → 0.
pub fn relevance(content: &str, query: &str) -> f64 {
    let query_words = tokens(query);
    if query_words.is_empty() {
        return 0.0;
    }
    let content_words = tokens(content);
    let matched = query_words
        .iter()
        .filter(|w| content_words.contains(w))
        .count();
    matched as f64 / query_words.len() as f64 * 100.0
}

pub fn is_stale(last_verified: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(last_verified) >= Duration::days(STALE_AFTER_DAYS)
}

pub fn final_confidence(base: f64, relevance: f64, reliability: f64, stale: bool) -> f64 {
    let mut confidence = base * (relevance / 100.0) * (reliability / 100.0);
    if stale {
        confidence *= STALE_FACTOR;
    }
    clamp_confidence(confidence)
}

/// Recompute every candidate's confidence against `query`.
pub fn score_candidates(
    candidates: Vec<SearchResult>,
    query: &str,
    now: DateTime<Utc>,
) -> Vec<SearchResult> {
    candidates
        .into_iter()
        .map(|mut c| {
            c.confidence = final_confidence(
                clamp_confidence(c.confidence),
                relevance(&c.content, query),
                source_reliability(&c.source),
                is_stale(c.last_verified, now),
            );
            c
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Best answer
// ---------------------------------------------------------------------------

/// Keyword category of the canned answer used when nothing was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackCategory {
    Hotel,
    Food,
    Transport,
    Generic,
}

impl FallbackCategory {
    pub fn detect(query: &str) -> Self {
        let q = query.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| q.contains(w));
        if has(&["hotel", "hospedagem"]) {
            Self::Hotel
        } else if has(&["restaurante", "comida", "comer"]) {
            Self::Food
        } else if has(&["como chegar", "transporte", "ônibus"]) {
            Self::Transport
        } else {
            Self::Generic
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            Self::Hotel => 60.0,
            Self::Food => 65.0,
            Self::Transport => 70.0,
            Self::Generic => 55.0,
        }
    }

    pub fn answer(&self) -> &'static str {
        match self {
            Self::Hotel => "Para hospedagem em Mato Grosso do Sul, recomendo verificar plataformas como Booking.com ou consultar diretamente os sites dos hotéis. Em Campo Grande há várias opções no centro da cidade; em Bonito, as pousadas são muito procuradas.",
            Self::Food => "Mato Grosso do Sul oferece rica gastronomia regional. Em Campo Grande, experimente a Feira Central (quarta a domingo). A culinária local inclui pratos com peixe pintado, pacu, sobá e chipa.",
            Self::Transport => "Campo Grande é o principal hub de transporte de MS. O aeroporto internacional conecta às principais capitais e o terminal rodoviário fica no centro (Rua Joaquim Nabuco, 155). Para Bonito e Pantanal há ônibus e transfers regulares.",
            Self::Generic => "Mato Grosso do Sul é famoso pelo Pantanal, por Bonito e por Campo Grande. O estado oferece ecoturismo, pesca esportiva e fauna rica. Para informações específicas e atualizadas, consulte a Fundtur MS (fundtur.ms.gov.br) ou os sites oficiais das prefeituras.",
        }
    }

    pub fn sources(&self) -> &'static [&'static str] {
        match self {
            Self::Hotel => &["booking.com", "fundtur.ms.gov.br"],
            Self::Food => &["tripadvisor.com", "fundtur.ms.gov.br"],
            Self::Transport => &["campogrande.ms.gov.br", "fundtur.ms.gov.br"],
            Self::Generic => &["ms.gov.br", "fundtur.ms.gov.br"],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BestAnswer {
    pub answer: String,
    pub confidence: f64,
    pub sources: Vec<String>,
    /// Set when the answer is a canned fallback rather than a candidate.
    pub fallback: Option<FallbackCategory>,
}

impl BestAnswer {
    pub fn fallback(query: &str) -> Self {
        let category = FallbackCategory::detect(query);
        Self {
            answer: category.answer().to_string(),
            confidence: category.confidence(),
            sources: category.sources().iter().map(|s| s.to_string()).collect(),
            fallback: Some(category),
        }
    }
}

/// `verified` candidates first, then confidence descending. Stable.
pub fn rank(results: &mut [SearchResult]) {
    results.sort_by(|a, b| {
        b.has_category(TAG_VERIFIED)
            .cmp(&a.has_category(TAG_VERIFIED))
            .then_with(|| b.confidence.total_cmp(&a.confidence))
    });
}

/// Other candidates above the support threshold whose content contains the
/// primary's first word. Lexical only; says nothing about agreement.
pub fn count_cross_references(primary: &SearchResult, others: &[SearchResult]) -> u32 {
    let primary_content = primary.content.to_lowercase();
    let Some(first_word) = primary_content.split_whitespace().next() else {
        return 0;
    };
    others
        .iter()
        .filter(|r| r.confidence > SUPPORT_THRESHOLD)
        .filter(|r| r.content.to_lowercase().contains(first_word))
        .count() as u32
}

fn excerpt(content: &str) -> String {
    let words: Vec<&str> = content.split_whitespace().collect();
    if words.len() > EXCERPT_WORDS {
        format!("{}...", words[..EXCERPT_WORDS].join(" "))
    } else {
        content.to_string()
    }
}

/// Primary content plus at most one excerpt from candidates 2–3 that adds
/// something not already in the primary.
pub fn combine_sources(ranked: &[SearchResult]) -> String {
    let Some(primary) = ranked.first() else {
        return String::new();
    };
    let primary_lower = primary.content.to_lowercase();
    let extra = ranked
        .iter()
        .skip(1)
        .take(2)
        .filter(|r| r.confidence > SUPPORT_THRESHOLD)
        .map(|r| excerpt(&r.content))
        .find(|info| {
            let probe: String = info.to_lowercase().chars().take(EXCERPT_PROBE_CHARS).collect();
            !primary_lower.contains(&probe)
        });

    match extra {
        Some(info) => format!("{} Informação adicional: {}", primary.content, info),
        None => primary.content.clone(),
    }
}

/// Rank `results` in place and pick the answer.
pub fn find_best_answer(results: &mut [SearchResult], query: &str) -> BestAnswer {
    if results.is_empty() {
        return BestAnswer::fallback(query);
    }
    rank(results);

    let primary = &results[0];
    let cross_refs = count_cross_references(primary, &results[1..]);

    let mut confidence = primary.confidence;
    if primary.has_category(TAG_VERIFIED) {
        confidence += VERIFIED_BONUS;
    }
    if primary.has_category(TAG_REAL_DATA) {
        confidence += REAL_DATA_BONUS;
    }
    confidence = clamp_confidence(confidence + f64::from(cross_refs) * CROSS_REFERENCE_BONUS);

    let mut answer = if results.len() > 1 && confidence > COMBINE_THRESHOLD {
        combine_sources(results)
    } else {
        primary.content.clone()
    };
    if answer.trim().is_empty() {
        answer = if primary.title.trim().is_empty() {
            FallbackCategory::detect(query).answer().to_string()
        } else {
            primary.title.clone()
        };
    }

    BestAnswer {
        answer,
        confidence,
        sources: results.iter().take(3).map(|r| r.source.clone()).collect(),
        fallback: None,
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

fn reliability_label(confidence: f64) -> &'static str {
    if confidence >= 90.0 {
        "ALTA"
    } else if confidence >= 70.0 {
        "MÉDIA"
    } else {
        "BAIXA"
    }
}

/// Portuguese summary of a search: counts, per-source confidence, chosen
/// answer and a reliability label.
pub fn analysis_report(query: &str, results: &[SearchResult], best: &BestAnswer) -> String {
    let total = results.len();
    let official = results.iter().filter(|r| r.is_official).count();
    let average = if total == 0 {
        0.0
    } else {
        results.iter().map(|r| r.confidence).sum::<f64>() / total as f64
    };

    let mut out = format!("Análise da busca: \"{query}\"\n\n");
    out.push_str("ESTATÍSTICAS:\n");
    out.push_str(&format!("- Fontes consultadas: {total}\n"));
    out.push_str(&format!("- Fontes oficiais: {official}\n"));
    out.push_str(&format!("- Confiança média: {}%\n", average.round()));
    out.push_str(&format!("- Melhor resposta: {}%\n\n", best.confidence.round()));

    out.push_str("FONTES CONSULTADAS:\n");
    if results.is_empty() {
        out.push_str("- nenhuma (resposta padrão)\n");
    }
    for r in results {
        out.push_str(&format!("- {} ({}% confiança)\n", r.source, r.confidence.round()));
    }

    out.push_str(&format!("\nRESPOSTA SELECIONADA:\n{}\n\n", best.answer));
    out.push_str(&format!("CONFIABILIDADE: {}", reliability_label(best.confidence)));
    out
}

/// Score, rank, and fold candidates into an analysis.
pub fn aggregate(query: &str, candidates: Vec<SearchResult>, now: DateTime<Utc>) -> SearchAnalysis {
    let mut results = score_candidates(candidates, query, now);
    let best = find_best_answer(&mut results, query);
    let analysis = analysis_report(query, &results, &best);
    SearchAnalysis {
        query: query.to_string(),
        results,
        best_answer: best.answer,
        confidence: best.confidence,
        sources: best.sources,
        analysis,
        unavailable_sources: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Reliability;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;
    use test_case::test_case;

    fn candidate(source: &str, content: &str, confidence: f64, tags: &[&str]) -> SearchResult {
        SearchResult {
            title: format!("{source} title"),
            content: content.to_string(),
            url: format!("https://{source}"),
            source: source.to_string(),
            reliability: Reliability::High,
            confidence,
            cross_references: 1,
            last_verified: Utc::now(),
            is_official: source.ends_with(".gov.br"),
            categories: tags.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>(),
        }
    }

    // -- scoring ------------------------------------------------------------

    #[test_case("fundtur.ms.gov.br", 95.0)]
    #[test_case("tripadvisor.com", 80.0)]
    #[test_case("google.com", 75.0)]
    #[test_case("bioparque.com.br", 50.0)]
    fn reliability_by_suffix(source: &str, expected: f64) {
        assert_eq!(source_reliability(source), expected);
    }

    #[test]
    fn relevance_counts_query_words() {
        let content = "O Bioparque abre de terça a domingo. Horário: 8h às 17h.";
        assert!((relevance(content, "horário do bioparque") - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(relevance(content, "Bioparque"), 100.0);
        assert_eq!(relevance(content, "   "), 0.0);
        assert_eq!(relevance("", "bonito"), 0.0);
    }

    #[test]
    fn stale_after_a_year() {
        let now = Utc::now();
        assert!(!is_stale(now - Duration::days(364), now));
        assert!(is_stale(now - Duration::days(365), now));
    }

    #[test]
    fn final_confidence_formula() {
        assert!((final_confidence(100.0, 50.0, 80.0, false) - 40.0).abs() < 1e-9);
        assert!((final_confidence(100.0, 50.0, 80.0, true) - 32.0).abs() < 1e-9);
        assert_eq!(final_confidence(100.0, 300.0, 95.0, false), 100.0);
        assert_eq!(final_confidence(f64::NAN, 100.0, 95.0, false), 0.0);
    }

    #[test]
    fn score_candidates_applies_staleness() {
        let now = Utc::now();
        let mut old = candidate("x.gov.br", "bonito", 100.0, &[]);
        old.last_verified = now - Duration::days(400);
        let fresh = candidate("x.gov.br", "bonito", 100.0, &[]);
        let scored = score_candidates(vec![old, fresh], "bonito", now);
        assert!((scored[0].confidence - 76.0).abs() < 1e-9);
        assert!((scored[1].confidence - 95.0).abs() < 1e-9);
    }

    // -- ranking ------------------------------------------------------------

    #[test]
    fn verified_ranks_before_higher_confidence() {
        let mut results = vec![
            candidate("a.com", "alpha", 90.0, &[]),
            candidate("b.com", "beta", 10.0, &[TAG_VERIFIED]),
            candidate("c.com", "gamma", 95.0, &[]),
        ];
        rank(&mut results);
        let order: Vec<&str> = results.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(order, vec!["b.com", "c.com", "a.com"]);
    }

    #[test]
    fn cross_references_exclude_primary_and_weak_candidates() {
        let primary = candidate("a.gov.br", "Bonito tem rios cristalinos", 90.0, &[]);
        let others = vec![
            candidate("b.com", "Em bonito há grutas", 80.0, &[]),
            candidate("c.com", "bonito demais", 60.0, &[]),
            candidate("d.com", "Pantanal", 99.0, &[]),
        ];
        assert_eq!(count_cross_references(&primary, &others), 1);
        let empty = candidate("e.com", "   ", 90.0, &[]);
        assert_eq!(count_cross_references(&empty, &others), 0);
    }

    #[test]
    fn bonuses_apply_and_cap_at_hundred() {
        let mut results = vec![candidate("a.gov.br", "bioparque aberto", 80.0, &[TAG_VERIFIED, TAG_REAL_DATA])];
        let best = find_best_answer(&mut results, "bioparque");
        assert_eq!(best.confidence, 100.0);
        assert_eq!(best.answer, "bioparque aberto");
        assert!(best.fallback.is_none());
    }

    #[test]
    fn combine_appends_one_new_excerpt() {
        let long: String = (1..=30).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let mut results = vec![
            candidate("a.gov.br", "Principal resposta sobre Bonito", 90.0, &[TAG_VERIFIED]),
            candidate("b.com", &long, 85.0, &[]),
            candidate("c.com", "Terceira fonte", 84.0, &[]),
        ];
        let best = find_best_answer(&mut results, "bonito");
        let expected_excerpt: String =
            (1..=20).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        assert_eq!(
            best.answer,
            format!("Principal resposta sobre Bonito Informação adicional: {expected_excerpt}...")
        );
        assert_eq!(best.sources, vec!["a.gov.br", "b.com", "c.com"]);
    }

    #[test]
    fn combine_skips_excerpt_already_in_primary() {
        let results = vec![
            candidate("a.gov.br", "Gruta do Lago Azul em Bonito, agendamento obrigatório", 90.0, &[]),
            candidate("b.com", "Gruta do Lago Azul em Bonito", 85.0, &[]),
        ];
        assert_eq!(combine_sources(&results), results[0].content);
    }

    #[test]
    fn no_combination_at_or_below_threshold() {
        let mut results = vec![
            candidate("a.com", "Primeira", 60.0, &[]),
            candidate("b.com", "Segunda fonte diferente", 75.0, &[]),
        ];
        let best = find_best_answer(&mut results, "x");
        assert_eq!(best.answer, "Segunda fonte diferente");
        assert_eq!(best.confidence, 75.0);
    }

    #[test]
    fn empty_content_falls_back_to_title() {
        let mut results = vec![candidate("a.com", "", 50.0, &[])];
        let best = find_best_answer(&mut results, "x");
        assert_eq!(best.answer, "a.com title");
    }

    // -- fallback -----------------------------------------------------------

    #[test_case("hotel em bonito", FallbackCategory::Hotel, 60.0)]
    #[test_case("onde comer", FallbackCategory::Food, 65.0)]
    #[test_case("como chegar na cidade", FallbackCategory::Transport, 70.0)]
    #[test_case("", FallbackCategory::Generic, 55.0)]
    fn empty_list_uses_category_fallback(query: &str, category: FallbackCategory, confidence: f64) {
        let best = find_best_answer(&mut [], query);
        assert_eq!(best.fallback, Some(category));
        assert_eq!(best.confidence, confidence);
        assert_eq!(best.answer, category.answer());
        assert!(!best.sources.is_empty());
    }

    // -- aggregate ----------------------------------------------------------

    #[test]
    fn aggregate_builds_report() {
        let analysis = aggregate(
            "bioparque",
            vec![candidate("bioparque.com.br", "Bioparque gratuito", 98.0, &[TAG_VERIFIED, TAG_REAL_DATA])],
            Utc::now(),
        );
        // 98 × 1 × 0.5 = 49, +25 in bonuses
        assert_eq!(analysis.confidence, 74.0);
        assert_eq!(analysis.sources, vec!["bioparque.com.br"]);
        assert!(analysis.analysis.contains("Fontes consultadas: 1"));
        assert!(analysis.analysis.contains("CONFIABILIDADE: MÉDIA"));
        assert!(analysis.unavailable_sources.is_empty());
    }

    #[test]
    fn aggregate_empty_is_fallback_with_report() {
        let analysis = aggregate("hotel", vec![], Utc::now());
        assert!(analysis.results.is_empty());
        assert_eq!(analysis.confidence, 60.0);
        assert!(analysis.analysis.contains("resposta padrão"));
        assert!(analysis.analysis.ends_with("BAIXA"));
    }
}
