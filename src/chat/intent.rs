//! Keyword intent tables.
//!
//! Intents are plain enums; the keyword lists that select them live in
//! static rule tables evaluated in order, first match wins.

use crate::search::catalog::normalize_query;

// ---------------------------------------------------------------------------
// Narrative intents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Greeting,
    Market,
    Dish,
    Tradition,
    Park,
    Bonito,
    Pantanal,
    BioceanicRoute,
    Itinerary,
    Events,
    Transport,
    Lodging,
    History,
    Generic,
}

pub struct IntentRule {
    pub intent: Intent,
    pub keywords: &'static [&'static str],
}

/// Whole-word greetings; see [`is_greeting`].
pub const GREETING_WORDS: &[&str] = &[
    " oi ", " olá ", " ola ", " hello ", " hi ", " bom dia ", " boa tarde ", " boa noite ",
    " e aí ", " eai ",
];

/// Greetings only count in short messages.
pub const GREETING_MAX_CHARS: usize = 20;

pub static NARRATIVE_RULES: &[IntentRule] = &[
    IntentRule {
        intent: Intent::Market,
        keywords: &["mercado", "municipal", "mercadão", "mercadao"],
    },
    IntentRule {
        intent: Intent::Dish,
        keywords: &["sobá", "soba", "comida", "gastronomia", "culinária", "culinaria"],
    },
    IntentRule {
        intent: Intent::Tradition,
        keywords: &["tereré", "terere", "tradição", "tradicao"],
    },
    IntentRule {
        intent: Intent::Park,
        keywords: &["parque", "nações", "nacoes"],
    },
    IntentRule {
        intent: Intent::Bonito,
        keywords: &["bonito"],
    },
    IntentRule {
        intent: Intent::Pantanal,
        keywords: &["pantanal"],
    },
    IntentRule {
        intent: Intent::BioceanicRoute,
        keywords: &["rota bioceânica", "rota bioceanica", "bioceânica", "bioceanica"],
    },
    IntentRule {
        intent: Intent::Itinerary,
        keywords: &["roteiro", "itinerário", "itinerario", "2 dias", "3 dias"],
    },
    IntentRule {
        intent: Intent::Events,
        keywords: &["evento", "festival"],
    },
    IntentRule {
        intent: Intent::Transport,
        keywords: &["como chegar", "transporte"],
    },
    IntentRule {
        intent: Intent::Lodging,
        keywords: &["onde ficar", "hotel", "pousada", "hospedagem"],
    },
    IntentRule {
        intent: Intent::History,
        keywords: &[
            "história", "historia", "fundou", "fundada", "fundação", "fundacao", "origem",
        ],
    },
];

/// A short message made of a greeting.
pub fn is_greeting(prompt: &str) -> bool {
    if prompt.trim().chars().count() >= GREETING_MAX_CHARS {
        return false;
    }
    let normalized = normalize_query(prompt);
    GREETING_WORDS.iter().any(|g| normalized.contains(g))
}

/// Pick the narrative intent for `prompt`.
pub fn classify(prompt: &str) -> Intent {
    if is_greeting(prompt) {
        return Intent::Greeting;
    }
    let normalized = normalize_query(prompt);
    NARRATIVE_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| normalized.contains(k)))
        .map(|rule| rule.intent)
        .unwrap_or(Intent::Generic)
}

// ---------------------------------------------------------------------------
// Clarifying topics
// ---------------------------------------------------------------------------

/// Topic of the clarifying follow-up question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClarifyTopic {
    Bonito,
    Pantanal,
    CampoGrande,
    Events,
    Lodging,
    Itinerary,
    General,
}

pub struct ClarifyRule {
    pub topic: ClarifyTopic,
    pub keywords: &'static [&'static str],
}

pub static CLARIFY_RULES: &[ClarifyRule] = &[
    ClarifyRule {
        topic: ClarifyTopic::Bonito,
        keywords: &["bonito", "flutuaç", "flutuac", "rio da prata", "gruta"],
    },
    ClarifyRule {
        topic: ClarifyTopic::Pantanal,
        keywords: &["pantanal", "safári", "safari", "onça", "onca", "ariranha"],
    },
    ClarifyRule {
        topic: ClarifyTopic::CampoGrande,
        keywords: &[
            "campo grande",
            "feira central",
            "mercadão",
            "mercadao",
            "parque das nações",
            "parque das nacoes",
        ],
    },
    ClarifyRule {
        topic: ClarifyTopic::Events,
        keywords: &["evento", "agenda", "festival", "show"],
    },
    ClarifyRule {
        topic: ClarifyTopic::Lodging,
        keywords: &["hotel", "pousada", "hosped"],
    },
    ClarifyRule {
        topic: ClarifyTopic::Itinerary,
        keywords: &["roteiro", "itinerário", "itinerario", "dias"],
    },
];

impl ClarifyTopic {
    pub fn detect(prompt: &str) -> Self {
        let normalized = normalize_query(prompt);
        CLARIFY_RULES
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| normalized.contains(k)))
            .map(|rule| rule.topic)
            .unwrap_or(Self::General)
    }
}
