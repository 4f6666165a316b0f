//! Canned reply texts for the local fallback tiers.

use rand::seq::SliceRandom;
use rand::Rng;

use super::intent::{classify, ClarifyTopic, Intent};
use crate::search::catalog::normalize_query;
use crate::types::KnowledgeItem;

pub const FOLLOW_UP_SUFFIX: &str =
    "\n\nQuer que eu detalhe como chegar, melhores horários ou valores aproximados?";

const CALL_TO_ACTION: &str = "quer que eu";

/// Maximum number of sources listed by [`summarize_sources`].
pub const SUMMARY_SOURCES: usize = 3;

// ---------------------------------------------------------------------------
// Greetings
// ---------------------------------------------------------------------------

pub const GREETINGS: [&str; 3] = [
    "Oi! Sou o Guatá, sua capivara guia! Aqui no Mato Grosso do Sul a gente tem histórias pra \
     contar e lugares pra te encantar. Quer que eu te conte sobre nossa gastronomia, nossos \
     destinos ou nossas tradições?",
    "Olá! Sou o Guatá! Aqui no MS a gente vive experiências únicas, do tereré geladinho na \
     praça às águas cristalinas de Bonito. O que você quer descobrir hoje?",
    "Oi! Sou o Guatá, sua capivara simpática! Aqui tem o Mercadão com o melhor sobá, o \
     Pantanal com jacarés gigantes e muito mais. Quer que eu te conte os segredos que só \
     quem mora aqui conhece?",
];

pub fn greeting<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    GREETINGS.choose(rng).copied().unwrap_or(GREETINGS[0])
}

// ---------------------------------------------------------------------------
// Narratives
// ---------------------------------------------------------------------------

const MARKET: &str = "Você já ouviu falar no Mercado Municipal de Campo Grande? Além de provar \
    a chipa e a sopa paraguaia, muita gente se encanta com as cores e os cheiros das bancas. É \
    um passeio pela história da imigração na cidade. Quer que eu sugira um prato típico para \
    experimentar lá?";

const DISH: &str = "Já imaginou provar o sobá na Feira Central? O sobá virou patrimônio \
    cultural de Campo Grande e carrega a história da imigração japonesa. Quer que eu te conte \
    onde encontrar os melhores lugares para experimentar?";

const TRADITION: &str = "O tereré aqui é mais que uma bebida, é tradição! É comum ver o \
    pessoal na praça passando a guampa de mão em mão. Quer saber onde encontrar as melhores \
    rodas de tereré?";

const PARK: &str = "O Parque das Nações Indígenas é um dos lugares mais queridos da cidade. \
    As famílias se reúnem, o pessoal caminha em volta do lago e aproveita as áreas verdes. \
    Quer que eu te conte os melhores horários para visitar?";

const BONITO: &str = "Bonito é um destino incrível! As águas cristalinas impressionam e a \
    flutuação no Rio da Prata é inesquecível. Quer que eu te conte os principais atrativos e \
    como organizar a viagem?";

const PANTANAL: &str = "O Pantanal é um lugar especial! Cada safári é diferente: dá para ver \
    jacarés, capivaras, ariranhas e centenas de aves. Quer saber a melhor época para visitar?";

const BIOCEANIC_ROUTE: &str = "A Rota Bioceânica vai ligar Campo Grande ao Pacífico, passando \
    por Paraguai, Argentina e Chile. É um projeto que pode movimentar o turismo e o comércio \
    da região. Quer que eu te conte mais detalhes?";

const ITINERARY: &str = "Que legal! Posso te ajudar a montar um roteiro em Campo Grande, do \
    Mercadão ao Parque das Nações. Quer que eu sugira um roteiro que combine com o que você \
    gosta de fazer?";

const EVENTS: &str = "Aqui sempre tem evento! Tem o Festival de Inverno, festas tradicionais e \
    outras programações culturais. Quer que eu te conte o que está acontecendo e como \
    participar?";

const TRANSPORT: &str = "Chegar aqui é fácil! Campo Grande tem voos diretos, ônibus de várias \
    cidades e boas estradas. Quer que eu te conte a melhor forma de chegar e se locomover?";

const LODGING: &str = "Tem hospedagem para todos os gostos: hotéis no centro, pousadas \
    charmosas e hotéis-fazenda. Quer que eu te conte as melhores opções para você?";

const GENERIC: &str = "Oi! Sou o Guatá, sua capivara guia! Aqui no Mato Grosso do Sul tem \
    lugares incríveis para conhecer. Quer que eu te conte sobre nossos destinos, nossa \
    gastronomia ou nossas tradições?";

const HISTORY_CAMPO_GRANDE: &str = "Campo Grande foi fundada em 26 de agosto de 1899 por José \
    Antônio Pereira, pioneiro que chegou à região em busca de terras férteis. A cidade cresceu \
    pela localização estratégica e pela pecuária, e hoje é a capital de Mato Grosso do Sul.";

const HISTORY_STATE: &str = "Mato Grosso do Sul foi criado em 11 de outubro de 1977, \
    desmembrado de Mato Grosso. O estado tem uma rica história indígena, com povos como os \
    Terena, Guarani e Kadiwéu, e uma cultura que mistura tradições indígenas, gaúchas e \
    pantaneiras.";

const HISTORY_GENERIC: &str = "Mato Grosso do Sul tem uma história fascinante! O estado foi \
    criado em 1977 e guarda uma herança indígena forte, com Terena, Guarani e Kadiwéu. \
    Bandeirantes e tropeiros completaram a mistura que deu origem à cultura sul-mato-grossense.";

fn history(prompt: &str) -> &'static str {
    let normalized = normalize_query(prompt);
    if normalized.contains(" campo grande ") {
        HISTORY_CAMPO_GRANDE
    } else if normalized.contains(" mato grosso do sul ") || normalized.contains(" ms ") {
        HISTORY_STATE
    } else {
        HISTORY_GENERIC
    }
}

/// The last-resort narrative reply for `prompt`.
pub fn narrative<R: Rng + ?Sized>(prompt: &str, rng: &mut R) -> String {
    let text = match classify(prompt) {
        Intent::Greeting => greeting(rng),
        Intent::Market => MARKET,
        Intent::Dish => DISH,
        Intent::Tradition => TRADITION,
        Intent::Park => PARK,
        Intent::Bonito => BONITO,
        Intent::Pantanal => PANTANAL,
        Intent::BioceanicRoute => BIOCEANIC_ROUTE,
        Intent::Itinerary => ITINERARY,
        Intent::Events => EVENTS,
        Intent::Transport => TRANSPORT,
        Intent::Lodging => LODGING,
        Intent::History => history(prompt),
        Intent::Generic => GENERIC,
    };
    text.to_string()
}

// ---------------------------------------------------------------------------
// Clarifying questions
// ---------------------------------------------------------------------------

pub fn clarifying_question(prompt: &str) -> &'static str {
    match ClarifyTopic::detect(prompt) {
        ClarifyTopic::Bonito => {
            "Você quer saber sobre atrativos, preços dos passeios ou como chegar em Bonito?"
        }
        ClarifyTopic::Pantanal => {
            "Prefere saber a melhor época, fazendas e lodges ou o tempo mínimo de estadia no \
             Pantanal?"
        }
        ClarifyTopic::CampoGrande => {
            "Você quer dicas de onde comer, o que visitar ou como montar um roteiro em Campo \
             Grande?"
        }
        ClarifyTopic::Events => {
            "Quer ver eventos deste fim de semana, dos próximos 30 dias ou de um tipo \
             específico (música, cultura, infantil)?"
        }
        ClarifyTopic::Lodging => {
            "Procura hotel no centro, pousada mais tranquila ou algo próximo aos principais \
             atrativos?"
        }
        ClarifyTopic::Itinerary => {
            "Quantos dias você tem e qual o seu estilo de viagem (natureza, cultura, \
             gastronomia)?"
        }
        ClarifyTopic::General => {
            "Para eu te ajudar melhor, me diga se você busca natureza, cultura ou gastronomia \
             e quantos dias pretende ficar."
        }
    }
}

// ---------------------------------------------------------------------------
// Direct answers and source summaries
// ---------------------------------------------------------------------------

/// Trim and append [`FOLLOW_UP_SUFFIX`] unless the answer already invites
/// a follow-up.
pub fn enhance_direct_answer(answer: &str) -> String {
    let trimmed = answer.trim();
    if trimmed.to_lowercase().contains(CALL_TO_ACTION) {
        trimmed.to_string()
    } else {
        format!("{trimmed}{FOLLOW_UP_SUFFIX}")
    }
}

/// Bullet list of the first [`SUMMARY_SOURCES`] sources.
pub fn summarize_sources(sources: &[KnowledgeItem]) -> String {
    let bullets: Vec<String> = sources
        .iter()
        .take(SUMMARY_SOURCES)
        .enumerate()
        .map(|(i, s)| {
            let title = if s.title.trim().is_empty() {
                format!("Fonte {}", i + 1)
            } else {
                s.title.trim().to_string()
            };
            if s.source.trim().is_empty() {
                format!("- {title}")
            } else {
                format!("- {title} ({})", s.source.trim())
            }
        })
        .collect();
    format!("Encontrei algumas referências úteis:\n{}", bullets.join("\n"))
}
