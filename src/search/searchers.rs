//! Template searchers: structured data, official, tourism, review, news
//! and social.
//!
//! None of these touch the network. Each evaluates its static table with
//! [`catalog::select`] and always returns [`SearchOutcome::Found`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::catalog::{self, Template, Trigger};
use super::{SearchOutcome, Searcher};
use crate::types::{Reliability, TAG_REAL_DATA, TAG_VERIFIED};

/// A [`Searcher`] backed by a static [`Template`] table.
#[derive(Debug, Clone, Copy)]
pub struct TemplateSearcher {
    name: &'static str,
    table: &'static [Template],
}

impl TemplateSearcher {
    pub const fn new(name: &'static str, table: &'static [Template]) -> Self {
        Self { name, table }
    }

    pub fn table(&self) -> &'static [Template] {
        self.table
    }

    /// Verified facts tagged `verified` and `real-data`.
    pub const fn structured_data() -> Self {
        Self::new("structured", STRUCTURED)
    }

    pub const fn official() -> Self {
        Self::new("official", OFFICIAL)
    }

    pub const fn tourism() -> Self {
        Self::new("tourism", TOURISM)
    }

    pub const fn review() -> Self {
        Self::new("review", REVIEW)
    }

    pub const fn news() -> Self {
        Self::new("news", NEWS)
    }

    pub const fn social() -> Self {
        Self::new("social", SOCIAL)
    }
}

#[async_trait]
impl Searcher for TemplateSearcher {
    fn name(&self) -> &str {
        self.name
    }

    async fn search(&self, query: &str) -> SearchOutcome {
        let results = catalog::select(self.table, query, Utc::now());
        tracing::debug!(searcher = self.name, found = results.len(), "template search");
        SearchOutcome::Found(results)
    }
}

/// Every offline searcher, in fan-out order.
pub fn template_searchers() -> Vec<Arc<dyn Searcher>> {
    vec![
        Arc::new(TemplateSearcher::structured_data()),
        Arc::new(TemplateSearcher::official()),
        Arc::new(TemplateSearcher::tourism()),
        Arc::new(TemplateSearcher::review()),
        Arc::new(TemplateSearcher::news()),
        Arc::new(TemplateSearcher::social()),
    ]
}

// ---------------------------------------------------------------------------
// Structured data
// ---------------------------------------------------------------------------

const REAL_DATA: &[&str] = &[TAG_VERIFIED, TAG_REAL_DATA];

static STRUCTURED: &[Template] = &[
    Template {
        triggers: &[
            Trigger::Any(&["bioparque"]),
            Trigger::All(&["aquário", "campo grande"]),
            Trigger::All(&["aquario", "campo grande"]),
        ],
        when_unmatched: false,
        title: "Bioparque Pantanal - Campo Grande",
        url: "https://bioparque.com.br",
        content: "O Bioparque Pantanal é o maior aquário de água doce do mundo, localizado em Campo Grande. Horário: terça a domingo, das 8h às 17h. Entrada gratuita. Endereço: Av. Afonso Pena, 6001.",
        source: "bioparque.com.br",
        reliability: Reliability::High,
        confidence: 98.0,
        is_official: false,
        categories: REAL_DATA,
    },
    Template {
        triggers: &[Trigger::Any(&["bonito", "gruta", "rio da prata"])],
        when_unmatched: false,
        title: "Bonito - Destino de Ecoturismo",
        url: "https://bonito.ms.gov.br",
        content: "Bonito é famoso pelas águas cristalinas, grutas e nascentes. Principais atrações: Gruta do Lago Azul, Rio da Prata, Rio Sucuri, Buraco das Araras. Agendamento obrigatório para a maioria das atrações.",
        source: "bonito.ms.gov.br",
        reliability: Reliability::High,
        confidence: 95.0,
        is_official: true,
        categories: REAL_DATA,
    },
    Template {
        triggers: &[Trigger::Any(&["pantanal"])],
        when_unmatched: false,
        title: "Pantanal - Patrimônio Natural",
        url: "https://pantanal.ms.gov.br",
        content: "O Pantanal é a maior planície alagável do mundo e Patrimônio Natural da Humanidade. Melhor época: maio a setembro (seca). Principais cidades: Corumbá, Miranda, Aquidauana.",
        source: "pantanal.ms.gov.br",
        reliability: Reliability::High,
        confidence: 95.0,
        is_official: true,
        categories: REAL_DATA,
    },
    Template {
        triggers: &[Trigger::Any(&["terminal", "rodoviário", "rodoviario", "ônibus", "onibus"])],
        when_unmatched: false,
        title: "Terminal Rodoviário de Campo Grande",
        url: "https://campogrande.ms.gov.br",
        content: "Terminal Rodoviário Engenheiro Luis Eduardo Magalhães, na Rua Joaquim Nabuco, 155 - Centro. Principais destinos: São Paulo, Brasília, Cuiabá, Dourados, Corumbá.",
        source: "campogrande.ms.gov.br",
        reliability: Reliability::High,
        confidence: 95.0,
        is_official: true,
        categories: REAL_DATA,
    },
    Template {
        triggers: &[Trigger::Any(&["aeroporto", "voo", "voos"])],
        when_unmatched: false,
        title: "Aeroporto Internacional de Campo Grande",
        url: "https://aeroportocampogrande.com.br",
        content: "O Aeroporto Internacional de Campo Grande (CGR) liga MS às principais capitais e fica a cerca de 7 km do centro. Acesso por táxi, aplicativo ou ônibus.",
        source: "aeroportocampogrande.com.br",
        reliability: Reliability::High,
        confidence: 95.0,
        is_official: false,
        categories: REAL_DATA,
    },
    Template {
        triggers: &[Trigger::Any(&["mato grosso", " ms ", "campo grande"])],
        when_unmatched: true,
        title: "Informações Gerais sobre Mato Grosso do Sul",
        url: "https://ms.gov.br",
        content: "Mato Grosso do Sul é um estado do Centro-Oeste brasileiro conhecido pelo Pantanal, por Bonito e por Campo Grande, a capital. O turismo ecológico e o agronegócio movem a economia.",
        source: "ms.gov.br",
        reliability: Reliability::High,
        confidence: 95.0,
        is_official: true,
        categories: REAL_DATA,
    },
];

// ---------------------------------------------------------------------------
// Official sites
// ---------------------------------------------------------------------------

static OFFICIAL: &[Template] = &[
    Template {
        triggers: &[Trigger::Any(&[
            "aeroporto",
            "ônibus",
            "onibus",
            "terminal",
            "rodoviário",
            "rodoviario",
        ])],
        when_unmatched: false,
        title: "Terminal Rodoviário de Campo Grande - Informações Oficiais",
        url: "https://campogrande.ms.gov.br/terminal-rodoviario",
        content: "O Terminal Rodoviário de Campo Grande fica na Rua Joaquim Nabuco, 155 - Centro. Horários de linhas interestaduais e locais devem ser confirmados com as empresas de transporte. Principais linhas: São Paulo, Brasília, Cuiabá, Dourados.",
        source: "campogrande.ms.gov.br",
        reliability: Reliability::High,
        confidence: 95.0,
        is_official: true,
        categories: &["transport", "terminal"],
    },
    Template {
        triggers: &[Trigger::Any(&["hotel", "hospedagem", "pousada"])],
        when_unmatched: false,
        title: "Hospedagem em MS - Fundtur",
        url: "https://fundtur.ms.gov.br/hospedagem",
        content: "Campo Grande concentra hotéis no centro e perto do aeroporto; em Bonito predominam pousadas próximas aos atrativos. Reservas são feitas direto com os estabelecimentos ou em plataformas como Booking.com.",
        source: "fundtur.ms.gov.br",
        reliability: Reliability::High,
        confidence: 95.0,
        is_official: true,
        categories: &["hotel", "accommodation"],
    },
    Template {
        triggers: &[Trigger::Any(&[
            "bonito", "atração", "atracao", "atrações", "passeio", "gruta", " rio ",
        ])],
        when_unmatched: false,
        title: "Atrações de Bonito - Prefeitura",
        url: "https://bonito.ms.gov.br/turismo",
        content: "Principais atrações turísticas de Bonito: Gruta do Lago Azul, Rio da Prata, Rio Sucuri, Buraco das Araras. A maioria exige agendamento prévio por agências locais credenciadas.",
        source: "bonito.ms.gov.br",
        reliability: Reliability::High,
        confidence: 98.0,
        is_official: true,
        categories: &["attraction", "tourism"],
    },
    Template {
        triggers: &[Trigger::Any(&["bioparque", "aquário", "aquario", "pantanal"])],
        when_unmatched: false,
        title: "Bioparque Pantanal - Informações Oficiais",
        url: "https://bioparque.com.br",
        content: "Bioparque Pantanal em Campo Grande: maior aquário de água doce do mundo. Horário: terça a domingo, das 8h às 17h. Entrada gratuita. Localizado na Av. Afonso Pena, 6001. Para informações: (67) 3318-6000.",
        source: "bioparque.com.br",
        reliability: Reliability::High,
        confidence: 98.0,
        is_official: true,
        categories: &["attraction", "aquarium", "free"],
    },
    Template {
        triggers: &[Trigger::Any(&["feira central", "sobá", "soba"])],
        when_unmatched: false,
        title: "Feira Central de Campo Grande - Prefeitura",
        url: "https://campogrande.ms.gov.br/feira-central",
        content: "A Feira Central reúne barracas de sobá, espetinhos e artesanato regional. Funciona de quarta a sexta das 16h às 23h e aos sábados e domingos das 11h às 23h.",
        source: "campogrande.ms.gov.br",
        reliability: Reliability::High,
        confidence: 90.0,
        is_official: true,
        categories: &["food", "culture"],
    },
    Template {
        triggers: &[],
        when_unmatched: true,
        title: "Turismo em Mato Grosso do Sul - Fundtur",
        url: "https://fundtur.ms.gov.br",
        content: "Mato Grosso do Sul oferece destinos únicos como Bonito (ecoturismo), Pantanal (observação da fauna) e Campo Grande (centro urbano). Para informações específicas, consulte a Fundtur MS ou agências de turismo locais.",
        source: "fundtur.ms.gov.br",
        reliability: Reliability::High,
        confidence: 85.0,
        is_official: true,
        categories: &["general", "tourism"],
    },
];

// ---------------------------------------------------------------------------
// Tourism sites
// ---------------------------------------------------------------------------

static TOURISM: &[Template] = &[
    Template {
        triggers: &[Trigger::Any(&[
            "restaurante",
            "comida",
            "comer",
            "gastronomia",
            "feira central",
        ])],
        when_unmatched: false,
        title: "Restaurantes em Campo Grande - TripAdvisor",
        url: "https://tripadvisor.com/restaurants-campo-grande",
        content: "Restaurantes bem avaliados: Feira Central em Campo Grande (sobá, quarta a domingo), casas de peixe em Bonito e restaurantes pantaneiros em Corumbá. Confirme horários direto com os estabelecimentos.",
        source: "tripadvisor.com",
        reliability: Reliability::Medium,
        confidence: 85.0,
        is_official: false,
        categories: &["restaurant", "food"],
    },
    Template {
        triggers: &[Trigger::Any(&[
            "agência",
            "agencia",
            "passeio",
            "excursão",
            "excursao",
            "tour",
        ])],
        when_unmatched: false,
        title: "Agências de Turismo em MS",
        url: "https://fundtur.ms.gov.br/agencias",
        content: "Passeios no Pantanal e em Bonito devem ser contratados com agências locais cadastradas. A Fundtur MS mantém a lista completa de agências credenciadas.",
        source: "fundtur.ms.gov.br",
        reliability: Reliability::High,
        confidence: 90.0,
        is_official: true,
        categories: &["agency", "tour"],
    },
    Template {
        triggers: &[Trigger::Any(&[
            "evento", "festival", "cultura", "música", "musica", "show",
        ])],
        when_unmatched: false,
        title: "Eventos e Cultura em MS",
        url: "https://ms.gov.br/eventos",
        content: "Principais eventos de MS: Festival de Inverno de Bonito (julho-agosto), Festa do Peixe Pintado em Corumbá e o Carnaval de Corumbá. A agenda atualizada fica nos sites oficiais das cidades.",
        source: "ms.gov.br",
        reliability: Reliability::High,
        confidence: 85.0,
        is_official: true,
        categories: &["event", "culture"],
    },
];

// ---------------------------------------------------------------------------
// Review sites
// ---------------------------------------------------------------------------

static REVIEW: &[Template] = &[
    Template {
        triggers: &[
            Trigger::Any(&["bioparque"]),
            Trigger::All(&["pantanal", "aquário"]),
            Trigger::All(&["pantanal", "aquario"]),
        ],
        when_unmatched: false,
        title: "Bioparque Pantanal - Reviews Google",
        url: "https://google.com/maps/bioparque-pantanal",
        content: "Bioparque Pantanal em Campo Grande: avaliação 4.8/5 (1250+ reviews). Maior aquário de água doce do mundo. Horário: terça a domingo, 8h às 17h. Entrada gratuita. Estacionamento disponível.",
        source: "google.com",
        reliability: Reliability::Medium,
        confidence: 90.0,
        is_official: false,
        categories: &["attraction", "aquarium", "review"],
    },
    Template {
        triggers: &[Trigger::Any(&["gruta", "lago azul"])],
        when_unmatched: false,
        title: "Gruta do Lago Azul - Reviews TripAdvisor",
        url: "https://tripadvisor.com/gruta-lago-azul-bonito",
        content: "Gruta do Lago Azul em Bonito: avaliação 4.7/5. Visitas das 8h às 14h com agendamento prévio obrigatório. Monumento natural tombado.",
        source: "tripadvisor.com",
        reliability: Reliability::Medium,
        confidence: 88.0,
        is_official: false,
        categories: &["attraction", "cave", "review"],
    },
];

// ---------------------------------------------------------------------------
// News sites
// ---------------------------------------------------------------------------

static NEWS: &[Template] = &[
    Template {
        triggers: &[Trigger::Any(&["evento", "festival", "festa"])],
        when_unmatched: false,
        title: "Calendário de Eventos MS - Portal MS",
        url: "https://ms.gov.br/eventos",
        content: "Calendário de eventos de MS: Festival de Inverno de Bonito (julho), Festa do Peixe Pintado em Corumbá (setembro), Carnaval de Corumbá (fevereiro). Consulte os sites oficiais para as datas exatas.",
        source: "ms.gov.br",
        reliability: Reliability::High,
        confidence: 92.0,
        is_official: true,
        categories: &["event", "culture", "calendar"],
    },
    Template {
        triggers: &[Trigger::Any(&["novidade", " novo ", " nova ", "notícia", "noticia"])],
        when_unmatched: false,
        title: "Novidades do Turismo em MS - Campo Grande News",
        url: "https://campograndenews.com.br/turismo",
        content: "O turismo em MS segue em alta: novas pousadas em Bonito, melhorias de infraestrutura no Pantanal e o Bioparque como atração gratuita mais visitada da capital.",
        source: "campograndenews.com.br",
        reliability: Reliability::Medium,
        confidence: 80.0,
        is_official: false,
        categories: &["news", "tourism"],
    },
];

// ---------------------------------------------------------------------------
// Social media
// ---------------------------------------------------------------------------

static SOCIAL: &[Template] = &[
    Template {
        triggers: &[Trigger::Any(&["evento", "atual"])],
        when_unmatched: false,
        title: "Eventos Atuais em MS",
        url: "https://www.instagram.com/visitms",
        content: "Confira os eventos mais recentes no Instagram @visitms e @fundturms, atualizados com festivais, shows e eventos culturais.",
        source: "instagram.com/visitms",
        reliability: Reliability::Medium,
        confidence: 85.0,
        is_official: false,
        categories: &["event", "social"],
    },
    Template {
        triggers: &[Trigger::Any(&["bioparque"])],
        when_unmatched: false,
        title: "Bioparque Pantanal no Instagram",
        url: "https://www.instagram.com/bioparque",
        content: "Avisos de funcionamento, agendamento e novidades do Bioparque Pantanal são publicados no Instagram @bioparque.",
        source: "instagram.com/bioparque",
        reliability: Reliability::Medium,
        confidence: 75.0,
        is_official: false,
        categories: &["attraction", "social"],
    },
    Template {
        triggers: &[Trigger::Any(&["bonito"])],
        when_unmatched: false,
        title: "Bonito no Instagram",
        url: "https://www.instagram.com/fundturms",
        content: "Fotos recentes dos rios e grutas de Bonito e dicas de temporada aparecem no Instagram @fundturms e @visitms.",
        source: "instagram.com/fundturms",
        reliability: Reliability::Medium,
        confidence: 70.0,
        is_official: false,
        categories: &["attraction", "social"],
    },
];

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn sources(outcome: &SearchOutcome) -> Vec<&str> {
        outcome.results().iter().map(|r| r.source.as_str()).collect()
    }

    #[tokio::test]
    async fn bioparque_yields_official_site_candidate() {
        let outcome = TemplateSearcher::official().search("horário do bioparque").await;
        let hit = outcome
            .results()
            .iter()
            .find(|r| r.source == "bioparque.com.br")
            .expect("bioparque candidate");
        assert!(hit.is_official);
        assert_eq!(hit.confidence, 98.0);
    }

    #[tokio::test]
    async fn official_falls_back_to_fundtur() {
        let outcome = TemplateSearcher::official().search("oi").await;
        assert_eq!(sources(&outcome), vec!["fundtur.ms.gov.br"]);
        assert_eq!(outcome.results()[0].confidence, 85.0);
    }

    #[tokio::test]
    async fn structured_data_is_tagged() {
        let outcome = TemplateSearcher::structured_data().search("Bioparque").await;
        assert_eq!(sources(&outcome), vec!["bioparque.com.br"]);
        let result = &outcome.results()[0];
        assert!(result.has_category(TAG_VERIFIED));
        assert!(result.has_category(TAG_REAL_DATA));
        assert_eq!(result.reliability, Reliability::High);
    }

    #[tokio::test]
    async fn structured_general_info_when_nothing_matched() {
        let outcome = TemplateSearcher::structured_data().search("oi").await;
        assert_eq!(sources(&outcome), vec!["ms.gov.br"]);
    }

    #[tokio::test]
    async fn structured_general_info_added_for_campo_grande() {
        let outcome = TemplateSearcher::structured_data()
            .search("aquário em Campo Grande")
            .await;
        assert_eq!(sources(&outcome), vec!["bioparque.com.br", "ms.gov.br"]);
    }

    #[test_case("restaurante bom", "tourism", &["tripadvisor.com"] ; "tourism food")]
    #[test_case("passeio de barco", "tourism", &["fundtur.ms.gov.br"] ; "tourism agency")]
    #[test_case("gruta do lago azul", "review", &["tripadvisor.com"] ; "review cave")]
    #[test_case("festival de inverno", "news", &["ms.gov.br"] ; "news events")]
    #[test_case("alguma novidade?", "news", &["campograndenews.com.br"] ; "news novelty")]
    #[test_case("eventos hoje", "social", &["instagram.com/visitms"] ; "social events")]
    #[test_case("bom dia", "review", &[] ; "review nothing")]
    #[tokio::test]
    async fn template_tables(query: &str, searcher: &str, expected: &[&str]) {
        let searcher = match searcher {
            "tourism" => TemplateSearcher::tourism(),
            "review" => TemplateSearcher::review(),
            "news" => TemplateSearcher::news(),
            _ => TemplateSearcher::social(),
        };
        let outcome = searcher.search(query).await;
        assert_eq!(sources(&outcome), expected.to_vec());
    }

    #[test]
    fn every_template_is_well_formed() {
        for searcher in [
            TemplateSearcher::structured_data(),
            TemplateSearcher::official(),
            TemplateSearcher::tourism(),
            TemplateSearcher::review(),
            TemplateSearcher::news(),
            TemplateSearcher::social(),
        ] {
            for t in searcher.table() {
                assert!(!t.content.is_empty(), "{}", t.title);
                assert!(t.url.starts_with("https://"), "{}", t.url);
                assert!((0.0..=100.0).contains(&t.confidence));
                assert!(!t.triggers.is_empty() || t.when_unmatched, "{}", t.title);
            }
        }
    }

    #[test]
    fn fan_out_order_is_stable() {
        let names: Vec<String> = template_searchers()
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["structured", "official", "tourism", "review", "news", "social"]
        );
    }
}
