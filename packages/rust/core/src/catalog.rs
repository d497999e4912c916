//! End-to-end catalog build: protocol → facts → questions → catalog.

use std::time::Instant;

use tracing::{info, instrument};

use questionbuilder_llm::{Extractor, FlowSynthesizer};
use questionbuilder_shared::{
    CandidateProfile, CatalogConfig, CatalogMeta, ConversationProtocol, ExtractResult,
    MAX_CATALOG_QUESTIONS, Question, QuestionCatalog, Result,
};

use crate::categorizer::categorize_questions;
use crate::expand::expand_conversational_flows;
use crate::flow::apply_conversational_flows;
use crate::inject::template_variables;
use crate::preprocess::clean_protocol;
use crate::rules::{RuleContext, apply_rules};
use crate::schema::validate_catalog;
use crate::structure::{build_questions, build_questions_template};

/// How applicant data enters the catalog.
#[derive(Debug, Clone)]
pub enum BuildMode {
    /// Real applicant values are written into the question texts.
    Literal(CandidateProfile),
    /// `{{placeholder}}` tokens are emitted, resolved later by injection.
    Templated,
}

impl BuildMode {
    /// Whether the address question can be a confirmation.
    fn address_known(&self) -> bool {
        match self {
            Self::Literal(profile) => profile
                .address_full
                .as_deref()
                .is_some_and(|a| !a.trim().is_empty()),
            Self::Templated => true,
        }
    }
}

/// Progress callback for reporting build status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the catalog is validated.
    fn done(&self, catalog: &QuestionCatalog);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _catalog: &QuestionCatalog) {}
}

/// Run the full build for one protocol.
///
/// 1. Clean the protocol
/// 2. Extract facts
/// 3. Compile, wrap and validate the catalog
#[instrument(skip_all, fields(protocol = %protocol.name, templated = matches!(mode, BuildMode::Templated)))]
pub async fn build_catalog(
    protocol: ConversationProtocol,
    mode: &BuildMode,
    extractor: &dyn Extractor,
    synthesizer: &dyn FlowSynthesizer,
    config: &CatalogConfig,
    progress: &dyn ProgressReporter,
) -> Result<QuestionCatalog> {
    progress.phase("Cleaning protocol");
    let protocol = clean_protocol(protocol)?;

    progress.phase("Extracting facts");
    let start = Instant::now();
    let extr = extractor.extract(&protocol).await?;
    info!(
        sites = extr.sites.len(),
        departments = extr.all_departments.len(),
        priorities = extr.priorities.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "facts extracted"
    );

    compile_catalog(&extr, mode, synthesizer, config, progress).await
}

/// Build the catalog from already extracted facts.
#[instrument(skip_all, fields(max_questions = config.max_questions))]
pub async fn compile_catalog(
    extr: &ExtractResult,
    mode: &BuildMode,
    synthesizer: &dyn FlowSynthesizer,
    config: &CatalogConfig,
    progress: &dyn ProgressReporter,
) -> Result<QuestionCatalog> {
    progress.phase("Structuring questions");
    let questions = match mode {
        BuildMode::Literal(profile) => build_questions(extr, profile),
        BuildMode::Templated => build_questions_template(extr),
    };

    progress.phase("Building conversational flows");
    let questions = apply_conversational_flows(
        questions,
        synthesizer,
        config.flow_option_threshold,
        &extr.priorities,
    )
    .await;

    progress.phase("Finalizing catalog");
    let max_questions = config.max_questions.min(MAX_CATALOG_QUESTIONS);
    let questions = finalize_questions(extr, mode, questions, max_questions);

    let catalog = QuestionCatalog {
        meta: CatalogMeta::now(config),
        questions,
    };
    validate_catalog(&catalog)?;

    info!(
        total_questions = catalog.questions.len(),
        conversational_questions = catalog.conversational_count(),
        "catalog built"
    );
    if matches!(mode, BuildMode::Templated) {
        info!(variables = ?template_variables(&catalog), "template variables");
    }

    progress.done(&catalog);
    Ok(catalog)
}

/// Expansion, rules and categorization over a structured question list.
pub fn finalize_questions(
    extr: &ExtractResult,
    mode: &BuildMode,
    questions: Vec<Question>,
    max_questions: usize,
) -> Vec<Question> {
    let questions = expand_conversational_flows(questions);
    let ctx = RuleContext::new(extr, mode.address_known(), max_questions);
    let questions = apply_rules(&ctx, questions);
    categorize_questions(questions)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use questionbuilder_llm::{FixtureExtractor, FixtureFlowSynthesizer};
    use questionbuilder_shared::{
        Category, ConditionOp, FlowProposal, Group, Page, Priority, Prompt, QuestionType,
    };
    use serde_json::json;

    const EXTRACT_FIXTURE: &str = "../../../fixtures/json/extract.json";
    const FLOWS_FIXTURE: &str = "../../../fixtures/json/flows.json";

    fn berlin_facts() -> ExtractResult {
        serde_json::from_value(json!({
            "sites": [{"label": "Berlin"}],
            "all_departments": ["Kardiologie", "OP", "Intensiv"],
            "must_have": ["pflegefachkraft"],
            "alternatives": ["MFA"],
            "priorities": [{"label": "Onkologie", "reason": "x", "prio_level": 1}]
        }))
        .unwrap()
    }

    fn fixture_facts() -> ExtractResult {
        let content = std::fs::read_to_string(EXTRACT_FIXTURE).unwrap();
        questionbuilder_llm::parse_extract_content(&content).unwrap()
    }

    fn ids(catalog: &QuestionCatalog) -> Vec<&str> {
        catalog.questions.iter().map(|q| q.id.as_str()).collect()
    }

    fn find<'a>(catalog: &'a QuestionCatalog, id: &str) -> &'a Question {
        catalog
            .questions
            .iter()
            .find(|q| q.id == id)
            .unwrap_or_else(|| panic!("missing question {id}"))
    }

    async fn compile(
        extr: &ExtractResult,
        mode: BuildMode,
        synth: &FixtureFlowSynthesizer,
    ) -> QuestionCatalog {
        compile_catalog(extr, &mode, synth, &CatalogConfig::default(), &SilentProgress)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn berlin_scenario() {
        let synth = FixtureFlowSynthesizer::unavailable();
        let catalog = compile(
            &berlin_facts(),
            BuildMode::Literal(CandidateProfile::default()),
            &synth,
        )
        .await;

        assert_eq!(synth.calls(), 0);
        assert!(!ids(&catalog).contains(&"standort_wahl"));

        let site = find(&catalog, "standort_bestaetigung");
        assert_eq!(site.kind, QuestionType::Boolean);
        assert!(site.question.contains("Berlin"));

        let dept = find(&catalog, "bereich");
        assert_eq!(dept.kind, QuestionType::Choice);
        assert_eq!(dept.option_count(), 3);

        let exam = find(&catalog, "examen_pflege");
        assert_eq!(exam.kind, QuestionType::Boolean);
        assert!(exam.required);
        assert_eq!(exam.category, Some(Category::Standardqualifikationen));

        let mfa = find(&catalog, "op_mfa_alternative");
        assert_eq!(mfa.kind, QuestionType::Boolean);
        assert_eq!(mfa.conditions.len(), 1);
        assert_eq!(mfa.conditions[0].when.field, "bereich");
        assert_eq!(mfa.conditions[0].when.op, ConditionOp::In);
        assert_eq!(
            mfa.conditions[0].when.value,
            Some(json!(["OP", "Anästhesie", "Endoskopie"]))
        );

        assert_eq!(find(&catalog, "prio_onkologie").priority, Priority::HIGH);
        assert_eq!(catalog.questions.last().map(|q| q.id.as_str()), Some("adresse"));
    }

    #[tokio::test]
    async fn single_option_becomes_boolean() {
        let mut facts = berlin_facts();
        facts.all_departments = vec!["Nord".into()];
        let catalog = compile(
            &facts,
            BuildMode::Literal(CandidateProfile::default()),
            &FixtureFlowSynthesizer::unavailable(),
        )
        .await;

        let dept = find(&catalog, "bereich");
        assert_eq!(dept.kind, QuestionType::Boolean);
        assert_eq!(dept.question, "Möchten Sie im Bereich Nord arbeiten?");
        assert!(dept.options.is_none());
    }

    #[tokio::test]
    async fn site_branching() {
        let synth = FixtureFlowSynthesizer::unavailable();

        let mut none = berlin_facts();
        none.sites.clear();
        let catalog = compile(&none, BuildMode::Templated, &synth).await;
        let site_ids: Vec<_> = ids(&catalog)
            .into_iter()
            .filter(|id| id.starts_with("standort"))
            .collect();
        assert_eq!(site_ids, vec!["standort_erfragen"]);
        assert_eq!(find(&catalog, "standort_erfragen").kind, QuestionType::String);

        let mut two = berlin_facts();
        two.sites = serde_json::from_value(json!([{"label": "Nord"}, {"label": "Süd"}])).unwrap();
        let catalog = compile(&two, BuildMode::Templated, &synth).await;
        let choice = find(&catalog, "standort_wahl");
        assert_eq!(choice.kind, QuestionType::Choice);
        assert_eq!(choice.options, Some(vec!["Nord".to_string(), "Süd".to_string()]));
    }

    #[tokio::test]
    async fn triads_are_ordered_pre_check_open_base() {
        let synth = FixtureFlowSynthesizer::from_file(Path::new(FLOWS_FIXTURE)).unwrap();
        let catalog = compile(&fixture_facts(), BuildMode::Templated, &synth).await;

        assert_eq!(synth.calls(), 1);
        assert_eq!(catalog.conversational_count(), 1);

        let order = ids(&catalog);
        let pos = |id: &str| order.iter().position(|x| *x == id).unwrap();
        assert_eq!(pos("bereich_open"), pos("bereich_pre_check") + 1);
        assert_eq!(pos("bereich"), pos("bereich_open") + 1);

        let pre = find(&catalog, "bereich_pre_check");
        assert_eq!(pre.kind, QuestionType::Boolean);
        let base = find(&catalog, "bereich");
        assert!(base.conversation_flow.is_some());
        assert_eq!(base.conditions.len(), 2);
    }

    #[tokio::test]
    async fn degraded_mode_has_no_flows() {
        let synth = FixtureFlowSynthesizer::unavailable();
        let facts = fixture_facts();
        let catalog = compile(&facts, BuildMode::Templated, &synth).await;

        assert_eq!(synth.calls(), 1);
        assert_eq!(catalog.conversational_count(), 0);
        assert!(!ids(&catalog).contains(&"bereich_pre_check"));
        assert_eq!(
            find(&catalog, "bereich").option_count(),
            facts.all_departments.len()
        );
    }

    #[tokio::test]
    async fn catalog_is_capped() {
        let mut facts = berlin_facts();
        facts.priorities = (0..30)
            .map(|i| {
                serde_json::from_value(json!({"label": format!("Station {i:02}"), "prio_level": 2}))
                    .unwrap()
            })
            .collect();

        let mut config = CatalogConfig::default();
        let catalog = compile_catalog(
            &facts,
            &BuildMode::Templated,
            &FixtureFlowSynthesizer::unavailable(),
            &config,
            &SilentProgress,
        )
        .await
        .unwrap();
        assert_eq!(catalog.questions.len(), 20);

        config.max_questions = 5;
        let catalog = compile_catalog(
            &facts,
            &BuildMode::Templated,
            &FixtureFlowSynthesizer::unavailable(),
            &config,
            &SilentProgress,
        )
        .await
        .unwrap();
        assert_eq!(catalog.questions.len(), 5);
        assert_eq!(catalog.questions[0].group, Some(Group::Standort));
        assert!(catalog.questions.iter().all(|q| q.group != Some(Group::Kontakt)));
    }

    #[tokio::test]
    async fn cap_never_exceeds_catalog_limit() {
        let mut facts = berlin_facts();
        facts.priorities = (0..30)
            .map(|i| {
                serde_json::from_value(json!({"label": format!("Station {i:02}"), "prio_level": 2}))
                    .unwrap()
            })
            .collect();
        let config = CatalogConfig {
            max_questions: 50,
            ..CatalogConfig::default()
        };
        let catalog = compile_catalog(
            &facts,
            &BuildMode::Templated,
            &FixtureFlowSynthesizer::unavailable(),
            &config,
            &SilentProgress,
        )
        .await
        .unwrap();
        assert_eq!(catalog.questions.len(), MAX_CATALOG_QUESTIONS);
    }

    #[tokio::test]
    async fn flow_for_single_option_department_is_ignored() {
        let mut facts = berlin_facts();
        facts.sites = serde_json::from_value(json!([{"label": "Nord"}, {"label": "Süd"}])).unwrap();
        facts.all_departments = vec!["OP".into()];
        let flow = |id: &str| -> FlowProposal {
            serde_json::from_value(json!({
                "question_id": id,
                "pre_check": {"question": "Haben Sie schon einen Wunsch?"},
                "open_question": {"question": "Wo genau?"},
                "clustered_options": {"presentation_hint": "Zwei Standorte."}
            }))
            .unwrap()
        };
        let synth = FixtureFlowSynthesizer::new(vec![flow("standort_wahl"), flow("bereich")]);
        let catalog = compile(&facts, BuildMode::Templated, &synth).await;

        let dept = find(&catalog, "bereich");
        assert_eq!(dept.kind, QuestionType::Boolean);
        assert!(dept.conversation_flow.is_none());
        assert!(!ids(&catalog).contains(&"bereich_pre_check"));

        assert!(find(&catalog, "standort_wahl").conversation_flow.is_some());
        assert!(ids(&catalog).contains(&"standort_wahl_pre_check"));
        assert!(ids(&catalog).contains(&"standort_wahl_open"));
    }

    #[tokio::test]
    async fn priority_named_open_survives() {
        let mut facts = berlin_facts();
        facts.priorities =
            serde_json::from_value(json!([{"label": "Open", "reason": "x", "prio_level": 2}]))
                .unwrap();
        let catalog = compile(
            &facts,
            BuildMode::Literal(CandidateProfile::default()),
            &FixtureFlowSynthesizer::unavailable(),
        )
        .await;
        assert!(ids(&catalog).contains(&"prio_open"));
    }

    #[tokio::test]
    async fn templated_catalog_lists_variables() {
        let catalog = compile(
            &berlin_facts(),
            BuildMode::Templated,
            &FixtureFlowSynthesizer::unavailable(),
        )
        .await;
        let vars = template_variables(&catalog);
        assert!(vars.contains(&"candidatefirst_name".to_string()));
        assert!(vars.contains(&"postal_code".to_string()));
        assert_eq!(find(&catalog, "name_confirmation").category, Some(Category::Identifikation));
    }

    #[tokio::test]
    async fn build_catalog_cleans_and_extracts() {
        let protocol = ConversationProtocol {
            id: 7,
            name: "Pflege".into(),
            pages: vec![Page {
                id: 1,
                name: "Kriterien".into(),
                position: 1,
                prompts: vec![Prompt {
                    id: 1,
                    position: 1,
                    question: "1. Examen vorhanden?".into(),
                    checked: None,
                    information: None,
                    is_template: None,
                }],
            }],
        };
        let extractor = FixtureExtractor::new(berlin_facts());
        let catalog = build_catalog(
            protocol,
            &BuildMode::Literal(CandidateProfile::default()),
            &extractor,
            &FixtureFlowSynthesizer::unavailable(),
            &CatalogConfig::default(),
            &SilentProgress,
        )
        .await
        .unwrap();
        assert!(validate_catalog(&catalog).is_ok());
        assert_eq!(catalog.meta.schema_version, "1.0");
    }

    #[tokio::test]
    async fn empty_protocol_is_rejected() {
        let protocol = ConversationProtocol {
            id: 1,
            name: String::new(),
            pages: vec![],
        };
        let result = build_catalog(
            protocol,
            &BuildMode::Templated,
            &FixtureExtractor::new(berlin_facts()),
            &FixtureFlowSynthesizer::unavailable(),
            &CatalogConfig::default(),
            &SilentProgress,
        )
        .await;
        assert!(result.is_err());
    }
}
