//! Flow expander: a question carrying a conversation flow becomes a triad of
//! pre-check, open question and clustered choice, always in that order.

use tracing::info;

use questionbuilder_shared::{Condition, ConversationFlow, Question, QuestionType};

pub const PRE_CHECK_SUFFIX: &str = "_pre_check";
pub const OPEN_SUFFIX: &str = "_open";

const PRE_CHECK_HELP: &str = "Diese Frage hilft uns, den Dialog effizienter zu gestalten";
const FUZZY_CONTEXT: &str = "Fuzzy-Matching erlaubt - auch ähnliche Begriffe akzeptieren";

/// Position of a question inside its triad: pre-check 0, open 1, base 2.
pub fn triad_position(id: &str) -> u8 {
    if id.ends_with(PRE_CHECK_SUFFIX) {
        0
    } else if id.ends_with(OPEN_SUFFIX) {
        1
    } else {
        2
    }
}

/// Id with a triad suffix removed.
pub fn base_id(id: &str) -> &str {
    id.strip_suffix(PRE_CHECK_SUFFIX)
        .or_else(|| id.strip_suffix(OPEN_SUFFIX))
        .unwrap_or(id)
}

/// Expand every question with a conversation flow; others pass through.
pub fn expand_conversational_flows(questions: Vec<Question>) -> Vec<Question> {
    let original = questions.len();
    let mut conversational = 0usize;
    let mut expanded = Vec::with_capacity(original + 4);

    for question in questions {
        match question.conversation_flow.clone() {
            Some(flow) => {
                conversational += 1;
                expanded.extend(expand_one(question, flow));
            }
            None => expanded.push(question),
        }
    }

    info!(
        original,
        expanded = expanded.len(),
        conversational,
        "conversational flows expanded"
    );
    expanded
}

fn expand_one(base: Question, flow: ConversationFlow) -> [Question; 3] {
    let pre_check_id = format!("{}{PRE_CHECK_SUFFIX}", base.id);
    let open_id = format!("{}{OPEN_SUFFIX}", base.id);

    let pre_check = Question {
        id: pre_check_id.clone(),
        question: flow.pre_check.question.clone(),
        kind: QuestionType::Boolean,
        options: None,
        conversation_flow: None,
        required: base.required,
        priority: base.priority,
        group: base.group,
        help_text: Some(PRE_CHECK_HELP.to_string()),
        input_hint: None,
        conditions: Vec::new(),
        source: base.source.clone(),
        context: None,
        category: None,
        category_order: None,
    };

    let open = Question {
        id: open_id.clone(),
        question: flow.open_question.question.clone(),
        kind: QuestionType::String,
        options: None,
        conversation_flow: None,
        required: false,
        priority: base.priority,
        group: base.group,
        help_text: None,
        input_hint: base.input_hint.clone(),
        conditions: vec![Condition::ask_when_eq(pre_check_id.clone(), true)],
        source: base.source.clone(),
        context: flow
            .open_question
            .allow_fuzzy_match
            .then(|| FUZZY_CONTEXT.to_string()),
        category: None,
        category_order: None,
    };

    let choice = Question {
        question: flow.clustered_options.presentation_hint.clone(),
        kind: QuestionType::Choice,
        required: false,
        help_text: None,
        conditions: vec![
            Condition::ask_when_eq(pre_check_id, false),
            Condition::skip_when_exists(open_id),
        ],
        context: None,
        conversation_flow: Some(flow),
        ..base
    };

    [pre_check, open, choice]
}

#[cfg(test)]
mod tests {
    use super::*;
    use questionbuilder_shared::{
        ClusteredOptions, ConditionAction, ConditionOp, Group, OpenQuestion, PreCheck, Priority,
        QuestionSource,
    };
    use serde_json::json;

    fn flow(fuzzy: bool) -> ConversationFlow {
        ConversationFlow {
            pre_check: PreCheck {
                question: "Wissen Sie schon, in welchem Bereich?".into(),
                on_yes: "open_question".into(),
                on_no: "clustered_options".into(),
            },
            open_question: OpenQuestion {
                question: "In welchem Bereich?".into(),
                allow_fuzzy_match: fuzzy,
                on_unclear: "clustered_options".into(),
            },
            clustered_options: ClusteredOptions {
                presentation_hint: "Wir haben Chirurgie, Innere und Intensiv.".into(),
                categories: vec![],
            },
        }
    }

    fn bereich() -> Question {
        Question::new(
            "bereich",
            "In welcher Fachabteilung?",
            QuestionType::Choice,
            true,
            Priority::HIGH,
            Group::Einsatzbereich,
        )
        .with_options(["Chirurgie", "Innere", "Intensiv"])
        .with_input_hint("Bitte eine Abteilung nennen.")
        .with_source(QuestionSource {
            page_id: Some(3),
            prompt_id: Some(9),
            verbatim: true,
        })
    }

    #[test]
    fn expands_into_ordered_triad() {
        let mut q = bereich();
        q.conversation_flow = Some(flow(true));
        let plain = Question::new(
            "adresse",
            "Adresse?",
            QuestionType::String,
            true,
            Priority::HIGH,
            Group::Kontakt,
        );

        let out = expand_conversational_flows(vec![q, plain]);
        let ids: Vec<_> = out.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["bereich_pre_check", "bereich_open", "bereich", "adresse"]);

        let pre = &out[0];
        assert_eq!(pre.kind, QuestionType::Boolean);
        assert!(pre.required);
        assert!(pre.conditions.is_empty());
        assert_eq!(pre.source.as_ref().unwrap().page_id, Some(3));
        assert!(pre.help_text.is_some());

        let open = &out[1];
        assert_eq!(open.kind, QuestionType::String);
        assert!(!open.required);
        assert_eq!(open.conditions.len(), 1);
        assert_eq!(open.conditions[0].when.field, "bereich_pre_check");
        assert_eq!(open.conditions[0].when.op, ConditionOp::Eq);
        assert_eq!(open.conditions[0].when.value, Some(json!(true)));
        assert_eq!(open.context.as_deref(), Some(FUZZY_CONTEXT));
        assert_eq!(open.input_hint.as_deref(), Some("Bitte eine Abteilung nennen."));

        let base = &out[2];
        assert_eq!(base.kind, QuestionType::Choice);
        assert!(!base.required);
        assert_eq!(base.option_count(), 3);
        assert_eq!(base.question, "Wir haben Chirurgie, Innere und Intensiv.");
        assert_eq!(base.conditions[0].when.value, Some(json!(false)));
        assert_eq!(base.conditions[1].when.field, "bereich_open");
        assert_eq!(base.conditions[1].when.op, ConditionOp::Exists);
        assert_eq!(base.conditions[1].then.action, ConditionAction::Skip);
        assert!(base.conversation_flow.is_some());
    }

    #[test]
    fn no_fuzzy_context_without_fuzzy_matching() {
        let mut q = bereich();
        q.conversation_flow = Some(flow(false));
        let out = expand_conversational_flows(vec![q]);
        assert!(out[1].context.is_none());
    }

    #[test]
    fn questions_without_flow_pass_through() {
        let out = expand_conversational_flows(vec![bereich()]);
        assert_eq!(out, vec![bereich()]);
    }

    #[test]
    fn base_id_and_position() {
        assert_eq!(base_id("bereich_pre_check"), "bereich");
        assert_eq!(base_id("bereich_open"), "bereich");
        assert_eq!(base_id("bereich"), "bereich");
        assert_eq!(triad_position("bereich_pre_check"), 0);
        assert_eq!(triad_position("bereich_open"), 1);
        assert_eq!(triad_position("bereich"), 2);
    }
}
