//! Question structurer: extracted facts → base question list.
//!
//! Literal and templated mode share [`protocol_questions`]; they differ only
//! in the contact questions around it.

use tracing::debug;

use questionbuilder_shared::{
    CandidateProfile, ExtractResult, Group, Priority, Question, QuestionSource, QuestionType,
};

use crate::text::{slug, strip_parentheticals};

pub const SITE_ASK_ID: &str = "standort_erfragen";
pub const SITE_CONFIRM_ID: &str = "standort_bestaetigung";
pub const SITE_CHOICE_ID: &str = "standort_wahl";
pub const DEPARTMENT_ID: &str = "bereich";
pub const NURSING_EXAM_ID: &str = "examen_pflege";
pub const MFA_ALTERNATIVE_ID: &str = "op_mfa_alternative";
pub const WORKING_TIME_ID: &str = "arbeitszeitmodell";
pub const SHIFTS_ID: &str = "schichten";
pub const PAY_SCALE_ID: &str = "tarif_info";
pub const ADDRESS_CONFIRM_ID: &str = "adresse_bestaetigen";
pub const ADDRESS_ASK_ID: &str = "adresse";
pub const NAME_CONFIRM_ID: &str = "name_confirmation";
pub const PRIORITY_ID_PREFIX: &str = "prio_";

const DEFAULT_DEPARTMENT_QUESTION: &str = "In welcher Fachabteilung möchten Sie gerne arbeiten?";
const SHIFT_OPTIONS: [&str; 5] = [
    "Früh",
    "Spät",
    "Nacht",
    "Wechsel",
    "individuelle Anpassungen möglich",
];

/// Id of the preference question for a priority label.
pub fn priority_question_id(label: &str) -> String {
    format!("{PRIORITY_ID_PREFIX}{}", slug(label))
}

/// Base questions with the applicant's real values.
pub fn build_questions(extr: &ExtractResult, candidate: &CandidateProfile) -> Vec<Question> {
    let mut questions = protocol_questions(extr);

    let address = match candidate.address_full.as_deref() {
        Some(addr) if !addr.trim().is_empty() => Question::new(
            ADDRESS_CONFIRM_ID,
            format!("Ich habe Ihre Adresse als {addr}. Ist das korrekt?"),
            QuestionType::Boolean,
            true,
            Priority::HIGH,
            Group::Kontakt,
        ),
        _ => Question::new(
            ADDRESS_ASK_ID,
            "Wie lautet Ihre genaue Adresse (Straße, Hausnummer, PLZ und Ort)?",
            QuestionType::String,
            true,
            Priority::HIGH,
            Group::Kontakt,
        )
        .with_source(QuestionSource {
            verbatim: true,
            ..QuestionSource::default()
        }),
    };
    questions.push(address);

    debug!(count = questions.len(), "structured literal questions");
    questions
}

/// Base questions with `{{placeholder}}` tokens instead of applicant values.
pub fn build_questions_template(extr: &ExtractResult) -> Vec<Question> {
    let mut questions = vec![
        Question::new(
            NAME_CONFIRM_ID,
            "Spreche ich mit {{candidatefirst_name}} {{candidatelast_name}}?",
            QuestionType::Boolean,
            true,
            Priority::HIGH,
            Group::Kontakt,
        )
        .with_context("Identifikation des Bewerbers"),
        Question::new(
            ADDRESS_CONFIRM_ID,
            "Ich habe Ihre Adresse als {{street}} {{house_number}}, {{postal_code}} {{city}}. Ist das korrekt?",
            QuestionType::Boolean,
            true,
            Priority::HIGH,
            Group::Kontakt,
        ),
    ];
    questions.extend(protocol_questions(extr));

    debug!(count = questions.len(), "structured template questions");
    questions
}

/// Questions derived from the protocol facts alone.
pub fn protocol_questions(extr: &ExtractResult) -> Vec<Question> {
    let mut q = Vec::new();

    q.push(site_question(extr));
    q.push(department_question(extr));

    if extr
        .must_have
        .iter()
        .any(|m| m.to_lowercase().contains("pflegefach"))
    {
        q.push(
            Question::new(
                NURSING_EXAM_ID,
                "Sind Sie examinierte Pflegefachfrau oder Pflegefachmann?",
                QuestionType::Boolean,
                true,
                Priority::HIGH,
                Group::Qualifikation,
            )
            .with_context("Muss-Kriterium aus Protokoll"),
        );
    }

    // Visibility condition is attached by the rule engine.
    if extr
        .alternatives
        .iter()
        .any(|a| a.to_lowercase().contains("mfa"))
    {
        q.push(Question::new(
            MFA_ALTERNATIVE_ID,
            "Wären Sie alternativ für den OP-Bereich mit einer MFA-Qualifizierungsmaßnahme offen?",
            QuestionType::Boolean,
            false,
            Priority::MEDIUM,
            Group::Qualifikation,
        ));
    }

    for prio in &extr.priorities {
        let source = prio.source.as_ref().map(|s| QuestionSource {
            page_id: s.page_id,
            prompt_id: s.prompt_id,
            verbatim: false,
        });
        let mut question = Question::new(
            priority_question_id(&prio.label),
            format!("Haben Sie besonderes Interesse am Bereich {}?", prio.label),
            QuestionType::Boolean,
            false,
            prio.prio_level,
            Group::Praeferenzen,
        )
        .with_help_text(prio.reason.clone());
        if let Some(source) = source {
            question = question.with_source(source);
        }
        q.push(question);
    }

    let hours = extr.constraints.arbeitszeit.clone().unwrap_or_default();
    let annotate = |model: &str, range: Option<&str>| match range {
        Some(r) if !r.trim().is_empty() => format!("{model} ({r})"),
        _ => model.to_string(),
    };
    q.push(
        Question::new(
            WORKING_TIME_ID,
            "Welches Arbeitszeitmodell bevorzugen Sie?",
            QuestionType::Choice,
            true,
            Priority::MEDIUM,
            Group::Rahmen,
        )
        .with_options([
            annotate("Vollzeit", hours.vollzeit.as_deref()),
            annotate("Teilzeit", hours.teilzeit.as_deref()),
        ]),
    );

    if let Some(shifts) = non_empty(extr.constraints.schichten.as_deref()) {
        q.push(
            Question::new(
                SHIFTS_ID,
                "Welche Schichten können Sie abdecken?",
                QuestionType::MultiChoice,
                false,
                Priority::MEDIUM,
                Group::Rahmen,
            )
            .with_options(SHIFT_OPTIONS)
            .with_help_text(shifts),
        );
    }

    if let Some(tarif) = non_empty(extr.constraints.tarif.as_deref()) {
        q.push(Question::new(
            PAY_SCALE_ID,
            format!(
                "Die Vergütung ist an den {tarif} angelehnt. Ist das für Sie grundsätzlich in Ordnung?"
            ),
            QuestionType::Boolean,
            false,
            Priority::LOW,
            Group::Rahmen,
        ));
    }

    q
}

fn site_question(extr: &ExtractResult) -> Question {
    match extr.sites.as_slice() {
        [] => Question::new(
            SITE_ASK_ID,
            "An welchem Standort möchten Sie arbeiten?",
            QuestionType::String,
            true,
            Priority::HIGH,
            Group::Standort,
        ),
        [site] => Question::new(
            SITE_CONFIRM_ID,
            format!("Unser Standort ist {}. Passt das für Sie?", site.label),
            QuestionType::Boolean,
            true,
            Priority::HIGH,
            Group::Standort,
        ),
        sites => Question::new(
            SITE_CHOICE_ID,
            "An welchem unserer Standorte möchten Sie gerne arbeiten?",
            QuestionType::Choice,
            true,
            Priority::HIGH,
            Group::Standort,
        )
        .with_options(sites.iter().map(|s| s.label.clone())),
    }
}

/// The department question. Uses a verbatim protocol line when one asks for
/// the department; without any known departments it degrades to free text.
fn department_question(extr: &ExtractResult) -> Question {
    // The source is verbatim only when the protocol wording survives cleanup.
    let verbatim = extr
        .verbatim_candidates
        .iter()
        .find(|v| {
            let text = v.text.to_lowercase();
            v.is_real_question && (text.contains("fachabteilung") || text.contains("bereich"))
        })
        .and_then(|v| {
            let text = strip_parentheticals(&v.text);
            (!text.is_empty()).then_some((v, text))
        });

    let (verbatim, text) = match verbatim {
        Some((v, text)) => (Some(v), text),
        None => (None, DEFAULT_DEPARTMENT_QUESTION.to_string()),
    };

    let mut departments = extr.all_departments.clone();
    departments.sort();
    departments.dedup();

    let kind = if departments.is_empty() {
        QuestionType::String
    } else {
        QuestionType::Choice
    };

    let mut question = Question::new(
        DEPARTMENT_ID,
        text,
        kind,
        true,
        Priority::HIGH,
        Group::Einsatzbereich,
    )
    .with_input_hint("Bitte eine Abteilung nennen.")
    .with_source(QuestionSource {
        page_id: verbatim.map(|v| v.page_id),
        prompt_id: verbatim.and_then(|v| v.prompt_id),
        verbatim: verbatim.is_some(),
    });

    if !departments.is_empty() {
        question = question.with_options(departments);
    }
    question
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use questionbuilder_shared::{
        Constraints, ExtractedPriority, Site, VerbatimCandidate, WorkingTime,
    };

    fn site(label: &str) -> Site {
        Site {
            label: label.into(),
            stations: vec![],
            source: None,
        }
    }

    fn facts() -> ExtractResult {
        ExtractResult {
            sites: vec![site("Berlin")],
            all_departments: vec!["Kardiologie".into(), "OP".into(), "Intensiv".into()],
            must_have: vec!["pflegefachkraft".into()],
            alternatives: vec!["MFA".into()],
            priorities: vec![ExtractedPriority {
                label: "Onkologie".into(),
                reason: "x".into(),
                prio_level: Priority::HIGH,
                source: None,
            }],
            ..ExtractResult::default()
        }
    }

    fn find<'a>(questions: &'a [Question], id: &str) -> &'a Question {
        questions
            .iter()
            .find(|q| q.id == id)
            .unwrap_or_else(|| panic!("missing question {id}"))
    }

    #[test]
    fn site_branches() {
        let mut extr = facts();

        extr.sites = vec![];
        let q = protocol_questions(&extr);
        assert_eq!(find(&q, SITE_ASK_ID).kind, QuestionType::String);

        extr.sites = vec![site("Berlin")];
        let q = protocol_questions(&extr);
        let confirm = find(&q, SITE_CONFIRM_ID);
        assert_eq!(confirm.kind, QuestionType::Boolean);
        assert!(confirm.question.contains("Berlin"));

        extr.sites = vec![site("Nord"), site("Süd"), site("Mitte")];
        let q = protocol_questions(&extr);
        let choice = find(&q, SITE_CHOICE_ID);
        assert_eq!(
            choice.options.as_deref(),
            Some(&["Nord".to_string(), "Süd".into(), "Mitte".into()][..])
        );
    }

    #[test]
    fn department_uses_verbatim_line() {
        let mut extr = facts();
        extr.verbatim_candidates = vec![
            VerbatimCandidate {
                text: "Welche Fachabteilung? (nicht vorlesen)".into(),
                page_id: 4,
                prompt_id: Some(17),
                is_real_question: false,
            },
            VerbatimCandidate {
                text: "In welchem Bereich möchten Sie arbeiten? (Liste vorlesen)".into(),
                page_id: 5,
                prompt_id: Some(21),
                is_real_question: true,
            },
        ];
        let q = protocol_questions(&extr);
        let bereich = find(&q, DEPARTMENT_ID);
        assert_eq!(bereich.question, "In welchem Bereich möchten Sie arbeiten?");
        let source = bereich.source.as_ref().unwrap();
        assert!(source.verbatim);
        assert_eq!(source.page_id, Some(5));
        assert_eq!(source.prompt_id, Some(21));
        assert_eq!(bereich.options.as_ref().unwrap(), &["Intensiv", "Kardiologie", "OP"]);
    }

    #[test]
    fn department_aside_only_falls_back_to_default() {
        let mut extr = facts();
        extr.verbatim_candidates = vec![VerbatimCandidate {
            text: "(Bereich laut Liste abfragen)".into(),
            page_id: 5,
            prompt_id: Some(21),
            is_real_question: true,
        }];
        let q = protocol_questions(&extr);
        let bereich = find(&q, DEPARTMENT_ID);
        assert_eq!(bereich.question, DEFAULT_DEPARTMENT_QUESTION);
        let source = bereich.source.as_ref().unwrap();
        assert!(!source.verbatim);
        assert_eq!(source.page_id, None);
        assert_eq!(source.prompt_id, None);
    }

    #[test]
    fn department_without_options_is_open() {
        let mut extr = facts();
        extr.all_departments.clear();
        let q = protocol_questions(&extr);
        let bereich = find(&q, DEPARTMENT_ID);
        assert_eq!(bereich.kind, QuestionType::String);
        assert!(bereich.options.is_none());
        assert_eq!(bereich.question, DEFAULT_DEPARTMENT_QUESTION);
    }

    #[test]
    fn qualification_and_preference_questions() {
        let q = protocol_questions(&facts());
        let exam = find(&q, NURSING_EXAM_ID);
        assert!(exam.required);
        assert_eq!(exam.kind, QuestionType::Boolean);

        let mfa = find(&q, MFA_ALTERNATIVE_ID);
        assert!(!mfa.required);
        assert!(mfa.conditions.is_empty());

        let prio = find(&q, "prio_onkologie");
        assert_eq!(prio.priority, Priority::HIGH);
        assert_eq!(prio.help_text.as_deref(), Some("x"));
        assert_eq!(prio.group, Some(Group::Praeferenzen));
    }

    #[test]
    fn framework_questions_follow_constraints() {
        let mut extr = facts();
        let q = protocol_questions(&extr);
        assert_eq!(
            find(&q, WORKING_TIME_ID).options.as_ref().unwrap(),
            &["Vollzeit", "Teilzeit"]
        );
        assert!(q.iter().all(|x| x.id != SHIFTS_ID && x.id != PAY_SCALE_ID));

        extr.constraints = Constraints {
            arbeitszeit: Some(WorkingTime {
                vollzeit: Some("38,5 Std.".into()),
                teilzeit: None,
            }),
            tarif: Some("TVöD-P".into()),
            schichten: Some("Nachtdienst nicht zwingend".into()),
        };
        let q = protocol_questions(&extr);
        assert_eq!(
            find(&q, WORKING_TIME_ID).options.as_ref().unwrap(),
            &["Vollzeit (38,5 Std.)", "Teilzeit"]
        );
        let shifts = find(&q, SHIFTS_ID);
        assert_eq!(shifts.kind, QuestionType::MultiChoice);
        assert_eq!(shifts.option_count(), 5);
        let tarif = find(&q, PAY_SCALE_ID);
        assert!(tarif.question.contains("TVöD-P"));
        assert_eq!(tarif.priority, Priority::LOW);
    }

    #[test]
    fn literal_address_branches() {
        let extr = facts();

        let known = CandidateProfile {
            address_full: Some("Hauptstr. 5, 10115 Berlin".into()),
            ..CandidateProfile::default()
        };
        let q = build_questions(&extr, &known);
        let last = q.last().unwrap();
        assert_eq!(last.id, ADDRESS_CONFIRM_ID);
        assert!(last.question.contains("Hauptstr. 5, 10115 Berlin"));

        let q = build_questions(&extr, &CandidateProfile::default());
        let last = q.last().unwrap();
        assert_eq!(last.id, ADDRESS_ASK_ID);
        assert_eq!(last.kind, QuestionType::String);
        assert!(last.source.as_ref().unwrap().verbatim);
    }

    #[test]
    fn template_mode_uses_placeholders() {
        let q = build_questions_template(&facts());
        assert_eq!(q[0].id, NAME_CONFIRM_ID);
        assert!(q[0].question.contains("{{candidatefirst_name}}"));
        assert_eq!(q[1].id, ADDRESS_CONFIRM_ID);
        assert!(q[1].question.contains("{{postal_code}}"));
        assert!(q.iter().all(|x| x.id != ADDRESS_ASK_ID));
        assert_eq!(q.len(), protocol_questions(&facts()).len() + 2);
    }
}
