//! Structural validation of a compiled catalog.
//!
//! Type-level constraints (enums, priority range, complete flow descriptors)
//! are enforced by deserialization; this module checks everything that spans
//! fields or questions, and reports all violations at once.

use std::collections::HashSet;

use serde_json::Value;
use tracing::error;

use questionbuilder_shared::{
    ConditionOp, MAX_CATALOG_QUESTIONS, QuestionBuilderError, QuestionCatalog, QuestionType,
    Result,
};

use crate::expand::{OPEN_SUFFIX, PRE_CHECK_SUFFIX};
use crate::rules::compare_questions;

/// Validate a catalog, returning every issue as a `CatalogSchema` error.
pub fn validate_catalog(catalog: &QuestionCatalog) -> Result<()> {
    let issues = catalog_issues(catalog);
    if issues.is_empty() {
        return Ok(());
    }
    error!(issue_count = issues.len(), "catalog failed schema validation");
    Err(QuestionBuilderError::CatalogSchema { issues })
}

/// Parse and validate a serialized catalog.
pub fn validate_catalog_json(content: &str) -> Result<QuestionCatalog> {
    let catalog: QuestionCatalog =
        serde_json::from_str(content).map_err(|e| QuestionBuilderError::CatalogSchema {
            issues: vec![e.to_string()],
        })?;
    validate_catalog(&catalog)?;
    Ok(catalog)
}

/// All violations, in question order.
pub fn catalog_issues(catalog: &QuestionCatalog) -> Vec<String> {
    let mut issues = Vec::new();

    let meta = &catalog.meta;
    for (name, value) in [
        ("schema_version", &meta.schema_version),
        ("generated_at", &meta.generated_at),
        ("generator", &meta.generator),
    ] {
        if value.trim().is_empty() {
            issues.push(format!("/_meta/{name}: must not be empty"));
        }
    }

    let questions = &catalog.questions;
    if questions.len() > MAX_CATALOG_QUESTIONS {
        issues.push(format!(
            "/questions: {} entries exceed the maximum of {MAX_CATALOG_QUESTIONS}",
            questions.len()
        ));
    }

    let ids: HashSet<&str> = questions.iter().map(|q| q.id.as_str()).collect();
    let mut signatures = HashSet::new();

    for (i, q) in questions.iter().enumerate() {
        let path = format!("/questions/{i}");

        if q.id.trim().is_empty() {
            issues.push(format!("{path}/id: must not be empty"));
        }
        if q.question.trim().is_empty() {
            issues.push(format!("{path}/question: must not be empty"));
        }
        if !signatures.insert((q.id.as_str(), q.question.as_str())) {
            issues.push(format!("{path}: duplicate (id, question) signature for '{}'", q.id));
        }

        match (&q.options, q.kind.takes_options()) {
            (None, true) => issues.push(format!("{path}/options: required for {:?}", q.kind)),
            (Some(opts), true) if opts.is_empty() => {
                issues.push(format!("{path}/options: must not be empty"))
            }
            (Some(_), false) => {
                issues.push(format!("{path}/options: not allowed for {:?}", q.kind))
            }
            _ => {}
        }

        if q.conversation_flow.is_some() && q.kind != QuestionType::Choice {
            issues.push(format!("{path}/conversation_flow: only allowed on choice questions"));
        }

        if q.conversation_flow.is_some() {
            for suffix in [PRE_CHECK_SUFFIX, OPEN_SUFFIX] {
                let member = format!("{}{suffix}", q.id);
                if !ids.contains(member.as_str()) {
                    issues.push(format!("{path}/conversation_flow: missing '{member}' question"));
                }
            }
        }

        for (c, condition) in q.conditions.iter().enumerate() {
            let cpath = format!("{path}/conditions/{c}");
            if condition.when.field.trim().is_empty() {
                issues.push(format!("{cpath}/when/field: must not be empty"));
            }
            match (condition.when.op, &condition.when.value) {
                (ConditionOp::In, Some(Value::Array(_))) => {}
                (ConditionOp::In, _) => {
                    issues.push(format!("{cpath}/when/value: 'in' requires an array"))
                }
                (ConditionOp::Eq, None) => {
                    issues.push(format!("{cpath}/when/value: 'eq' requires a value"))
                }
                _ => {}
            }
        }

        if let (Some(category), Some(order)) = (q.category, q.category_order) {
            if category.order() != order {
                issues.push(format!(
                    "{path}/category_order: {order} does not match category '{}'",
                    category.as_str()
                ));
            }
        }
    }

    for (i, pair) in questions.windows(2).enumerate() {
        if compare_questions(&pair[0], &pair[1]).is_gt() {
            issues.push(format!(
                "/questions/{}: '{}' is out of order after '{}'",
                i + 1,
                pair[1].id,
                pair[0].id
            ));
        }
    }

    issues
}
