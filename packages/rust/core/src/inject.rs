//! Applicant data injection into templated catalogs.
//!
//! A templated catalog carries `{{name}}` placeholders instead of personal
//! values. Injection resolves them per applicant; placeholders without a
//! value are left untouched.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{info, warn};

use questionbuilder_shared::{CandidateAddress, CandidateProfile, Question, QuestionCatalog};

static VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("valid regex"));

/// Values available for substitution, keyed by placeholder name.
pub type VariableValues = BTreeMap<&'static str, String>;

/// Build the placeholder values for one applicant. Empty values are omitted.
pub fn variable_values(
    profile: &CandidateProfile,
    address: Option<&CandidateAddress>,
) -> VariableValues {
    let mut values = VariableValues::new();
    let mut put = |name: &'static str, value: Option<&String>| {
        if let Some(v) = value.map(|v| v.trim()).filter(|v| !v.is_empty()) {
            values.insert(name, v.to_string());
        }
    };

    put("candidatefirst_name", profile.first_name.as_ref());
    put("candidatelast_name", profile.last_name.as_ref());
    put("telephone", profile.telephone.as_ref());
    put("email", profile.email.as_ref());

    if let Some(addr) = address {
        put("street", addr.street.as_ref());
        put("house_number", addr.house_number.as_ref());
        put("postal_code", addr.postal_code.as_ref());
        put("city", addr.city.as_ref());
    }

    let full = ["street", "house_number", "postal_code", "city"].map(|k| values.get(k).cloned());
    if let [Some(street), Some(number), Some(postal), Some(city)] = full {
        values.insert("address_full", format!("{street} {number}, {postal} {city}"));
    } else if let Some(full) = profile.address_full.as_ref().filter(|a| !a.is_empty()) {
        values.insert("address_full", full.clone());
    }

    values
}

/// Replace known placeholders in `text`; returns the new text and the
/// number of replacements.
pub fn replace_variables(text: &str, values: &VariableValues) -> (String, usize) {
    let mut count = 0;
    let replaced = VAR_RE.replace_all(text, |caps: &Captures<'_>| match values.get(&caps[1]) {
        Some(value) => {
            count += 1;
            value.clone()
        }
        None => {
            warn!(variable = &caps[1], "no value for template variable");
            caps[0].to_string()
        }
    });
    (replaced.into_owned(), count)
}

/// Every text field of a question that may hold placeholders.
fn text_fields(q: &Question) -> Vec<&str> {
    let mut fields = vec![q.question.as_str()];
    fields.extend(q.help_text.as_deref());
    fields.extend(q.context.as_deref());
    if let Some(flow) = &q.conversation_flow {
        fields.push(&flow.pre_check.question);
        fields.push(&flow.open_question.question);
        fields.push(&flow.clustered_options.presentation_hint);
        for category in &flow.clustered_options.categories {
            fields.push(&category.label);
            fields.extend(category.options.iter().map(String::as_str));
        }
    }
    fields
}

/// Mutable counterpart of [`text_fields`], in the same order.
fn text_fields_mut(q: &mut Question) -> Vec<&mut String> {
    let mut fields = vec![&mut q.question];
    fields.extend(q.help_text.as_mut());
    fields.extend(q.context.as_mut());
    if let Some(flow) = q.conversation_flow.as_mut() {
        fields.push(&mut flow.pre_check.question);
        fields.push(&mut flow.open_question.question);
        fields.push(&mut flow.clustered_options.presentation_hint);
        for category in &mut flow.clustered_options.categories {
            fields.push(&mut category.label);
            fields.extend(category.options.iter_mut());
        }
    }
    fields
}

/// Distinct placeholder names used anywhere in the catalog, sorted.
pub fn template_variables(catalog: &QuestionCatalog) -> Vec<String> {
    let mut names = BTreeSet::new();
    for field in catalog.questions.iter().flat_map(text_fields) {
        names.extend(VAR_RE.captures_iter(field).map(|c| c[1].to_string()));
    }
    names.into_iter().collect()
}

/// Resolve the placeholders of a templated catalog for one applicant.
pub fn inject_applicant_data(
    template: &QuestionCatalog,
    profile: &CandidateProfile,
    address: Option<&CandidateAddress>,
) -> (QuestionCatalog, usize) {
    let values = variable_values(profile, address);
    let mut resolved = template.clone();
    let mut total = 0;

    for q in &mut resolved.questions {
        for field in text_fields_mut(q) {
            let (text, count) = replace_variables(field, &values);
            *field = text;
            total += count;
        }
    }

    info!(replacements = total, "variable injection complete");
    (resolved, total)
}
