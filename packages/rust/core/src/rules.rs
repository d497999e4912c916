//! Rule engine: an ordered list of pure list transforms applied after
//! flow expansion.
//!
//! Each rule takes ownership of the list and returns a new one; nothing is
//! shared between stages.

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::debug;

use questionbuilder_shared::{
    Condition, ExtractResult, ExtractedPriority, Group, Priority, Question, QuestionType, Site,
};

use crate::expand::{base_id, triad_position};
use crate::structure::{DEPARTMENT_ID, MFA_ALTERNATIVE_ID, PRIORITY_ID_PREFIX, SITE_CHOICE_ID};
use crate::text::slug;

/// Departments for which the MFA alternative is offered.
pub const MFA_DEPARTMENTS: [&str; 3] = ["OP", "Anästhesie", "Endoskopie"];

/// A priority with its derived slug.
#[derive(Debug, Clone)]
pub struct SluggedPriority {
    pub label: String,
    pub slug: String,
    pub prio_level: Priority,
}

/// Facts the rules may consult.
#[derive(Debug, Clone)]
pub struct RuleContext {
    pub sites: Vec<Site>,
    pub priorities: Vec<SluggedPriority>,
    pub address_known: bool,
    pub max_questions: usize,
}

impl RuleContext {
    pub fn new(extr: &ExtractResult, address_known: bool, max_questions: usize) -> Self {
        Self {
            sites: extr.sites.clone(),
            priorities: extr.priorities.iter().map(slugged).collect(),
            address_known,
            max_questions,
        }
    }
}

fn slugged(p: &ExtractedPriority) -> SluggedPriority {
    SluggedPriority {
        label: p.label.clone(),
        slug: slug(&p.label),
        prio_level: p.prio_level,
    }
}

/// A named transform.
pub type Rule = fn(&RuleContext, Vec<Question>) -> Vec<Question>;

/// The rules in application order.
pub const RULES: [(&str, Rule); 6] = [
    ("single_site", single_site),
    ("zero_site_fallback", zero_site_fallback),
    ("op_mfa_conditional", op_mfa_conditional),
    ("priorities_boost", priorities_boost),
    ("single_option_to_boolean", single_option_to_boolean),
    ("dedupe_sort_cap", dedupe_sort_cap),
];

/// Run every rule in order.
pub fn apply_rules(ctx: &RuleContext, questions: Vec<Question>) -> Vec<Question> {
    debug!(
        sites = ctx.sites.len(),
        priorities = ctx.priorities.len(),
        address_known = ctx.address_known,
        "applying rules"
    );
    RULES.iter().fold(questions, |acc, (name, rule)| {
        let before = acc.len();
        let out = rule(ctx, acc);
        debug!(rule = *name, before, after = out.len(), "rule applied");
        out
    })
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// With exactly one site, no site choice may remain.
pub fn single_site(ctx: &RuleContext, questions: Vec<Question>) -> Vec<Question> {
    if ctx.sites.len() != 1 {
        return questions;
    }
    questions
        .into_iter()
        .filter(|q| q.id != SITE_CHOICE_ID)
        .collect()
}

/// No-op. The open site question for zero sites is emitted by the
/// structurer; this stage stays as the hook for a future fallback.
pub fn zero_site_fallback(_ctx: &RuleContext, questions: Vec<Question>) -> Vec<Question> {
    questions
}

/// Show the MFA alternative only for the departments in [`MFA_DEPARTMENTS`].
pub fn op_mfa_conditional(_ctx: &RuleContext, questions: Vec<Question>) -> Vec<Question> {
    questions
        .into_iter()
        .map(|mut q| {
            if q.id == MFA_ALTERNATIVE_ID {
                q.conditions = vec![Condition::ask_when_in(DEPARTMENT_ID, MFA_DEPARTMENTS)];
            }
            q
        })
        .collect()
}

/// Tighten preference priorities to the extracted level. Never relaxes.
pub fn priorities_boost(ctx: &RuleContext, questions: Vec<Question>) -> Vec<Question> {
    questions
        .into_iter()
        .map(|mut q| {
            for prio in &ctx.priorities {
                if q.id.strip_prefix(PRIORITY_ID_PREFIX) == Some(prio.slug.as_str()) {
                    q.priority = q.priority.min(prio.prio_level);
                }
            }
            q
        })
        .collect()
}

/// A choice with a single option becomes a yes/no question about it.
pub fn single_option_to_boolean(_ctx: &RuleContext, questions: Vec<Question>) -> Vec<Question> {
    questions
        .into_iter()
        .map(|mut q| {
            if q.kind.takes_options() && q.option_count() == 1 {
                if let Some(option) = q.options.take().and_then(|o| o.into_iter().next()) {
                    q.question = format!("Möchten Sie im Bereich {option} arbeiten?");
                    q.kind = QuestionType::Boolean;
                    q.conversation_flow = None;
                }
            }
            q
        })
        .collect()
}

/// Dedupe by `(id, question)`, sort, and cap at `ctx.max_questions`.
///
/// Triad members whose base question was cut are dropped too.
pub fn dedupe_sort_cap(ctx: &RuleContext, questions: Vec<Question>) -> Vec<Question> {
    let mut seen = HashSet::new();
    let mut out: Vec<Question> = questions
        .into_iter()
        .filter(|q| seen.insert((q.id.clone(), q.question.clone())))
        .collect();

    // A suffixed id is only a triad member when its base question exists.
    let before: HashSet<String> = out.iter().map(|q| q.id.clone()).collect();
    let is_member = |id: &str| triad_position(id) < 2 && before.contains(base_id(id));

    out.sort_by(compare_questions);
    out.truncate(ctx.max_questions);

    let kept: HashSet<String> = out.iter().map(|q| q.id.clone()).collect();
    out.retain(|q| !is_member(&q.id) || kept.contains(base_id(&q.id)));
    out
}

fn group_rank(group: Option<Group>) -> usize {
    group.map_or(Group::ORDER.len(), Group::rank)
}

/// Group rank, then priority, then base id with triad position, then id.
pub fn compare_questions(a: &Question, b: &Question) -> Ordering {
    group_rank(a.group)
        .cmp(&group_rank(b.group))
        .then(a.priority.cmp(&b.priority))
        .then_with(|| base_id(&a.id).cmp(base_id(&b.id)))
        .then_with(|| triad_position(&a.id).cmp(&triad_position(&b.id)))
        .then_with(|| a.id.cmp(&b.id))
}
