//! Conversation flow attachment.
//!
//! Choice questions with many options are sent to a [`FlowSynthesizer`];
//! complete proposals are attached as `conversation_flow`. Any failure of
//! the synthesizer leaves the questions unchanged.

use tracing::{debug, info, instrument, warn};

use questionbuilder_llm::{FlowCandidate, FlowContext, FlowRequest, FlowSynthesizer, PriorityHint};
use questionbuilder_shared::{ExtractedPriority, FlowProposal, Question, QuestionType};

use crate::structure::SITE_CHOICE_ID;

/// Build the synthesizer request, or `None` when no question qualifies.
///
/// A question qualifies when it is a `choice` with more than `threshold`
/// options, or the site choice with at least two.
pub fn select_flow_candidates(
    questions: &[Question],
    threshold: usize,
    priorities: &[ExtractedPriority],
) -> Option<FlowRequest> {
    let hints: Vec<PriorityHint> = priorities
        .iter()
        .map(|p| PriorityHint {
            label: p.label.clone(),
            reason: p.reason.clone(),
        })
        .collect();

    let candidates: Vec<FlowCandidate> = questions
        .iter()
        .filter(|q| q.kind == QuestionType::Choice)
        .filter_map(|q| {
            let options = q.options.as_ref()?;
            let qualifies = options.len() > threshold
                || (q.id == SITE_CHOICE_ID && options.len() >= 2);
            qualifies.then(|| FlowCandidate {
                id: q.id.clone(),
                question: q.question.clone(),
                options: options.clone(),
                group: q.group,
                priority_hints: matching_hints(&hints, options),
            })
        })
        .collect();

    if candidates.is_empty() {
        return None;
    }

    Some(FlowRequest {
        questions: candidates,
        context: FlowContext { priorities: hints },
    })
}

/// Priorities whose label and one of the options contain each other.
fn matching_hints(hints: &[PriorityHint], options: &[String]) -> Vec<PriorityHint> {
    let options: Vec<String> = options.iter().map(|o| o.to_lowercase()).collect();
    hints
        .iter()
        .filter(|h| {
            let label = h.label.to_lowercase();
            options
                .iter()
                .any(|opt| opt.contains(&label) || label.contains(opt.as_str()))
        })
        .cloned()
        .collect()
}

/// Attach complete proposals to the candidates of `request` they name.
///
/// Partial proposals and proposals for questions that were not sent to the
/// synthesizer are ignored.
pub fn attach_flows(
    questions: Vec<Question>,
    request: &FlowRequest,
    proposals: Vec<FlowProposal>,
) -> Vec<Question> {
    let mut flows: Vec<_> = proposals
        .into_iter()
        .filter_map(|p| {
            let id = p.question_id.clone();
            if !request.questions.iter().any(|c| c.id == id) {
                debug!(question_id = %id, "ignoring flow proposal for unrequested question");
                return None;
            }
            match p.into_flow() {
                Some(flow) => Some((id, flow)),
                None => {
                    debug!(question_id = %id, "ignoring partial flow proposal");
                    None
                }
            }
        })
        .collect();

    questions
        .into_iter()
        .map(|mut q| {
            if let Some(pos) = flows.iter().position(|(id, _)| *id == q.id) {
                let (_, flow) = flows.swap_remove(pos);
                q.conversation_flow = Some(flow);
            }
            q
        })
        .collect()
}

/// Run flow synthesis for the qualifying questions.
///
/// Synthesizer errors are logged and the input is returned unchanged.
#[instrument(skip_all, fields(questions = questions.len(), threshold = threshold))]
pub async fn apply_conversational_flows(
    questions: Vec<Question>,
    synthesizer: &dyn FlowSynthesizer,
    threshold: usize,
    priorities: &[ExtractedPriority],
) -> Vec<Question> {
    let Some(request) = select_flow_candidates(&questions, threshold, priorities) else {
        info!("no questions need a conversational flow");
        return questions;
    };

    info!(count = request.questions.len(), "building conversational flows");

    match synthesizer.synthesize(&request).await {
        Ok(proposals) => {
            let result = attach_flows(questions, &request, proposals);
            let converted = result
                .iter()
                .filter(|q| q.conversation_flow.is_some())
                .count();
            info!(converted, total = result.len(), "conversational flows built");
            result
        }
        Err(e) => {
            warn!(error = %e, "flow synthesis failed, keeping original questions");
            questions
        }
    }
}
