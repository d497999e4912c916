//! Input normalization before extraction and structuring.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use questionbuilder_shared::{
    CandidateAddress, CandidateProfile, ConversationProtocol, QuestionBuilderError, Result,
};

/// Addresses this short carry no usable information.
const MIN_ADDRESS_LEN: usize = 6;

/// Strip leading numbering and blank lines from every prompt and drop
/// prompts that end up empty.
pub fn clean_protocol(protocol: ConversationProtocol) -> Result<ConversationProtocol> {
    if protocol.pages.is_empty() {
        return Err(QuestionBuilderError::validation("protocol has no pages"));
    }

    let mut dropped = 0usize;
    let pages = protocol
        .pages
        .into_iter()
        .map(|mut page| {
            let before = page.prompts.len();
            page.prompts = page
                .prompts
                .into_iter()
                .map(|mut prompt| {
                    prompt.question = clean_prompt_text(&prompt.question);
                    prompt
                })
                .filter(|prompt| !prompt.question.is_empty())
                .collect();
            dropped += before - page.prompts.len();
            page
        })
        .collect();

    debug!(dropped, "protocol cleaned");
    Ok(ConversationProtocol { pages, ..protocol })
}

fn clean_prompt_text(text: &str) -> String {
    static NUMBERING_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^\s*\d+[.)]\s*").expect("valid regex"));

    let text = NUMBERING_RE.replace(text, "");
    text.trim_start_matches('\n').trim().to_string()
}

/// Derive `address_full` from the address part.
///
/// Format: `"street house_number, postal_code city"`, whitespace collapsed.
/// Unknown when no address is given or the result is too short.
pub fn merge_candidate(
    mut profile: CandidateProfile,
    address: Option<&CandidateAddress>,
) -> CandidateProfile {
    profile.address_full = address.and_then(format_address);
    profile
}

fn format_address(address: &CandidateAddress) -> Option<String> {
    static SPACE_COMMA_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\s+,").expect("valid regex"));
    static MULTI_SPACE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid regex"));

    let part = |v: &Option<String>| v.as_deref().unwrap_or("").to_string();
    let raw = format!(
        "{} {}, {} {}",
        part(&address.street),
        part(&address.house_number),
        part(&address.postal_code),
        part(&address.city)
    );
    let joined = SPACE_COMMA_RE.replace_all(&raw, ",");
    let collapsed = MULTI_SPACE_RE.replace_all(&joined, " ");
    let full = collapsed.trim();

    (full.chars().count() >= MIN_ADDRESS_LEN).then(|| full.to_string())
}
