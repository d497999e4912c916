//! Input file discovery and loading.
//!
//! Each input has an ordered list of known file names; the first existing
//! file wins. A file that exists but does not parse is an error, not a
//! reason to try the next name.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use questionbuilder_shared::{
    CandidateAddress, CandidateProfile, ConversationProtocol, InputConfig, QuestionBuilderError,
    Result,
};

use crate::preprocess::merge_candidate;

/// Read and deserialize a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| QuestionBuilderError::io(path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| QuestionBuilderError::parse(format!("{}: {e}", path.display())))
}

fn first_existing(dir: &Path, names: &[String]) -> Option<PathBuf> {
    names.iter().map(|name| dir.join(name)).find(|p| p.is_file())
}

/// Load the conversation protocol from `dir`.
pub fn load_protocol(dir: &Path, input: &InputConfig) -> Result<ConversationProtocol> {
    let path = first_existing(dir, &input.protocol_files).ok_or_else(|| {
        QuestionBuilderError::InputNotFound {
            dir: dir.to_path_buf(),
            tried: input.protocol_files.clone(),
        }
    })?;

    let protocol: ConversationProtocol = read_json(&path)?;
    info!(path = %path.display(), pages = protocol.pages.len(), "protocol loaded");
    Ok(protocol)
}

/// Load the applicant profile from `dir` with `address_full` derived.
///
/// A single profile file may carry the address fields itself; otherwise
/// the two-part layout is used, the address part being optional.
pub fn load_candidate(dir: &Path, input: &InputConfig) -> Result<CandidateProfile> {
    let single = dir.join(&input.profile_file);
    if single.is_file() {
        let profile: CandidateProfile = read_json(&single)?;
        let address: CandidateAddress = read_json(&single)?;
        info!(path = %single.display(), "applicant profile loaded");
        return Ok(merge_with_address(profile, &address));
    }

    let [personal, address_file] = &input.profile_part_files;
    let personal_path = dir.join(personal);
    if !personal_path.is_file() {
        let mut tried = vec![input.profile_file.clone()];
        tried.extend(input.profile_part_files.iter().cloned());
        return Err(QuestionBuilderError::InputNotFound {
            dir: dir.to_path_buf(),
            tried,
        });
    }

    let profile: CandidateProfile = read_json(&personal_path)?;
    let address_path = dir.join(address_file);
    let address: Option<CandidateAddress> = if address_path.is_file() {
        Some(read_json(&address_path)?)
    } else {
        debug!(path = %address_path.display(), "no address part found");
        None
    };

    info!(path = %personal_path.display(), has_address = address.is_some(), "applicant profile loaded");
    Ok(merge_candidate(profile, address.as_ref()))
}

/// Load a profile and its address parts from explicit paths.
///
/// Without an address file the profile file is read for the address
/// fields as well. The returned profile has `address_full` derived.
pub fn load_candidate_files(
    profile: &Path,
    address: Option<&Path>,
) -> Result<(CandidateProfile, CandidateAddress)> {
    let personal: CandidateProfile = read_json(profile)?;
    match address {
        Some(path) => {
            let address: CandidateAddress = read_json(path)?;
            Ok((merge_candidate(personal, Some(&address)), address))
        }
        None => {
            let inline: CandidateAddress = read_json(profile)?;
            Ok((merge_with_address(personal, &inline), inline))
        }
    }
}

/// Keep a given `address_full` unless address parts are present.
fn merge_with_address(profile: CandidateProfile, address: &CandidateAddress) -> CandidateProfile {
    let has_parts = [
        &address.street,
        &address.house_number,
        &address.postal_code,
        &address.city,
    ]
    .iter()
    .any(|part| part.is_some());

    if has_parts || profile.address_full.is_none() {
        merge_candidate(profile, has_parts.then_some(address))
    } else {
        profile
    }
}
