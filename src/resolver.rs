use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::{debug, error};

use crate::catalog::RequestDefinition;

/// Length of a request id (hex characters)
pub const REQUEST_ID_LENGTH: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("request \"{id}\" has a malformed preRequestId \"{pre_request_id}\"")]
    MalformedPreRequestId { id: String, pre_request_id: String },

    #[error("request \"{id}\" references unknown pre-request \"{pre_request_id}\"")]
    MissingPreRequest { id: String, pre_request_id: String },

    #[error("request \"{id}\" references itself as pre-request")]
    SelfReference { id: String },
}

/// Whether `id` is a 10 character lowercase hex string.
pub fn is_valid_request_id(id: &str) -> bool {
    id.len() == REQUEST_ID_LENGTH && id.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
}

/// Put the prerequisites of `selected` in front of it.
///
/// Prerequisites are looked up in the full `catalog`, so a pre-request that was filtered away
/// still runs. Only one level is resolved: the pre-request's own `pre_request_id` is not
/// followed. The result is deduplicated by id, first occurrence wins.
pub fn resolve_dependencies(
    catalog: &[RequestDefinition],
    selected: &[RequestDefinition],
) -> Result<Vec<RequestDefinition>, ResolveError> {
    let by_id: HashMap<&str, &RequestDefinition> =
        catalog.iter().map(|req| (req.id.as_str(), req)).collect();

    let mut prerequisites = Vec::new();
    for req in selected {
        let Some(pre_request_id) = req.pre_request_id.as_deref() else {
            continue;
        };

        if !is_valid_request_id(pre_request_id) {
            error!(
                "Invalid preRequestId \"{}\" in request \"{}\"",
                pre_request_id, req.id
            );
            return Err(ResolveError::MalformedPreRequestId {
                id: req.id.clone(),
                pre_request_id: pre_request_id.to_string(),
            });
        }

        if pre_request_id == req.id {
            return Err(ResolveError::SelfReference { id: req.id.clone() });
        }

        let Some(pre_request) = by_id.get(pre_request_id) else {
            error!(
                "Pre-request \"{}\" of request \"{}\" not found",
                pre_request_id, req.id
            );
            return Err(ResolveError::MissingPreRequest {
                id: req.id.clone(),
                pre_request_id: pre_request_id.to_string(),
            });
        };

        debug!("Prepending pre-request \"{}\" for \"{}\"", pre_request_id, req.id);
        prerequisites.push((*pre_request).clone());
    }

    let mut seen = HashSet::new();
    Ok(prerequisites
        .into_iter()
        .chain(selected.iter().cloned())
        .filter(|req| seen.insert(req.id.clone()))
        .collect())
}
