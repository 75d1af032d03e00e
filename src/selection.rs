use std::collections::HashSet;

use tracing::{info, warn};

use crate::catalog::RequestDefinition;

/// Outcome of [`select`].
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub requests: Vec<RequestDefinition>,

    /// The wanted id or tags matched nothing; the caller should abort the run
    pub not_found: bool,
}

/// Split a comma separated flag value, trimming entries and dropping empty ones.
pub fn split_list(value: &str) -> Vec<&str> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Remove every definition whose id appears in the comma separated `ids` list.
pub fn exclude(requests: Vec<RequestDefinition>, ids: &str) -> Vec<RequestDefinition> {
    let excluded: HashSet<&str> = split_list(ids).into_iter().collect();
    if excluded.is_empty() {
        return requests;
    }

    requests
        .into_iter()
        .filter(|req| !excluded.contains(req.id.as_str()))
        .collect()
}

/// Narrow the catalog down to one id, or to the definitions carrying any of the wanted tags.
///
/// `id` wins over `tags` when both are given. With neither, the whole catalog is selected.
/// On a miss the input comes back unchanged together with `not_found = true`.
pub fn select(requests: Vec<RequestDefinition>, id: &str, tags: &str) -> Selection {
    let id = id.trim();
    if !id.is_empty() {
        return match requests.iter().find(|req| req.id == id) {
            Some(found) => Selection {
                requests: vec![found.clone()],
                not_found: false,
            },
            None => {
                warn!("No request definition found for id \"{}\"", id);
                Selection {
                    requests,
                    not_found: true,
                }
            }
        };
    }

    let wanted: HashSet<&str> = split_list(tags).into_iter().collect();
    if wanted.is_empty() {
        return Selection {
            requests,
            not_found: false,
        };
    }

    let filtered: Vec<RequestDefinition> = requests
        .iter()
        .filter(|req| req.tags.iter().any(|tag| wanted.contains(tag.as_str())))
        .cloned()
        .collect();

    if filtered.is_empty() {
        warn!("No request definitions found for tags \"{}\"", tags);
        return Selection {
            requests,
            not_found: true,
        };
    }

    info!("Selected {} request definitions by tags", filtered.len());
    Selection {
        requests: filtered,
        not_found: false,
    }
}
