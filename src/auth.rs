use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::catalog::RequestDefinition;
use crate::catalog::body::trim_quotes;

/// Header placeholder replaced by the token of the pre-request
pub const AUTH_TOKEN_PLACEHOLDER: &str = "<auth-token>";

const TOKEN_TAIL_LEN: usize = 12;

/// Bearer tokens produced by auth requests, keyed by the producing request id.
///
/// Entries are add-once. The relay is owned by a single run and handed to the executor by
/// `&mut`, so there is no locking.
#[derive(Debug, Default, Clone)]
pub struct TokenRelay {
    tokens: HashMap<String, String>,
}

impl TokenRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `token` under `key` unless the key is taken. Returns whether it was inserted.
    pub fn add(&mut self, key: &str, token: impl Into<String>) -> bool {
        if self.tokens.contains_key(key) {
            warn!("Auth token for \"{}\" already present, keeping the first one", key);
            return false;
        }
        self.tokens.insert(key.to_string(), token.into());
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.tokens.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Last characters of a token, for logs.
pub fn token_tail(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    let start = chars.len().saturating_sub(TOKEN_TAIL_LEN);
    format!("...{}", chars[start..].iter().collect::<String>())
}

/// Extract the token from an auth response body and relay it under `request_id`.
pub fn record_auth_token(relay: &mut TokenRelay, request_id: &str, body: &str) -> bool {
    let token = trim_quotes(body);
    let added = relay.add(request_id, token);
    if added {
        info!("Relayed auth token {} from \"{}\"", token_tail(token), request_id);
    }
    added
}

/// Copy `def` with `<auth-token>` in its first matching header replaced by the relayed token.
///
/// Only the first header containing the placeholder is considered. A relay miss leaves the
/// header as is; the call will then fail authentication and be reported as such.
pub fn inject_auth_token(def: &RequestDefinition, relay: &TokenRelay) -> RequestDefinition {
    let mut injected = def.clone();
    let Some(pre_request_id) = def.pre_request_id.as_deref() else {
        return injected;
    };

    let Some(header) = injected
        .request
        .headers
        .iter_mut()
        .find(|h| h.contains(AUTH_TOKEN_PLACEHOLDER))
    else {
        return injected;
    };

    match relay.get(pre_request_id) {
        Some(token) => {
            *header = header.replace(AUTH_TOKEN_PLACEHOLDER, token);
            debug!(
                "Injected auth token {} from \"{}\" into \"{}\"",
                token_tail(token),
                pre_request_id,
                def.id
            );
        }
        None => warn!(
            "No auth token relayed by \"{}\" for request \"{}\"",
            pre_request_id, def.id
        ),
    }

    injected
}
