use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::catalog::RequestDefinition;
use crate::secrets::obfuscator::deobfuscate;
use crate::secrets::store::{SecretStore, SecretStoreError};

fn placeholder_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"<secret-([^>]+)>").expect("Invalid secret placeholder regex"))
}

/// Substitutes `<secret-HASH>` placeholders with deobfuscated store values.
pub struct SecretResolver<'a> {
    store: &'a dyn SecretStore,
}

impl<'a> SecretResolver<'a> {
    pub fn new(store: &'a dyn SecretStore) -> Self {
        Self { store }
    }

    /// Resolve every placeholder in `input`.
    ///
    /// A hash that is not in the store keeps its placeholder; only a failing store is an error.
    pub fn resolve_str(&self, input: &str) -> Result<String, SecretStoreError> {
        if !input.contains("<secret-") {
            return Ok(input.to_string());
        }

        let mut failure = None;
        let resolved = placeholder_regex().replace_all(input, |caps: &Captures| {
            let placeholder = caps[0].to_string();
            if failure.is_some() {
                return placeholder;
            }

            let hash = &caps[1];
            match self.store.lookup(hash) {
                Ok(Some(obfuscated)) => {
                    debug!("Resolved secret \"{}\"", hash);
                    deobfuscate(&obfuscated)
                }
                Ok(None) => {
                    warn!("Secret \"{}\" not found in store", hash);
                    placeholder
                }
                Err(e) => {
                    failure = Some(e);
                    placeholder
                }
            }
        });

        match failure {
            Some(e) => Err(e),
            None => Ok(resolved.into_owned()),
        }
    }

    /// Build a copy of `def` with every resolvable slot substituted.
    ///
    /// Slots: body, basic auth, each header, each param, and both fields of every test case.
    pub fn resolve_request(
        &self,
        def: &RequestDefinition,
    ) -> Result<RequestDefinition, SecretStoreError> {
        let mut resolved = def.clone();
        let request = &mut resolved.request;

        request.post_body = self.resolve_str(&request.post_body)?;
        request.basic_auth = self.resolve_str(&request.basic_auth)?;
        for header in request.headers.iter_mut() {
            *header = self.resolve_str(header)?;
        }
        for param in request.params.iter_mut() {
            *param = self.resolve_str(param)?;
        }

        for test_case in resolved.test_cases.iter_mut() {
            if let Some(params) = test_case.params_data.as_deref() {
                test_case.params_data = Some(self.resolve_str(params)?);
            }
            if let Some(body) = test_case.post_body_data.as_deref() {
                test_case.post_body_data = Some(self.resolve_str(body)?);
            }
        }

        Ok(resolved)
    }

    pub fn resolve_all(
        &self,
        requests: &[RequestDefinition],
    ) -> Result<Vec<RequestDefinition>, SecretStoreError> {
        requests.iter().map(|req| self.resolve_request(req)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TestCaseOverride;
    use crate::secrets::obfuscator::obfuscate;
    use crate::secrets::store::MemorySecretStore;

    struct BrokenStore;

    impl SecretStore for BrokenStore {
        fn lookup(&self, _hash: &str) -> Result<Option<String>, SecretStoreError> {
            Err(SecretStoreError::Poisoned)
        }

        fn insert(&self, _hash: &str, _obfuscated: &str) -> Result<(), SecretStoreError> {
            Err(SecretStoreError::Poisoned)
        }

        fn count(&self) -> Result<usize, SecretStoreError> {
            Err(SecretStoreError::Poisoned)
        }
    }

    fn store_with(hash: &str, plaintext: &str) -> MemorySecretStore {
        let store = MemorySecretStore::new();
        store.insert(hash, &obfuscate(plaintext)).unwrap();
        store
    }

    #[test]
    fn test_resolve_every_occurrence() {
        let store = store_with("b29ff12b50", "hunter2");
        let resolver = SecretResolver::new(&store);

        let resolved = resolver
            .resolve_str("{\"a\":\"<secret-b29ff12b50>\",\"b\":\"<secret-b29ff12b50>\"}")
            .unwrap();
        assert_eq!(resolved, "{\"a\":\"hunter2\",\"b\":\"hunter2\"}");
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let store = store_with("b29ff12b50", "hunter2");
        let resolver = SecretResolver::new(&store);

        let once = resolver.resolve_str("token=<secret-b29ff12b50>").unwrap();
        let twice = resolver.resolve_str(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_unknown_hash_keeps_placeholder() {
        let store = MemorySecretStore::new();
        let resolver = SecretResolver::new(&store);

        let resolved = resolver.resolve_str("x <secret-0000000000> y").unwrap();
        assert_eq!(resolved, "x <secret-0000000000> y");
    }

    #[test]
    fn test_store_failure_is_propagated() {
        let resolver = SecretResolver::new(&BrokenStore);
        assert!(resolver.resolve_str("<secret-b29ff12b50>").is_err());
        assert_eq!(resolver.resolve_str("no placeholder").unwrap(), "no placeholder");
    }

    #[test]
    fn test_resolve_request_slots() {
        let store = store_with("b29ff12b50", "s3cr3t");
        let resolver = SecretResolver::new(&store);

        let mut def = RequestDefinition::new("ff00fceb61", "users.json");
        def.request.post_body = "{\"password\":\"<secret-b29ff12b50>\"}".to_string();
        def.request.basic_auth = "admin:<secret-b29ff12b50>".to_string();
        def.request.headers = vec!["X-Api-Key: <secret-b29ff12b50>".to_string()];
        def.request.params = vec!["key=<secret-b29ff12b50>".to_string()];
        def.test_cases = vec![TestCaseOverride {
            name: "other key".to_string(),
            params_data: Some("key=<secret-b29ff12b50>".to_string()),
            post_body_data: Some("{\"p\":\"<secret-b29ff12b50>\"}".to_string()),
        }];

        let resolved = resolver.resolve_request(&def).unwrap();
        assert_eq!(resolved.request.post_body, "{\"password\":\"s3cr3t\"}");
        assert_eq!(resolved.request.basic_auth, "admin:s3cr3t");
        assert_eq!(resolved.request.headers[0], "X-Api-Key: s3cr3t");
        assert_eq!(resolved.request.params[0], "key=s3cr3t");
        assert_eq!(resolved.test_cases[0].params_data.as_deref(), Some("key=s3cr3t"));
        assert_eq!(
            resolved.test_cases[0].post_body_data.as_deref(),
            Some("{\"p\":\"s3cr3t\"}")
        );

        // The catalog value is untouched
        assert!(def.request.basic_auth.contains("<secret-"));
    }
}
