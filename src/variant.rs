use crate::catalog::RequestDefinition;

/// A definition placed in the execution plan, either as written or with one test case applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRequest {
    pub definition: RequestDefinition,

    /// Index of the originating test case; `None` for the primary request
    pub test_case_index: Option<usize>,
}

impl ResolvedRequest {
    pub fn primary(definition: RequestDefinition) -> Self {
        Self {
            definition,
            test_case_index: None,
        }
    }

    /// Test case name for reporting, empty for the primary request.
    pub fn test_case_name(&self) -> &str {
        match self.test_case_index {
            Some(index) => self.definition.test_case_name(index),
            None => "",
        }
    }
}

/// Replace the parameter with the same key as `value`, or append it.
///
/// The key is everything before the first `=`. Other parameters keep their order.
pub fn replace_query_param(params: &[String], value: &str) -> Vec<String> {
    let key = value.split_once('=').map_or(value, |(key, _)| key);
    let mut replaced = false;

    let mut result: Vec<String> = params
        .iter()
        .map(|param| {
            let matches = param.split_once('=').is_some_and(|(k, _)| k == key);
            if !replaced && matches {
                replaced = true;
                value.to_string()
            } else {
                param.clone()
            }
        })
        .collect();

    if !replaced {
        result.push(value.to_string());
    }
    result
}

/// Expand a definition into its primary request followed by one variant per usable test case.
///
/// Test cases with neither a param nor a body override are skipped silently.
pub fn expand(def: &RequestDefinition) -> Vec<ResolvedRequest> {
    let mut variants = vec![ResolvedRequest::primary(def.clone())];

    for (index, test_case) in def.test_cases.iter().enumerate() {
        if test_case.is_empty() {
            continue;
        }

        let mut definition = def.clone();
        if let Some(params_data) = test_case.params_data.as_deref() {
            definition.request.params = replace_query_param(&def.request.params, params_data);
        }
        if let Some(body) = test_case.post_body_data.as_deref() {
            definition.request.post_body = body.to_string();
        }

        variants.push(ResolvedRequest {
            definition,
            test_case_index: Some(index),
        });
    }

    variants
}
