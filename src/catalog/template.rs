use serde_json::json;

/// File name of the generated definition template
pub const TEMPLATE_FILE: &str = "new-template.json";

/// A single-definition file with `id` filled in and every other field at its placeholder.
pub fn definition_template(id: &str) -> serde_json::Result<String> {
    let template = json!([
        {
            "id": id,
            "isActive": true,
            "isAuthRequest": false,
            "preRequestId": "",
            "request": {
                "description": "...",
                "method": "GET",
                "url": "https://...",
                "endpoint": "/...",
                "basicAuth": "",
                "headers": [],
                "params": [],
                "postBody": {}
            },
            "testCases": [
                {
                    "name": "",
                    "paramsData": "",
                    "postBodyData": {}
                }
            ],
            "tags": ["env-prod"],
            "jq": ""
        }
    ]);
    serde_json::to_string_pretty(&template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogLoader;
    use std::path::Path;

    #[test]
    fn test_template_is_a_loadable_definition() {
        let content = definition_template("ab12cd34ef").unwrap();
        let requests = CatalogLoader::parse_content(&content, Path::new(TEMPLATE_FILE)).unwrap();

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].id, "ab12cd34ef");
        assert!(requests[0].has_tag("env-prod"));
        assert!(requests[0].test_cases[0].is_empty());
    }

    #[test]
    fn test_template_keeps_field_order() {
        let content = definition_template("ab12cd34ef").unwrap();
        let id = content.find("\"id\"").unwrap();
        let request = content.find("\"request\"").unwrap();
        let jq = content.find("\"jq\"").unwrap();
        assert!(id < request && request < jq);
    }
}
