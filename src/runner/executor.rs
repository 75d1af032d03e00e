use std::path::PathBuf;

use tracing::{debug, error, info};

use crate::auth::{TokenRelay, inject_auth_token, record_auth_token};
use crate::catalog::RequestDefinition;
use crate::diff::has_changed;
use crate::http::HttpDelegate;
use crate::query::{QueryDelegate, format_response};
use crate::report::{Issue, Report, RunResult};
use crate::runner::types::{RunOutcome, output_path};
use crate::shutdown::{ShutdownReceiver, is_shutdown_requested};
use crate::variant::{ResolvedRequest, expand};

/// Sequential executor of an execution plan.
pub struct Executor {
    http: Box<dyn HttpDelegate>,
    query: Box<dyn QueryDelegate>,
    output_dir: PathBuf,
}

impl Executor {
    pub fn new(
        http: Box<dyn HttpDelegate>,
        query: Box<dyn QueryDelegate>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            http,
            query,
            output_dir: output_dir.into(),
        }
    }

    /// Execute the plan in order, one request at a time.
    ///
    /// The shutdown channel is polled before every request and variant; on a signal the loop
    /// stops and whatever was accumulated so far is returned. Execution and formatting
    /// failures never abort the loop.
    pub async fn execute_all(
        &self,
        plan: &[RequestDefinition],
        relay: &mut TokenRelay,
        shutdown_rx: &mut ShutdownReceiver,
    ) -> RunOutcome {
        let mut outcome = RunOutcome::default();

        for (index, def) in plan.iter().enumerate() {
            if !def.is_active {
                debug!("Skipping inactive request \"{}\"", def.id);
                outcome.skipped += 1;
                continue;
            }

            info!("Run: {}, Request: \"{}\"", index + 1, def.id);
            let def = if def.pre_request_id.is_some() {
                inject_auth_token(def, relay)
            } else {
                def.clone()
            };

            for variant in expand(&def) {
                if is_shutdown_requested(shutdown_rx) {
                    info!("Shutdown requested, stopping the run");
                    outcome.cancelled = true;
                    return outcome;
                }

                if let Some(test_case) = variant.test_case_index {
                    debug!("Run: {}, Test case: {}", index + 1, test_case + 1);
                }

                self.process(
                    &variant,
                    relay,
                    &mut outcome.result,
                    &mut outcome.report,
                )
                .await;
                outcome.executed += 1;
            }
        }

        outcome
    }

    /// Execute, format, relay or diff a single variant.
    pub async fn process(
        &self,
        variant: &ResolvedRequest,
        relay: &mut TokenRelay,
        result: &mut RunResult,
        report: &mut Report,
    ) {
        let def = &variant.definition;
        let output_file = output_path(&self.output_dir, def, variant.test_case_index);
        let issue = |status_code: &str| Issue {
            id: def.id.clone(),
            description: def.request.description.clone(),
            endpoint: def.request.endpoint.clone(),
            status_code: status_code.to_string(),
            output_file_path: output_file.to_string_lossy().into_owned(),
            test_case: variant.test_case_name().to_string(),
        };

        let response = match self.http.execute(def).await {
            Ok(response) => response,
            Err(e) => {
                error!("Failed endpoint request \"{}\": {}", def.request.endpoint, e);
                result.record_request_error();
                report.add_issue(issue(e.status_code()));
                return;
            }
        };

        let formatted = match format_response(self.query.as_ref(), &def.query, response.body).await {
            Ok(formatted) => formatted,
            Err(e) => {
                error!("Failed processing JSON query. Error: {}", e);
                result.record_format_error();
                report.add_issue(issue(&response.status));
                return;
            }
        };

        if def.is_auth_request {
            record_auth_token(relay, &def.id, &String::from_utf8_lossy(&formatted));
            debug!("No output file written for auth request \"{}\"", def.id);
            return;
        }

        match has_changed(&formatted, &output_file) {
            Ok(true) => {
                info!("Output changed: \"{}\"", output_file.display());
                result.record_changed_file();
                report.add_issue(issue(&response.status));
            }
            Ok(false) => {}
            Err(e) => error!(
                "Failed to compare output \"{}\". Error: {}",
                output_file.display(),
                e
            ),
        }
    }
}
