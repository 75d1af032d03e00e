use tracing::{info, warn};

use crate::catalog::RequestDefinition;
use crate::error::Result;
use crate::resolver::resolve_dependencies;
use crate::secrets::{SecretResolver, SecretStore};
use crate::selection::{exclude, select};

/// Which definitions a run should cover.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanOptions<'a> {
    pub id: &'a str,
    pub tags: &'a str,
    pub exclude: &'a str,
}

/// Turn the catalog into an ordered, secret-substituted execution plan.
///
/// Returns `Ok(None)` when the wanted id or tags matched nothing. Malformed or dangling
/// pre-request references and secret store failures are errors.
pub fn build_plan(
    catalog: &[RequestDefinition],
    options: PlanOptions<'_>,
    store: &dyn SecretStore,
) -> Result<Option<Vec<RequestDefinition>>> {
    let remaining = exclude(catalog.to_vec(), options.exclude);
    let selection = select(remaining, options.id, options.tags);
    if selection.not_found {
        warn!("Nothing to run");
        return Ok(None);
    }

    let ordered = resolve_dependencies(catalog, &selection.requests)?;
    let plan = SecretResolver::new(store).resolve_all(&ordered)?;

    info!("Execution plan has {} request definitions", plan.len());
    Ok(Some(plan))
}
