pub mod executor;
pub mod plan;
pub mod reporter;
pub mod types;

pub use executor::Executor;
pub use plan::{PlanOptions, build_plan};
pub use reporter::RunReporter;
pub use types::{RunOutcome, output_path};
