use super::{commands, dispatch, telemetry};
use anyhow::Result;

/// Main orchestrator - Pure orchestration with no business logic
///
/// 1. Parse: Extract CLI arguments (every argument falls back to its env var)
/// 2. Initialize Telemetry: Set up structured logging/tracing
/// 3. Dispatch: Convert `ArgMatches` into typed Action enum
/// 4. Execute: Run the action's business logic
///
/// # Errors
///
/// Returns an error if any step in the flow fails
pub async fn start() -> Result<()> {
    let matches = commands::new().get_matches();

    let filter = matches
        .get_one::<String>("log-level")
        .map_or(commands::DEFAULT_LOG_FILTER, String::as_str);
    telemetry::init(filter)?;

    let action = dispatch::dispatch(&matches)?;

    action.execute().await?;

    Ok(())
}
