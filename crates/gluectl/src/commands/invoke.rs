//! Running one remote operation from the command line

use anyhow::Context;
use clap::ArgMatches;
use dialoguer::Confirm;
use gluectl_core::{ConfirmImpact, InvocationContext, OperationDescriptor, Page};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cli::{GlobalArgs, context_from_matches, operation::is_forced};
use crate::connection::{ConnectionManager, ConnectionOverrides};
use crate::error::{GlueCtlError, Result as CliResult};
use crate::output;

/// Execute `operation` with the flags in `matches`
pub async fn handle_operation(
    operation: &'static OperationDescriptor,
    matches: &ArgMatches,
    global: &GlobalArgs,
    conn_mgr: &ConnectionManager,
    cancel: &CancellationToken,
) -> CliResult<()> {
    // Bad arguments and selectors fail here, before any connection is made
    let ctx = context_from_matches(operation, matches)?;
    if let Some(query) = global.query.as_deref() {
        output::compile_query(query).map_err(|e| GlueCtlError::InvalidInput {
            message: format!("{:#}", e),
        })?;
    }

    if operation.impact >= ConfirmImpact::High && !is_forced(matches) {
        let prompt = format!("Run {} ({})?", operation.command, describe_target(&ctx));
        if !confirm_action(&prompt)? {
            println!("Operation cancelled");
            return Ok(());
        }
    }

    let invoker = conn_mgr.create_invoker(ConnectionOverrides {
        profile: global.profile.as_deref(),
        region: global.region.as_deref(),
        endpoint_url: global.endpoint_url.as_deref(),
    })?;

    let mut pages: Vec<Page> = Vec::new();
    let result = invoker.invoke(&ctx, &mut pages, cancel).await;

    debug!(
        "{} produced {} item(s)",
        operation.name,
        pages.iter().map(|page| page.items.len()).sum::<usize>()
    );

    // Whatever arrived before a failure is still printed
    if let Some(rendered) = shape_output(&ctx, pages)
        && let Err(e) =
            output::print_output(&rendered, global.output.into(), global.query.as_deref())
    {
        // A remote failure outranks a failure to print the partial results
        if result.is_err() {
            warn!("Could not print partial results: {:#}", e);
        } else {
            return Err(e.into());
        }
    }

    let summary = result?;
    info!(
        "{} finished after {} call(s)",
        operation.name, summary.calls
    );

    if let Some(cursor) = summary.next_cursor
        && let Some(field) = operation.cursor_field()
    {
        eprintln!(
            "More results are available; rerun with --{} {}",
            field.flag(),
            cursor
        );
    }

    Ok(())
}

/// Decide how the collected items are printed
///
/// Collection operations with their default selector always print a list,
/// even an empty one, and so does any selection that was itself a list.
/// Otherwise a single item prints as itself, several items as a list and
/// no items print nothing.
fn shape_output(ctx: &InvocationContext, pages: Vec<Page>) -> Option<Value> {
    let operation = ctx.operation();
    let listed = pages.iter().any(|page| page.listed);
    let mut items: Vec<Value> = pages.into_iter().flat_map(|page| page.items).collect();
    if listed
        || (operation.returns_collection() && *ctx.selector() == operation.default_selector())
    {
        return Some(Value::Array(items));
    }
    match items.len() {
        0 => None,
        1 => items.pop(),
        _ => Some(Value::Array(items)),
    }
}

/// Required inputs, for the confirmation prompt
fn describe_target(ctx: &InvocationContext) -> String {
    let parts: Vec<String> = ctx
        .operation()
        .required_fields()
        .filter_map(|field| {
            ctx.value(field.local)
                .map(|value| format!("{}={}", field.local, value.to_json()))
        })
        .collect();
    if parts.is_empty() {
        ctx.operation().name.to_string()
    } else {
        parts.join(", ")
    }
}

/// Ask before running a destructive operation
///
/// Without a terminal on stdin nothing can be confirmed, so the operation
/// is refused with a warning.
pub fn confirm_action(message: &str) -> CliResult<bool> {
    #[cfg(unix)]
    {
        use std::io::IsTerminal;
        if std::io::stdin().is_terminal() {
            Ok(Confirm::new()
                .with_prompt(message)
                .default(false)
                .interact()
                .context("Failed to get user confirmation")?)
        } else {
            eprintln!("Warning: {} Use --force to skip confirmation.", message);
            Ok(false)
        }
    }

    #[cfg(not(unix))]
    {
        Ok(Confirm::new()
            .with_prompt(message)
            .default(false)
            .interact()
            .context("Failed to get user confirmation")?)
    }
}
