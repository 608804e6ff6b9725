//! Operation catalog commands

use comfy_table::Table;
use gluectl_core::{OperationDescriptor, Output, operations};
use serde_json::{Value, json};
use tracing::debug;

use crate::cli::{OperationsCommands, OutputFormat};
use crate::error::Result as CliResult;
use crate::output;

pub fn handle_operations_command(
    cmd: &OperationsCommands,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    match cmd {
        OperationsCommands::List { filter } => handle_list(filter.as_deref(), output_format, query),
        OperationsCommands::Describe { name } => handle_describe(name, output_format, query),
    }
}

fn matching(filter: Option<&str>) -> Vec<&'static OperationDescriptor> {
    let needle = filter.map(str::to_ascii_lowercase);
    operations::all()
        .iter()
        .filter(|op| match &needle {
            Some(needle) => {
                op.name.to_ascii_lowercase().contains(needle)
                    || op.command.to_ascii_lowercase().contains(needle)
            }
            None => true,
        })
        .collect()
}

fn handle_list(
    filter: Option<&str>,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    let ops = matching(filter);
    debug!("{} operation(s) match {:?}", ops.len(), filter);

    match output_format {
        OutputFormat::Auto => {
            if ops.is_empty() {
                println!("No operations match.");
                return Ok(());
            }
            let mut table = Table::new();
            table.set_header(vec!["COMMAND", "OPERATION", "OUTPUT", "PAGING", "SUMMARY"]);
            for op in &ops {
                table.add_row(vec![
                    op.cli_name(),
                    op.name.to_string(),
                    output_label(op.output),
                    op.paging.map(|p| p.input).unwrap_or("-").to_string(),
                    op.summary.to_string(),
                ]);
            }
            println!("{table}");
        }
        _ => {
            let rows: Vec<Value> = ops.iter().map(|op| summary_json(op)).collect();
            output::print_output(&rows, output_format.into(), query)?;
        }
    }
    Ok(())
}

fn handle_describe(name: &str, output_format: OutputFormat, query: Option<&str>) -> CliResult<()> {
    let op = operations::lookup(name)?;

    match output_format {
        OutputFormat::Auto => {
            println!("{} ({})", op.command, op.name);
            println!("  {}", op.summary);
            println!();
            println!("Command:   gluectl {}", op.cli_name());
            println!("Output:    {}", output_label(op.output));
            println!("Selector:  {}", op.default_selector());
            if let Some(paging) = op.paging {
                println!(
                    "Paging:    {} (response field {})",
                    paging.input, paging.output
                );
            }
            println!("Impact:    {:?}", op.impact);
            println!();

            let mut table = Table::new();
            table.set_header(vec!["FLAG", "PARAMETER", "WIRE", "TYPE", "REQUIRED"]);
            for field in op.fields {
                table.add_row(vec![
                    format!("--{}", field.flag()),
                    field.local.to_string(),
                    field.wire.to_string(),
                    field.ty.label().to_string(),
                    if field.required { "yes" } else { "" }.to_string(),
                ]);
            }
            println!("{table}");
        }
        _ => {
            let mut doc = summary_json(op);
            doc["impact"] = json!(format!("{:?}", op.impact));
            doc["parameters"] = op
                .fields
                .iter()
                .map(|field| {
                    json!({
                        "name": field.local,
                        "flag": format!("--{}", field.flag()),
                        "wire": field.wire,
                        "type": field.ty.label(),
                        "required": field.required,
                    })
                })
                .collect();
            output::print_output(&doc, output_format.into(), query)?;
        }
    }
    Ok(())
}

fn output_label(output: Output) -> String {
    match output {
        Output::Field(name) => name.to_string(),
        Output::Collection(name) => format!("{}[]", name),
        Output::Whole => "*".to_string(),
    }
}

fn summary_json(op: &OperationDescriptor) -> Value {
    json!({
        "command": op.command,
        "cli": op.cli_name(),
        "operation": op.name,
        "summary": op.summary,
        "output": output_label(op.output),
        "paging": op.paging.map(|p| p.input),
    })
}
