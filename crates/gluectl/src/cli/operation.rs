//! Subcommands generated from operation descriptors

use std::io::Read;

use clap::{Arg, ArgAction, ArgMatches, Command};
use gluectl_core::{
    ConfirmImpact, FieldSpec, FieldType, InvocationContext, OperationDescriptor, Output, Selector,
};

use crate::error::{GlueCtlError, Result as CliResult};

pub const SELECT_ARG: &str = "select";
pub const NO_AUTO_ITERATION_ARG: &str = "no_auto_iteration";
pub const FORCE_ARG: &str = "force";

/// Build the subcommand for one operation
pub fn operation_command(op: &'static OperationDescriptor) -> Command {
    let mut cmd = Command::new(op.cli_name())
        .about(op.summary)
        .long_about(long_about(op))
        .visible_alias(op.command);

    for field in op.fields {
        cmd = cmd.arg(field_arg(op, field));
    }

    cmd = cmd.arg(
        Arg::new(SELECT_ARG)
            .long("select")
            .value_name("EXPR")
            .help(format!(
                "What to return: a response field, '*' for the whole response or '^Param' to echo an input [default: {}]",
                op.default_selector()
            )),
    );

    if op.is_paginated() {
        cmd = cmd.arg(
            Arg::new(NO_AUTO_ITERATION_ARG)
                .long("no-auto-iteration")
                .action(ArgAction::SetTrue)
                .help("Fetch a single page and report the continuation token instead of following it"),
        );
    }

    if op.impact > ConfirmImpact::Low {
        cmd = cmd.arg(
            Arg::new(FORCE_ARG)
                .long("force")
                .short('f')
                .action(ArgAction::SetTrue)
                .help("Skip the confirmation prompt"),
        );
    }

    cmd
}

fn long_about(op: &OperationDescriptor) -> String {
    let output = match op.output {
        Output::Field(name) => format!("Returns the {} field of the response.", name),
        Output::Collection(name) => format!("Returns the items of the {} collection.", name),
        Output::Whole => "Returns the whole response.".to_string(),
    };
    let mut text = format!("{}\n\n{} ({})\n{}", op.summary, op.command, op.name, output);
    if let Some(paging) = op.paging {
        text.push_str(&format!(
            "\nPages are followed automatically using {}.",
            paging.input
        ));
    }
    text
}

fn field_arg(op: &OperationDescriptor, field: &'static FieldSpec) -> Arg {
    let mut help = match field.ty {
        FieldType::Structure => "JSON text, @file or - for stdin".to_string(),
        FieldType::StringMap => "KEY=VALUE (repeatable) or a JSON object".to_string(),
        FieldType::StringList => "String (repeatable)".to_string(),
        other => capitalize(other.label()),
    };
    if field.wire != field.local {
        help.push_str(&format!(" [wire: {}]", field.wire));
    }
    if op.cursor_field().is_some_and(|cursor| cursor.local == field.local) {
        help.push_str(" (continuation token; fetches a single page)");
    }
    if field.required {
        help.push_str(" (required)");
    }

    let arg = Arg::new(field.local)
        .long(field.flag())
        .value_name(value_name(field.ty))
        .help(help);

    match field.ty {
        FieldType::Boolean => arg
            .action(ArgAction::Set)
            .num_args(0..=1)
            .default_missing_value("true"),
        FieldType::Integer => arg.action(ArgAction::Set).allow_negative_numbers(true),
        FieldType::StringList | FieldType::StringMap => arg.action(ArgAction::Append),
        FieldType::String | FieldType::Structure => arg.action(ArgAction::Set),
    }
}

fn value_name(ty: FieldType) -> &'static str {
    match ty {
        FieldType::String | FieldType::StringList => "STRING",
        FieldType::Boolean => "BOOL",
        FieldType::Integer => "INT",
        FieldType::StringMap => "KEY=VALUE",
        FieldType::Structure => "JSON",
    }
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Turn parsed flags into an invocation context
///
/// Argument and selector errors surface here, before any network activity.
pub fn context_from_matches(
    op: &'static OperationDescriptor,
    matches: &ArgMatches,
) -> CliResult<InvocationContext> {
    let mut ctx = InvocationContext::new(op);

    for field in op.fields {
        let Some(values) = matches.get_many::<String>(field.local) else {
            continue;
        };
        let raw = values
            .map(|value| match field.ty {
                FieldType::Structure => read_structure_arg(value),
                _ => Ok(value.clone()),
            })
            .collect::<CliResult<Vec<_>>>()?;
        ctx.bind_raw(field.local, &raw)?;
    }

    if let Ok(Some(expression)) = matches.try_get_one::<String>(SELECT_ARG) {
        ctx = ctx.with_selector(Selector::parse(expression, op)?);
    }

    if let Ok(Some(true)) = matches.try_get_one::<bool>(NO_AUTO_ITERATION_ARG) {
        ctx = ctx.with_no_auto_iteration(true);
    }

    Ok(ctx)
}

/// Whether `--force` was given
pub fn is_forced(matches: &ArgMatches) -> bool {
    matches!(matches.try_get_one::<bool>(FORCE_ARG), Ok(Some(true)))
}

/// Read JSON text from a literal, `@file` or `-` (stdin)
fn read_structure_arg(value: &str) -> CliResult<String> {
    if value == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| GlueCtlError::FileError {
                path: "<stdin>".to_string(),
                message: e.to_string(),
            })?;
        Ok(buffer)
    } else if let Some(file_path) = value.strip_prefix('@') {
        std::fs::read_to_string(file_path).map_err(|e| GlueCtlError::FileError {
            path: file_path.to_string(),
            message: e.to_string(),
        })
    } else {
        Ok(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gluectl_core::{FieldValue, operations};
    use serde_json::json;

    fn parse(op_name: &str, args: &[&str]) -> CliResult<InvocationContext> {
        let op = operations::find(op_name).unwrap();
        let matches = operation_command(op)
            .try_get_matches_from(std::iter::once(op.cli_name().as_str()).chain(args.iter().copied()))
            .unwrap();
        context_from_matches(op, &matches)
    }

    #[test]
    fn test_flags_bind_by_local_name() {
        let ctx = parse("Get-CatalogList", &["--max-result", "25", "--recursive"]).unwrap();
        assert_eq!(ctx.value("MaxResult"), Some(&FieldValue::Integer(25)));
        assert_eq!(ctx.value("Recursive"), Some(&FieldValue::Boolean(true)));

        let (request, _) = ctx.build_request();
        assert_eq!(request, json!({"MaxResults": 25, "Recursive": true}));
    }

    #[test]
    fn test_repeatable_and_structure_flags() {
        let ctx = parse(
            "Stop-JobRunBatch",
            &["--job-name", "j1", "--job-run-id", "r1", "--job-run-id", "r2"],
        )
        .unwrap();
        let (request, warnings) = ctx.build_request();
        assert!(warnings.is_empty());
        assert_eq!(request, json!({"JobName": "j1", "JobRunIds": ["r1", "r2"]}));

        let ctx = parse(
            "Update-Job",
            &["--job-name", "j1", "--job-update", r#"{"Role": "etl"}"#],
        )
        .unwrap();
        let (request, _) = ctx.build_request();
        assert_eq!(request["JobUpdate"], json!({"Role": "etl"}));
    }

    #[test]
    fn test_structure_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("update.json");
        std::fs::write(&path, r#"{"Description": "from file"}"#).unwrap();
        let arg = format!("@{}", path.display());

        let ctx = parse("Update-Job", &["--job-name", "j1", "--job-update", &arg]).unwrap();
        let (request, _) = ctx.build_request();
        assert_eq!(request["JobUpdate"]["Description"], "from file");

        let err = parse(
            "Update-Job",
            &["--job-name", "j1", "--job-update", "@/definitely/missing.json"],
        )
        .unwrap_err();
        assert!(matches!(err, GlueCtlError::FileError { .. }));
    }

    #[test]
    fn test_invalid_values_are_input_errors() {
        let err = parse("Get-CatalogList", &["--max-result", "many"]).unwrap_err();
        assert!(matches!(err, GlueCtlError::InvalidInput { .. }));
        assert!(err.to_string().contains("MaxResult"));

        let err = parse("Get-Blueprint", &["--name", "b1", "--select", "^Nope"]).unwrap_err();
        assert!(matches!(err, GlueCtlError::InvalidInput { .. }));
    }

    #[test]
    fn test_select_and_paging_flags() {
        let ctx = parse(
            "Get-CatalogList",
            &["--select", "*", "--no-auto-iteration"],
        )
        .unwrap();
        assert_eq!(ctx.selector(), &Selector::WholeResponse);
        assert!(ctx.no_auto_iteration());

        let ctx = parse("Start-Crawler", &["--name", "c1", "--select", "^name"]).unwrap();
        assert_eq!(ctx.selector(), &Selector::EchoInput("Name".to_string()));
    }

    #[test]
    fn test_optional_flags_follow_descriptor() {
        let get_blueprint = operation_command(operations::find("GetBlueprint").unwrap());
        assert!(get_blueprint.get_arguments().all(|a| a.get_id() != NO_AUTO_ITERATION_ARG));
        assert!(get_blueprint.get_arguments().all(|a| a.get_id() != FORCE_ARG));

        let delete = operation_command(operations::find("Remove-Blueprint").unwrap());
        assert!(delete.get_arguments().any(|a| a.get_id() == FORCE_ARG));

        let matches = delete
            .try_get_matches_from(["remove-blueprint", "--name", "b1", "--force"])
            .unwrap();
        assert!(is_forced(&matches));
    }

    #[test]
    fn test_flattened_member_flag_matches_field() {
        let op = operations::find("ModifyIntegration").unwrap();
        let field = op.field("IntegrationConfig_RefreshInterval").unwrap();
        let cmd = operation_command(op);
        let arg = cmd
            .get_arguments()
            .find(|a| a.get_id() == field.local)
            .unwrap();
        assert_eq!(arg.get_long(), Some(field.flag().as_str()));
    }
}
