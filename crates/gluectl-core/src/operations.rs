//! The Glue operation table
//!
//! One row per remote operation. Local names follow the verb-noun command
//! conventions (singular `Tag`, `MaxResult`), wire names follow the service
//! API. Flattened nested members use `Parent_Member` locally and
//! `Parent.Member` on the wire.

use crate::descriptor::ConfirmImpact::{High, Medium};
use crate::descriptor::Output::{Collection, Field, Whole};
use crate::descriptor::{ConfirmImpact, FieldSpec as F, OperationDescriptor, Output, Paging};
use crate::error::{CoreError, Result};

const fn op(
    name: &'static str,
    command: &'static str,
    summary: &'static str,
    fields: &'static [F],
    output: Output,
) -> OperationDescriptor {
    OperationDescriptor {
        name,
        command,
        summary,
        fields,
        output,
        paging: None,
        impact: ConfirmImpact::Low,
    }
}

const fn paged(mut d: OperationDescriptor, paging: Paging) -> OperationDescriptor {
    d.paging = Some(paging);
    d
}

const fn impact(mut d: OperationDescriptor, impact: ConfirmImpact) -> OperationDescriptor {
    d.impact = impact;
    d
}

static OPERATIONS: &[OperationDescriptor] = &[
    // Blueprints
    impact(
        op(
            "CreateBlueprint",
            "New-Blueprint",
            "Registers a blueprint",
            &[
                F::string("Name", "Name").required(),
                F::string("BlueprintLocation", "BlueprintLocation").required(),
                F::string("Description", "Description"),
                F::map("Tag", "Tags"),
            ],
            Field("Name"),
        ),
        Medium,
    ),
    impact(
        op(
            "DeleteBlueprint",
            "Remove-Blueprint",
            "Deletes an existing blueprint",
            &[F::string("Name", "Name").required()],
            Field("Name"),
        ),
        High,
    ),
    op(
        "GetBlueprint",
        "Get-Blueprint",
        "Retrieves the details of a blueprint",
        &[
            F::string("Name", "Name").required(),
            F::boolean("IncludeBlueprint", "IncludeBlueprint"),
            F::boolean("IncludeParameterSpec", "IncludeParameterSpec"),
        ],
        Field("Blueprint"),
    ),
    paged(
        op(
            "ListBlueprints",
            "Get-BlueprintList",
            "Lists all blueprint names in an account",
            &[
                F::integer("MaxResult", "MaxResults"),
                F::string("NextToken", "NextToken"),
                F::map("Tag", "Tags"),
            ],
            Collection("Blueprints"),
        ),
        Paging::NEXT_TOKEN,
    ),
    paged(
        op(
            "GetBlueprintRuns",
            "Get-BlueprintRunList",
            "Retrieves the runs of a blueprint",
            &[
                F::string("BlueprintName", "BlueprintName").required(),
                F::integer("MaxResult", "MaxResults"),
                F::string("NextToken", "NextToken"),
            ],
            Collection("BlueprintRuns"),
        ),
        Paging::NEXT_TOKEN,
    ),
    impact(
        op(
            "StartBlueprintRun",
            "Start-BlueprintRun",
            "Starts a new run of the specified blueprint",
            &[
                F::string("BlueprintName", "BlueprintName").required(),
                F::string("RoleArn", "RoleArn").required(),
                F::string("Parameter", "Parameters"),
            ],
            Field("RunId"),
        ),
        Medium,
    ),
    // Catalogs
    op(
        "GetCatalog",
        "Get-Catalog",
        "Retrieves a catalog by identifier",
        &[F::string("CatalogId", "CatalogId").required()],
        Field("Catalog"),
    ),
    paged(
        op(
            "GetCatalogs",
            "Get-CatalogList",
            "Retrieves all catalogs defined under a parent catalog",
            &[
                F::string("ParentCatalogId", "ParentCatalogId"),
                F::boolean("IncludeRoot", "IncludeRoot"),
                F::boolean("Recursive", "Recursive"),
                F::integer("MaxResult", "MaxResults"),
                F::string("NextToken", "NextToken"),
            ],
            Collection("CatalogList"),
        ),
        Paging::NEXT_TOKEN,
    ),
    impact(
        op(
            "DeleteCatalog",
            "Remove-Catalog",
            "Removes the specified catalog",
            &[F::string("CatalogId", "CatalogId").required()],
            Whole,
        ),
        High,
    ),
    // Scripts
    op(
        "CreateScript",
        "New-Script",
        "Transforms a directed acyclic graph into code",
        &[
            F::structure("DagEdge", "DagEdges"),
            F::structure("DagNode", "DagNodes"),
            F::string("Language", "Language"),
        ],
        Whole,
    ),
    op(
        "GetDataflowGraph",
        "Get-DataflowGraph",
        "Transforms a Python script into a directed acyclic graph",
        &[F::string("PythonScript", "PythonScript")],
        Whole,
    ),
    // Jobs
    impact(
        op(
            "CreateJob",
            "New-Job",
            "Creates a new job definition",
            &[
                F::string("Name", "Name").required(),
                F::string("Role", "Role").required(),
                F::structure("Command", "Command").required(),
                F::string("Description", "Description"),
                F::map("DefaultArgument", "DefaultArguments"),
                F::string("GlueVersion", "GlueVersion"),
                F::string("WorkerType", "WorkerType"),
                F::integer("NumberOfWorker", "NumberOfWorkers"),
                F::integer("Timeout", "Timeout"),
                F::integer("MaxRetry", "MaxRetries"),
                F::integer(
                    "ExecutionProperty_MaxConcurrentRun",
                    "ExecutionProperty.MaxConcurrentRuns",
                ),
                F::map("Tag", "Tags"),
            ],
            Field("Name"),
        ),
        Medium,
    ),
    op(
        "GetJob",
        "Get-Job",
        "Retrieves an existing job definition",
        &[F::string("JobName", "JobName").required()],
        Field("Job"),
    ),
    paged(
        op(
            "GetJobs",
            "Get-JobList",
            "Retrieves all current job definitions",
            &[
                F::integer("MaxResult", "MaxResults"),
                F::string("NextToken", "NextToken"),
            ],
            Collection("Jobs"),
        ),
        Paging::NEXT_TOKEN,
    ),
    paged(
        op(
            "ListJobs",
            "Get-JobNameList",
            "Retrieves the names of all job resources, optionally filtered by tag",
            &[
                F::integer("MaxResult", "MaxResults"),
                F::string("NextToken", "NextToken"),
                F::map("Tag", "Tags"),
            ],
            Collection("JobNames"),
        ),
        Paging::NEXT_TOKEN,
    ),
    impact(
        op(
            "UpdateJob",
            "Update-Job",
            "Updates an existing job definition",
            &[
                F::string("JobName", "JobName").required(),
                F::structure("JobUpdate", "JobUpdate").required(),
            ],
            Field("JobName"),
        ),
        Medium,
    ),
    impact(
        op(
            "DeleteJob",
            "Remove-Job",
            "Deletes a job definition",
            &[F::string("JobName", "JobName").required()],
            Field("JobName"),
        ),
        High,
    ),
    impact(
        op(
            "StartJobRun",
            "Start-JobRun",
            "Starts a job run using a job definition",
            &[
                F::string("JobName", "JobName").required(),
                F::string("JobRunId", "JobRunId"),
                F::map("Argument", "Arguments"),
                F::integer("Timeout", "Timeout"),
                F::string("WorkerType", "WorkerType"),
                F::integer("NumberOfWorker", "NumberOfWorkers"),
                F::string("ExecutionClass", "ExecutionClass"),
                F::boolean("JobRunQueuingEnabled", "JobRunQueuingEnabled"),
                F::integer(
                    "NotificationProperty_NotifyDelayAfter",
                    "NotificationProperty.NotifyDelayAfter",
                ),
            ],
            Field("JobRunId"),
        ),
        Medium,
    ),
    op(
        "GetJobRun",
        "Get-JobRun",
        "Retrieves the metadata for a given job run",
        &[
            F::string("JobName", "JobName").required(),
            F::string("RunId", "RunId").required(),
            F::boolean("PredecessorsIncluded", "PredecessorsIncluded"),
        ],
        Field("JobRun"),
    ),
    paged(
        op(
            "GetJobRuns",
            "Get-JobRunList",
            "Retrieves metadata for all runs of a given job definition",
            &[
                F::string("JobName", "JobName").required(),
                F::integer("MaxResult", "MaxResults"),
                F::string("NextToken", "NextToken"),
            ],
            Collection("JobRuns"),
        ),
        Paging::NEXT_TOKEN,
    ),
    impact(
        op(
            "BatchStopJobRun",
            "Stop-JobRunBatch",
            "Stops one or more job runs for a specified job definition",
            &[
                F::string("JobName", "JobName").required(),
                F::list("JobRunId", "JobRunIds").required(),
            ],
            Whole,
        ),
        Medium,
    ),
    op(
        "GetJobBookmark",
        "Get-JobBookmark",
        "Returns information on a job bookmark entry",
        &[
            F::string("JobName", "JobName").required(),
            F::string("RunId", "RunId"),
        ],
        Field("JobBookmarkEntry"),
    ),
    // Databases, tables and partitions
    impact(
        op(
            "CreateDatabase",
            "New-Database",
            "Creates a new database in a Data Catalog",
            &[
                F::string("CatalogId", "CatalogId"),
                F::structure("DatabaseInput", "DatabaseInput").required(),
                F::map("Tag", "Tags"),
            ],
            Whole,
        ),
        Medium,
    ),
    op(
        "GetDatabase",
        "Get-Database",
        "Retrieves the definition of a specified database",
        &[
            F::string("CatalogId", "CatalogId"),
            F::string("Name", "Name").required(),
        ],
        Field("Database"),
    ),
    paged(
        op(
            "GetDatabases",
            "Get-DatabaseList",
            "Retrieves all databases defined in a given Data Catalog",
            &[
                F::string("CatalogId", "CatalogId"),
                F::list("AttributesToGet", "AttributesToGet"),
                F::string("ResourceShareType", "ResourceShareType"),
                F::integer("MaxResult", "MaxResults"),
                F::string("NextToken", "NextToken"),
            ],
            Collection("DatabaseList"),
        ),
        Paging::NEXT_TOKEN,
    ),
    impact(
        op(
            "DeleteDatabase",
            "Remove-Database",
            "Removes a specified database from a Data Catalog",
            &[
                F::string("CatalogId", "CatalogId"),
                F::string("Name", "Name").required(),
            ],
            Whole,
        ),
        High,
    ),
    op(
        "GetTable",
        "Get-Table",
        "Retrieves the table definition in a Data Catalog",
        &[
            F::string("CatalogId", "CatalogId"),
            F::string("DatabaseName", "DatabaseName").required(),
            F::string("Name", "Name").required(),
            F::string("TransactionId", "TransactionId"),
        ],
        Field("Table"),
    ),
    paged(
        op(
            "GetTables",
            "Get-TableList",
            "Retrieves the definitions of some or all of the tables in a database",
            &[
                F::string("CatalogId", "CatalogId"),
                F::string("DatabaseName", "DatabaseName").required(),
                F::string("Expression", "Expression"),
                F::string("TransactionId", "TransactionId"),
                F::integer("MaxResult", "MaxResults"),
                F::string("NextToken", "NextToken"),
            ],
            Collection("TableList"),
        ),
        Paging::NEXT_TOKEN,
    ),
    paged(
        op(
            "GetPartitions",
            "Get-PartitionList",
            "Retrieves information about the partitions in a table",
            &[
                F::string("CatalogId", "CatalogId"),
                F::string("DatabaseName", "DatabaseName").required(),
                F::string("TableName", "TableName").required(),
                F::string("Expression", "Expression"),
                F::boolean("ExcludeColumnSchema", "ExcludeColumnSchema"),
                F::integer("Segment_SegmentNumber", "Segment.SegmentNumber"),
                F::integer("Segment_TotalSegment", "Segment.TotalSegments"),
                F::integer("MaxResult", "MaxResults"),
                F::string("NextToken", "NextToken"),
            ],
            Collection("Partitions"),
        ),
        Paging::NEXT_TOKEN,
    ),
    // Crawlers
    op(
        "GetCrawler",
        "Get-Crawler",
        "Retrieves metadata for a specified crawler",
        &[F::string("Name", "Name").required()],
        Field("Crawler"),
    ),
    paged(
        op(
            "GetCrawlers",
            "Get-CrawlerList",
            "Retrieves metadata for all crawlers defined in the customer account",
            &[
                F::integer("MaxResult", "MaxResults"),
                F::string("NextToken", "NextToken"),
            ],
            Collection("Crawlers"),
        ),
        Paging::NEXT_TOKEN,
    ),
    impact(
        op(
            "StartCrawler",
            "Start-Crawler",
            "Starts a crawl using the specified crawler",
            &[F::string("Name", "Name").required()],
            Whole,
        ),
        Medium,
    ),
    impact(
        op(
            "StopCrawler",
            "Stop-Crawler",
            "Stops the specified crawler if it is running",
            &[F::string("Name", "Name").required()],
            Whole,
        ),
        Medium,
    ),
    paged(
        op(
            "ListCrawls",
            "Get-CrawlList",
            "Returns all the crawls of a specified crawler",
            &[
                F::string("CrawlerName", "CrawlerName").required(),
                F::structure("Filter", "Filters"),
                F::integer("MaxResult", "MaxResults"),
                F::string("NextToken", "NextToken"),
            ],
            Collection("Crawls"),
        ),
        Paging::NEXT_TOKEN,
    ),
    // Triggers
    op(
        "GetTrigger",
        "Get-Trigger",
        "Retrieves the definition of a trigger",
        &[F::string("Name", "Name").required()],
        Field("Trigger"),
    ),
    paged(
        op(
            "GetTriggers",
            "Get-TriggerList",
            "Gets all the triggers associated with a job",
            &[
                F::string("DependentJobName", "DependentJobName"),
                F::integer("MaxResult", "MaxResults"),
                F::string("NextToken", "NextToken"),
            ],
            Collection("Triggers"),
        ),
        Paging::NEXT_TOKEN,
    ),
    // Connections
    op(
        "GetConnection",
        "Get-Connection",
        "Retrieves a connection definition from the Data Catalog",
        &[
            F::string("CatalogId", "CatalogId"),
            F::string("Name", "Name").required(),
            F::boolean("HidePassword", "HidePassword"),
        ],
        Field("Connection"),
    ),
    paged(
        op(
            "GetConnections",
            "Get-ConnectionList",
            "Retrieves a list of connection definitions from the Data Catalog",
            &[
                F::string("CatalogId", "CatalogId"),
                F::string("Filter_ConnectionType", "Filter.ConnectionType"),
                F::list("Filter_MatchCriterion", "Filter.MatchCriteria"),
                F::boolean("HidePassword", "HidePassword"),
                F::integer("MaxResult", "MaxResults"),
                F::string("NextToken", "NextToken"),
            ],
            Collection("ConnectionList"),
        ),
        Paging::NEXT_TOKEN,
    ),
    // Zero-ETL integrations
    impact(
        op(
            "ModifyIntegration",
            "Edit-Integration",
            "Modifies a zero-ETL integration",
            &[
                F::string("IntegrationIdentifier", "IntegrationIdentifier").required(),
                F::string("DataFilter", "DataFilter"),
                F::string("Description", "Description"),
                F::string("IntegrationName", "IntegrationName"),
                F::string(
                    "IntegrationConfig_RefreshInterval",
                    "IntegrationConfig.RefreshInterval",
                ),
                F::map(
                    "IntegrationConfig_SourceProperty",
                    "IntegrationConfig.SourceProperties",
                ),
            ],
            Whole,
        ),
        Medium,
    ),
    paged(
        op(
            "DescribeIntegrations",
            "Get-IntegrationList",
            "Lists zero-ETL integrations, optionally filtered",
            &[
                F::string("IntegrationIdentifier", "IntegrationIdentifier"),
                F::structure("Filter", "Filters"),
                F::integer("MaxRecord", "MaxRecords"),
                F::string("Marker", "Marker"),
            ],
            Collection("Integrations"),
        ),
        Paging::MARKER,
    ),
    paged(
        op(
            "DescribeInboundIntegrations",
            "Get-InboundIntegrationList",
            "Lists inbound zero-ETL integrations for a target",
            &[
                F::string("IntegrationArn", "IntegrationArn"),
                F::string("TargetArn", "TargetArn"),
                F::integer("MaxRecord", "MaxRecords"),
                F::string("Marker", "Marker"),
            ],
            Collection("InboundIntegrations"),
        ),
        Paging::MARKER,
    ),
    impact(
        op(
            "DeleteIntegration",
            "Remove-Integration",
            "Deletes a zero-ETL integration",
            &[F::string("IntegrationIdentifier", "IntegrationIdentifier").required()],
            Whole,
        ),
        High,
    ),
    // Workflows
    op(
        "GetWorkflow",
        "Get-Workflow",
        "Retrieves resource metadata for a workflow",
        &[
            F::string("Name", "Name").required(),
            F::boolean("IncludeGraph", "IncludeGraph"),
        ],
        Field("Workflow"),
    ),
    paged(
        op(
            "ListWorkflows",
            "Get-WorkflowList",
            "Lists names of workflows created in the account",
            &[
                F::integer("MaxResult", "MaxResults"),
                F::string("NextToken", "NextToken"),
            ],
            Collection("Workflows"),
        ),
        Paging::NEXT_TOKEN,
    ),
    impact(
        op(
            "StartWorkflowRun",
            "Start-WorkflowRun",
            "Starts a new run of the specified workflow",
            &[
                F::string("Name", "Name").required(),
                F::map("RunProperty", "RunProperties"),
            ],
            Field("RunId"),
        ),
        Medium,
    ),
    // Tags
    op(
        "GetTags",
        "Get-ResourceTag",
        "Retrieves a list of tags associated with a resource",
        &[F::string("ResourceArn", "ResourceArn").required()],
        Field("Tags"),
    ),
    impact(
        op(
            "TagResource",
            "Add-ResourceTag",
            "Adds tags to a resource",
            &[
                F::string("ResourceArn", "ResourceArn").required(),
                F::map("TagsToAdd", "TagsToAdd").required(),
            ],
            Whole,
        ),
        Medium,
    ),
    impact(
        op(
            "UntagResource",
            "Remove-ResourceTag",
            "Removes tags from a resource",
            &[
                F::string("ResourceArn", "ResourceArn").required(),
                F::list("TagsToRemove", "TagsToRemove").required(),
            ],
            Whole,
        ),
        High,
    ),
    // Security, schemas and classifiers
    paged(
        op(
            "GetSecurityConfigurations",
            "Get-SecurityConfigurationList",
            "Retrieves a list of all security configurations",
            &[
                F::integer("MaxResult", "MaxResults"),
                F::string("NextToken", "NextToken"),
            ],
            Collection("SecurityConfigurations"),
        ),
        Paging::NEXT_TOKEN,
    ),
    paged(
        op(
            "ListSchemas",
            "Get-SchemaList",
            "Returns a list of schemas with minimal details",
            &[
                F::string("RegistryId_RegistryName", "RegistryId.RegistryName"),
                F::string("RegistryId_RegistryArn", "RegistryId.RegistryArn"),
                F::integer("MaxResult", "MaxResults"),
                F::string("NextToken", "NextToken"),
            ],
            Collection("Schemas"),
        ),
        Paging::NEXT_TOKEN,
    ),
    paged(
        op(
            "GetClassifiers",
            "Get-ClassifierList",
            "Lists all classifier objects in the Data Catalog",
            &[
                F::integer("MaxResult", "MaxResults"),
                F::string("NextToken", "NextToken"),
            ],
            Collection("Classifiers"),
        ),
        Paging::NEXT_TOKEN,
    ),
];

/// Every known operation, in table order
pub fn all() -> &'static [OperationDescriptor] {
    OPERATIONS
}

/// Resolve an operation by wire name (`GetBlueprint`), command
/// (`Get-Blueprint`) or subcommand (`get-blueprint`)
pub fn find(name: &str) -> Option<&'static OperationDescriptor> {
    OPERATIONS.iter().find(|d| {
        d.name.eq_ignore_ascii_case(name)
            || d.command.eq_ignore_ascii_case(name)
            || d.cli_name() == name.to_ascii_lowercase()
    })
}

/// Like [`find`], failing with [`CoreError::UnknownOperation`]
pub fn lookup(name: &str) -> Result<&'static OperationDescriptor> {
    find(name).ok_or_else(|| CoreError::UnknownOperation(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_find_by_any_name() {
        assert_eq!(find("GetBlueprint").unwrap().command, "Get-Blueprint");
        assert_eq!(find("get-blueprint").unwrap().name, "GetBlueprint");
        assert_eq!(find("Get-CatalogList").unwrap().name, "GetCatalogs");
        assert!(find("GetNothing").is_none());
    }

    #[test]
    fn test_lookup_reports_unknown_operation() {
        assert_eq!(lookup("Get-Job").unwrap().name, "GetJob");
        let err = lookup("GetNothing").unwrap_err();
        assert!(matches!(err, CoreError::UnknownOperation(ref name) if name == "GetNothing"));
        assert!(err.is_argument_error());
    }

    #[test]
    fn test_names_are_unique() {
        let mut names = HashSet::new();
        let mut commands = HashSet::new();
        for d in all() {
            assert!(names.insert(d.name), "duplicate operation {}", d.name);
            assert!(commands.insert(d.cli_name()), "duplicate command {}", d.command);
        }
    }

    #[test]
    fn test_field_tables_are_consistent() {
        for d in all() {
            let mut locals = HashSet::new();
            for f in d.fields {
                assert!(!f.wire.is_empty(), "{}: empty wire path", d.name);
                assert!(
                    f.wire_path().all(|s| !s.is_empty()),
                    "{}: malformed wire path {}",
                    d.name,
                    f.wire
                );
                assert!(
                    locals.insert(f.local.to_ascii_lowercase()),
                    "{}: duplicate field {}",
                    d.name,
                    f.local
                );
            }
            if let Some(paging) = d.paging {
                let cursor = d.field(paging.input);
                assert!(cursor.is_some(), "{}: cursor field missing", d.name);
                assert!(!cursor.unwrap().required);
            }
        }
    }

    #[test]
    fn test_paginated_operations_return_collections() {
        for d in all().iter().filter(|d| d.is_paginated()) {
            assert!(d.returns_collection(), "{} should return a collection", d.name);
        }
    }

    #[test]
    fn test_marker_paging() {
        let d = find("DescribeIntegrations").unwrap();
        assert_eq!(d.paging, Some(Paging::MARKER));
        assert_eq!(d.field("MaxRecord").unwrap().wire, "MaxRecords");
    }

    #[test]
    fn test_destructive_operations_are_high_impact() {
        for d in all().iter().filter(|d| d.command.starts_with("Remove-")) {
            assert_eq!(d.impact, High, "{} should require confirmation", d.name);
        }
    }
}
