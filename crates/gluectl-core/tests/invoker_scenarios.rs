//! End-to-end invoker behaviour against a scripted in-memory transport

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gluectl_core::{
    BindingWarning, CoreError, FieldValue, GlueTransport, InvocationContext, Invoker, Page,
    Selector, TransportError, operations, sink_fn,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

const ENDPOINT: &str = "https://glue.nowhere-1.amazonaws.com";

/// Replays canned responses in order and records every request
#[derive(Default)]
struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<Value, TransportError>>>,
    requests: Mutex<Vec<(String, Value)>>,
    cancel_after_call: Mutex<Option<CancellationToken>>,
}

impl ScriptedTransport {
    fn new(responses: Vec<Result<Value, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            ..Default::default()
        })
    }

    fn ok(responses: Vec<Value>) -> Arc<Self> {
        Self::new(responses.into_iter().map(Ok).collect())
    }

    fn cancel_on_first_call(&self, token: CancellationToken) {
        *self.cancel_after_call.lock().unwrap() = Some(token);
    }

    fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().unwrap().clone()
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl GlueTransport for ScriptedTransport {
    async fn call(&self, operation: &str, request: &Value) -> Result<Value, TransportError> {
        self.requests
            .lock()
            .unwrap()
            .push((operation.to_string(), request.clone()));
        if let Some(token) = self.cancel_after_call.lock().unwrap().take() {
            token.cancel();
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Connection("script exhausted".to_string())))
    }

    fn endpoint(&self) -> &str {
        ENDPOINT
    }
}

fn context(name: &str) -> InvocationContext {
    InvocationContext::new(operations::find(name).unwrap())
}

async fn run(
    transport: &Arc<ScriptedTransport>,
    ctx: &InvocationContext,
) -> (Vec<Page>, Result<gluectl_core::InvocationSummary, CoreError>) {
    let invoker = Invoker::new(Arc::clone(transport));
    let mut pages = Vec::new();
    let result = invoker
        .invoke(ctx, &mut pages, &CancellationToken::new())
        .await;
    (pages, result)
}

fn all_items(pages: &[Page]) -> Vec<Value> {
    pages.iter().flat_map(|p| p.items.clone()).collect()
}

#[tokio::test]
async fn three_page_token_chain_makes_exactly_three_calls() {
    let transport = ScriptedTransport::ok(vec![
        json!({"Jobs": [{"Name": "a"}], "NextToken": "t1"}),
        json!({"Jobs": [{"Name": "b"}], "NextToken": "t2"}),
        json!({"Jobs": [{"Name": "c"}], "NextToken": ""}),
    ]);

    let (pages, result) = run(&transport, &context("GetJobs")).await;
    let summary = result.unwrap();

    assert_eq!(summary.calls, 3);
    assert_eq!(transport.calls(), 3);
    assert_eq!(
        pages.iter().filter(|p| p.cursor.is_some()).count(),
        2,
        "only the first two responses carry a cursor"
    );

    let sent: Vec<Value> = transport.requests().into_iter().map(|(_, r)| r).collect();
    assert_eq!(
        sent,
        vec![json!({}), json!({"NextToken": "t1"}), json!({"NextToken": "t2"})]
    );
}

#[tokio::test]
async fn catalog_list_concatenates_items_in_page_order() {
    let transport = ScriptedTransport::ok(vec![
        json!({"CatalogList": [{"Name": "c1"}, {"Name": "c2"}], "NextToken": "A"}),
        json!({"CatalogList": [{"Name": "c3"}], "NextToken": "B"}),
        json!({"CatalogList": [{"Name": "c4"}], "NextToken": ""}),
    ]);

    let (pages, result) = run(&transport, &context("Get-CatalogList")).await;
    result.unwrap();

    assert_eq!(
        all_items(&pages),
        vec![
            json!({"Name": "c1"}),
            json!({"Name": "c2"}),
            json!({"Name": "c3"}),
            json!({"Name": "c4"}),
        ]
    );
    assert_eq!(
        pages.iter().map(|p| p.number).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert!(transport.requests().iter().all(|(op, _)| op == "GetCatalogs"));
}

#[tokio::test]
async fn get_blueprint_returns_only_the_blueprint_object() {
    let blueprint = json!({"Name": "b1", "Status": "ACTIVE"});
    let transport = ScriptedTransport::ok(vec![json!({
        "Blueprint": blueprint,
        "ResponseMetadata": {"RequestId": "r-1"}
    })]);

    let mut ctx = context("Get-Blueprint");
    ctx.bind("Name", "b1").unwrap();
    let (pages, result) = run(&transport, &ctx).await;
    result.unwrap();

    assert_eq!(all_items(&pages), vec![blueprint]);
    assert_eq!(transport.requests(), vec![("GetBlueprint".to_string(), json!({"Name": "b1"}))]);
}

#[tokio::test]
async fn update_job_returns_the_job_name() {
    let transport = ScriptedTransport::ok(vec![json!({"JobName": "j1"})]);

    let mut ctx = context("Update-Job");
    ctx.bind("JobName", "j1").unwrap();
    ctx.bind("JobUpdate", json!({"Role": "arn:aws:iam::1:role/glue"}))
        .unwrap();
    let (pages, result) = run(&transport, &ctx).await;

    assert!(result.unwrap().warnings.is_empty());
    assert_eq!(all_items(&pages), vec![json!("j1")]);
}

#[tokio::test]
async fn name_resolution_failure_names_the_endpoint() {
    let transport = ScriptedTransport::new(vec![Err(TransportError::NameResolution {
        endpoint: ENDPOINT.to_string(),
        message: "dns error: failed to lookup address information".to_string(),
    })]);

    let mut ctx = context("GetBlueprint");
    ctx.bind("Name", "b1").unwrap();
    let (pages, result) = run(&transport, &ctx).await;

    let err = result.unwrap_err();
    assert!(pages.is_empty());
    assert!(matches!(err, CoreError::NameResolution { .. }));
    assert!(err.to_string().contains(ENDPOINT), "{err}");
    assert!(err.transport().unwrap().is_name_resolution());
}

#[tokio::test]
async fn service_errors_keep_the_transport_error_as_source() {
    let transport = ScriptedTransport::new(vec![Err(TransportError::Service {
        status: 400,
        code: "EntityNotFoundException".to_string(),
        message: "Blueprint b9 not found".to_string(),
    })]);

    let mut ctx = context("GetBlueprint");
    ctx.bind("Name", "b9").unwrap();
    let (_, result) = run(&transport, &ctx).await;

    let err = result.unwrap_err();
    assert!(err.is_not_found());
    let source = std::error::Error::source(&err).unwrap();
    assert!(source.to_string().contains("Blueprint b9 not found"));
}

#[tokio::test]
async fn unpaginated_operations_call_once_regardless_of_no_auto_iteration() {
    for no_auto_iteration in [false, true] {
        // A stray NextToken in the response must not trigger another call
        let transport = ScriptedTransport::ok(vec![
            json!({"Job": {"Name": "j1"}, "NextToken": "ignored"}),
            json!({"Job": {"Name": "unexpected"}}),
        ]);
        let mut ctx = context("GetJob").with_no_auto_iteration(no_auto_iteration);
        ctx.bind("JobName", "j1").unwrap();

        let (pages, result) = run(&transport, &ctx).await;
        let summary = result.unwrap();

        assert_eq!(transport.calls(), 1);
        assert_eq!(summary.next_cursor, None);
        assert_eq!(pages[0].cursor, None);
    }
}

#[tokio::test]
async fn no_auto_iteration_stops_after_first_page_and_reports_cursor() {
    let transport = ScriptedTransport::ok(vec![
        json!({"Crawlers": [{"Name": "cr1"}], "NextToken": "more"}),
        json!({"Crawlers": [{"Name": "cr2"}]}),
    ]);

    let ctx = context("GetCrawlers").with_no_auto_iteration(true);
    let (pages, result) = run(&transport, &ctx).await;
    let summary = result.unwrap();

    assert_eq!(transport.calls(), 1);
    assert_eq!(pages.len(), 1);
    assert_eq!(summary.next_cursor.as_deref(), Some("more"));
}

#[tokio::test]
async fn caller_supplied_cursor_fetches_a_single_page() {
    let transport = ScriptedTransport::ok(vec![
        json!({"Integrations": [{"IntegrationName": "i2"}], "Marker": "m2"}),
        json!({"Integrations": [{"IntegrationName": "i3"}]}),
    ]);

    let mut ctx = context("Get-IntegrationList");
    ctx.bind("Marker", "m1").unwrap();
    ctx.bind("MaxRecord", 1_i64).unwrap();
    let (_, result) = run(&transport, &ctx).await;
    let summary = result.unwrap();

    assert_eq!(
        transport.requests(),
        vec![(
            "DescribeIntegrations".to_string(),
            json!({"MaxRecords": 1, "Marker": "m1"})
        )]
    );
    assert_eq!(summary.next_cursor.as_deref(), Some("m2"));
}

#[tokio::test]
async fn repeated_read_only_invocations_are_structurally_identical() {
    let page = json!({"DatabaseList": [{"Name": "sales"}, {"Name": "hr"}]});
    let transport = ScriptedTransport::ok(vec![page.clone(), page]);
    let ctx = context("GetDatabases");

    let (first, _) = run(&transport, &ctx).await;
    let (second, _) = run(&transport, &ctx).await;

    assert_eq!(first, second);
    let requests = transport.requests();
    assert_eq!(requests[0], requests[1]);
}

#[tokio::test]
async fn wildcard_selection_is_a_superset_of_field_selection() {
    let response = json!({"JobName": "j1", "ResponseMetadata": {"RequestId": "r"}});
    let op = operations::find("UpdateJob").unwrap();

    let transport = ScriptedTransport::ok(vec![response.clone(), response.clone()]);
    let mut base = InvocationContext::new(op);
    base.bind("JobName", "j1").unwrap();
    base.bind("JobUpdate", json!({})).unwrap();

    let whole = base.clone().with_selector(Selector::parse("*", op).unwrap());
    let (whole_pages, _) = run(&transport, &whole).await;
    let named = base.with_selector(Selector::parse("JobName", op).unwrap());
    let (named_pages, _) = run(&transport, &named).await;

    let whole_item = &whole_pages[0].items[0];
    let named_item = &named_pages[0].items[0];
    assert_eq!(whole_item, &response);
    assert_eq!(whole_item["JobName"], *named_item);
    assert!(whole_item.as_object().unwrap().len() > 1);
}

#[tokio::test]
async fn echo_selector_returns_the_bound_input() {
    let transport = ScriptedTransport::ok(vec![json!({})]);
    let op = operations::find("StartCrawler").unwrap();
    let mut ctx = InvocationContext::new(op).with_selector(Selector::parse("^Name", op).unwrap());
    ctx.bind("Name", "nightly").unwrap();

    let (pages, result) = run(&transport, &ctx).await;
    result.unwrap();
    assert_eq!(all_items(&pages), vec![json!("nightly")]);
}

#[tokio::test]
async fn required_field_bound_empty_is_sent_with_a_warning() {
    let transport = ScriptedTransport::ok(vec![json!({"JobName": ""})]);
    let mut ctx = context("UpdateJob");
    ctx.bind("JobName", "").unwrap();
    ctx.bind("JobUpdate", FieldValue::Null).unwrap();

    let (_, result) = run(&transport, &ctx).await;
    let summary = result.unwrap();

    assert_eq!(
        summary.warnings,
        vec![
            BindingWarning::RequiredEmpty { parameter: "JobName" },
            BindingWarning::RequiredEmpty { parameter: "JobUpdate" },
        ]
    );
    assert_eq!(
        transport.requests()[0].1,
        json!({"JobName": "", "JobUpdate": null})
    );
}

#[tokio::test]
async fn required_field_left_unbound_is_omitted_with_a_warning() {
    let transport = ScriptedTransport::ok(vec![json!({})]);
    let ctx = context("GetBlueprint");

    let (_, result) = run(&transport, &ctx).await;
    let summary = result.unwrap();

    assert_eq!(
        summary.warnings,
        vec![BindingWarning::RequiredUnbound { parameter: "Name" }]
    );
    assert_eq!(transport.requests()[0].1, json!({}));
}

#[tokio::test]
async fn cancellation_is_observed_before_the_next_call() {
    let transport = ScriptedTransport::ok(vec![
        json!({"Triggers": [{"Name": "t1"}], "NextToken": "n1"}),
        json!({"Triggers": [{"Name": "t2"}]}),
    ]);
    let cancel = CancellationToken::new();
    transport.cancel_on_first_call(cancel.clone());

    let invoker = Invoker::new(Arc::clone(&transport));
    let mut pages = Vec::new();
    let err = invoker
        .invoke(&context("GetTriggers"), &mut pages, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CoreError::Cancelled {
            completed_calls: 1,
            ..
        }
    ));
    assert_eq!(transport.calls(), 1);
    assert_eq!(pages.len(), 1, "the completed page is still delivered");
}

#[tokio::test]
async fn cancelled_before_start_makes_no_calls() {
    let transport = ScriptedTransport::ok(vec![json!({})]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let invoker = Invoker::new(Arc::clone(&transport));
    let mut pages: Vec<Page> = Vec::new();
    let result = invoker
        .invoke(&context("GetClassifiers"), &mut pages, &cancel)
        .await;

    assert!(matches!(
        result,
        Err(CoreError::Cancelled {
            completed_calls: 0,
            ..
        })
    ));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn pages_emitted_before_a_failure_remain_delivered() {
    let transport = ScriptedTransport::new(vec![
        Ok(json!({"TableList": [{"Name": "t1"}], "NextToken": "p2"})),
        Err(TransportError::Service {
            status: 400,
            code: "ThrottlingException".to_string(),
            message: "Rate exceeded".to_string(),
        }),
    ]);

    let mut ctx = context("GetTables");
    ctx.bind("DatabaseName", "sales").unwrap();

    let mut delivered = Vec::new();
    let invoker = Invoker::new(Arc::clone(&transport));
    let mut sink = sink_fn(|page: Page| delivered.extend(page.items));
    let err = invoker
        .invoke(&ctx, &mut sink, &CancellationToken::new())
        .await
        .unwrap_err();
    drop(sink);

    assert!(err.is_throttled());
    assert_eq!(delivered, vec![json!({"Name": "t1"})]);
    assert_eq!(transport.calls(), 2, "no retry after the failure");
}

#[tokio::test]
async fn missing_selected_field_emits_no_items() {
    let transport = ScriptedTransport::ok(vec![json!({"NextToken": ""})]);
    let (pages, result) = run(&transport, &context("GetSecurityConfigurations")).await;

    result.unwrap();
    assert_eq!(pages.len(), 1);
    assert!(pages[0].items.is_empty());
}
