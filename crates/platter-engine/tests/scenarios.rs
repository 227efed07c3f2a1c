//! Integration tests: the full fetch/cache protocol against a mock
//! transport.
//!
//! Each test runs inside a `LocalSet` so deferred selector fetches can
//! execute. The mock transport records every request and parks each one
//! on a oneshot channel, so tests control completion order explicitly.

use async_trait::async_trait;
use platter_engine::{
    DataSpec, EngineError, EntityDescriptor, Method, OperationDescriptor, Outcome, Platter,
    RequestConfig, Schema, Transport, TransportError, TransportReply, TransportRequest, UrlSpec,
};
use platter_normal::{EntityShape, ResultRef, Shape};
use platter_store::{StatusState, StoreState};
use serde_json::{Value, json};
use std::cell::RefCell;
use std::rc::Rc;
use tokio::sync::oneshot;
use tokio::task::LocalSet;

#[derive(Default)]
struct MockTransport {
    requests: RefCell<Vec<TransportRequest>>,
    pending: RefCell<Vec<oneshot::Sender<Result<TransportReply, TransportError>>>>,
}

#[async_trait(?Send)]
impl Transport for MockTransport {
    async fn invoke(&self, request: TransportRequest) -> Result<TransportReply, TransportError> {
        self.requests.borrow_mut().push(request);
        let (tx, rx) = oneshot::channel();
        self.pending.borrow_mut().push(tx);
        rx.await
            .unwrap_or_else(|_| Err(TransportError::new("transport dropped")))
    }
}

impl MockTransport {
    fn call_count(&self) -> usize {
        self.requests.borrow().len()
    }

    fn request(&self, index: usize) -> TransportRequest {
        self.requests.borrow()[index].clone()
    }

    /// Complete the pending request at `index` (in arrival order among
    /// the still-unresolved ones).
    fn resolve(&self, index: usize, data: Value) {
        let tx = self.pending.borrow_mut().remove(index);
        let _ = tx.send(Ok(TransportReply { data }));
    }

    fn reject(&self, index: usize, message: &str) {
        let tx = self.pending.borrow_mut().remove(index);
        let _ = tx.send(Err(TransportError::new(message)));
    }
}

fn task_shape() -> Shape {
    Shape::entity(EntityShape::new("task").build())
}

fn schema() -> Schema {
    Schema::new().entity(
        "tasks",
        EntityDescriptor::new()
            .shape(task_shape())
            .operation(
                "GetAll",
                OperationDescriptor::new(UrlSpec::computed(|args| {
                    format!("/users/{}/tasks", args.first().and_then(Value::as_i64).unwrap_or(0))
                }))
                .shape(Shape::list(task_shape())),
            )
            .operation(
                "GetOne",
                OperationDescriptor::new(UrlSpec::computed(|args| {
                    format!("/tasks/{}", args.first().and_then(Value::as_str).unwrap_or(""))
                }))
                .selects(|args| {
                    args.first()
                        .and_then(Value::as_str)
                        .map(|id| ResultRef::Id(id.to_string()))
                }),
            )
            .operation(
                "GetTitles",
                OperationDescriptor::new("/tasks")
                    .shape(Shape::list(task_shape()))
                    .returns(|value| {
                        let titles = value
                            .as_array()
                            .map(|tasks| {
                                tasks
                                    .iter()
                                    .filter_map(|task| task.get("title").cloned())
                                    .collect()
                            })
                            .unwrap_or_default();
                        Value::Array(titles)
                    }),
            )
            .operation(
                "CreateOne",
                OperationDescriptor::new("/tasks")
                    .method(Method::Post)
                    .data(DataSpec::ByProperty("task".to_string())),
            )
            .operation(
                "GetAuthed",
                OperationDescriptor::new("/secure")
                    .shape(Shape::Unit)
                    .header("X-Requested-With", "tests")
                    .pre_req(|config: RequestConfig| {
                        config.header("Authorization", "Bearer sikret")
                    }),
            )
            .operation("Ping", OperationDescriptor::new("/ping").shape(Shape::Unit)),
    )
}

fn setup() -> (Platter, Rc<MockTransport>) {
    let transport = Rc::new(MockTransport::default());
    let engine = Platter::new(schema(), transport.clone()).expect("schema builds");
    (engine, transport)
}

/// Let deferred tasks and woken completions run.
async fn drain() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

fn one_task() -> Value {
    json!([{"id": "1", "title": "x", "completed": false}])
}

#[tokio::test]
async fn scenario_a_first_read_misses_then_fetches_once() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let (engine, transport) = setup();

            let state = engine.snapshot();
            let tasks = engine.select(&state, "tasksGetAll", &[json!(1)]).unwrap();
            assert!(tasks.is_none());
            // Deferred, never inline.
            assert_eq!(transport.call_count(), 0);

            drain().await;
            assert_eq!(transport.call_count(), 1);
            let request = transport.request(0);
            assert_eq!(request.method, Method::Get);
            assert_eq!(request.url, "/users/1/tasks");
            assert!(request.body.is_none());

            transport.resolve(0, one_task());
            drain().await;

            let state = engine.snapshot();
            let tasks = engine.select(&state, "tasksGetAll", &[json!(1)]).unwrap();
            assert_eq!(tasks, Some(one_task()));
            assert!(engine.is_success(&state, "tasksGetAll", &[json!(1)]).unwrap());

            // Idempotent: repeated reads never re-fetch.
            let again = engine.select(&state, "tasksGetAll", &[json!(1)]).unwrap();
            assert_eq!(again, Some(one_task()));
            drain().await;
            assert_eq!(transport.call_count(), 1);
        })
        .await;
}

#[tokio::test]
async fn scenario_b_distinct_arguments_are_independent_requests() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let (engine, transport) = setup();

            let state = engine.snapshot();
            assert!(engine.select(&state, "tasksGetAll", &[json!(1)]).unwrap().is_none());
            assert!(engine.select(&state, "tasksGetAll", &[json!(2)]).unwrap().is_none());

            drain().await;
            assert_eq!(transport.call_count(), 2);
            assert_eq!(transport.request(0).url, "/users/1/tasks");
            assert_eq!(transport.request(1).url, "/users/2/tasks");

            // Resolving the first leaves the second in flight and empty.
            transport.resolve(0, one_task());
            drain().await;

            let state = engine.snapshot();
            assert_eq!(
                engine.select(&state, "tasksGetAll", &[json!(1)]).unwrap(),
                Some(one_task())
            );
            assert!(engine.select(&state, "tasksGetAll", &[json!(2)]).unwrap().is_none());
            assert!(engine.is_processing(&state, "tasksGetAll", &[json!(2)]).unwrap());
            drain().await;
            assert_eq!(transport.call_count(), 2);
        })
        .await;
}

#[tokio::test]
async fn scenario_c_transport_failure_is_recorded_and_reraised() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let (engine, transport) = setup();

            let in_flight = engine.call("tasksGetAll", vec![json!(1)]).unwrap();
            let handle = tokio::task::spawn_local(in_flight);
            drain().await;

            let state = engine.snapshot();
            assert!(engine.is_processing(&state, "tasksGetAll", &[json!(1)]).unwrap());

            transport.reject(0, "boom");
            let outcome = handle.await.unwrap();
            assert!(matches!(outcome, Err(EngineError::Transport(_))));

            let state = engine.snapshot();
            let status = engine.status(&state, "tasksGetAll", &[json!(1)]).unwrap().unwrap();
            assert_eq!(status.state, StatusState::Error);
            assert_eq!(status.error.as_deref(), Some("boom"));
            assert!(status.updated_at > 0);

            // Null result: the selector reads nothing and does not retrigger.
            assert!(engine.select(&state, "tasksGetAll", &[json!(1)]).unwrap().is_none());
            assert!(engine.is_error(&state, "tasksGetAll", &[json!(1)]).unwrap());
            assert!(!engine.is_processing(&state, "tasksGetAll", &[json!(1)]).unwrap());
            drain().await;
            assert_eq!(transport.call_count(), 1);
        })
        .await;
}

#[tokio::test]
async fn scenario_d_reset_clears_and_retriggers() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let (engine, transport) = setup();

            let state = engine.snapshot();
            engine.select(&state, "tasksGetAll", &[json!(1)]).unwrap();
            drain().await;
            transport.resolve(0, one_task());
            drain().await;

            engine.reset();
            let state = engine.snapshot();
            assert_eq!(state, StoreState::default());

            assert!(engine.select(&state, "tasksGetAll", &[json!(1)]).unwrap().is_none());
            drain().await;
            assert_eq!(transport.call_count(), 2);
        })
        .await;
}

#[test]
fn scenario_e_argument_error_is_synchronous_and_silent() {
    let (engine, transport) = setup();

    let err = engine.call("tasksCreateOne", Vec::new()).err().unwrap();
    assert!(matches!(err, EngineError::Argument(_)));
    assert_eq!(transport.call_count(), 0);
    assert_eq!(engine.snapshot(), StoreState::default());
}

#[tokio::test]
async fn same_turn_duplicate_reads_fetch_once() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let (engine, transport) = setup();

            let state = engine.snapshot();
            engine.select(&state, "tasksGetAll", &[json!(1)]).unwrap();
            engine.select(&state, "tasksGetAll", &[json!(1)]).unwrap();

            drain().await;
            // The second deferred task sees Processing and backs off.
            assert_eq!(transport.call_count(), 1);
        })
        .await;
}

#[tokio::test]
async fn selects_projects_entities_cached_by_get_all() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let (engine, transport) = setup();

            let state = engine.snapshot();
            engine.select(&state, "tasksGetAll", &[json!(1)]).unwrap();
            drain().await;
            transport.resolve(0, one_task());
            drain().await;

            // The single-entity value is readable immediately, before
            // GetOne's own round trip completes.
            let state = engine.snapshot();
            let one = engine.select(&state, "tasksGetOne", &[json!("1")]).unwrap();
            assert_eq!(one, Some(json!({"id": "1", "title": "x", "completed": false})));

            // The lazy protocol still schedules GetOne's fetch.
            drain().await;
            assert_eq!(transport.call_count(), 2);
            assert_eq!(transport.request(1).url, "/tasks/1");
        })
        .await;
}

#[tokio::test]
async fn returns_transforms_the_denormalized_value() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let (engine, transport) = setup();

            let state = engine.snapshot();
            engine.select(&state, "tasksGetTitles", &[]).unwrap();
            drain().await;
            transport.resolve(0, one_task());
            drain().await;

            let state = engine.snapshot();
            let titles = engine.select(&state, "tasksGetTitles", &[]).unwrap();
            assert_eq!(titles, Some(json!(["x"])));
        })
        .await;
}

#[tokio::test]
async fn pre_req_rewrites_the_outgoing_config() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let (engine, transport) = setup();

            let in_flight = engine.call("tasksGetAuthed", Vec::new()).unwrap();
            let handle = tokio::task::spawn_local(in_flight);
            drain().await;

            let request = transport.request(0);
            assert_eq!(
                request.config.headers.get("Authorization").map(String::as_str),
                Some("Bearer sikret")
            );
            assert_eq!(
                request.config.headers.get("X-Requested-With").map(String::as_str),
                Some("tests")
            );

            transport.resolve(0, json!({}));
            handle.await.unwrap().unwrap();
        })
        .await;
}

#[tokio::test]
async fn post_body_comes_from_the_mapped_property() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let (engine, transport) = setup();

            let in_flight = engine
                .call("tasksCreateOne", vec![json!({"task": {"title": "new"}})])
                .unwrap();
            let handle = tokio::task::spawn_local(in_flight);
            drain().await;

            let request = transport.request(0);
            assert_eq!(request.method, Method::Post);
            assert_eq!(request.body, Some(json!({"title": "new"})));

            transport.resolve(0, json!({"id": "9", "title": "new"}));
            let outcome = handle.await.unwrap().unwrap();
            assert_eq!(outcome, Outcome::Stored(ResultRef::Id("9".to_string())));
        })
        .await;
}

#[tokio::test]
async fn scalar_body_passes_through_uncached() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let (engine, transport) = setup();

            let in_flight = engine.call("tasksPing", Vec::new()).unwrap();
            let handle = tokio::task::spawn_local(in_flight);
            drain().await;
            transport.resolve(0, json!("pong"));

            let outcome = handle.await.unwrap().unwrap();
            assert_eq!(outcome, Outcome::Passthrough(json!("pong")));

            // Nothing cached; the Processing write stays stale.
            let state = engine.snapshot();
            assert!(engine.select(&state, "tasksPing", &[]).unwrap().is_none());
            assert!(engine.is_processing(&state, "tasksPing", &[]).unwrap());
        })
        .await;
}

#[tokio::test]
async fn partial_records_merge_across_operations() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let (engine, transport) = setup();

            let state = engine.snapshot();
            engine.select(&state, "tasksGetAll", &[json!(1)]).unwrap();
            drain().await;
            transport.resolve(0, json!([{"id": "1", "title": "x"}]));
            drain().await;

            let in_flight = engine.call("tasksGetOne", vec![json!("1")]).unwrap();
            let handle = tokio::task::spawn_local(in_flight);
            drain().await;
            transport.resolve(0, json!({"id": "1", "completed": true}));
            handle.await.unwrap().unwrap();

            let state = engine.snapshot();
            let one = engine.select(&state, "tasksGetOne", &[json!("1")]).unwrap();
            assert_eq!(one, Some(json!({"id": "1", "title": "x", "completed": true})));
        })
        .await;
}
