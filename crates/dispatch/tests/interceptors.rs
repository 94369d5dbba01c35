mod common;

use async_trait::async_trait;
use common::{Reported, empty, text, with_recording_sink};
use http::{Method, StatusCode};
use micro_dispatch::{
    Dispatcher, Exchange, InterceptError, Interceptor, Interceptors, Resource, Router, TimingInterceptor, VerbError,
    VerbResult,
};
use std::sync::{Arc, Mutex};

type Trace = Arc<Mutex<Vec<String>>>;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Fault {
    Reject,
    PanicBefore,
    PanicAfter,
}

struct Step {
    name: &'static str,
    fault: Option<Fault>,
    trace: Trace,
}

#[async_trait]
impl Interceptor for Step {
    async fn before(&mut self, _resource: &mut dyn Resource, _exchange: &mut Exchange<'_>) -> Result<(), InterceptError> {
        self.trace.lock().unwrap().push(format!("{}.before", self.name));
        match self.fault {
            Some(Fault::Reject) => Err(InterceptError::rejected(StatusCode::UNAUTHORIZED, "no token")),
            Some(Fault::PanicBefore) => panic!("{} lost its config", self.name),
            Some(Fault::PanicAfter) | None => Ok(()),
        }
    }

    async fn after(&mut self, _resource: &mut dyn Resource, exchange: &mut Exchange<'_>) {
        self.trace.lock().unwrap().push(format!("{}.after:{}", self.name, exchange.status().as_u16()));
        if self.fault == Some(Fault::PanicAfter) {
            panic!("{} could not flush", self.name);
        }
    }
}

/// A resource traced by two interceptors, `a` entered before `b`.
struct Traced {
    trace: Trace,
    fault_in: Option<(&'static str, Fault)>,
    outcome: fn() -> VerbResult,
}

#[async_trait]
impl Resource for Traced {
    fn interceptors(&self) -> Interceptors {
        let step = |name: &'static str| Step {
            name,
            fault: self.fault_in.filter(|(at, _)| *at == name).map(|(_, fault)| fault),
            trace: Arc::clone(&self.trace),
        };
        Interceptors::builder().add_last(step("b")).add_first(step("a")).add_last(TimingInterceptor::new()).build()
    }

    async fn get(&mut self, _exchange: &mut Exchange<'_>) -> VerbResult {
        self.trace.lock().unwrap().push("verb".into());
        (self.outcome)()
    }
}

fn dispatcher(fault_in: Option<(&'static str, Fault)>, outcome: fn() -> VerbResult) -> (Dispatcher, Trace, Reported) {
    let trace = Trace::default();
    let for_factory = Arc::clone(&trace);
    let router = Router::builder()
        .route("/traced", move || Traced { trace: Arc::clone(&for_factory), fault_in, outcome })
        .build()
        .unwrap();
    let (dispatcher, reported) = with_recording_sink(Dispatcher::builder().router(router));
    (dispatcher, trace, reported)
}

fn ok() -> VerbResult {
    Ok(())
}

#[tokio::test]
async fn test_chain_wraps_verb() {
    let (dispatcher, trace, reported) = dispatcher(None, ok);

    let response = dispatcher.serve(empty(Method::GET, "/traced")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(*trace.lock().unwrap(), vec!["a.before", "b.before", "verb", "b.after:200", "a.after:200"]);
    assert!(reported.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_rejection_unwinds_entered_interceptors() {
    let (dispatcher, trace, reported) = dispatcher(Some(("b", Fault::Reject)), ok);

    let response = dispatcher.serve(empty(Method::GET, "/traced")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(text(response).await, "Unauthorized");

    assert_eq!(*trace.lock().unwrap(), vec!["a.before", "b.before", "b.after:401", "a.after:401"]);
    assert_eq!(*reported.lock().unwrap(), vec!["request rejected with 401 Unauthorized: no token".to_string()]);
}

#[tokio::test]
async fn test_after_runs_on_verb_fault() {
    let (dispatcher, trace, reported) = dispatcher(None, || Err(VerbError::fault("disk full")));

    let response = dispatcher.serve(empty(Method::GET, "/traced")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(*trace.lock().unwrap(), vec!["a.before", "b.before", "verb", "b.after:500", "a.after:500"]);
    assert_eq!(reported.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_after_runs_on_missing_verb() {
    let (dispatcher, trace, reported) = dispatcher(None, ok);

    let response = dispatcher.serve(empty(Method::PATCH, "/traced")).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(*trace.lock().unwrap(), vec!["a.before", "b.before", "b.after:405", "a.after:405"]);
    assert!(reported.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_after_runs_when_verb_panics() {
    let (dispatcher, trace, reported) = dispatcher(None, || panic!("verb gave up"));

    let response = dispatcher.serve(empty(Method::GET, "/traced")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(*trace.lock().unwrap(), vec!["a.before", "b.before", "verb", "b.after:500", "a.after:500"]);
    assert_eq!(*reported.lock().unwrap(), vec!["verb handler panicked: verb gave up".to_string()]);
}

#[tokio::test]
async fn test_panic_in_before_unwinds_entered_interceptors() {
    let (dispatcher, trace, reported) = dispatcher(Some(("b", Fault::PanicBefore)), ok);

    let response = dispatcher.serve(empty(Method::GET, "/traced")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text(response).await, "Internal Server Error");

    assert_eq!(*trace.lock().unwrap(), vec!["a.before", "b.before", "b.after:500", "a.after:500"]);
    assert_eq!(*reported.lock().unwrap(), vec!["interceptor panicked: b lost its config".to_string()]);
}

#[tokio::test]
async fn test_panic_in_after_runs_outer_after() {
    let (dispatcher, trace, reported) = dispatcher(Some(("b", Fault::PanicAfter)), ok);

    let response = dispatcher.serve(empty(Method::GET, "/traced")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    assert_eq!(*trace.lock().unwrap(), vec!["a.before", "b.before", "verb", "b.after:200", "a.after:500"]);
    assert_eq!(*reported.lock().unwrap(), vec!["interceptor panicked: b could not flush".to_string()]);
}

struct Reporter;

#[async_trait]
impl Interceptor for Reporter {
    async fn after(&mut self, _resource: &mut dyn Resource, exchange: &mut Exchange<'_>) {
        if exchange.status().is_success() {
            let warning = micro_dispatch::DispatchError::VerbFault { source: "slow response".into() };
            exchange.report(&warning);
        }
    }
}

#[derive(Default)]
struct Reported200;

#[async_trait]
impl Resource for Reported200 {
    fn interceptors(&self) -> Interceptors {
        Interceptors::builder().add_last(Reporter).build()
    }

    async fn get(&mut self, exchange: &mut Exchange<'_>) -> VerbResult {
        exchange.write(b"fine");
        Ok(())
    }
}

#[tokio::test]
async fn test_report_keeps_response() {
    let router = Router::builder().route("/", micro_dispatch::resource::<Reported200>()).build().unwrap();
    let (dispatcher, reported) = with_recording_sink(Dispatcher::builder().router(router));

    let response = dispatcher.serve(empty(Method::GET, "/")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(text(response).await, "fine");
    assert_eq!(*reported.lock().unwrap(), vec!["verb handler failed: slow response".to_string()]);
}
