#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use parking_lot::Mutex;
use tarefando_core::controller::{Renderer, ViewSnapshot, ViewStateController};
use tarefando_core::error::TransportError;
use tarefando_core::mutation::Notifier;
use tarefando_core::task::{DayGroup, Payload, Task, TaskId, TaskType};
use tarefando_core::transport::{StatusChange, Transport};
use tokio::sync::oneshot;

type LoadReply = Result<Payload, TransportError>;

struct IssuedLoad {
    grouped: bool,
    reply: Option<oneshot::Sender<LoadReply>>,
}

/// Transport whose loads stay in flight until the test resolves them, in
/// whatever order it likes. With `answering`, loads reply immediately.
#[derive(Default)]
pub struct ScriptedTransport {
    loads: Mutex<Vec<IssuedLoad>>,
    canned: Mutex<Option<(Payload, Payload)>>,
    status_calls: Mutex<Vec<(TaskId, StatusChange)>>,
    status_failure: Mutex<Option<TransportError>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn answering(flat: Payload, grouped: Payload) -> Arc<Self> {
        let transport = Self::default();
        *transport.canned.lock() = Some((flat, grouped));
        Arc::new(transport)
    }

    pub fn fail_status_changes(&self, err: TransportError) {
        *self.status_failure.lock() = Some(err);
    }

    pub fn issued(&self) -> usize {
        self.loads.lock().len()
    }

    pub fn issued_modes(&self) -> Vec<bool> {
        self.loads.lock().iter().map(|load| load.grouped).collect()
    }

    pub fn status_calls(&self) -> Vec<(TaskId, StatusChange)> {
        self.status_calls.lock().clone()
    }

    pub fn resolve(&self, index: usize, reply: LoadReply) {
        let sender = self.loads.lock()[index]
            .reply
            .take()
            .expect("load resolved twice");
        let _ = sender.send(reply);
    }

    pub async fn wait_for_loads(&self, count: usize) {
        while self.issued() < count {
            tokio::task::yield_now().await;
        }
    }
}

impl Transport for ScriptedTransport {
    fn load_tasks(&self, grouped: bool) -> impl Future<Output = LoadReply> + Send {
        let canned = self.canned.lock().clone();
        let (tx, rx) = oneshot::channel();
        let reply = match canned {
            Some((flat, grouped_payload)) => {
                let _ = tx.send(Ok(if grouped { grouped_payload } else { flat }));
                None
            }
            None => Some(tx),
        };
        self.loads.lock().push(IssuedLoad { grouped, reply });

        async move {
            rx.await
                .unwrap_or_else(|_| Err(TransportError::Network("load abandoned".to_string())))
        }
    }

    fn change_status(
        &self,
        id: &TaskId,
        change: StatusChange,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        self.status_calls.lock().push((id.clone(), change));
        let outcome = match self.status_failure.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        };
        async move { outcome }
    }
}

/// Keeps every frame the controller renders.
#[derive(Default)]
pub struct Frames(Mutex<Vec<ViewSnapshot>>);

impl Frames {
    pub fn all(&self) -> Vec<ViewSnapshot> {
        self.0.lock().clone()
    }

    pub fn last(&self) -> Option<ViewSnapshot> {
        self.0.lock().last().cloned()
    }
}

impl Renderer for Frames {
    fn render(&self, snapshot: &ViewSnapshot) {
        self.0.lock().push(snapshot.clone());
    }
}

#[derive(Default)]
pub struct Alerts(Mutex<Vec<(StatusChange, TaskId)>>);

impl Alerts {
    pub fn all(&self) -> Vec<(StatusChange, TaskId)> {
        self.0.lock().clone()
    }
}

impl Notifier for Alerts {
    fn mutation_failed(&self, change: StatusChange, id: &TaskId, _error: &TransportError) {
        self.0.lock().push((change, id.clone()));
    }
}

pub type TestView = ViewStateController<ScriptedTransport, Arc<Frames>, Arc<Alerts>>;

pub fn view(transport: Arc<ScriptedTransport>) -> (TestView, Arc<Frames>, Arc<Alerts>) {
    let frames = Arc::new(Frames::default());
    let alerts = Arc::new(Alerts::default());
    let view = ViewStateController::new(transport, frames.clone(), alerts.clone());
    (view, frames, alerts)
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).expect("valid date")
}

pub fn task(id: &str, completed: bool, canceled: bool) -> Task {
    let created = Utc
        .with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp");
    let mut task = Task::new(id, format!("task {id}"), TaskType::Normal, created);
    task.is_completed = completed;
    task.is_canceled = canceled;
    task
}

pub fn flat(ids: &[&str]) -> Payload {
    Payload::Flat(ids.iter().map(|id| task(id, false, false)).collect())
}

pub fn grouped(days: &[(u32, &[&str])]) -> Payload {
    Payload::Grouped(
        days.iter()
            .map(|(d, ids)| DayGroup {
                day: day(*d),
                tasks: ids.iter().map(|id| task(id, false, false)).collect(),
            })
            .collect(),
    )
}
