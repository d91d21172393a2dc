use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{
  debug,
  error,
  info
};

use crate::error::TransportError;
use crate::task::Payload;
use crate::transport::Transport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
  Idle,
  Pending,
  Loaded(Payload),
  Failed(TransportError)
}

impl LoadState {
  pub fn payload(
    &self
  ) -> Option<&Payload> {
    match self {
      | Self::Loaded(payload) => {
        Some(payload)
      }
      | _ => None
    }
  }
}

/// Handle for one issued load. Only the
/// ticket carrying the latest sequence
/// may write the visible state.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct LoadTicket {
  sequence: u64,
  grouped:  bool
}

impl LoadTicket {
  pub fn sequence(self) -> u64 {
    self.sequence
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum LoadOutcome {
  Applied,
  /// A newer load was issued before
  /// this one settled; its result was
  /// dropped.
  Superseded
}

struct FetchSlot {
  latest: u64,
  state:  LoadState
}

pub struct TaskFetcher<T> {
  transport: Arc<T>,
  slot:      Mutex<FetchSlot>
}

impl<T: Transport> TaskFetcher<T> {
  pub fn new(transport: Arc<T>) -> Self {
    Self {
      transport,
      slot: Mutex::new(FetchSlot {
        latest: 0,
        state:  LoadState::Idle
      })
    }
  }

  /// Supersedes whatever is in flight
  /// and moves the visible state to
  /// Pending.
  pub fn begin(
    &self,
    grouped: bool
  ) -> LoadTicket {
    let mut slot = self.slot.lock();
    slot.latest += 1;
    slot.state = LoadState::Pending;
    debug!(
      sequence = slot.latest,
      grouped,
      "task load issued"
    );
    LoadTicket {
      sequence: slot.latest,
      grouped
    }
  }

  pub async fn fetch(
    &self,
    ticket: LoadTicket
  ) -> Result<Payload, TransportError> {
    self
      .transport
      .load_tasks(ticket.grouped)
      .await
  }

  pub fn settle(
    &self,
    ticket: LoadTicket,
    result: Result<
      Payload,
      TransportError
    >
  ) -> LoadOutcome {
    let mut slot = self.slot.lock();
    if slot.latest != ticket.sequence {
      debug!(
        sequence = ticket.sequence,
        latest = slot.latest,
        grouped = ticket.grouped,
        "discarding superseded task load"
      );
      return LoadOutcome::Superseded;
    }

    slot.state = match result {
      | Ok(payload) => {
        info!(
          sequence = ticket.sequence,
          grouped = ticket.grouped,
          tasks = payload.tasks().count(),
          "task load applied"
        );
        LoadState::Loaded(payload)
      }
      | Err(err) => {
        error!(
          sequence = ticket.sequence,
          grouped = ticket.grouped,
          error = %err,
          "task load failed"
        );
        LoadState::Failed(err)
      }
    };
    LoadOutcome::Applied
  }

  #[tracing::instrument(skip(self))]
  pub async fn run(
    &self,
    grouped: bool
  ) -> LoadOutcome {
    let ticket = self.begin(grouped);
    let result = self.fetch(ticket).await;
    self.settle(ticket, result)
  }

  pub fn state(&self) -> LoadState {
    self.slot.lock().state.clone()
  }

  pub fn latest_sequence(&self) -> u64 {
    self.slot.lock().latest
  }
}

#[cfg(test)]
mod tests {
  use std::future::Future;
  use std::sync::Arc;

  use chrono::{
    TimeZone,
    Utc
  };

  use super::{
    LoadOutcome,
    LoadState,
    TaskFetcher
  };
  use crate::error::TransportError;
  use crate::task::{
    Payload,
    Task,
    TaskId,
    TaskType
  };
  use crate::transport::{
    StatusChange,
    Transport
  };

  struct Unreachable;

  impl Transport for Unreachable {
    fn load_tasks(
      &self,
      _grouped: bool
    ) -> impl Future<
      Output = Result<
        Payload,
        TransportError
      >
    > + Send {
      async {
        Err(TransportError::Network(
          "offline".to_string()
        ))
      }
    }

    fn change_status(
      &self,
      _id: &TaskId,
      _change: StatusChange
    ) -> impl Future<
      Output = Result<(), TransportError>
    > + Send {
      async { Ok(()) }
    }
  }

  fn flat(title: &str) -> Payload {
    let created = Utc
      .with_ymd_and_hms(
        2025, 3, 1, 9, 0, 0
      )
      .single()
      .expect("valid timestamp");
    Payload::Flat(vec![Task::new(
      "1",
      title,
      TaskType::Normal,
      created
    )])
  }

  fn fetcher() -> TaskFetcher<Unreachable>
  {
    TaskFetcher::new(Arc::new(
      Unreachable
    ))
  }

  #[test]
  fn starts_idle_and_goes_pending_on_begin()
   {
    let fetcher = fetcher();
    assert_eq!(
      fetcher.state(),
      LoadState::Idle
    );
    let ticket = fetcher.begin(false);
    assert_eq!(ticket.sequence(), 1);
    assert_eq!(
      fetcher.state(),
      LoadState::Pending
    );
  }

  #[test]
  fn stale_settlement_is_discarded() {
    let fetcher = fetcher();
    let first = fetcher.begin(false);
    let second = fetcher.begin(true);

    assert_eq!(
      fetcher
        .settle(second, Ok(flat("new"))),
      LoadOutcome::Applied
    );
    assert_eq!(
      fetcher
        .settle(first, Ok(flat("old"))),
      LoadOutcome::Superseded
    );
    assert_eq!(
      fetcher.state(),
      LoadState::Loaded(flat("new"))
    );
  }

  #[test]
  fn stale_failure_never_surfaces() {
    let fetcher = fetcher();
    let first = fetcher.begin(false);
    let second = fetcher.begin(false);
    fetcher
      .settle(second, Ok(flat("fresh")));

    let outcome = fetcher.settle(
      first,
      Err(TransportError::Http {
        status: 500
      })
    );
    assert_eq!(
      outcome,
      LoadOutcome::Superseded
    );
    assert_eq!(
      fetcher.state(),
      LoadState::Loaded(flat("fresh"))
    );
  }

  #[test]
  fn sequence_numbers_strictly_increase() {
    let fetcher = fetcher();
    let a = fetcher.begin(false);
    let b = fetcher.begin(false);
    let c = fetcher.begin(true);
    assert!(a.sequence() < b.sequence());
    assert!(b.sequence() < c.sequence());
    assert_eq!(
      fetcher.latest_sequence(),
      c.sequence()
    );
  }

  #[tokio::test]
  async fn transport_failure_becomes_failed_state()
   {
    let fetcher = fetcher();
    assert_eq!(
      fetcher.run(false).await,
      LoadOutcome::Applied
    );
    assert_eq!(
      fetcher.state(),
      LoadState::Failed(
        TransportError::Network(
          "offline".to_string()
        )
      )
    );
  }
}
