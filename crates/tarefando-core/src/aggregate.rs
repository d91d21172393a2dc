use crate::task::{
  Payload,
  Task
};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum DisplayStatus {
  Pending,
  Completed,
  Cancelled
}

/// Cancelled wins over Completed when a
/// task carries both flags.
#[must_use]
pub fn resolve_status(
  task: &Task
) -> DisplayStatus {
  if task.is_canceled {
    DisplayStatus::Cancelled
  } else if task.is_completed {
    DisplayStatus::Completed
  } else {
    DisplayStatus::Pending
  }
}

/// Only tasks still pending offer the
/// complete/cancel actions.
#[must_use]
pub fn offers_actions(
  task: &Task
) -> bool {
  resolve_status(task)
    == DisplayStatus::Pending
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
)]
pub struct GroupSummary {
  pub total:     usize,
  pub completed: usize,
  pub pending:   usize,
  pub canceled:  usize
}

impl GroupSummary {
  fn record(
    &mut self,
    status: DisplayStatus
  ) {
    self.total += 1;
    match status {
      | DisplayStatus::Pending => {
        self.pending += 1
      }
      | DisplayStatus::Completed => {
        self.completed += 1
      }
      | DisplayStatus::Cancelled => {
        self.canceled += 1
      }
    }
  }
}

#[must_use]
pub fn summarize<'a, I>(
  tasks: I
) -> GroupSummary
where
  I: IntoIterator<Item = &'a Task>
{
  tasks.into_iter().fold(
    GroupSummary::default(),
    |mut summary, task| {
      summary
        .record(resolve_status(task));
      summary
    }
  )
}

#[must_use]
pub fn summarize_payload(
  payload: &Payload
) -> GroupSummary {
  summarize(payload.tasks())
}
