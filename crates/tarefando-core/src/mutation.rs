use std::future::Future;
use std::sync::Arc;

use tracing::{
  error,
  info
};

use crate::error::TransportError;
use crate::task::TaskId;
use crate::transport::{
  StatusChange,
  Transport
};

/// Tells the user a status change did not
/// go through.
pub trait Notifier: Send + Sync {
  fn mutation_failed(
    &self,
    change: StatusChange,
    id: &TaskId,
    error: &TransportError
  );
}

impl<N: Notifier + ?Sized> Notifier
  for Arc<N>
{
  fn mutation_failed(
    &self,
    change: StatusChange,
    id: &TaskId,
    error: &TransportError
  ) {
    (**self).mutation_failed(
      change, id, error
    )
  }
}

/// Reloads the view in the given mode
/// after a mutation settles.
pub trait Resync: Sync {
  fn resync(
    &self,
    grouped: bool
  ) -> impl Future<Output = ()> + Send;
}

pub struct MutationDispatcher<T, N> {
  transport: Arc<T>,
  notifier:  N
}

impl<T: Transport, N: Notifier>
  MutationDispatcher<T, N>
{
  pub fn new(
    transport: Arc<T>,
    notifier: N
  ) -> Self {
    Self {
      transport,
      notifier
    }
  }

  pub async fn complete<S: Resync>(
    &self,
    id: &TaskId,
    grouped: bool,
    resync: &S
  ) -> Result<(), TransportError> {
    self
      .dispatch(
        StatusChange::Complete,
        id,
        grouped,
        resync
      )
      .await
  }

  pub async fn cancel<S: Resync>(
    &self,
    id: &TaskId,
    grouped: bool,
    resync: &S
  ) -> Result<(), TransportError> {
    self
      .dispatch(
        StatusChange::Cancel,
        id,
        grouped,
        resync
      )
      .await
  }

  /// One request, then exactly one
  /// resync whatever the outcome.
  #[tracing::instrument(skip(self, id, resync), fields(id = %id))]
  async fn dispatch<S: Resync>(
    &self,
    change: StatusChange,
    id: &TaskId,
    grouped: bool,
    resync: &S
  ) -> Result<(), TransportError> {
    let result = self
      .transport
      .change_status(id, change)
      .await;

    match &result {
      | Ok(()) => {
        info!(
          action = change.path_segment(),
          "status change accepted"
        );
      }
      | Err(err) => {
        error!(
          action = change.path_segment(),
          error = %err,
          "status change failed"
        );
        self
          .notifier
          .mutation_failed(change, id, err);
      }
    }

    resync.resync(grouped).await;
    result
  }
}
