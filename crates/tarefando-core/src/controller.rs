use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;
use tracing::{
  debug,
  info,
  warn
};

use crate::aggregate::{
  GroupSummary,
  summarize,
  summarize_payload
};
use crate::error::{
  DraftError,
  TransportError
};
use crate::fetcher::{
  LoadOutcome,
  LoadState,
  TaskFetcher
};
use crate::mutation::{
  MutationDispatcher,
  Notifier,
  Resync
};
use crate::task::{
  Payload,
  TaskId,
  TaskType
};
use crate::transport::Transport;

/// Fields of a task being composed in the
/// modal.
#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Eq,
)]
pub struct Draft {
  pub title:       String,
  pub description: String,
  pub task_type:   Option<TaskType>
}

impl Draft {
  pub fn is_empty(&self) -> bool {
    *self == Self::default()
  }

  pub fn validate(
    &self
  ) -> Result<AcceptedDraft, DraftError>
  {
    let title = self.title.trim();
    if title.is_empty() {
      return Err(DraftError::MissingTitle);
    }
    let task_type = self
      .task_type
      .ok_or(DraftError::MissingTaskType)?;
    let description =
      self.description.trim();

    Ok(AcceptedDraft {
      title: title.to_string(),
      description: (!description
        .is_empty())
      .then(|| description.to_string()),
      task_type
    })
  }
}

/// A draft that passed validation. There
/// is no creation endpoint, so it is
/// handed back to the caller as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedDraft {
  pub title:       String,
  pub description: Option<String>,
  pub task_type:   TaskType
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
  Title,
  Description,
  TaskType
}

/// UI-only state of one view instance.
#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Eq,
)]
pub struct ViewState {
  pub group_by:            bool,
  pub collapsed_group_ids:
    BTreeSet<NaiveDate>,
  pub modal_open:          bool,
  pub draft:               Draft
}

/// Everything a renderer needs, derived
/// fresh after each transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSnapshot {
  pub view:            ViewState,
  pub load:            LoadState,
  pub overall:         Option<GroupSummary>,
  pub group_summaries: Vec<GroupSummary>
}

impl ViewSnapshot {
  pub fn compose(
    view: ViewState,
    load: LoadState
  ) -> Self {
    let overall =
      load.payload().map(summarize_payload);
    let group_summaries =
      match load.payload() {
        | Some(Payload::Grouped(groups)) => {
          groups
            .iter()
            .map(|group| {
              summarize(&group.tasks)
            })
            .collect()
        }
        | _ => Vec::new()
      };

    Self {
      view,
      load,
      overall,
      group_summaries
    }
  }

  pub fn is_collapsed(
    &self,
    day: NaiveDate
  ) -> bool {
    self
      .view
      .collapsed_group_ids
      .contains(&day)
  }
}

/// Projects a snapshot into some view.
/// Called synchronously after every
/// transition.
pub trait Renderer: Send + Sync {
  fn render(
    &self,
    snapshot: &ViewSnapshot
  );
}

impl<R: Renderer + ?Sized> Renderer
  for Arc<R>
{
  fn render(
    &self,
    snapshot: &ViewSnapshot
  ) {
    (**self).render(snapshot)
  }
}

/// The callbacks a view wires its inputs
/// to.
pub trait ViewActions: Send + Sync {
  /// The view was attached and needs its
  /// first load.
  fn on_mount(
    &self
  ) -> impl Future<Output = ()> + Send;

  fn on_toggle_group_by(
    &self
  ) -> impl Future<Output = ()> + Send;

  fn on_toggle_collapse(
    &self,
    group_id: NaiveDate
  );

  fn on_complete(
    &self,
    task_id: TaskId
  ) -> impl Future<Output = ()> + Send;

  fn on_cancel(
    &self,
    task_id: TaskId
  ) -> impl Future<Output = ()> + Send;

  fn on_reload(
    &self
  ) -> impl Future<Output = ()> + Send;

  fn on_open_modal(&self);

  fn on_close_modal(&self);

  fn on_edit_draft(
    &self,
    field: DraftField,
    value: String
  ) -> Result<(), DraftError>;

  fn on_submit_draft(
    &self,
    fields: Option<Draft>
  ) -> Result<AcceptedDraft, DraftError>;
}

pub struct ViewStateController<T, R, N>
{
  state:      Mutex<ViewState>,
  fetcher:    TaskFetcher<T>,
  dispatcher: MutationDispatcher<T, N>,
  renderer:   R
}

impl<T, R, N> ViewStateController<T, R, N>
where
  T: Transport,
  R: Renderer,
  N: Notifier
{
  pub fn new(
    transport: Arc<T>,
    renderer: R,
    notifier: N
  ) -> Self {
    Self {
      state: Mutex::new(
        ViewState::default()
      ),
      fetcher: TaskFetcher::new(
        transport.clone()
      ),
      dispatcher: MutationDispatcher::new(
        transport, notifier
      ),
      renderer
    }
  }

  /// Initial grouping mode, applied
  /// before the first load.
  pub fn with_group_by(
    self,
    group_by: bool
  ) -> Self {
    self.state.lock().group_by = group_by;
    self
  }

  pub fn snapshot(&self) -> ViewSnapshot {
    let view = self.state.lock().clone();
    ViewSnapshot::compose(
      view,
      self.fetcher.state()
    )
  }

  pub fn group_by(&self) -> bool {
    self.state.lock().group_by
  }

  fn publish(&self) {
    let snapshot = self.snapshot();
    self.renderer.render(&snapshot);
  }

  async fn load(
    &self,
    grouped: bool
  ) -> LoadOutcome {
    let ticket = self.fetcher.begin(grouped);
    self.publish();

    let result =
      self.fetcher.fetch(ticket).await;
    let outcome =
      self.fetcher.settle(ticket, result);
    if outcome == LoadOutcome::Applied {
      self.publish();
    }
    outcome
  }

  /// First load after the view is
  /// attached, in whatever mode is set.
  #[tracing::instrument(skip(self))]
  pub async fn mount(&self) -> LoadOutcome {
    let group_by = self.group_by();
    info!(group_by, "mounting task view");
    self.load(group_by).await
  }

  pub async fn reload(&self) -> LoadOutcome {
    let group_by = self.group_by();
    debug!(group_by, "explicit reload");
    self.load(group_by).await
  }

  /// Returns `None` when the mode was
  /// already active and nothing was
  /// loaded.
  #[tracing::instrument(skip(self))]
  pub async fn set_group_by(
    &self,
    mode: bool
  ) -> Option<LoadOutcome> {
    {
      let mut state = self.state.lock();
      if state.group_by == mode {
        return None;
      }
      state.group_by = mode;
    }
    Some(self.load(mode).await)
  }

  pub async fn toggle_group_by(
    &self
  ) -> Option<LoadOutcome> {
    let next = !self.group_by();
    self.set_group_by(next).await
  }

  /// Returns whether the group is now
  /// collapsed.
  pub fn toggle_collapse(
    &self,
    group_id: NaiveDate
  ) -> bool {
    let collapsed = {
      let mut state = self.state.lock();
      if state
        .collapsed_group_ids
        .remove(&group_id)
      {
        false
      } else {
        state
          .collapsed_group_ids
          .insert(group_id);
        true
      }
    };
    debug!(%group_id, collapsed, "toggled day group");
    self.publish();
    collapsed
  }

  pub fn open_modal(&self) {
    self.state.lock().modal_open = true;
    self.publish();
  }

  /// Always leaves an empty draft behind.
  pub fn close_modal(&self) {
    {
      let mut state = self.state.lock();
      state.modal_open = false;
      state.draft = Draft::default();
    }
    self.publish();
  }

  pub fn update_draft(
    &self,
    draft: Draft
  ) -> bool {
    {
      let mut state = self.state.lock();
      if !state.modal_open {
        warn!(
          "ignoring draft edit while the \
           modal is closed"
        );
        return false;
      }
      state.draft = draft;
    }
    self.publish();
    true
  }

  /// Validates `fields` (or the held
  /// draft) and closes the modal on
  /// success. Nothing is persisted.
  pub fn submit_draft(
    &self,
    fields: Option<Draft>
  ) -> Result<AcceptedDraft, DraftError>
  {
    let candidate = match fields {
      | Some(fields) => fields,
      | None => {
        self.state.lock().draft.clone()
      }
    };

    let accepted = match candidate
      .validate()
    {
      | Ok(accepted) => accepted,
      | Err(err) => {
        warn!(error = %err, "draft rejected");
        return Err(err);
      }
    };

    info!(
      title = %accepted.title,
      task_type = %accepted.task_type,
      "draft accepted; task creation is \
       not wired to the server"
    );
    self.close_modal();
    Ok(accepted)
  }

  pub async fn complete(
    &self,
    id: &TaskId
  ) -> Result<(), TransportError> {
    let group_by = self.group_by();
    self
      .dispatcher
      .complete(id, group_by, self)
      .await
  }

  pub async fn cancel(
    &self,
    id: &TaskId
  ) -> Result<(), TransportError> {
    let group_by = self.group_by();
    self
      .dispatcher
      .cancel(id, group_by, self)
      .await
  }
}

impl<T, R, N> Resync
  for ViewStateController<T, R, N>
where
  T: Transport,
  R: Renderer,
  N: Notifier
{
  async fn resync(&self, grouped: bool) {
    self.load(grouped).await;
  }
}

impl<T, R, N> ViewActions
  for ViewStateController<T, R, N>
where
  T: Transport,
  R: Renderer,
  N: Notifier
{
  async fn on_mount(&self) {
    self.mount().await;
  }

  async fn on_toggle_group_by(&self) {
    self.toggle_group_by().await;
  }

  fn on_toggle_collapse(
    &self,
    group_id: NaiveDate
  ) {
    self.toggle_collapse(group_id);
  }

  // Failures were already reported
  // through the notifier.
  async fn on_complete(
    &self,
    task_id: TaskId
  ) {
    let _ = self.complete(&task_id).await;
  }

  async fn on_cancel(&self, task_id: TaskId) {
    let _ = self.cancel(&task_id).await;
  }

  async fn on_reload(&self) {
    self.reload().await;
  }

  fn on_open_modal(&self) {
    self.open_modal();
  }

  fn on_close_modal(&self) {
    self.close_modal();
  }

  fn on_edit_draft(
    &self,
    field: DraftField,
    value: String
  ) -> Result<(), DraftError> {
    let mut draft =
      self.state.lock().draft.clone();
    match field {
      | DraftField::Title => {
        draft.title = value
      }
      | DraftField::Description => {
        draft.description = value
      }
      | DraftField::TaskType => {
        draft.task_type = Some(
          value.parse::<TaskType>().map_err(
            |err| {
              warn!(error = %err, "rejected task type");
              DraftError::InvalidTaskType(
                value.trim().to_string()
              )
            }
          )?
        )
      }
    }
    if self.update_draft(draft) {
      Ok(())
    } else {
      Err(DraftError::ModalClosed)
    }
  }

  fn on_submit_draft(
    &self,
    fields: Option<Draft>
  ) -> Result<AcceptedDraft, DraftError>
  {
    self.submit_draft(fields)
  }
}
