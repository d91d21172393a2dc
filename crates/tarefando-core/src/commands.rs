use std::str::FromStr;
use std::sync::Arc;

use anyhow::{
  Context,
  anyhow,
  bail
};
use chrono::NaiveDate;
use tokio::io::{
  AsyncBufRead,
  AsyncBufReadExt
};
use tokio::task::JoinSet;
use tracing::{
  debug,
  info,
  warn
};

use crate::controller::{
  DraftField,
  ViewActions
};
use crate::task::{
  TaskId,
  TaskType
};

pub const HELP: &str = "\
commands:
  g                 toggle flat / grouped-by-day
  c <YYYY-MM-DD>    collapse or expand a day group
  done <id>         complete a task
  cancel <id>       cancel a task
  new               open the new-task form
  title <text>      set the draft title
  desc <text>       set the draft description
  type <kind>       urgent | normal | teamAlignment | training | administrative
  submit            validate the draft and close the form
  close             discard the draft and close the form
  r                 reload
  q                 quit
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCommand {
  ToggleGroupBy,
  ToggleCollapse(NaiveDate),
  Complete(TaskId),
  Cancel(TaskId),
  OpenModal,
  CloseModal,
  Edit(DraftField, String),
  Submit,
  Reload,
  Help,
  Quit
}

impl FromStr for ViewCommand {
  type Err = anyhow::Error;

  fn from_str(
    line: &str
  ) -> Result<Self, Self::Err> {
    let trimmed = line.trim();
    let (head, rest) = trimmed
      .split_once(char::is_whitespace)
      .map(|(head, rest)| {
        (head, rest.trim())
      })
      .unwrap_or((trimmed, ""));

    let command = match head
      .to_ascii_lowercase()
      .as_str()
    {
      | "g" | "group" => {
        Self::ToggleGroupBy
      }
      | "c" | "collapse" => {
        let day = NaiveDate::parse_from_str(
          rest, "%Y-%m-%d"
        )
        .with_context(|| {
          format!(
            "expected a day as \
             YYYY-MM-DD, got `{rest}`"
          )
        })?;
        Self::ToggleCollapse(day)
      }
      | "done" | "complete" => {
        Self::Complete(task_id_arg(
          head, rest
        )?)
      }
      | "cancel" => {
        Self::Cancel(task_id_arg(
          head, rest
        )?)
      }
      | "new" | "n" => Self::OpenModal,
      | "close" => Self::CloseModal,
      | "title" => {
        Self::Edit(
          DraftField::Title,
          rest.to_string()
        )
      }
      | "desc" | "description" => {
        Self::Edit(
          DraftField::Description,
          rest.to_string()
        )
      }
      | "type" => {
        rest.parse::<TaskType>()?;
        Self::Edit(
          DraftField::TaskType,
          rest.to_string()
        )
      }
      | "submit" | "s" => Self::Submit,
      | "r" | "reload" => Self::Reload,
      | "h" | "help" | "?" => Self::Help,
      | "q" | "quit" | "exit" => {
        Self::Quit
      }
      | "" => bail!("empty command"),
      | other => {
        bail!(
          "unknown command `{other}` \
           (type `help`)"
        )
      }
    };

    Ok(command)
  }
}

fn task_id_arg(
  head: &str,
  rest: &str
) -> anyhow::Result<TaskId> {
  let id = rest
    .split_whitespace()
    .next()
    .ok_or_else(|| {
      anyhow!("`{head}` needs a task id")
    })?;
  Ok(TaskId::new(id))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
  Continue,
  Quit
}

/// Runs one command against the view.
/// Network-bound commands are spawned so
/// later input is not blocked behind
/// them.
pub fn dispatch<V>(
  view: &Arc<V>,
  command: ViewCommand,
  in_flight: &mut JoinSet<()>
) -> Flow
where
  V: ViewActions + 'static
{
  debug!(?command, "dispatching view command");
  match command {
    | ViewCommand::ToggleGroupBy => {
      let view = Arc::clone(view);
      in_flight.spawn(async move {
        view.on_toggle_group_by().await;
      });
    }
    | ViewCommand::Complete(id) => {
      let view = Arc::clone(view);
      in_flight.spawn(async move {
        view.on_complete(id).await;
      });
    }
    | ViewCommand::Cancel(id) => {
      let view = Arc::clone(view);
      in_flight.spawn(async move {
        view.on_cancel(id).await;
      });
    }
    | ViewCommand::Reload => {
      let view = Arc::clone(view);
      in_flight.spawn(async move {
        view.on_reload().await;
      });
    }
    | ViewCommand::ToggleCollapse(day) => {
      view.on_toggle_collapse(day);
    }
    | ViewCommand::OpenModal => {
      view.on_open_modal();
    }
    | ViewCommand::CloseModal => {
      view.on_close_modal();
    }
    | ViewCommand::Edit(field, value) => {
      if let Err(err) =
        view.on_edit_draft(field, value)
      {
        eprintln!("! {err}");
      }
    }
    | ViewCommand::Submit => {
      match view.on_submit_draft(None) {
        | Ok(accepted) => {
          println!(
            "draft \"{}\" ({}) accepted; \
             the server offers no way to \
             create tasks, so it was not \
             sent",
            accepted.title,
            accepted.task_type
          );
        }
        | Err(err) => {
          eprintln!("! {err}");
        }
      }
    }
    | ViewCommand::Help => {
      print!("{HELP}");
    }
    | ViewCommand::Quit => {
      return Flow::Quit;
    }
  }
  Flow::Continue
}

fn reap(
  result: Result<(), tokio::task::JoinError>
) {
  if let Err(err) = result
    && !err.is_cancelled()
  {
    warn!(error = %err, "view command task failed");
  }
}

/// Mounts the view, then feeds it one
/// command per input line until `q` or
/// end of input.
pub async fn run_session<V, I>(
  view: Arc<V>,
  input: I
) -> anyhow::Result<()>
where
  V: ViewActions + 'static,
  I: AsyncBufRead + Unpin
{
  let mut in_flight = JoinSet::new();
  {
    let view = Arc::clone(&view);
    in_flight.spawn(async move {
      view.on_mount().await;
    });
  }

  let mut lines = input.lines();
  while let Some(line) = lines
    .next_line()
    .await
    .context("failed reading command input")?
  {
    while let Some(result) =
      in_flight.try_join_next()
    {
      reap(result);
    }

    if line.trim().is_empty() {
      continue;
    }

    let command =
      match line.parse::<ViewCommand>() {
        | Ok(command) => command,
        | Err(err) => {
          eprintln!("! {err:#}");
          continue;
        }
      };

    if dispatch(&view, command, &mut in_flight)
      == Flow::Quit
    {
      info!("quit requested");
      in_flight.abort_all();
      return Ok(());
    }
  }

  debug!(
    outstanding = in_flight.len(),
    "input closed; waiting for in-flight \
     commands"
  );
  while let Some(result) =
    in_flight.join_next().await
  {
    reap(result);
  }
  Ok(())
}
