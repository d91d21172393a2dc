use std::future::Future;

use anyhow::{
  Context,
  bail
};
use reqwest::{
  StatusCode,
  Url
};
use tracing::{
  debug,
  instrument,
  warn
};

use crate::error::TransportError;
use crate::task::{
  Payload,
  TaskId
};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum StatusChange {
  Complete,
  Cancel
}

impl StatusChange {
  pub fn path_segment(
    self
  ) -> &'static str {
    match self {
      | Self::Complete => "complete",
      | Self::Cancel => "cancel"
    }
  }
}

/// The HTTP side of the view. A load may
/// still be in flight when a newer one is
/// issued; callers decide whether its
/// result is used.
pub trait Transport: Send + Sync {
  fn load_tasks(
    &self,
    grouped: bool
  ) -> impl Future<
    Output = Result<
      Payload,
      TransportError
    >
  > + Send;

  fn change_status(
    &self,
    id: &TaskId,
    change: StatusChange
  ) -> impl Future<
    Output = Result<(), TransportError>
  > + Send;
}

pub struct HttpTransport {
  client:   reqwest::Client,
  base_url: Url
}

impl HttpTransport {
  pub fn new(
    base_url: &str,
    accept_invalid_certs: bool
  ) -> anyhow::Result<Self> {
    let base_url = Url::parse(base_url.trim())
      .with_context(|| {
        format!(
          "invalid task API url `{base_url}`"
        )
      })?;
    if base_url.cannot_be_a_base() {
      bail!(
        "task API url `{base_url}` cannot \
         carry a path"
      );
    }

    if accept_invalid_certs {
      warn!(
        base_url = %base_url,
        "accepting invalid TLS \
         certificates for the task API"
      );
    }

    let client =
      reqwest::Client::builder()
        .danger_accept_invalid_certs(
          accept_invalid_certs
        )
        .build()
        .context(
          "failed building HTTP client \
           for the task API"
        )?;

    Ok(Self {
      client,
      base_url
    })
  }

  /// Appends each part as one
  /// percent-encoded path segment.
  fn endpoint(
    &self,
    parts: &[&str]
  ) -> Url {
    let mut url = self.base_url.clone();
    // `new` rejects cannot-be-a-base urls.
    if let Ok(mut segments) =
      url.path_segments_mut()
    {
      segments
        .pop_if_empty()
        .extend(parts);
    }
    url
  }
}

fn network_error(
  err: reqwest::Error
) -> TransportError {
  TransportError::Network(
    err.to_string()
  )
}

impl Transport for HttpTransport {
  #[instrument(skip(self), fields(base_url = %self.base_url))]
  async fn load_tasks(
    &self,
    grouped: bool
  ) -> Result<Payload, TransportError> {
    let mut url = self.endpoint(&["criteria"]);
    url
      .query_pairs_mut()
      .append_pair(
        "grouped",
        if grouped { "true" } else { "false" }
      );

    let response = self
      .client
      .get(url.clone())
      .header(
        reqwest::header::ACCEPT,
        "application/json"
      )
      .send()
      .await
      .map_err(network_error)?;

    let status = response.status();
    if !status.is_success() {
      warn!(
        url = %url,
        status = status.as_u16(),
        "task load returned non-success \
         status"
      );
      return Err(TransportError::Http {
        status: status.as_u16()
      });
    }

    let body = response
      .text()
      .await
      .map_err(network_error)?;
    debug!(
      bytes = body.len(),
      "task load body received"
    );
    Payload::decode(grouped, &body)
  }

  #[instrument(skip(self, id), fields(base_url = %self.base_url, id = %id))]
  async fn change_status(
    &self,
    id: &TaskId,
    change: StatusChange
  ) -> Result<(), TransportError> {
    // Url drops dot segments, so these
    // would address a different resource.
    if matches!(id.as_str(), "" | "." | "..")
    {
      return Err(
        TransportError::UnaddressableId(
          id.to_string()
        )
      );
    }
    let url = self.endpoint(&[
      change.path_segment(),
      id.as_str()
    ]);

    let response = self
      .client
      .patch(url.clone())
      .send()
      .await
      .map_err(network_error)?;

    let status = response.status();
    if status != StatusCode::OK {
      warn!(
        url = %url,
        status = status.as_u16(),
        "status change was not \
         acknowledged with 200"
      );
      return Err(TransportError::Http {
        status: status.as_u16()
      });
    }

    debug!(url = %url, "status change acknowledged");
    Ok(())
  }
}
