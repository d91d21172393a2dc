use anyhow::anyhow;
use chrono::{
  DateTime,
  Datelike,
  NaiveDate,
  NaiveDateTime,
  Utc,
  Weekday
};
use chrono_tz::Tz;

pub const DEFAULT_LOCALE: &str =
  "pt-BR";
pub const DEFAULT_TIMEZONE: &str =
  "America/Sao_Paulo";

const WIRE_NAIVE_FORMAT: &str =
  "%Y-%m-%dT%H:%M:%S%.f";

pub fn parse_timezone(
  raw: &str,
  source: &str
) -> anyhow::Result<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return Err(anyhow!(
      "timezone from {source} is empty"
    ));
  }

  trimmed.parse::<Tz>().map_err(|err| {
    anyhow!(
      "invalid timezone `{trimmed}` \
       from {source}: {err}"
    )
  })
}

/// Timestamps arrive either as RFC 3339
/// or as offset-less ISO-8601, which is
/// read as UTC.
#[must_use]
pub fn parse_wire_timestamp(
  raw: &str
) -> Option<DateTime<Utc>> {
  let trimmed = raw.trim();
  if let Ok(dt) =
    DateTime::parse_from_rfc3339(trimmed)
  {
    return Some(dt.with_timezone(&Utc));
  }

  NaiveDateTime::parse_from_str(
    trimmed,
    WIRE_NAIVE_FORMAT
  )
  .ok()
  .map(|naive| naive.and_utc())
}

/// The calendar date as written by the
/// server, without shifting it into any
/// display timezone.
#[must_use]
pub fn parse_wire_day(
  raw: &str
) -> Option<NaiveDate> {
  let trimmed = raw.trim();
  if let Ok(date) =
    NaiveDate::parse_from_str(
      trimmed, "%Y-%m-%d"
    )
  {
    return Some(date);
  }

  if let Ok(dt) =
    DateTime::parse_from_rfc3339(trimmed)
  {
    return Some(dt.date_naive());
  }

  NaiveDateTime::parse_from_str(
    trimmed,
    WIRE_NAIVE_FORMAT
  )
  .ok()
  .map(|naive| naive.date())
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum DisplayLocale {
  PtBr,
  EnUs
}

impl DisplayLocale {
  pub fn from_tag(
    tag: &str
  ) -> Option<Self> {
    let normalized = tag
      .trim()
      .replace('_', "-")
      .to_ascii_lowercase();
    match normalized.as_str() {
      | "pt-br" | "pt" => {
        Some(Self::PtBr)
      }
      | "en-us" | "en" => {
        Some(Self::EnUs)
      }
      | _ => None
    }
  }

  pub fn resolve(tag: &str) -> Self {
    Self::from_tag(tag).unwrap_or_else(
      || {
        tracing::warn!(
          locale = %tag,
          "no date names for locale; \
           falling back to en-US"
        );
        Self::EnUs
      }
    )
  }

  fn weekday_long(
    self,
    day: Weekday
  ) -> &'static str {
    let idx = day.num_days_from_monday()
      as usize;
    match self {
      | Self::PtBr => {
        [
          "segunda-feira",
          "terça-feira",
          "quarta-feira",
          "quinta-feira",
          "sexta-feira",
          "sábado",
          "domingo"
        ][idx]
      }
      | Self::EnUs => {
        [
          "Monday",
          "Tuesday",
          "Wednesday",
          "Thursday",
          "Friday",
          "Saturday",
          "Sunday"
        ][idx]
      }
    }
  }

  fn weekday_short(
    self,
    day: Weekday
  ) -> &'static str {
    let idx = day.num_days_from_monday()
      as usize;
    match self {
      | Self::PtBr => {
        [
          "seg.", "ter.", "qua.", "qui.",
          "sex.", "sáb.", "dom."
        ][idx]
      }
      | Self::EnUs => {
        [
          "Mon", "Tue", "Wed", "Thu",
          "Fri", "Sat", "Sun"
        ][idx]
      }
    }
  }

  fn month_long(
    self,
    month0: u32
  ) -> &'static str {
    let idx = month0 as usize;
    match self {
      | Self::PtBr => {
        [
          "janeiro", "fevereiro", "março",
          "abril", "maio", "junho",
          "julho", "agosto", "setembro",
          "outubro", "novembro",
          "dezembro"
        ][idx]
      }
      | Self::EnUs => {
        [
          "January", "February", "March",
          "April", "May", "June", "July",
          "August", "September",
          "October", "November",
          "December"
        ][idx]
      }
    }
  }

  fn month_short(
    self,
    month0: u32
  ) -> &'static str {
    let idx = month0 as usize;
    match self {
      | Self::PtBr => {
        [
          "jan.", "fev.", "mar.", "abr.",
          "mai.", "jun.", "jul.", "ago.",
          "set.", "out.", "nov.", "dez."
        ][idx]
      }
      | Self::EnUs => {
        [
          "Jan", "Feb", "Mar", "Apr",
          "May", "Jun", "Jul", "Aug",
          "Sep", "Oct", "Nov", "Dec"
        ][idx]
      }
    }
  }
}

/// Locale and timezone used when dates
/// are shown to the user.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct DateStyle {
  pub locale:   DisplayLocale,
  pub timezone: Tz
}

impl DateStyle {
  pub fn new(
    locale: DisplayLocale,
    timezone: Tz
  ) -> Self {
    Self {
      locale,
      timezone
    }
  }

  /// Weekday, day, month and year, as
  /// used for day-group headers.
  #[must_use]
  pub fn long_day(
    &self,
    day: NaiveDate
  ) -> String {
    let weekday = self
      .locale
      .weekday_long(day.weekday());
    let month =
      self.locale.month_long(day.month0());
    match self.locale {
      | DisplayLocale::PtBr => {
        format!(
          "{weekday}, {} de {month} de \
           {}",
          day.day(),
          day.year()
        )
      }
      | DisplayLocale::EnUs => {
        format!(
          "{weekday}, {month} {}, {}",
          day.day(),
          day.year()
        )
      }
    }
  }

  /// Weekday, day and month in the
  /// configured timezone, as used next
  /// to each task.
  #[must_use]
  pub fn short_timestamp(
    &self,
    at: DateTime<Utc>
  ) -> String {
    let local =
      at.with_timezone(&self.timezone);
    let weekday = self
      .locale
      .weekday_short(local.weekday());
    let month = self
      .locale
      .month_short(local.month0());
    match self.locale {
      | DisplayLocale::PtBr => {
        format!(
          "{weekday}, {} de {month}",
          local.day()
        )
      }
      | DisplayLocale::EnUs => {
        format!(
          "{weekday}, {month} {}",
          local.day()
        )
      }
    }
  }

  #[must_use]
  pub fn today(
    &self,
    now: DateTime<Utc>
  ) -> NaiveDate {
    now
      .with_timezone(&self.timezone)
      .date_naive()
  }
}

pub mod wire_date_serde {
  use chrono::{
    DateTime,
    Utc
  };
  use serde::{
    Deserialize,
    Deserializer
  };

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<DateTime<Utc>, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw = String::deserialize(
      deserializer
    )?;
    super::parse_wire_timestamp(&raw)
      .ok_or_else(|| {
        serde::de::Error::custom(
          format!(
            "invalid timestamp: {raw}"
          )
        )
      })
  }

  pub mod day {
    use chrono::NaiveDate;
    use serde::{
      Deserialize,
      Deserializer
    };

    pub fn deserialize<'de, D>(
      deserializer: D
    ) -> Result<NaiveDate, D::Error>
    where
      D: Deserializer<'de>
    {
      let raw = String::deserialize(
        deserializer
      )?;
      super::super::parse_wire_day(&raw)
        .ok_or_else(|| {
          serde::de::Error::custom(
            format!(
              "invalid day: {raw}"
            )
          )
        })
    }
  }
}
