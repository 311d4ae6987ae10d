pub mod calendar;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datastore;
pub mod datetime;
pub mod day_bucket;
pub mod identity;
pub mod live;
pub mod model;
pub mod period;
pub mod render;
pub mod timetable;
pub mod upcoming;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use calendar::{
  CalendarItem,
  PaletteColor,
  aggregate_calendar
};
pub use day_bucket::{
  DayBucket,
  bucket_by_day
};
pub use live::{
  PeriodState,
  resolve_live_period
};
pub use period::{
  Period,
  PeriodCount,
  time_range_of
};
pub use timetable::{
  TimetableGrid,
  project_timetable
};
pub use upcoming::{
  UpcomingSummary,
  compute_upcoming
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting campus CLI"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.campusrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;

  let store =
    datastore::DataStore::open(
      &data_dir
    )
    .with_context(|| {
      format!(
        "failed to open datastore at \
         {}",
        data_dir.display()
      )
    })?;

  let identity =
    identity::ConfigIdentity::new(&cfg);
  let renderer =
    render::Renderer::new(&cfg)?;
  let inv = cli::Invocation::parse(
    &cfg, cli.rest
  )?;

  commands::dispatch(
    &store,
    &cfg,
    &renderer,
    &identity,
    inv
  )?;

  info!("done");
  Ok(())
}
