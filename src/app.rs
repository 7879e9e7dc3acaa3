use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use clap::{Parser, error::ErrorKind};
use tracing::info;

use crate::config::CatalogConfig;
use crate::event::{ChannelSubscriber, EventReporter};
use crate::log::EventLog;
use crate::pipeline::CatalogPipeline;
use crate::session::{BrowserSession, list_label};
use crate::transport::http::UreqTransport;

#[derive(Debug, Parser)]
#[command(
    name = "litch",
    disable_help_subcommand = true,
    about = "Spell catalog fetcher",
    long_about = "Load the spell catalog from the custom file, the offline cache, or the remote API, merge it, and print the filtered listing.",
    after_help = "Root and endpoint are resolved in order by explicit arg, environment variables (LITCH_ROOT, LITCH_ENDPOINT), then project defaults."
)]
struct LitchCli {
    #[arg(long, help = "Ignore local files and refetch from the remote API")]
    force: bool,
    #[arg(
        long,
        value_name = "TEXT",
        default_value = "",
        help = "Only list spells whose name contains TEXT (case-insensitive)"
    )]
    filter: String,
    #[arg(long, value_name = "DIR", help = "Configuration root override")]
    root: Option<PathBuf>,
    #[arg(long, value_name = "URL", help = "Remote catalog endpoint override")]
    endpoint: Option<String>,
    #[arg(
        long,
        default_value_t = 40,
        value_parser = parse_width_arg,
        help = "Column width used to right-align concentration/ritual markers"
    )]
    width: usize,
}

/// Run one fetch cycle and print the merged, filtered catalog.
///
/// Status lines stream to stderr; the listing goes to stdout.
pub fn run_cli<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();

    let Some(cli) = parse_cli::<LitchCli, _>(std::iter::once("litch".to_string()).chain(args_iter))?
    else {
        return Ok(());
    };

    let config = CatalogConfig::resolve(cli.root, cli.endpoint)?;
    info!(root = %config.root.display(), endpoint = %config.remote_endpoint, "resolved configuration");

    let log = EventLog::create(config.log_path())?;
    let (subscriber, statuses) = ChannelSubscriber::channel();
    let reporter = Arc::new(EventReporter::with_subscriber(log, subscriber));
    // ends once every reporter handle is gone, including those held by pending cache writes
    let printer = thread::spawn(move || {
        for status in statuses {
            eprintln!("{status}");
        }
    });

    let (pipeline, snapshots) = CatalogPipeline::new(
        config,
        Arc::clone(&reporter),
        Arc::new(UreqTransport::new()),
    );
    let mut session = BrowserSession::new(Arc::clone(&reporter));
    session.set_filter(cli.filter);

    pipeline.request_fetch(cli.force);
    let Some(snapshot) = pipeline.wait_for_snapshot(&snapshots) else {
        return Err(format!(
            "fetch cycle ended without delivering a catalog; see {}",
            pipeline.config().log_path().display()
        )
        .into());
    };
    session.apply_snapshot(snapshot);

    let mut out = io::stdout().lock();
    writeln!(out, "{}", session.list_title())?;
    for record in session.visible_records() {
        writeln!(out, "{}", list_label(record, cli.width))?;
    }
    out.flush()?;

    let counts = reporter.counts();
    info!(
        info = counts.info,
        warn = counts.warn,
        error = counts.error,
        "fetch cycle finished"
    );
    drop(session);
    drop(pipeline);
    drop(reporter);
    if printer.join().is_err() {
        return Err("status printer thread panicked".into());
    }
    Ok(())
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

fn parse_width_arg(raw: &str) -> Result<usize, String> {
    let parsed = raw
        .parse::<usize>()
        .map_err(|_| format!("invalid width '{raw}': must be a positive integer"))?;
    if parsed == 0 {
        return Err("--width must be greater than zero".to_string());
    }
    Ok(parsed)
}
