use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use cli::chat::ChatLog;
use cli::config::AppConfig;
use cli::data_sources::HttpSource;
use dashboard::Dashboard;
use foundation::bounds::GeoBounds;
use foundation::ids::ProfileId;
use foundation::math::LatLon;
use layers::chart::DetailPanel;
use runtime::metrics::MetricsSnapshot;
use scene::filter::{FilterState, KNOWN_REGIONS};
use scene::profile::Variable;
use streaming::cache::FETCH_LATENCY_MS;
use streaming::source::ArgoSource;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_EXPORT_PATH: &str = "argo_profiles.csv";

#[derive(Parser, Debug)]
#[command(
    name = "argo",
    version,
    about = "Browse ARGO float profiles served by the dashboard backend",
    after_help = "environment: ARGO_API_URL (default http://127.0.0.1:8000), \
        ARGO_HTTP_TIMEOUT_SECS, ARGO_TABLE_LIMIT, ARGO_PROFILES_STALE_SECS, \
        ARGO_PROFILES_RETAIN_SECS, ARGO_MEASUREMENTS_STALE_SECS; RUST_LOG for logging"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List profiles for a filter and chart the selected one
    Profiles {
        #[command(flatten)]
        filter: FilterArgs,

        /// Bounding box: minLon,minLat,maxLon,maxLat
        #[arg(long, value_parser = parse_bbox)]
        bbox: Option<GeoBounds>,

        /// Select the profile nearest to LAT,LON
        #[arg(long, value_parser = parse_lat_lon, conflicts_with = "select")]
        near: Option<LatLon>,

        /// Select a profile by id
        #[arg(long)]
        select: Option<i64>,

        /// Variable charted against depth (temperature or salinity)
        #[arg(long, value_parser = parse_variable)]
        variable: Option<Variable>,
    },

    /// Print total profile and float counts
    Stats,

    /// Ask the conversational query endpoint a question
    Ask {
        #[arg(required = true)]
        message: Vec<String>,
    },

    /// Download matching profiles as CSV
    Export {
        /// Output file
        #[arg(default_value = DEFAULT_EXPORT_PATH)]
        out: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,
    },
}

/// Flags shared by the commands that take a profile filter.
#[derive(Args, Debug, Default, PartialEq)]
struct FilterArgs {
    /// Earliest profile date (YYYY-MM-DD)
    #[arg(long)]
    start: Option<String>,

    /// Latest profile date (YYYY-MM-DD)
    #[arg(long)]
    end: Option<String>,

    /// Ocean region tag, e.g. "Arabian Sea"
    #[arg(long)]
    region: Option<String>,

    /// Maximum number of profiles; 0 falls back to the default
    #[arg(long)]
    limit: Option<u32>,
}

impl FilterArgs {
    fn apply_to(&self, filter: &mut FilterState) {
        if let Some(v) = &self.start {
            filter.set_start(v.as_str());
        }
        if let Some(v) = &self.end {
            filter.set_end(v.as_str());
        }
        if let Some(v) = &self.region {
            filter.set_region(v.as_str());
        }
        if let Some(n) = self.limit {
            filter.set_limit(n);
        }
    }

    fn apply_to_dashboard(&self, dash: &mut Dashboard) {
        if let Some(v) = &self.start {
            dash.set_start(v.as_str());
        }
        if let Some(v) = &self.end {
            dash.set_end(v.as_str());
        }
        if let Some(v) = &self.region {
            dash.set_region(v.as_str());
        }
        if let Some(n) = self.limit {
            dash.set_limit(n);
        }
    }
}

fn parse_lat_lon(raw: &str) -> Result<LatLon, String> {
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got {raw:?}"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("bad latitude {lat:?}"))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| format!("bad longitude {lon:?}"))?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(format!("coordinate out of range: {lat},{lon}"));
    }
    Ok(LatLon::new(lat, lon))
}

fn parse_bbox(raw: &str) -> Result<GeoBounds, String> {
    let parts: Vec<f64> = raw
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| format!("expected minLon,minLat,maxLon,maxLat, got {raw:?}"))?;
    let [lon_min, lat_min, lon_max, lat_max] = parts[..] else {
        return Err(format!("expected 4 numbers, got {}", parts.len()));
    };
    if lat_min > lat_max || lon_min > lon_max {
        return Err(format!("empty bounding box {raw:?}"));
    }
    if lat_min < -90.0 || lat_max > 90.0 || lon_min < -180.0 || lon_max > 180.0 {
        return Err(format!("bounding box out of range: {raw:?}"));
    }
    Ok(GeoBounds::new(lat_min, lat_max, lon_min, lon_max))
}

fn parse_variable(raw: &str) -> Result<Variable, String> {
    Variable::parse(raw).ok_or_else(|| format!("unknown variable {raw:?}"))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = real_main().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn real_main() -> Result<(), String> {
    let cli = Cli::parse();

    let config = AppConfig::from_env().map_err(|e| e.to_string())?;
    let source: Arc<dyn ArgoSource> =
        Arc::new(HttpSource::new(&config.api_url, config.timeout).map_err(|e| e.to_string())?);
    info!("using backend {}", source.name());

    match cli.command {
        Command::Profiles {
            filter,
            bbox,
            near,
            select,
            variable,
        } => {
            let mut dash = Dashboard::new(source, config.dashboard);
            filter.apply_to_dashboard(&mut dash);
            if let Some(bounds) = bbox {
                dash.set_bounds(bounds);
            }
            if let Some(v) = variable {
                dash.set_variable(v);
            }
            cmd_profiles(&mut dash, &filter, near, select.map(ProfileId::new)).await
        }
        Command::Stats => cmd_stats(source).await,
        Command::Ask { message } => cmd_ask(source, &message.join(" ")).await,
        Command::Export { out, filter } => cmd_export(source, &filter, out).await,
    }
}

async fn cmd_profiles(
    dash: &mut Dashboard,
    filter: &FilterArgs,
    near: Option<LatLon>,
    select: Option<ProfileId>,
) -> Result<(), String> {
    if let Some(region) = &filter.region {
        if !KNOWN_REGIONS.contains(&region.as_str()) {
            info!("region {region:?} is not one of {KNOWN_REGIONS:?}; passing it through");
        }
    }

    dash.settle().await;

    let list = dash.list();
    if let Some(err) = list.error() {
        if list.profiles().is_empty() {
            return Err(format!("profile list: {err}"));
        }
        eprintln!("warning: showing retained profiles, refresh failed: {err}");
    }

    if let Some(point) = near {
        dash.click_map(point);
    }
    if let Some(id) = select {
        if !dash.click_row(id) && dash.selected() != Some(id) {
            return Err(format!("profile {id} is not in the current list"));
        }
    }
    dash.settle().await;

    log_activity(dash);
    print_dashboard(dash);
    Ok(())
}

fn log_activity(dash: &mut Dashboard) {
    for event in dash.drain_events() {
        debug!("#{} {:?}: {}", event.seq, event.kind, event.message);
    }

    let remote = dash.remote();
    let caches = [
        (remote.profiles_cache().name(), remote.profiles_cache().metrics()),
        (remote.measurements_cache().name(), remote.measurements_cache().metrics()),
        (remote.stats_cache().name(), remote.stats_cache().metrics()),
    ];
    for (name, snapshot) in caches {
        if let Some(ms) = mean_latency_ms(&snapshot) {
            debug!("{name}: mean fetch latency {ms:.1} ms");
        }
    }
}

fn mean_latency_ms(snapshot: &MetricsSnapshot) -> Option<f64> {
    snapshot
        .histograms
        .iter()
        .find(|(name, _)| *name == FETCH_LATENCY_MS)
        .and_then(|(_, h)| h.mean())
}

fn print_dashboard(dash: &Dashboard) {
    if let Some(stats) = dash.stats() {
        println!("{} profiles from {} floats", stats.profiles, stats.floats);
    }
    println!("filter: {}", dash.query());
    println!();

    let table = dash.table();
    if let Some(msg) = table.empty_message() {
        println!("{msg}");
    } else {
        println!(
            "  {:<10} {:>6} {:<14} {:>8} {:>8} {:<10}",
            "platform", "cycle", "region", "lat", "lon", "date"
        );
        for row in &table.rows {
            let marker = if row.selected { '*' } else { ' ' };
            println!(
                "{marker} {:<10} {:>6} {:<14} {:>8} {:>8} {:<10}",
                row.platform, row.cycle, row.region, row.latitude, row.longitude, row.date
            );
        }
        if table.is_truncated() {
            println!("  ... {} of {} shown", table.rows.len(), table.total);
        }
    }
    println!();

    match dash.detail_panel() {
        DetailPanel::Placeholder { hint } => println!("{hint}"),
        DetailPanel::Loading { chip, hint } | DetailPanel::NoData { chip, hint } => {
            println!("[{chip}] {hint}");
        }
        DetailPanel::Chart { chip, note, chart } => {
            println!("[{chip}]");
            if let Some(note) = note {
                println!("{note}");
            }
            println!("  {:>10}  {}", chart.y_title, chart.x_title);
            for (value, depth) in &chart.points {
                println!("  {depth:>10.1}  {value:.3}");
            }
            if let Some(depth) = dash.detail().series().and_then(|s| s.max_depth()) {
                println!("  deepest sample at {depth:.1}");
            }
        }
    }
}

async fn cmd_stats(source: Arc<dyn ArgoSource>) -> Result<(), String> {
    let stats = source.stats().await.map_err(|e| e.to_string())?;
    println!("profiles: {}", stats.profiles);
    println!("floats:   {}", stats.floats);
    Ok(())
}

async fn cmd_ask(source: Arc<dyn ArgoSource>, message: &str) -> Result<(), String> {
    let mut log = ChatLog::new();
    match log.send(source.as_ref(), message).await {
        Some(reply) => {
            println!("{}", reply.text);
            Ok(())
        }
        None => Err("ask requires a message".to_string()),
    }
}

async fn cmd_export(
    source: Arc<dyn ArgoSource>,
    filter_args: &FilterArgs,
    out: PathBuf,
) -> Result<(), String> {
    let mut filter = FilterState::new();
    filter_args.apply_to(&mut filter);

    let bytes = source
        .export_csv(&filter.export_query())
        .await
        .map_err(|e| e.to_string())?;
    tokio::fs::write(&out, &bytes)
        .await
        .map_err(|e| format!("write {out:?}: {e}"))?;
    println!("wrote {} bytes to {}", bytes.len(), out.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, FilterArgs, parse_bbox, parse_lat_lon};
    use clap::error::ErrorKind;
    use clap::{CommandFactory, Parser};
    use foundation::bounds::GeoBounds;
    use scene::filter::{EXPORT_DEFAULT_LIMIT, FilterState};
    use scene::profile::Variable;
    use std::path::PathBuf;

    fn parse(args: &[&str]) -> Result<Command, clap::Error> {
        Cli::try_parse_from(std::iter::once("argo").chain(args.iter().copied()))
            .map(|cli| cli.command)
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_filter_and_selection_flags() {
        let parsed = parse(&[
            "profiles",
            "--region",
            "Bay of Bengal",
            "--limit",
            "50",
            "--select",
            "7",
            "--variable",
            "salinity",
        ])
        .unwrap();
        let Command::Profiles {
            filter,
            bbox,
            near,
            select,
            variable,
        } = parsed
        else {
            panic!("expected profiles");
        };
        assert_eq!(filter.region.as_deref(), Some("Bay of Bengal"));
        assert_eq!(filter.limit, Some(50));
        assert_eq!(select, Some(7));
        assert_eq!(variable, Some(Variable::Salinity));
        assert!(near.is_none());
        assert!(bbox.is_none());
    }

    #[test]
    fn rejects_bad_flags() {
        let kind = |args: &[&str]| parse(args).unwrap_err().kind();
        assert_eq!(kind(&["profiles", "--limit"]), ErrorKind::InvalidValue);
        assert_eq!(
            kind(&["profiles", "--limit", "many"]),
            ErrorKind::ValueValidation
        );
        assert_eq!(kind(&["profiles", "--bogus"]), ErrorKind::UnknownArgument);
        assert_eq!(
            kind(&["profiles", "--near", "1,2", "--select", "3"]),
            ErrorKind::ArgumentConflict
        );
        assert_eq!(
            kind(&["profiles", "--variable", "oxygen"]),
            ErrorKind::ValueValidation
        );
        assert_eq!(kind(&["ask"]), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn help_and_version_are_answered() {
        assert_eq!(parse(&["--help"]).unwrap_err().kind(), ErrorKind::DisplayHelp);
        assert_eq!(
            parse(&["profiles", "--help"]).unwrap_err().kind(),
            ErrorKind::DisplayHelp
        );
        assert_eq!(
            parse(&["--version"]).unwrap_err().kind(),
            ErrorKind::DisplayVersion
        );
    }

    #[test]
    fn export_takes_an_optional_path_and_filter() {
        let Command::Export { out, filter } = parse(&["export"]).unwrap() else {
            panic!("expected export");
        };
        assert_eq!(out, PathBuf::from("argo_profiles.csv"));
        assert_eq!(filter, FilterArgs::default());

        let Command::Export { out, filter } =
            parse(&["export", "--region", "Pacific", "pacific.csv"]).unwrap()
        else {
            panic!("expected export");
        };
        assert_eq!(out, PathBuf::from("pacific.csv"));
        assert_eq!(filter.region.as_deref(), Some("Pacific"));
    }

    #[test]
    fn ask_joins_every_word() {
        let Command::Ask { message } = parse(&["ask", "floats", "near", "Mumbai"]).unwrap() else {
            panic!("expected ask");
        };
        assert_eq!(message.join(" "), "floats near Mumbai");
    }

    #[test]
    fn lat_lon_parsing() {
        let p = parse_lat_lon("19.07, 72.87").unwrap();
        assert_eq!((p.lat, p.lon), (19.07, 72.87));
        assert!(parse_lat_lon("91,0").is_err());
        assert!(parse_lat_lon("19.07").is_err());
    }

    #[test]
    fn bbox_is_lon_lat_ordered() {
        assert_eq!(
            parse_bbox("60,5,80,25").unwrap(),
            GeoBounds::new(5.0, 25.0, 60.0, 80.0)
        );
        assert!(parse_bbox("60,5,80").is_err());
        assert!(parse_bbox("80,5,60,25").is_err());
        assert!(parse_bbox("60,5,80,95").is_err());
        assert!(parse_bbox("west,5,80,25").is_err());
    }

    #[test]
    fn emptied_limit_exports_the_export_default() {
        let f = FilterArgs {
            start: Some("2023-01-01".to_string()),
            region: Some("  ".to_string()),
            limit: Some(0),
            ..FilterArgs::default()
        };
        let mut state = FilterState::new();
        f.apply_to(&mut state);
        let q = state.query();
        assert_eq!(q.start_date.as_deref(), Some("2023-01-01"));
        assert_eq!(q.ocean_region, None);
        assert_eq!(q.limit, 200);
        assert_eq!(state.export_query().limit, EXPORT_DEFAULT_LIMIT);
        assert_eq!(state.export_query().start_date.as_deref(), Some("2023-01-01"));
    }
}
