//! lure - Lustre MDT/OST counter sampler.
//!
//! Samples `/proc/fs/lustre` counter files once per interval and shows
//! per-second rates on the console, over HTTP, and optionally in InfluxDB.

mod console;
mod influx;
mod web;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::Path;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Local;
use clap::Parser;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use lure_core::board::RateBoard;
use lure_core::collector::RealFs;
use lure_core::counters::DeviceClass;
use lure_core::discovery::{DEFAULT_LUSTRE_ROOT, DeviceMap, discover};
use lure_core::export::to_line_protocol;
use lure_core::rates::Interval;
use lure_core::render::render_header;
use lure_core::sampler::{Sampler, SamplerConfig};

use influx::{InfluxConfig, InfluxWriter};
use web::WebState;

/// Lustre MDT/OST performance counter sampler.
#[derive(Parser)]
#[command(name = "lure", about = "Lustre MDT/OST counter sampler", version = lure_core::VERSION)]
struct Args {
    /// Sample interval in seconds.
    #[arg(short, long, default_value = "1", env = "LURE_INTERVAL")]
    interval: u64,

    /// HTTP port for /stats and /json. 0 disables the HTTP server.
    #[arg(short, long, default_value = "8666", env = "LURE_PORT")]
    port: u16,

    /// Host the HTTP server binds to.
    #[arg(long, default_value = "localhost", env = "LURE_LISTEN_HOST")]
    listen_host: String,

    /// Don't report MDT stats.
    #[arg(long)]
    ignore_mdt: bool,

    /// Don't report OST stats.
    #[arg(long)]
    ignore_ost: bool,

    /// Report Lustre job stats for MDT and OST devices.
    #[arg(long, env = "LURE_JOBSTATS")]
    jobstats: bool,

    /// No console output; stats stay available over HTTP and InfluxDB.
    #[arg(long, env = "LURE_DAEMON")]
    daemon: bool,

    /// Store rates in InfluxDB.
    #[arg(long, env = "LURE_FEED_TO_INFLUX")]
    feed_to_influx: bool,

    /// InfluxDB server name or IP.
    #[arg(long, default_value = "localhost", env = "LURE_INFLUX_SERVER")]
    influx_server: String,

    /// InfluxDB server port.
    #[arg(long, default_value = "8086", env = "LURE_INFLUX_PORT")]
    influx_port: u16,

    /// InfluxDB organisation.
    #[arg(long, default_value = "storagebit", env = "LURE_INFLUX_ORG")]
    influx_org: String,

    /// InfluxDB bucket.
    #[arg(long, default_value = "lure", env = "LURE_INFLUX_BUCKET")]
    influx_bucket: String,

    /// Read/write token for the bucket, or user:password.
    #[arg(
        long,
        default_value = "lure:password",
        env = "LURE_INFLUX_TOKEN",
        hide_env_values = true
    )]
    influx_token: String,

    /// Lustre proc tree holding the mdt and obdfilter directories.
    #[arg(long, default_value = DEFAULT_LUSTRE_ROOT, env = "LURE_LUSTRE_ROOT")]
    lustre_root: String,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Logs go to stderr so the console table on stdout stays intact.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["lure", "lure_core"] {
        if let Ok(directive) = format!("{}={}", target, level).parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Get machine hostname via the `hostname` command.
fn get_hostname() -> String {
    process::Command::new("hostname")
        .output()
        .ok()
        .and_then(|out| {
            if out.status.success() {
                String::from_utf8(out.stdout)
                    .ok()
                    .map(|s| s.trim().to_string())
            } else {
                None
            }
        })
        .unwrap_or_default()
}

/// Sleeps `duration` in short slices, returning early once `running` clears.
fn sleep_while_running(duration: Duration, running: &AtomicBool) {
    let slice = Duration::from_millis(100);
    let mut remaining = duration;
    while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
        let step = remaining.min(slice);
        std::thread::sleep(step);
        remaining = remaining.saturating_sub(step);
    }
}

fn discover_class(fs: &RealFs, root: &Path, class: DeviceClass, ignored: bool) -> DeviceMap {
    if ignored {
        info!("{} stats disabled", class);
        return DeviceMap::new();
    }
    discover(fs, root, class)
}

fn main() {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    let interval = match Interval::from_secs(args.interval) {
        Ok(interval) => interval,
        Err(e) => {
            error!("{}", e);
            process::exit(2);
        }
    };

    info!(version = lure_core::VERSION, "lure starting");
    debug!("{}", lure_core::build_info());

    let hostname = get_hostname();
    let root = Path::new(&args.lustre_root);
    let fs = RealFs::new();

    let mut config = SamplerConfig::new(interval);
    config.job_stats = args.jobstats;
    config.mdt = discover_class(&fs, root, DeviceClass::Mdt, args.ignore_mdt);
    config.ost = discover_class(&fs, root, DeviceClass::Ost, args.ignore_ost);
    info!(
        interval = %interval,
        mdts = config.mdt.len(),
        osts = config.ost.len(),
        jobstats = config.job_stats,
        root = %root.display(),
        "config"
    );

    let sampler = Sampler::new(fs, config);
    if !sampler.has_devices() {
        warn!("no Lustre targets to sample, tables will stay empty");
    }

    let board = RateBoard::new();

    if args.port != 0 {
        let addr = format!("{}:{}", args.listen_host, args.port);
        let state = WebState::new(board.clone(), &hostname, interval);
        if let Err(e) = web::spawn(addr, state) {
            error!(error = %e, "failed to start HTTP thread");
        }
    }

    let influx = if args.feed_to_influx {
        let config = InfluxConfig {
            server: args.influx_server.clone(),
            port: args.influx_port,
            org: args.influx_org.clone(),
            bucket: args.influx_bucket.clone(),
            token: args.influx_token.clone(),
        };
        info!(url = %config.write_url(), bucket = %config.bucket, "feeding InfluxDB");
        match InfluxWriter::new(config) {
            Ok(writer) => Some(writer),
            Err(e) => {
                error!(error = %e, "failed to set up InfluxDB writer");
                process::exit(1);
            }
        }
    } else {
        None
    };

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    info!("Starting sampling loop");

    while running.load(Ordering::SeqCst) {
        let cycle = sampler.cycle_with(|d| sleep_while_running(d, &running));
        if !running.load(Ordering::SeqCst) {
            break;
        }

        board.publish(cycle.tables);
        let tables = board.latest();

        if !args.daemon {
            let header = render_header(&hostname, &Local::now(), interval.as_secs());
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = console::draw(&mut stdout, &header, &tables) {
                warn!(error = %e, "failed to draw console");
            }
        }

        if let Some(writer) = &influx
            && let Err(e) = writer.write(&to_line_protocol(&tables, &hostname))
        {
            warn!(error = %e, "InfluxDB write failed");
        }
    }

    info!("Shutdown complete");
}
