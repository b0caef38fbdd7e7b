//! Optical Hybrid Scanner CLI
//!
//! Drives the scan loop over mock camera frames. Real code decoding is out
//! of scope, so the decoders replay demo payloads sealed under the
//! configured master key, with misreads and linear-decoder latency mixed in.

use clap::Parser;
use optical_hybrid_scan::{
    capture::{Camera, MockCamera},
    cipher::{seal, PayloadPair, Salt},
    config::ScanConfig,
    decode::{DeferredLinear, ScriptedMatrix},
    events::ScanEvent,
    keys::KeyMaterial,
    metrics::{MetricsRegistry, MetricsSnapshot},
    session::{ScanMode, SessionContext},
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use tracing::{info, warn};

/// Frames each demo code pair stays in view.
const FRAMES_PER_SAMPLE: usize = 12;

#[derive(Debug, Parser)]
#[command(name = "optical-hybrid-scan", version, about)]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Batch mode: stop after this many secrets.
    #[arg(short, long)]
    batch: Option<u32>,

    /// Stop after this many capture attempts (0 = until the session ends
    /// or Ctrl-C).
    #[arg(short, long)]
    frames: Option<u64>,

    /// Number of demo payloads to replay.
    #[arg(short, long, default_value_t = 3)]
    samples: usize,

    /// Ticks before a linear decode answers.
    #[arg(short, long, default_value_t = 2)]
    latency: u64,

    /// Simulate a dropped frame every N captures (0 = never).
    #[arg(long, default_value_t = 0)]
    drop_every: u64,

    /// Process frames as fast as possible instead of at the configured fps.
    #[arg(long)]
    no_wait: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!("Optical Hybrid Scanner v{}", optical_hybrid_scan::VERSION);

    let mut config = match &args.config {
        Some(path) => match ScanConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                std::process::exit(1);
            }
        },
        None => ScanConfig::default(),
    };
    if let Some(target) = args.batch {
        config.session.mode = ScanMode::Batch;
        config.session.target = target;
    }
    if let Some(frames) = args.frames {
        config.output.max_frames = frames;
    }

    let sources = match config.keys.sources() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Invalid key configuration: {}", e);
            std::process::exit(1);
        }
    };
    let key = KeyMaterial::from_sources(&sources);

    let samples: Vec<PayloadPair> = match &key {
        Ok(master) => (1..=args.samples)
            .filter_map(|n| {
                let secret = format!("demo secret #{}", n);
                let salt = Salt::random(&mut rand_core::OsRng);
                match seal(master, salt, &secret) {
                    Ok(sealed) => sealed.split_even(),
                    Err(e) => {
                        warn!("Could not seal demo payload {}: {}", n, e);
                        None
                    }
                }
            })
            .collect(),
        Err(e) => {
            warn!("Master key unavailable ({}); scanning will find nothing", e);
            Vec::new()
        }
    };

    let (matrix_script, linear_script) = demo_scripts(&samples);
    let (events_tx, events_rx) = mpsc::channel();
    let mut ctx = SessionContext::new(
        key,
        ScriptedMatrix::new(matrix_script),
        DeferredLinear::new(linear_script, args.latency),
        events_tx,
    );

    let registry = match MetricsRegistry::new() {
        Ok(r) => Arc::new(r),
        Err(e) => {
            eprintln!("Failed to create metrics registry: {}", e);
            std::process::exit(1);
        }
    };
    start_metrics_server(config.output.metrics_port, Arc::clone(&registry));

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = Arc::clone(&interrupted);
        if let Err(e) = ctrlc::set_handler(move || interrupted.store(true, Ordering::SeqCst)) {
            warn!("Could not install Ctrl-C handler: {}", e);
        }
    }

    let mut camera = MockCamera::dropping_every(args.drop_every);
    if let Err(e) = camera.open(&config.capture) {
        eprintln!("Failed to open camera: {}", e);
        std::process::exit(1);
    }

    let frame_interval = config.capture.frame_interval();
    // Capture attempts, dropped frames included.
    let frame_limit = config.output.frame_limit();
    if frame_limit.is_none() {
        info!("No frame limit; scanning until the session stops or Ctrl-C");
    }

    ctx.start_session(config.session.mode, config.session.target);

    let mut attempts = 0u64;
    while ctx.is_running() && frame_limit.map_or(true, |limit| attempts < limit) {
        if interrupted.load(Ordering::SeqCst) {
            info!("Interrupted");
            break;
        }

        attempts += 1;
        match camera.capture() {
            Ok(frame) => {
                ctx.tick(&frame);
            }
            Err(e) => warn!("Frame capture failed: {}", e),
        }

        for event in events_rx.try_iter() {
            report(&event);
        }
        registry.update(&MetricsSnapshot::from_context(&ctx));

        if !args.no_wait {
            std::thread::sleep(frame_interval);
        }
    }

    ctx.stop_session();
    camera.close();
    for event in events_rx.try_iter() {
        report(&event);
    }
    registry.update(&MetricsSnapshot::from_context(&ctx));

    let stats = ctx.stats();
    info!(
        "Processed {} frames: {} pairs submitted, {} secrets found, {} rejected",
        stats.frames,
        stats.pairs_submitted,
        stats.secrets_found,
        stats.malformed_payloads + stats.invalid_plaintexts + stats.key_unavailable
    );

    for (i, secret) in ctx.results().iter().enumerate() {
        println!("{:>3}. {}", i + 1, secret);
    }
}

/// Builds per-frame decoder scripts showing each pair in turn.
///
/// Every fifth frame the matrix decoder misreads and every seventh the
/// linear decoder does, so the channels resolve at different times.
fn demo_scripts(samples: &[PayloadPair]) -> (Vec<Option<String>>, Vec<Option<String>>) {
    let mut matrix = Vec::with_capacity(samples.len() * FRAMES_PER_SAMPLE);
    let mut linear = Vec::with_capacity(samples.len() * FRAMES_PER_SAMPLE);

    for pair in samples {
        for _ in 0..FRAMES_PER_SAMPLE {
            let frame = matrix.len();
            matrix.push((frame % 5 != 4).then(|| pair.matrix.clone()));
            linear.push((frame % 7 != 6).then(|| pair.linear.clone()));
        }
    }

    (matrix, linear)
}

fn report(event: &ScanEvent) {
    match event {
        ScanEvent::SecretFound {
            secret,
            batch_results,
            found_at,
        } => println!(
            "[{}] secret found: {} ({} collected)",
            found_at.format("%H:%M:%S%.3f"),
            secret,
            batch_results.len()
        ),
        ScanEvent::ScanningStopped => println!("scanning stopped"),
    }
}

#[cfg(feature = "metrics")]
fn start_metrics_server(port: u16, registry: Arc<MetricsRegistry>) {
    use optical_hybrid_scan::metrics::{MetricsServer, MetricsServerConfig};

    if port == 0 {
        return;
    }
    let server = MetricsServer::new(MetricsServerConfig::with_port(port), registry);
    let handle = server.spawn();
    std::thread::spawn(move || match handle.join() {
        Ok(Err(e)) => tracing::error!("Metrics server failed: {}", e),
        Err(_) => tracing::error!("Metrics server panicked"),
        Ok(Ok(())) => {}
    });
}

#[cfg(not(feature = "metrics"))]
fn start_metrics_server(port: u16, _registry: Arc<MetricsRegistry>) {
    if port != 0 {
        warn!(port, "Built without the `metrics` feature; endpoint disabled");
    }
}
