use std::{path::PathBuf, process::ExitCode, sync::Arc, time::Duration};

use clap::Parser;
use playport_core::{CancelFlag, build_io_runtime};
use playport_remote::{
    DownloadEvent, RemoteConfig, UreqFetcher,
    config::{DEFAULT_BASE_URL, DEFAULT_MAX_CONCURRENT, DEFAULT_PAGE_SIZE},
};
use tokio::sync::mpsc::unbounded_channel;

mod pipeline;

use pipeline::{ImportError, ImportPipeline, ImportSettings, SceneAssembler, SummaryAssembler};

/// Resolve, download and extract the assets referenced by an exported PlayCanvas scene
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scene JSON produced by the exporter
    scene: PathBuf,

    /// Directory downloaded assets and the persisted stores live in
    #[arg(long, default_value = "PlayCanvasData")]
    asset_root: PathBuf,

    #[arg(long, env = "PLAYCANVAS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[arg(long, env = "PLAYCANVAS_PROJECT_ID", default_value = "")]
    project_id: String,

    #[arg(long, env = "PLAYCANVAS_BRANCH_ID", default_value = "")]
    branch_id: String,

    /// API bearer token
    #[arg(long, env = "PLAYCANVAS_TOKEN", default_value = "", hide_env_values = true)]
    token: String,

    /// Simultaneous transfers
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENT)]
    max_concurrent: usize,

    /// Assets requested per listing page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    /// Work from the local cache only
    #[arg(long)]
    offline: bool,

    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn settings(&self) -> ImportSettings {
        ImportSettings {
            scene_path: self.scene.clone(),
            asset_root: self.asset_root.clone(),
            remote: RemoteConfig {
                base_url: self.base_url.clone(),
                project_id: self.project_id.clone(),
                branch_id: self.branch_id.clone(),
                token: self.token.clone(),
                max_concurrent: self.max_concurrent,
                page_size: self.page_size.max(1),
                timeout: Duration::from_secs(self.timeout),
            },
            offline: self.offline,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), ImportError> {
    let settings = args.settings();
    let runtime = build_io_runtime(settings.remote.max_concurrent)?;

    let cancel = CancelFlag::new();
    let fetcher = Arc::new(UreqFetcher::new(&settings.remote));
    let (events_tx, mut events_rx) = unbounded_channel();

    runtime.block_on(async move {
        let ctrl_c = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Interrupted, finishing running downloads");
                ctrl_c.cancel();
            }
        });

        tokio::spawn(async move {
            while let Some(event) = events_rx.recv().await {
                match event {
                    DownloadEvent::Started { name, index, total, .. } => {
                        log::info!("[{}/{}] {}", index + 1, total, name)
                    }
                    DownloadEvent::Retrying { asset_id, url } => {
                        log::debug!("Retrying asset {} via {}", asset_id, url)
                    }
                    other => log::debug!("{:?}", other),
                }
            }
        });

        let pipeline = ImportPipeline::new(settings, fetcher, cancel).with_events(events_tx);
        let outcome = pipeline.run().await?;

        let mut assembler = SummaryAssembler::default();
        assembler.assemble(&outcome.scene, &outcome.processed);

        if let Some(report) = &outcome.report {
            if !report.is_clean() {
                log::warn!(
                    "{} downloads failed, {} skipped",
                    report.failed.len(),
                    report.skipped.len()
                );
            }
        }
        Ok::<(), ImportError>(())
    })
}
