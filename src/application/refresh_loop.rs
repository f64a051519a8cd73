// Refresh loop - warm-up, then build, render and push a frame every interval
use crate::application::snapshot_service::SnapshotService;
use crate::infrastructure::display::{BackgroundArt, DisplayError, EpaperDisplay};
use crate::presentation::renderer::{RenderFields, Renderer};
use std::future::Future;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSchedule {
    /// Delay before the display is first opened
    pub warmup: Duration,
    /// Sleep between the end of one cycle and the start of the next
    pub interval: Duration,
}

impl Default for RefreshSchedule {
    fn default() -> Self {
        Self {
            warmup: Duration::from_secs(60),
            interval: Duration::from_secs(1740),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Startup,
    Cycling,
    Terminated,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub faults: u64,
}

pub struct RefreshLoop {
    snapshots: SnapshotService,
    renderer: Renderer,
    background: BackgroundArt,
    schedule: RefreshSchedule,
}

impl RefreshLoop {
    pub fn new(
        snapshots: SnapshotService,
        renderer: Renderer,
        background: BackgroundArt,
        schedule: RefreshSchedule,
    ) -> Self {
        Self {
            snapshots,
            renderer,
            background,
            schedule,
        }
    }

    /// Run until `shutdown` resolves. Per-cycle faults are logged and never end the loop;
    /// only a failure to open the display at startup is returned as an error.
    pub async fn run<F, S>(&self, open_display: F, shutdown: S) -> anyhow::Result<RunSummary>
    where
        F: FnOnce() -> Result<Box<dyn EpaperDisplay>, DisplayError>,
        S: Future<Output = ()>,
    {
        let mut summary = RunSummary::default();
        tracing::info!("Rack panel starting, state {:?}", LoopState::Startup);

        let outcome = tokio::select! {
            result = self.drive(open_display, &mut summary) => result,
            _ = shutdown => {
                tracing::info!("Interrupt received, exiting");
                Ok(())
            }
        };

        tracing::info!(
            "Panel refresh {:?} at {} after {} cycles ({} faults)",
            LoopState::Terminated,
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            summary.cycles,
            summary.faults
        );
        outcome.map(|_| summary)
    }

    async fn drive<F>(&self, open_display: F, summary: &mut RunSummary) -> anyhow::Result<()>
    where
        F: FnOnce() -> Result<Box<dyn EpaperDisplay>, DisplayError>,
    {
        tokio::time::sleep(self.schedule.warmup).await;

        let mut display = open_display()?;
        if let Err(e) = self.background.load() {
            tracing::error!("Background art unusable, frames will start blank: {}", e);
        }
        tracing::info!("Display ready, state {:?}", LoopState::Cycling);

        loop {
            let started = Instant::now();
            summary.cycles += 1;

            match self.run_cycle(display.as_mut()).await {
                Ok(()) => tracing::info!(
                    "Cycle {} pushed in {:.1}s",
                    summary.cycles,
                    started.elapsed().as_secs_f64()
                ),
                Err(e) => {
                    summary.faults += 1;
                    tracing::error!(
                        "Cycle {} failed, retrying next interval: {}",
                        summary.cycles,
                        e
                    );
                }
            }

            tokio::time::sleep(self.schedule.interval).await;
        }
    }

    async fn run_cycle(&self, display: &mut dyn EpaperDisplay) -> Result<(), DisplayError> {
        let snapshot = self.snapshots.build_snapshot().await;
        tracing::debug!("Snapshot: {:?}", snapshot);

        let (mut black, mut highlight) = self.background.load_or_blank();
        let fields = RenderFields::from_values(snapshot.render_values());
        self.renderer.render(&fields, &mut black, &mut highlight);

        display.init()?;
        let pushed = display.display(&black, &highlight);
        // Put the panel to sleep even when the transfer failed
        let slept = display.sleep();
        pushed.and(slept)
    }
}
