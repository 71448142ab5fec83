//! Single-slot asynchronous rasterization with a double-buffered surface.
//!
//! The scheduler owns two surfaces. `current` is what the host reads; the
//! other one travels to the worker thread with each job and comes back
//! through a channel. A finished surface is promoted only from [`poll`] or
//! [`finish`], and never when its job was cancelled or failed.
//!
//! [`poll`]: RasterScheduler::poll
//! [`finish`]: RasterScheduler::finish

use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use crate::draw::{DrawParameters, draw};
use crate::error::{RasterError, Result};
use crate::glyph::GlyphCache;
use crate::surface::{PixelFormat, PixelSurface};

type JobOutput = (PixelSurface, Result<()>);

struct RasterJob {
    cancel: Arc<AtomicBool>,
    receiver: Receiver<JobOutput>,
    join: Option<JoinHandle<()>>,
}

impl RasterJob {
    fn join(&mut self) {
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

pub struct RasterScheduler {
    current: PixelSurface,
    spare: Option<PixelSurface>,
    job: Option<RasterJob>,
    cache: Arc<GlyphCache>,
    pixels_changed: bool,
}

impl RasterScheduler {
    pub fn new(cache: Arc<GlyphCache>) -> Self {
        Self {
            current: PixelSurface::new(0, 0, PixelFormat::default()),
            spare: Some(PixelSurface::new(0, 0, PixelFormat::default())),
            job: None,
            cache,
            pixels_changed: false,
        }
    }

    /// Start painting `params`, superseding any job in flight.
    pub fn submit(&mut self, params: DrawParameters) {
        self.cancel();

        let mut surface = self
            .spare
            .take()
            .unwrap_or_else(|| PixelSurface::new(0, 0, params.pixel_format));
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = cancel.clone();
        let cache = self.cache.clone();
        let (tx, rx) = mpsc::channel();

        tracing::debug!(
            width = params.width(),
            height = params.height(),
            glyphs = params.glyph_range.len(),
            "raster job submitted"
        );
        let join = thread::spawn(move || {
            let result = draw(&params, &mut surface, &cache, &flag);
            let _ = tx.send((surface, result));
        });

        self.job = Some(RasterJob {
            cancel,
            receiver: rx,
            join: Some(join),
        });
    }

    /// Collect the job's outcome if it has finished.
    ///
    /// Returns `None` while nothing finished since the last call.
    pub fn poll(&mut self) -> Option<Result<()>> {
        let job = self.job.as_mut()?;
        match job.receiver.try_recv() {
            Ok(output) => {
                let mut job = self.job.take()?;
                job.join();
                Some(self.complete(job, output))
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                let mut job = self.job.take()?;
                job.join();
                tracing::warn!("raster worker exited without returning its surface");
                Some(Err(RasterError::WorkerLost))
            }
        }
    }

    /// Block until the job in flight finishes and collect it.
    pub fn finish(&mut self) -> Option<Result<()>> {
        let mut job = self.job.take()?;
        let output = job.receiver.recv();
        job.join();
        match output {
            Ok(output) => Some(self.complete(job, output)),
            Err(_) => Some(Err(RasterError::WorkerLost)),
        }
    }

    /// Cancel and join the job in flight. The current surface is kept.
    ///
    /// Returns whether a job was running.
    pub fn cancel(&mut self) -> bool {
        let Some(mut job) = self.job.take() else {
            return false;
        };
        job.cancel.store(true, Ordering::Relaxed);
        if let Ok((surface, _)) = job.receiver.recv() {
            self.spare = Some(surface);
        }
        job.join();
        tracing::debug!("raster job discarded");
        true
    }

    pub fn is_running(&self) -> bool {
        self.job.is_some()
    }

    pub fn pixels_were_changed(&self) -> bool {
        self.pixels_changed
    }

    /// The readable surface. Clears the change flag.
    pub fn pixels(&mut self) -> &PixelSurface {
        self.pixels_changed = false;
        &self.current
    }

    /// The readable surface, leaving the change flag alone.
    pub fn current(&self) -> &PixelSurface {
        &self.current
    }

    pub fn cache(&self) -> &Arc<GlyphCache> {
        &self.cache
    }

    fn complete(&mut self, job: RasterJob, (surface, result): JobOutput) -> Result<()> {
        let cancelled = job.cancel.load(Ordering::Relaxed);
        match result {
            Ok(()) if !cancelled => {
                self.spare = Some(mem::replace(&mut self.current, surface));
                self.pixels_changed = true;
                tracing::debug!("raster job promoted");
                Ok(())
            }
            Ok(()) => {
                self.spare = Some(surface);
                Err(RasterError::Cancelled)
            }
            Err(err) => {
                self.spare = Some(surface);
                if err != RasterError::Cancelled {
                    tracing::warn!(%err, "raster job failed");
                }
                Err(err)
            }
        }
    }
}

impl Drop for RasterScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for RasterScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterScheduler")
            .field("width", &self.current.width())
            .field("height", &self.current.height())
            .field("running", &self.is_running())
            .field("pixels_changed", &self.pixels_changed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use rune_text::{Format, LayoutConstraints, RunBuffer, SimpleShaper, Sizing, TextLayout, TextPart};

    use super::*;
    use crate::glyph::BlockRasterizer;
    use crate::surface::Rgba8;

    fn params(width: u32, height: u32) -> DrawParameters {
        let format = Format {
            charsize: 10,
            ..Format::default()
        };
        let constraints = LayoutConstraints {
            sizing: Sizing::Fixed { width, height },
            margin: 2,
        };
        let mut layout = TextLayout::new(format.clone(), constraints).unwrap();
        let run = RunBuffer::new(TextPart::new("hello", format), &SimpleShaper::new()).unwrap();
        layout.set_runs(vec![Arc::new(run)]);
        DrawParameters {
            background: Rgba8::new(0, 0, 255, 255),
            ..DrawParameters::new(layout)
        }
    }

    fn scheduler() -> RasterScheduler {
        RasterScheduler::new(Arc::new(GlyphCache::new(Arc::new(BlockRasterizer))))
    }

    #[test]
    fn finished_job_is_promoted() {
        let mut scheduler = scheduler();
        scheduler.submit(params(64, 32));
        assert_eq!(scheduler.finish(), Some(Ok(())));
        assert!(scheduler.pixels_were_changed());
        let pixels = scheduler.pixels();
        assert_eq!((pixels.width(), pixels.height()), (64, 32));
        assert_eq!(pixels.pixel(63, 31), Some(Rgba8::new(0, 0, 255, 255)));
        assert!(!scheduler.pixels_were_changed());
        assert!(!scheduler.is_running());
    }

    #[test]
    fn poll_eventually_reports_completion() {
        let mut scheduler = scheduler();
        scheduler.submit(params(32, 16));
        let deadline = Instant::now() + Duration::from_secs(10);
        let outcome = loop {
            if let Some(outcome) = scheduler.poll() {
                break outcome;
            }
            assert!(Instant::now() < deadline, "raster job never finished");
            thread::sleep(Duration::from_millis(1));
        };
        assert_eq!(outcome, Ok(()));
        assert_eq!(scheduler.current().width(), 32);
    }

    #[test]
    fn cancelled_job_never_replaces_current() {
        let mut scheduler = scheduler();
        scheduler.submit(params(64, 32));
        assert!(scheduler.cancel());
        assert!(!scheduler.pixels_were_changed());
        assert_eq!(scheduler.current().width(), 0);
        assert_eq!(scheduler.finish(), None);
        assert!(!scheduler.cancel());
    }

    #[test]
    fn latest_submission_wins() {
        let mut scheduler = scheduler();
        scheduler.submit(params(64, 32));
        scheduler.submit(params(48, 24));
        assert_eq!(scheduler.finish(), Some(Ok(())));
        assert_eq!(scheduler.current().width(), 48);
        assert_eq!(scheduler.poll(), None);
    }
}
