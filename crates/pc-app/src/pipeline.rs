use anyhow::{Context, Result, anyhow};
use pc_ascii::compositor::Compositor;
use pc_core::frame::{Frame, Looping};
use pc_export::font::FontSource;
use pc_export::gif::quantize_frame;
use pc_export::rasterizer::{Ink, RasterLayout, Rasterizer};
use pc_source::gif::GifSource;
use rayon::prelude::*;

/// Pool borné : au plus `cap` tâches en vol, par lots successifs.
///
/// A batch of up to `cap` jobs is dispatched, then the caller blocks until
/// every job of the batch is done before the next batch starts.
pub struct BoundedPool {
    pool: rayon::ThreadPool,
    cap: usize,
}

impl BoundedPool {
    /// Pool of exactly `cap` workers.
    ///
    /// # Errors
    /// Returns an error if the worker threads can't be spawned.
    pub fn new(cap: usize) -> Result<Self> {
        let cap = cap.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(cap)
            .thread_name(|i| format!("picscii-worker-{i}"))
            .build()
            .context("Impossible de créer le pool de workers")?;
        Ok(Self { pool, cap })
    }

    /// One worker per logical CPU.
    ///
    /// # Errors
    /// Returns an error if the worker threads can't be spawned.
    pub fn with_host_parallelism() -> Result<Self> {
        let cap = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
        log::debug!("worker pool: {cap} threads");
        Self::new(cap)
    }

    /// Maximum number of jobs in flight.
    #[must_use]
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Exécute `job` sur chaque entrée, lot par lot, résultats rangés par index.
    ///
    /// `on_batch(done, total)` runs on the calling thread after each batch.
    /// The first failing job aborts the run once its batch has drained.
    ///
    /// # Errors
    /// Returns the first job error.
    pub fn run_batches<I, O, F>(
        &self,
        inputs: &[I],
        job: F,
        mut on_batch: impl FnMut(usize, usize),
    ) -> Result<Vec<O>>
    where
        I: Sync,
        O: Send,
        F: Fn(usize, &I) -> Result<O> + Sync,
    {
        let total = inputs.len();
        let mut slots: Vec<Option<O>> = std::iter::repeat_with(|| None).take(total).collect();

        for (batch, (ins, outs)) in inputs
            .chunks(self.cap)
            .zip(slots.chunks_mut(self.cap))
            .enumerate()
        {
            let base = batch * self.cap;
            self.pool.install(|| {
                outs.par_iter_mut()
                    .zip(ins.par_iter())
                    .enumerate()
                    .try_for_each(|(j, (slot, input))| -> Result<()> {
                        *slot = Some(job(base + j, input)?);
                        Ok(())
                    })
            })?;
            on_batch(base + ins.len(), total);
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| slot.ok_or_else(|| anyhow!("job {i} produced no result")))
            .collect()
    }
}

fn percent(done: usize, total: usize) -> usize {
    if total == 0 { 100 } else { done * 100 / total }
}

/// Animation convertie : frames dans l'ordre source + bouclage.
#[derive(Debug)]
pub struct ConvertedGif {
    /// Converted frames in source order.
    pub frames: Vec<Frame>,
    /// Loop policy of the source.
    pub looping: Looping,
}

/// Premier passage : chaque frame GIF devient une grille de glyphes.
///
/// Bounds are checked for every frame before any conversion starts.
///
/// # Errors
/// [`pc_core::CoreError::FrameBoundsMismatch`] for sub-image placement,
/// or the first per-frame conversion error.
pub fn convert_gif(
    pool: &BoundedPool,
    compositor: &Compositor,
    source: &GifSource,
) -> Result<ConvertedGif> {
    source.check_bounds()?;
    log::debug!("{} frames, lots de {}", source.frames.len(), pool.cap());

    let grids = pool.run_batches(
        &source.frames,
        |_, frame| compositor.process(&frame.buffer),
        |done, total| log::info!("Generating ascii art... {}%", percent(done, total)),
    )?;

    let frames = grids
        .into_iter()
        .zip(&source.frames)
        .map(|(glyphs, src)| Frame {
            glyphs,
            delay: src.delay,
            bounds: src.bounds,
        })
        .collect();
    Ok(ConvertedGif {
        frames,
        looping: source.looping,
    })
}

/// Second passage : rasterisation + quantification de chaque frame.
///
/// Frames share their bounds, so one layout and one glyph atlas serve all.
///
/// # Errors
/// Invalid font, or a canvas too large for GIF.
pub fn rasterize_gif(
    pool: &BoundedPool,
    font: &FontSource,
    frames: &[Frame],
    extra_chars: &[char],
    ink: Ink,
    background: [u8; 4],
) -> Result<Vec<gif::Frame<'static>>> {
    let Some(first) = frames.first() else {
        return Ok(Vec::new());
    };
    let layout = RasterLayout::gif_frame(
        first.glyphs.width(),
        first.glyphs.height(),
        first.bounds.width,
        first.bounds.height,
    );
    let mut rasterizer = Rasterizer::new(font, layout.font_size)?;
    rasterizer.cache_chars(extra_chars.iter().copied());
    // Les GIF n'ont pas d'opacité partielle.
    let background = [background[0], background[1], background[2], 100];

    pool.run_batches(
        frames,
        |_, frame| {
            let canvas = rasterizer.render(&frame.glyphs, &layout, ink, background);
            quantize_frame(&canvas, frame.delay)
        },
        |done, total| log::info!("Saving gif... {}%", percent(done, total)),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use pc_ascii::color::ColorLevel;
    use pc_core::config::ConvertConfig;
    use pc_core::error::CoreError;
    use pc_core::frame::{Bounds, FrameBuffer};
    use pc_source::gif::GifFrame;
    use pc_source::terminal::FixedTerminal;

    use super::*;

    fn gif_frame(w: u32, h: u32, delay: u16, gray: u8) -> GifFrame {
        GifFrame {
            buffer: FrameBuffer::filled(w, h, (gray, gray, gray)),
            delay,
            bounds: Bounds {
                left: 0,
                top: 0,
                width: w,
                height: h,
            },
        }
    }

    fn compositor() -> Compositor {
        let config = ConvertConfig {
            dimensions: Some((4, 2)),
            ..ConvertConfig::default()
        };
        let term = FixedTerminal {
            columns: 80,
            rows: 24,
        };
        Compositor::new(&config, ColorLevel::None, &term).unwrap()
    }

    #[test]
    fn in_flight_jobs_never_exceed_cap() {
        let pool = BoundedPool::new(3).unwrap();
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let inputs: Vec<usize> = (0..20).collect();
        let out = pool
            .run_batches(
                &inputs,
                |_, &x| {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(2));
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok(x * 2)
                },
                |_, _| {},
            )
            .unwrap();
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(out, inputs.iter().map(|x| x * 2).collect::<Vec<_>>());
    }

    #[test]
    fn batches_do_not_overlap() {
        let pool = BoundedPool::new(4).unwrap();
        let log = Mutex::new(Vec::new());
        let inputs: Vec<usize> = (0..10).collect();
        let mut boundaries = Vec::new();
        pool.run_batches(
            &inputs,
            |i, _| {
                // Les derniers de chaque lot finissent en premier.
                std::thread::sleep(Duration::from_millis((4 - (i % 4)) as u64 * 3));
                log.lock().unwrap().push(i);
                Ok(())
            },
            |done, total| boundaries.push((done, total)),
        )
        .unwrap();
        assert_eq!(boundaries, vec![(4, 10), (8, 10), (10, 10)]);

        let order = log.into_inner().unwrap();
        let batch_of: Vec<usize> = order.iter().map(|i| i / 4).collect();
        assert!(batch_of.windows(2).all(|w| w[0] <= w[1]), "{order:?}");
    }

    #[test]
    fn order_follows_index_not_completion() {
        let pool = BoundedPool::new(8).unwrap();
        let inputs: Vec<u64> = (0..8).collect();
        let out = pool
            .run_batches(
                &inputs,
                |_, &x| {
                    std::thread::sleep(Duration::from_millis((8 - x) * 2));
                    Ok(x)
                },
                |_, _| {},
            )
            .unwrap();
        assert_eq!(out, inputs);
    }

    #[test]
    fn job_error_aborts_run() {
        let pool = BoundedPool::new(2).unwrap();
        let calls = AtomicUsize::new(0);
        let inputs: Vec<usize> = (0..6).collect();
        let res: Result<Vec<()>> = pool.run_batches(
            &inputs,
            |i, _| {
                calls.fetch_add(1, Ordering::SeqCst);
                if i == 1 { Err(anyhow!("boom")) } else { Ok(()) }
            },
            |_, _| {},
        );
        assert!(res.is_err());
        assert!(calls.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn gif_frames_keep_order_and_delay() {
        let source = GifSource {
            frames: vec![gif_frame(8, 4, 3, 0), gif_frame(8, 4, 7, 255), gif_frame(8, 4, 11, 140)],
            looping: Looping::Times(2),
        };
        let pool = BoundedPool::new(2).unwrap();
        let out = convert_gif(&pool, &compositor(), &source).unwrap();
        let delays: Vec<u16> = out.frames.iter().map(|f| f.delay).collect();
        assert_eq!(delays, vec![3, 7, 11]);
        assert_eq!(out.frames[0].glyphs.get(0, 0).ch, ' ');
        assert_eq!(out.frames[1].glyphs.get(0, 0).ch, '@');
        assert_eq!(out.frames[2].glyphs.get(0, 0).ch, '+');
        assert_eq!(out.looping, Looping::Times(2));
    }

    #[test]
    fn degenerate_caps_behave_like_any_other() {
        let source = GifSource {
            frames: vec![gif_frame(8, 4, 3, 0), gif_frame(8, 4, 7, 255), gif_frame(8, 4, 11, 140)],
            looping: Looping::Forever,
        };
        let zero = BoundedPool::new(0).unwrap();
        assert_eq!(zero.cap(), 1);
        let wide = BoundedPool::new(64).unwrap();
        let a = convert_gif(&zero, &compositor(), &source).unwrap();
        let b = convert_gif(&wide, &compositor(), &source).unwrap();
        for (x, y) in a.frames.iter().zip(&b.frames) {
            assert_eq!(x.glyphs, y.glyphs);
            assert_eq!(x.delay, y.delay);
        }
    }

    #[test]
    fn raster_pass_keeps_order_and_delays() {
        let Ok(font) = pc_export::font::load_font(None) else {
            return;
        };
        let source = GifSource {
            frames: vec![gif_frame(8, 4, 3, 0), gif_frame(8, 4, 7, 255), gif_frame(8, 4, 11, 140)],
            looping: Looping::Forever,
        };
        let converted = convert_gif(&BoundedPool::new(2).unwrap(), &compositor(), &source).unwrap();
        let ink = Ink::Fixed((255, 255, 255));
        let bg = [0, 0, 0, 100];

        let raster = |pool: &BoundedPool, frames: &[Frame]| {
            rasterize_gif(pool, &font, frames, &[], ink, bg).unwrap()
        };
        let zero = raster(&BoundedPool::new(0).unwrap(), &converted.frames);
        let wide = raster(&BoundedPool::new(64).unwrap(), &converted.frames);

        assert_eq!(zero.len(), 3);
        let delays: Vec<u16> = zero.iter().map(|f| f.delay).collect();
        assert_eq!(delays, vec![3, 7, 11]);
        let single = BoundedPool::new(1).unwrap();
        for (i, frame) in zero.iter().enumerate() {
            let alone = raster(&single, &converted.frames[i..=i]);
            assert_eq!(frame.buffer, alone[0].buffer, "frame {i}");
            assert_eq!(frame.buffer, wide[i].buffer, "frame {i}");
            assert_eq!((frame.width, frame.height), (18, 18));
        }
    }

    #[test]
    fn mismatched_bounds_fail_before_conversion() {
        let mut odd = gif_frame(8, 4, 3, 0);
        odd.bounds.left = 2;
        let source = GifSource {
            frames: vec![gif_frame(8, 4, 3, 0), odd, gif_frame(8, 4, 3, 0)],
            looping: Looping::Forever,
        };
        let pool = BoundedPool::new(2).unwrap();
        let err = convert_gif(&pool, &compositor(), &source).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::FrameBoundsMismatch { index: 1, .. })
        ));
    }
}
