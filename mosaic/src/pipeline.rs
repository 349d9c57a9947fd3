// pipeline.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Conversion runs for still images and animations
use crate::budget::Budget;
use crate::encode::check_frames;
use crate::error::{Error, Result};
use crate::options::{MosaicOptions, OptionsBuilder};
use crate::private::{Decoder, Encoder};
use crate::raster::{Frame, PixelBuffer};
use crate::transform::transform;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Default decode / encode budget
const DEFAULT_BUDGET: Duration = Duration::from_secs(30);

/// State of a conversion run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunState {
    /// No run started
    #[default]
    Idle,
    /// Decoding animation frames
    Decoding,
    /// Transforming frames
    Processing,
    /// Encoding animation frames
    Encoding,
    /// Result published
    Done,
    /// Run failed with an error
    Failed,
}

impl RunState {
    /// Check whether a transition to another state is legal
    pub fn can_enter(self, next: RunState) -> bool {
        use RunState::*;
        match (self, next) {
            (Idle, Decoding) | (Idle, Processing) => true,
            (Decoding, Processing) => true,
            (Processing, Encoding) | (Processing, Done) => true,
            (Encoding, Done) => true,
            (Decoding | Processing | Encoding, Failed) => true,
            _ => false,
        }
    }
}

/// Output of a completed run
#[derive(Clone, Debug, PartialEq)]
pub enum Artifact {
    /// Still image
    Image(PixelBuffer),
    /// Animation
    Animation(Animation),
}

/// Converted animation
#[derive(Clone, Debug, PartialEq)]
pub struct Animation {
    /// Screen width
    pub width: u32,
    /// Screen height
    pub height: u32,
    /// Loop count carried from the source (zero for forever)
    pub loop_count: Option<u16>,
    /// Transformed frames, in source order
    pub frames: Vec<Frame>,
    /// Encoded GIF
    pub gif: Vec<u8>,
}

/// Token identifying one conversion run.
///
/// A token becomes stale as soon as a newer run begins, or the options
/// change.
#[derive(Debug)]
pub struct RunToken<'a> {
    /// Generation of the run
    generation: u64,
    /// Current generation of the converter
    current: &'a AtomicU64,
}

impl RunToken<'_> {
    /// Get the run generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Check if the run has not been superseded
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::Acquire) == self.generation
    }

    /// Check the run, failing with `Cancelled` if superseded
    pub fn check(&self) -> Result<()> {
        if self.is_current() {
            Ok(())
        } else {
            Err(Error::Cancelled)
        }
    }
}

/// State shared by runs, guarded together
#[derive(Debug, Default)]
struct Slot {
    /// State of the current run
    state: RunState,
    /// Latest published result
    latest: Option<Artifact>,
}

/// Mosaic converter for still images and animations.
///
/// Only the most recent run may publish a result: starting a run, or
/// changing options, makes every earlier run stale.  Stale runs stop at
/// their next checkpoint with `Error::Cancelled`.
///
/// ## Example
/// ```
/// use mosaic::{Converter, MosaicOptions, PixelBuffer, Shape};
/// use pix::rgb::SRgba8;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let conv = Converter::new();
/// conv.set_options(MosaicOptions::builder().with_shape(Shape::Circle))?;
/// let source = PixelBuffer::with_color(32, 32, SRgba8::new(200, 40, 40, 255))?;
/// let out = conv.convert_image(&source)?;
/// assert_eq!((out.width(), out.height()), (32, 32));
/// # Ok(())
/// # }
/// ```
pub struct Converter {
    /// Generation of the current run
    generation: AtomicU64,
    /// Run state and result slot
    slot: Mutex<Slot>,
    /// Options for new runs
    options: Mutex<MosaicOptions>,
    /// Worker pool (global pool if `None`)
    pool: Option<ThreadPool>,
    /// Decode / encode budget
    budget: Duration,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

/// Lock a mutex, ignoring poisoning
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Converter {
    /// Create a converter with default options
    pub fn new() -> Self {
        Converter {
            generation: AtomicU64::new(0),
            slot: Mutex::new(Slot::default()),
            options: Mutex::new(MosaicOptions::default()),
            pool: None,
            budget: DEFAULT_BUDGET,
        }
    }

    /// Use a dedicated worker pool for frame processing.
    ///
    /// `None` (or zero) uses the global pool size.
    pub fn with_threads(mut self, threads: Option<usize>) -> Result<Self> {
        self.pool = match threads {
            Some(n) => Some(ThreadPoolBuilder::new().num_threads(n).build()?),
            None => None,
        };
        Ok(self)
    }

    /// Set the budget for decoding and encoding
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    /// Set initial options
    pub fn with_options(self, options: MosaicOptions) -> Self {
        *lock(&self.options) = options;
        self
    }

    /// Get the options for new runs
    pub fn options(&self) -> MosaicOptions {
        lock(&self.options).clone()
    }

    /// Change options.
    ///
    /// Options are validated first; on error nothing changes.  Otherwise
    /// any in-flight run is cancelled.
    pub fn set_options(&self, builder: OptionsBuilder) -> Result<()> {
        let options = builder.build()?;
        *lock(&self.options) = options;
        self.cancel();
        Ok(())
    }

    /// Cancel any in-flight run, returning to `Idle`
    pub fn cancel(&self) {
        let mut slot = lock(&self.slot);
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        slot.state = RunState::Idle;
        debug!("run {generation}: cancelled earlier runs");
    }

    /// Begin a new run, superseding all earlier runs
    pub fn begin(&self) -> RunToken<'_> {
        let mut slot = lock(&self.slot);
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        slot.state = RunState::Idle;
        RunToken {
            generation,
            current: &self.generation,
        }
    }

    /// Get the state of the current run
    pub fn state(&self) -> RunState {
        lock(&self.slot).state
    }

    /// Get the latest published result
    pub fn latest(&self) -> Option<Artifact> {
        lock(&self.slot).latest.clone()
    }

    /// Move the current run to a new state
    fn enter(&self, token: &RunToken, next: RunState) -> Result<()> {
        let mut slot = lock(&self.slot);
        token.check()?;
        if !slot.state.can_enter(next) {
            warn!("run {}: illegal {:?} → {next:?}", token.generation, slot.state);
        }
        debug!("run {}: {:?} → {next:?}", token.generation, slot.state);
        slot.state = next;
        Ok(())
    }

    /// Publish the result of a run, if it is still current
    fn publish(&self, token: &RunToken, artifact: Artifact) -> Result<()> {
        let mut slot = lock(&self.slot);
        token.check()?;
        slot.state = RunState::Done;
        slot.latest = Some(artifact);
        info!("run {}: done", token.generation);
        Ok(())
    }

    /// Finish a run, publishing its result
    fn finish<T: Clone>(
        &self,
        token: &RunToken,
        res: Result<T>,
        artifact: impl FnOnce(T) -> Artifact,
    ) -> Result<T> {
        match res {
            Ok(out) => {
                self.publish(token, artifact(out.clone()))?;
                Ok(out)
            }
            Err(Error::Cancelled) => {
                info!("run {}: superseded", token.generation);
                Err(Error::Cancelled)
            }
            Err(e) => match self.enter(token, RunState::Failed) {
                Ok(()) => {
                    warn!("run {}: failed: {e}", token.generation);
                    Err(e)
                }
                Err(_) => {
                    info!("run {}: superseded ({e})", token.generation);
                    Err(Error::Cancelled)
                }
            },
        }
    }

    /// Convert a still image
    pub fn convert_image(&self, source: &PixelBuffer) -> Result<PixelBuffer> {
        let token = self.begin();
        let options = self.options();
        info!(
            "run {}: image {}x{}",
            token.generation,
            source.width(),
            source.height()
        );
        let res = self
            .enter(&token, RunState::Processing)
            .map(|_| transform(source, &options));
        self.finish(&token, res, Artifact::Image)
    }

    /// Convert an animated GIF
    pub fn convert_animation(&self, bytes: &[u8]) -> Result<Animation> {
        let token = self.begin();
        let options = self.options();
        info!("run {}: animation, {} bytes", token.generation, bytes.len());
        let res = self.run_animation(&token, bytes, &options);
        self.finish(&token, res, Artifact::Animation)
    }

    /// Run the animation stages
    fn run_animation(
        &self,
        token: &RunToken,
        bytes: &[u8],
        options: &MosaicOptions,
    ) -> Result<Animation> {
        self.enter(token, RunState::Decoding)?;
        let mut decoder = Decoder::new(bytes)
            .budget(Budget::with_timeout(self.budget))
            .into_frames();
        let mut frames = Vec::new();
        for frame in &mut decoder {
            token.check()?;
            frames.push(frame?);
        }
        let (width, height) = match (frames.is_empty(), decoder.screen_size())
        {
            (false, Some(sz)) => sz,
            _ => return Err(Error::NoFrames),
        };
        let loop_count = decoder.loop_count();
        self.enter(token, RunState::Processing)?;
        let frames = self.process(token, &frames, options)?;
        self.enter(token, RunState::Encoding)?;
        let (w, h) = check_frames(&frames, width, height)?;
        let mut gif = Vec::new();
        let mut enc = Encoder::new(&mut gif)
            .into_frame_enc(w, h)
            .with_loop_count(loop_count)
            .with_budget(Budget::with_timeout(self.budget));
        for frame in &frames {
            token.check()?;
            enc.encode_frame(frame)?;
        }
        enc.finish()?;
        Ok(Animation {
            width,
            height,
            loop_count,
            frames,
            gif,
        })
    }

    /// Transform frames in parallel, keeping source order
    fn process(
        &self,
        token: &RunToken,
        frames: &[Frame],
        options: &MosaicOptions,
    ) -> Result<Vec<Frame>> {
        let work = || {
            frames
                .par_iter()
                .map(|frame| {
                    token.check()?;
                    let buffer = transform(frame.buffer(), options);
                    Ok(frame.clone().with_buffer(buffer))
                })
                .collect::<Result<Vec<_>>>()
        };
        match &self.pool {
            Some(pool) => pool.install(work),
            None => work(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::encode::encode;
    use crate::options::{ColorModeKind, Shape};
    use crate::ErrorKind;
    use pix::rgb::SRgba8;

    fn gradient(width: u32, height: u32, shift: u32) -> PixelBuffer {
        let mut buf =
            PixelBuffer::with_color(width, height, SRgba8::default()).unwrap();
        for y in 0..height {
            for x in 0..width {
                let r = ((x + shift) * 255 / width) as u8;
                let g = (y * 255 / height) as u8;
                buf.set_pixel(x, y, SRgba8::new(r, g, (x ^ y) as u8, 255));
            }
        }
        buf
    }

    fn animation() -> Vec<u8> {
        let frames: Vec<_> = [100, 500, 2000, 70]
            .iter()
            .enumerate()
            .map(|(i, &d)| Frame::new(gradient(24, 16, i as u32 * 3), d))
            .collect();
        encode(&frames, 24, 16).unwrap()
    }

    #[test]
    fn transitions() {
        use RunState::*;
        assert!(Idle.can_enter(Decoding));
        assert!(Idle.can_enter(Processing));
        assert!(Processing.can_enter(Done));
        assert!(Encoding.can_enter(Failed));
        assert!(!Idle.can_enter(Failed));
        assert!(!Done.can_enter(Processing));
        assert!(!Failed.can_enter(Done));
        assert!(!Decoding.can_enter(Encoding));
    }

    #[test]
    fn image_published() -> Result<()> {
        let conv = Converter::new();
        assert_eq!(conv.state(), RunState::Idle);
        let src = gradient(20, 20, 0);
        let out = conv.convert_image(&src)?;
        assert_eq!(out, transform(&src, &conv.options()));
        assert_eq!(conv.state(), RunState::Done);
        assert_eq!(conv.latest(), Some(Artifact::Image(out)));
        Ok(())
    }

    #[test]
    fn animation_converted() -> Result<()> {
        let conv = Converter::new().with_threads(Some(2))?;
        conv.set_options(
            MosaicOptions::builder()
                .with_block_size(4)
                .with_shape(Shape::Diamond),
        )?;
        let anim = conv.convert_animation(&animation())?;
        assert_eq!((anim.width, anim.height), (24, 16));
        let delays: Vec<_> = anim.frames.iter().map(|f| f.delay_ms()).collect();
        assert_eq!(delays, [100, 500, 2000, 70]);
        let decoded = crate::decode::decode(&anim.gif)?;
        assert_eq!(decoded, anim.frames);
        assert_eq!(conv.state(), RunState::Done);
        assert_eq!(conv.latest(), Some(Artifact::Animation(anim)));
        Ok(())
    }

    #[test]
    fn reverse_order_identical() -> Result<()> {
        let conv = Converter::new();
        let options = conv.options();
        let frames = crate::decode::decode(&animation())?;
        let token = conv.begin();
        let forward = conv.process(&token, &frames, &options)?;
        let mut reverse: Vec<_> = frames
            .iter()
            .enumerate()
            .rev()
            .map(|(i, f)| (i, transform(f.buffer(), &options)))
            .collect();
        reverse.sort_by_key(|(i, _)| *i);
        for ((_, buf), frame) in reverse.iter().zip(&forward) {
            assert_eq!(buf, frame.buffer());
        }
        assert_eq!(reverse.len(), forward.len());
        Ok(())
    }

    #[test]
    fn stale_run_cancelled() {
        let conv = Converter::new();
        let old = conv.begin();
        let new = conv.begin();
        assert!(!old.is_current());
        assert!(matches!(old.check(), Err(Error::Cancelled)));
        assert!(new.check().is_ok());
        assert!(new.generation() > old.generation());
        let frames = vec![Frame::new(gradient(8, 8, 0), 100)];
        let res = conv.process(&old, &frames, &conv.options());
        assert!(res.is_err_and(|e| e.is_cancelled()));
    }

    #[test]
    fn stale_run_never_published() {
        let conv = Converter::new();
        let old = conv.begin();
        let new = conv.begin();
        let img = gradient(4, 4, 0);
        let newer = Artifact::Image(img.clone());
        assert!(conv.finish(&new, Ok(img.clone()), Artifact::Image).is_ok());
        let res = conv.finish(&old, Ok(gradient(4, 4, 1)), Artifact::Image);
        assert!(matches!(res, Err(Error::Cancelled)));
        assert_eq!(conv.latest(), Some(newer));
        assert_eq!(conv.state(), RunState::Done);
    }

    #[test]
    fn stale_run_error_is_silent() {
        let conv = Converter::new();
        let old = conv.begin();
        let _new = conv.begin();
        let res: Result<PixelBuffer> =
            conv.finish(&old, Err(Error::MalformedHeader), Artifact::Image);
        assert!(matches!(res, Err(Error::Cancelled)));
        assert_eq!(conv.state(), RunState::Idle);
        assert_eq!(conv.latest(), None);
    }

    #[test]
    fn options_change_cancels() -> Result<()> {
        let conv = Converter::new();
        let token = conv.begin();
        conv.enter(&token, RunState::Processing)?;
        assert_eq!(conv.state(), RunState::Processing);
        conv.set_options(MosaicOptions::builder().with_block_size(3))?;
        assert!(!token.is_current());
        assert_eq!(conv.state(), RunState::Idle);
        assert_eq!(conv.options().block_size(), 3);
        // the stale run can no longer move the state
        assert!(conv.enter(&token, RunState::Done).is_err());
        assert_eq!(conv.state(), RunState::Idle);
        Ok(())
    }

    #[test]
    fn invalid_options_rejected() {
        let conv = Converter::new();
        let token = conv.begin();
        let res = conv.set_options(
            MosaicOptions::builder()
                .with_color_mode(ColorModeKind::Palette)
                .with_palette(None),
        );
        let err = res.err().map(|e| e.kind());
        assert_eq!(err, Some(ErrorKind::Configuration));
        // nothing changed, in-flight run continues
        assert!(token.is_current());
        assert_eq!(conv.options(), MosaicOptions::default());
        assert_eq!(conv.state(), RunState::Idle);
        assert_eq!(conv.latest(), None);
    }

    #[test]
    fn format_error_fails_run() {
        let conv = Converter::new();
        let res = conv.convert_animation(b"not a gif");
        let err = res.err().map(|e| e.kind());
        assert_eq!(err, Some(ErrorKind::Format));
        assert_eq!(conv.state(), RunState::Failed);
        assert_eq!(conv.latest(), None);
    }

    #[test]
    fn budget_exceeded_fails_run() {
        let conv = Converter::new().with_budget(Duration::ZERO);
        let res = conv.convert_animation(&animation());
        assert!(matches!(res, Err(Error::BudgetExceeded)));
        assert_eq!(conv.state(), RunState::Failed);
    }

    #[test]
    fn last_run_wins_across_threads() -> Result<()> {
        let conv = Converter::new();
        let gif = animation();
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    let _ = conv.convert_animation(&gif);
                });
            }
        });
        let last = conv.convert_image(&gradient(6, 6, 0))?;
        assert_eq!(conv.latest(), Some(Artifact::Image(last)));
        Ok(())
    }
}
