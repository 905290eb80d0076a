use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use rodio::{source::UniformSourceIterator, Decoder, OutputStream, OutputStreamBuilder, Sink, Source};

use crate::{AudioConfig, GhostiesError, Result};

/// Capability invoked with every block of decoded audio before it is mixed to
/// the output device.
///
/// `samples` holds `frames` interleaved stereo frames (L, R, L, R, ...) and may
/// be rewritten in place. Implementations run on the audio thread and must
/// not block.
pub trait AudioSink: Send {
    fn on_buffer(&mut self, samples: &mut [f32], frames: usize) -> Result<()>;
}

/// Slot holding the currently attached processor.
///
/// The slot is locked for the duration of each callback, so once
/// [`ProcessorHook::detach`] returns the detached sink will not be invoked again.
#[derive(Clone, Default)]
pub struct ProcessorHook {
    slot: Arc<Mutex<Option<Box<dyn AudioSink>>>>,
}

impl ProcessorHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `sink`, replacing any processor that was attached before.
    pub fn attach(&self, sink: Box<dyn AudioSink>) -> Result<()> {
        let mut slot = self.lock()?;
        if slot.replace(sink).is_some() {
            tracing::debug!("replaced previously attached audio processor");
        }
        Ok(())
    }

    /// Removes the attached processor and hands it back to the caller.
    pub fn detach(&self) -> Result<Option<Box<dyn AudioSink>>> {
        let mut slot = self.lock()?;
        Ok(slot.take())
    }

    pub fn is_attached(&self) -> bool {
        self.slot
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    /// Runs the attached processor over one block. Failures cannot reach the
    /// caller on the audio thread, so they are logged and the block is left
    /// as the processor left it.
    pub fn process(&self, samples: &mut [f32], frames: usize) {
        let mut slot = match self.slot.lock() {
            Ok(slot) => slot,
            Err(_) => {
                tracing::warn!("audio processor slot poisoned; passing audio through");
                return;
            }
        };

        if let Some(sink) = slot.as_mut() {
            if let Err(err) = sink.on_buffer(samples, frames) {
                tracing::warn!(%err, frames, "audio processor rejected block");
            }
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Box<dyn AudioSink>>>> {
        self.slot
            .lock()
            .map_err(|_| GhostiesError::msg("audio processor slot has been poisoned"))
    }
}

impl std::fmt::Debug for ProcessorHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorHook")
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Source adapter that gathers blocks of stereo frames from `inner`, hands
/// each block to the [`ProcessorHook`], and then yields the processed samples.
///
/// The inner source must already be stereo; use [`ProcessedSource::stereo`]
/// to normalise arbitrary decoder output. A trailing partial frame at the
/// end of the stream is yielded unprocessed.
pub struct ProcessedSource<S> {
    inner: S,
    hook: ProcessorHook,
    block: Vec<f32>,
    cursor: usize,
    block_frames: usize,
}

impl<S> ProcessedSource<S>
where
    S: Source,
{
    pub fn new(inner: S, hook: ProcessorHook, block_frames: usize) -> Self {
        let block_frames = block_frames.max(1);
        Self {
            inner,
            hook,
            block: Vec::with_capacity(block_frames * 2),
            cursor: 0,
            block_frames,
        }
    }

    /// Converts `source` to two channels at its own sample rate and wraps it.
    pub fn stereo(
        source: S,
        hook: ProcessorHook,
        block_frames: usize,
    ) -> ProcessedSource<UniformSourceIterator<S>> {
        let sample_rate = source.sample_rate();
        ProcessedSource::new(
            UniformSourceIterator::new(source, 2, sample_rate),
            hook,
            block_frames,
        )
    }

    fn refill(&mut self) -> bool {
        self.block.clear();
        self.cursor = 0;
        self.block
            .extend(self.inner.by_ref().take(self.block_frames * 2));

        let frames = self.block.len() / 2;
        if frames > 0 {
            self.hook.process(&mut self.block[..frames * 2], frames);
        }
        !self.block.is_empty()
    }
}

impl<S> Iterator for ProcessedSource<S>
where
    S: Source,
{
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.cursor >= self.block.len() && !self.refill() {
            return None;
        }
        let sample = self.block[self.cursor];
        self.cursor += 1;
        Some(sample)
    }
}

impl<S> Source for ProcessedSource<S>
where
    S: Source,
{
    fn current_span_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        2
    }

    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }
}

/// Output device plus the processor hook every stream it plays is routed
/// through.
pub struct AudioEngine {
    stream: OutputStream,
    hook: ProcessorHook,
    block_frames: usize,
    looping: bool,
}

impl AudioEngine {
    /// Opens the default output device.
    pub fn open(config: &AudioConfig) -> Result<Self> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|err| GhostiesError::Device(err.to_string()))?;
        // Stream teardown is reported through tracing instead of stderr.
        stream.log_on_drop(false);
        tracing::info!(block_frames = config.block_frames, "audio device opened");

        Ok(Self {
            stream,
            hook: ProcessorHook::new(),
            block_frames: config.block_frames,
            looping: config.looping,
        })
    }

    pub fn attach_processor(&self, sink: Box<dyn AudioSink>) -> Result<()> {
        self.hook.attach(sink)?;
        tracing::info!("audio processor attached");
        Ok(())
    }

    pub fn detach_processor(&self) -> Result<()> {
        if self.hook.detach()?.is_some() {
            tracing::info!("audio processor detached");
        }
        Ok(())
    }

    /// Decodes the header of `path` and queues it, paused, on a fresh sink.
    pub fn load_music(&self, path: &Path) -> Result<MusicStream> {
        let sink = Sink::connect_new(self.stream.mixer());
        sink.pause();

        let music = MusicStream {
            path: path.to_path_buf(),
            sink,
            hook: self.hook.clone(),
            block_frames: self.block_frames,
            looping: self.looping,
        };
        music.enqueue()?;
        tracing::info!(path = %path.display(), looping = self.looping, "music stream loaded");
        Ok(music)
    }

    /// Detaches the processor and releases the output device.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        if let Ok(Some(_)) = self.hook.detach() {
            tracing::debug!("audio processor detached on engine shutdown");
        }
        tracing::info!("audio device closed");
    }
}

impl std::fmt::Debug for AudioEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioEngine")
            .field("hook", &self.hook)
            .field("block_frames", &self.block_frames)
            .field("looping", &self.looping)
            .finish()
    }
}

/// A soundtrack streamed from disk through the engine's processor hook.
pub struct MusicStream {
    path: PathBuf,
    sink: Sink,
    hook: ProcessorHook,
    block_frames: usize,
    looping: bool,
}

impl MusicStream {
    pub fn play(&self) {
        self.sink.play();
        tracing::info!(path = %self.path.display(), "playback started");
    }

    pub fn is_playing(&self) -> bool {
        !self.sink.is_paused() && !self.sink.empty()
    }

    /// Called once per rendered frame. Re-queues the soundtrack once it has
    /// played out when looping is enabled.
    pub fn update(&self) -> Result<()> {
        if self.looping && self.sink.empty() {
            tracing::debug!(path = %self.path.display(), "soundtrack finished, looping");
            self.enqueue()?;
        }
        Ok(())
    }

    pub fn stop(&self) {
        self.sink.stop();
    }

    /// Stops playback and releases the decoder.
    pub fn unload(self) {
        drop(self);
    }

    fn enqueue(&self) -> Result<()> {
        let decoder = open_decoder(&self.path)?;
        self.sink.append(ProcessedSource::stereo(
            decoder,
            self.hook.clone(),
            self.block_frames,
        ));
        Ok(())
    }
}

impl Drop for MusicStream {
    fn drop(&mut self) {
        self.stop();
        tracing::info!(path = %self.path.display(), "music stream unloaded");
    }
}

impl std::fmt::Debug for MusicStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MusicStream")
            .field("path", &self.path)
            .field("looping", &self.looping)
            .finish()
    }
}

fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>> {
    if !path.is_file() {
        return Err(GhostiesError::MissingAsset(path.to_path_buf()));
    }
    let file = File::open(path)?;
    Decoder::new(BufReader::new(file)).map_err(|err| GhostiesError::Decode {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}
