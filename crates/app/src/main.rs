use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use clap::Parser;
use talking_ghosties_core::{
    AnimationDriver, AppConfig, AudioEngine, ChannelLevels, EnvelopeTransform, FramePacer,
    MusicStream, PlaybackClock, RenderGraph, SceneFrame,
};
use tracing_subscriber::EnvFilter;

mod window;

use window::Window;

fn main() -> talking_ghosties_core::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_file)?;

    let config = cli.resolve_config()?;
    config.validate()?;
    run(&config)
}

fn run(config: &AppConfig) -> talking_ghosties_core::Result<()> {
    tracing::info!(
        soundtrack = %config.audio.soundtrack.display(),
        exponent = config.audio.exponent,
        "starting talking ghosties"
    );

    // Audio resources are acquired before the terminal switches to the
    // alternate screen so that failures print to a usable terminal.
    let engine = AudioEngine::open(&config.audio)?;
    let levels = Arc::new(ChannelLevels::new());
    engine.attach_processor(Box::new(EnvelopeTransform::new(
        config.audio.exponent,
        levels.clone(),
    )))?;
    let music = engine.load_music(&config.audio.soundtrack)?;

    let mut window = Window::open(&config.window.title)?;
    music.play();

    let result = render_loop(&mut window, &music, &levels, config);

    // Stop the stream and detach the processor before the device goes away,
    // and keep the window until audio is fully torn down.
    music.unload();
    let detached = engine.detach_processor();
    engine.close();
    window.close();

    result.and(detached)
}

fn render_loop(
    window: &mut Window,
    music: &MusicStream,
    levels: &ChannelLevels,
    config: &AppConfig,
) -> talking_ghosties_core::Result<()> {
    let width = config.window.width;
    let height = config.window.height;
    let driver = AnimationDriver::new(config.animation.clone(), width, height);
    let mut graph = RenderGraph::new(width, height);
    let mut clock = PlaybackClock::new();
    let mut pacer = FramePacer::new(config.window.target_fps);
    let mut frames: u64 = 0;
    let mut finished = false;

    while !window.should_close()? {
        music.update()?;
        if !finished && !music.is_playing() {
            tracing::info!(frames, "soundtrack finished");
            finished = true;
        }
        clock.advance(pacer.frame_time());

        let poses = driver.poses(clock.phase(), levels.snapshot());
        let scene = SceneFrame::compose(width, height, config.window.fade_alpha, &poses);
        window.draw(&mut graph, &scene)?;

        pacer.wait();
        frames += 1;
    }

    tracing::info!(frames, "window close requested");
    Ok(())
}

fn init_tracing(log_file: &Path) -> talking_ghosties_core::Result<()> {
    // The terminal is the drawing surface, so logs go to a file.
    let file = File::create(log_file)?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Two ghosts that talk along to a soundtrack", long_about = None)]
struct Cli {
    /// JSON configuration file. Missing fields use built-in defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Audio file to play.
    #[arg(short, long)]
    soundtrack: Option<PathBuf>,
    /// Power-law exponent applied to every sample (1.0 leaves audio untouched).
    #[arg(short, long)]
    exponent: Option<f32>,
    /// Target frame rate of the render loop.
    #[arg(long)]
    fps: Option<u32>,
    /// Play the soundtrack once instead of looping it.
    #[arg(long)]
    no_loop: bool,
    /// File that receives log output.
    #[arg(long, default_value = "talking-ghosties.log")]
    log_file: PathBuf,
}

impl Cli {
    /// Loads the configuration file, if any, and applies command line
    /// overrides on top.
    fn resolve_config(&self) -> talking_ghosties_core::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::default(),
        };

        if let Some(soundtrack) = &self.soundtrack {
            config.audio.soundtrack = soundtrack.clone();
        }
        if let Some(exponent) = self.exponent {
            config.audio.exponent = exponent;
        }
        if let Some(fps) = self.fps {
            config.window.target_fps = fps;
        }
        if self.no_loop {
            config.audio.looping = false;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_reproduce_defaults() {
        let cli = Cli::parse_from(["talking-ghosties"]);
        let config = cli.resolve_config().unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(cli.log_file, PathBuf::from("talking-ghosties.log"));
    }

    #[test]
    fn flags_override_configuration() {
        let cli = Cli::parse_from([
            "talking-ghosties",
            "--soundtrack",
            "song.ogg",
            "--exponent",
            "2.0",
            "--fps",
            "30",
            "--no-loop",
        ]);
        let config = cli.resolve_config().unwrap();

        assert_eq!(config.audio.soundtrack, PathBuf::from("song.ogg"));
        assert_eq!(config.audio.exponent, 2.0);
        assert_eq!(config.window.target_fps, 30);
        assert!(!config.audio.looping);
    }
}
