use std::{path::PathBuf, time::Duration};

use carousel_core::{
    drive, AppConfig, Carousel, CarouselError, CarouselMode, Catalog, ContinuousCarousel,
    DiscreteCarousel, ManualScheduler, MotionRecorder, MotionSample, RenderList, StaticLayout,
};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Gap between slides in the image strip.
const SLIDE_GAP_PX: f32 = 12.0;

fn main() -> carousel_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate(args) => run_simulate(&args),
        Commands::Check { config, catalog } => run_check(config.as_ref(), catalog.as_ref()),
    }
}

fn run_simulate(args: &SimulateArgs) -> carousel_core::Result<()> {
    if !(args.sample_every.is_finite() && args.sample_every > 0.0) {
        return Err(CarouselError::InvalidInput(
            "--sample-every must be a positive number of seconds",
        ));
    }
    let config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    let catalog = match &args.catalog {
        Some(path) => Catalog::load(path)?,
        None => Catalog::portfolio(),
    };
    let mode = args.mode.map(CarouselMode::from).unwrap_or(config.mode);
    tracing::info!(?mode, seconds = args.seconds, "starting simulation");

    let (mut engine, slots) = match mode {
        CarouselMode::Continuous => {
            let render = RenderList::new(&catalog.projects, config.continuous.duplication)?;
            let engine = ContinuousCarousel::new(render.item_count(), config.continuous.clone())?;
            (Engine::Continuous(engine), render.len())
        }
        CarouselMode::Discrete => {
            let render = RenderList::new(&catalog.gallery, config.discrete.duplication)?;
            let engine = DiscreteCarousel::new(
                render.item_count(),
                config.discrete.clone(),
                config.viewport.breakpoints,
            )?;
            (Engine::Discrete(engine), render.len())
        }
    };

    let mut layout = StaticLayout::new(args.width, args.item_width, SLIDE_GAP_PX, slots);
    let mut sched = ManualScheduler::new(config.scheduler.frame_interval());
    let mut events = Script::from_args(args)?;
    let mut recorder = MotionRecorder::new();
    recorder.start();

    engine.carousel().mount(&mut sched, &layout)?;

    let step = secs(args.sample_every);
    let end = secs(args.seconds);
    let mut now = Duration::ZERO;
    while now < end {
        now = (now + step).min(end);

        while let Some(event) = events.next_before(now) {
            drive(engine.carousel(), &mut sched, &layout, event.at)?;
            apply(event.action, &mut engine, &mut sched, &mut layout)?;
        }
        drive(engine.carousel(), &mut sched, &layout, now)?;

        let sample = engine.sample(now);
        tracing::info!(
            at_secs = sample.at_secs,
            position_px = sample.position_px,
            index = sample.index,
            paused = sample.paused,
            "sample"
        );
        recorder.push(sample);

        if args.realtime {
            std::thread::sleep(step);
        }
    }

    engine.carousel().teardown(&mut sched);
    recorder.stop();
    tracing::info!(
        samples = recorder.samples().len(),
        max_step_px = recorder.max_step_px(),
        "simulation finished"
    );

    if let Some(path) = &args.trace {
        recorder.write_json(path)?;
        tracing::info!(?path, "motion trace written");
    }
    Ok(())
}

fn run_check(config: Option<&PathBuf>, catalog: Option<&PathBuf>) -> carousel_core::Result<()> {
    if let Some(path) = config {
        AppConfig::load(path)?;
        tracing::info!(?path, "configuration is valid");
    }
    if let Some(path) = catalog {
        let catalog = Catalog::load(path)?;
        tracing::info!(
            ?path,
            projects = catalog.projects.len(),
            images = catalog.gallery.len(),
            "catalog is valid"
        );
    }
    Ok(())
}

fn apply(
    action: Action,
    engine: &mut Engine,
    sched: &mut ManualScheduler,
    layout: &mut StaticLayout,
) -> carousel_core::Result<()> {
    match action {
        Action::Enter => engine.carousel().pointer_enter(sched),
        Action::Leave => engine.carousel().pointer_leave(sched),
        Action::Resize { width, item_width } => {
            layout.resize(width, item_width);
            engine.carousel().resize(sched, layout)?;
        }
    }
    Ok(())
}

fn secs(value: f64) -> Duration {
    Duration::from_secs_f64(value.max(0.0))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

enum Engine {
    Continuous(ContinuousCarousel),
    Discrete(DiscreteCarousel),
}

impl Engine {
    fn carousel(&mut self) -> &mut dyn Carousel {
        match self {
            Engine::Continuous(engine) => engine,
            Engine::Discrete(engine) => engine,
        }
    }

    fn sample(&self, at: Duration) -> MotionSample {
        match self {
            Engine::Continuous(engine) => MotionSample {
                at_secs: at.as_secs_f64(),
                position_px: engine.position_px(),
                index: None,
                paused: engine.is_paused(),
            },
            Engine::Discrete(engine) => MotionSample {
                at_secs: at.as_secs_f64(),
                position_px: engine.position_px(),
                index: Some(engine.current_index()),
                paused: engine.is_paused(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Action {
    Enter,
    Leave,
    Resize { width: f32, item_width: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Event {
    at: Duration,
    action: Action,
}

/// Pointer and resize events replayed during a simulation, in time order.
struct Script {
    events: Vec<Event>,
}

impl Script {
    fn from_args(args: &SimulateArgs) -> carousel_core::Result<Self> {
        let mut events = Vec::new();
        if let Some(at) = args.hover_at {
            events.push(Event {
                at: secs(at),
                action: Action::Enter,
            });
        }
        if let Some(at) = args.leave_at {
            if args.hover_at.map_or(true, |hover| at < hover) {
                return Err(CarouselError::msg("--leave-at requires an earlier --hover-at"));
            }
            events.push(Event {
                at: secs(at),
                action: Action::Leave,
            });
        }
        if let Some(at) = args.resize_at {
            let width = args
                .resize_width
                .ok_or_else(|| CarouselError::msg("--resize-at requires --resize-width"))?;
            events.push(Event {
                at: secs(at),
                action: Action::Resize {
                    width,
                    item_width: args.resize_item_width.unwrap_or(args.item_width),
                },
            });
        }
        events.sort_by_key(|event| event.at);
        events.reverse();
        Ok(Self { events })
    }

    fn next_before(&mut self, deadline: Duration) -> Option<Event> {
        match self.events.last() {
            Some(event) if event.at <= deadline => self.events.pop(),
            _ => None,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Infinite carousel engine harness", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a carousel on a virtual clock and report its motion.
    Simulate(SimulateArgs),
    /// Validate configuration and catalog files.
    Check {
        /// Engine configuration (JSON).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Carousel content (JSON).
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Pixel-rate project strip.
    Continuous,
    /// Slide-by-slide image strip.
    Discrete,
}

impl From<Mode> for CarouselMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Continuous => CarouselMode::Continuous,
            Mode::Discrete => CarouselMode::Discrete,
        }
    }
}

#[derive(clap::Args, Debug)]
struct SimulateArgs {
    /// Engine to run; defaults to the configured mode.
    #[arg(long, value_enum)]
    mode: Option<Mode>,
    /// Simulated duration in seconds.
    #[arg(long, default_value_t = 10.0)]
    seconds: f64,
    /// Interval between reported samples, in seconds.
    #[arg(long, default_value_t = 0.5)]
    sample_every: f64,
    /// Viewport width in pixels.
    #[arg(long, default_value_t = 1280.0)]
    width: f32,
    /// Rendered width of a single item in pixels.
    #[arg(long, default_value_t = 320.0)]
    item_width: f32,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Pointer enters the strip at this time.
    #[arg(long)]
    hover_at: Option<f64>,
    /// Pointer leaves the strip at this time.
    #[arg(long)]
    leave_at: Option<f64>,
    #[arg(long)]
    resize_at: Option<f64>,
    #[arg(long)]
    resize_width: Option<f32>,
    #[arg(long)]
    resize_item_width: Option<f32>,
    /// Write the recorded samples to this JSON file.
    #[arg(long)]
    trace: Option<PathBuf>,
    /// Sleep between samples so the simulation runs at wall-clock speed.
    #[arg(long)]
    realtime: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulate_args(extra: &[&str]) -> SimulateArgs {
        let mut argv = vec!["carousel-app", "simulate"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Simulate(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    fn drain(script: &mut Script, deadline: Duration) -> Vec<Event> {
        std::iter::from_fn(|| script.next_before(deadline)).collect()
    }

    #[test]
    fn events_replay_in_time_order() {
        let args = simulate_args(&[
            "--leave-at",
            "4",
            "--resize-at",
            "1",
            "--resize-width",
            "800",
            "--hover-at",
            "2",
        ]);
        let mut script = Script::from_args(&args).unwrap();

        assert!(drain(&mut script, secs(0.5)).is_empty());
        let actions: Vec<Action> = drain(&mut script, secs(4.0))
            .into_iter()
            .map(|event| event.action)
            .collect();
        assert_eq!(
            actions,
            vec![
                Action::Resize {
                    width: 800.0,
                    item_width: 320.0,
                },
                Action::Enter,
                Action::Leave,
            ]
        );
        assert!(drain(&mut script, secs(60.0)).is_empty());
    }

    #[test]
    fn events_wait_for_their_deadline() {
        let args = simulate_args(&["--hover-at", "2", "--leave-at", "3"]);
        let mut script = Script::from_args(&args).unwrap();

        let first = script.next_before(secs(2.0)).unwrap();
        assert_eq!(first.at, secs(2.0));
        assert_eq!(first.action, Action::Enter);
        assert_eq!(script.next_before(secs(2.5)), None);
    }

    #[test]
    fn leave_needs_an_earlier_hover() {
        let alone = simulate_args(&["--leave-at", "3"]);
        assert!(Script::from_args(&alone).is_err());

        let reversed = simulate_args(&["--hover-at", "5", "--leave-at", "2"]);
        assert!(Script::from_args(&reversed).is_err());
    }

    #[test]
    fn resize_needs_a_width() {
        let args = simulate_args(&["--resize-at", "2"]);
        assert!(Script::from_args(&args).is_err());

        let args = simulate_args(&[
            "--item-width",
            "280",
            "--resize-at",
            "2",
            "--resize-width",
            "700",
            "--resize-item-width",
            "200",
        ]);
        let mut script = Script::from_args(&args).unwrap();
        let event = script.next_before(secs(2.0)).unwrap();
        assert_eq!(
            event.action,
            Action::Resize {
                width: 700.0,
                item_width: 200.0,
            }
        );
    }

    #[test]
    fn rejects_non_positive_sample_interval() {
        let args = simulate_args(&["--sample-every", "0", "--seconds", "1"]);
        assert!(matches!(run_simulate(&args), Err(CarouselError::InvalidInput(_))));
    }
}
