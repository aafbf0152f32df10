//! Core library for seamless infinite carousels.
//!
//! The crate animates a horizontally laid-out list of items so that it looks
//! like an endless strip. Two engines are provided: a continuous pixel-rate
//! strip ([`ContinuousCarousel`]) and a slide-by-slide strip
//! ([`DiscreteCarousel`]). Both are pure state machines driven through an
//! injectable [`Scheduler`] and a read-only [`Layout`], so hosts decide how
//! frames and timers are produced and tests run on a virtual clock.

pub mod carousel;
pub mod catalog;
pub mod config;
pub mod continuous;
pub mod discrete;
pub mod easing;
pub mod error;
pub mod layout;
pub mod record;
pub mod render;
pub mod timeline;
pub mod viewport;

pub use carousel::{drive, Carousel, CarouselMode};
pub use catalog::{Catalog, Media, Project};
pub use config::{
    AppConfig, Breakpoints, ContinuousConfig, DiscreteConfig, GapPolicy, RetryPolicy,
    SchedulerConfig, ViewportConfig,
};
pub use continuous::{position_at, ContinuousCarousel, Phase};
pub use discrete::{DiscreteCarousel, DiscreteState};
pub use easing::{Easing, Tween};
pub use error::{CarouselError, Result};
pub use layout::{remeasure, Geometry, Layout, SlideMeasure, StaticLayout};
pub use record::{MotionRecorder, MotionSample};
pub use render::{build_render_list, RenderList};
pub use timeline::{Fired, ManualScheduler, Scheduler, TaskHandle, TaskKind};
