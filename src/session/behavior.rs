//! Human behavior simulation
//!
//! Drives a page driver through randomized move / click / scroll / type
//! sequences with human-like pacing. Everything here is sequential and
//! blocking on purpose: the delays model a real person at a real machine,
//! so primitives must never be parallelized or skipped.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::debug;

use crate::driver::{DriverError, Page};
use crate::motion;

/// A behavior primitive failed mid-sequence.
#[derive(Error, Debug)]
#[error("{primitive} simulation failed: {source}")]
pub struct SimulationError {
    /// Which primitive was executing when the driver call failed
    pub primitive: &'static str,
    #[source]
    pub source: DriverError,
}

impl SimulationError {
    fn wrap(primitive: &'static str) -> impl FnOnce(DriverError) -> Self {
        move |source| Self { primitive, source }
    }
}

/// Scroll direction for [`HumanBehavior::scroll`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    fn multiplier(self) -> i32 {
        match self {
            Self::Up => -1,
            Self::Down => 1,
        }
    }

    fn random(rng: &mut impl Rng) -> Self {
        if rng.gen_bool(0.5) {
            Self::Up
        } else {
            Self::Down
        }
    }
}

/// One step of the natural-behavior state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BehaviorAction {
    Move,
    Click,
    Scroll,
    Pause,
}

impl BehaviorAction {
    fn random(rng: &mut impl Rng) -> Self {
        match rng.gen_range(0..4) {
            0 => Self::Move,
            1 => Self::Click,
            2 => Self::Scroll,
            _ => Self::Pause,
        }
    }
}

/// Margin kept from the viewport edges when picking random points
const POINT_MARGIN: i32 = 50;

/// Randomized human-like page interactions
pub struct HumanBehavior;

impl HumanBehavior {
    /// Pick a uniform random point inside the viewport, keeping `margin`
    /// pixels away from every edge.
    pub fn random_point(page: &dyn Page, margin: i32) -> (i32, i32) {
        let viewport = page.viewport();
        let mut rng = rand::thread_rng();

        let max_x = (viewport.width as i32 - margin).max(margin);
        let max_y = (viewport.height as i32 - margin).max(margin);
        (rng.gen_range(margin..=max_x), rng.gen_range(margin..=max_y))
    }

    /// Simulate a human-like mouse click.
    ///
    /// Missing coordinates are resolved to a random in-viewport point.
    pub async fn click(
        page: &mut dyn Page,
        at: Option<(i32, i32)>,
    ) -> Result<(), SimulationError> {
        let (x, y) = at.unwrap_or_else(|| Self::random_point(page, POINT_MARGIN));

        motion::random_delay(0.1, 0.3).await;
        page.mouse_click(x, y, motion::jitter_ms(100, 300))
            .await
            .map_err(SimulationError::wrap("click"))?;
        motion::random_delay(0.1, 0.3).await;

        Ok(())
    }

    /// Simulate human-like scrolling, broken into unevenly-sized chunks.
    pub async fn scroll(
        page: &mut dyn Page,
        direction: ScrollDirection,
        amount: Option<i32>,
    ) -> Result<(), SimulationError> {
        let mut rng = StdRng::from_entropy();

        let amount = amount.unwrap_or_else(|| rng.gen_range(100..=500));
        let multiplier = direction.multiplier();
        let chunks = rng.gen_range(3..=7);
        let chunk_size = amount / chunks;

        for _ in 0..chunks {
            motion::random_delay(0.1, 0.5).await;

            let variation = rng.gen_range(-20..=20);
            page.mouse_wheel(0, (chunk_size + variation) * multiplier)
                .await
                .map_err(SimulationError::wrap("scroll"))?;
        }

        Ok(())
    }

    /// Simulate human-like typing, one keystroke at a time.
    pub async fn type_text(
        page: &mut dyn Page,
        text: &str,
        min_delay: f64,
        max_delay: f64,
    ) -> Result<(), SimulationError> {
        let mut rng = StdRng::from_entropy();

        for ch in text.chars() {
            motion::random_delay(min_delay, max_delay).await;

            page.keyboard_type(ch, motion::jitter_ms(100, 300))
                .await
                .map_err(SimulationError::wrap("type"))?;

            // Occasional longer pause, like stopping to think
            if rng.gen_bool(0.1) {
                motion::random_delay(0.5, 1.5).await;
            }
        }

        Ok(())
    }

    /// Move the mouse along a curved path to a random point, then linger.
    pub async fn random_movement(page: &mut dyn Page) -> Result<(), SimulationError> {
        let start = Self::random_point(page, POINT_MARGIN);
        let target = Self::random_point(page, POINT_MARGIN);

        for (x, y) in motion::bezier_curve(start, target, 20) {
            page.mouse_move(x, y)
                .await
                .map_err(SimulationError::wrap("move"))?;
            tokio::time::sleep(Duration::from_millis(motion::jitter_ms(5, 20))).await;
        }

        motion::random_delay(0.5, 2.0).await;
        Ok(())
    }

    /// Run the natural-behavior loop until `duration` has elapsed.
    ///
    /// Picks uniformly among move / click / scroll / pause and executes
    /// the primitive; the deadline is only checked between actions, so
    /// the last action always runs to completion.
    pub async fn natural_behavior(
        page: &mut dyn Page,
        duration: Duration,
    ) -> Result<(), SimulationError> {
        let mut rng = StdRng::from_entropy();
        let deadline = tokio::time::Instant::now() + duration;

        while tokio::time::Instant::now() < deadline {
            let action = BehaviorAction::random(&mut rng);
            debug!("Natural behavior action: {:?}", action);

            match action {
                BehaviorAction::Move => Self::random_movement(page).await?,
                BehaviorAction::Click => Self::click(page, None).await?,
                BehaviorAction::Scroll => {
                    let direction = ScrollDirection::random(&mut rng);
                    Self::scroll(page, direction, None).await?;
                }
                BehaviorAction::Pause => motion::random_delay(0.5, 2.0).await,
            }
        }

        Ok(())
    }

    /// Short bounded warm-up run after navigation: a scroll, a wander,
    /// and sometimes a click.
    pub async fn warm_up(page: &mut dyn Page) -> Result<(), SimulationError> {
        let (direction, amount, extra_click) = {
            let mut rng = rand::thread_rng();
            (
                ScrollDirection::random(&mut rng),
                rng.gen_range(300..=1000),
                rng.gen_bool(0.3),
            )
        };

        Self::scroll(page, direction, Some(amount)).await?;
        Self::random_movement(page).await?;

        if extra_click {
            Self::click(page, None).await?;
        }

        Ok(())
    }
}
