//! Mouse motion planning and pacing
//!
//! Generates smooth randomized movement paths (cubic Bézier curves) and
//! uniformly random pauses. Stateless: every call draws fresh randomness.

use std::time::Duration;

use rand::Rng;

/// Default jitter applied to the curve control points, in pixels per axis.
const CONTROL_JITTER: i32 = 50;

/// A point on a motion path
pub type Point = (i32, i32);

/// Generate a Bézier curve for smooth mouse movement.
///
/// Control points are placed at the 1/4 and 3/4 interpolation points of
/// the straight line, each offset by a uniform random amount per axis, so
/// no two paths between the same endpoints look alike.
pub fn bezier_curve(start: Point, end: Point, num_points: usize) -> Vec<Point> {
    bezier_curve_with_jitter(start, end, num_points, CONTROL_JITTER)
}

fn bezier_curve_with_jitter(start: Point, end: Point, num_points: usize, jitter: i32) -> Vec<Point> {
    match num_points {
        0 => return Vec::new(),
        1 => return vec![start],
        _ => {}
    }

    let mut rng = rand::thread_rng();
    let mut offset = |base: i32| {
        if jitter == 0 {
            base
        } else {
            base + rng.gen_range(-jitter..=jitter)
        }
    };

    let (dx, dy) = (end.0 - start.0, end.1 - start.1);
    let control1 = (
        offset(start.0 + dx.div_euclid(4)),
        offset(start.1 + dy.div_euclid(4)),
    );
    let control2 = (
        offset(start.0 + (3 * dx).div_euclid(4)),
        offset(start.1 + (3 * dy).div_euclid(4)),
    );

    let mut points = Vec::with_capacity(num_points);
    for i in 0..num_points {
        let t = i as f64 / (num_points - 1) as f64;
        let mt = 1.0 - t;

        // Cubic Bézier formula
        let x = mt.powi(3) * start.0 as f64
            + 3.0 * mt.powi(2) * t * control1.0 as f64
            + 3.0 * mt * t.powi(2) * control2.0 as f64
            + t.powi(3) * end.0 as f64;
        let y = mt.powi(3) * start.1 as f64
            + 3.0 * mt.powi(2) * t * control1.1 as f64
            + 3.0 * mt * t.powi(2) * control2.1 as f64
            + t.powi(3) * end.1 as f64;

        points.push((x.round() as i32, y.round() as i32));
    }

    points
}

/// Pause for a uniformly random duration in `[min_secs, max_secs]`.
///
/// Blocks the calling task for real wall-clock time; every delay in the
/// behavior simulator is built from this.
pub async fn random_delay(min_secs: f64, max_secs: f64) {
    let secs = {
        let mut rng = rand::thread_rng();
        rng.gen_range(min_secs..=max_secs)
    };
    tokio::time::sleep(Duration::from_secs_f64(secs)).await;
}

/// Uniform random integer delay in `[min_ms, max_ms]`, for per-event
/// driver delays (click hold, keystroke spacing).
pub fn jitter_ms(min_ms: u64, max_ms: u64) -> u64 {
    rand::thread_rng().gen_range(min_ms..=max_ms)
}
