//! Synthetic wire and a scripted trainee following it.

use std::time::Duration;

use anyhow::Result;
use fixture_core::{PoseSource, ToolPoses};
use fixture_types::{Pose, TaskConfig, ToolRole, Waypoints};
use guide_query::PolylineGuide;
use nalgebra::{Point3, Vector3};

/// Samples used to discretize the wire.
const WIRE_SAMPLES: usize = 64;

/// How far the wire bows away from the straight start-end line.
const WIRE_BOW: f64 = 0.006;

/// Amplitude of the trainee's wobble around the wire.
const WOBBLE: f64 = 0.0015;

/// Unit vector perpendicular to the start-end line, in the horizontal plane
/// where possible.
fn bow_direction(waypoints: &Waypoints) -> Vector3<f64> {
    let along = waypoints.end - waypoints.start;
    along
        .cross(&Vector3::z())
        .try_normalize(1e-12)
        .unwrap_or_else(Vector3::x)
}

/// Wire point at parameter `t ∈ [0, 1]`.
fn wire_point(waypoints: &Waypoints, t: f64) -> Point3<f64> {
    let bow = bow_direction(waypoints) * (WIRE_BOW * (std::f64::consts::PI * t).sin());
    waypoints.start + (waypoints.end - waypoints.start) * t + bow
}

/// Build a bowed wire from the start to the end waypoint.
pub fn synthetic_wire(waypoints: &Waypoints) -> Result<PolylineGuide> {
    Ok(PolylineGuide::from_fn(WIRE_SAMPLES, |t| {
        wire_point(waypoints, t)
    })?)
}

#[derive(Debug, Clone, Copy)]
enum Leg {
    Approach,
    HoldStart,
    Outbound,
    HoldEnd,
    Return,
    ToIdle,
}

/// Seconds spent on each leg of one repetition.
const SCRIPT: [(Leg, f64); 6] = [
    (Leg::Approach, 1.0),
    (Leg::HoldStart, 0.5),
    (Leg::Outbound, 4.0),
    (Leg::HoldEnd, 0.3),
    (Leg::Return, 4.0),
    (Leg::ToIdle, 1.0),
];

/// Trainee that runs the buzz-wire script a fixed number of times.
#[derive(Debug, Clone)]
pub struct ScriptedTrainee {
    waypoints: Waypoints,
    ring_radius: f64,
    bimanual: bool,
    spacing: f64,
    repetitions: u32,
}

impl ScriptedTrainee {
    /// Trainee for `config`, running `repetitions` full repetitions.
    pub fn new(config: &TaskConfig, repetitions: u32) -> Self {
        Self {
            waypoints: config.waypoints,
            ring_radius: config.ring_radius,
            bimanual: config.bimanual,
            spacing: config.ideal_ring_distance,
            repetitions,
        }
    }

    /// Length of one repetition.
    pub fn period() -> f64 {
        SCRIPT.iter().map(|(_, secs)| secs).sum()
    }

    /// Primary ring center at `secs` into a repetition.
    fn ring_center(&self, secs: f64) -> Point3<f64> {
        let Waypoints { idle, start, end } = self.waypoints;
        let mut remaining = secs;
        for (leg, duration) in SCRIPT {
            if remaining > duration {
                remaining -= duration;
                continue;
            }
            let s = (remaining / duration).clamp(0.0, 1.0);
            let wobble = bow_direction(&self.waypoints)
                * (WOBBLE * (6.0 * std::f64::consts::TAU * s).sin());
            return match leg {
                Leg::Approach => idle + (start - idle) * s,
                Leg::HoldStart => start,
                Leg::Outbound => wire_point(&self.waypoints, s) + wobble,
                Leg::HoldEnd => end,
                Leg::Return => wire_point(&self.waypoints, 1.0 - s) + wobble,
                Leg::ToIdle => start + (idle - start) * s,
            };
        }
        idle
    }

    fn pose_for(&self, center: Point3<f64>, role: ToolRole) -> Pose {
        Pose::from_position(center - role.convention().ring_center_offset(self.ring_radius))
    }
}

impl PoseSource for ScriptedTrainee {
    fn next_poses(&mut self, now: Duration) -> Option<ToolPoses> {
        let period = Self::period();
        let elapsed = now.as_secs_f64();
        if elapsed >= period * f64::from(self.repetitions) {
            return None;
        }

        let center = self.ring_center(elapsed % period);
        let primary = self.pose_for(center, ToolRole::Primary);
        if self.bimanual {
            let partner = center + Vector3::new(0.0, 0.0, self.spacing);
            Some(ToolPoses::bimanual(
                primary,
                self.pose_for(partner, ToolRole::Secondary),
            ))
        } else {
            Some(ToolPoses::single(primary))
        }
    }
}
