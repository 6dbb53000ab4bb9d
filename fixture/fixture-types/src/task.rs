//! Task phase, external commands and the per-cycle telemetry record.

use crate::FixtureError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Phase of the buzz-wire task.
///
/// The discriminants are the wire ordinals published in
/// [`TaskTelemetryRecord::task_state`] and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum TaskState {
    /// Waiting for the tool to settle at the start point.
    #[default]
    Idle = 0,
    /// Timed leg from the start point to the end point.
    ToEndPoint = 1,
    /// Timed leg back from the end point to the start point.
    ToStartPoint = 2,
    /// Both legs done; waiting for the tool to visit the idle point.
    RepetitionComplete = 3,
}

impl TaskState {
    /// Wire ordinal of this state.
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Whether this state is a timed leg (error and elapsed time reported).
    #[must_use]
    pub const fn is_timed(self) -> bool {
        matches!(self, Self::ToEndPoint | Self::ToStartPoint)
    }
}

impl TryFrom<u8> for TaskState {
    type Error = FixtureError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Idle),
            1 => Ok(Self::ToEndPoint),
            2 => Ok(Self::ToStartPoint),
            3 => Ok(Self::RepetitionComplete),
            other => Err(FixtureError::UnknownTaskState(other)),
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::ToEndPoint => "ToEndPoint",
            Self::ToStartPoint => "ToStartPoint",
            Self::RepetitionComplete => "RepetitionComplete",
        };
        f.write_str(name)
    }
}

/// External control triggers from the operator console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TaskCommand {
    /// Discard every repetition and wait for the idle point.
    Reset,
    /// Discard only the last repetition.
    RepeatLastAcquisition,
}

/// Outward record produced once per cycle for publish/log sinks.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TaskTelemetryRecord {
    /// Constant task name.
    pub task_name: String,
    /// Current phase.
    pub task_state: TaskState,
    /// Number of timed legs started so far.
    pub repetition_count: u32,
    /// Seconds since the current timed leg began; 0 outside timed legs.
    pub elapsed_seconds: f64,
    /// Primary tool position error; 0 outside timed legs.
    pub error_field_1: f64,
    /// Secondary tool position error; 0 outside timed legs or single-handed.
    pub error_field_2: f64,
}

impl TaskTelemetryRecord {
    /// Wire ordinal of [`Self::task_state`].
    #[must_use]
    pub fn state_ordinal(&self) -> u8 {
        self.task_state.ordinal()
    }
}

/// An RGB color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rgb {
    /// Red.
    pub r: f64,
    /// Green.
    pub g: f64,
    /// Blue.
    pub b: f64,
}

impl Rgb {
    /// Destination cue color while waiting.
    pub const GREEN: Self = Self::new(0.0, 0.9, 0.03);
    /// Destination cue color during timed legs.
    pub const DEEP_PINK: Self = Self::new(1.0, 0.08, 0.58);

    /// Create a color.
    #[must_use]
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Components as an array.
    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.r, self.g, self.b]
    }
}
