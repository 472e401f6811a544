//! Quality tiers: simulation fidelity and the geometry ladder they select.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum QualityTier {
    Low,
    #[default]
    Medium,
    High,
}

/// Physics and lighting parameters for one tier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TierSettings {
    pub timestep_hz: f32,
    pub gravity: f32,
    pub solver_iterations: usize,
    pub shadows: bool,
}

impl TierSettings {
    pub fn timestep(&self) -> f32 {
        1.0 / self.timestep_hz
    }
}

const LOW_FPS: f64 = 20.0;
const HIGH_FPS: f64 = 45.0;

impl QualityTier {
    pub const ALL: [QualityTier; 3] = [QualityTier::Low, QualityTier::Medium, QualityTier::High];

    pub fn settings(self) -> TierSettings {
        match self {
            QualityTier::Low => TierSettings {
                timestep_hz: 30.0,
                gravity: -20.0,
                solver_iterations: 1,
                shadows: false,
            },
            QualityTier::Medium | QualityTier::High => TierSettings {
                timestep_hz: 60.0,
                gravity: -90.0,
                solver_iterations: 6,
                shadows: true,
            },
        }
    }

    /// Next tier up, wrapping from high back to low.
    pub fn cycle(self) -> Self {
        match self {
            QualityTier::Low => QualityTier::Medium,
            QualityTier::Medium => QualityTier::High,
            QualityTier::High => QualityTier::Low,
        }
    }

    /// Next tier down, saturating at low.
    pub fn lower(self) -> Self {
        match self {
            QualityTier::High => QualityTier::Medium,
            QualityTier::Medium | QualityTier::Low => QualityTier::Low,
        }
    }

    /// Tier to use after a benchmark measured `fps` at this tier.
    pub fn from_benchmark(self, fps: f64) -> Self {
        if fps < LOW_FPS {
            self.lower()
        } else if fps > HIGH_FPS {
            self.cycle()
        } else {
            self
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            QualityTier::Low => "low",
            QualityTier::Medium => "medium",
            QualityTier::High => "high",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown quality tier {0:?} (expected low, medium or high)")]
pub struct ParseQualityError(pub String);

impl FromStr for QualityTier {
    type Err = ParseQualityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "lo" => Ok(QualityTier::Low),
            "medium" | "mid" => Ok(QualityTier::Medium),
            "high" | "hi" => Ok(QualityTier::High),
            _ => Err(ParseQualityError(s.to_string())),
        }
    }
}

/// Sphere tessellation levels shared by every transaction proxy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SphereDetail {
    S12,
    S16,
    S20,
    S24,
    S32,
    S48,
}

impl SphereDetail {
    pub const ALL: [SphereDetail; 6] = [
        SphereDetail::S12,
        SphereDetail::S16,
        SphereDetail::S20,
        SphereDetail::S24,
        SphereDetail::S32,
        SphereDetail::S48,
    ];

    /// `(sectors, stacks)` for a UV sphere.
    pub fn segments(self) -> (u32, u32) {
        match self {
            SphereDetail::S12 => (12, 6),
            SphereDetail::S16 => (16, 8),
            SphereDetail::S20 => (20, 10),
            SphereDetail::S24 => (24, 12),
            SphereDetail::S32 => (32, 16),
            SphereDetail::S48 => (48, 24),
        }
    }

    pub fn for_transaction(magnitude: f64, tier: QualityTier) -> Self {
        let low = tier == QualityTier::Low;
        let (coarse, fine) = if magnitude < 1.0 {
            (SphereDetail::S12, SphereDetail::S20)
        } else if magnitude < 10.0 {
            (SphereDetail::S12, SphereDetail::S24)
        } else if magnitude < 100.0 {
            (SphereDetail::S16, SphereDetail::S24)
        } else if magnitude < 1000.0 {
            (SphereDetail::S16, SphereDetail::S32)
        } else {
            (SphereDetail::S24, SphereDetail::S48)
        };
        if low {
            coarse
        } else {
            fine
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_tier_is_always_coarser() {
        for magnitude in [0.5, 5.0, 50.0, 500.0, 5_000.0] {
            let (low, _) = SphereDetail::for_transaction(magnitude, QualityTier::Low).segments();
            let (mid, _) =
                SphereDetail::for_transaction(magnitude, QualityTier::Medium).segments();
            let (high, _) = SphereDetail::for_transaction(magnitude, QualityTier::High).segments();
            assert!(low < mid, "bucket {magnitude}: {low} !< {mid}");
            assert_eq!(mid, high);
        }
    }

    #[test]
    fn bucket_edges() {
        use SphereDetail::*;
        let fine = |m| SphereDetail::for_transaction(m, QualityTier::High);
        assert_eq!(fine(0.999), S20);
        assert_eq!(fine(1.0), S24);
        assert_eq!(fine(99.9), S24);
        assert_eq!(fine(100.0), S32);
        assert_eq!(fine(1000.0), S48);
    }

    #[test]
    fn cycle_wraps_and_lower_saturates() {
        assert_eq!(QualityTier::High.cycle(), QualityTier::Low);
        assert_eq!(QualityTier::Low.lower(), QualityTier::Low);
    }

    #[test]
    fn benchmark_moves_one_step() {
        assert_eq!(QualityTier::Medium.from_benchmark(12.0), QualityTier::Low);
        assert_eq!(QualityTier::Medium.from_benchmark(30.0), QualityTier::Medium);
        assert_eq!(QualityTier::Medium.from_benchmark(58.0), QualityTier::High);
    }

    #[test]
    fn parses_names_and_rejects_garbage() {
        assert_eq!("HIGH".parse::<QualityTier>(), Ok(QualityTier::High));
        assert_eq!(" mid ".parse::<QualityTier>(), Ok(QualityTier::Medium));
        assert!("ultra".parse::<QualityTier>().is_err());
    }
}
