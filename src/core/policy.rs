//! Scaling policy catalog.
//!
//! Every environment gets the same twelve webhook policies. Scaling an
//! environment later means executing one of them by name.

use serde::Serialize;

/// How a policy changes the group's desired capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Adjustment {
    /// Add (or remove, if negative) this many servers
    Change(i64),
    /// Grow or shrink by this percentage of current capacity
    ChangePercent(i64),
    /// Set the desired capacity outright
    DesiredCapacity(u32),
}

/// A catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScalingPolicy {
    pub name: &'static str,
    pub adjustment: Adjustment,
}

impl ScalingPolicy {
    const fn new(name: &'static str, adjustment: Adjustment) -> Self {
        Self { name, adjustment }
    }

    /// Name of the single webhook attached to this policy.
    pub fn webhook_name(&self) -> String {
        format!("{} webhook", self.name)
    }
}

/// The fixed policy catalog, in creation order.
pub const CATALOG: [ScalingPolicy; 12] = [
    ScalingPolicy::new("Up by 1", Adjustment::Change(1)),
    ScalingPolicy::new("Up by 50%", Adjustment::ChangePercent(50)),
    ScalingPolicy::new("Up by 100%", Adjustment::ChangePercent(100)),
    ScalingPolicy::new("Up by 200%", Adjustment::ChangePercent(200)),
    ScalingPolicy::new("Down by 1", Adjustment::Change(-1)),
    ScalingPolicy::new("Down by 50%", Adjustment::ChangePercent(-50)),
    ScalingPolicy::new("Set to 0", Adjustment::DesiredCapacity(0)),
    ScalingPolicy::new("Set to 1", Adjustment::DesiredCapacity(1)),
    ScalingPolicy::new("Set to 2", Adjustment::DesiredCapacity(2)),
    ScalingPolicy::new("Set to 4", Adjustment::DesiredCapacity(4)),
    ScalingPolicy::new("Set to 6", Adjustment::DesiredCapacity(6)),
    ScalingPolicy::new("Set to 8", Adjustment::DesiredCapacity(8)),
];

/// Look up a catalog entry by exact name.
pub fn find(name: &str) -> Option<&'static ScalingPolicy> {
    CATALOG.iter().find(|p| p.name == name)
}

impl Adjustment {
    /// Desired capacity after applying this adjustment to `current`,
    /// clamped to `[min, max]`.
    ///
    /// Percentage changes round away from zero so that any non-zero
    /// percentage moves capacity by at least one server.
    pub fn apply(&self, current: u32, min: u32, max: u32) -> u32 {
        let next = match *self {
            Adjustment::Change(delta) => i64::from(current) + delta,
            Adjustment::ChangePercent(pct) => {
                let raw = i64::from(current) * pct;
                let delta = if raw >= 0 { (raw + 99) / 100 } else { (raw - 99) / 100 };
                i64::from(current) + delta
            }
            Adjustment::DesiredCapacity(n) => i64::from(n),
        };
        next.clamp(i64::from(min), i64::from(max)) as u32
    }
}
