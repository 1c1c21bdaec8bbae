//! Maneuver tags to display indicators.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManeuverIcon {
    Straight,
    TurnLeft,
    TurnRight,
    SlightLeft,
    SlightRight,
    SharpLeft,
    SharpRight,
    UTurnLeft,
    UTurnRight,
    RampLeft,
    RampRight,
    Merge,
    ForkLeft,
    ForkRight,
    KeepLeft,
    KeepRight,
    RoundaboutLeft,
    RoundaboutRight,
    Ferry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ManeuverIndicator {
    pub icon: ManeuverIcon,
    pub label: &'static str,
}

const DEFAULT_INDICATOR: ManeuverIndicator = ManeuverIndicator {
    icon: ManeuverIcon::Straight,
    label: "Continue straight",
};

/// Looks up the indicator for a directions maneuver tag.
///
/// Unknown or missing tags fall back to "continue straight".
pub fn classify_maneuver(maneuver: Option<&str>) -> ManeuverIndicator {
    let Some(tag) = maneuver else {
        return DEFAULT_INDICATOR;
    };

    let (icon, label) = match tag {
        "turn-left" => (ManeuverIcon::TurnLeft, "Turn left"),
        "turn-right" => (ManeuverIcon::TurnRight, "Turn right"),
        "turn-slight-left" => (ManeuverIcon::SlightLeft, "Slight left"),
        "turn-slight-right" => (ManeuverIcon::SlightRight, "Slight right"),
        "turn-sharp-left" => (ManeuverIcon::SharpLeft, "Sharp left"),
        "turn-sharp-right" => (ManeuverIcon::SharpRight, "Sharp right"),
        "uturn-left" => (ManeuverIcon::UTurnLeft, "Make a U-turn"),
        "uturn-right" => (ManeuverIcon::UTurnRight, "Make a U-turn"),
        "straight" => (ManeuverIcon::Straight, "Continue straight"),
        "ramp-left" => (ManeuverIcon::RampLeft, "Take the ramp on the left"),
        "ramp-right" => (ManeuverIcon::RampRight, "Take the ramp on the right"),
        "merge" => (ManeuverIcon::Merge, "Merge"),
        "fork-left" => (ManeuverIcon::ForkLeft, "Keep left at the fork"),
        "fork-right" => (ManeuverIcon::ForkRight, "Keep right at the fork"),
        "keep-left" => (ManeuverIcon::KeepLeft, "Keep left"),
        "keep-right" => (ManeuverIcon::KeepRight, "Keep right"),
        "roundabout-left" => (ManeuverIcon::RoundaboutLeft, "Enter the roundabout"),
        "roundabout-right" => (ManeuverIcon::RoundaboutRight, "Enter the roundabout"),
        "ferry" => (ManeuverIcon::Ferry, "Take the ferry"),
        _ => return DEFAULT_INDICATOR,
    };

    ManeuverIndicator { icon, label }
}
