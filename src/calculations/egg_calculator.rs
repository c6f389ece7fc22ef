use super::calculator::{flow_from_area, Calculator};
use super::wetted_area::WettedAreaParameters;

/// Shared flow computation for the egg-shaped sections, which differ only in
/// how their radii are derived.
pub trait EggCalculator: Calculator {
    fn wetted_area_parameters(&self) -> &WettedAreaParameters;

    fn perform_egg_calculation(&self, depth: f64, velocity: f64) -> f64 {
        flow_from_area(self.wetted_area_parameters().area(depth), velocity)
    }
}
