use std::f64::consts::PI;

/// Area of the circular segment cut off by a chord lying `offset` from the centre.
///
/// The chord splits the circle into a minor segment (returned here) and the
/// remainder. At `offset == 0` the angle formula divides by zero, so the chord
/// through the centre returns half the circle exactly.
pub fn segment_area_at_offset(radius: f64, offset: f64) -> f64 {
    let radius_squared = radius.powi(2);
    if offset == 0.0 {
        return PI * radius_squared / 2.0;
    }
    let chord_half = (radius_squared - offset.powi(2)).sqrt();
    let interior_angle = 2.0 * (chord_half / offset).atan();
    radius_squared * (interior_angle - interior_angle.sin()) / 2.0
}

/// Area of the circular segment of height `height` measured in from the rim.
///
/// Valid for `0 < height <= radius`; `height == radius` is the half circle.
pub fn segment_area(radius: f64, height: f64) -> f64 {
    segment_area_at_offset(radius, radius - height)
}
