use std::f64::consts::PI;

/// Geometry of an egg-shaped section: a small invert arc (`radius1`), two side
/// arcs (`radius3`) whose centres sit `offset` either side of the axis, and a
/// crown arc (`radius2`).
///
/// `height1` is where the invert arc meets the side arcs and `height2` the
/// springing line of the crown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WettedAreaParameters {
    pub height: f64,
    pub radius1: f64,
    pub radius2: f64,
    pub radius3: f64,
    pub offset: f64,
    pub height1: f64,
    pub height2: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WettedSection {
    pub area: f64,
    pub perimeter: f64,
}

impl WettedAreaParameters {
    /// Derives the transition heights from the shape radii.
    pub fn new(height: f64, radius1: f64, radius2: f64, radius3: f64, offset: f64) -> Self {
        let height2 = height - radius2;
        let height1 = height2 - radius3 * ((height2 - radius1) / offset).atan().sin();
        WettedAreaParameters {
            height,
            radius1,
            radius2,
            radius3,
            offset,
            height1,
            height2,
        }
    }

    pub fn area(&self, depth: f64) -> f64 {
        self.wetted_section(depth).area
    }

    pub fn wetted_section(&self, depth_of_water: f64) -> WettedSection {
        let Self {
            height,
            radius1,
            radius2,
            radius3,
            offset,
            height1: h1,
            height2: h2,
        } = *self;

        if depth_of_water <= 0.0 {
            return WettedSection {
                area: 0.0,
                perimeter: 0.0,
            };
        }
        // The crown formula is singular at the soffit.
        let depth_of_water = depth_of_water.min(height * 0.9999);

        let psi = ((h2 - radius1) / offset).atan();
        let side_sector = 0.25 * radius3.powi(2) * (2.0 * psi - (2.0 * psi).sin());
        let inner_rect = (radius1.powi(2) - (radius1 - h1).powi(2)).sqrt();
        let invert_angle = 2.0 * ((radius1 - h1) / radius1).acos();
        let invert_area = 0.5 * (invert_angle - invert_angle.sin()) * radius1.powi(2);
        let invert_perimeter = 2.0 * radius1 * ((radius1 - h1) / radius1).acos();

        if depth_of_water <= h1 {
            let theta = 2.0 * ((radius1 - depth_of_water) / radius1).acos();
            WettedSection {
                area: 0.5 * (theta - theta.sin()) * radius1.powi(2),
                perimeter: 2.0 * radius1 * ((radius1 - depth_of_water) / radius1).acos(),
            }
        } else if depth_of_water <= h2 {
            let z = h2 - depth_of_water;
            let phi = (z / radius3).asin();
            let dry_sector = 0.25 * radius3.powi(2) * (2.0 * phi - (2.0 * phi).sin());
            let x1 = (radius3.powi(2) - z.powi(2)).sqrt();
            let strip = (depth_of_water - h1) * inner_rect;
            let dry_rect = (x1 - offset - inner_rect) * z;
            let side = side_sector - dry_sector - dry_rect;
            WettedSection {
                area: invert_area + 2.0 * (side + strip),
                perimeter: invert_perimeter + radius3 * (psi - phi) * 2.0,
            }
        } else {
            let strip = (depth_of_water - h1) * inner_rect;
            let sides = 2.0 * (side_sector + strip);
            let half_crown = PI * radius2.powi(2) / 2.0;
            let z = radius2 * 2.0 - (depth_of_water - h2 + radius2);
            let gamma = 2.0 * ((radius2 - z) / radius2).acos();
            let wetted_crown =
                PI * radius2.powi(2) - radius2.powi(2) * (gamma - gamma.sin()) / 2.0 - half_crown;
            WettedSection {
                area: invert_area + sides + wetted_crown,
                perimeter: invert_perimeter + radius3 * psi * 2.0 + PI * radius2 - radius2 * gamma,
            }
        }
    }
}
