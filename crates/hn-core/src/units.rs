// hn-core/src/units.rs

use uom::si::f64::{MassRate as UomMassRate, Pressure as UomPressure};

// Public canonical unit types (SI, f64)
pub type MassRate = UomMassRate;
pub type Pressure = UomPressure;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn kgps(v: f64) -> MassRate {
    use uom::si::mass_rate::kilogram_per_second;
    MassRate::new::<kilogram_per_second>(v)
}
