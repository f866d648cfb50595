// tl-core/src/units.rs

use std::time::Duration;

use crate::error::{TlError, TlResult};
use uom::si::f64::{
    Ratio as UomRatio, ThermodynamicTemperature as UomThermodynamicTemperature, Time as UomTime,
};

// Public canonical unit types (SI, f64)
pub type Ratio = UomRatio;
pub type Temperature = UomThermodynamicTemperature;
pub type Time = UomTime;

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

#[inline]
pub fn degc(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::degree_celsius;
    Temperature::new::<degree_celsius>(v)
}

#[inline]
pub fn percent(v: f64) -> Ratio {
    use uom::si::ratio::percent;
    Ratio::new::<percent>(v)
}

#[inline]
pub fn as_seconds(t: Time) -> f64 {
    use uom::si::time::second;
    t.get::<second>()
}

#[inline]
pub fn as_degc(t: Temperature) -> f64 {
    use uom::si::thermodynamic_temperature::degree_celsius;
    t.get::<degree_celsius>()
}

#[inline]
pub fn as_percent(r: Ratio) -> f64 {
    use uom::si::ratio::percent;
    r.get::<percent>()
}

/// Convert a period to a sleepable duration.
///
/// Fails for negative, non-finite, or periods too long for [`Duration`].
pub fn to_duration(t: Time) -> TlResult<Duration> {
    let secs = as_seconds(t);
    if !secs.is_finite() {
        return Err(TlError::NonFinite {
            what: "period",
            value: secs,
        });
    }
    Duration::try_from_secs_f64(secs).map_err(|_| TlError::InvalidArg {
        what: "period must be non-negative and representable as a duration",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_smoke() {
        let _dt = s(0.5);
        let _t = degc(25.0);
        let _r = percent(50.0);
    }

    #[test]
    fn celsius_and_percent_round_trip() {
        assert!((as_degc(degc(70.0)) - 70.0).abs() < 1e-9);
        assert!((as_percent(percent(42.0)) - 42.0).abs() < 1e-9);
        assert!((percent(50.0).value - 0.5).abs() < 1e-12);
    }

    #[test]
    fn period_to_duration() {
        assert_eq!(to_duration(s(0.5)), Ok(Duration::from_millis(500)));
        assert_eq!(to_duration(s(0.0)), Ok(Duration::ZERO));
        assert!(matches!(
            to_duration(s(-1.0)),
            Err(TlError::InvalidArg { .. })
        ));
        assert!(matches!(
            to_duration(s(f64::NAN)),
            Err(TlError::NonFinite { .. })
        ));
    }

    #[test]
    fn oversized_period_is_an_error() {
        assert!(matches!(
            to_duration(s(1.0e20)),
            Err(TlError::InvalidArg { .. })
        ));
    }
}
