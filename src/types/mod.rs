//! Value types for light control parameters.
//!
//! Each type stores the bridge's integer representation and converts to and
//! from a normalized `0.0..=1.0` float.

mod alert;
mod brightness;
mod color_temperature;
mod hue;
mod saturation;
mod transition;

pub use alert::{Alert, Effect};
pub use brightness::Brightness;
pub use color_temperature::ColorTemperature;
pub use hue::Hue;
pub use saturation::Saturation;
pub use transition::TransitionTime;

/// Clamps to `0.0..=1.0`; NaN becomes `0.0`.
pub(crate) fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clamp_unit() {
        assert_eq!(clamp_unit(f32::NAN), 0.0);
        assert_eq!(clamp_unit(-0.5), 0.0);
        assert_eq!(clamp_unit(1.5), 1.0);
        assert_eq!(clamp_unit(0.25), 0.25);
    }

    #[test]
    fn test_raw_round_trip() {
        for raw in [1u8, 100, 254] {
            assert_eq!(Brightness::from_raw(raw).value(), raw);
        }
        assert_eq!(Saturation::from_raw(255).value(), 254);
        assert_eq!(ColorTemperature::from_raw(100).mired(), 153);
    }

    #[test]
    fn test_normalized() {
        assert_eq!(Brightness::new().normalized(), 1.0);
        assert_eq!(Saturation::from_raw(0).normalized(), 0.0);
        assert_eq!(ColorTemperature::from_normalized(0.0).mired(), 153);
        assert_eq!(ColorTemperature::from_normalized(1.0).mired(), 500);
        assert_eq!(Hue::from_degrees(360.0).value(), 0);
    }

    #[test]
    fn test_deserialize_clamps_out_of_range() {
        let ct: ColorTemperature = serde_json::from_value(json!(0)).unwrap();
        assert_eq!(ct.mired(), 153);
        assert_eq!(ct.kelvin(), 6535);
        let ct: ColorTemperature = serde_json::from_value(json!(900)).unwrap();
        assert_eq!(ct.mired(), 500);

        let bri: Brightness = serde_json::from_value(json!(0)).unwrap();
        assert_eq!(bri.value(), 1);
        let sat: Saturation = serde_json::from_value(json!(255)).unwrap();
        assert_eq!(sat.value(), 254);
        let hue: Hue = serde_json::from_value(json!(65535)).unwrap();
        assert_eq!(hue, Hue::from_raw(65535));

        assert!(serde_json::from_value::<Brightness>(json!(300)).is_err());
        assert_eq!(serde_json::to_value(bri).unwrap(), json!(1));
        assert_eq!(serde_json::to_value(ct).unwrap(), json!(500));
    }

    #[test]
    fn test_kelvin_never_divides_by_zero() {
        let ct = ColorTemperature { mired: 0 };
        assert_eq!(ct.kelvin(), 6535);
    }
}
