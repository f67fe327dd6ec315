//! Number formatting for coordinates.
//!
//! Peers expect integral coordinates without a fractional part (`0`, not
//! `0.0`), written out digit by digit below 1e21. Everything else is written
//! in shortest round-trip form. Negative zero keeps its sign as `-0.0`.

use serde::Serializer;

/// Integral values at or above this magnitude switch to exponent form.
const MAX_PLAIN_INTEGER: f64 = 1e21;

#[allow(clippy::trivially_copy_pass_by_ref, clippy::float_cmp)]
pub(crate) fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    let negative_zero = *value == 0.0 && value.is_sign_negative();
    if value.fract() == 0.0 && value.abs() < MAX_PLAIN_INTEGER && !negative_zero {
        #[allow(clippy::cast_possible_truncation)]
        return serializer.serialize_i128(*value as i128);
    }
    serializer.serialize_f64(*value)
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    #[derive(Serialize)]
    struct Wrap(#[serde(serialize_with = "super::serialize")] f64);

    fn render(v: f64) -> String {
        serde_json::to_string(&Wrap(v)).unwrap()
    }

    #[test]
    fn integral_values_have_no_fraction() {
        assert_eq!(render(0.0), "0");
        assert_eq!(render(-71.0), "-71");
        assert_eq!(render(180.0), "180");
    }

    #[test]
    fn fractional_values_round_trip() {
        assert_eq!(render(42.388_282), "42.388282");
        assert_eq!(render(-71.153_968), "-71.153968");
        assert_eq!(render(0.5), "0.5");
    }

    #[test]
    fn negative_zero_keeps_its_sign() {
        let text = render(-0.0);
        assert_eq!(text, "-0.0");
        assert!(text.parse::<f64>().unwrap().is_sign_negative());
    }

    #[test]
    fn large_integers_are_written_in_full() {
        assert_eq!(render(1e20), "100000000000000000000");
        assert_eq!(render(-9_007_199_254_740_992.0), "-9007199254740992");
    }

    #[test]
    fn huge_values_use_exponent_form() {
        assert_eq!(render(1e21), "1e21");
        let text = render(1e300);
        assert!(text.len() < 20, "{text}");
        assert_eq!(text.parse::<f64>().unwrap(), 1e300);
    }

    #[test]
    fn non_finite_values_become_null() {
        assert_eq!(render(f64::NAN), "null");
        assert_eq!(render(f64::INFINITY), "null");
    }
}
