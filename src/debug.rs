use num_complex::Complex64;
use pretty_dtoa::{dtoa, FmtFloatConfig};
use std::collections::BTreeMap;
use std::fmt::Display;

const FLOAT_CONFIG: FmtFloatConfig = FmtFloatConfig::default()
    .add_point_zero(false)
    .max_significant_digits(6);

pub fn format_f64(f: f64) -> String {
    if f.is_nan() {
        "-".to_string()
    } else {
        dtoa(f, FLOAT_CONFIG)
    }
}

pub fn format_opt_f64(f: Option<f64>) -> String {
    f.map_or("-".to_string(), format_f64)
}

fn format_polar(z: &Complex64) -> String {
    format!(
        "{}\u{2220}{}\u{00B0}",
        format_f64(z.norm()),
        format_f64(z.arg().to_degrees())
    )
}

/// Formats a keyed phasor map as `{k: |z|∠θ°, ...}`.
pub fn format_polar_map<K: Display>(m: &BTreeMap<K, Complex64>) -> String {
    let a: Vec<String> = m.iter().map(|(k, z)| format!("{}: {}", k, format_polar(z))).collect();
    format!("{{{}}}", a.join(", "))
}

/// Formats a keyed scalar map as `{k: v, ...}`.
pub fn format_f64_map<K: Display>(m: &BTreeMap<K, f64>) -> String {
    let a: Vec<String> = m.iter().map(|(k, v)| format!("{}: {}", k, format_f64(*v))).collect();
    format!("{{{}}}", a.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::BusId;

    #[test]
    fn formats() {
        assert_eq!(format_f64(0.5), "0.5");
        assert_eq!(format_f64(2.0), "2");
        assert_eq!(format_opt_f64(None), "-");
        let m: BTreeMap<BusId, Complex64> = [(BusId(1), Complex64::new(2.0, 0.0))].into();
        assert_eq!(format_polar_map(&m), "{1: 2\u{2220}0\u{00B0}}");
        let m: BTreeMap<BusId, f64> = [(BusId(2), 0.25), (BusId(3), 1.5)].into();
        assert_eq!(format_f64_map(&m), "{2: 0.25, 3: 1.5}");
    }
}
