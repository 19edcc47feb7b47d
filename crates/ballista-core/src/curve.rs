//! Piecewise-linear value curves sampled by time or distance.
//!
//! Curves serialize either as a bare number (constant) or as a list of
//! `[time, value]` keys. Sampling outside the key range clamps to the
//! first or last key.

use serde::{Deserialize, Serialize};

/// Linear interpolation between two floats.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// A single curve key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f64,
    pub value: f64,
}

/// Serialized form of a [`Curve`].
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
pub enum CurveRepr {
    Constant(f64),
    Keys(Vec<(f64, f64)>),
}

/// Piecewise-linear curve. Keys are kept sorted by time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CurveRepr", into = "CurveRepr")]
pub struct Curve {
    keys: Vec<Keyframe>,
}

impl Curve {
    pub fn constant(value: f64) -> Self {
        Self {
            keys: vec![Keyframe { time: 0.0, value }],
        }
    }

    /// Straight line from `(t0, v0)` to `(t1, v1)`.
    pub fn linear(t0: f64, v0: f64, t1: f64, v1: f64) -> Self {
        Self::from_keys([(t0, v0), (t1, v1)])
    }

    pub fn from_keys(keys: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let mut keys: Vec<Keyframe> = keys
            .into_iter()
            .filter(|(t, v)| t.is_finite() && v.is_finite())
            .map(|(time, value)| Keyframe { time, value })
            .collect();
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// Sample the curve at `t`. An empty curve evaluates to 0.
    pub fn evaluate(&self, t: f64) -> f64 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };
        if t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }

        // Index of the first key strictly after t; t lies in (keys[i-1], keys[i]].
        let i = self.keys.partition_point(|k| k.time <= t);
        let a = self.keys[i - 1];
        let b = self.keys[i];
        let span = b.time - a.time;
        if span <= 0.0 {
            return b.value;
        }
        lerp(a.value, b.value, (t - a.time) / span)
    }

    /// True if every key carries the same value.
    pub fn is_constant(&self) -> bool {
        self.keys.windows(2).all(|w| w[0].value == w[1].value)
    }
}

impl Default for Curve {
    fn default() -> Self {
        Self::constant(0.0)
    }
}

impl From<CurveRepr> for Curve {
    fn from(repr: CurveRepr) -> Self {
        match repr {
            CurveRepr::Constant(value) => Curve::constant(value),
            CurveRepr::Keys(keys) => Curve::from_keys(keys),
        }
    }
}

impl From<Curve> for CurveRepr {
    fn from(curve: Curve) -> Self {
        match curve.keys.as_slice() {
            [only] => CurveRepr::Constant(only.value),
            keys => CurveRepr::Keys(keys.iter().map(|k| (k.time, k.value)).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_endpoints() {
        assert!((lerp(0.0, 10.0, 0.0) - 0.0).abs() < 1e-12);
        assert!((lerp(0.0, 10.0, 1.0) - 10.0).abs() < 1e-12);
        assert!((lerp(0.0, 10.0, 0.5) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_curve_clamps_outside_keys() {
        let c = Curve::linear(1.0, 10.0, 3.0, 30.0);
        assert_eq!(c.evaluate(-5.0), 10.0);
        assert_eq!(c.evaluate(99.0), 30.0);
        assert!((c.evaluate(2.0) - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_curve_unsorted_keys() {
        let c = Curve::from_keys([(2.0, 4.0), (0.0, 0.0), (1.0, 1.0)]);
        assert!((c.evaluate(1.5) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_curve_json_forms() {
        let c: Curve = serde_json::from_str("12.5").unwrap();
        assert_eq!(c.evaluate(100.0), 12.5);

        let c: Curve = serde_json::from_str("[[0, 0], [10, 100]]").unwrap();
        assert!((c.evaluate(5.0) - 50.0).abs() < 1e-12);
        assert!(!c.is_constant());
    }
}
