use proptest::prelude::*;
use vnmacro::scale::{ThresholdScale, INFLATION_COLORS, INFLATION_THRESHOLDS};

fn inflation_scale() -> ThresholdScale<&'static str> {
    ThresholdScale::new(INFLATION_THRESHOLDS.to_vec(), INFLATION_COLORS.to_vec()).expect("valid scale")
}

/// Strictly increasing boundaries built from positive gaps.
fn boundaries() -> impl Strategy<Value = Vec<f64>> {
    (-1_000.0f64..1_000.0, prop::collection::vec(0.001f64..100.0, 0..12)).prop_map(|(start, gaps)| {
        let mut out = vec![start];
        for g in gaps {
            let next = out[out.len() - 1] + g;
            out.push(next);
        }
        out
    })
}

#[test]
fn inflation_scenarios() {
    let scale = inflation_scale();
    assert_eq!(scale.classify(-6.0), Some(&INFLATION_COLORS[0]));
    assert_eq!(scale.classify(0.0), Some(&INFLATION_COLORS[2]));
    assert_eq!(scale.classify(3.2), Some(&"#ff9800"));
    assert_eq!(scale.classify(f64::NAN), None);
}

proptest! {
    #[test]
    fn classify_is_monotonic(b in boundaries(), x in -2_000.0f64..3_000.0, y in -2_000.0f64..3_000.0) {
        let labels: Vec<usize> = (0..=b.len()).collect();
        let scale = ThresholdScale::new(b, labels).expect("increasing boundaries");
        let (lo, hi) = if x <= y { (x, y) } else { (y, x) };
        prop_assert!(scale.classify(lo) <= scale.classify(hi));
    }

    #[test]
    fn boundary_value_goes_to_upper_bucket(b in boundaries(), pick in any::<prop::sample::Index>()) {
        let labels: Vec<usize> = (0..=b.len()).collect();
        let i = pick.index(b.len());
        let t = b[i];
        let scale = ThresholdScale::new(b, labels).expect("increasing boundaries");
        prop_assert_eq!(scale.classify(t), Some(&(i + 1)));
    }

    #[test]
    fn every_finite_value_has_a_bucket(x in prop::num::f64::NORMAL | prop::num::f64::ZERO) {
        prop_assert!(inflation_scale().classify(x).is_some());
    }
}
