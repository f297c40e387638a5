//! Linear Color Scale
//! Clamped piecewise-linear interpolation between hex color stops.

use crate::scale::ScaleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse `#rrggbb`.
    pub fn parse_hex(hex: &str) -> Result<Self, ScaleError> {
        let invalid = || ScaleError::InvalidColor(hex.to_string());
        let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
        Ok(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearColorScale {
    stops: Vec<(f64, Rgb)>,
}

impl LinearColorScale {
    pub fn new(domain: &[f64], colors: &[String]) -> Result<Self, ScaleError> {
        if domain.len() < 2 {
            return Err(ScaleError::TooFewStops);
        }
        if colors.len() != domain.len() {
            return Err(ScaleError::LabelCount {
                boundaries: domain.len(),
                expected: domain.len(),
                actual: colors.len(),
            });
        }
        if let Some(i) = domain.iter().position(|d| !d.is_finite()) {
            return Err(ScaleError::Unordered(i));
        }
        if let Some(i) = domain.windows(2).position(|w| w[0] >= w[1]) {
            return Err(ScaleError::Unordered(i + 1));
        }
        let stops = domain
            .iter()
            .zip(colors)
            .map(|(d, c)| Ok((*d, Rgb::parse_hex(c)?)))
            .collect::<Result<Vec<_>, ScaleError>>()?;
        Ok(Self { stops })
    }

    /// Interpolated color, clamped to the end stops. `None` for `NaN`.
    pub fn color(&self, value: f64) -> Option<String> {
        if value.is_nan() {
            return None;
        }
        let (first, last) = (self.stops[0], self.stops[self.stops.len() - 1]);
        if value <= first.0 {
            return Some(first.1.to_hex());
        }
        if value >= last.0 {
            return Some(last.1.to_hex());
        }
        let upper = self.stops.partition_point(|(d, _)| *d <= value);
        let (lo, hi) = (self.stops[upper - 1], self.stops[upper]);
        let t = (value - lo.0) / (hi.0 - lo.0);
        Some(lo.1.lerp(hi.1, t).to_hex())
    }

    pub fn domain(&self) -> Vec<f64> {
        self.stops.iter().map(|(d, _)| *d).collect()
    }

    pub fn colors(&self) -> Vec<String> {
        self.stops.iter().map(|(_, c)| c.to_hex()).collect()
    }
}
