use std::fmt;

/// A value optionally paired with a physical unit token, e.g. `300.0 K`.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitValue<T> {
    pub value: T,
    pub unit: Option<String>,
}

impl<T> UnitValue<T> {
    pub fn new(value: T) -> Self {
        Self { value, unit: None }
    }

    pub fn with_unit(value: T, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: Some(unit.into()),
        }
    }

    #[inline]
    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> UnitValue<U> {
        UnitValue {
            value: f(self.value),
            unit: self.unit,
        }
    }
}

impl<T> From<T> for UnitValue<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: fmt::Display> fmt::Display for UnitValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)?;
        if let Some(unit) = &self.unit {
            write!(f, " {}", unit)?;
        }
        Ok(())
    }
}

/// Parses a real number, accepting Fortran-style `d`/`D` exponents.
pub fn parse_real(token: &str) -> Option<f64> {
    let token = token.trim();
    if let Ok(v) = token.parse::<f64>() {
        return Some(v);
    }
    if token.contains(['d', 'D']) {
        return token.replace(['d', 'D'], "e").parse::<f64>().ok();
    }
    None
}

#[inline]
pub fn is_numeric(token: &str) -> bool {
    parse_real(token).is_some()
}

/// Formats a real so that it always reads back as a real (`300` becomes `300.0`).
pub fn format_real(value: f64) -> String {
    let s = value.to_string();
    if value.is_finite() && !s.contains(['.', 'e', 'E']) {
        format!("{}.0", s)
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_value_with_and_without_unit() {
        assert_eq!(UnitValue::with_unit(300.0, "K").to_string(), "300 K");
        assert_eq!(UnitValue::new(12).to_string(), "12");
    }

    #[test]
    fn map_preserves_unit() {
        let v = UnitValue::with_unit(2.5_f64, "ps").map(|x| x * 2.0);
        assert_eq!(v.value, 5.0);
        assert_eq!(v.unit(), Some("ps"));
    }

    #[test]
    fn parses_fortran_exponents() {
        assert_eq!(parse_real("1.5d-3"), Some(1.5e-3));
        assert_eq!(parse_real("2.0D2"), Some(200.0));
        assert_eq!(parse_real("-4"), Some(-4.0));
        assert_eq!(parse_real("K"), None);
        assert!(!is_numeric("ps"));
    }

    #[test]
    fn formats_integral_reals_with_decimal_point() {
        assert_eq!(format_real(300.0), "300.0");
        assert_eq!(format_real(0.001), "0.001");
        assert_eq!(format_real(-2.5), "-2.5");
        assert_eq!(parse_real(&format_real(1.0e-7)), Some(1.0e-7));
    }
}
