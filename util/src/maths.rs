//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Wrap an angle into the range (-pi, pi].
///
/// The wrap is done through `atan2(sin, cos)` which is insensitive to how
/// many whole turns the input carries.
pub fn wrap_pi<T>(angle: T) -> T
where
    T: Float,
{
    angle.sin().atan2(angle.cos())
}

/// Apply polynomial coefficients to a value
///
/// The order of the coefficients is highest power first, i.e. if there are 3
/// coefficients it's a 2nd order polynomial with c[0]*x^2 + c[1]*x + c[2].
pub fn poly_val<T>(value: &T, coeffs: &Vec<T>) -> T
where
    T: Float + std::ops::Mul + std::ops::Add + std::ops::AddAssign,
{
    let mut res = T::from(0).unwrap();

    for i in 0..(coeffs.len() as i32) {
        res += value.powi(coeffs.len() as i32 - 1 - i) * coeffs[i as usize];
    }

    res
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_wrap_pi() {
        assert!((wrap_pi(0.0f64)).abs() < 1e-12);
        assert!((wrap_pi(PI / 2.0) - PI / 2.0).abs() < 1e-12);
        assert!((wrap_pi(3.0 * PI) - PI).abs() < 1e-9);
        assert!((wrap_pi(-3.0 * PI / 2.0) - PI / 2.0).abs() < 1e-9);
        assert!((wrap_pi(2.0 * PI)).abs() < 1e-9);
    }

    #[test]
    fn test_poly_val() {
        // 2x^2 + 3x + 1 at x = 2 is 15
        let coeffs = vec![2.0f64, 3.0, 1.0];
        assert!((poly_val(&2.0, &coeffs) - 15.0).abs() < 1e-12);

        // A single coefficient is a constant map
        assert!((poly_val(&123.4, &vec![440.0f64]) - 440.0).abs() < 1e-12);
    }
}
