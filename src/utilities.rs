/// Grid and interpolation helpers shared by the sampling kernel.

/// Linear interpolation on a linear scale.
///
/// Given arrays of x and y values, interpolate to find the y value at x_new.
/// If x_new is outside the range of x, returns the first or last y value.
pub fn interpolate_linear(x: &[f64], y: &[f64], x_new: f64) -> f64 {
    // Edge cases
    if x.is_empty() {
        return f64::NAN;
    }
    if x.len() == 1 {
        return y[0];
    }
    if x_new <= x[0] {
        return y[0];
    }
    if x_new >= x[x.len() - 1] {
        return y[y.len() - 1];
    }

    // Binary search for interval: find largest i with x[i] <= x_new
    let mut low = 0usize;
    let mut high = x.len() - 1; // invariant: target interval within (low, high]
    while high - low > 1 {
        let mid = (low + high) >> 1;
        if x[mid] <= x_new {
            low = mid;
        } else {
            high = mid;
        }
    }
    let idx = low; // x[idx] <= x_new < x[idx+1]
    let x1 = x[idx];
    let x2 = x[idx + 1];
    let y1 = y[idx];
    let y2 = y[idx + 1];
    y1 + (x_new - x1) * (y2 - y1) / (x2 - x1)
}

/// Locate the bracketing interval of `x_new` in an ascending grid.
///
/// Returns `(i, r)` with `grid[i] <= x_new < grid[i+1]` and the interpolation
/// fraction `r` in [0, 1]. Values outside the grid clamp to the first or last
/// interval with r = 0 or r = 1. The grid must have at least two points.
pub fn bracket(grid: &[f64], x_new: f64) -> (usize, f64) {
    let n = grid.len();
    debug_assert!(n >= 2);
    if x_new <= grid[0] {
        return (0, 0.0);
    }
    if x_new >= grid[n - 1] {
        return (n - 2, 1.0);
    }
    let mut low = 0usize;
    let mut high = n - 1;
    while high - low > 1 {
        let mid = (low + high) >> 1;
        if grid[mid] <= x_new {
            low = mid;
        } else {
            high = mid;
        }
    }
    let r = (x_new - grid[low]) / (grid[low + 1] - grid[low]);
    (low, r)
}

/// Inverse-CDF bin search: largest index k with cdf[k] <= rho, clamped so
/// that k+1 is still a valid index.
pub fn cdf_bin(cdf: &[f64], rho: f64) -> usize {
    let n = cdf.len();
    if n < 2 {
        return 0;
    }
    let mut low = 0usize;
    let mut high = n - 1;
    while high - low > 1 {
        let mid = (low + high) >> 1;
        if cdf[mid] <= rho {
            low = mid;
        } else {
            high = mid;
        }
    }
    low
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_linear_basic() {
        let x = vec![1.0, 2.0, 4.0];
        let y = vec![10.0, 20.0, 40.0];
        assert_eq!(interpolate_linear(&x, &y, 1.5), 15.0);
        assert_eq!(interpolate_linear(&x, &y, 3.0), 30.0);
        // Clamped outside the grid
        assert_eq!(interpolate_linear(&x, &y, 0.5), 10.0);
        assert_eq!(interpolate_linear(&x, &y, 9.0), 40.0);
    }

    #[test]
    fn test_bracket() {
        let grid = vec![1.0, 2.0, 4.0, 8.0];
        assert_eq!(bracket(&grid, 1.0), (0, 0.0));
        let (i, r) = bracket(&grid, 3.0);
        assert_eq!(i, 1);
        assert!((r - 0.5).abs() < 1e-12);
        assert_eq!(bracket(&grid, 8.0), (2, 1.0));
        assert_eq!(bracket(&grid, 100.0), (2, 1.0));
        assert_eq!(bracket(&grid, 0.1), (0, 0.0));
    }

    #[test]
    fn test_cdf_bin() {
        let cdf = vec![0.0, 0.25, 0.75, 1.0];
        assert_eq!(cdf_bin(&cdf, 0.1), 0);
        assert_eq!(cdf_bin(&cdf, 0.3), 1);
        assert_eq!(cdf_bin(&cdf, 0.9), 2);
        // rho = 1.0 still yields a bin whose upper edge exists
        assert_eq!(cdf_bin(&cdf, 1.0), 2);
    }
}
