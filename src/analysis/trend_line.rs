use serde::Serialize;

/// A fitted line through pivot points. Pure value object, recomputed on
/// demand; never persisted independently of the pattern that produced it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination in [0, 1].
    pub fit_quality: f64,
}

impl TrendLine {
    pub fn value_at(&self, index: usize) -> f64 {
        self.slope * index as f64 + self.intercept
    }

    /// The neutral "no line" value callers must reject patterns on.
    pub fn is_neutral(&self) -> bool {
        self.slope == 0.0 && self.intercept == 0.0 && self.fit_quality == 0.0
    }
}

/// Ordinary least-squares fit through (index, price) pairs.
///
/// With fewer than two points (or zero index variance) this returns the
/// neutral line instead of failing; callers treat that as "no line".
pub fn fit_trend_line(points: &[(usize, f64)]) -> TrendLine {
    if points.len() < 2 {
        return TrendLine::default();
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| *x as f64).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| *y).sum::<f64>() / n;

    let mut cov_xy = 0.0;
    let mut var_x = 0.0;
    for (x, y) in points {
        let dx = *x as f64 - mean_x;
        cov_xy += dx * (y - mean_y);
        var_x += dx * dx;
    }
    if var_x == 0.0 {
        return TrendLine::default();
    }

    let slope = cov_xy / var_x;
    let intercept = mean_y - slope * mean_x;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (x, y) in points {
        let predicted = slope * *x as f64 + intercept;
        ss_res += (y - predicted) * (y - predicted);
        ss_tot += (y - mean_y) * (y - mean_y);
    }

    // All prices identical: a horizontal line fits them exactly, and r²'s
    // usual definition would divide by zero.
    let fit_quality = if ss_tot == 0.0 {
        1.0
    } else {
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    };

    TrendLine {
        slope,
        intercept,
        fit_quality,
    }
}
