use crate::geometry::{BoundingBox, EMPTY_BBOX};
use crate::raster::Raster;

/// Bounding box of cells where `raster` is positive, as `(north, south,
/// east, west)` — minimum row, maximum row, maximum column, minimum
/// column. Returns [`EMPTY_BBOX`] if no cell is positive.
pub fn infection_boundary(raster: &Raster<i64>) -> BoundingBox {
    let mut min_row = None;
    let mut max_row = None;
    let mut min_col = None;
    let mut max_col = None;

    for row in 0..raster.rows() {
        for col in 0..raster.cols() {
            if raster.get(row, col) > 0 {
                min_row = Some(min_row.map_or(row, |m: usize| m.min(row)));
                max_row = Some(max_row.map_or(row, |m: usize| m.max(row)));
                min_col = Some(min_col.map_or(col, |m: usize| m.min(col)));
                max_col = Some(max_col.map_or(col, |m: usize| m.max(col)));
            }
        }
    }

    match (min_row, max_row, min_col, max_col) {
        (Some(n), Some(s), Some(w), Some(e)) => (n as i32, s as i32, e as i32, w as i32),
        _ => EMPTY_BBOX,
    }
}

/// Per-direction `(n, s, e, w)` spread rate between two consecutive
/// bounding-box snapshots. North and west deltas are sign-flipped because
/// they correspond to a decreasing row/column index. NaN in every
/// direction if either snapshot is the empty-raster sentinel.
pub fn spread_rate(previous: BoundingBox, current: BoundingBox, ew_res: f64, ns_res: f64, years: f64) -> (f64, f64, f64, f64) {
    if previous == EMPTY_BBOX || current == EMPTY_BBOX {
        return (f64::NAN, f64::NAN, f64::NAN, f64::NAN);
    }
    let (n0, s0, e0, w0) = previous;
    let (n1, s1, e1, w1) = current;
    let n = -((n1 - n0) as f64) * ns_res / years;
    let s = (s1 - s0) as f64 * ns_res / years;
    let e = (e1 - e0) as f64 * ew_res / years;
    let w = -((w1 - w0) as f64) * ew_res / years;
    (n, s, e, w)
}

/// Mean of each direction across a series of per-step spread rates,
/// ignoring NaN entries (steps where the infection was empty at either
/// endpoint). A direction with no non-NaN samples averages to NaN.
pub fn average_spread_rate(rates: &[(f64, f64, f64, f64)]) -> (f64, f64, f64, f64) {
    let mean = |values: Vec<f64>| {
        let present: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
        if present.is_empty() {
            f64::NAN
        } else {
            present.iter().sum::<f64>() / present.len() as f64
        }
    };
    let n = mean(rates.iter().map(|r| r.0).collect());
    let s = mean(rates.iter().map(|r| r.1).collect());
    let e = mean(rates.iter().map(|r| r.2).collect());
    let w = mean(rates.iter().map(|r| r.3).collect());
    (n, s, e, w)
}

pub fn sum_of_infected(raster: &Raster<i64>) -> i64 {
    (0..raster.rows())
        .flat_map(|row| (0..raster.cols()).map(move |col| (row, col)))
        .map(|(row, col)| raster.get(row, col))
        .sum()
}

/// Count of cells where `raster` is positive, times `cell_area`.
pub fn area_of_infected(raster: &Raster<i64>, cell_area: f64) -> f64 {
    let count = (0..raster.rows())
        .flat_map(|row| (0..raster.cols()).map(move |col| (row, col)))
        .filter(|&(row, col)| raster.get(row, col) > 0)
        .count();
    count as f64 * cell_area
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_raster_bbox_is_sentinel() {
        let r: Raster<i64> = Raster::new(3, 3, 0);
        assert_eq!(infection_boundary(&r), EMPTY_BBOX);
    }

    #[test]
    fn bbox_finds_extremes_of_positive_cells() {
        let r = Raster::from_rows(vec![vec![0, 0, 1], vec![0, 0, 0], vec![1, 0, 0]]);
        assert_eq!(infection_boundary(&r), (0, 2, 2, 0));
    }

    #[test]
    fn spread_rate_direction_signs_match_bounding_box_deltas() {
        let bbox1 = (2, 4, 3, 0);
        let bbox2 = (1, 3, 3, -2);
        let (n, s, e, w) = spread_rate(bbox1, bbox2, 2.0, 2.0, 4.0);
        assert!((n - 0.5).abs() < 1e-9);
        assert!((s - (-0.5)).abs() < 1e-9);
        assert!((e - 0.0).abs() < 1e-9);
        assert!((w - 1.0).abs() < 1e-9);
    }

    #[test]
    fn spread_rate_nan_when_either_endpoint_empty() {
        let (n, s, e, w) = spread_rate(EMPTY_BBOX, (0, 0, 0, 0), 1.0, 1.0, 1.0);
        assert!(n.is_nan() && s.is_nan() && e.is_nan() && w.is_nan());
    }

    #[test]
    fn average_spread_rate_ignores_nan() {
        let rates = vec![(1.0, 1.0, 1.0, 1.0), (f64::NAN, f64::NAN, f64::NAN, f64::NAN), (3.0, 3.0, 3.0, 3.0)];
        let (n, _, _, _) = average_spread_rate(&rates);
        assert!((n - 2.0).abs() < 1e-9);
    }

    #[test]
    fn sum_and_area_of_infected() {
        let r = Raster::from_rows(vec![vec![2, 0], vec![3, 5]]);
        assert_eq!(sum_of_infected(&r), 10);
        assert!((area_of_infected(&r, 0.5) - 1.5).abs() < 1e-9);
    }
}
