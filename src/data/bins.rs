use super::model::Dataset;

/// Widening applied to the low edge so the observed minimum falls inside the
/// first right-closed interval.
const EDGE_ADJUST: f64 = 0.001;

// ---------------------------------------------------------------------------
// Binning – fixed-width right-closed intervals
// ---------------------------------------------------------------------------

/// Equal-width bins `(e[i], e[i+1]]` over an observed value range.
#[derive(Debug, Clone, PartialEq)]
pub struct Binning {
    edges: Vec<f64>,
}

impl Binning {
    /// Split `[min, max]` into `bins` equal-width intervals.
    ///
    /// Returns `None` for zero bins, non-finite bounds, or a range too wide
    /// to represent.
    pub fn over(min: f64, max: f64, bins: usize) -> Option<Self> {
        if bins == 0 || !min.is_finite() || !max.is_finite() || min > max {
            return None;
        }

        let (lo, hi) = if min == max {
            let pad = if min == 0.0 { EDGE_ADJUST } else { min.abs() * EDGE_ADJUST };
            (min - pad, max + pad)
        } else {
            (min, max)
        };

        let width = hi - lo;
        if !width.is_finite() {
            return None;
        }
        let mut edges: Vec<f64> = (0..=bins)
            .map(|i| lo + width * (i as f64 / bins as f64))
            .collect();
        edges[bins] = hi;
        if min != max {
            edges[0] -= width * EDGE_ADJUST;
        }
        Some(Binning { edges })
    }

    pub fn len(&self) -> usize {
        self.edges.len() - 1
    }

    /// Index of the interval covering `v`, `None` outside the binned range.
    pub fn bin_of(&self, v: f64) -> Option<usize> {
        let first = *self.edges.first()?;
        let last = *self.edges.last()?;
        if v.is_nan() || v <= first || v > last {
            return None;
        }
        self.edges.partition_point(|e| *e < v).checked_sub(1)
    }

    /// `(lower, upper)` bounds of bin `i`.
    pub fn bounds(&self, i: usize) -> (f64, f64) {
        (self.edges[i], self.edges[i + 1])
    }

    pub fn label(&self, i: usize) -> String {
        let (lo, hi) = self.bounds(i);
        format!("({lo:.2}, {hi:.2}]")
    }
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct BinCount {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Count the records at `indices` falling into each bin of `binning`.
pub fn histogram(
    dataset: &Dataset,
    indices: &[usize],
    column: &str,
    binning: &Binning,
) -> Vec<BinCount> {
    let mut counts = vec![0usize; binning.len()];
    for &idx in indices {
        if let Some(bin) = dataset.value(idx, column).as_f64().and_then(|v| binning.bin_of(v)) {
            counts[bin] += 1;
        }
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let (lower, upper) = binning.bounds(i);
            BinCount { lower, upper, count }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forty_bins_place_extremes_in_distinct_bins() {
        let binning = Binning::over(5.0, 95.0, 40).unwrap();
        assert_eq!(binning.len(), 40);

        let bins: Vec<usize> = [5.0, 45.0, 95.0]
            .iter()
            .map(|&v| binning.bin_of(v).unwrap())
            .collect();
        assert_eq!(bins, vec![0, 17, 39]);

        for (&v, &b) in [5.0, 45.0, 95.0].iter().zip(&bins) {
            let (lo, hi) = binning.bounds(b);
            assert!(lo < v && v <= hi, "{v} not in ({lo}, {hi}]");
        }
    }

    #[test]
    fn intervals_are_right_closed_and_contiguous() {
        let binning = Binning::over(0.0, 10.0, 5).unwrap();
        // 4.0 is the upper edge of bin 1
        assert_eq!(binning.bin_of(4.0), Some(1));
        assert_eq!(binning.bin_of(4.0001), Some(2));
        for i in 1..binning.len() {
            assert_eq!(binning.bounds(i - 1).1, binning.bounds(i).0);
        }
        assert_eq!(binning.bin_of(10.5), None);
        assert_eq!(binning.bin_of(-1.0), None);
        assert_eq!(binning.label(0), "(-0.01, 2.00]");
    }

    #[test]
    fn constant_range_still_has_a_bin() {
        let binning = Binning::over(50.0, 50.0, 4).unwrap();
        assert!(binning.bin_of(50.0).is_some());
        assert!(Binning::over(0.0, 0.0, 4).unwrap().bin_of(0.0).is_some());
        assert!(Binning::over(1.0, 2.0, 0).is_none());
    }

    #[test]
    fn overflowing_range_is_not_binned() {
        assert!(Binning::over(-1.7e308, 1.7e308, 40).is_none());
        assert!(Binning::over(f64::MIN, f64::MAX, 1).is_none());
        let wide = Binning::over(1.0e308, 1.7e308, 40).unwrap();
        assert_eq!(wide.bin_of(1.7e308), Some(39));
        assert_eq!(wide.bin_of(1.0e308), Some(0));
    }
}
