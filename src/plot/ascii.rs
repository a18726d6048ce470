//! ASCII histogram of Monte Carlo draws.
//!
//! Fixed-size grid with deterministic output:
//! - one column per bin, bars drawn with `#`
//! - a marker row underneath with `L` (p10), `B` (p50) and `H` (p90)

use crate::domain::Band;
use crate::valuation::summary::fmt_money;

/// Render `samples` as a `width`-bin histogram, `height` rows tall.
pub fn render_histogram(samples: &[f64], band: &Band, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(3);

    let finite: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
    let Some((v_min, v_max)) = value_range(&finite, band) else {
        return "Plot: no samples\n".to_string();
    };
    let (v_min, v_max) = pad_range(v_min, v_max, 0.05);

    let mut counts = vec![0usize; width];
    for &v in &finite {
        counts[map_x(v, v_min, v_max, width)] += 1;
    }
    let peak = counts.iter().copied().max().unwrap_or(0).max(1);
    let bars: Vec<usize> = counts
        .iter()
        .map(|&c| {
            if c == 0 {
                0
            } else {
                ((c as f64 / peak as f64 * height as f64).round() as usize).max(1)
            }
        })
        .collect();

    let mut grid = vec![vec![' '; width]; height];
    for (x, &bar) in bars.iter().enumerate() {
        for (row, line) in grid.iter_mut().enumerate() {
            if bar >= height - row {
                line[x] = '#';
            }
        }
    }

    let mut markers = vec![' '; width];
    markers[map_x(band.low, v_min, v_max, width)] = 'L';
    markers[map_x(band.high, v_min, v_max, width)] = 'H';
    markers[map_x(band.base, v_min, v_max, width)] = 'B';

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: n={} | value=[{}, {}] | L=p10 B=p50 H=p90\n",
        finite.len(),
        fmt_money(v_min),
        fmt_money(v_max)
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out.push_str(&markers.into_iter().collect::<String>());
    out.push('\n');
    out
}

fn value_range(samples: &[f64], band: &Band) -> Option<(f64, f64)> {
    if samples.is_empty() {
        return None;
    }
    let mut min_v = f64::INFINITY;
    let mut max_v = f64::NEG_INFINITY;
    for &v in samples.iter().chain([band.low, band.base, band.high].iter()) {
        if v.is_finite() {
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }
    }
    if min_v.is_finite() && max_v.is_finite() && max_v > min_v {
        Some((min_v, max_v))
    } else if min_v.is_finite() {
        // All draws identical: open a unit window around them.
        Some((min_v - 0.5, min_v + 0.5))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(v: f64, v_min: f64, v_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((v - v_min) / (v_max - v_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_golden_snapshot_small() {
        let samples = [1.0, 2.0, 2.0, 3.0, 3.0, 3.0, 4.0];
        let band = Band { low: 2.0, base: 3.0, high: 4.0 };
        let txt = render_histogram(&samples, &band, 10, 3);
        let expected = concat!(
            "Plot: n=7 | value=[$1, $4] | L=p10 B=p50 H=p90\n",
            "      #   \n",
            "   #  #   \n",
            "#  #  #  #\n",
            "   L  B  H\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn no_samples_is_a_single_line() {
        assert_eq!(render_histogram(&[], &Band::flat(0.0), 40, 8), "Plot: no samples\n");
    }

    #[test]
    fn identical_draws_still_render() {
        let txt = render_histogram(&[5.0; 20], &Band::flat(5.0), 12, 4);
        assert!(txt.contains('#'));
        assert!(txt.lines().last().unwrap().contains('B'));
    }
}
