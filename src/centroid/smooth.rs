//! Gaussian smoothing and apex picking.

use super::config::{CentroidOptions, UncertaintyScaling};
use super::error::CentroidError;
use crate::peaks::PeakArrays;

/// Scans shorter than this are passed through with zeros removed.
pub const MIN_CENTROID_POINTS: usize = 10;

const NEAR_ZERO: f64 = 1e-4;
const GAUSS_TEMPLATE_COUNT: usize = 101;
const GAUSS_TEMPLATE_RANGE: f64 = 3.0;
const RESTORE_SIGMA_FACTOR: f64 = 4.0;
const RESTORE_INTENSITY_THR: f64 = 0.2;

/// Unit normal density sampled at [`GAUSS_TEMPLATE_COUNT`] points over +-3 sigma.
fn unit_gaussian_table() -> Vec<f64> {
    let norm = (2.0 * std::f64::consts::PI).sqrt();
    let step = 2.0 * GAUSS_TEMPLATE_RANGE / (GAUSS_TEMPLATE_COUNT - 1) as f64;
    (0..GAUSS_TEMPLATE_COUNT)
        .map(|i| {
            let x = -GAUSS_TEMPLATE_RANGE + i as f64 * step;
            (-x * x / 2.0).exp() / norm
        })
        .collect()
}

struct Sigma {
    start: f64,
    slope: f64,
    x0: f64,
}

impl Sigma {
    fn new(options: &CentroidOptions, first: f64, last: f64) -> Self {
        let slope = match options.uncertainty_scaling {
            UncertaintyScaling::Linear if last > first => {
                (options.end_uncertainty - options.uncertainty) / (last - first)
            }
            _ => 0.0,
        };
        Self {
            start: options.uncertainty,
            slope,
            x0: first,
        }
    }

    fn at(&self, x: f64) -> f64 {
        self.start + (x - self.x0) * self.slope
    }
}

/// Smoothed intensity for every input point.
fn gaussian_smooth(mz: &[f64], y: &[f64], sigma: &Sigma, table: &[f64]) -> Vec<f64> {
    let n = mz.len();
    let center = (table.len() / 2) as isize;
    let mut out = Vec::with_capacity(n);
    let mut i = 0;
    while i < n {
        if y[i] < NEAR_ZERO && i + 1 < n && y[i + 1] < NEAR_ZERO {
            out.push(0.0);
            out.push(0.0);
            i += 2;
            continue;
        }
        let x = mz[i];
        let sd = sigma.at(x);
        let half = 3.0 * sd;
        let per_sd = (center - 1) as f64 / sd / 6.0;
        let mut acc = y[i] * table[center as usize];
        let mut add = |j: usize| {
            let k = center + ((mz[j] - x) * per_sd + 0.5) as isize;
            if k >= 0 && (k as usize) < table.len() {
                acc += y[j] * table[k as usize];
            }
        };
        for j in (i + 1)..n {
            if y[j] > NEAR_ZERO {
                if mz[j] > x + half {
                    break;
                }
                add(j);
            }
        }
        for j in (0..i).rev() {
            if y[j] > NEAR_ZERO {
                if mz[j] < x - half {
                    break;
                }
                add(j);
            }
        }
        out.push(acc);
        i += 1;
    }
    out
}

/// Local maxima of the smoothed trace as `(index, smoothed intensity)`.
fn local_maxima(s: &[f64]) -> Vec<(usize, f64)> {
    let n = s.len();
    let mut maxima = Vec::new();
    if n < 2 {
        return maxima;
    }
    // a flat top counts when the last distinct value before it is lower
    let rises_into = |from: usize, b: f64| {
        s[..from]
            .iter()
            .rev()
            .find(|&&a| a != b)
            .map_or(false, |&a| a < b)
    };
    if s[0] > s[1] {
        maxima.push((0, s[0]));
    }
    for i in 1..n - 1 {
        let b = s[i];
        if b > s[i + 1] {
            let a = s[i - 1];
            if a < b || (a == b && rises_into(i - 1, b)) {
                maxima.push((i, b));
            }
        }
    }
    let (a, b) = (s[n - 2], s[n - 1]);
    if b > a || (b == a && rises_into(n - 2, b)) {
        maxima.push((n - 1, b));
    }
    maxima
}

/// Drop maxima that sit within the merge radius of a stronger one.
///
/// Stronger maxima are visited first; equal intensities keep their m/z order.
fn consolidate(mz: &[f64], maxima: &mut Vec<(usize, f64)>, merge_radius: f64) {
    let mut order: Vec<usize> = (0..maxima.len()).collect();
    order.sort_by(|&a, &b| maxima[b].1.total_cmp(&maxima[a].1));
    let mut removed = vec![false; maxima.len()];
    for &i in &order {
        if removed[i] {
            continue;
        }
        let (idx_i, val_i) = maxima[i];
        let mz_i = mz[idx_i];
        for j in (i + 1)..maxima.len() {
            if mz[maxima[j].0] - mz_i > merge_radius {
                break;
            }
            if !removed[j] && maxima[j].1 < val_i {
                removed[j] = true;
            }
        }
        for j in (0..i).rev() {
            if mz_i - mz[maxima[j].0] > merge_radius {
                break;
            }
            if !removed[j] && maxima[j].1 < val_i {
                removed[j] = true;
            }
        }
    }
    let mut keep = removed.iter().map(|r| !r);
    maxima.retain(|_| keep.next().unwrap_or(false));
}

/// Apex m/z from a three point weighted average above the local floor.
fn weighted_apex(mz: &[f64], y: &[f64], idx: usize) -> f64 {
    if idx == 0 || idx + 1 >= mz.len() {
        return mz[idx];
    }
    let l = y[idx - 1].max(0.0);
    let m = y[idx].max(0.0);
    let r = y[idx + 1].max(0.0);
    let floor = l.min(m).min(r);
    let denom = l + m + r - 3.0 * floor;
    if denom > 1e-5 {
        (mz[idx - 1] * (l - floor) + mz[idx] * (m - floor) + mz[idx + 1] * (r - floor)) / denom
    } else {
        mz[idx]
    }
}

/// Replace each centroid intensity with the highest raw sample of its peak.
fn restore_intensity(out: &mut PeakArrays, mz: &[f64], y: &[f64], sigma: &Sigma) {
    let n = out.len();
    if n == 0 || mz.is_empty() {
        return;
    }
    let mut idx = 0usize;
    let mut x_pos = 0.0;
    let mut next_x = out.mz[0];
    for i in 0..n {
        let prev_x = x_pos;
        x_pos = next_x;
        next_x = if i + 1 < n {
            out.mz[i + 1]
        } else {
            out.mz[n - 1] + 8.0 * RESTORE_SIGMA_FACTOR
        };
        let width = sigma.at(x_pos) * RESTORE_SIGMA_FACTOR;
        let mut lo = x_pos - width;
        let mut hi = x_pos + width;
        if prev_x > lo {
            lo = (lo + prev_x) / 2.0;
        }
        if next_x < hi {
            hi = (hi + next_x) / 2.0;
        }
        while idx + 1 < mz.len() && mz[idx] < x_pos {
            idx += 1;
        }
        let apex = y[idx];
        let thr = apex * RESTORE_INTENSITY_THR;
        let mut best = apex;
        let walk = |range: &mut dyn Iterator<Item = usize>, best: &mut f64| {
            let (mut last, mut prev, mut cur) = (apex, false, false);
            for j in range {
                let v = y[j];
                if v <= thr || mz[j] > hi || mz[j] < lo {
                    break;
                }
                prev = cur;
                cur = last > v;
                last = v;
                if prev && cur {
                    break;
                }
                if v > *best {
                    *best = v;
                }
            }
        };
        walk(&mut ((idx + 1)..mz.len()), &mut best);
        walk(&mut (0..idx).rev(), &mut best);
        out.intensity[i] = best as f32;
    }
}

/// Reduce a profile scan to centroids.
///
/// Zero-intensity samples never become centroids. Short scans skip smoothing.
pub fn centroid(profile: &PeakArrays, options: &CentroidOptions) -> Result<PeakArrays, CentroidError> {
    options.validate()?;
    profile.validate().map_err(CentroidError::BadParameter)?;
    let n = profile.len();
    if n < MIN_CENTROID_POINTS {
        let mut out = PeakArrays::with_capacity(n);
        for (mz, intensity) in profile.iter().filter(|(_, i)| *i > 0.0) {
            out.push(mz, intensity);
        }
        return Ok(out);
    }

    let mz = &profile.mz;
    let y: Vec<f64> = profile.intensity.iter().map(|&v| v as f64).collect();
    let sigma = Sigma::new(options, mz[0], mz[n - 1]);
    let table = unit_gaussian_table();
    let smoothed = gaussian_smooth(mz, &y, &sigma, &table);

    let mut maxima = local_maxima(&smoothed);
    maxima.retain(|&(_, v)| v > 0.0);
    consolidate(mz, &mut maxima, options.merge_radius);

    if let Some(k) = options.top_k {
        if k < maxima.len() {
            maxima.sort_by(|a, b| b.1.total_cmp(&a.1));
            maxima.truncate(k);
            maxima.sort_by_key(|&(idx, _)| idx);
        }
    }

    let mut out = PeakArrays::with_capacity(maxima.len());
    for &(idx, value) in &maxima {
        out.push(weighted_apex(mz, &y, idx), value as f32);
    }

    if options.adjust_intensity {
        restore_intensity(&mut out, mz, &y, &sigma);
    }

    if options.sort_mz {
        let mut pairs: Vec<(f64, f32)> = out.iter().collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        out = PeakArrays::new(
            pairs.iter().map(|p| p.0).collect(),
            pairs.iter().map(|p| p.1).collect(),
        );
    }
    Ok(out)
}
