use super::*;
use crate::peaks::PeakArrays;

/// Gaussian peaks sampled on a 0.005 grid, samples below 1 forced to zero.
fn profile_with_peaks(centers: &[(usize, f64)], len: usize) -> PeakArrays {
    let mz: Vec<f64> = (0..len).map(|i| 500.0 + i as f64 * 0.005).collect();
    let intensity: Vec<f32> = (0..len)
        .map(|i| {
            let v: f64 = centers
                .iter()
                .map(|&(c, h)| h * (-((i as f64 - c as f64) / 4.0).powi(2)).exp())
                .sum();
            if v < 1.0 {
                0.0
            } else {
                v as f32
            }
        })
        .collect();
    PeakArrays::new(mz, intensity)
}

#[test]
fn test_short_scan_drops_zeros() {
    let peaks = PeakArrays::new(vec![100.0, 100.1, 100.2], vec![0.0, 5.0, 0.0]);
    let out = centroid(&peaks, &CentroidOptions::default()).unwrap();
    assert_eq!(out.mz, vec![100.1]);
    assert_eq!(out.intensity, vec![5.0]);
}

#[test]
fn test_single_peak() {
    let profile = profile_with_peaks(&[(20, 1000.0)], 40);
    let out = centroid(&profile, &CentroidOptions::default()).unwrap();
    assert_eq!(out.len(), 1);
    assert!((out.mz[0] - 500.1).abs() < 1e-9);
    assert!(out.intensity[0] > 0.0);
}

#[test]
fn test_two_separated_peaks() {
    let profile = profile_with_peaks(&[(30, 1000.0), (90, 500.0)], 120);
    let out = centroid(&profile, &CentroidOptions::default()).unwrap();
    assert_eq!(out.len(), 2);
    assert!((out.mz[0] - 500.15).abs() < 1e-3);
    assert!((out.mz[1] - 500.45).abs() < 1e-3);
    assert!(out.intensity[0] > out.intensity[1]);
}

#[test]
fn test_top_k_keeps_most_intense() {
    let profile = profile_with_peaks(&[(30, 300.0), (90, 900.0), (150, 600.0)], 180);
    let options = CentroidOptions {
        top_k: Some(2),
        ..CentroidOptions::default()
    };
    let out = centroid(&profile, &options).unwrap();
    assert_eq!(out.len(), 2);
    // order by m/z is preserved
    assert!((out.mz[0] - 500.45).abs() < 1e-3);
    assert!((out.mz[1] - 500.75).abs() < 1e-3);
}

#[test]
fn test_merge_radius_removes_weaker_neighbour() {
    let profile = profile_with_peaks(&[(30, 1000.0), (90, 500.0)], 120);
    let options = CentroidOptions {
        merge_radius: 0.5,
        ..CentroidOptions::default()
    };
    let out = centroid(&profile, &options).unwrap();
    assert_eq!(out.len(), 1);
    assert!((out.mz[0] - 500.15).abs() < 1e-3);
}

#[test]
fn test_adjust_intensity_restores_raw_apex() {
    let profile = profile_with_peaks(&[(20, 1000.0)], 40);
    let options = CentroidOptions {
        adjust_intensity: true,
        ..CentroidOptions::default()
    };
    let out = centroid(&profile, &options).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out.intensity[0], 1000.0);
}

#[test]
fn test_all_zero_scan_has_no_centroids() {
    let profile = PeakArrays::new(
        (0..20).map(|i| 300.0 + i as f64 * 0.01).collect(),
        vec![0.0; 20],
    );
    let out = centroid(&profile, &CentroidOptions::default()).unwrap();
    assert!(out.is_empty());
}

#[test]
fn test_rejects_square_root_scaling() {
    let options = CentroidOptions {
        uncertainty_scaling: UncertaintyScaling::SquareRoot,
        ..CentroidOptions::default()
    };
    let profile = profile_with_peaks(&[(20, 1000.0)], 40);
    assert!(matches!(
        centroid(&profile, &options),
        Err(CentroidError::BadParameter(_))
    ));
}

#[test]
fn test_options_defaults() {
    let options = CentroidOptions::default();
    assert_eq!(options.uncertainty, 0.01);
    assert_eq!(options.merge_radius, 0.04);
    assert_eq!(options.top_k, None);
    assert!(options.validate().is_ok());
    assert!(CentroidOptions::with_uncertainty(0.0).validate().is_err());
}

#[test]
fn test_uncertainty_scaling_from_str() {
    use std::str::FromStr;
    assert_eq!(
        UncertaintyScaling::from_str("LINEAR").unwrap(),
        UncertaintyScaling::Linear
    );
    assert!(UncertaintyScaling::from_str("cubic").is_err());
}

#[test]
fn test_compress_regular_grid() {
    let profile = profile_with_peaks(&[(50, 800.0)], 100);
    let packed = compress(&profile).unwrap();
    // a uniform grid needs at most the rounding jitter as exceptions
    assert!(packed.summary.low_frequency == 0);
    assert!(packed.mz.len() < profile.len() * 8);

    let back = decompress(&packed.mz, &packed.intensity).unwrap();
    assert_eq!(back.len(), profile.len());
    for (a, b) in back.mz.iter().zip(profile.mz.iter()) {
        assert!((a - b).abs() <= DEFAULT_MZ_QUANTUM);
    }
    assert_eq!(back.intensity, profile.intensity);
}

#[test]
fn test_compress_irregular_deltas() {
    let mut mz = Vec::new();
    let mut x = 200.0;
    for i in 0..600 {
        mz.push(x);
        x += 0.01 + (i % 300) as f64 * 1e-4;
    }
    let intensity: Vec<f32> = (0..600).map(|i| (i * 7 % 1000) as f32).collect();
    let peaks = PeakArrays::new(mz, intensity);
    let packed = compress(&peaks).unwrap();
    assert!(packed.summary.dictionary_len <= 255);
    assert!(packed.summary.low_frequency > 0);

    let back = decompress(&packed.mz, &packed.intensity).unwrap();
    for (a, b) in back.mz.iter().zip(peaks.mz.iter()) {
        assert!((a - b).abs() <= 1e-5);
    }
    assert_eq!(back.intensity, peaks.intensity);
}

#[test]
fn test_compress_empty_and_single() {
    let empty = compress(&PeakArrays::default()).unwrap();
    assert!(decompress(&empty.mz, &empty.intensity).unwrap().is_empty());

    let one = PeakArrays::new(vec![123.456], vec![7.0]);
    let packed = compress(&one).unwrap();
    let back = decompress(&packed.mz, &packed.intensity).unwrap();
    assert_eq!(back.len(), 1);
    assert!((back.mz[0] - 123.456).abs() <= DEFAULT_MZ_QUANTUM);
}

#[test]
fn test_decompress_rejects_truncated_blob() {
    let profile = profile_with_peaks(&[(50, 800.0)], 100);
    let packed = compress(&profile).unwrap();
    let cut = &packed.mz[..packed.mz.len() - 3];
    assert!(matches!(
        decompress(cut, &packed.intensity),
        Err(CentroidError::Corrupt(_))
    ));
    assert!(decompress(&packed.mz, &packed.intensity[..5]).is_err());
}

#[test]
fn test_decompress_rejects_oversized_count() {
    let profile = profile_with_peaks(&[(50, 800.0)], 100);
    let packed = compress(&profile).unwrap();

    // count field follows the version byte in both blobs
    let mut mz = packed.mz.clone();
    mz[1..5].copy_from_slice(&u32::MAX.to_le_bytes());
    assert!(matches!(
        decompress(&mz, &packed.intensity),
        Err(CentroidError::Corrupt(_))
    ));

    let mut intensity = packed.intensity.clone();
    intensity[1..5].copy_from_slice(&u32::MAX.to_le_bytes());
    assert!(matches!(
        decompress(&packed.mz, &intensity),
        Err(CentroidError::Corrupt(_))
    ));
}
