mod common;

use ndarray::{Array3, Axis};

use hogpyr_core::{FeatureExtractor, HogError, HogParams, ImageData, SampleType};

fn extractor<T: hogpyr_core::Real>() -> FeatureExtractor<T> {
    FeatureExtractor::new(HogParams::default()).unwrap()
}

// ---------------------------------------------------------------------------
// Shape
// ---------------------------------------------------------------------------

#[test]
fn test_default_feature_length_is_32() {
    assert_eq!(HogParams::default().feature_length(), 32);
    assert_eq!(extractor::<f32>().feature_length(), 32);
}

#[test]
fn test_feature_length_tracks_orientations() {
    let params = HogParams {
        bin_size: 4,
        num_orientations: 12,
    };
    assert_eq!(params.feature_length(), 12 + 6 + 4 + 1);
}

#[test]
fn test_output_size_is_block_grid_minus_border() {
    let ext = extractor::<f64>();
    assert_eq!(ext.output_size(64, 64), (6, 6));
    // 60 / 8 = 7.5 rounds to 8 blocks
    assert_eq!(ext.output_size(60, 44), (6, 4));
    assert_eq!(ext.output_size(12, 12), (0, 0));
}

#[test]
fn test_compute_matches_output_size() {
    let ext = extractor::<f64>();
    let feat = ext.compute(&common::ramp_image(64, 80)).unwrap();
    assert_eq!((feat.rows(), feat.cols(), feat.flen()), (6, 8, 32));
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

#[test]
fn test_constant_image_gives_zero_features() {
    let ext = extractor::<f32>();
    let feat = ext.compute(&Array3::<u8>::from_elem((48, 48, 1), 0)).unwrap();
    assert!(!feat.is_empty());
    assert!(feat.as_array().iter().all(|&v| v == 0.0));

    let flat = ext.compute(&Array3::<u16>::from_elem((48, 48, 1), 1000)).unwrap();
    assert!(flat.as_array().iter().all(|&v| v == 0.0));
}

#[test]
fn test_horizontal_edge_votes_only_bin_4() {
    let ext = extractor::<f64>();
    let feat = ext.compute(&common::horizontal_edge(64, 64)).unwrap();
    // the edge sits between pixel rows 31 and 32: blocks 3 and 4, cells 2 and 3
    for row in [2, 3] {
        for col in 0..feat.cols() {
            let cell = feat.cell(row, col);
            assert!(cell[4] > 0.0, "cell ({row}, {col}) bin 4 = {}", cell[4]);
            for (o, &v) in cell[..18].iter().enumerate() {
                if o != 4 {
                    assert_eq!(v, 0.0, "cell ({row}, {col}) bin {o}");
                }
            }
            assert!(cell[18 + 4] > 0.0);
        }
    }
}

#[test]
fn test_inverted_edge_votes_bin_13() {
    let ext = extractor::<f64>();
    let bright_top = common::horizontal_edge(64, 64).mapv(|v| 255 - v);
    let feat = ext.compute(&bright_top).unwrap();
    let cell = feat.cell(2, 3);
    assert!(cell[13] > 0.0);
    assert_eq!(cell[4], 0.0);
    // contrast-insensitive bins fold 13 onto 4
    assert!(cell[18 + 4] > 0.0);
}

#[test]
fn test_values_stay_within_truncation_bounds() {
    let ext = extractor::<f32>();
    let feat = ext.compute(&common::noise_image(80, 72, 1, 7)).unwrap();
    for row in 0..feat.rows() {
        for col in 0..feat.cols() {
            let cell = feat.cell(row, col);
            for &v in &cell[..27] {
                assert!((0.0..=0.4 + 1e-6).contains(&v), "orientation feature {v}");
            }
            for &v in &cell[27..31] {
                assert!(v >= 0.0 && v <= 0.2357 * 0.2 * 18.0 + 1e-5, "texture feature {v}");
            }
            assert_eq!(cell[31], 0.0);
        }
    }
}

#[test]
fn test_compute_is_deterministic() {
    let ext = extractor::<f32>();
    let img = common::noise_image(96, 96, 3, 11);
    let first = ext.compute(&img).unwrap();
    let second = ext.compute(&img).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_large_image_rows_in_parallel() {
    // 75x75 blocks: 73 * 73 output cells, above the row-parallel threshold
    let ext = extractor::<f32>();
    let img = common::noise_image(600, 600, 1, 42);
    let first = ext.compute(&img).unwrap();
    assert_eq!((first.rows(), first.cols()), (73, 73));
    for row in 0..first.rows() {
        for col in 0..first.cols() {
            let cell = first.cell(row, col);
            for &v in &cell[..27] {
                assert!((0.0..=0.4 + 1e-6).contains(&v), "orientation feature {v}");
            }
            assert_eq!(cell[31], 0.0);
        }
    }
    let second = ext.compute(&img).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_precisions_agree() {
    let img = common::noise_image(64, 64, 1, 3);
    let single = extractor::<f32>().compute(&img).unwrap();
    let double = extractor::<f64>().compute(&img).unwrap();
    for (a, b) in single.as_array().iter().zip(double.as_array()) {
        assert!((*a as f64 - b).abs() < 1e-4, "{a} vs {b}");
    }
}

#[test]
fn test_strongest_channel_drives_orientation() {
    let ext = extractor::<f64>();
    let edge = common::vertical_edge(48, 48);
    let gray = ext.compute(&edge.clone().insert_axis(Axis(2))).unwrap();

    let mut color = Array3::<u8>::from_elem((48, 48, 3), 40);
    color.index_axis_mut(Axis(2), 2).assign(&edge);
    let from_color = ext.compute(&color).unwrap();

    assert_eq!(gray, from_color);
}

// ---------------------------------------------------------------------------
// Errors and dispatch
// ---------------------------------------------------------------------------

#[test]
fn test_two_channel_image_rejected() {
    let err = extractor::<f32>()
        .compute(&Array3::<u8>::zeros((32, 32, 2)))
        .unwrap_err();
    assert_eq!(err, HogError::UnsupportedChannels(2));
}

#[test]
fn test_compute_dyn_rejects_signed_samples() {
    let img = ImageData::from(ndarray::Array2::<i8>::zeros((32, 32)));
    let err = extractor::<f32>().compute_dyn(&img).unwrap_err();
    assert_eq!(err, HogError::UnsupportedSampleType(SampleType::I8));
}

#[test]
fn test_compute_dyn_matches_typed_compute() {
    let ext = extractor::<f64>();
    let raw = common::horizontal_edge(40, 56);
    let typed = ext.compute(&raw).unwrap();
    let dynamic = ext.compute_dyn(&ImageData::from(raw)).unwrap();
    assert_eq!(typed, dynamic);
}
