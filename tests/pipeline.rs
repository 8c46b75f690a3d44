use std::fs;

use rand::{rngs::StdRng, Rng, SeedableRng};

use mpg_regressor::{
    estimator, ingest, report, Dataset, Estimator, FitError, FittedModel, ModelParams, Reduction,
    TrainConfig,
};

/// Weight/mpg pairs along a known line with bounded noise.
fn noisy_auto_mpg(n: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    Dataset::from_pairs((0..n).map(|_| {
        let weight: f64 = rng.gen_range(1600.0..5200.0);
        let mpg = 46.3 - 0.0076 * weight + rng.gen_range(-2.0..2.0);
        (weight, mpg)
    }))
}

#[test]
fn reference_run_predicts_close_to_the_generating_line() {
    let raw = noisy_auto_mpg(400, 7);
    let model = FittedModel::fit(&raw, TrainConfig::default()).unwrap();

    assert!(model.params.slope < -0.8, "{:?}", model.params);
    assert!(model.params.intercept.abs() < 1e-3, "{:?}", model.params);

    let expected = 46.3 - 0.0076 * 3968.0;
    assert!((model.predict(3968.0) - expected).abs() < 1.0);
}

#[test]
fn parallel_reduction_tracks_sequential_fit() {
    let raw = noisy_auto_mpg(2000, 11);
    let sequential = FittedModel::fit(&raw, TrainConfig::default()).unwrap();
    let parallel = FittedModel::fit(
        &raw,
        TrainConfig::default().with_reduction(Reduction::Parallel),
    )
    .unwrap();

    assert!((sequential.params.slope - parallel.params.slope).abs() < 1e-9);
    assert!((sequential.params.intercept - parallel.params.intercept).abs() < 1e-9);
}

#[test]
fn unnormalized_input_with_large_rate_is_fatal() {
    let raw = noisy_auto_mpg(50, 3);
    let err = estimator::run(ModelParams::default(), &raw, 0.01, 1000).unwrap_err();
    assert!(err.is_divergence(), "{err}");

    let estimator = Estimator::new(TrainConfig::default().with_learning_rate(1e10));
    let standardized = FittedModel::fit(&raw, TrainConfig::default().with_epochs(0))
        .unwrap()
        .standardize(&raw);
    assert!(matches!(
        estimator.fit(&standardized),
        Err(FitError::Diverged { .. } | FitError::ParamsDiverged { .. })
    ));
}

#[test]
fn csv_to_saved_model_and_back() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("auto-mpg.csv");
    let model_path = dir.path().join("model.pkl");
    let export_path = dir.path().join("fit.csv");

    let raw = noisy_auto_mpg(120, 5);
    let mut csv = String::from("mpg,weight,origin\n");
    for s in raw.iter() {
        csv.push_str(&format!("{},{},1\n", s.y, s.x));
    }
    csv.push_str("?,3000,1\n");
    fs::write(&csv_path, csv).unwrap();

    let loaded = ingest::read_dataset(&csv_path, &ingest::Columns::default()).unwrap();
    assert_eq!(loaded.len(), raw.len());

    let model = FittedModel::fit(&loaded, TrainConfig::default()).unwrap();
    model.save(&model_path).unwrap();
    let restored = FittedModel::load(&model_path).unwrap();
    assert_eq!(restored, model);
    assert_eq!(restored.predict(2500.0), model.predict(2500.0));

    report::write_fit_file(&export_path, &model.standardize(&loaded), model.params).unwrap();
    let exported = fs::read_to_string(&export_path).unwrap();
    assert_eq!(exported.lines().count(), loaded.len() + 1);
    assert!(exported.starts_with("x,y,fitted\n"));
}
