use super::{checksum_path, ArtifactStore};
use crate::logic::dataset::record::LabeledRecord;
use crate::logic::dataset::{Dataset, PredictionRecord, SuggestedAction};
use crate::logic::error::{PipelineError, Stage};
use crate::logic::evaluate::evaluate;
use crate::logic::features::FeatureVector;
use crate::logic::model::{Classifier, ForestConfig, ForestTrainer, RandomForest, Trainer};
use std::fs;
use tempfile::tempdir;

fn training_set() -> Dataset {
    let records = (0..60)
        .map(|i| LabeledRecord {
            features: FeatureVector::new((i * 50) as f64, (i % 3) as f64 * 100.0, (i % 10) as f64 * 9.0),
            suggested_action: SuggestedAction::from_index(i * 4 / 60).unwrap(),
        })
        .collect();
    Dataset::new(records, Stage::Select).unwrap()
}

fn trained() -> (RandomForest, Vec<PredictionRecord>) {
    let data = training_set();
    let forest = ForestTrainer::new(ForestConfig {
        n_estimators: 10,
        ..Default::default()
    })
    .train(&data)
    .unwrap();
    let predictions = evaluate(&forest, &data).predictions;
    (forest, predictions)
}

fn store_in(dir: &std::path::Path) -> ArtifactStore {
    ArtifactStore::new(
        dir.join("app_utils").join("model.json"),
        dir.join("app_utils").join("predictions.csv"),
    )
}

#[test]
fn test_load_before_save() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());

    let result = store.load::<RandomForest>();
    assert!(matches!(result, Err(PipelineError::ArtifactNotFound { .. })));
}

#[test]
fn test_round_trip_predicts_identically() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    let (forest, predictions) = trained();

    let saved = store.save(&forest, &predictions).unwrap();
    assert_eq!(saved.holdout_rows, predictions.len());
    assert!(checksum_path(store.model_path()).exists());

    let (artifact, loaded) = store.load::<RandomForest>().unwrap();
    assert_eq!(artifact.run_id, saved.run_id);
    assert_eq!(loaded, predictions);

    let probes = [
        FeatureVector::new(0.0, 0.0, 0.0),
        FeatureVector::new(1234.5, 100.0, 45.0),
        FeatureVector::new(2999.0, 200.0, 81.0),
        FeatureVector::new(-10.0, 1e9, 100.0),
    ];
    for probe in probes.iter().chain(loaded.iter().map(|p| &p.features)) {
        assert_eq!(forest.predict(probe), artifact.model.predict(probe));
    }
}

#[test]
fn test_predictions_table_layout() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    let (forest, predictions) = trained();
    store.save(&forest, &predictions).unwrap();

    let content = fs::read_to_string(store.predictions_path()).unwrap();
    let mut lines = content.lines();
    assert_eq!(
        lines.next(),
        Some("RAM_Usage_MB,Swap_Usage_MB,CPU_Usage,True_Label,Predicted_Label")
    );
    assert_eq!(lines.count(), predictions.len());
}

#[test]
fn test_labels_written_as_floats_are_normalized() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    let (forest, predictions) = trained();
    store.save(&forest, &predictions[..1]).unwrap();

    fs::write(
        store.predictions_path(),
        "RAM_Usage_MB,Swap_Usage_MB,CPU_Usage,True_Label,Predicted_Label\n100,0,5,2.0,2\n",
    )
    .unwrap();

    let (_, loaded) = store.load::<RandomForest>().unwrap();
    assert_eq!(loaded.len(), 1);
    assert!(loaded[0].is_correct());
}

#[test]
fn test_tampered_model_is_rejected() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    let (forest, predictions) = trained();
    store.save(&forest, &predictions).unwrap();

    let mut bytes = fs::read(store.model_path()).unwrap();
    bytes.push(b'\n');
    fs::write(store.model_path(), bytes).unwrap();

    match store.load::<RandomForest>() {
        Err(PipelineError::ArtifactCorrupt { reason, .. }) => assert!(reason.contains("checksum")),
        other => panic!("Expected ArtifactCorrupt, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_layout_mismatch_is_rejected() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    let (forest, predictions) = trained();
    store.save(&forest, &predictions).unwrap();

    let mut json: serde_json::Value =
        serde_json::from_slice(&fs::read(store.model_path()).unwrap()).unwrap();
    json["layout"]["version"] = serde_json::json!(99);
    let bytes = serde_json::to_vec_pretty(&json).unwrap();
    fs::write(store.model_path(), &bytes).unwrap();
    fs::write(checksum_path(store.model_path()), super::sha256_hex(&bytes)).unwrap();

    assert!(matches!(
        store.load::<RandomForest>(),
        Err(PipelineError::LayoutMismatch(_))
    ));
}

#[test]
fn test_empty_predictions_table_is_rejected() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    let (forest, _) = trained();
    store.save(&forest, &[]).unwrap();

    assert!(matches!(
        store.load::<RandomForest>(),
        Err(PipelineError::ArtifactCorrupt { .. })
    ));
}

/// First split node of the first tree in a saved model document
fn first_split(json: &mut serde_json::Value) -> &mut serde_json::Value {
    json["model"]["trees"][0]["nodes"]
        .as_array_mut()
        .unwrap()
        .iter_mut()
        .find(|node| node.get("Split").is_some())
        .map(|node| &mut node["Split"])
        .unwrap()
}

fn rewrite_model(store: &ArtifactStore, edit: impl FnOnce(&mut serde_json::Value)) {
    let mut json: serde_json::Value =
        serde_json::from_slice(&fs::read(store.model_path()).unwrap()).unwrap();
    edit(&mut json);
    fs::write(store.model_path(), serde_json::to_vec_pretty(&json).unwrap()).unwrap();
}

#[test]
fn test_unverified_model_with_bad_feature_index_is_rejected() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    let (forest, predictions) = trained();
    store.save(&forest, &predictions).unwrap();

    rewrite_model(&store, |json| first_split(json)["feature"] = serde_json::json!(7));
    fs::remove_file(checksum_path(store.model_path())).unwrap();

    match store.load::<RandomForest>() {
        Err(PipelineError::ArtifactCorrupt { reason, .. }) => {
            assert!(reason.contains("feature index 7"), "{}", reason)
        }
        other => panic!("Expected ArtifactCorrupt, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_unverified_model_with_cyclic_tree_is_rejected() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    let (forest, predictions) = trained();
    store.save(&forest, &predictions).unwrap();

    rewrite_model(&store, |json| first_split(json)["left"] = serde_json::json!(0));
    fs::remove_file(checksum_path(store.model_path())).unwrap();

    match store.load::<RandomForest>() {
        Err(PipelineError::ArtifactCorrupt { reason, .. }) => {
            assert!(reason.contains("out of order"), "{}", reason)
        }
        other => panic!("Expected ArtifactCorrupt, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_table_from_another_run_is_rejected() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    let (forest, predictions) = trained();
    store.save(&forest, &predictions).unwrap();

    let content = fs::read_to_string(store.predictions_path()).unwrap();
    let shorter: Vec<&str> = content.lines().take(predictions.len()).collect();
    fs::write(store.predictions_path(), shorter.join("\n")).unwrap();

    match store.load::<RandomForest>() {
        Err(PipelineError::ArtifactCorrupt { reason, .. }) => assert!(reason.contains("rows"), "{}", reason),
        other => panic!("Expected ArtifactCorrupt, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_failed_save_keeps_previous_artifacts() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    let (forest, predictions) = trained();
    let first = store.save(&forest, &predictions).unwrap();

    // Staging file cannot be created
    let mut blocker = store.predictions_path().as_os_str().to_owned();
    blocker.push(".tmp");
    fs::create_dir(&blocker).unwrap();

    assert!(store.save(&forest, &predictions[..5]).is_err());

    let (artifact, loaded) = store.load::<RandomForest>().unwrap();
    assert_eq!(artifact.run_id, first.run_id);
    assert_eq!(loaded.len(), predictions.len());
}
