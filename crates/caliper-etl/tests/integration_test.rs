//! Integration tests for the load → embed → index → query flow.
//!
//! All tests use the deterministic hashing provider, so no model files or
//! network access are needed.

use std::io::Write;
use std::path::Path;

use caliper_core::{EmbeddingProvider, EmbeddingResult, Metric, ProviderIdentity};
use caliper_etl::{
    build_provider, load_snippets, run_ingest, DataError, EmbeddingConfig, HashingEmbedder,
    IngestError, LoaderConfig,
};
use caliper_search::{
    open_index, open_index_for_query, IndexConfig, MemoryIndex, QueryError, QueryService,
    VectorIndex,
};
use tempfile::{NamedTempFile, TempDir};

const SNIPPETS: &str = "\
id,category,snippet_text,tools_required,ppe_required
1,Plumbing,Fix a leaky faucet by replacing the worn washer,Wrench,Safety glasses
2,Plumbing,Clear a clogged drain with a plunger or drain snake,Plunger,Rubber gloves
3,Painting,Prime the wall before rolling on two coats of paint,Roller,Dust mask
4,Painting,Use painter's tape along the trim for clean lines,Tape,Safety glasses
";

fn write_csv(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn ingest_into(index: &mut dyn VectorIndex, csv: &Path, provider: &dyn EmbeddingProvider) {
    run_ingest(csv, &LoaderConfig::default(), provider, index).unwrap();
}

/// A fixed-dimension provider standing in for a larger model.
#[derive(Debug)]
struct WideProvider;

impl EmbeddingProvider for WideProvider {
    fn identity(&self) -> ProviderIdentity {
        ProviderIdentity::new("wide", 768)
    }

    fn embed(&self, _text: &str) -> EmbeddingResult<Vec<f32>> {
        Ok(vec![0.5; 768])
    }

    fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        Ok(vec![vec![0.5; 768]; texts.len()])
    }
}

#[test]
fn test_end_to_end_leaky_faucet() {
    let csv = write_csv(SNIPPETS);
    let provider = HashingEmbedder::default();
    let mut index = MemoryIndex::new(Metric::Cosine);

    let report = run_ingest(csv.path(), &LoaderConfig::default(), &provider, &mut index).unwrap();
    assert_eq!(report.loaded, 4);
    assert_eq!(report.indexed, 4);
    assert_eq!(report.categories, vec!["Painting", "Plumbing"]);
    assert_eq!(report.identity, provider.identity());

    let service = QueryService::new(&provider, &index);
    let results = service.answer("leaky faucet", 2).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, "1");
    assert_eq!(results[0].metadata.category, "Plumbing");
    assert!(results[0].distance <= results[1].distance);
}

#[test]
fn test_round_trip_single_snippet() {
    let csv = write_csv(
        "id,category,snippet_text,tools_required,ppe_required\n\
         r1,Plumbing,fix a leak,,\n\
         r2,Painting,paint the fence,,\n",
    );
    let provider = HashingEmbedder::default();
    let mut index = MemoryIndex::new(Metric::Cosine);
    ingest_into(&mut index, csv.path(), &provider);

    let results = QueryService::new(&provider, &index)
        .answer("fix a leak", 1)
        .unwrap();
    assert_eq!(results[0].id, "r1");
    assert_eq!(results[0].text, "fix a leak");
}

#[test]
fn test_query_with_other_dimension_is_rejected() {
    let csv = write_csv(SNIPPETS);
    let provider = HashingEmbedder::new(384).unwrap();
    let mut index = MemoryIndex::new(Metric::Cosine);
    ingest_into(&mut index, csv.path(), &provider);

    let err = QueryService::new(&WideProvider, &index)
        .answer("leaky faucet", 2)
        .unwrap_err();
    assert!(matches!(err, QueryError::ProviderMismatch { .. }));
}

#[test]
fn test_ingest_with_other_dimension_is_rejected() {
    let csv = write_csv(SNIPPETS);
    let mut index = MemoryIndex::new(Metric::Cosine);
    ingest_into(&mut index, csv.path(), &HashingEmbedder::new(384).unwrap());

    let err = run_ingest(
        csv.path(),
        &LoaderConfig::default(),
        &WideProvider,
        &mut index,
    )
    .unwrap_err();
    assert!(matches!(err, IngestError::Index(_)));
    assert_eq!(index.len(), 4);
}

#[test]
fn test_vectors_share_dimension() {
    let csv = write_csv(SNIPPETS);
    let provider = HashingEmbedder::new(64).unwrap();
    let mut index = MemoryIndex::new(Metric::Euclidean);
    ingest_into(&mut index, csv.path(), &provider);

    assert!(index.entries().iter().all(|e| e.embedding.len() == 64));
    let results = QueryService::new(&provider, &index)
        .answer("paint", 10)
        .unwrap();
    assert_eq!(results.len(), 4);
    assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
}

#[test]
fn test_loader_failures_return_nothing() {
    let missing_column = write_csv("id,category,snippet_text,tools_required\n1,A,text,tool\n");
    let err = load_snippets(missing_column.path(), &LoaderConfig::default()).unwrap_err();
    assert!(matches!(err, DataError::MissingColumns { .. }));

    let null_id = write_csv(
        "id,category,snippet_text,tools_required,ppe_required\n1,A,a,b,c\n,B,d,e,f\n",
    );
    let err = load_snippets(null_id.path(), &LoaderConfig::default()).unwrap_err();
    assert!(matches!(err, DataError::NullId { line: 3, .. }));

    let err = load_snippets(Path::new("does/not/exist.csv"), &LoaderConfig::default())
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_failed_ingest_leaves_index_untouched() {
    let csv = write_csv(
        "id,category,snippet_text,tools_required,ppe_required\n1,A,a,b,c\n1,B,d,e,f\n",
    );
    let provider = HashingEmbedder::default();
    let mut index = MemoryIndex::new(Metric::Cosine);

    let err = run_ingest(csv.path(), &LoaderConfig::default(), &provider, &mut index)
        .unwrap_err();
    assert!(matches!(err, IngestError::Data(DataError::DuplicateId { .. })));
    assert!(index.is_empty());
    assert!(index.identity().is_none());
}

#[test]
fn test_on_disk_index_survives_reopen() {
    let csv = write_csv(SNIPPETS);
    let temp_dir = TempDir::new().unwrap();
    let config = IndexConfig::on_disk(temp_dir.path().join("index.db"), Metric::Cosine);
    let provider = build_provider(&EmbeddingConfig::default()).unwrap();

    let before = {
        let mut index = open_index(&config).unwrap();
        ingest_into(index.as_mut(), csv.path(), provider.as_ref());
        QueryService::new(provider.as_ref(), index.as_ref())
            .answer("leaky faucet", 3)
            .unwrap()
    };

    let index = open_index_for_query(&config).unwrap();
    assert_eq!(index.len(), 4);
    let after = QueryService::new(provider.as_ref(), index.as_ref())
        .answer("leaky faucet", 3)
        .unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_reingest_replaces_entries() {
    let csv = write_csv(SNIPPETS);
    let temp_dir = TempDir::new().unwrap();
    let config = IndexConfig::on_disk(temp_dir.path().join("index.db"), Metric::Cosine);
    let provider = HashingEmbedder::default();

    for _ in 0..2 {
        let mut index = open_index(&config).unwrap();
        ingest_into(index.as_mut(), csv.path(), &provider);
    }

    let index = open_index_for_query(&config).unwrap();
    assert_eq!(index.len(), 4);
}
