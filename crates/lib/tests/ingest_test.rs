//! # Ingestion Pipeline Tests
//!
//! Runs whole documents through extract → chunk → embed → store against an
//! in-memory store and a scripted embedder.

use leadrag::{
    ingest::{ChunkingSettings, ExtractError, IngestError, IngestionPipeline},
    providers::db::memory::InMemoryDocumentStore,
    types::UploadedFile,
};
use leadrag_test_utils::{setup_tracing, MockEmbedder};
use serde_json::{json, Map};
use std::{io::Write, sync::Arc};

fn pipeline(
    embedder: &MockEmbedder,
    store: &InMemoryDocumentStore,
    chunk_size: usize,
    overlap: usize,
) -> IngestionPipeline {
    IngestionPipeline::new(
        Arc::new(embedder.clone()),
        Arc::new(store.clone()),
        ChunkingSettings {
            chunk_size,
            overlap,
        },
    )
}

#[tokio::test]
async fn test_text_document_is_chunked_embedded_and_stored() {
    setup_tracing();
    let embedder = MockEmbedder::new(vec![0.1, 0.2, 0.3]);
    let store = InMemoryDocumentStore::new();
    let text = "Мы внедряем чат-ботов. Мы автоматизируем отчёты. Мы обучаем сотрудников.";
    let file = UploadedFile::new("services.txt", "text/plain", text.as_bytes());

    let mut extra = Map::new();
    extra.insert("category".into(), json!("services"));
    let report = pipeline(&embedder, &store, 30, 5)
        .ingest_with_report("owner-1", file, extra)
        .await
        .unwrap();

    assert!(report.chunks_total > 1);
    assert_eq!(report.chunks_stored, report.chunks_total);
    assert!(report.failures.is_empty());
    assert_eq!(embedder.call_count(), report.chunks_total);

    let mut chunks = store.chunks().await;
    chunks.sort_by_key(|c| c.chunk_index);
    assert_eq!(chunks.len(), report.chunks_total);
    for (index, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.chunk_index, index);
        assert_eq!(chunk.owner_id, "owner-1");
        assert_eq!(chunk.filename, "services.txt");
        assert_eq!(chunk.metadata["filename"], "services.txt");
        assert_eq!(chunk.metadata["owner_id"], "owner-1");
        assert_eq!(chunk.metadata["category"], "services");
        assert_eq!(chunk.metadata["chunk_index"], json!(index));
        assert!(chunk.content.chars().count() <= 30);
    }
}

#[tokio::test]
async fn test_failing_chunk_does_not_affect_siblings() {
    setup_tracing();
    let embedder = MockEmbedder::new(vec![1.0, 0.0]);
    embedder.fail_on("POISON");
    let store = InMemoryDocumentStore::new();
    let text = "First good sentence here. POISON sentence breaks. Last good sentence here.";
    let file = UploadedFile::new("mixed.txt", "text/plain", text.as_bytes());

    let report = pipeline(&embedder, &store, 26, 0)
        .ingest_with_report("owner-1", file, Map::new())
        .await
        .unwrap();

    assert_eq!(report.chunks_total, 3);
    assert_eq!(report.chunks_stored, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, 1);

    let stored: Vec<String> = store.chunks().await.into_iter().map(|c| c.content).collect();
    assert!(stored.iter().all(|c| !c.contains("POISON")));
    assert_eq!(stored.len(), 2);
}

#[tokio::test]
async fn test_dimension_mismatch_is_rejected() {
    let embedder = MockEmbedder::new(vec![1.0, 0.0]);
    let store = InMemoryDocumentStore::new();
    let file = UploadedFile::new("short.txt", "text/plain", "Короткий текст.".as_bytes());

    let stored = pipeline(&embedder, &store, 1000, 200)
        .with_expected_dimension(384)
        .ingest("owner-1", file, Map::new())
        .await
        .unwrap();

    assert_eq!(stored, 0);
    assert!(store.chunks().await.is_empty());
}

#[tokio::test]
async fn test_unsupported_format_fails_whole_document() {
    let embedder = MockEmbedder::new(vec![1.0]);
    let store = InMemoryDocumentStore::new();
    let file = UploadedFile::new("photo.png", "image/png", vec![0x89, 0x50, 0x4e, 0x47]);

    let err = pipeline(&embedder, &store, 1000, 200)
        .ingest("owner-1", file, Map::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        IngestError::Extract(ExtractError::UnsupportedFormat(ref ext)) if ext == "png"
    ));
    assert_eq!(embedder.call_count(), 0);
}

#[tokio::test]
async fn test_blank_document_stores_nothing() {
    let embedder = MockEmbedder::new(vec![1.0]);
    let store = InMemoryDocumentStore::new();
    let file = UploadedFile::new("empty.txt", "text/plain", "  \n\n ".as_bytes());

    let report = pipeline(&embedder, &store, 1000, 200)
        .ingest_with_report("owner-1", file, Map::new())
        .await
        .unwrap();

    assert_eq!(report.chunks_total, 0);
    assert_eq!(report.chunks_stored, 0);
}

#[tokio::test]
async fn test_docx_document_is_ingested() {
    let mut buffer = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut buffer);
        writer
            .start_file(
                "word/document.xml",
                zip::write::SimpleFileOptions::default(),
            )
            .unwrap();
        writer
            .write_all(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
<w:p><w:r><w:t>Стоимость внедрения от 100 000 рублей.</w:t></w:r></w:p>
</w:body></w:document>"#
                    .as_bytes(),
            )
            .unwrap();
        writer.finish().unwrap();
    }

    let embedder = MockEmbedder::new(vec![1.0, 0.0]);
    let store = InMemoryDocumentStore::new();
    let file = UploadedFile::new(
        "prices.docx",
        "application/octet-stream",
        buffer.into_inner(),
    );

    let stored = pipeline(&embedder, &store, 1000, 200)
        .ingest("owner-1", file, Map::new())
        .await
        .unwrap();

    assert_eq!(stored, 1);
    assert_eq!(
        store.chunks().await[0].content,
        "Стоимость внедрения от 100 000 рублей."
    );
}
