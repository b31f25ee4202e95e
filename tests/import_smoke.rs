use async_compression::tokio::write::{GzipEncoder, ZstdEncoder};
use review_ingest::{
    build_csv_reader, import_reviews, import_reviews_from_path, ImportError, ImportOptions,
    InputMeta, MemoryStore, StandardSanitizer,
};
use std::{fs::File, io::Write};
use tokio::io::AsyncWriteExt;

fn sample_csv(rows: usize) -> String {
    let mut csv = String::from("product_SKU,comment_author,comment_content,rating,verified\n");
    for i in 0..rows {
        csv.push_str(&format!(
            "SKU{:03},Reviewer {i},\"Line one\nline two\",{},yes\n",
            i % 3,
            i % 5 + 1
        ));
    }
    csv
}

fn catalogue() -> MemoryStore {
    MemoryStore::with_products([("SKU000", 1u64), ("SKU001", 2), ("SKU002", 3)])
}

#[tokio::test]
async fn imports_gzip_upload_from_disk() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let gz_path = dir.path().join("reviews.csv.gz");

    let mut encoder = GzipEncoder::new(Vec::new());
    encoder.write_all(sample_csv(500).as_bytes()).await?;
    encoder.shutdown().await?;
    std::fs::write(&gz_path, encoder.into_inner())?;

    let mut store = catalogue();
    let report = import_reviews_from_path(
        &gz_path,
        encoding_rs::UTF_8,
        &mut store,
        &StandardSanitizer,
        &ImportOptions::default(),
    )
    .await?;

    assert!(report.is_complete());
    assert_eq!(report.imported(), 500);
    assert_eq!(store.len(), 500);
    // Each record spans two physical lines.
    assert_eq!(report.outcomes[499].line, 2 + 2 * 499);
    Ok(())
}

#[tokio::test]
async fn truncated_gzip_halts_and_keeps_earlier_rows() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let gz_path = dir.path().join("reviews.csv.gz");

    let mut encoder = GzipEncoder::new(Vec::new());
    encoder.write_all(sample_csv(5000).as_bytes()).await?;
    encoder.shutdown().await?;
    let mut compressed = encoder.into_inner();
    compressed.truncate(compressed.len() / 2);
    std::fs::write(&gz_path, compressed)?;

    let mut store = catalogue();
    let report = import_reviews_from_path(
        &gz_path,
        encoding_rs::UTF_8,
        &mut store,
        &StandardSanitizer,
        &ImportOptions::default(),
    )
    .await?;

    assert!(!report.is_complete());
    assert!(
        !matches!(report.halted, Some(ImportError::Structural { .. })),
        "{:?}",
        report.halted
    );
    assert!(report.imported() > 0);
    assert!(report.imported() < 5000);
    assert_eq!(store.len(), report.imported());
    Ok(())
}

#[tokio::test]
async fn imports_zstd_upload_from_disk() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let zst_path = dir.path().join("reviews.csv.zst");

    let mut encoder = ZstdEncoder::new(Vec::new());
    encoder.write_all(sample_csv(50).as_bytes()).await?;
    encoder.shutdown().await?;
    std::fs::write(&zst_path, encoder.into_inner())?;

    let mut store = catalogue();
    let report = import_reviews_from_path(
        &zst_path,
        encoding_rs::UTF_8,
        &mut store,
        &StandardSanitizer,
        &ImportOptions::default(),
    )
    .await?;

    assert!(report.is_complete());
    assert_eq!(report.imported(), 50);
    assert_eq!(
        store.comment(2).map(|c| c.content.as_str()),
        Some("Line one\nline two")
    );
    Ok(())
}

#[tokio::test]
async fn imports_plain_upload_from_disk() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let csv_path = dir.path().join("reviews.csv");
    let mut f = File::create(&csv_path)?;
    write!(f, "{}", sample_csv(10))?;
    writeln!(f, "SKU999,Nobody,\"n/a\",1,no")?;
    drop(f);

    let mut store = catalogue();
    let report = import_reviews_from_path(
        &csv_path,
        encoding_rs::UTF_8,
        &mut store,
        &StandardSanitizer,
        &ImportOptions::default(),
    )
    .await?;

    assert_eq!(report.imported(), 10);
    assert_eq!(report.skipped(), 1);
    Ok(())
}

#[tokio::test]
async fn missing_file_is_an_open_error() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut store = catalogue();
    let result = import_reviews_from_path(
        &dir.path().join("nope.csv"),
        encoding_rs::UTF_8,
        &mut store,
        &StandardSanitizer,
        &ImportOptions::default(),
    )
    .await;

    match result {
        Err(ImportError::Open { path, .. }) => assert!(path.ends_with("nope.csv")),
        other => panic!("expected open error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn windows_1252_upload_is_transcoded() -> anyhow::Result<()> {
    let raw: Vec<u8> = b"product_SKU,comment_author,rating\nSKU000,Ren\xe9e,5\n".to_vec();
    let meta = InputMeta::from_file_name("reviews.csv").with_charset(encoding_rs::WINDOWS_1252);
    let reader = build_csv_reader(std::io::Cursor::new(raw), &meta);

    let mut store = catalogue();
    let report =
        import_reviews(reader, &mut store, &StandardSanitizer, &ImportOptions::default()).await?;

    assert_eq!(report.imported(), 1);
    assert_eq!(store.comment(1).map(|c| c.author.as_str()), Some("Renée"));
    Ok(())
}

#[tokio::test]
async fn catalogue_loads_from_csv() -> anyhow::Result<()> {
    let mut store = MemoryStore::new();
    let csv = "id,name,sku\n7,Mug,MUG-1\n8,Cup,\n9,Plate,PLATE-2\n";
    let loaded = store.load_products(std::io::Cursor::new(csv.as_bytes().to_vec())).await?;
    assert_eq!(loaded, 2);

    let report = import_reviews(
        std::io::Cursor::new(b"product_SKU,rating\nPLATE-2,4\n".to_vec()),
        &mut store,
        &StandardSanitizer,
        &ImportOptions::default(),
    )
    .await?;
    assert_eq!(report.imported(), 1);
    assert_eq!(store.comment(1).map(|c| c.product_id), Some(9));
    Ok(())
}

#[tokio::test]
async fn catalogue_skips_blank_skus_before_reading_ids() -> anyhow::Result<()> {
    let mut store = MemoryStore::new();
    let csv = "sku,id\nMUG-1,7\n,\n  ,draft\nPLATE-2,9\n";
    let loaded = store.load_products(std::io::Cursor::new(csv.as_bytes().to_vec())).await?;
    assert_eq!(loaded, 2);

    let bad = "sku,id\nMUG-1,seven\n";
    let err = store
        .load_products(std::io::Cursor::new(bad.as_bytes().to_vec()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("MUG-1"), "{err}");
    Ok(())
}
