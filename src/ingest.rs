//! Bulk ingest (component G, §4.G).
//!
//! Below [`Config::bulk_insert_threshold`] files, inserts go through one
//! parameterized multi-row statement per file (simplest to reason about,
//! cheap at that scale). Above it, rows are streamed through Postgres's
//! `COPY FROM STDIN` as a tab-delimited buffer — `\N` for nulls, JSON
//! literals for `metadata`/`checksums` — which is the only way bulk
//! loads of this size stay fast. Both paths, plus the parent/child edge
//! buffer, run inside one transaction so a mid-batch failure rolls
//! everything back.
//!
//! Grounded on `metacat/db/dbobjects2.py`'s `DBFile.create_many`, whose
//! `insert_bulk` helper has a latent off-by-one in how it advances its
//! buffer cursor between the small-batch and copy paths (SPEC_FULL.md §9
//! Open Question); this rewrite avoids the bug entirely by giving each
//! path its own buffer instead of sharing a cursor between them.

use serde_json::Value;
use sqlx::postgres::Postgres;

use crate::error::CatalogResult;
use crate::model::File;
use crate::names::generate_fid;

fn tsv_field(value: Option<&str>) -> String {
    match value {
        None => "\\N".to_string(),
        Some(s) => s.replace('\\', "\\\\").replace('\t', "\\t").replace('\n', "\\n"),
    }
}

fn json_field(value: &Value) -> String {
    tsv_field(Some(&value.to_string()))
}

fn file_row_line(file: &File, creator: &str) -> String {
    let metadata = file.metadata.clone().unwrap_or_else(|| Value::Object(Default::default()));
    let checksums = serde_json::to_value(&file.checksums).unwrap_or(Value::Null);
    [
        tsv_field(Some(&file.fid)),
        tsv_field(file.namespace.as_deref()),
        tsv_field(file.name.as_deref()),
        json_field(&metadata),
        tsv_field(file.size.map(|s| s.to_string()).as_deref()),
        json_field(&checksums),
        tsv_field(Some(creator)),
    ]
    .join("\t")
}

/// Assigns a fid to every file missing one, in place.
fn assign_ids(files: &mut [File]) {
    for file in files.iter_mut() {
        if file.fid.is_empty() {
            file.fid = generate_fid();
        }
    }
}

async fn insert_row_by_row(
    files: &[File],
    creator: &str,
    txn: &mut sqlx::Transaction<'_, Postgres>,
) -> CatalogResult<()> {
    for file in files {
        let metadata = file.metadata.clone().unwrap_or_else(|| Value::Object(Default::default()));
        let checksums = serde_json::to_value(&file.checksums).unwrap_or(Value::Null);
        sqlx::query(
            "insert into files (id, namespace, name, metadata, size, checksums, creator, created_timestamp) \
             values ($1, $2, $3, $4, $5, $6, $7, now())",
        )
        .bind(&file.fid)
        .bind(&file.namespace)
        .bind(&file.name)
        .bind(metadata)
        .bind(file.size)
        .bind(checksums)
        .bind(creator)
        .execute(&mut **txn)
        .await?;
    }
    Ok(())
}

async fn insert_via_copy(
    files: &[File],
    creator: &str,
    txn: &mut sqlx::Transaction<'_, Postgres>,
) -> CatalogResult<()> {
    let mut buffer = String::new();
    for file in files {
        buffer.push_str(&file_row_line(file, creator));
        buffer.push('\n');
    }
    let mut copy = txn
        .copy_in_raw("copy files (id, namespace, name, metadata, size, checksums, creator) from stdin")
        .await?;
    copy.send(buffer.into_bytes()).await?;
    copy.finish().await?;
    Ok(())
}

fn parent_child_line(parent: &str, child: &str) -> String {
    format!("{}\t{}\n", tsv_field(Some(parent)), tsv_field(Some(child)))
}

async fn insert_edges(
    edges: &[(String, String)],
    txn: &mut sqlx::Transaction<'_, Postgres>,
    threshold: usize,
) -> CatalogResult<()> {
    if edges.is_empty() {
        return Ok(());
    }
    if edges.len() <= threshold {
        for (parent, child) in edges {
            sqlx::query("insert into parent_child (parent_id, child_id) values ($1, $2)")
                .bind(parent)
                .bind(child)
                .execute(&mut **txn)
                .await?;
        }
    } else {
        let mut buffer = String::new();
        for (parent, child) in edges {
            buffer.push_str(&parent_child_line(parent, child));
        }
        let mut copy = txn.copy_in_raw("copy parent_child (parent_id, child_id) from stdin").await?;
        copy.send(buffer.into_bytes()).await?;
        copy.finish().await?;
    }
    Ok(())
}

/// Ingests `files` with `edges` (`(parent_fid, child_fid)` pairs) as one
/// transaction, choosing row-by-row or `COPY` insert based on
/// `threshold` (§4.G). Returns the fids assigned (including any the
/// caller already supplied).
pub async fn create_many(
    files: &mut [File],
    creator: &str,
    edges: &[(String, String)],
    threshold: usize,
    pool: &sqlx::PgPool,
) -> CatalogResult<Vec<String>> {
    assign_ids(files);
    let mut txn = pool.begin().await?;

    let inserted = if files.len() <= threshold {
        insert_row_by_row(files, creator, &mut txn).await
    } else {
        insert_via_copy(files, creator, &mut txn).await
    };
    if let Err(err) = inserted {
        if matches!(err, crate::error::CatalogError::AlreadyExists(_)) {
            tracing::warn!(nfiles = files.len(), "create_many rejected: already exists");
        }
        return Err(err);
    }
    insert_edges(edges, &mut txn, threshold).await?;

    txn.commit().await?;
    tracing::debug!(nfiles = files.len(), nedges = edges.len(), "create_many succeeded");
    Ok(files.iter().map(|f| f.fid.clone()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tsv_field_escapes_control_characters() {
        assert_eq!(tsv_field(Some("a\tb\nc")), "a\\tb\\nc");
        assert_eq!(tsv_field(None), "\\N");
    }

    #[test]
    fn file_row_line_has_seven_tab_separated_fields() {
        let file = File::new(Some("abc".into()), Some("cms".into()), Some("a.root".into())).unwrap();
        let line = file_row_line(&file, "alice");
        assert_eq!(line.matches('\t').count(), 6);
    }

    #[test]
    fn assign_ids_only_fills_missing_ones() {
        let mut files = vec![
            File::new(Some("preset".into()), None, None).unwrap(),
            File::new(None, None, None).unwrap(),
        ];
        let original_second = files[1].fid.clone();
        assign_ids(&mut files);
        assert_eq!(files[0].fid, "preset");
        assert_eq!(files[1].fid, original_second);
    }
}
