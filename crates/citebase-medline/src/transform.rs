//! Record vectors → Arrow RecordBatches

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int32Array, Int64Array, RecordBatch, StringArray};
use arrow::error::ArrowError;
use rustc_hash::FxHashMap;

use crate::extract::{
    AuthorshipRecord, CitationRecord, FieldTagRecord, PublicationRecord, ShardOutput,
    VocabularyEntry,
};
use crate::schema::{self, RecordKind};

/// Batch for one record kind of a shard's output.
pub fn batch_for(kind: RecordKind, output: &ShardOutput) -> Result<RecordBatch, ArrowError> {
    match kind {
        RecordKind::Publications => publications_batch(&output.publications),
        RecordKind::Authorships => authorships_batch(&output.authorships),
        RecordKind::Citations => citations_batch(&output.citations),
        RecordKind::FieldTags => field_tags_batch(&output.field_tags),
    }
}

pub fn publications_batch(records: &[PublicationRecord]) -> Result<RecordBatch, ArrowError> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(records.iter().map(|r| r.id))),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.title.as_str()),
        )),
        Arc::new(Int32Array::from_iter_values(records.iter().map(|r| r.year))),
        Arc::new(Int32Array::from_iter_values(
            records.iter().map(|r| r.month),
        )),
        Arc::new(Int32Array::from_iter_values(records.iter().map(|r| r.day))),
        Arc::new(Float64Array::from_iter(
            records.iter().map(|r| r.volume),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.issue.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.pages.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.journal_id.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.issn.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.doi.as_str()),
        )),
        Arc::new(Int32Array::from_iter_values(
            records.iter().map(|r| r.team_size),
        )),
    ];
    RecordBatch::try_new(schema::PUBLICATIONS_SCHEMA.clone(), columns)
}

pub fn authorships_batch(records: &[AuthorshipRecord]) -> Result<RecordBatch, ArrowError> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(
            records.iter().map(|r| r.publication_id),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.full_name.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.first_name.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.last_name.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.affiliations.as_str()),
        )),
        Arc::new(Int32Array::from_iter_values(
            records.iter().map(|r| r.author_sequence),
        )),
    ];
    RecordBatch::try_new(schema::AUTHORSHIPS_SCHEMA.clone(), columns)
}

pub fn citations_batch(records: &[CitationRecord]) -> Result<RecordBatch, ArrowError> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(
            records.iter().map(|r| r.citing_id),
        )),
        Arc::new(Int64Array::from_iter(records.iter().map(|r| r.cited_id))),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.citation.as_str()),
        )),
    ];
    RecordBatch::try_new(schema::CITATIONS_SCHEMA.clone(), columns)
}

pub fn field_tags_batch(records: &[FieldTagRecord]) -> Result<RecordBatch, ArrowError> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(
            records.iter().map(|r| r.publication_id),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.field_id.as_str()),
        )),
    ];
    RecordBatch::try_new(schema::FIELD_TAGS_SCHEMA.clone(), columns)
}

/// Dictionary batch, sorted by field id so reruns are byte-identical.
pub fn fieldinfo_batch(
    vocabulary: &FxHashMap<String, VocabularyEntry>,
) -> Result<RecordBatch, ArrowError> {
    let mut ids: Vec<&String> = vocabulary.keys().collect();
    ids.sort_unstable();

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(
            ids.iter().map(|id| id.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            ids.iter().map(|id| vocabulary[*id].name.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            ids.iter().map(|id| vocabulary[*id].field_type.as_str()),
        )),
    ];
    RecordBatch::try_new(schema::FIELDINFO_SCHEMA.clone(), columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::FieldType;
    use arrow::array::Array;

    fn publication(id: i64) -> PublicationRecord {
        PublicationRecord {
            id,
            title: "T".into(),
            year: 1990,
            month: 1,
            day: 1,
            volume: None,
            issue: String::new(),
            pages: String::new(),
            journal_id: String::new(),
            issn: String::new(),
            doi: String::new(),
            team_size: 0,
        }
    }

    #[test]
    fn publications_batch_shape() {
        let batch = publications_batch(&[publication(1), publication(2)]).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 12);
        assert_eq!(batch.schema(), *schema::PUBLICATIONS_SCHEMA);
    }

    #[test]
    fn empty_batches_keep_schema() {
        let output = ShardOutput::default();
        for kind in RecordKind::ALL {
            let batch = batch_for(kind, &output).unwrap();
            assert_eq!(batch.num_rows(), 0);
            assert_eq!(batch.schema(), kind.schema());
        }
    }

    #[test]
    fn citations_null_cited_id() {
        let batch = citations_batch(&[
            CitationRecord {
                citing_id: 100,
                cited_id: Some(50),
                citation: "a".into(),
            },
            CitationRecord {
                citing_id: 100,
                cited_id: None,
                citation: "b".into(),
            },
        ])
        .unwrap();

        let cited = batch
            .column(1)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(cited.value(0), 50);
        assert!(cited.is_null(1));
    }

    #[test]
    fn fieldinfo_sorted_by_id() {
        let mut vocab = FxHashMap::default();
        vocab.insert(
            "D2".to_string(),
            VocabularyEntry {
                name: "Second".into(),
                field_type: FieldType::Chemical,
            },
        );
        vocab.insert(
            "D1".to_string(),
            VocabularyEntry {
                name: "First".into(),
                field_type: FieldType::Mesh,
            },
        );

        let batch = fieldinfo_batch(&vocab).unwrap();
        let ids = batch
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(ids.value(0), "D1");
        assert_eq!(ids.value(1), "D2");

        let types = batch
            .column(2)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(types.value(0), "mesh");
        assert_eq!(types.value(1), "chemical");
    }
}
