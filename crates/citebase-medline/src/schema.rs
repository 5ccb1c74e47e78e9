//! Static Arrow schemas for the output tables
//!
//! Column names are the downstream contract; renaming one is a breaking
//! change for every consumer of the corpus directory.

use std::sync::{Arc, LazyLock};

use arrow::datatypes::{DataType, Field, Schema, SchemaRef};

/// The four per-shard partitioned tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Publications,
    Authorships,
    Citations,
    FieldTags,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Publications,
        RecordKind::Authorships,
        RecordKind::Citations,
        RecordKind::FieldTags,
    ];

    /// Partition filename prefix.
    pub fn prefix(&self) -> &'static str {
        match self {
            RecordKind::Publications => "publications",
            RecordKind::Authorships => "authorships",
            RecordKind::Citations => "citations",
            RecordKind::FieldTags => "field_tags",
        }
    }

    pub fn schema(&self) -> SchemaRef {
        match self {
            RecordKind::Publications => PUBLICATIONS_SCHEMA.clone(),
            RecordKind::Authorships => AUTHORSHIPS_SCHEMA.clone(),
            RecordKind::Citations => CITATIONS_SCHEMA.clone(),
            RecordKind::FieldTags => FIELD_TAGS_SCHEMA.clone(),
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

pub static PUBLICATIONS_SCHEMA: LazyLock<SchemaRef> = LazyLock::new(|| {
    Arc::new(Schema::new(vec![
        Field::new("PublicationId", DataType::Int64, false),
        Field::new("Title", DataType::Utf8, false),
        Field::new("Year", DataType::Int32, false),
        Field::new("Month", DataType::Int32, false),
        Field::new("Day", DataType::Int32, false),
        // Numeric coercion of the volume text; null when unparseable
        Field::new("Volume", DataType::Float64, true),
        Field::new("Issue", DataType::Utf8, false),
        Field::new("Pages", DataType::Utf8, false),
        Field::new("JournalId", DataType::Utf8, false),
        Field::new("ISSN", DataType::Utf8, false),
        Field::new("Doi", DataType::Utf8, false),
        Field::new("TeamSize", DataType::Int32, false),
    ]))
});

pub static AUTHORSHIPS_SCHEMA: LazyLock<SchemaRef> = LazyLock::new(|| {
    Arc::new(Schema::new(vec![
        Field::new("PublicationId", DataType::Int64, false),
        Field::new("FullName", DataType::Utf8, false),
        Field::new("FirstName", DataType::Utf8, false),
        Field::new("LastName", DataType::Utf8, false),
        Field::new("Affiliations", DataType::Utf8, false),
        Field::new("AuthorSequence", DataType::Int32, false),
    ]))
});

pub static CITATIONS_SCHEMA: LazyLock<SchemaRef> = LazyLock::new(|| {
    Arc::new(Schema::new(vec![
        Field::new("CitingPublicationId", DataType::Int64, false),
        Field::new("CitedPublicationId", DataType::Int64, true),
        Field::new("Citation", DataType::Utf8, false),
    ]))
});

pub static FIELD_TAGS_SCHEMA: LazyLock<SchemaRef> = LazyLock::new(|| {
    Arc::new(Schema::new(vec![
        Field::new("PublicationId", DataType::Int64, false),
        Field::new("FieldId", DataType::Utf8, false),
    ]))
});

pub static FIELDINFO_SCHEMA: LazyLock<SchemaRef> = LazyLock::new(|| {
    Arc::new(Schema::new(vec![
        Field::new("FieldId", DataType::Utf8, false),
        Field::new("FieldName", DataType::Utf8, false),
        Field::new("FieldType", DataType::Utf8, false),
    ]))
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_are_distinct() {
        let prefixes: std::collections::HashSet<_> =
            RecordKind::ALL.iter().map(|k| k.prefix()).collect();
        assert_eq!(prefixes.len(), RecordKind::ALL.len());
    }

    #[test]
    fn publication_id_not_null() {
        for kind in RecordKind::ALL {
            let schema = kind.schema();
            let id_col = schema
                .fields()
                .iter()
                .find(|f| f.name().ends_with("PublicationId") && !f.name().starts_with("Cited"))
                .unwrap();
            assert!(!id_col.is_nullable(), "{kind} id column must be non-null");
        }
    }

    #[test]
    fn cited_id_nullable() {
        let schema = RecordKind::Citations.schema();
        assert!(schema.field_with_name("CitedPublicationId").unwrap().is_nullable());
        assert!(!schema.field_with_name("CitingPublicationId").unwrap().is_nullable());
    }

    #[test]
    fn volume_is_nullable_float() {
        let schema = RecordKind::Publications.schema();
        let vol = schema.field_with_name("Volume").unwrap();
        assert_eq!(vol.data_type(), &DataType::Float64);
        assert!(vol.is_nullable());
    }
}
