//! Article entries → flat table records
//!
//! Pure transformation from parsed XML entries to the row structs the
//! columnar builders consume. Entries without a publication id are
//! dropped here (counted, reported by the worker).

use crate::parser::ArticleEntry;

/// Placeholder sentence some records carry instead of a real
/// affiliation; stripped from the authorship table.
pub const AFFILIATION_BOILERPLATE: &str =
    "For a full list of the authors' affiliations please see the Acknowledgements section.";

#[derive(Debug, Clone)]
pub struct PublicationRecord {
    pub id: i64,
    pub title: String,
    /// `0/1/1` when the record has no usable history date.
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub volume: Option<f64>,
    pub issue: String,
    pub pages: String,
    pub journal_id: String,
    pub issn: String,
    pub doi: String,
    pub team_size: i32,
}

#[derive(Debug, Clone)]
pub struct AuthorshipRecord {
    pub publication_id: i64,
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub affiliations: String,
    /// 1-based position in the author list.
    pub author_sequence: i32,
}

#[derive(Debug, Clone)]
pub struct CitationRecord {
    pub citing_id: i64,
    /// Present only when the reference carried a pubmed ArticleId.
    pub cited_id: Option<i64>,
    pub citation: String,
}

#[derive(Debug, Clone)]
pub struct FieldTagRecord {
    pub publication_id: i64,
    pub field_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Mesh,
    Chemical,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Mesh => "mesh",
            FieldType::Chemical => "chemical",
        }
    }
}

/// Dictionary entry for one vocabulary id.
#[derive(Debug, Clone)]
pub struct VocabularyEntry {
    pub name: String,
    pub field_type: FieldType,
}

/// Everything extracted from one shard.
#[derive(Debug, Default)]
pub struct ShardOutput {
    pub publications: Vec<PublicationRecord>,
    pub authorships: Vec<AuthorshipRecord>,
    pub citations: Vec<CitationRecord>,
    pub field_tags: Vec<FieldTagRecord>,
    /// `(field_id, entry)` in traversal order; the run accumulator
    /// applies last-write-wins across shards.
    pub vocabulary: Vec<(String, VocabularyEntry)>,
    /// `(publication_id, year)` for records with a known year.
    pub year_entries: Vec<(i64, i32)>,
    /// Entries skipped for lacking a publication id.
    pub dropped_entries: usize,
}

/// Flatten parsed entries into table records.
pub fn extract_records(entries: Vec<ArticleEntry>) -> ShardOutput {
    let mut out = ShardOutput::default();

    for entry in entries {
        let Some(id) = entry.pmid else {
            out.dropped_entries += 1;
            continue;
        };

        let year = entry.year.unwrap_or(0);
        if year > 0 {
            out.year_entries.push((id, year));
        }

        let team_size = entry.authors.len() as i32;

        out.publications.push(PublicationRecord {
            id,
            title: entry.title.unwrap_or_default(),
            year,
            month: entry.month.unwrap_or(1),
            day: entry.day.unwrap_or(1),
            volume: entry.volume.as_deref().and_then(|v| v.trim().parse().ok()),
            issue: entry.issue.unwrap_or_default(),
            pages: entry.pages.unwrap_or_default(),
            journal_id: entry.journal_title.unwrap_or_default(),
            issn: entry.issn.unwrap_or_default(),
            doi: entry.doi.unwrap_or_default(),
            team_size,
        });

        for (i, author) in entry.authors.into_iter().enumerate() {
            let first = author.fore_name.unwrap_or_default();
            let last = author.last_name.unwrap_or_default();
            out.authorships.push(AuthorshipRecord {
                publication_id: id,
                full_name: format!("{first} {last}"),
                first_name: first,
                last_name: last,
                affiliations: author
                    .affiliation
                    .map(|a| a.replace(AFFILIATION_BOILERPLATE, ""))
                    .unwrap_or_default(),
                author_sequence: (i + 1) as i32,
            });
        }

        for reference in entry.references {
            out.citations.push(CitationRecord {
                citing_id: id,
                cited_id: reference.cited_id,
                citation: reference.citation,
            });
        }

        for (terms, field_type) in [
            (entry.mesh_terms, FieldType::Mesh),
            (entry.chemicals, FieldType::Chemical),
        ] {
            for term in terms {
                let Some(field_id) = term.id.filter(|i| !i.is_empty()) else {
                    continue;
                };
                out.field_tags.push(FieldTagRecord {
                    publication_id: id,
                    field_id: field_id.clone(),
                });
                out.vocabulary.push((
                    field_id,
                    VocabularyEntry {
                        name: term.name,
                        field_type,
                    },
                ));
            }
        }
    }

    out
}
