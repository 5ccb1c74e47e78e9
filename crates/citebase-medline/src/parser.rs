//! Medline XML parser using quick-xml
//!
//! Streaming parser for one baseline shard document. Every optional
//! node degrades to `None`; a malformed article entry is skipped, not
//! fatal to the shard.

use anyhow::{Context, Result};
use quick_xml::Reader;
use quick_xml::events::Event;

/// One `<PubmedArticle>` entry, raw fields as found in the document.
#[derive(Debug, Default)]
pub struct ArticleEntry {
    pub pmid: Option<i64>,

    // Article
    pub title: Option<String>,
    pub pages: Option<String>,

    // Journal
    pub journal_title: Option<String>,
    pub issn: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,

    // History date (first PubMedPubDate)
    pub year: Option<i32>,
    pub month: Option<i32>,
    pub day: Option<i32>,

    // Alternate identifiers
    pub doi: Option<String>,

    pub authors: Vec<AuthorEntry>,
    pub mesh_terms: Vec<VocabTerm>,
    pub chemicals: Vec<VocabTerm>,
    pub references: Vec<ReferenceEntry>,
}

#[derive(Debug, Default, Clone)]
pub struct AuthorEntry {
    pub fore_name: Option<String>,
    pub last_name: Option<String>,
    /// First affiliation text, if any.
    pub affiliation: Option<String>,
}

/// Controlled-vocabulary mention: descriptor or chemical substance.
#[derive(Debug, Default, Clone)]
pub struct VocabTerm {
    /// Vocabulary id from the `UI` attribute; may be absent or empty.
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Default, Clone)]
pub struct ReferenceEntry {
    /// Free-text reference string.
    pub citation: String,
    /// Corpus-internal id when the reference carries a pubmed ArticleId.
    pub cited_id: Option<i64>,
}

/// Parse all article entries from one shard document.
pub fn parse_shard_xml(xml: &str) -> Result<Vec<ArticleEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.name().as_ref() == b"PubmedArticle" => {
                match parse_article(&mut reader) {
                    Ok(entry) => entries.push(entry),
                    Err(e) => log::debug!("Failed to parse article entry: {}", e),
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e).context("XML parse error"),
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

fn parse_article(reader: &mut Reader<&[u8]>) -> Result<ArticleEntry> {
    let mut entry = ArticleEntry::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"MedlineCitation" => parse_medline_citation(reader, &mut entry)?,
                b"PubmedData" => parse_pubmed_data(reader, &mut entry)?,
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"PubmedArticle" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(entry)
}

fn parse_medline_citation(reader: &mut Reader<&[u8]>, entry: &mut ArticleEntry) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                // CommentsCorrections blocks nest their own PMID;
                // only the first one is the citation id
                b"PMID" => {
                    let text = read_text(reader)?;
                    if entry.pmid.is_none() {
                        entry.pmid = text.trim().parse().ok();
                    }
                }
                b"Article" => parse_article_element(reader, entry)?,
                b"MeshHeadingList" => entry.mesh_terms = parse_mesh_list(reader)?,
                b"ChemicalList" => entry.chemicals = parse_chemical_list(reader)?,
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"MedlineCitation" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_article_element(reader: &mut Reader<&[u8]>, entry: &mut ArticleEntry) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"Journal" => parse_journal(reader, entry)?,
                b"ArticleTitle" => entry.title = Some(read_text_content(reader, b"ArticleTitle")?),
                b"Pagination" => entry.pages = parse_pagination(reader)?,
                b"AuthorList" => entry.authors = parse_author_list(reader)?,
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"Article" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_journal(reader: &mut Reader<&[u8]>, entry: &mut ArticleEntry) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"ISSN" => entry.issn = Some(read_text(reader)?),
                b"Title" => entry.journal_title = Some(read_text(reader)?),
                b"Volume" => entry.volume = Some(read_text(reader)?),
                b"Issue" => entry.issue = Some(read_text(reader)?),
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"Journal" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_pagination(reader: &mut Reader<&[u8]>) -> Result<Option<String>> {
    let mut buf = Vec::new();
    let mut pages = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"MedlinePgn" => {
                pages = Some(read_text(reader)?);
            }
            Event::End(e) if e.name().as_ref() == b"Pagination" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(pages)
}

fn parse_author_list(reader: &mut Reader<&[u8]>) -> Result<Vec<AuthorEntry>> {
    let mut authors = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"Author" => {
                authors.push(parse_author(reader)?);
            }
            Event::End(e) if e.name().as_ref() == b"AuthorList" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(authors)
}

fn parse_author(reader: &mut Reader<&[u8]>) -> Result<AuthorEntry> {
    let mut author = AuthorEntry::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"LastName" => author.last_name = Some(read_text(reader)?),
                b"ForeName" => author.fore_name = Some(read_text(reader)?),
                b"AffiliationInfo" => {
                    let aff = parse_affiliation(reader)?;
                    if author.affiliation.is_none() {
                        author.affiliation = aff;
                    }
                }
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"Author" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(author)
}

fn parse_affiliation(reader: &mut Reader<&[u8]>) -> Result<Option<String>> {
    let mut buf = Vec::new();
    let mut affiliation = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"Affiliation" => {
                affiliation = Some(read_text(reader)?);
            }
            Event::End(e) if e.name().as_ref() == b"AffiliationInfo" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(affiliation)
}

fn parse_mesh_list(reader: &mut Reader<&[u8]>) -> Result<Vec<VocabTerm>> {
    let mut terms = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"DescriptorName" => {
                let id = attr_value(&e, b"UI");
                let name = read_text(reader)?;
                terms.push(VocabTerm { id, name });
            }
            Event::End(e) if e.name().as_ref() == b"MeshHeadingList" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(terms)
}

fn parse_chemical_list(reader: &mut Reader<&[u8]>) -> Result<Vec<VocabTerm>> {
    let mut substances = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"NameOfSubstance" => {
                let id = attr_value(&e, b"UI");
                let name = read_text(reader)?;
                substances.push(VocabTerm { id, name });
            }
            Event::End(e) if e.name().as_ref() == b"ChemicalList" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(substances)
}

fn parse_pubmed_data(reader: &mut Reader<&[u8]>, entry: &mut ArticleEntry) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"History" => parse_history(reader, entry)?,
                b"ArticleIdList" => parse_article_id_list(reader, entry)?,
                b"ReferenceList" => parse_reference_list(reader, &mut entry.references)?,
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"PubmedData" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// `<History>` carries one `<PubMedPubDate>` per status; the first one
/// is the designated publication date.
fn parse_history(reader: &mut Reader<&[u8]>, entry: &mut ArticleEntry) -> Result<()> {
    let mut buf = Vec::new();
    let mut seen = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"PubMedPubDate" => {
                if seen {
                    skip_element(reader, b"PubMedPubDate")?;
                } else {
                    parse_pub_date(reader, entry)?;
                    seen = true;
                }
            }
            Event::End(e) if e.name().as_ref() == b"History" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_pub_date(reader: &mut Reader<&[u8]>, entry: &mut ArticleEntry) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"Year" => entry.year = read_text(reader)?.parse().ok(),
                b"Month" => entry.month = parse_month(&read_text(reader)?),
                b"Day" => entry.day = read_text(reader)?.parse().ok(),
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"PubMedPubDate" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_month(s: &str) -> Option<i32> {
    // Numeric and English-abbreviation months both occur
    match s.parse::<i32>() {
        Ok(n) => Some(n),
        Err(_) => match s.to_lowercase().as_str() {
            "jan" => Some(1),
            "feb" => Some(2),
            "mar" => Some(3),
            "apr" => Some(4),
            "may" => Some(5),
            "jun" => Some(6),
            "jul" => Some(7),
            "aug" => Some(8),
            "sep" => Some(9),
            "oct" => Some(10),
            "nov" => Some(11),
            "dec" => Some(12),
            _ => None,
        },
    }
}

fn parse_article_id_list(reader: &mut Reader<&[u8]>, entry: &mut ArticleEntry) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"ArticleId" => {
                let id_type = attr_value(&e, b"IdType").unwrap_or_default();
                let value = read_text(reader)?;
                if id_type == "doi" && entry.doi.is_none() {
                    entry.doi = Some(value);
                }
            }
            Event::End(e) if e.name().as_ref() == b"ArticleIdList" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_reference_list(
    reader: &mut Reader<&[u8]>,
    references: &mut Vec<ReferenceEntry>,
) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"Reference" => {
                references.push(parse_reference(reader)?);
            }
            Event::End(e) if e.name().as_ref() == b"ReferenceList" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_reference(reader: &mut Reader<&[u8]>) -> Result<ReferenceEntry> {
    let mut reference = ReferenceEntry::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"Citation" => reference.citation = read_text_content(reader, b"Citation")?,
                b"ArticleId" => {
                    let id_type = attr_value(&e, b"IdType").unwrap_or_default();
                    let value = read_text(reader)?;
                    if id_type == "pubmed" {
                        reference.cited_id = value.trim().parse().ok();
                    }
                }
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"Reference" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(reference)
}

/// Value of an attribute on a start tag, if present.
fn attr_value(e: &quick_xml::events::BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

fn skip_element(reader: &mut Reader<&[u8]>, end_tag: &[u8]) -> Result<()> {
    let mut buf = Vec::new();
    let mut depth = 1;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(_) => depth += 1,
            Event::End(e) => {
                depth -= 1;
                if depth == 0 && e.name().as_ref() == end_tag {
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// Read text content until the next end tag, flattening nested markup.
fn read_text(reader: &mut Reader<&[u8]>) -> Result<String> {
    let mut buf = Vec::new();
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(e) => text.push_str(&e.unescape()?),
            Event::End(_) => break,
            Event::Start(_) => {
                // Inline markup like <i>, <sup>
                text.push_str(&read_text(reader)?);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}

/// Read text of a specific element, handling nested tags by depth.
fn read_text_content(reader: &mut Reader<&[u8]>, end_tag: &[u8]) -> Result<String> {
    let mut buf = Vec::new();
    let mut text = String::new();
    let mut depth = 1;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(e) => text.push_str(&e.unescape()?),
            Event::Start(_) => depth += 1,
            Event::End(e) => {
                depth -= 1;
                if depth == 0 && e.name().as_ref() == end_tag {
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}
