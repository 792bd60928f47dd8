//! Item catalog loading and the tag → items index.
//!
//! Internal ids are dense (`1..=N`) and follow catalog row order strictly.
//! Everything downstream joins on them, so the catalog must never be read
//! out of order.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Separator between tags inside the catalog's `tags` cell.
pub const TAG_SEPARATOR: char = '|';

/// A catalog item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Dense id assigned in read order, starting at 1.
    pub internal_id: u32,
    /// The catalog's own identifier, used to join embedding files.
    pub external_id: String,
    /// Tags in catalog order; may be empty.
    pub tags: Vec<String>,
}

/// Tag → internal ids, in first-appearance order for both tags and ids.
#[derive(Debug, Clone, Default)]
pub struct TagIndex {
    by_tag: IndexMap<String, Vec<u32>>,
}

impl TagIndex {
    /// Items carrying `tag`, in catalog order.
    #[must_use]
    pub fn items_for(&self, tag: &str) -> &[u32] {
        self.by_tag.get(tag).map_or(&[], Vec::as_slice)
    }

    /// Iterates `(tag, items)` in first-appearance order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u32])> {
        self.by_tag.iter().map(|(t, ids)| (t.as_str(), ids.as_slice()))
    }

    /// Number of distinct tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    /// Returns true if no item carries a tag.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }

    fn insert(&mut self, tag: &str, internal_id: u32) {
        self.by_tag
            .entry(tag.to_string())
            .or_default()
            .push(internal_id);
    }
}

/// Immutable, indexed view of the item catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<Item>,
    tag_index: TagIndex,
}

impl Catalog {
    /// Loads and indexes the catalog CSV at `path`.
    ///
    /// # Errors
    ///
    /// `CatalogNotFound` if the file is absent, `CatalogEmpty` if it has no
    /// rows, `MissingColumn` if the header lacks `id` or `tags`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::CatalogNotFound(path.to_path_buf()));
        }
        let catalog = Self::from_csv_reader(File::open(path)?)?;
        if catalog.is_empty() {
            return Err(Error::CatalogEmpty(path.to_path_buf()));
        }
        info!(
            "Loaded catalog {}: {} items, {} tags",
            path.display(),
            catalog.len(),
            catalog.tag_index.len()
        );
        Ok(catalog)
    }

    /// Parses catalog CSV from any reader. An empty result is not an error here.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let column = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or(Error::MissingColumn(name))
        };
        let id_col = column("id")?;
        let tags_col = column("tags")?;

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let external_id = record.get(id_col).unwrap_or("").trim().to_string();
            let tags = record.get(tags_col).unwrap_or("").to_string();
            rows.push((external_id, tags));
        }
        Self::from_rows(rows)
    }

    /// Builds a catalog from `(external_id, raw_tags)` rows in order.
    pub fn from_rows<I, E, T>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = (E, T)>,
        E: Into<String>,
        T: AsRef<str>,
    {
        let mut catalog = Self::default();
        for (external_id, raw_tags) in rows {
            let internal_id = u32::try_from(catalog.items.len() + 1)
                .map_err(|_| Error::Config("catalog exceeds u32::MAX items".to_string()))?;
            let tags = parse_tags(raw_tags.as_ref());
            for tag in &tags {
                catalog.tag_index.insert(tag, internal_id);
            }
            catalog.items.push(Item {
                internal_id,
                external_id: external_id.into(),
                tags,
            });
        }
        debug!("Indexed {} catalog rows", catalog.items.len());
        Ok(catalog)
    }

    /// Number of items (`N`).
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the catalog has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Highest internal id, equal to `len()`; 0 for an empty catalog.
    #[must_use]
    pub fn max_id(&self) -> u32 {
        self.items.last().map_or(0, |item| item.internal_id)
    }

    /// All items in internal-id order.
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Looks up an item by internal id.
    #[must_use]
    pub fn item(&self, internal_id: u32) -> Option<&Item> {
        let idx = usize::try_from(internal_id).ok()?.checked_sub(1)?;
        self.items.get(idx)
    }

    /// Tags of an item, empty for unknown ids.
    #[must_use]
    pub fn tags_of(&self, internal_id: u32) -> &[String] {
        self.item(internal_id).map_or(&[], |item| item.tags.as_slice())
    }

    /// External id of an item.
    #[must_use]
    pub fn external_id(&self, internal_id: u32) -> Option<&str> {
        self.item(internal_id).map(|item| item.external_id.as_str())
    }

    /// The tag index.
    #[must_use]
    pub fn tag_index(&self) -> &TagIndex {
        &self.tag_index
    }
}

/// Splits a raw `tags` cell on `|`, trimming and dropping empty fragments.
#[must_use]
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(TAG_SEPARATOR)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
