use anyhow::Result;
use log::info;
use polars::prelude::*;
use std::collections::HashMap;
use std::path::Path;

use super::tables::{cast_column, read_table};

/// Publication year per internal paper index
#[derive(Debug, Clone)]
pub enum YearLookup {
    /// Positional array: the row is the paper index
    Dense(Vec<Option<i32>>),
    /// Explicit `paper_idx` keys, which may be sparse or very large
    Indexed(HashMap<u64, i32>),
}

impl Default for YearLookup {
    fn default() -> Self {
        YearLookup::Dense(Vec::new())
    }
}

impl YearLookup {
    /// Build from a dense array where position is the paper index
    pub fn from_years(years: Vec<Option<i32>>) -> Self {
        YearLookup::Dense(years)
    }

    /// Later pairs for the same index replace earlier ones
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (u64, i32)>,
    {
        YearLookup::Indexed(pairs.into_iter().collect())
    }

    /// Load from a table with `paper_idx` and `year` columns, or a lone `year`
    /// column indexed by row position
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading paper years from: {}", path.display());
        let df = read_table(path)?;

        let years = cast_column(&df, "year", &DataType::Int32)?;
        let years = years.i32()?;

        let lookup = if df.column("paper_idx").is_ok() {
            let idx = cast_column(&df, "paper_idx", &DataType::UInt64)?;
            let idx = idx.u64()?;
            Self::from_pairs(
                idx.into_iter()
                    .zip(years.into_iter())
                    .filter_map(|(i, y)| Some((i?, y?))),
            )
        } else {
            Self::from_years(years.into_iter().collect())
        };

        info!("Loaded years for {} papers", lookup.len());
        if let Some((min, max)) = lookup.range() {
            info!("Year range: {} - {}", min, max);
        }

        Ok(lookup)
    }

    pub fn get(&self, index: u64) -> Option<i32> {
        match self {
            YearLookup::Dense(years) => usize::try_from(index)
                .ok()
                .and_then(|i| years.get(i).copied().flatten()),
            YearLookup::Indexed(years) => years.get(&index).copied(),
        }
    }

    fn known(&self) -> Box<dyn Iterator<Item = i32> + '_> {
        match self {
            YearLookup::Dense(years) => Box::new(years.iter().flatten().copied()),
            YearLookup::Indexed(years) => Box::new(years.values().copied()),
        }
    }

    /// Number of papers with a known year
    pub fn len(&self) -> usize {
        match self {
            YearLookup::Dense(years) => years.iter().flatten().count(),
            YearLookup::Indexed(years) => years.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn range(&self) -> Option<(i32, i32)> {
        let mut known = self.known();
        let first = known.next()?;
        Some(known.fold((first, first), |(lo, hi), y| (lo.min(y), hi.max(y))))
    }
}

/// External identifier per internal paper index
#[derive(Debug, Clone, Default)]
pub struct IdentifierMap {
    ids: HashMap<u64, String>,
}

impl IdentifierMap {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (u64, S)>,
        S: Into<String>,
    {
        Self {
            ids: pairs.into_iter().map(|(i, s)| (i, s.into())).collect(),
        }
    }

    /// Load from a table with `paper_idx` and `arxiv_id` columns
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading paper index mapping from: {}", path.display());
        let df = read_table(path)?;

        let idx = cast_column(&df, "paper_idx", &DataType::UInt64)?;
        let idx = idx.u64()?;
        let ids = cast_column(&df, "arxiv_id", &DataType::String)?;
        let ids = ids.str()?;

        let map = Self::from_pairs(
            idx.into_iter()
                .zip(ids.into_iter())
                .filter_map(|(i, id)| Some((i?, id?.to_string()))),
        );
        info!("Total papers in mapping: {}", map.len());
        Ok(map)
    }

    pub fn get(&self, index: u64) -> Option<&str> {
        self.ids.get(&index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
