use std::collections::HashMap;

use log::trace;

use crate::{
    Error,
    handles::{ColumnFlags, StatementHandle},
};

/// Column names and (lazily) column flags of an open result set, together with the memoized
/// results of resolving column labels to ordinals.
///
/// A catalog lives exactly as long as the result set it describes. Closing the cursor drops it,
/// including all cached ordinals, so a new result set never sees ordinals computed for an old one.
#[derive(Debug)]
pub struct ColumnCatalog {
    names: Vec<String>,
    /// Fetched from the engine on first demand.
    flags: Option<Vec<ColumnFlags>>,
    /// Keyed by the label exactly as it has been requested.
    ordinals: HashMap<String, i32>,
    #[cfg(test)]
    num_scans: usize,
}

impl ColumnCatalog {
    pub fn new(names: Vec<String>) -> Self {
        let ordinals = HashMap::with_capacity(names.len());
        Self {
            names,
            flags: None,
            ordinals,
            #[cfg(test)]
            num_scans: 0,
        }
    }

    /// Queries the column names of the result set from the engine.
    pub fn from_handle(handle: &impl StatementHandle) -> Result<Self, Error> {
        let names = (0..handle.column_count())
            .map(|index| handle.column_name(index))
            .collect::<Result<_, _>>()?;
        Ok(Self::new(names))
    }

    /// Number of columns in the result set.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Takes `column` in `[1,len]` form and returns it in `[0,len-1]` form.
    pub fn check_column(&self, column: i32) -> Result<usize, Error> {
        let out_of_range = || Error::ColumnIndexOutOfRange {
            index: column,
            bound: self.names.len(),
        };
        let index = usize::try_from(column).map_err(|_| out_of_range())?;
        if index < 1 || index > self.names.len() {
            return Err(out_of_range());
        }
        Ok(index - 1)
    }

    /// Name of the column at the one based `column`.
    pub fn name(&self, column: i32) -> Result<&str, Error> {
        let index = self.check_column(column)?;
        Ok(&self.names[index])
    }

    /// Flags of all columns. Fetched from the engine on the first call, cached afterwards.
    ///
    /// Column `1` is bounds checked before anything else, so a result set without columns fails
    /// with [`Error::ColumnIndexOutOfRange`] rather than with whatever the engine would report.
    pub fn flags(&mut self, handle: &impl StatementHandle) -> Result<&[ColumnFlags], Error> {
        self.check_column(1)?;
        let flags = match self.flags.take() {
            Some(flags) => flags,
            None => {
                trace!("Fetching column metadata for '{}'.", handle.sql());
                handle.column_metadata()?
            }
        };
        let flags: &[ColumnFlags] = self.flags.insert(flags);
        Ok(flags)
    }

    /// Resolves a column label to its one based ordinal.
    ///
    /// A column matches if its name equals `label` ignoring case, or if it ends with `.label`
    /// ignoring case. The latter allows looking up `name` in a result set with a column named
    /// `t.name`. If more than one column matches, the label is ambiguous and an error is returned
    /// rather than picking the first match.
    pub fn resolve(&mut self, label: &str) -> Result<i32, Error> {
        if let Some(&ordinal) = self.ordinals.get(label) {
            return Ok(ordinal);
        }

        trace!("Scanning column names for '{label}'.");
        #[cfg(test)]
        {
            self.num_scans += 1;
        }

        let lower_label = label.to_lowercase();
        let qualified_suffix = format!(".{lower_label}");
        let mut found = None;
        for (index, name) in self.names.iter().enumerate() {
            let lower_name = name.to_lowercase();
            if lower_name == lower_label || lower_name.ends_with(&qualified_suffix) {
                if found.is_some() {
                    return Err(Error::AmbiguousColumnName {
                        label: label.to_owned(),
                    });
                }
                found = Some(index);
            }
        }

        let index = found.ok_or_else(|| Error::NoSuchColumnName {
            label: label.to_owned(),
        })?;
        let ordinal = to_ordinal(index, self.names.len())?;
        self.ordinals.insert(label.to_owned(), ordinal);
        Ok(ordinal)
    }

    #[cfg(test)]
    pub fn num_scans(&self) -> usize {
        self.num_scans
    }
}

/// One based ordinal of the column at zero based `index`. Fails for columns beyond `i32::MAX`,
/// which applications could not address.
fn to_ordinal(index: usize, bound: usize) -> Result<i32, Error> {
    index
        .checked_add(1)
        .and_then(|ordinal| i32::try_from(ordinal).ok())
        .ok_or(Error::ColumnIndexOutOfRange {
            index: i32::MAX,
            bound,
        })
}
