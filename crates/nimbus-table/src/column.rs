//! Typed columns with missing-value bookkeeping.
//!
//! Missing entries are recorded at construction and never silently dropped:
//! numeric gaps are stored as NaN and counted, and the pipeline consumes a
//! gap-filled view produced by [`NumericColumn::filled`].

use serde::{Deserialize, Serialize};

/// Type tag for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Finite real values (possibly with gaps).
    Numeric,
    /// Free-form string values, passed through every stage unmodified.
    Categorical,
}

/// A numeric column. Gaps are stored as NaN and counted in `missing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericColumn {
    name: String,
    values: Vec<f64>,
    missing: usize,
}

impl NumericColumn {
    /// Build from optional values; `None` and NaN both count as missing.
    #[must_use]
    pub fn new(name: impl Into<String>, raw: Vec<Option<f64>>) -> Self {
        let mut missing = 0;
        let values = raw
            .into_iter()
            .map(|v| match v {
                Some(v) if !v.is_nan() => v,
                _ => {
                    missing += 1;
                    f64::NAN
                }
            })
            .collect();
        Self {
            name: name.into(),
            values,
            missing,
        }
    }

    /// Build from dense values; NaN entries count as missing.
    #[must_use]
    pub fn from_values(name: impl Into<String>, values: Vec<f64>) -> Self {
        let missing = values.iter().filter(|v| v.is_nan()).count();
        Self {
            name: name.into(),
            values,
            missing,
        }
    }

    /// Column name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rows, including missing ones.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the column has no rows.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of missing entries.
    #[inline]
    #[must_use]
    pub fn missing(&self) -> usize {
        self.missing
    }

    /// Raw values with NaN at missing positions.
    #[inline]
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Gap-filled view for pipeline math: interior gaps are linearly
    /// interpolated between the nearest finite neighbors, leading and
    /// trailing gaps take the nearest finite value.
    ///
    /// Returns `None` when the column holds no finite value at all.
    #[must_use]
    pub fn filled(&self) -> Option<Vec<f64>> {
        if self.missing == 0 {
            return Some(self.values.clone());
        }
        let known: Vec<usize> = self
            .values
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_nan())
            .map(|(i, _)| i)
            .collect();
        let (&first, &last) = (known.first()?, known.last()?);

        let mut out = self.values.clone();
        let first_value = out[first];
        for slot in out.iter_mut().take(first) {
            *slot = first_value;
        }
        let last_value = out[last];
        for slot in out.iter_mut().skip(last + 1) {
            *slot = last_value;
        }
        for pair in known.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if b - a > 1 {
                let (va, vb) = (out[a], out[b]);
                let span = (b - a) as f64;
                for i in a + 1..b {
                    let t = (i - a) as f64 / span;
                    out[i] = va + t * (vb - va);
                }
            }
        }
        Some(out)
    }
}

/// A categorical column; values never participate in pipeline math.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    name: String,
    values: Vec<Option<String>>,
    missing: usize,
}

impl CategoricalColumn {
    /// Build from optional values; `None` counts as missing.
    #[must_use]
    pub fn new(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        let missing = values.iter().filter(|v| v.is_none()).count();
        Self {
            name: name.into(),
            values,
            missing,
        }
    }

    /// Column name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rows, including missing ones.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the column has no rows.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of missing entries.
    #[inline]
    #[must_use]
    pub fn missing(&self) -> usize {
        self.missing
    }

    /// Row values.
    #[inline]
    #[must_use]
    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Column {
    Numeric(NumericColumn),
    Categorical(CategoricalColumn),
}

impl Column {
    /// Shorthand for a numeric column from optional values.
    #[must_use]
    pub fn numeric(name: impl Into<String>, raw: Vec<Option<f64>>) -> Self {
        Self::Numeric(NumericColumn::new(name, raw))
    }

    /// Shorthand for a numeric column from dense values.
    #[must_use]
    pub fn numeric_dense(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self::Numeric(NumericColumn::from_values(name, values))
    }

    /// Shorthand for a categorical column.
    #[must_use]
    pub fn categorical(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self::Categorical(CategoricalColumn::new(name, values))
    }

    /// Column name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Numeric(c) => c.name(),
            Self::Categorical(c) => c.name(),
        }
    }

    /// Type tag.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::Numeric(_) => ColumnKind::Numeric,
            Self::Categorical(_) => ColumnKind::Categorical,
        }
    }

    /// Number of rows.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(c) => c.len(),
            Self::Categorical(c) => c.len(),
        }
    }

    /// Whether the column has no rows.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of missing entries.
    #[inline]
    #[must_use]
    pub fn missing(&self) -> usize {
        match self {
            Self::Numeric(c) => c.missing(),
            Self::Categorical(c) => c.missing(),
        }
    }
}
