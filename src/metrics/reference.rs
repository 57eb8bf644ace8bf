//! Known optima of the benchmark function instances.

use std::fs::File;
use std::path::{Path, PathBuf};

use analizar_common::{AnalizarError, Result};

/// Header-less `identifier,optimum` table.
///
/// Identifiers look like `bbob_f001_i01_d10`; the `f001_i01` part is the
/// token matched against run keys.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimaReference {
    /// `(token, optimum)` per row, in file order.
    entries: Vec<(String, f64)>,
    tokens: Vec<String>,
}

fn token_of(identifier: &str) -> Option<String> {
    let parts: Vec<&str> = identifier.split('_').collect();
    match parts.as_slice() {
        [_, function, instance, ..] if !function.is_empty() && !instance.is_empty() => {
            Some(format!("{function}_{instance}"))
        }
        _ => None,
    }
}

impl OptimaReference {
    /// Build from in-memory rows; `source` only labels errors.
    pub fn new(entries: Vec<(String, f64)>, source: &Path) -> Result<Self> {
        let mut tokens: Vec<String> = Vec::new();
        let mut keyed = Vec::with_capacity(entries.len());
        for (row, (identifier, optimum)) in entries.into_iter().enumerate() {
            let token = token_of(&identifier).ok_or_else(|| AnalizarError::MalformedReference {
                path: source.to_path_buf(),
                row,
                message: format!("identifier '{identifier}' has no function/instance part"),
            })?;
            if !tokens.contains(&token) {
                tokens.push(token.clone());
            }
            keyed.push((token, optimum));
        }
        Ok(Self { entries: keyed, tokens })
    }

    /// Load the reference CSV.
    pub fn from_csv(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            AnalizarError::io(format!("opening optimum reference {}", path.display()), e)
        })?;
        let malformed = |row: usize, message: String| AnalizarError::MalformedReference {
            path: PathBuf::from(path),
            row,
            message,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_reader(file);

        let mut entries = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(|e| malformed(row, e.to_string()))?;
            let (Some(identifier), Some(optimum)) = (record.get(0), record.get(1)) else {
                return Err(malformed(row, format!("expected 2 fields, found {}", record.len())));
            };
            let optimum = optimum
                .parse::<f64>()
                .map_err(|_| malformed(row, format!("optimum '{optimum}' is not a number")))?;
            entries.push((identifier.to_string(), optimum));
        }

        Self::new(entries, path)
    }

    /// Deduplicated `function_instance` tokens in first-seen order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Optimum of the first row carrying `token`.
    pub fn optimum_for(&self, token: &str) -> Option<f64> {
        self.entries.iter().find(|(t, _)| t == token).map(|(_, optimum)| *optimum)
    }

    /// Optimum for a run key.
    ///
    /// Candidate tokens (the reference's own, or `filter` when given) are
    /// matched as substrings of the key; the longest match wins so that
    /// `f001_i1` never shadows `f001_i10`.
    pub fn resolve(&self, key: &str, filter: Option<&[String]>) -> Option<f64> {
        let candidates = filter.unwrap_or(&self.tokens);
        let mut best: Option<&String> = None;
        for token in candidates.iter().filter(|t| key.contains(t.as_str())) {
            if best.map_or(true, |b| token.len() > b.len()) {
                best = Some(token);
            }
        }
        best.and_then(|token| self.optimum_for(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn reference() -> OptimaReference {
        OptimaReference::new(
            vec![
                ("bbob_f001_i01_d10".into(), 79.48),
                ("bbob_f001_i01_d20".into(), 79.48),
                ("bbob_f001_i1_d2".into(), -1.0),
                ("bbob_f002_i02_d10".into(), -209.88),
            ],
            Path::new("<memory>"),
        )
        .unwrap()
    }

    #[test]
    fn test_tokens_are_deduplicated_in_order() {
        assert_eq!(reference().tokens(), &["f001_i01", "f001_i1", "f002_i02"]);
    }

    #[test]
    fn test_resolve_matches_key() {
        let r = reference();
        assert_eq!(r.resolve("3_PSO_f002_i02_d10", None), Some(-209.88));
        assert_eq!(r.resolve("3_PSO_f001_i01_d10", None), Some(79.48));
        assert_eq!(r.resolve("3_PSO_f003_i01_d10", None), None);
    }

    #[test]
    fn test_resolve_prefers_longest_token() {
        let r = reference();
        assert_eq!(r.resolve("3_PSO_f001_i1_d2", None), Some(-1.0));

        let r = OptimaReference::new(
            vec![("bbob_f001_i1_d2".into(), -1.0), ("bbob_f001_i10_d2".into(), 4.0)],
            Path::new("<memory>"),
        )
        .unwrap();
        assert_eq!(r.resolve("3_PSO_f001_i10_d2", None), Some(4.0));
    }

    #[test]
    fn test_resolve_with_filter() {
        let r = reference();
        let filter = vec!["f002_i02".to_string()];
        assert_eq!(r.resolve("3_PSO_f002_i02_d10", Some(&filter)), Some(-209.88));
        assert_eq!(r.resolve("3_PSO_f001_i01_d10", Some(&filter)), None);
    }

    #[test]
    fn test_from_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bbob_f001_i01_d10, 79.48").unwrap();
        writeln!(file, "bbob_f002_i01_d10,-209.88").unwrap();
        let r = OptimaReference::from_csv(file.path()).unwrap();
        assert_eq!(r.len(), 2);
        assert_eq!(r.optimum_for("f002_i01"), Some(-209.88));
    }

    #[test]
    fn test_from_csv_rejects_bad_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bbob_f001_i01_d10,abc").unwrap();
        assert!(matches!(
            OptimaReference::from_csv(file.path()),
            Err(AnalizarError::MalformedReference { row: 0, .. })
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "f001,1.0").unwrap();
        assert!(OptimaReference::from_csv(file.path()).is_err());
    }
}
