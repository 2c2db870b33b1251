use crate::models::BookRecord;
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Keep/remove constraints over the catalog's metadata columns.
///
/// An empty set places no constraint on its field. A record is included iff
/// every non-empty keep set contains its value and no non-empty remove set
/// does; a value listed on both sides is removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterSpec {
    pub keep: FieldSets,
    pub remove: FieldSets,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldSets {
    pub title: HashSet<String>,
    pub author: HashSet<String>,
    pub genre: HashSet<String>,
}

impl FieldSets {
    fn is_empty(&self) -> bool {
        self.title.is_empty() && self.author.is_empty() && self.genre.is_empty()
    }
}

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        self.keep.is_empty() && self.remove.is_empty()
    }

    pub fn matches(&self, record: &BookRecord) -> bool {
        keep_allows(&self.keep.title, &record.title)
            && keep_allows(&self.keep.author, &record.author)
            && keep_allows(&self.keep.genre, &record.genre)
            && !remove_hits(&self.remove.title, &record.title)
            && !remove_hits(&self.remove.author, &record.author)
            && !remove_hits(&self.remove.genre, &record.genre)
    }
}

fn keep_allows(set: &HashSet<String>, value: &str) -> bool {
    set.is_empty() || set.contains(value)
}

fn remove_hits(set: &HashSet<String>, value: &str) -> bool {
    !set.is_empty() && set.contains(value)
}

/// Filter records and their embedding rows in lockstep, returning new
/// collections. The source catalog is never touched.
pub fn apply(
    records: &[BookRecord],
    matrix: &Array2<f32>,
    spec: &FilterSpec,
) -> (Vec<BookRecord>, Array2<f32>) {
    if spec.is_empty() {
        return (records.to_vec(), matrix.clone());
    }

    let indices: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, record)| spec.matches(record))
        .map(|(index, _)| index)
        .collect();

    let filtered_records = indices.iter().map(|&index| records[index].clone()).collect();
    let filtered_matrix = matrix.select(Axis(0), &indices);

    (filtered_records, filtered_matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn record(title: &str, author: &str, genre: &str) -> BookRecord {
        BookRecord {
            title: title.to_string(),
            author: author.to_string(),
            genre: genre.to_string(),
            description: String::new(),
            embedding: vec![0.0, 0.0],
        }
    }

    fn catalog() -> (Vec<BookRecord>, Array2<f32>) {
        let records = vec![
            record("B1", "X", "Fantasy"),
            record("B2", "Y", "Fantasy"),
            record("B3", "Y", "Horror"),
        ];
        let matrix = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0]];
        (records, matrix)
    }

    fn string_set(values: &[&str]) -> HashSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn empty_spec_is_a_no_op() {
        let (records, matrix) = catalog();

        let (kept, kept_matrix) = apply(&records, &matrix, &FilterSpec::default());

        assert_eq!(kept.len(), 3);
        assert_eq!(kept_matrix, matrix);
    }

    #[test]
    fn keep_and_remove_combine_with_remove_winning() {
        let (records, matrix) = catalog();
        let spec = FilterSpec {
            keep: FieldSets {
                genre: string_set(&["Fantasy"]),
                ..FieldSets::default()
            },
            remove: FieldSets {
                author: string_set(&["X"]),
                ..FieldSets::default()
            },
        };

        let (kept, kept_matrix) = apply(&records, &matrix, &spec);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "B2");
        assert_eq!(kept_matrix, array![[2.0, 0.0]]);
    }

    #[test]
    fn a_value_listed_on_both_sides_is_removed() {
        let (records, matrix) = catalog();
        let spec = FilterSpec {
            keep: FieldSets {
                genre: string_set(&["Fantasy"]),
                ..FieldSets::default()
            },
            remove: FieldSets {
                genre: string_set(&["Fantasy"]),
                ..FieldSets::default()
            },
        };

        let (kept, _) = apply(&records, &matrix, &spec);

        assert!(kept.is_empty());
    }

    #[test]
    fn filtering_everything_away_is_a_valid_outcome() {
        let (records, matrix) = catalog();
        let spec = FilterSpec {
            keep: FieldSets {
                genre: string_set(&["Romance"]),
                ..FieldSets::default()
            },
            ..FilterSpec::default()
        };

        let (kept, kept_matrix) = apply(&records, &matrix, &spec);

        assert!(kept.is_empty());
        assert_eq!(kept_matrix.nrows(), 0);
        assert_eq!(kept_matrix.ncols(), 2);
    }

    #[test]
    fn records_and_rows_stay_aligned_after_filtering() {
        let (records, matrix) = catalog();
        let spec = FilterSpec {
            remove: FieldSets {
                title: string_set(&["B2"]),
                ..FieldSets::default()
            },
            ..FilterSpec::default()
        };

        let (kept, kept_matrix) = apply(&records, &matrix, &spec);

        assert_eq!(kept.len(), kept_matrix.nrows());
        assert_eq!(kept[0].title, "B1");
        assert_eq!(kept_matrix[[0, 0]], 1.0);
        assert_eq!(kept[1].title, "B3");
        assert_eq!(kept_matrix[[1, 0]], 3.0);
    }

    #[test]
    fn the_source_catalog_is_untouched() {
        let (records, matrix) = catalog();
        let spec = FilterSpec {
            remove: FieldSets {
                genre: string_set(&["Fantasy"]),
                ..FieldSets::default()
            },
            ..FilterSpec::default()
        };

        let _ = apply(&records, &matrix, &spec);

        assert_eq!(records.len(), 3);
        assert_eq!(matrix.nrows(), 3);
    }

    #[test]
    fn unknown_filter_fields_are_rejected_at_parse_time() {
        let result =
            serde_json::from_str::<FilterSpec>(r#"{"keep": {"publisher": ["Any"]}}"#);

        assert!(result.is_err());
    }
}
