//! Case-insensitive substring filter.
//!
//! # Invariants
//! - Empty query returns every record.
//! - A record matches when any attribute's lower-cased text contains the
//!   lower-cased query; absent attributes never match.
//! - Output is a stable subsequence of the input.

use crate::model::student::StudentRecord;

/// Returns the records matching `query`, in input order.
pub fn filter_records(records: &[StudentRecord], query: &str) -> Vec<StudentRecord> {
    let needle = query.to_lowercase();
    records
        .iter()
        .filter(|record| contains_needle(record, &needle))
        .cloned()
        .collect()
}

/// Whether one record matches `query`, ignoring case.
pub fn record_matches(record: &StudentRecord, query: &str) -> bool {
    contains_needle(record, &query.to_lowercase())
}

fn contains_needle(record: &StudentRecord, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    record
        .attribute_texts()
        .iter()
        .flatten()
        .any(|value| value.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::{filter_records, record_matches};
    use crate::model::student::StudentRecord;

    fn student(id: &str, name: &str, class_name: &str) -> StudentRecord {
        StudentRecord {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{}@school.test", name.to_lowercase()),
            class_name: class_name.to_string(),
            gender: "female".to_string(),
            subject: String::new(),
            contact: "0100".to_string(),
            year_joined: None,
            img: None,
            timestamp: 1,
        }
    }

    #[test]
    fn empty_query_returns_all_records_in_order() {
        let records = vec![student("b", "Bea", "5A"), student("a", "Amy", "6B")];
        assert_eq!(filter_records(&records, ""), records);
    }

    #[test]
    fn query_matches_class_exactly_one_record() {
        let records = vec![student("1", "Amy", "5A"), student("2", "Ben", "6B")];
        let hits = filter_records(&records, "5A");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "1");
    }

    #[test]
    fn matching_ignores_case_on_both_sides() {
        let records = vec![student("1", "Amy Stone", "5A")];
        assert_eq!(filter_records(&records, "aMY s").len(), 1);
        assert_eq!(filter_records(&records, "STONE@").len(), 1);
    }

    #[test]
    fn record_matches_lowers_mixed_case_query() {
        let record = student("1", "Amy", "5A");
        assert!(record_matches(&record, "5A"));
        assert!(record_matches(&record, "aMy"));
        assert!(record_matches(&record, ""));
        assert!(!record_matches(&record, "6B"));
    }

    #[test]
    fn absent_attributes_do_not_match() {
        let mut with_year = student("1", "Amy", "5A");
        with_year.year_joined = Some("2019".to_string());
        let without_year = student("2", "Ben", "5A");
        let hits = filter_records(&[with_year, without_year], "2019");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "1");
    }

    #[test]
    fn preserves_relative_order_of_matches() {
        let records = vec![
            student("3", "Cat", "5A"),
            student("2", "Ben", "6B"),
            student("1", "Amy", "5A"),
        ];
        let ids = filter_records(&records, "5a")
            .into_iter()
            .map(|record| record.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["3", "1"]);
    }

    #[test]
    fn every_excluded_record_has_no_matching_attribute() {
        let records = vec![
            student("x1", "Amy", "5A"),
            student("x2", "Ben", "6B"),
            student("x3", "Anna", "6A"),
        ];
        let query = "an";
        let hits = filter_records(&records, query);
        for record in &records {
            let matches = record
                .attribute_texts()
                .iter()
                .flatten()
                .any(|value| value.to_lowercase().contains(query));
            assert_eq!(hits.contains(record), matches, "record {}", record.id);
        }
    }
}
