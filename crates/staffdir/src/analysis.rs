use std::collections::HashMap;
use std::fmt::Display;

use crate::types::PersonRecord;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Occurrences per distinct value, most frequent first. Ties keep the order
/// in which values were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValueCounts(Vec<ValueCount>);

impl ValueCounts {
    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut counts: Vec<ValueCount> = Vec::new();
        let mut seen: HashMap<&str, usize> = HashMap::new();

        for value in values {
            match seen.get(value) {
                Some(&i) => counts[i].count += 1,
                None => {
                    seen.insert(value, counts.len());
                    counts.push(ValueCount {
                        value: value.to_string(),
                        count: 1,
                    });
                }
            }
        }

        counts.sort_by(|a, b| b.count.cmp(&a.count));
        Self(counts)
    }

    pub fn get(&self, value: &str) -> Option<usize> {
        self.0.iter().find(|c| c.value == value).map(|c| c.count)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValueCount> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for ValueCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let width = self.0.iter().map(|c| c.value.chars().count()).max().unwrap_or(0);
        for c in &self.0 {
            writeln!(f, "  {:<width$}  {:>4}", c.value, c.count, width = width)?;
        }
        Ok(())
    }
}

pub fn title_distribution(records: &[PersonRecord]) -> ValueCounts {
    ValueCounts::from_values(records.iter().map(|r| r.title.as_str()))
}

/// Counts the part after the last `@`. Records without an address are skipped.
pub fn email_domain_analysis(records: &[PersonRecord]) -> ValueCounts {
    ValueCounts::from_values(
        records
            .iter()
            .filter_map(|r| r.email.rsplit_once('@').map(|(_, domain)| domain)),
    )
}

/// `Yes`/`No` per record, by whether a phone number was found.
pub fn phone_number_availability(records: &[PersonRecord]) -> ValueCounts {
    ValueCounts::from_values(
        records
            .iter()
            .map(|r| if r.has_phone() { "Yes" } else { "No" }),
    )
}

pub fn office_staff_count(records: &[PersonRecord]) -> ValueCounts {
    ValueCounts::from_values(records.iter().map(|r| r.office.as_str()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffSummary {
    pub total: usize,
    pub titles: ValueCounts,
    pub email_domains: ValueCounts,
    pub phone_availability: ValueCounts,
    pub offices: ValueCounts,
}

impl StaffSummary {
    pub fn from_records(records: &[PersonRecord]) -> StaffSummary {
        StaffSummary {
            total: records.len(),
            titles: title_distribution(records),
            email_domains: email_domain_analysis(records),
            phone_availability: phone_number_availability(records),
            offices: office_staff_count(records),
        }
    }
}

impl Display for StaffSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nStaff summary ({} people):", self.total)?;
        writeln!(f, "\nOffices:")?;
        write!(f, "{}", self.offices)?;
        writeln!(f, "\nTitles:")?;
        write!(f, "{}", self.titles)?;
        writeln!(f, "\nEmail domains:")?;
        write!(f, "{}", self.email_domains)?;
        writeln!(f, "\nHas phone number:")?;
        write!(f, "{}", self.phone_availability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NA;

    fn record(title: &str, email: &str, phone: &str, office: &str) -> PersonRecord {
        PersonRecord {
            name: "Someone".to_string(),
            title: title.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            office: office.to_string(),
        }
    }

    fn sample() -> Vec<PersonRecord> {
        vec![
            record("Advisor", "a@yu.edu", "646-592-4700", "Midtown"),
            record("Director", "b@mail.yu.edu", NA, "Midtown"),
            record("Advisor", NA, "212-960-5400", "Wall Street"),
            record("Advisor", "c@yu.edu", NA, "Midtown"),
        ]
    }

    #[test]
    fn test_value_counts_order() {
        let counts = ValueCounts::from_values(["b", "a", "b", "c", "a", "b"]);
        let pairs: Vec<_> = counts.iter().map(|c| (c.value.as_str(), c.count)).collect();
        assert_eq!(pairs, vec![("b", 3), ("a", 2), ("c", 1)]);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let counts = ValueCounts::from_values(["x", "y", "z"]);
        let values: Vec<_> = counts.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(values, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_email_domains_skip_sentinel() {
        let domains = email_domain_analysis(&sample());
        assert_eq!(domains.get("yu.edu"), Some(2));
        assert_eq!(domains.get("mail.yu.edu"), Some(1));
        assert_eq!(domains.get(NA), None);
        assert_eq!(domains.len(), 2);
    }

    #[test]
    fn test_phone_availability() {
        let phones = phone_number_availability(&sample());
        assert_eq!(phones.get("Yes"), Some(2));
        assert_eq!(phones.get("No"), Some(2));
    }

    #[test]
    fn test_summary() {
        let summary = StaffSummary::from_records(&sample());
        assert_eq!(summary.total, 4);
        assert_eq!(summary.titles.get("Advisor"), Some(3));
        assert_eq!(summary.offices.get("Midtown"), Some(3));
        assert_eq!(summary.offices.get("Wall Street"), Some(1));

        let text = summary.to_string();
        assert!(text.contains("Staff summary (4 people)"));
        assert!(text.contains("Wall Street"));
    }

    #[test]
    fn test_display_aligns_non_ascii_values() {
        let counts = ValueCounts::from_values(["Zürich", "Zürich", "Online"]);
        let rendered = counts.to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines, vec!["  Zürich     2", "  Online     1"]);
    }

    #[test]
    fn test_summary_serializes_counts_as_arrays() {
        let json = serde_json::to_value(StaffSummary::from_records(&sample())).expect("json");

        assert_eq!(json["total"], 4);
        assert_eq!(
            json["email_domains"],
            serde_json::json!([
                { "value": "yu.edu", "count": 2 },
                { "value": "mail.yu.edu", "count": 1 }
            ])
        );
        assert_eq!(json["phone_availability"][0]["value"], "Yes");
        assert!(json["offices"].is_array());
    }

    #[test]
    fn test_empty_records() {
        let summary = StaffSummary::from_records(&[]);
        assert_eq!(summary.total, 0);
        assert!(summary.titles.is_empty());
        assert!(summary.email_domains.is_empty());
    }
}
