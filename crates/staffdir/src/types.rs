use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder for a field that is missing or failed validation.
pub const NA: &str = "NA";

/// One element of a directory page, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockItem {
    /// Section header (an `h3`), already stripped.
    Header(String),
    /// A `p` element: its full text content and the texts of its links.
    Paragraph { text: String, links: Vec<String> },
}

/// Everything found inside the page's staff container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaffBlock {
    items: Vec<BlockItem>,
}

impl StaffBlock {
    pub fn new(items: Vec<BlockItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[BlockItem] {
        &self.items
    }

    /// Paragraphs with their ordinal among paragraphs (not among all items).
    pub fn paragraphs(&self) -> impl Iterator<Item = (usize, &str, &[String])> {
        self.items
            .iter()
            .filter_map(|item| match item {
                BlockItem::Paragraph { text, links } => Some((text.as_str(), links.as_slice())),
                BlockItem::Header(_) => None,
            })
            .enumerate()
            .map(|(i, (text, links))| (i, text, links))
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|item| match item {
            BlockItem::Header(label) => Some(label.as_str()),
            BlockItem::Paragraph { .. } => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub name: String,
    pub title: String,
    pub email: String,
    pub phone: String,
    pub office: String,
}

impl PersonRecord {
    pub fn has_email(&self) -> bool {
        self.email != NA
    }

    pub fn has_phone(&self) -> bool {
        self.phone != NA
    }
}

impl Display for PersonRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.name, self.title)?;
        if self.has_email() {
            write!(f, " <{}>", self.email)?;
        }
        if self.has_phone() {
            write!(f, " tel. {}", self.phone)?;
        }
        if !self.office.is_empty() {
            write!(f, " [{}]", self.office)?;
        }
        Ok(())
    }
}

/// Half-open range of table rows. `end: None` runs to the last row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRange {
    pub start: usize,
    pub end: Option<usize>,
}

impl RowRange {
    pub fn new(start: usize, end: Option<usize>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, row: usize) -> bool {
        row >= self.start && self.end.is_none_or(|end| row < end)
    }

    pub fn is_empty(&self) -> bool {
        self.end.is_some_and(|end| end <= self.start)
    }
}

impl Display for RowRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.end {
            None => write!(f, "{}-", self.start),
            Some(end) if self.start.checked_add(1) == Some(end) => write!(f, "{}", self.start),
            Some(end) if end <= self.start => write!(f, "none"),
            Some(end) => write!(f, "{}-{}", self.start, end - 1),
        }
    }
}

/// An office header and the rows listed under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficeSection {
    pub label: String,
    pub rows: RowRange,
}

impl Display for OfficeSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (rows {})", self.label, self.rows)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid row range '{0}'. Expected comma separated 'a-b', 'a' or 'a-' with a <= b")]
pub struct RowRangeParseError(String);

/// Fixed row ranges paired with office headers by position.
///
/// Written as `0-6,7-11,12,13-`: bounds are inclusive and a trailing `-`
/// leaves the range open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRangePolicy {
    ranges: Vec<RowRange>,
}

impl RowRangePolicy {
    pub fn new(ranges: Vec<RowRange>) -> Self {
        Self { ranges }
    }

    pub fn ranges(&self) -> &[RowRange] {
        &self.ranges
    }
}

impl Default for RowRangePolicy {
    /// Layout of the Katz staff page: Midtown, Wall Street, Online, Remote.
    fn default() -> Self {
        Self::new(vec![
            RowRange::new(0, Some(7)),
            RowRange::new(7, Some(12)),
            RowRange::new(12, Some(13)),
            RowRange::new(13, None),
        ])
    }
}

impl FromStr for RowRangePolicy {
    type Err = RowRangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RowRangeParseError(s.to_string());
        let parse_bound = |b: &str| b.trim().parse::<usize>().map_err(|_| invalid());

        let mut ranges = Vec::new();
        for part in s.split(',').map(str::trim) {
            let range = match part.split_once('-') {
                Some((start, "")) => RowRange::new(parse_bound(start)?, None),
                Some((start, end)) => {
                    let (start, end) = (parse_bound(start)?, parse_bound(end)?);
                    if start > end {
                        return Err(invalid());
                    }
                    RowRange::new(start, Some(end.checked_add(1).ok_or_else(invalid)?))
                }
                None => {
                    let row = parse_bound(part)?;
                    RowRange::new(row, Some(row.checked_add(1).ok_or_else(invalid)?))
                }
            };
            ranges.push(range);
        }

        Ok(Self::new(ranges))
    }
}

impl Display for RowRangePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.ranges.iter().map(|r| r.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

/// How people are matched to office headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OfficeAssignment {
    /// Each person belongs to the nearest header above them on the page.
    #[default]
    Structural,
    /// Headers own fixed row ranges, in header order.
    RowRanges(RowRangePolicy),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffDirectory {
    pub source: String,
    pub fetched_at: Option<DateTime<Utc>>,
    pub offices: Vec<OfficeSection>,
    pub records: Vec<PersonRecord>,
}

impl Display for StaffDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "┌─ Staff directory ─ {}", self.source)?;
        if let Some(fetched_at) = self.fetched_at {
            writeln!(f, "│  Fetched: {}", fetched_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        }
        for office in &self.offices {
            writeln!(f, "│  Office: {}", office)?;
        }
        writeln!(
            f,
            "└─ {} people in {} office(s)",
            self.records.len(),
            self.offices.len()
        )?;
        writeln!(f)?;
        for (i, record) in self.records.iter().enumerate() {
            writeln!(f, "{:>3}. {}", i + 1, record)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_range_policy_from_str() {
        let policy: RowRangePolicy = "0-6,7-11,12,13-".parse().expect("valid policy");
        assert_eq!(policy, RowRangePolicy::default());
        assert_eq!(policy.to_string(), "0-6,7-11,12,13-");
    }

    #[test]
    fn test_row_range_policy_rejects_garbage() {
        assert!("".parse::<RowRangePolicy>().is_err());
        assert!("3-1".parse::<RowRangePolicy>().is_err());
        assert!("a-b".parse::<RowRangePolicy>().is_err());
        assert!("0-6,,7".parse::<RowRangePolicy>().is_err());
    }

    #[test]
    fn test_row_range_policy_rejects_overflow() {
        let max = usize::MAX;
        assert!(max.to_string().parse::<RowRangePolicy>().is_err());
        assert!(format!("0-{max}").parse::<RowRangePolicy>().is_err());

        let open: RowRangePolicy = format!("{max}-").parse().expect("open range at max");
        assert_eq!(open.ranges(), &[RowRange::new(max, None)]);
    }

    #[test]
    fn test_row_range_display_at_max() {
        assert_eq!(RowRange::new(usize::MAX, Some(5)).to_string(), "none");
    }

    #[test]
    fn test_row_range_contains() {
        let closed = RowRange::new(7, Some(12));
        assert!(!closed.contains(6));
        assert!(closed.contains(7));
        assert!(closed.contains(11));
        assert!(!closed.contains(12));

        let open = RowRange::new(13, None);
        assert!(open.contains(13));
        assert!(open.contains(500));
        assert!(!open.contains(12));

        assert!(RowRange::new(4, Some(4)).is_empty());
        assert_eq!(RowRange::new(4, Some(4)).to_string(), "none");
    }

    #[test]
    fn test_staff_block_paragraph_ordinals_skip_headers() {
        let block = StaffBlock::new(vec![
            BlockItem::Header("Midtown".to_string()),
            BlockItem::Paragraph {
                text: "Jane Doe, Director".to_string(),
                links: vec![],
            },
            BlockItem::Header("Remote".to_string()),
            BlockItem::Paragraph {
                text: "John Roe, Analyst".to_string(),
                links: vec!["john.roe@yu.edu".to_string()],
            },
        ]);

        let paragraphs: Vec<_> = block.paragraphs().map(|(i, text, _)| (i, text)).collect();
        assert_eq!(
            paragraphs,
            vec![(0, "Jane Doe, Director"), (1, "John Roe, Analyst")]
        );
        assert_eq!(block.headers().collect::<Vec<_>>(), vec!["Midtown", "Remote"]);
    }

    #[test]
    fn test_person_record_display_hides_sentinels() {
        let record = PersonRecord {
            name: "Jane Doe".to_string(),
            title: "Director".to_string(),
            email: NA.to_string(),
            phone: NA.to_string(),
            office: String::new(),
        };
        assert_eq!(record.to_string(), "Jane Doe, Director");
    }
}
