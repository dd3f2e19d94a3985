use std::sync::LazyLock;

use crate::types::{
    BlockItem, NA, OfficeAssignment, OfficeSection, PersonRecord, RowRange, RowRangePolicy,
    StaffBlock, StaffDirectory,
};

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Separates person entries that share one paragraph.
pub const ENTRY_DELIMITER: &str = "\u{a0}\n\u{a0}\n";

const APPOINTMENT_LABEL: &str = "Schedule an Appointment";

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Missing staff block: no element matches 'div.text-only'")]
    MissingBlock,
    #[error("Malformed entry (paragraph {paragraph}, segment {segment}): expected 'Name, Title'")]
    MissingComma { paragraph: usize, segment: usize },
    #[error("No email for entry {index} (paragraph {paragraph}, segment {segment})")]
    MissingEmail {
        paragraph: usize,
        segment: usize,
        index: usize,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),
    #[error(
        "Column lengths differ: {names} names, {titles} titles, {emails} emails, {phones} phones"
    )]
    ShapeMismatch {
        names: usize,
        titles: usize,
        emails: usize,
        phones: usize,
    },
    #[error("Row-range policy has {ranges} range(s) but the page lists {offices} office(s)")]
    OfficeCount { ranges: usize, offices: usize },
}

/// Output of the per-field passes, one column each. `offices` holds header labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaffColumns {
    pub names: Vec<String>,
    pub titles: Vec<String>,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub offices: Vec<String>,
}

static SEL_BLOCK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.text-only").expect("invalid selector: block"));
static SEL_ITEMS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h3, p").expect("invalid selector: items"));
static SEL_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("invalid selector: link"));

static RE_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("invalid regex: email")
});
static RE_PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\+\d{1,3}\s?)?(\d{3}[-\s]?\d{3}[-\s]?\d{4})").expect("invalid regex: phone")
});

fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

/// Reads the first staff container of a page into a [`StaffBlock`].
pub fn parse_staff_block(html: &str) -> Result<StaffBlock, ParseError> {
    let document = Html::parse_document(html);

    let block = document
        .select(&SEL_BLOCK)
        .next()
        .ok_or(ParseError::MissingBlock)?;

    let items = block
        .select(&SEL_ITEMS)
        .map(|element| {
            if element.value().name() == "h3" {
                BlockItem::Header(elem_text(element).trim().to_string())
            } else {
                BlockItem::Paragraph {
                    text: elem_text(element),
                    links: element.select(&SEL_LINK).map(elem_text).collect(),
                }
            }
        })
        .collect::<Vec<_>>();

    log::debug!("Staff block holds {} item(s)", items.len());
    Ok(StaffBlock::new(items))
}

/// Splits paragraph text into entries. Spacer paragraphs yield nothing.
fn entry_segments(text: &str) -> Vec<&str> {
    text.split(ENTRY_DELIMITER)
        .filter(|segment| !segment.trim().is_empty())
        .collect()
}

fn name_of(entry: &str) -> String {
    entry
        .split(',')
        .next()
        .map(str::trim)
        .unwrap_or_default()
        .to_string()
}

/// Text after the first comma, cut before the email (or the phone number,
/// or the end of the line when there is no usable email).
fn title_of(entry: &str, email: &str) -> Option<String> {
    let (_, rest) = entry.split_once(',')?;

    let rest = if email != NA {
        match rest.find(email) {
            Some(end) => &rest[..end],
            None => rest,
        }
    } else {
        rest.trim_start().lines().next().unwrap_or_default()
    };

    let rest = match RE_PHONE.find(rest) {
        Some(m) => &rest[..m.start()],
        None => rest,
    };

    Some(rest.trim().to_string())
}

fn phone_of(entry: &str) -> String {
    RE_PHONE
        .captures(entry)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| NA.to_string())
}

fn validate_email(text: &str) -> String {
    let candidate = text.trim();
    if RE_EMAIL.is_match(candidate) {
        candidate.to_string()
    } else {
        log::debug!("Link text '{}' is not an email address, using {}", candidate, NA);
        NA.to_string()
    }
}

fn is_appointment_link(text: &str) -> bool {
    text.contains(APPOINTMENT_LABEL)
}

pub fn extract_names(block: &StaffBlock) -> Vec<String> {
    block
        .paragraphs()
        .flat_map(|(_, text, _)| entry_segments(text))
        .map(name_of)
        .filter(|name| !name.is_empty())
        .collect()
}

/// Link texts of every paragraph, minus appointment links. Texts that do not
/// look like an address become [`NA`].
pub fn extract_emails(block: &StaffBlock) -> Vec<String> {
    block
        .paragraphs()
        .flat_map(|(_, _, links)| links.iter())
        .filter(|link| !is_appointment_link(link))
        .map(|link| validate_email(link))
        .collect()
}

/// Titles for every entry, using `emails[i]` as the end marker of entry `i`.
pub fn extract_titles(block: &StaffBlock, emails: &[String]) -> Result<Vec<String>, ParseError> {
    let mut titles = Vec::new();
    let mut index = 0;

    for (paragraph, text, _) in block.paragraphs() {
        for (segment, entry) in entry_segments(text).into_iter().enumerate() {
            let email = emails.get(index).ok_or(ParseError::MissingEmail {
                paragraph,
                segment,
                index,
            })?;
            let title =
                title_of(entry, email).ok_or(ParseError::MissingComma { paragraph, segment })?;
            titles.push(title);
            index += 1;
        }
    }

    Ok(titles)
}

pub fn extract_offices(block: &StaffBlock) -> Vec<String> {
    block.headers().map(str::to_string).collect()
}

pub fn extract_phones(block: &StaffBlock) -> Vec<String> {
    block
        .paragraphs()
        .flat_map(|(_, text, _)| entry_segments(text))
        .map(phone_of)
        .collect()
}

/// Runs every per-field pass over the block.
pub fn extract_staff_details(block: &StaffBlock) -> Result<StaffColumns, ParseError> {
    let names = extract_names(block);
    let emails = extract_emails(block);
    let titles = extract_titles(block, &emails)?;
    let offices = extract_offices(block);
    let phones = extract_phones(block);

    Ok(StaffColumns {
        names,
        titles,
        emails,
        phones,
        offices,
    })
}

/// Pairs office labels with the policy's ranges, in order.
pub fn row_range_sections(
    policy: &RowRangePolicy,
    offices: &[String],
) -> Result<Vec<OfficeSection>, ExtractError> {
    let ranges = policy.ranges();
    if ranges.len() > offices.len() {
        return Err(ExtractError::OfficeCount {
            ranges: ranges.len(),
            offices: offices.len(),
        });
    }
    if offices.len() > ranges.len() {
        log::warn!(
            "{} office header(s) have no row range and will not be assigned",
            offices.len() - ranges.len()
        );
    }

    Ok(offices
        .iter()
        .zip(ranges)
        .map(|(label, rows)| OfficeSection {
            label: label.clone(),
            rows: *rows,
        })
        .collect())
}

/// Zips the columns into rows. When sections overlap the later one wins;
/// rows outside every section get an empty office.
pub fn assemble(
    names: Vec<String>,
    titles: Vec<String>,
    emails: Vec<String>,
    phones: Vec<String>,
    sections: &[OfficeSection],
) -> Result<Vec<PersonRecord>, ExtractError> {
    let rows = names.len();
    if titles.len() != rows || emails.len() != rows || phones.len() != rows {
        return Err(ExtractError::ShapeMismatch {
            names: rows,
            titles: titles.len(),
            emails: emails.len(),
            phones: phones.len(),
        });
    }

    let records = names
        .into_iter()
        .zip(titles)
        .zip(emails)
        .zip(phones)
        .enumerate()
        .map(|(row, (((name, title), email), phone))| {
            let office = sections
                .iter()
                .rev()
                .find(|section| section.rows.contains(row))
                .map(|section| section.label.clone())
                .unwrap_or_default();
            PersonRecord {
                name,
                title,
                email,
                phone,
                office,
            }
        })
        .collect();

    Ok(records)
}

/// One person's slice of the page before any field is interpreted.
#[derive(Debug)]
struct RawEntry<'a> {
    paragraph: usize,
    segment: usize,
    text: &'a str,
    links: Vec<&'a str>,
    office: Option<&'a str>,
}

impl RawEntry<'_> {
    fn into_record(self) -> Result<PersonRecord, ParseError> {
        let name = name_of(self.text);
        if name.is_empty() {
            log::warn!(
                "Entry in paragraph {}, segment {} has no name",
                self.paragraph,
                self.segment
            );
        }

        let email = self
            .links
            .iter()
            .find(|link| !is_appointment_link(link))
            .map(|link| validate_email(link))
            .unwrap_or_else(|| NA.to_string());

        let title = title_of(self.text, &email).ok_or(ParseError::MissingComma {
            paragraph: self.paragraph,
            segment: self.segment,
        })?;

        Ok(PersonRecord {
            name,
            title,
            email,
            phone: phone_of(self.text),
            office: self.office.unwrap_or_default().to_string(),
        })
    }
}

/// Walks the block once, tagging each entry with the header above it and
/// recording which rows each header owns.
fn walk_entries(block: &StaffBlock) -> (Vec<RawEntry<'_>>, Vec<OfficeSection>) {
    let mut entries = Vec::new();
    let mut sections: Vec<OfficeSection> = Vec::new();
    let mut current: Option<&str> = None;
    let mut paragraph = 0;

    for item in block.items() {
        match item {
            BlockItem::Header(label) => {
                if let Some(last) = sections.last_mut() {
                    last.rows.end = Some(entries.len());
                }
                sections.push(OfficeSection {
                    label: label.clone(),
                    rows: RowRange::new(entries.len(), None),
                });
                current = Some(label.as_str());
            }
            BlockItem::Paragraph { text, links } => {
                for (segment, entry) in entry_segments(text).into_iter().enumerate() {
                    let links = links
                        .iter()
                        .map(|link| link.trim())
                        .filter(|link| !link.is_empty() && entry.contains(link))
                        .collect();
                    entries.push(RawEntry {
                        paragraph,
                        segment,
                        text: entry,
                        links,
                        office: current,
                    });
                }
                paragraph += 1;
            }
        }
    }

    if let Some(last) = sections.last_mut()
        && entries.len() <= last.rows.start
    {
        last.rows.end = Some(last.rows.start);
    }

    for section in sections.iter().filter(|s| s.rows.is_empty()) {
        log::warn!("Office '{}' lists nobody", section.label);
    }

    (entries, sections)
}

/// Office sections as laid out on the page.
pub fn office_sections(block: &StaffBlock) -> Vec<OfficeSection> {
    walk_entries(block).1
}

/// Builds every record in a single pass over the block. Each entry keeps
/// only the links whose text occurs inside it, so fields never drift apart.
pub fn extract_records(block: &StaffBlock) -> Result<Vec<PersonRecord>, ParseError> {
    walk_entries(block)
        .0
        .into_iter()
        .map(RawEntry::into_record)
        .collect()
}

/// Extracts records and office sections using the chosen assignment mode.
pub fn extract_directory(
    block: &StaffBlock,
    assignment: &OfficeAssignment,
) -> Result<(Vec<OfficeSection>, Vec<PersonRecord>), ExtractError> {
    match assignment {
        OfficeAssignment::Structural => {
            let (entries, sections) = walk_entries(block);
            let records = entries
                .into_iter()
                .map(RawEntry::into_record)
                .collect::<Result<Vec<_>, _>>()?;
            Ok((sections, records))
        }
        OfficeAssignment::RowRanges(policy) => {
            let columns = extract_staff_details(block)?;
            let sections = row_range_sections(policy, &columns.offices)?;
            let records = assemble(
                columns.names,
                columns.titles,
                columns.emails,
                columns.phones,
                &sections,
            )?;
            Ok((sections, records))
        }
    }
}

pub fn parse_staff_directory(
    html: &str,
    source: &str,
    assignment: &OfficeAssignment,
) -> Result<StaffDirectory, ExtractError> {
    let block = parse_staff_block(html)?;
    let (offices, records) = extract_directory(&block, assignment)?;
    log::info!(
        "Extracted {} people in {} office(s) from {}",
        records.len(),
        offices.len(),
        source
    );

    Ok(StaffDirectory {
        source: source.to_string(),
        fetched_at: None,
        offices,
        records,
    })
}
