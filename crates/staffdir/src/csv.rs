use std::io::{self, Write};

use crate::types::PersonRecord;

pub const HEADER: [&str; 5] = ["name", "title", "email", "phone", "office"];

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn write_row<W: Write>(w: &mut W, row: &[&str]) -> io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            write!(w, ",")?;
        }
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}

/// Writes the header line and one row per record.
pub fn write_records<W: Write>(mut w: W, records: &[PersonRecord]) -> io::Result<()> {
    write_row(&mut w, &HEADER)?;
    for r in records {
        write_row(
            &mut w,
            &[
                r.name.as_str(),
                r.title.as_str(),
                r.email.as_str(),
                r.phone.as_str(),
                r.office.as_str(),
            ],
        )?;
    }
    w.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_records_quotes_when_needed() {
        let records = vec![PersonRecord {
            name: "Jane Doe".to_string(),
            title: "Director, \"Acting\"".to_string(),
            email: "jane.doe@yu.edu".to_string(),
            phone: "NA".to_string(),
            office: "Wall Street".to_string(),
        }];

        let mut out = Vec::new();
        write_records(&mut out, &records).expect("write to vec");
        let text = String::from_utf8(out).expect("utf8");

        assert_eq!(
            text,
            "name,title,email,phone,office\nJane Doe,\"Director, \"\"Acting\"\"\",jane.doe@yu.edu,NA,Wall Street\n"
        );
    }
}
