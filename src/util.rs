use crate::{IdhStatus, MgmtStatus};
use serde::{Deserialize, Deserializer};
use std::{fs, io, path::Path, sync::Arc};

/// Converts a not found error to Ok(false)
pub fn path_exists(path: &Path) -> io::Result<bool> {
    match fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound) => Ok(false),
        Err(e) => Err(e),
    }
}

// Helpers for serde to parse extract fields with quirks.

/// Parse a string, but map "null" to `None` (in addition to the default
/// "" -> None mapping)
pub fn optional_string<'de, D>(d: D) -> Result<Option<Arc<str>>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(d)?;
    if s.eq_ignore_ascii_case("null") || s.is_empty() {
        Ok(None)
    } else {
        Ok(Some(s.into()))
    }
}

/// Parse an IDH status, mapping missing/"null" to the unknown category.
pub fn idh_or_unknown<'de, D>(d: D) -> Result<IdhStatus, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let s: String = Deserialize::deserialize(d)?;
    match s.as_str() {
        "" => Ok(IdhStatus::Unknown),
        s if s.eq_ignore_ascii_case("null") => Ok(IdhStatus::Unknown),
        "wildtype" => Ok(IdhStatus::Wildtype),
        "mutant" => Ok(IdhStatus::Mutant),
        "unknown" => Ok(IdhStatus::Unknown),
        other => Err(Error::custom(format!("invalid IDH status \"{}\"", other))),
    }
}

/// Parse an MGMT status, mapping missing/"null" to the unknown category.
pub fn mgmt_or_unknown<'de, D>(d: D) -> Result<MgmtStatus, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let s: String = Deserialize::deserialize(d)?;
    match s.as_str() {
        "" => Ok(MgmtStatus::Unknown),
        s if s.eq_ignore_ascii_case("null") => Ok(MgmtStatus::Unknown),
        "methylated" => Ok(MgmtStatus::Methylated),
        "unmethylated" => Ok(MgmtStatus::Unmethylated),
        "unknown" => Ok(MgmtStatus::Unknown),
        other => Err(Error::custom(format!("invalid MGMT status \"{}\"", other))),
    }
}

// Report output helpers.

pub fn header(header: &str) {
    let len = header.len();
    print!("\n{}\n", header);
    for _ in 0..len {
        print!("=");
    }
    println!("\n")
}

/// Format `count` as a percentage of `total`, with a zero-denominator guard.
pub fn percent(count: usize, total: usize) -> String {
    if total == 0 {
        "-".into()
    } else {
        format!("{:.1}%", count as f64 / total as f64 * 100.)
    }
}

/// Format an optional day count for a table cell.
pub fn fmt_opt_days(days: Option<f64>) -> String {
    match days {
        Some(days) => format!("{:.1}", days),
        None => "-".into(),
    }
}

#[cfg(test)]
mod test {
    use super::percent;

    #[test]
    fn percent_guards_zero_denominator() {
        assert_eq!(percent(1, 0), "-");
        assert_eq!(percent(1, 4), "25.0%");
    }
}
