use anyhow::{Context, Result};
use std::path::Path;
use std::str::FromStr;

fn parse_lines<T>(text: &str, what: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let val = trimmed
            .parse::<T>()
            .with_context(|| format!("line {} is not {}: {}", idx + 1, what, trimmed))?;
        out.push(val);
    }
    Ok(out)
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Parse raw sensor counts, one per line. Blank lines and `#` comments are
/// skipped. An empty recording is not an error.
pub fn parse_u32_samples(text: &str) -> Result<Vec<u32>> {
    parse_lines(text, "a non-negative integer sample")
}

pub fn read_u32_samples(path: &Path) -> Result<Vec<u32>> {
    parse_u32_samples(&read_text(path)?)
}

/// Parse newline-delimited floating point series, ignoring blank/comment lines.
pub fn parse_f64_series(text: &str) -> Result<Vec<f64>> {
    let out: Vec<f64> = parse_lines(text, "f64")?;
    if out.is_empty() {
        anyhow::bail!("no numeric samples found");
    }
    Ok(out)
}

pub fn read_f64_series(path: &Path) -> Result<Vec<f64>> {
    parse_f64_series(&read_text(path)?)
}

/// RR intervals in whole milliseconds, one per line.
pub fn parse_rr_ms(text: &str) -> Result<Vec<u32>> {
    parse_lines(text, "an RR interval in ms")
}

pub fn read_rr_ms(path: &Path) -> Result<Vec<u32>> {
    parse_rr_ms(&read_text(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn samples_skip_comments_and_blanks() {
        let text = "# ppg dump\n50123\n\n  50200 \n# gap\n0\n";
        assert_eq!(parse_u32_samples(text).unwrap(), vec![50123, 50200, 0]);
    }

    #[test]
    fn empty_sample_file_is_allowed() {
        assert!(parse_u32_samples("# nothing\n").unwrap().is_empty());
    }

    #[test]
    fn bad_line_is_reported_with_its_number() {
        let err = parse_u32_samples("1\n2\n-3\n").unwrap_err();
        assert!(format!("{err}").contains("line 3"), "{err}");
    }

    #[test]
    fn f64_series_must_not_be_empty() {
        assert!(parse_f64_series("\n# only comments\n").is_err());
        assert_eq!(parse_f64_series("1.5\n-2\n").unwrap(), vec![1.5, -2.0]);
    }

    #[test]
    fn reads_samples_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "10\n20\n30").unwrap();
        assert_eq!(read_u32_samples(file.path()).unwrap(), vec![10, 20, 30]);
        assert_eq!(read_rr_ms(file.path()).unwrap(), vec![10, 20, 30]);
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = read_u32_samples(Path::new("/nonexistent/ppg.txt")).unwrap_err();
        assert!(format!("{err}").contains("/nonexistent/ppg.txt"));
    }
}
