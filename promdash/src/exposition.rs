//! Prometheus text exposition format reader.
//!
//! Produces one [`Entry`] per `# HELP`, `# TYPE` and sample line. Other
//! comments and blank lines are skipped. A line that cannot be read yields a
//! [`PromdashError::Parse`] and reading continues with the next line.

use crate::ingest::{Entry, NAME_LABEL};
use crate::{PromdashError, PromdashResult};
use std::collections::BTreeMap;

/// Read every entry of `text`, reporting bad lines individually
pub fn parse_exposition(text: &str) -> impl Iterator<Item = PromdashResult<Entry>> + '_ {
    text.lines().enumerate().filter_map(|(index, line)| {
        parse_line(line)
            .map_err(|message| PromdashError::parse(index + 1, message))
            .transpose()
    })
}

/// Read a single line; `Ok(None)` for blank lines and plain comments
pub fn parse_line(line: &str) -> Result<Option<Entry>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    match line.strip_prefix('#') {
        Some(comment) => parse_comment(comment),
        None => parse_sample(line).map(Some),
    }
}

fn parse_comment(comment: &str) -> Result<Option<Entry>, String> {
    let (keyword, rest) = split_token(comment);
    match keyword {
        "HELP" => {
            let (name, help) = split_token(rest);
            if name.is_empty() {
                return Err("HELP line without metric name".to_string());
            }
            Ok(Some(Entry::help(name, unescape_help(help))))
        }
        "TYPE" => {
            let (name, rest) = split_token(rest);
            let (metric_type, _) = split_token(rest);
            if name.is_empty() || metric_type.is_empty() {
                return Err("TYPE line needs a metric name and a type".to_string());
            }
            Ok(Some(Entry::metric_type(name, metric_type)))
        }
        _ => Ok(None),
    }
}

fn parse_sample(line: &str) -> Result<Entry, String> {
    let name_end = line
        .find(|c: char| !is_name_char(c))
        .unwrap_or(line.len());
    let name = &line[..name_end];
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(format!("invalid metric name in '{}'", line));
    }

    let mut rest = &line[name_end..];
    let mut labels = BTreeMap::new();
    if let Some(label_set) = rest.strip_prefix('{') {
        let (parsed, after) = parse_labels(label_set)?;
        labels = parsed;
        rest = after;
    } else if !rest.starts_with(char::is_whitespace) {
        return Err(format!("invalid character in metric name '{}'", line));
    }

    let mut fields = rest.split_whitespace();
    let value = fields
        .next()
        .ok_or_else(|| format!("missing value for '{}'", name))?;
    parse_value(value)?;

    if let Some(timestamp) = fields.next() {
        timestamp
            .parse::<i64>()
            .map_err(|_| format!("invalid timestamp '{}'", timestamp))?;
    }
    if let Some(extra) = fields.next() {
        return Err(format!("unexpected content '{}' after sample", extra));
    }

    labels.insert(NAME_LABEL.to_string(), name.to_string());
    Ok(Entry::Sample { labels })
}

/// Parse `name="value",...}` returning the labels and the text after `}`
fn parse_labels(input: &str) -> Result<(BTreeMap<String, String>, &str), String> {
    let mut labels = BTreeMap::new();
    let mut rest = input.trim_start();

    loop {
        if let Some(after) = rest.strip_prefix('}') {
            return Ok((labels, after));
        }
        if rest.is_empty() {
            return Err("unterminated label set".to_string());
        }

        let eq = rest
            .find('=')
            .ok_or_else(|| "label without value".to_string())?;
        let key = rest[..eq].trim();
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(format!("invalid label name '{}'", key));
        }

        let quoted = rest[eq + 1..]
            .trim_start()
            .strip_prefix('"')
            .ok_or_else(|| format!("value of label '{}' must be quoted", key))?;
        let (value, after) = parse_quoted(quoted)
            .ok_or_else(|| format!("unterminated value for label '{}'", key))?;
        labels.insert(key.to_string(), value);

        rest = after.trim_start();
        if let Some(after) = rest.strip_prefix(',') {
            rest = after.trim_start();
        } else if !rest.starts_with('}') {
            return Err(format!("expected ',' or '}}' after label '{}'", key));
        }
    }
}

/// Read a quoted label value up to its closing quote
fn parse_quoted(input: &str) -> Option<(String, &str)> {
    let mut value = String::new();
    let mut chars = input.char_indices();

    while let Some((index, c)) = chars.next() {
        match c {
            '"' => return Some((value, &input[index + 1..])),
            '\\' => match chars.next()? {
                (_, 'n') => value.push('\n'),
                (_, escaped) => value.push(escaped),
            },
            _ => value.push(c),
        }
    }

    None
}

fn parse_value(value: &str) -> Result<f64, String> {
    match value {
        "+Inf" | "Inf" => Ok(f64::INFINITY),
        "-Inf" => Ok(f64::NEG_INFINITY),
        "NaN" => Ok(f64::NAN),
        _ => value
            .parse()
            .map_err(|_| format!("invalid sample value '{}'", value)),
    }
}

fn unescape_help(help: &str) -> String {
    let mut out = String::with_capacity(help.len());
    let mut chars = help.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

fn split_token(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(end) => (&s[..end], s[end..].trim_start()),
        None => (s, ""),
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == ':'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_labels(entry: Entry) -> BTreeMap<String, String> {
        match entry {
            Entry::Sample { labels } => labels,
            other => panic!("expected sample, got {:?}", other),
        }
    }

    #[test]
    fn test_help_and_type_lines() {
        assert_eq!(
            parse_line("# HELP up Target is up\\nor down \\\\ maybe").unwrap(),
            Some(Entry::help("up", "Target is up\nor down \\ maybe"))
        );
        assert_eq!(
            parse_line("# TYPE http_requests_total counter").unwrap(),
            Some(Entry::metric_type("http_requests_total", "counter"))
        );
        assert_eq!(
            parse_line("# HELP quiet").unwrap(),
            Some(Entry::help("quiet", ""))
        );
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("   ").unwrap(), None);
        assert_eq!(parse_line("# scraped from node-1").unwrap(), None);
    }

    #[test]
    fn test_sample_with_labels() {
        let entry = parse_line(r#"http_requests_total{method="post",code="200"} 1027 1395066363000"#)
            .unwrap()
            .unwrap();
        let labels = sample_labels(entry);
        assert_eq!(labels["__name__"], "http_requests_total");
        assert_eq!(labels["method"], "post");
        assert_eq!(labels["code"], "200");
    }

    #[test]
    fn test_quoted_values_with_escapes_and_separators() {
        let entry = parse_line(r#"msdos_file_access_time_seconds{path="C:\\DIR\\FILE.TXT",error="Cannot find file:\n\"FILE.TXT\"",set="{a,b}",} 1.458255915e9"#)
            .unwrap()
            .unwrap();
        let labels = sample_labels(entry);
        assert_eq!(labels["path"], "C:\\DIR\\FILE.TXT");
        assert_eq!(labels["error"], "Cannot find file:\n\"FILE.TXT\"");
        assert_eq!(labels["set"], "{a,b}");
    }

    #[test]
    fn test_special_values() {
        assert!(parse_line("go_gc_pause{quantile=\"1\"} +Inf").is_ok());
        assert!(parse_line("ratio NaN").is_ok());
        assert!(parse_line("delta -Inf").is_ok());
        assert!(parse_line("metric_without_timestamp_and_labels 12.47").is_ok());
    }

    #[test]
    fn test_malformed_lines() {
        assert!(parse_line("no_value").is_err());
        assert!(parse_line("bad{label=unquoted} 1").is_err());
        assert!(parse_line("bad{label=\"open} 1").is_err());
        assert!(parse_line("x 1 notatimestamp").is_err());
        assert!(parse_line("9lives 1").is_err());
        assert!(parse_line("dash-name 1").is_err());
        assert!(parse_line("# TYPE lonely").is_err());
    }

    #[test]
    fn test_errors_carry_line_numbers_and_parsing_continues() {
        let text = "# TYPE up gauge\nup{job=\"a\"} 1\nbroken{ 1\nup{job=\"b\"} 0\n";
        let results: Vec<_> = parse_exposition(text).collect();
        assert_eq!(results.len(), 4);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[2],
            Err(PromdashError::Parse { line: 3, .. })
        ));
        assert!(results[3].is_ok());
    }
}
