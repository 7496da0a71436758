//! Parses the two stat file shapes cgroup v2 controllers expose (§4.6
//! "Stat file grammar"). Hand-rolled line scanner, same "no regex needed
//! for a small fixed grammar" call as `entity::entity::validate_entity_name`.

use crate::error::OrchestratorError;

/// Parses `contents` into `(headers, values)`, excluding the leading
/// `timestamp` column the caller prepends. Two-column lines (`<key>
/// <value>`) and labeled lines (`<label> k1=v1 k2=v2 ...`) may not be
/// mixed within one file; which shape is present is detected from whether
/// any non-first token contains `=`.
pub fn parse_stat_file(contents: &str) -> Result<(Vec<String>, Vec<String>), OrchestratorError> {
    let lines: Vec<&str> = contents.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }

    let labeled = lines
        .iter()
        .any(|line| line.split_whitespace().skip(1).any(|tok| tok.contains('=')));

    if labeled {
        parse_labeled(&lines)
    } else {
        parse_two_column(&lines)
    }
}

fn parse_two_column(lines: &[&str]) -> Result<(Vec<String>, Vec<String>), OrchestratorError> {
    let mut headers = Vec::new();
    let mut values = Vec::new();
    for line in lines {
        let mut tokens = line.split_whitespace();
        let key = tokens
            .next()
            .ok_or_else(|| OrchestratorError::config(format!("malformed stat line: `{line}`")))?;
        let value = tokens.next().ok_or_else(|| {
            OrchestratorError::config(format!("two-column stat line missing value: `{line}`"))
        })?;
        if tokens.next().is_some() {
            return Err(OrchestratorError::config(format!(
                "unexpected extra tokens in two-column stat line: `{line}`"
            )));
        }
        headers.push(key.to_string());
        values.push(value.to_string());
    }
    Ok((headers, values))
}

fn parse_labeled(lines: &[&str]) -> Result<(Vec<String>, Vec<String>), OrchestratorError> {
    let mut headers = Vec::new();
    let mut values = Vec::new();
    for line in lines {
        let mut tokens = line.split_whitespace();
        let label = tokens
            .next()
            .ok_or_else(|| OrchestratorError::config(format!("malformed labeled stat line: `{line}`")))?;
        for tok in tokens {
            let (key, value) = tok.split_once('=').ok_or_else(|| {
                OrchestratorError::config(format!("malformed key=value token `{tok}` in line `{line}`"))
            })?;
            headers.push(format!("{label}_{key}"));
            values.push(value.to_string());
        }
    }
    Ok((headers, values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_column_shape() {
        let contents = "usage_usec 1234\nuser_usec 1000\nsystem_usec 234\n";
        let (headers, values) = parse_stat_file(contents).unwrap();
        assert_eq!(headers, ["usage_usec", "user_usec", "system_usec"]);
        assert_eq!(values, ["1234", "1000", "234"]);
    }

    #[test]
    fn labeled_shape() {
        let contents = "anon N0=123 N1=456\nfile N0=1 N1=2\n";
        let (headers, values) = parse_stat_file(contents).unwrap();
        assert_eq!(headers, ["anon_N0", "anon_N1", "file_N0", "file_N1"]);
        assert_eq!(values, ["123", "456", "1", "2"]);
    }

    #[test]
    fn empty_file_yields_empty_row() {
        let (headers, values) = parse_stat_file("").unwrap();
        assert!(headers.is_empty());
        assert!(values.is_empty());
    }

    #[test]
    fn malformed_two_column_line_errors() {
        let err = parse_stat_file("key only\nkey value extra\n").unwrap_err();
        assert!(matches!(err, OrchestratorError::Config(_)));
    }
}
