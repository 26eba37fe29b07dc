// crates/pavilion-result/src/parser.rs
// ============================================================================
// Module: Built-In Result Parsers
// Description: Phase B of the result pipeline: the `regex`, `split`,
//              `const`, and `table` parser capabilities, plus `match_select`
//              reduction across a file's matched lines.
// Purpose: Cover the parser kinds every suite map can name without a
//          plugin, per §4.6.
// Dependencies: pavilion-core, regex, serde_json
// ============================================================================

//! ## Overview
//! Each built-in here implements [`ResultParser`]; the engine positions the
//! parser at one matched line per call, so a file with several matched
//! lines produces several [`serde_json::Value`]s, reduced to one by
//! [`MatchSelect::apply`].

use pavilion_core::ParseError;
use pavilion_core::interfaces::ResultParser;
use serde_json::Value;
use serde_json::json;

/// Selects among a parser's per-matched-line results within one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSelect {
    /// The first match.
    First,
    /// The last match.
    Last,
    /// Every match, as a list.
    All,
    /// The match at a specific (0-indexed) position.
    Index(usize),
}

impl MatchSelect {
    /// Parses a `match_select` configuration value: `"first"`, `"last"`,
    /// `"all"`, or an integer index. Defaults to [`Self::First`] for
    /// anything unrecognized.
    #[must_use]
    pub fn parse(raw: &Value) -> Self {
        match raw {
            Value::String(s) if s == "last" => Self::Last,
            Value::String(s) if s == "all" => Self::All,
            Value::String(s) if s == "first" => Self::First,
            Value::Number(n) => n.as_u64().map_or(Self::First, |i| Self::Index(i as usize)),
            _ => Self::First,
        }
    }

    /// Reduces a file's per-matched-line values to the selected result.
    #[must_use]
    pub fn apply(self, matches: Vec<Value>) -> Value {
        match self {
            Self::First => matches.into_iter().next().unwrap_or(Value::Null),
            Self::Last => matches.into_iter().next_back().unwrap_or(Value::Null),
            Self::All => Value::Array(matches),
            Self::Index(index) => matches.into_iter().nth(index).unwrap_or(Value::Null),
        }
    }
}

/// Captures the configured regex's group(s) from the matched line. A
/// single capture group yields its string; more than one yields a list.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexParser;

impl ResultParser for RegexParser {
    fn name(&self) -> &str {
        "regex"
    }

    fn parse(&self, contents: &str, matched_line: usize, args: &Value) -> Result<Value, ParseError> {
        let pattern = args
            .get("regex")
            .and_then(Value::as_str)
            .ok_or_else(|| ParseError::MalformedResult("regex parser requires a 'regex' arg".to_string()))?;
        let re = regex::Regex::new(pattern).map_err(|err| ParseError::InvalidRegex(err.to_string()))?;
        let line = line_at(contents, matched_line)?;
        let Some(captures) = re.captures(line) else {
            return Ok(Value::Null);
        };
        let groups: Vec<Value> = captures
            .iter()
            .skip(1)
            .map(|m| m.map_or(Value::Null, |m| Value::String(m.as_str().to_string())))
            .collect();
        Ok(match groups.len() {
            0 => Value::String(captures.get(0).map(|m| m.as_str()).unwrap_or_default().to_string()),
            1 => groups.into_iter().next().unwrap_or(Value::Null),
            _ => Value::Array(groups),
        })
    }
}

/// Tokenizes the matched line on a configured separator (default
/// whitespace); returns the token at `index` if given, else every token.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitParser;

impl ResultParser for SplitParser {
    fn name(&self) -> &str {
        "split"
    }

    fn parse(&self, contents: &str, matched_line: usize, args: &Value) -> Result<Value, ParseError> {
        let line = line_at(contents, matched_line)?;
        let sep = args.get("sep").and_then(Value::as_str);
        let tokens: Vec<&str> =
            sep.map_or_else(|| line.split_whitespace().collect(), |sep| line.split(sep).collect());
        if let Some(index) = args.get("index").and_then(Value::as_u64) {
            let index = index as usize;
            return Ok(tokens.get(index).map_or(Value::Null, |t| Value::String((*t).to_string())));
        }
        Ok(Value::Array(tokens.into_iter().map(|t| Value::String(t.to_string())).collect()))
    }
}

/// Returns a literal value from its configuration, ignoring file content.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstParser;

impl ResultParser for ConstParser {
    fn name(&self) -> &str {
        "const"
    }

    fn parse(&self, _contents: &str, _matched_line: usize, args: &Value) -> Result<Value, ParseError> {
        Ok(args.get("value").cloned().unwrap_or(Value::Null))
    }
}

/// Reads consecutive non-blank lines following the matched line as table
/// rows, splitting each on whitespace and zipping against `headers`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableParser;

impl ResultParser for TableParser {
    fn name(&self) -> &str {
        "table"
    }

    fn parse(&self, contents: &str, matched_line: usize, args: &Value) -> Result<Value, ParseError> {
        let headers: Vec<String> = args
            .get("headers")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();
        if headers.is_empty() {
            return Err(ParseError::MalformedResult("table parser requires a 'headers' arg".to_string()));
        }

        let lines: Vec<&str> = contents.lines().collect();
        let mut rows = Vec::new();
        for line in lines.iter().skip(matched_line + 1) {
            if line.trim().is_empty() {
                break;
            }
            let cells: Vec<&str> = line.split_whitespace().collect();
            let row: serde_json::Map<String, Value> = headers
                .iter()
                .cloned()
                .zip(cells.iter().map(|c| Value::String((*c).to_string())))
                .collect();
            rows.push(json!(row));
        }
        Ok(Value::Array(rows))
    }
}

fn line_at(contents: &str, matched_line: usize) -> Result<&str, ParseError> {
    contents
        .lines()
        .nth(matched_line)
        .ok_or_else(|| ParseError::MalformedResult(format!("matched line {matched_line} out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regex_parser_single_group_is_scalar() {
        let parser = RegexParser;
        let value = parser
            .parse("before\nscore: 42\nafter", 1, &json!({"regex": r"score: (\d+)"}))
            .unwrap();
        assert_eq!(value, Value::String("42".to_string()));
    }

    #[test]
    fn regex_parser_multiple_groups_is_list() {
        let parser = RegexParser;
        let value = parser.parse("x=1 y=2", 0, &json!({"regex": r"x=(\d+) y=(\d+)"})).unwrap();
        assert_eq!(value, json!(["1", "2"]));
    }

    #[test]
    fn split_parser_selects_index() {
        let parser = SplitParser;
        let value = parser.parse("a b c", 0, &json!({"index": 1})).unwrap();
        assert_eq!(value, Value::String("b".to_string()));
    }

    #[test]
    fn match_select_all_produces_list() {
        let result = MatchSelect::All.apply(vec![json!(1), json!(2)]);
        assert_eq!(result, json!([1, 2]));
    }

    #[test]
    fn match_select_last_picks_final_match() {
        let result = MatchSelect::Last.apply(vec![json!(1), json!(2), json!(3)]);
        assert_eq!(result, json!(3));
    }
}
