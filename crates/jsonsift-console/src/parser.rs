use jsonsift_core::types::{
    ComparisonOperator, FilterCondition, FilterSpec, ProjectionMode, ProjectionRule,
};
use serde_json::Value;

use crate::commands::Command;

/// Tokenize an input line into a vector of string tokens.
///
/// Handles:
/// - Whitespace-separated words; `[]` inside or at the start of a word is part
///   of the word, so paths like `items[].price` and `[].id` stay whole
/// - Quoted strings: `"hello world"` becomes a single token (quotes preserved)
/// - JSON bodies: `{...}` and `[...]` are scanned to the matching close
///   (tracking nesting and string literals) and returned as one token
/// - Operators: `==`, `!=`, `<=`, `>=`, `<`, `>`, `=` as separate tokens
fn tokenize(input: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let len = chars.len();
    let mut i = 0;

    while i < len {
        if chars[i].is_whitespace() {
            i += 1;
            continue;
        }

        // JSON object or array. A leading `[]` is a path wildcard instead.
        let opens_array = chars[i] == '[' && !(i + 1 < len && chars[i + 1] == ']');
        if chars[i] == '{' || opens_array {
            let (open, close) = if chars[i] == '{' { ('{', '}') } else { ('[', ']') };
            let start = i;
            let mut depth = 0;
            let mut in_string = false;
            loop {
                if i >= len {
                    return Err(if open == '{' {
                        "Unterminated JSON object".to_string()
                    } else {
                        "Unterminated JSON array".to_string()
                    });
                }
                let c = chars[i];
                if in_string {
                    if c == '\\' {
                        // Skip escaped character.
                        i += 1;
                    } else if c == '"' {
                        in_string = false;
                    }
                } else if c == '"' {
                    in_string = true;
                } else if c == open {
                    depth += 1;
                } else if c == close {
                    depth -= 1;
                    if depth == 0 {
                        i += 1;
                        break;
                    }
                }
                i += 1;
            }
            tokens.push(chars[start..i].iter().collect());
            continue;
        }

        // Quoted string.
        if chars[i] == '"' {
            let start = i;
            i += 1;
            while i < len && chars[i] != '"' {
                if chars[i] == '\\' {
                    i += 1;
                }
                i += 1;
            }
            if i >= len {
                return Err("Unterminated quoted string".to_string());
            }
            i += 1;
            tokens.push(chars[start..i].iter().collect());
            continue;
        }

        if is_operator_start(&chars, i) {
            if i + 1 < len && chars[i + 1] == '=' {
                tokens.push(chars[i..i + 2].iter().collect());
                i += 2;
            } else {
                tokens.push(chars[i].to_string());
                i += 1;
            }
            continue;
        }

        let start = i;
        while i < len
            && !chars[i].is_whitespace()
            && chars[i] != '"'
            && chars[i] != '{'
            && !is_operator_start(&chars, i)
        {
            i += 1;
        }
        if i > start {
            tokens.push(chars[start..i].iter().collect());
        }
    }

    Ok(tokens)
}

/// `<`, `>`, `=` always start an operator; `!` only when followed by `=`.
fn is_operator_start(chars: &[char], i: usize) -> bool {
    match chars[i] {
        '<' | '>' | '=' => true,
        '!' => chars.get(i + 1) == Some(&'='),
        _ => false,
    }
}

/// Parse a raw token into a JSON value.
///
/// - `"..."` becomes a JSON string (escapes decoded).
/// - `{...}` / `[...]` is decoded as JSON when valid.
/// - `true`, `false`, `null` become literals.
/// - Integers and floats become numbers.
/// - Anything else is a bare-word string.
fn parse_value(s: &str) -> Value {
    if s.starts_with('"') && s.ends_with('"') && s.len() >= 2 {
        return serde_json::from_str(s).unwrap_or_else(|_| Value::String(s[1..s.len() - 1].to_string()));
    }
    if s.starts_with('{') || s.starts_with('[') {
        return serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.to_string()));
    }
    match s {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        _ => {
            if let Ok(n) = s.parse::<i64>() {
                Value::from(n)
            } else if let Ok(n) = s.parse::<f64>() {
                serde_json::Number::from_f64(n)
                    .map_or_else(|| Value::String(s.to_string()), Value::Number)
            } else {
                Value::String(s.to_string())
            }
        }
    }
}

/// Strip surrounding quotes from a name or path token.
fn unquote(s: &str) -> String {
    if s.starts_with('"') && s.ends_with('"') && s.len() >= 2 {
        serde_json::from_str(s).unwrap_or_else(|_| s[1..s.len() - 1].to_string())
    } else {
        s.to_string()
    }
}

/// The raw text after the first word, for commands that take a JSON body.
fn rest_after_keyword(input: &str) -> &str {
    let trimmed = input.trim_start();
    match trimmed.find(char::is_whitespace) {
        Some(pos) => trimmed[pos..].trim(),
        None => "",
    }
}

/// Parse an input line into a [`Command`].
pub fn parse(input: &str, default_set: Option<&str>) -> Result<Command, String> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err("Empty command".to_string());
    }

    let first = tokens[0].to_uppercase();
    match first.as_str() {
        "LOAD" => parse_load(&tokens),
        "JSON" => parse_json(input),
        "WHERE" => parse_where(&tokens),
        "KEEP" => parse_projection(&tokens, ProjectionMode::Keep),
        "DROP" => parse_projection(&tokens, ProjectionMode::Drop),
        "SPEC" => parse_spec(&tokens, input),
        "CLEAR" => Ok(Command::Clear),
        "GET" => parse_get(&tokens),
        "PREVIEW" | "RUN" => Ok(Command::Preview),
        "EXPORT" => parse_export(&tokens),
        "IMPORT" => parse_import(&tokens),
        "LIST" => parse_list(&tokens, default_set),
        "USE" => parse_use(&tokens),
        "SAVE" => {
            let (set, rule) = parse_set_and_rule(&tokens[1..], default_set, "SAVE [set] <rule>")?;
            Ok(Command::Save { set, rule })
        }
        "ENABLE" | "DISABLE" => {
            let usage = format!("{first} [set] <rule>");
            let (set, rule) = parse_set_and_rule(&tokens[1..], default_set, &usage)?;
            Ok(Command::SetEnabled {
                set,
                rule,
                enabled: first == "ENABLE",
            })
        }
        "DELETE" => parse_delete(&tokens, default_set),
        "HELP" => {
            let topic = if tokens.len() > 1 {
                Some(tokens[1..].join(" "))
            } else {
                None
            };
            Ok(Command::Help(topic))
        }
        "EXIT" | "QUIT" => Ok(Command::Exit),
        _ => Err(format!("Unknown command '{}'", tokens[0])),
    }
}

/// LOAD <file>
fn parse_load(tokens: &[String]) -> Result<Command, String> {
    if tokens.len() != 2 {
        return Err("Usage: LOAD <file>  (Type HELP LOAD for details)".to_string());
    }
    Ok(Command::Load {
        path: unquote(&tokens[1]),
    })
}

/// JSON <document>
fn parse_json(input: &str) -> Result<Command, String> {
    let text = rest_after_keyword(input);
    if text.is_empty() {
        return Err("Usage: JSON <document>  (Type HELP JSON for details)".to_string());
    }
    Ok(Command::Json {
        text: text.to_string(),
    })
}

/// WHERE <path> <op> <value> | WHERE <path> EXISTS
fn parse_where(tokens: &[String]) -> Result<Command, String> {
    const USAGE: &str = "Usage: WHERE <path> <op> <value>  (Type HELP WHERE for details)";
    if tokens.len() < 3 {
        return Err(USAGE.to_string());
    }
    let path = unquote(&tokens[1]);
    let operator = ComparisonOperator::from_symbol(&tokens[2]).ok_or_else(|| {
        format!(
            "Unknown operator '{}'. Expected ==, !=, >, >=, <, <=, CONTAINS, or EXISTS.",
            tokens[2]
        )
    })?;

    let condition = match operator {
        ComparisonOperator::Exists => {
            if tokens.len() != 3 {
                return Err("EXISTS takes no value".to_string());
            }
            FilterCondition::exists(path)
        }
        ComparisonOperator::Contains => {
            if tokens.len() != 4 {
                return Err(USAGE.to_string());
            }
            FilterCondition::contains(path, unquote(&tokens[3]))
        }
        op => {
            if tokens.len() != 4 {
                return Err(USAGE.to_string());
            }
            FilterCondition::new(path, op, Some(parse_value(&tokens[3])))
        }
    };
    Ok(Command::Where { condition })
}

/// KEEP <path> [ANYWHERE] | DROP <path> [ANYWHERE]
fn parse_projection(tokens: &[String], mode: ProjectionMode) -> Result<Command, String> {
    let keyword = tokens[0].to_uppercase();
    let usage = format!("Usage: {keyword} <path> [ANYWHERE]  (Type HELP {keyword} for details)");
    let rule = match tokens.len() {
        2 => ProjectionRule::exact(unquote(&tokens[1])),
        3 if tokens[2].eq_ignore_ascii_case("ANYWHERE") => {
            ProjectionRule::key_anywhere(unquote(&tokens[1]))
        }
        _ => return Err(usage),
    };
    Ok(Command::Project { mode, rule })
}

/// SPEC | SPEC <json>
fn parse_spec(tokens: &[String], input: &str) -> Result<Command, String> {
    if tokens.len() == 1 {
        return Ok(Command::ShowSpec);
    }
    let spec: FilterSpec = serde_json::from_str(rest_after_keyword(input))
        .map_err(|e| format!("Invalid filter spec: {e}"))?;
    Ok(Command::SetSpec { spec })
}

/// GET <path>
fn parse_get(tokens: &[String]) -> Result<Command, String> {
    if tokens.len() != 2 {
        return Err("Usage: GET <path>  (Type HELP GET for details)".to_string());
    }
    Ok(Command::Get {
        path: unquote(&tokens[1]),
    })
}

/// EXPORT <file> | EXPORT RULES <file>
fn parse_export(tokens: &[String]) -> Result<Command, String> {
    match tokens.len() {
        2 => Ok(Command::Export {
            path: unquote(&tokens[1]),
        }),
        3 if tokens[1].eq_ignore_ascii_case("RULES") => Ok(Command::ExportRules {
            path: unquote(&tokens[2]),
        }),
        _ => Err(
            "Usage: EXPORT <file> | EXPORT RULES <file>  (Type HELP EXPORT for details)"
                .to_string(),
        ),
    }
}

/// IMPORT RULES <file>
fn parse_import(tokens: &[String]) -> Result<Command, String> {
    if tokens.len() != 3 || !tokens[1].eq_ignore_ascii_case("RULES") {
        return Err("Usage: IMPORT RULES <file>  (Type HELP IMPORT RULES for details)".to_string());
    }
    Ok(Command::ImportRules {
        path: unquote(&tokens[2]),
    })
}

/// LIST SETS | LIST RULES [set]
fn parse_list(tokens: &[String], default_set: Option<&str>) -> Result<Command, String> {
    if tokens.len() < 2 {
        return Err("Expected SETS or RULES after LIST".to_string());
    }
    match tokens[1].to_uppercase().as_str() {
        "SETS" if tokens.len() == 2 => Ok(Command::ListSets),
        "RULES" => {
            let set = match tokens.len() {
                2 => resolve_set(default_set)?,
                3 => unquote(&tokens[2]),
                _ => return Err("Usage: LIST RULES [set]".to_string()),
            };
            Ok(Command::ListRules { set })
        }
        _ => Err("Usage: LIST SETS | LIST RULES [set]".to_string()),
    }
}

/// USE [set]
fn parse_use(tokens: &[String]) -> Result<Command, String> {
    match tokens.len() {
        1 => Ok(Command::Use { set: None }),
        2 => Ok(Command::Use {
            set: Some(unquote(&tokens[1])),
        }),
        _ => Err("Usage: USE [set]".to_string()),
    }
}

/// DELETE SET <set> | DELETE RULE [set] <rule>
fn parse_delete(tokens: &[String], default_set: Option<&str>) -> Result<Command, String> {
    if tokens.len() < 2 {
        return Err("Expected SET or RULE after DELETE".to_string());
    }
    match tokens[1].to_uppercase().as_str() {
        "SET" => {
            if tokens.len() != 3 {
                return Err("Usage: DELETE SET <set>".to_string());
            }
            Ok(Command::DeleteSet {
                set: unquote(&tokens[2]),
            })
        }
        "RULE" => {
            let (set, rule) =
                parse_set_and_rule(&tokens[2..], default_set, "DELETE RULE [set] <rule>")?;
            Ok(Command::DeleteRule { set, rule })
        }
        _ => Err("Expected SET or RULE after DELETE".to_string()),
    }
}

/// `[set] <rule>` arguments; the set falls back to the active one.
fn parse_set_and_rule(
    args: &[String],
    default_set: Option<&str>,
    usage: &str,
) -> Result<(String, String), String> {
    match args {
        [rule] => Ok((resolve_set(default_set)?, unquote(rule))),
        [set, rule] => Ok((unquote(set), unquote(rule))),
        _ => Err(format!("Usage: {usage}")),
    }
}

fn resolve_set(default_set: Option<&str>) -> Result<String, String> {
    default_set
        .map(str::to_string)
        .ok_or_else(|| "No rule set specified. Name one or run USE <set> first.".to_string())
}
