use jsonsift_core::api::FilterOutcome;
use jsonsift_core::error::FilterError;
use jsonsift_core::types::{FilterSpec, ProjectionMode, RuleSet};
use serde_json::{Value, json};

use crate::executor::CommandResult;

/// Output mode for rendering command results.
pub enum OutputMode {
    /// Human-readable pretty-printed output.
    Pretty,
    /// Machine-parseable JSON (one JSON object per result on stdout).
    Json,
}

/// Render a command result to stdout in the given mode.
///
/// Returns `true` to continue execution, `false` to signal exit.
pub fn render(result: &CommandResult, mode: &OutputMode) -> bool {
    match result {
        CommandResult::Ok(msg) => match mode {
            OutputMode::Pretty => print_ok(msg),
            OutputMode::Json => println!("{}", json!({"ok": true, "message": msg})),
        },
        CommandResult::Item(item) => match mode {
            OutputMode::Pretty => match item {
                Some(v) => print_item(v),
                None => print_not_found(),
            },
            OutputMode::Json => match item {
                Some(v) => println!("{}", json!({"found": true, "value": v})),
                None => println!("{}", json!({"found": false})),
            },
        },
        CommandResult::Spec(spec) => match mode {
            OutputMode::Pretty => print_spec(spec),
            OutputMode::Json => println!("{}", json!({"spec": spec})),
        },
        CommandResult::Preview(outcome) => render_outcome(outcome, mode),
        CommandResult::SetList(sets) => match mode {
            OutputMode::Pretty => print_set_list(sets),
            OutputMode::Json => {
                let items: Vec<Value> = sets
                    .iter()
                    .map(|s| {
                        json!({
                            "id": s.id,
                            "name": s.name,
                            "description": s.description,
                            "rules": s.rules.len(),
                        })
                    })
                    .collect();
                println!("{}", json!({"rule_sets": items}));
            }
        },
        CommandResult::RuleList(set) => match mode {
            OutputMode::Pretty => print_rule_list(set),
            OutputMode::Json => println!("{}", json!(set)),
        },
        CommandResult::Use(Some(id)) => match mode {
            OutputMode::Pretty => println!("Using rule set '{id}'."),
            OutputMode::Json => println!("{}", json!({"ok": true, "active_set": id})),
        },
        CommandResult::Use(None) => match mode {
            OutputMode::Pretty => println!("Cleared active rule set."),
            OutputMode::Json => println!("{}", json!({"ok": true, "active_set": null})),
        },
        CommandResult::Help(topic) => match mode {
            OutputMode::Pretty => render_help_pretty(topic.as_deref()),
            OutputMode::Json => render_help_json(topic.as_deref()),
        },
        CommandResult::Exit => return false,
    }
    true
}

/// Render a transform result: the value on stdout, diagnostics on stderr in
/// pretty mode, or a single `{"value", "errors"}` object in JSON mode.
pub fn render_outcome(outcome: &FilterOutcome, mode: &OutputMode) {
    match mode {
        OutputMode::Pretty => {
            print_item(&outcome.value);
            print_diagnostics(&outcome.errors);
        }
        OutputMode::Json => println!("{}", json!(outcome)),
    }
}

/// Render an error in the given mode (always to stderr).
pub fn render_error(err: &dyn std::fmt::Display, mode: &OutputMode) {
    match mode {
        OutputMode::Pretty => print_error(err),
        OutputMode::Json => {
            eprintln!("{}", json!({"error": err.to_string()}));
        }
    }
}

// ---- Pretty-print helpers ----

/// Pretty-print a single value with 2-space indentation.
pub fn print_item(item: &Value) {
    match serde_json::to_string_pretty(item) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Error formatting value: {e}"),
    }
}

pub fn print_not_found() {
    println!("No value at path.");
}

pub fn print_diagnostics(errors: &[FilterError]) {
    for err in errors {
        eprintln!("warning: {err}");
    }
}

fn print_spec(spec: &FilterSpec) {
    if spec.is_empty() {
        println!("Draft is empty.");
        return;
    }
    match serde_json::to_string_pretty(spec) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Error formatting spec: {e}"),
    }
}

/// One-line summary such as `2 condition(s), keep 1 path(s)`.
fn summarize_spec(spec: &FilterSpec) -> String {
    let mut parts = Vec::new();
    if !spec.conditions.is_empty() {
        parts.push(format!("{} condition(s)", spec.conditions.len()));
    }
    if let Some(projection) = &spec.projection {
        let verb = match projection.mode {
            ProjectionMode::Keep => "keep",
            ProjectionMode::Drop => "drop",
        };
        parts.push(format!("{verb} {} path(s)", projection.rules.len()));
    }
    if parts.is_empty() {
        "no filter".to_string()
    } else {
        parts.join(", ")
    }
}

fn print_set_list(sets: &[RuleSet]) {
    if sets.is_empty() {
        println!("No rule sets.");
        return;
    }
    for set in sets {
        match &set.description {
            Some(desc) => println!("  {}  {} ({} rule(s)): {desc}", set.id, set.name, set.rules.len()),
            None => println!("  {}  {} ({} rule(s))", set.id, set.name, set.rules.len()),
        }
    }
    println!("({} rule set(s))", sets.len());
}

fn print_rule_list(set: &RuleSet) {
    println!("Rule set: {} ({})", set.name, set.id);
    if let Some(desc) = &set.description {
        println!("  {desc}");
    }
    if set.rules.is_empty() {
        println!("  No rules.");
        return;
    }
    let active = set.active_rule().map(|r| r.id.as_str());
    for rule in &set.rules {
        let state = if rule.enabled { "on " } else { "off" };
        let marker = if Some(rule.id.as_str()) == active { "*" } else { " " };
        println!(
            " {marker}[{state}] {}  {}: {}",
            rule.id,
            rule.name,
            summarize_spec(&rule.spec)
        );
    }
}

/// Print a success message.
pub fn print_ok(msg: &str) {
    println!("{msg}");
}

/// Print an error message to stderr.
pub fn print_error(err: &dyn std::fmt::Display) {
    eprintln!("Error: {err}");
}

// ---------------------------------------------------------------------------
// Structured per-command help
// ---------------------------------------------------------------------------

struct CommandHelp {
    name: &'static str,
    summary: &'static str,
    syntax: &'static str,
    details: &'static str,
    examples: &'static [&'static str],
}

/// Lookup key(s) that match this command (lowercase).
fn topic_keys(cmd: &CommandHelp) -> Vec<&'static str> {
    match cmd.name {
        "LOAD" => vec!["load"],
        "JSON" => vec!["json"],
        "GET" => vec!["get"],
        "WHERE" => vec!["where", "operators"],
        "KEEP / DROP" => vec!["keep", "drop", "projection"],
        "SPEC" => vec!["spec"],
        "CLEAR" => vec!["clear"],
        "PREVIEW" => vec!["preview", "run"],
        "EXPORT" => vec!["export"],
        "LIST SETS" => vec!["list sets", "list"],
        "LIST RULES" => vec!["list rules"],
        "USE" => vec!["use"],
        "SAVE" => vec!["save"],
        "ENABLE / DISABLE" => vec!["enable", "disable"],
        "DELETE" => vec!["delete", "delete set", "delete rule"],
        "EXPORT RULES / IMPORT RULES" => vec!["export rules", "import rules", "import"],
        "HELP" => vec!["help"],
        "EXIT / QUIT" => vec!["exit", "quit"],
        _ => vec![],
    }
}

const COMMANDS: &[CommandHelp] = &[
    // -- Document --
    CommandHelp {
        name: "LOAD",
        summary: "Read a JSON document from a file",
        syntax: "LOAD <file>",
        details: "\
Replaces the current document. A file holding only whitespace clears the \
document. Malformed JSON is reported as a parse error and leaves the \
previous document in place.",
        examples: &["LOAD orders.json", "LOAD \"my data/orders.json\""],
    },
    CommandHelp {
        name: "JSON",
        summary: "Set the document from inline JSON",
        syntax: "JSON <document>",
        details: "Everything after the keyword is parsed as one JSON value.",
        examples: &["JSON [{\"id\": 1, \"price\": 5}, {\"id\": 2, \"price\": 15}]"],
    },
    CommandHelp {
        name: "GET",
        summary: "Show the value(s) at a path in the document",
        syntax: "GET <path>",
        details: "\
Paths are dot-separated keys. `[]` iterates an array: a bare `[]` segment \
iterates the current value, `key[]` iterates the array under `key`. One \
match prints the value itself; several matches print an array.",
        examples: &["GET customer.name", "GET items[].sku", "GET [].id"],
    },
    // -- Draft filter --
    CommandHelp {
        name: "WHERE",
        summary: "Add a condition to the draft filter",
        syntax: "WHERE <path> <==|!=|>|>=|<|<=|CONTAINS|EXISTS> [value]",
        details: "\
Conditions are combined with AND. On an array document each element is \
tested and only passing elements are kept; nested arrays are filtered the \
same way. A non-array document that fails becomes null.

A condition passes when any value the path resolves to satisfies it. \
Numbers compare numerically, strings lexicographically. CONTAINS is a \
substring test on strings. EXISTS passes when the path resolves to \
anything, including null.

Values: quoted text is a string, true/false/null are literals, numbers \
are numbers, other bare words are strings.",
        examples: &[
            "WHERE price > 10",
            "WHERE status == \"shipped\"",
            "WHERE tags[] CONTAINS urgent",
            "WHERE meta EXISTS",
        ],
    },
    CommandHelp {
        name: "KEEP / DROP",
        summary: "Add a projection rule to the draft filter",
        syntax: "KEEP <path> [ANYWHERE]  |  DROP <path> [ANYWHERE]",
        details: "\
KEEP builds each surviving element from only the listed top-level keys. \
DROP removes the listed paths. ANYWHERE matches the key at any depth. \
Switching between KEEP and DROP starts a new projection.",
        examples: &["KEEP id", "KEEP name", "DROP address.zip", "DROP zip ANYWHERE"],
    },
    CommandHelp {
        name: "SPEC",
        summary: "Show the draft filter, or replace it from JSON",
        syntax: "SPEC [json]",
        details: "The JSON form matches the persisted rule format.",
        examples: &[
            "SPEC",
            "SPEC {\"conditions\": [{\"path\": \"price\", \"operator\": \">\", \"value\": 10}]}",
        ],
    },
    CommandHelp {
        name: "CLEAR",
        summary: "Reset the draft filter",
        syntax: "CLEAR",
        details: "",
        examples: &["CLEAR"],
    },
    CommandHelp {
        name: "PREVIEW",
        summary: "Apply the draft filter to the document",
        syntax: "PREVIEW  (or RUN)",
        details: "\
Prints the transformed document. Diagnostics are printed as warnings and \
never stop the transform.",
        examples: &["PREVIEW"],
    },
    CommandHelp {
        name: "EXPORT",
        summary: "Write the last preview (or the document) to a file",
        syntax: "EXPORT <file>",
        details: "Output is pretty-printed JSON with 2-space indentation.",
        examples: &["EXPORT filtered.json"],
    },
    // -- Rule sets --
    CommandHelp {
        name: "LIST SETS",
        summary: "Show stored rule sets",
        syntax: "LIST SETS",
        details: "",
        examples: &["LIST SETS"],
    },
    CommandHelp {
        name: "LIST RULES",
        summary: "Show the rules of a rule set",
        syntax: "LIST RULES [set]",
        details: "\
Defaults to the active rule set. `*` marks the rule USE would load: the \
first enabled rule, or the first rule when none is enabled.",
        examples: &["LIST RULES", "LIST RULES orders"],
    },
    CommandHelp {
        name: "USE",
        summary: "Set or clear the active rule set",
        syntax: "USE [set]",
        details: "Selecting a set loads its active rule into the draft.",
        examples: &["USE orders", "USE"],
    },
    CommandHelp {
        name: "SAVE",
        summary: "Store the draft filter as a rule",
        syntax: "SAVE [set] <rule>",
        details: "\
Creates the set when it does not exist. A rule with the same id or name is \
replaced. Ids are derived from names: lowercase, with other characters \
collapsed to `-`.",
        examples: &["SAVE orders expensive", "SAVE \"Order Cleanup\" \"Big Spenders\""],
    },
    CommandHelp {
        name: "ENABLE / DISABLE",
        summary: "Toggle a stored rule",
        syntax: "ENABLE [set] <rule>  |  DISABLE [set] <rule>",
        details: "",
        examples: &["DISABLE orders expensive", "ENABLE expensive"],
    },
    CommandHelp {
        name: "DELETE",
        summary: "Remove a rule set or a rule",
        syntax: "DELETE SET <set>  |  DELETE RULE [set] <rule>",
        details: "",
        examples: &["DELETE SET orders", "DELETE RULE orders expensive"],
    },
    CommandHelp {
        name: "EXPORT RULES / IMPORT RULES",
        summary: "Exchange rule sets with a file",
        syntax: "EXPORT RULES <file>  |  IMPORT RULES <file>",
        details: "Import replaces every stored rule set with the file's contents.",
        examples: &["EXPORT RULES backup.json", "IMPORT RULES backup.json"],
    },
    // -- Other --
    CommandHelp {
        name: "HELP",
        summary: "Show help for commands",
        syntax: "HELP [command]",
        details: "Without arguments, shows the overview. With a command name, shows detailed help.",
        examples: &["HELP", "HELP WHERE", "HELP list rules"],
    },
    CommandHelp {
        name: "EXIT / QUIT",
        summary: "Exit the console",
        syntax: "EXIT  (or QUIT)",
        details: "",
        examples: &["EXIT", "QUIT"],
    },
];

fn find_command(topic: &str) -> Option<&'static CommandHelp> {
    let lower = topic.to_lowercase();
    COMMANDS
        .iter()
        .find(|cmd| topic_keys(cmd).iter().any(|k| *k == lower))
}

fn render_help_pretty(topic: Option<&str>) {
    match topic {
        None => print_help_overview(),
        Some(t) => match find_command(t) {
            Some(cmd) => print_command_help(cmd),
            None => {
                println!("Unknown help topic '{t}'. Type HELP to see available commands.");
            }
        },
    }
}

fn print_help_overview() {
    println!("jsonsift console: command reference");
    println!();
    println!("  Document");
    println!("    LOAD <file>        Read a JSON document from a file");
    println!("    JSON <document>    Set the document from inline JSON");
    println!("    GET <path>         Show the value(s) at a path");
    println!();
    println!("  Draft filter");
    println!("    WHERE              Add a condition");
    println!("    KEEP / DROP        Add a projection rule");
    println!("    SPEC [json]        Show or replace the draft");
    println!("    CLEAR              Reset the draft");
    println!("    PREVIEW            Apply the draft to the document");
    println!("    EXPORT <file>      Write the last preview to a file");
    println!();
    println!("  Rule sets");
    println!("    LIST SETS          Show stored rule sets");
    println!("    LIST RULES [set]   Show the rules of a set");
    println!("    USE [set]          Set or clear the active rule set");
    println!("    SAVE [set] <rule>  Store the draft as a rule");
    println!("    ENABLE / DISABLE   Toggle a rule");
    println!("    DELETE             Remove a rule set or rule");
    println!("    EXPORT RULES / IMPORT RULES  Exchange rule sets with a file");
    println!();
    println!("  Other");
    println!("    HELP [command]     Show this overview, or detailed help for a command");
    println!("    EXIT / QUIT        Exit the console");
    println!();
    println!("Type HELP <command> for detailed usage and examples.");
}

fn print_command_help(cmd: &CommandHelp) {
    println!("{}: {}", cmd.name, cmd.summary);
    println!();
    println!("Syntax:");
    println!("  {}", cmd.syntax);
    if !cmd.details.is_empty() {
        println!();
        for line in cmd.details.lines() {
            println!("{line}");
        }
    }
    if !cmd.examples.is_empty() {
        println!();
        println!("Examples:");
        for ex in cmd.examples {
            println!("  {ex}");
        }
    }
}

fn render_help_json(topic: Option<&str>) {
    match topic {
        None => {
            let commands: Vec<Value> = COMMANDS
                .iter()
                .map(|cmd| json!({"name": cmd.name, "summary": cmd.summary}))
                .collect();
            println!("{}", json!({ "commands": commands }));
        }
        Some(t) => match find_command(t) {
            Some(cmd) => {
                println!(
                    "{}",
                    json!({
                        "command": cmd.name,
                        "summary": cmd.summary,
                        "syntax": cmd.syntax,
                        "details": cmd.details,
                        "examples": cmd.examples,
                    })
                );
            }
            None => {
                eprintln!("{}", json!({"error": format!("Unknown help topic '{t}'")}));
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonsift_core::types::{FilterCondition, FilterProjection, ProjectionRule};

    #[test]
    fn test_every_command_has_a_topic() {
        for cmd in COMMANDS {
            assert!(!topic_keys(cmd).is_empty(), "{} has no help topic", cmd.name);
        }
    }

    #[test]
    fn test_find_command_aliases() {
        assert_eq!(find_command("WHERE").unwrap().name, "WHERE");
        assert_eq!(find_command("drop").unwrap().name, "KEEP / DROP");
        assert_eq!(find_command("List Rules").unwrap().name, "LIST RULES");
        assert_eq!(find_command("import").unwrap().name, "EXPORT RULES / IMPORT RULES");
        assert!(find_command("frobnicate").is_none());
    }

    #[test]
    fn test_summarize_spec() {
        assert_eq!(summarize_spec(&FilterSpec::new()), "no filter");
        let spec = FilterSpec::new()
            .with_condition(FilterCondition::gt("price", 10))
            .with_projection(FilterProjection::drop(vec![ProjectionRule::exact("a")]));
        assert_eq!(summarize_spec(&spec), "1 condition(s), drop 1 path(s)");
    }
}
