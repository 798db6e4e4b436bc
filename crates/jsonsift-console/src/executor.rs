use std::path::Path;

use jsonsift_core::api::{FilterOutcome, apply_filter_spec, pick_at_path};
use jsonsift_core::document::{ParsedDocument, parse_document, read_document, write_document};
use jsonsift_core::store::{RuleSetStore, export_rule_sets, import_rule_sets};
use jsonsift_core::types::{
    FilterCondition, FilterProjection, FilterSpec, ProjectionMatchMode, ProjectionMode,
    ProjectionRule, Rule, RuleSet,
};
use serde_json::Value;
use tracing::debug;

use crate::commands::Command;
use crate::error::ConsoleError;

/// Structured result from executing a command.
#[derive(Debug)]
pub enum CommandResult {
    /// Action succeeded (LOAD, WHERE, SAVE, DELETE, ...).
    Ok(String),
    /// Value at a path (GET); `None` when nothing matched.
    Item(Option<Value>),
    /// The current draft (SPEC).
    Spec(FilterSpec),
    /// Draft applied to the document (PREVIEW).
    Preview(FilterOutcome),
    /// Stored rule sets (LIST SETS).
    SetList(Vec<RuleSet>),
    /// One rule set with its rules (LIST RULES).
    RuleList(RuleSet),
    /// Active rule set changed (Some = set id, None = cleared).
    Use(Option<String>),
    /// Help text (optional topic for per-command help).
    Help(Option<String>),
    /// Exit signal.
    Exit,
}

/// Working state of one console session: the loaded document, the draft
/// filter being edited, and the rule-set store.
pub struct Session {
    store: RuleSetStore,
    document: Option<Value>,
    draft: FilterSpec,
    last_preview: Option<Value>,
    active_set: Option<String>,
}

impl Session {
    pub fn new(store: RuleSetStore) -> Self {
        Self {
            store,
            document: None,
            draft: FilterSpec::default(),
            last_preview: None,
            active_set: None,
        }
    }

    pub fn draft(&self) -> &FilterSpec {
        &self.draft
    }

    pub fn active_set(&self) -> Option<&str> {
        self.active_set.as_deref()
    }

    pub fn store(&self) -> &RuleSetStore {
        &self.store
    }
}

/// Execute a parsed command against the session.
pub fn execute(session: &mut Session, cmd: Command) -> Result<CommandResult, ConsoleError> {
    match cmd {
        Command::Load { path } => {
            let parsed = read_document(Path::new(&path))?;
            install_document(session, parsed, &path)
        }
        Command::Json { text } => install_document(session, parse_document(&text), "inline JSON"),
        Command::Where { condition } => exec_where(session, condition),
        Command::Project { mode, rule } => exec_project(session, mode, rule),
        Command::ShowSpec => Ok(CommandResult::Spec(session.draft().clone())),
        Command::SetSpec { spec } => {
            let n = spec.conditions.len();
            session.draft = spec;
            Ok(CommandResult::Ok(format!("Draft replaced ({n} condition(s)).")))
        }
        Command::Clear => {
            session.draft = FilterSpec::default();
            Ok(CommandResult::Ok("Draft cleared.".to_string()))
        }
        Command::Get { path } => {
            let doc = session.document.as_ref().ok_or(ConsoleError::NoDocument)?;
            Ok(CommandResult::Item(pick_at_path(doc, &path)))
        }
        Command::Preview => exec_preview(session),
        Command::Export { path } => exec_export(session, &path),
        Command::ListSets => Ok(CommandResult::SetList(session.store.load()?)),
        Command::ListRules { set } => {
            let found = session
                .store
                .load()?
                .into_iter()
                .find(|s| set_matches(s, &set))
                .ok_or(ConsoleError::SetNotFound(set))?;
            Ok(CommandResult::RuleList(found))
        }
        Command::Use { set } => exec_use(session, set),
        Command::Save { set, rule } => exec_save(session, &set, &rule),
        Command::SetEnabled { set, rule, enabled } => exec_set_enabled(session, &set, &rule, enabled),
        Command::DeleteSet { set } => exec_delete_set(session, &set),
        Command::DeleteRule { set, rule } => exec_delete_rule(session, &set, &rule),
        Command::ExportRules { path } => {
            let sets = session.store.load()?;
            export_rule_sets(Path::new(&path), &sets)?;
            Ok(CommandResult::Ok(format!(
                "Exported {} rule set(s) to {path}.",
                sets.len()
            )))
        }
        Command::ImportRules { path } => exec_import_rules(session, &path),
        Command::Help(topic) => Ok(CommandResult::Help(topic)),
        Command::Exit => Ok(CommandResult::Exit),
    }
}

fn install_document(
    session: &mut Session,
    parsed: ParsedDocument,
    source: &str,
) -> Result<CommandResult, ConsoleError> {
    if let Some(err) = parsed.error {
        return Err(ConsoleError::Document(err));
    }
    session.last_preview = None;
    match parsed.value {
        Some(value) => {
            let summary = describe(&value);
            session.document = Some(value);
            Ok(CommandResult::Ok(format!("Loaded {summary} from {source}.")))
        }
        None => {
            session.document = None;
            Ok(CommandResult::Ok(format!("{source} is empty; document cleared.")))
        }
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Array(items) => format!("array of {} element(s)", items.len()),
        Value::Object(map) => format!("object with {} key(s)", map.len()),
        _ => "a scalar value".to_string(),
    }
}

fn exec_where(
    session: &mut Session,
    condition: FilterCondition,
) -> Result<CommandResult, ConsoleError> {
    let operand = condition
        .value
        .as_ref()
        .map(|v| format!(" {v}"))
        .unwrap_or_default();
    let msg = format!(
        "Added condition {} {}{operand}",
        condition.path, condition.operator
    );
    session.draft.conditions.push(condition);
    Ok(CommandResult::Ok(format!(
        "{msg} ({} condition(s)).",
        session.draft.conditions.len()
    )))
}

fn exec_project(
    session: &mut Session,
    mode: ProjectionMode,
    rule: ProjectionRule,
) -> Result<CommandResult, ConsoleError> {
    let projection = session
        .draft
        .projection
        .get_or_insert_with(|| FilterProjection {
            mode,
            rules: Vec::new(),
        });
    if projection.mode != mode {
        *projection = FilterProjection {
            mode,
            rules: Vec::new(),
        };
    }
    let scope = match rule.match_mode {
        ProjectionMatchMode::Exact => "",
        ProjectionMatchMode::KeyAnywhere => " anywhere",
    };
    let msg = format!("{} '{}'{scope}", mode_label(mode), rule.path);
    projection.rules.push(rule);
    Ok(CommandResult::Ok(format!(
        "{msg} ({} projection rule(s)).",
        projection.rules.len()
    )))
}

fn mode_label(mode: ProjectionMode) -> &'static str {
    match mode {
        ProjectionMode::Keep => "Keeping",
        ProjectionMode::Drop => "Dropping",
    }
}

fn exec_preview(session: &mut Session) -> Result<CommandResult, ConsoleError> {
    let doc = session.document.as_ref().ok_or(ConsoleError::NoDocument)?;
    let outcome = apply_filter_spec(doc, &session.draft);
    debug!(errors = outcome.errors.len(), "preview computed");
    session.last_preview = Some(outcome.value.clone());
    Ok(CommandResult::Preview(outcome))
}

fn exec_export(session: &Session, path: &str) -> Result<CommandResult, ConsoleError> {
    let (value, what) = match (&session.last_preview, &session.document) {
        (Some(preview), _) => (preview, "preview"),
        (None, Some(doc)) => (doc, "document"),
        (None, None) => return Err(ConsoleError::NoDocument),
    };
    write_document(Path::new(path), value)?;
    Ok(CommandResult::Ok(format!("Wrote {what} to {path}.")))
}

// ---------------------------------------------------------------------------
// Rule sets
// ---------------------------------------------------------------------------

fn set_matches(set: &RuleSet, key: &str) -> bool {
    set.id == key || set.name == key
}

fn find_set_mut<'a>(sets: &'a mut [RuleSet], key: &str) -> Result<&'a mut RuleSet, ConsoleError> {
    sets.iter_mut()
        .find(|s| set_matches(s, key))
        .ok_or_else(|| ConsoleError::SetNotFound(key.to_string()))
}

fn exec_use(session: &mut Session, set: Option<String>) -> Result<CommandResult, ConsoleError> {
    let Some(key) = set else {
        session.active_set = None;
        return Ok(CommandResult::Use(None));
    };
    let found = session
        .store
        .load()?
        .into_iter()
        .find(|s| set_matches(s, &key))
        .ok_or(ConsoleError::SetNotFound(key))?;
    session.draft = found
        .active_rule()
        .map(|rule| rule.spec.clone())
        .unwrap_or_default();
    session.last_preview = None;
    session.active_set = Some(found.id.clone());
    Ok(CommandResult::Use(Some(found.id)))
}

fn exec_save(session: &mut Session, set: &str, rule: &str) -> Result<CommandResult, ConsoleError> {
    let spec = session.draft.clone();
    let (set_id, created) = session.store.modify(|sets| -> Result<_, ConsoleError> {
        let index = match sets.iter().position(|s| set_matches(s, set)) {
            Some(index) => index,
            None => {
                let taken: Vec<&str> = sets.iter().map(|s| s.id.as_str()).collect();
                let id = unique_id(&taken, set, "rule-set");
                sets.push(RuleSet {
                    id,
                    name: set.to_string(),
                    description: None,
                    rules: Vec::new(),
                });
                sets.len() - 1
            }
        };
        let target = &mut sets[index];
        let created = match target.rule_mut(rule) {
            Some(existing) => {
                existing.spec = spec;
                false
            }
            None => {
                let taken: Vec<&str> = target.rules.iter().map(|r| r.id.as_str()).collect();
                let id = unique_id(&taken, rule, "rule");
                target.rules.push(Rule {
                    id,
                    name: rule.to_string(),
                    description: None,
                    spec,
                    enabled: true,
                });
                true
            }
        };
        Ok((target.id.clone(), created))
    })?;

    session.active_set = Some(set_id.clone());
    let verb = if created { "Saved" } else { "Updated" };
    Ok(CommandResult::Ok(format!(
        "{verb} rule '{rule}' in set '{set_id}'."
    )))
}

fn exec_set_enabled(
    session: &mut Session,
    set: &str,
    rule: &str,
    enabled: bool,
) -> Result<CommandResult, ConsoleError> {
    session.store.modify(|sets| -> Result<_, ConsoleError> {
        let target = find_set_mut(sets, set)?;
        let entry = target.rule_mut(rule).ok_or_else(|| ConsoleError::RuleNotFound {
            set: set.to_string(),
            rule: rule.to_string(),
        })?;
        entry.enabled = enabled;
        Ok(())
    })?;
    let verb = if enabled { "Enabled" } else { "Disabled" };
    Ok(CommandResult::Ok(format!("{verb} rule '{rule}' in set '{set}'.")))
}

fn exec_delete_set(session: &mut Session, set: &str) -> Result<CommandResult, ConsoleError> {
    let removed = session.store.modify(|sets| -> Result<_, ConsoleError> {
        let index = sets
            .iter()
            .position(|s| set_matches(s, set))
            .ok_or_else(|| ConsoleError::SetNotFound(set.to_string()))?;
        Ok(sets.remove(index))
    })?;
    if session.active_set.as_deref() == Some(removed.id.as_str()) {
        session.active_set = None;
    }
    Ok(CommandResult::Ok(format!(
        "Deleted rule set '{}' ({} rule(s)).",
        removed.id,
        removed.rules.len()
    )))
}

fn exec_delete_rule(
    session: &mut Session,
    set: &str,
    rule: &str,
) -> Result<CommandResult, ConsoleError> {
    let removed = session.store.modify(|sets| -> Result<_, ConsoleError> {
        let target = find_set_mut(sets, set)?;
        let index = target
            .rules
            .iter()
            .position(|r| r.id == rule || r.name == rule)
            .ok_or_else(|| ConsoleError::RuleNotFound {
                set: set.to_string(),
                rule: rule.to_string(),
            })?;
        Ok(target.rules.remove(index))
    })?;
    Ok(CommandResult::Ok(format!(
        "Deleted rule '{}' from set '{set}'.",
        removed.id
    )))
}

fn exec_import_rules(session: &mut Session, path: &str) -> Result<CommandResult, ConsoleError> {
    let sets = import_rule_sets(Path::new(path))?
        .ok_or_else(|| ConsoleError::InvalidImport(path.to_string()))?;
    session.store.save(&sets)?;
    if let Some(active) = session.active_set.as_deref()
        && !sets.iter().any(|s| s.id == active)
    {
        session.active_set = None;
    }
    Ok(CommandResult::Ok(format!(
        "Imported {} rule set(s) from {path}.",
        sets.len()
    )))
}

/// Derive an id from a display name: lowercase alphanumerics with every other
/// run of characters collapsed to a single `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let trimmed = slug.trim_end_matches('-').len();
    slug.truncate(trimmed);
    slug
}

/// Slug of `name` not present in `taken`, suffixed `-2`, `-3`, ... on clashes.
fn unique_id(taken: &[&str], name: &str, fallback: &str) -> String {
    let mut base = slugify(name);
    if base.is_empty() {
        base = fallback.to_string();
    }
    if !taken.contains(&base.as_str()) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken.contains(&candidate.as_str()) {
            return candidate;
        }
        n += 1;
    }
}
