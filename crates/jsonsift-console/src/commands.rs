use jsonsift_core::types::{FilterCondition, FilterSpec, ProjectionMode, ProjectionRule};

/// A parsed console command.
#[derive(Debug)]
pub enum Command {
    Load {
        path: String,
    },
    Json {
        text: String,
    },
    Where {
        condition: FilterCondition,
    },
    Project {
        mode: ProjectionMode,
        rule: ProjectionRule,
    },
    ShowSpec,
    SetSpec {
        spec: FilterSpec,
    },
    Clear,
    Get {
        path: String,
    },
    Preview,
    Export {
        path: String,
    },
    ListSets,
    ListRules {
        set: String,
    },
    Use {
        set: Option<String>,
    },
    Save {
        set: String,
        rule: String,
    },
    SetEnabled {
        set: String,
        rule: String,
        enabled: bool,
    },
    DeleteSet {
        set: String,
    },
    DeleteRule {
        set: String,
        rule: String,
    },
    ExportRules {
        path: String,
    },
    ImportRules {
        path: String,
    },
    Help(Option<String>),
    Exit,
}
