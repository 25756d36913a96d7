//! Output formatters for join plans.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use ormwalk_core::plan::{JoinNode, LogicalAlias};
use ormwalk_core::PlanResult;

/// Output format for plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table of joins
    Table,
    /// The plan as JSON
    Json,
    /// Indented join tree
    Explain,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Explain => write!(f, "explain"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter: Send + Sync {
    /// Format a join plan.
    fn format_plan(&self, plan: &PlanResult) -> String;

    /// Format an error message.
    fn format_error(&self, error: &str) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Explain => Box::new(ExplainFormatter),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_plan(&self, plan: &PlanResult) -> String {
        let mut output = format!(
            "{} {} [{}]\n",
            plan.root_table, plan.root_alias, plan.root_entity
        );

        if plan.joins.is_empty() {
            output.push_str("No joins\n");
        } else {
            output.push_str(&joins_table(&plan.joins).to_string());
            output.push('\n');
        }

        for (path, alias) in &plan.collapsed_paths {
            output.push_str(&format!("{} reuses {}\n", path, alias));
        }

        let user_aliases: Vec<&str> = plan
            .user_aliases
            .as_slice()
            .iter()
            .map(|a| a.as_deref().unwrap_or("-"))
            .collect();
        output.push_str(&format!("user aliases: [{}]\n", user_aliases.join(", ")));

        if !plan.where_clause.is_empty() {
            output.push_str(&format!("where: {}\n", plan.where_clause));
        }

        output.push_str(&format!("{} join(s)", plan.joins.len()));
        output
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}", error)
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_plan(&self, plan: &PlanResult) -> String {
        serde_json::to_string_pretty(plan).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({
            "error": error
        })
        .to_string()
    }
}

/// Explain formatter.
pub struct ExplainFormatter;

impl Formatter for ExplainFormatter {
    fn format_plan(&self, plan: &PlanResult) -> String {
        plan.explain()
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}", error)
    }
}

fn joins_table(joins: &[JoinNode]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["path", "alias", "join", "table", "on", "user alias"]);

    for join in joins {
        let table_cell = match &join.bridge {
            Some(bridge) => format!("{} {} -> {}", bridge.table, bridge.alias, join.table),
            None => join.table.clone(),
        };
        table.add_row(vec![
            Cell::new(&join.path),
            Cell::new(&join.alias),
            Cell::new(join.kind.keyword()),
            Cell::new(table_cell),
            Cell::new(join.on_clause()),
            Cell::new(format_logical_alias(join.logical_alias.as_ref())),
        ]);
    }

    table
}

fn format_logical_alias(alias: Option<&LogicalAlias>) -> &str {
    match alias {
        Some(LogicalAlias::Named(name)) => name.as_str(),
        Some(LogicalAlias::Anonymous) => "<anonymous>",
        None => "-",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ormwalk_core::catalog::{AssociationDef, EntityDef, IdentifierDef, ScalarType, SchemaBundle};
    use ormwalk_core::plan::JoinKind;
    use ormwalk_core::{CriteriaQuery, EnabledFilters, Planner};

    fn sample_plan() -> PlanResult {
        let id = || IdentifierDef::simple("id", "id", ScalarType::Int64);
        let schema = SchemaBundle::new(1)
            .with_entity(
                EntityDef::new("Post", "posts", id())
                    .with_association("author", AssociationDef::many_to_one("User", ["author_id"])),
            )
            .with_entity(EntityDef::new("User", "users", id()));
        let query = CriteriaQuery::new("Post").create_alias("author", "u", JoinKind::Inner);

        Planner::default()
            .plan_criteria(&schema, &query, &EnabledFilters::new())
            .unwrap()
            .as_ref()
            .clone()
    }

    #[test]
    fn test_table_formatter() {
        let output = TableFormatter.format_plan(&sample_plan());

        assert!(output.starts_with("posts this_ [Post]"));
        assert!(output.contains("u0_"));
        assert!(output.contains("this_.author_id = u0_.id"));
        assert!(output.contains("user aliases: [u, this]"));
        assert!(output.ends_with("1 join(s)"));
    }

    #[test]
    fn test_json_formatter() {
        let output = JsonFormatter.format_plan(&sample_plan());
        let parsed: PlanResult = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, sample_plan());

        let error: serde_json::Value =
            serde_json::from_str(&JsonFormatter.format_error("boom")).unwrap();
        assert_eq!(error["error"], "boom");
    }

    #[test]
    fn test_explain_formatter() {
        let output = ExplainFormatter.format_plan(&sample_plan());
        assert!(output.contains("inner join users u0_"));
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Table.to_string(), "table");
        assert_eq!(OutputFormat::Explain.to_string(), "explain");
    }
}
