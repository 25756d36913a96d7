//! Human-readable rendering of a join plan.

use super::result::{PlanResult, ResultType};
use std::fmt::Write;

impl PlanResult {
    /// Render the plan as an indented join tree followed by the statement
    /// fragments.
    pub fn explain(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(
            out,
            "{}: {} {} [{}]",
            self.comment,
            self.root_table,
            self.root_alias,
            self.root_entity
        );

        for join in &self.joins {
            let indent = "  ".repeat(join.depth + 1);
            if let Some(bridge) = &join.bridge {
                let _ = writeln!(
                    out,
                    "{}{} {} {} on {}",
                    indent,
                    join.kind.keyword(),
                    bridge.table,
                    bridge.alias,
                    bridge.condition
                );
            }
            let alias_note = match join.logical_alias.as_ref() {
                Some(logical) => format!(" as {}", logical.name().unwrap_or("<anonymous>")),
                None => String::new(),
            };
            let _ = writeln!(
                out,
                "{}{} {} {} on {}  -- {} ({}){}",
                indent,
                join.kind.keyword(),
                join.table,
                join.alias,
                join.on_clause(),
                join.path,
                join.association,
                alias_note
            );
        }

        for (path, alias) in &self.collapsed_paths {
            let _ = writeln!(out, "  -- {} reuses {}", path, alias);
        }

        if let Some(select) = &self.select {
            let _ = writeln!(out, "select: {}", select);
        }
        if !self.where_clause.is_empty() {
            let _ = writeln!(out, "where: {}", self.where_clause);
        }
        if let Some(group_by) = &self.group_by {
            let _ = writeln!(out, "group by: {}", group_by);
        }
        if let Some(having) = &self.having {
            let _ = writeln!(out, "having: {}", having);
        }
        if !self.order_by.is_empty() {
            let _ = writeln!(out, "order by: {}", self.order_by);
        }

        let types: Vec<String> = self
            .result_types
            .types()
            .iter()
            .map(|t| match t {
                ResultType::Scalar(scalar) => scalar.name().to_string(),
                ResultType::Entity(entity) => format!("ref {}", entity),
            })
            .collect();
        let _ = writeln!(out, "returns: ({})", types.join(", "));

        let aliases: Vec<&str> = self
            .user_aliases
            .as_slice()
            .iter()
            .map(|a| a.as_deref().unwrap_or("-"))
            .collect();
        let _ = write!(out, "user aliases: [{}]", aliases.join(", "));

        out
    }
}
