//! Filter fragment rendering.

use super::enabled::EnabledFilters;
use crate::catalog::{Discriminator, EntityDef, SchemaBundle};
use crate::criteria::{conjunction, render};
use crate::error::Result;

/// Renders the row filter fragment of an entity.
pub trait FilterSource: Send + Sync {
    /// Fragment restricting rows of `entity` under `alias`; empty when no
    /// restriction applies.
    fn filter_fragment(&self, alias: &str, entity: &EntityDef, enabled: &EnabledFilters)
        -> Result<String>;
}

/// Filter source backed by the schema's discriminators and filter conditions.
#[derive(Debug, Clone, Copy)]
pub struct SchemaFilterSource<'s> {
    schema: &'s SchemaBundle,
}

impl<'s> SchemaFilterSource<'s> {
    /// Create a filter source over `schema`.
    pub fn new(schema: &'s SchemaBundle) -> Self {
        Self { schema }
    }
}

impl FilterSource for SchemaFilterSource<'_> {
    fn filter_fragment(
        &self,
        alias: &str,
        entity: &EntityDef,
        enabled: &EnabledFilters,
    ) -> Result<String> {
        enabled.validate(self.schema)?;

        let mut parts = Vec::new();
        if let Some(discriminator) = &entity.discriminator {
            parts.push(discriminator_fragment(alias, discriminator));
        }

        for filter in entity.filters.iter().filter(|f| enabled.is_enabled(&f.name)) {
            let parameters = self
                .schema
                .get_filter(&filter.name)
                .map(|def| def.parameters.as_slice())
                .unwrap_or_default();
            let condition = render(&filter.condition, |name| {
                (name == "alias").then(|| alias.to_string())
            })?;
            parts.push(qualify_parameters(&condition, &filter.name, parameters));
        }

        Ok(conjunction(parts))
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn discriminator_fragment(alias: &str, discriminator: &Discriminator) -> String {
    match discriminator.values.as_slice() {
        [value] => format!("{}.{} = {}", alias, discriminator.column, quote(value)),
        values => format!(
            "{}.{} in ({})",
            alias,
            discriminator.column,
            values.iter().map(|v| quote(v)).collect::<Vec<_>>().join(", ")
        ),
    }
}

/// Rewrite `:param` to `:filter.param` for declared parameters.
fn qualify_parameters(condition: &str, filter: &str, parameters: &[String]) -> String {
    let mut out = String::with_capacity(condition.len());
    let mut chars = condition.char_indices().peekable();
    let mut previous = None;

    while let Some((i, c)) = chars.next() {
        out.push(c);
        if c != ':' || previous == Some(':') {
            previous = Some(c);
            continue;
        }
        previous = Some(c);

        let rest = &condition[i + 1..];
        let len = rest
            .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
            .unwrap_or(rest.len());
        let name = &rest[..len];
        if !name.is_empty() && parameters.iter().any(|p| p == name) {
            out.push_str(filter);
            out.push('.');
            out.push_str(name);
            for _ in 0..len {
                chars.next();
            }
            previous = name.chars().last();
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::test_schema::sales_schema;

    #[test]
    fn test_discriminator_only() {
        let schema = sales_schema();
        let source = SchemaFilterSource::new(&schema);
        let order = schema.entity("Order").unwrap();

        let fragment = source
            .filter_fragment("this_", order, &EnabledFilters::new())
            .unwrap();
        assert_eq!(fragment, "this_.kind = 'O'");
    }

    #[test]
    fn test_enabled_filter_condition() {
        let schema = sales_schema();
        let source = SchemaFilterSource::new(&schema);
        let order = schema.entity("Order").unwrap();
        let enabled = EnabledFilters::new().enable_with("tenant", [("tenant_id", 3)]);

        let fragment = source.filter_fragment("this_", order, &enabled).unwrap();
        assert_eq!(
            fragment,
            "(this_.kind = 'O') and (this_.tenant_id = :tenant.tenant_id)"
        );
    }

    #[test]
    fn test_entity_without_restrictions() {
        let schema = sales_schema();
        let source = SchemaFilterSource::new(&schema);
        let product = schema.entity("Product").unwrap();
        let enabled = EnabledFilters::new().enable_with("tenant", [("tenant_id", 3)]);

        assert_eq!(source.filter_fragment("p_", product, &enabled).unwrap(), "");
    }

    #[test]
    fn test_invalid_filter_set() {
        let schema = sales_schema();
        let source = SchemaFilterSource::new(&schema);
        let order = schema.entity("Order").unwrap();

        let err = source
            .filter_fragment("this_", order, &EnabledFilters::new().enable("tenant"))
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_discriminator_values() {
        let many = Discriminator::new("kind", ["A", "B"]);
        assert_eq!(discriminator_fragment("t_", &many), "t_.kind in ('A', 'B')");

        let quoted = Discriminator::new("kind", ["O'Neil"]);
        assert_eq!(discriminator_fragment("t_", &quoted), "t_.kind = 'O''Neil'");
    }

    #[test]
    fn test_qualify_parameters() {
        let params = vec!["id".to_string(), "since".to_string()];

        assert_eq!(
            qualify_parameters("a.id = :id and a.created >= :since", "f", &params),
            "a.id = :f.id and a.created >= :f.since"
        );
        assert_eq!(
            qualify_parameters("a.code = :identity", "f", &params),
            "a.code = :identity"
        );
        assert_eq!(
            qualify_parameters("a.id::text = :id", "f", &params),
            "a.id::text = :f.id"
        );
    }
}
