//! Shared schema used by unit tests.

use crate::catalog::{
    AssociationDef, ComponentDef, Discriminator, EntityDef, EntityFilter, FilterDef,
    IdentifierDef, PropertyDef, ScalarType, SchemaBundle,
};

fn id() -> IdentifierDef {
    IdentifierDef::simple("id", "id", ScalarType::Int64)
}

/// A small sales model.
///
/// `Order.customer` and `Order.buyer` share the `customer_id` column, and
/// `OrderLine` carries a non-embedded composite key referencing `Order`.
pub(crate) fn sales_schema() -> SchemaBundle {
    let address = ComponentDef::new("Address")
        .with_property(PropertyDef::scalar("street", "street", ScalarType::String))
        .with_property(PropertyDef::association(
            "country",
            AssociationDef::many_to_one("Country", ["country_id"]).optional(),
        ));

    let customer = EntityDef::new("Customer", "customers", id())
        .with_property(PropertyDef::scalar("name", "name", ScalarType::String))
        .with_property(PropertyDef::component("address", address))
        .with_association("orders", AssociationDef::one_to_many("Order", ["customer_id"]));

    let country = EntityDef::new("Country", "countries", id())
        .with_property(PropertyDef::scalar("code", "code", ScalarType::String));

    let order = order(AssociationDef::many_to_one("Customer", ["customer_id"]));

    let line_item = EntityDef::new("LineItem", "line_items", id())
        .with_property(PropertyDef::scalar("quantity", "quantity", ScalarType::Int32))
        .with_association(
            "product",
            AssociationDef::many_to_one("Product", ["product_id"]).optional(),
        );

    let product = EntityDef::new("Product", "products", id())
        .with_property(PropertyDef::scalar("sku", "sku", ScalarType::String));

    let tag = EntityDef::new("Tag", "tags", id())
        .with_property(PropertyDef::scalar("label", "label", ScalarType::String));

    let line_key = ComponentDef::new("OrderLineKey")
        .with_property(PropertyDef::association(
            "order",
            AssociationDef::many_to_one("Order", ["order_id"]).fetch_join(),
        ))
        .with_property(PropertyDef::scalar("line_no", "line_no", ScalarType::Int32));

    let order_line = EntityDef::new(
        "OrderLine",
        "order_lines",
        IdentifierDef::composite("id", line_key),
    )
    .with_property(PropertyDef::scalar("quantity", "quantity", ScalarType::Int32));

    SchemaBundle::new(1)
        .with_filter(FilterDef::new("tenant").with_parameter("tenant_id"))
        .with_entity(customer)
        .with_entity(country)
        .with_entity(order)
        .with_entity(line_item)
        .with_entity(product)
        .with_entity(tag)
        .with_entity(order_line)
}

fn order(customer: AssociationDef) -> EntityDef {
    EntityDef::new("Order", "orders", id())
        .with_property(PropertyDef::scalar("total", "total", ScalarType::Float64))
        .with_association("customer", customer)
        .with_association("buyer", AssociationDef::many_to_one("Customer", ["customer_id"]))
        .with_association("items", AssociationDef::one_to_many("LineItem", ["order_id"]))
        .with_association(
            "notes",
            AssociationDef::value_collection("order_notes", ["order_id"], "note", ScalarType::String),
        )
        .with_association(
            "tags",
            AssociationDef::many_to_many("order_tags", ["order_id"], "Tag", ["tag_id"]),
        )
        .with_discriminator(Discriminator::new("kind", ["O"]))
        .with_filter(EntityFilter::new("tenant", "{alias}.tenant_id = :tenant_id"))
}

/// The sales model with `Order.customer` mapped as an eager join, at the
/// same schema version.
pub(crate) fn eager_customer_schema() -> SchemaBundle {
    sales_schema().with_entity(order(
        AssociationDef::many_to_one("Customer", ["customer_id"]).fetch_join(),
    ))
}
