//! End-to-end planning over a small library model.

use std::collections::HashSet;
use std::sync::Arc;

use ormwalk_core::catalog::{
    AssociationDef, Catalog, ComponentDef, EntityDef, EntityFilter, FetchMode, FilterDef,
    IdentifierDef, PropertyDef, ScalarType, SchemaBundle,
};
use ormwalk_core::criteria::{CriteriaQuery, OrderSpec, Projection};
use ormwalk_core::filter::EnabledFilters;
use ormwalk_core::plan::{JoinKind, LogicalAlias, PlanResult, ResultType};
use ormwalk_core::{Error, Planner, PlannerConfig};

fn id() -> IdentifierDef {
    IdentifierDef::simple("id", "id", ScalarType::Int64)
}

fn library_schema(chapters_fetch: FetchMode) -> SchemaBundle {
    let author = EntityDef::new("Author", "authors", id())
        .with_property(PropertyDef::scalar("name", "name", ScalarType::String))
        .with_association("books", AssociationDef::one_to_many("Book", ["author_id"]));

    let publisher = EntityDef::new("Publisher", "publishers", id())
        .with_property(PropertyDef::scalar("name", "name", ScalarType::String));

    let book = EntityDef::new("Book", "books", id())
        .with_property(PropertyDef::scalar("title", "title", ScalarType::String))
        .with_association("author", AssociationDef::many_to_one("Author", ["author_id"]))
        .with_association(
            "publisher",
            AssociationDef::many_to_one("Publisher", ["publisher_id"]).optional(),
        )
        .with_association(
            "chapters",
            AssociationDef::one_to_many("Chapter", ["book_id"]).with_fetch(chapters_fetch),
        )
        .with_filter(EntityFilter::new("region", "{alias}.region = :code"))
        .with_filter(EntityFilter::new("published", "{alias}.published_at is not null"));

    let chapter = EntityDef::new("Chapter", "chapters", id())
        .with_property(PropertyDef::scalar("title", "title", ScalarType::String))
        .with_association(
            "book",
            AssociationDef::many_to_one("Book", ["book_id"]).fetch_join(),
        );

    let edition_key = ComponentDef::new("EditionKey")
        .with_property(PropertyDef::association(
            "book",
            AssociationDef::many_to_one("Book", ["book_id"]),
        ))
        .with_property(PropertyDef::scalar("number", "number", ScalarType::Int32));
    let edition = EntityDef::new("Edition", "editions", IdentifierDef::composite("id", edition_key))
        .with_property(PropertyDef::scalar("year", "year", ScalarType::Int32));

    SchemaBundle::new(1)
        .with_filter(FilterDef::new("region").with_parameter("code"))
        .with_filter(FilterDef::new("published"))
        .with_entity(author)
        .with_entity(publisher)
        .with_entity(book)
        .with_entity(chapter)
        .with_entity(edition)
}

fn plan(schema: &SchemaBundle, query: &CriteriaQuery) -> ormwalk_core::Result<Arc<PlanResult>> {
    Planner::default().plan_criteria(schema, query, &EnabledFilters::new())
}

fn assert_plan_invariants(plan: &PlanResult) {
    let aliases = plan.physical_aliases();
    let unique: HashSet<&str> = aliases.iter().copied().collect();
    assert_eq!(unique.len(), aliases.len(), "physical aliases must be unique");

    assert_eq!(plan.user_aliases.len(), plan.alias_consuming_joins() + 1);
    for join in &plan.joins {
        assert!(join.kind.is_joined());
    }
}

#[test]
fn test_lazy_root_plans_no_joins() {
    let schema = library_schema(FetchMode::Default);
    let plan = plan(&schema, &CriteriaQuery::new("Book")).unwrap();

    assert!(plan.joins.is_empty());
    assert_eq!(plan.root_alias, "this_");
    assert_eq!(plan.where_clause, "");
    assert_eq!(plan.user_aliases.as_slice(), &[Some("this".to_string())]);
    assert!(plan.result_types.is_entity_reference());
    assert_plan_invariants(&plan);
}

#[test]
fn test_fetch_join_collection_is_outer() {
    let schema = library_schema(FetchMode::Default);
    let query = CriteriaQuery::new("Book").set_fetch_mode("chapters", FetchMode::Join);
    let plan = plan(&schema, &query).unwrap();

    let chapters = plan.join_for("chapters").unwrap();
    assert_eq!(chapters.kind, JoinKind::Outer);
    assert_eq!(chapters.alias, "chapters0_");
    assert_eq!(chapters.logical_alias, Some(LogicalAlias::Anonymous));
    assert_eq!(plan.user_aliases.as_slice(), &[None, Some("this".to_string())]);
    assert_plan_invariants(&plan);
}

#[test]
fn test_explicit_inner_join_survives_projection() {
    let schema = library_schema(FetchMode::Default);
    let query = CriteriaQuery::new("Book")
        .create_alias("author", "a", JoinKind::Inner)
        .set_fetch_mode("chapters", FetchMode::Join)
        .set_projection(Projection::new().with_column("{a}.name", ResultType::Scalar(ScalarType::String)))
        .add_order(OrderSpec::asc("{a}.name"));
    let plan = plan(&schema, &query).unwrap();

    assert_eq!(plan.joins.len(), 1);
    let author = plan.join_for("author").unwrap();
    assert_eq!(author.kind, JoinKind::Inner);
    assert_eq!(author.alias, "a0_");
    assert_eq!(author.condition.to_string(), "this_.author_id = a0_.id");

    assert_eq!(plan.select.as_deref(), Some("a0_.name"));
    assert_eq!(plan.order_by, "a0_.name asc");
    assert_eq!(
        plan.user_aliases.as_slice(),
        &[Some("a".to_string()), Some("this".to_string())]
    );
    assert!(plan
        .explain()
        .contains("inner join authors a0_ on this_.author_id = a0_.id"));
    assert_plan_invariants(&plan);
}

#[test]
fn test_mixed_fetches_are_unique_and_deterministic() {
    let schema = library_schema(FetchMode::Default);
    let query = CriteriaQuery::new("Book")
        .set_fetch_mode("author", FetchMode::Join)
        .set_fetch_mode("publisher", FetchMode::Join)
        .set_fetch_mode("chapters", FetchMode::Join);

    let first = plan(&schema, &query).unwrap();
    let second = plan(&schema, &query).unwrap();
    assert_eq!(first, second);

    assert_eq!(first.join_for("author").unwrap().kind, JoinKind::Inner);
    assert_eq!(first.join_for("publisher").unwrap().kind, JoinKind::Outer);
    assert!(first.query_spaces.contains("authors"));
    assert!(first.query_spaces.contains("publishers"));
    assert_eq!(first.user_aliases.root(), Some("this"));
    assert_plan_invariants(&first);
}

#[test]
fn test_mapping_cycle_is_broken() {
    let schema = library_schema(FetchMode::Join);

    let from_book = plan(&schema, &CriteriaQuery::new("Book")).unwrap();
    let paths: Vec<&str> = from_book.joins.iter().map(|j| j.path.as_str()).collect();
    assert_eq!(paths, vec!["chapters"]);

    let from_chapter = plan(&schema, &CriteriaQuery::new("Chapter")).unwrap();
    let paths: Vec<&str> = from_chapter.joins.iter().map(|j| j.path.as_str()).collect();
    assert_eq!(paths, vec!["book"]);
    assert_eq!(from_chapter.alias_for("book"), Some("book0_"));
    assert_eq!(from_chapter.join_for("book").unwrap().kind, JoinKind::Inner);
}

#[test]
fn test_entity_load_of_chapter() {
    let schema = library_schema(FetchMode::Join);
    let plan = Planner::default()
        .plan_entity_load(&schema, "Chapter", &EnabledFilters::new())
        .unwrap();

    assert_eq!(plan.root_alias, "chapter0_");
    assert_eq!(plan.alias_for("book"), Some("book1_"));
    assert!(plan.join_for("book.chapters").is_none());
    assert_eq!(plan.user_aliases.as_slice(), &[None, None]);
}

#[test]
fn test_composite_identifier_association_is_reachable() {
    let schema = library_schema(FetchMode::Default);
    let query = CriteriaQuery::new("Edition").create_alias("id.book", "b", JoinKind::Inner);
    let plan = plan(&schema, &query).unwrap();

    let book = plan.join_for("id.book").unwrap();
    assert_eq!(book.alias, "b0_");
    assert_eq!(book.lhs_alias, "this_");
    assert_eq!(book.condition.to_string(), "this_.book_id = b0_.id");
    assert_eq!(
        plan.user_aliases.as_slice(),
        &[Some("b".to_string()), Some("this".to_string())]
    );
}

#[test]
fn test_restrictions_and_filters_compose() {
    let schema = library_schema(FetchMode::Default);
    let query = CriteriaQuery::new("Book").add_restriction("{alias}.title like ?");
    let filters = EnabledFilters::new()
        .enable("published")
        .enable_with("region", [("code", "EU")]);

    let plan = Planner::default()
        .plan_criteria(&schema, &query, &filters)
        .unwrap();
    assert_eq!(
        plan.where_clause,
        "(this_.title like ?) and \
         ((this_.region = :region.code) and (this_.published_at is not null))"
    );
}

#[test]
fn test_disjunctive_restriction_keeps_filter() {
    let schema = library_schema(FetchMode::Default);
    let query = CriteriaQuery::new("Book")
        .add_restriction("{alias}.title like ? or {alias}.title is null");
    let filters = EnabledFilters::new().enable("published");

    let plan = Planner::default()
        .plan_criteria(&schema, &query, &filters)
        .unwrap();
    assert_eq!(
        plan.where_clause,
        "(this_.title like ? or this_.title is null) and (this_.published_at is not null)"
    );
}

#[test]
fn test_filter_without_parameter_is_rejected() {
    let schema = library_schema(FetchMode::Default);
    let filters = EnabledFilters::new().enable("region");

    let err = Planner::default()
        .plan_criteria(&schema, &CriteriaQuery::new("Book"), &filters)
        .unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn test_alias_conflicts() {
    let schema = library_schema(FetchMode::Default);

    let reused = CriteriaQuery::new("Book")
        .create_alias("author", "a", JoinKind::Inner)
        .create_alias("publisher", "a", JoinKind::Outer);
    assert!(matches!(
        plan(&schema, &reused),
        Err(Error::AmbiguousAlias { .. })
    ));

    let root_clash = CriteriaQuery::new("Book").create_alias("author", "this", JoinKind::Inner);
    assert!(matches!(
        plan(&schema, &root_clash),
        Err(Error::AmbiguousAlias { .. })
    ));
}

#[test]
fn test_unjoinable_paths() {
    let schema = library_schema(FetchMode::Default);

    let scalar = CriteriaQuery::new("Book").create_alias("title", "t", JoinKind::Inner);
    assert!(matches!(
        plan(&schema, &scalar),
        Err(Error::UnsupportedFetch { .. })
    ));

    let missing = CriteriaQuery::new("Book").create_alias("editor", "e", JoinKind::Inner);
    assert!(matches!(
        plan(&schema, &missing),
        Err(Error::UnknownProperty { .. })
    ));
}

#[test]
fn test_catalog_schema_swap_replans() {
    let catalog = Catalog::with_schema(library_schema(FetchMode::Default)).unwrap();
    let planner = Planner::new(PlannerConfig::default()).with_cache(8);
    let query = CriteriaQuery::new("Book");
    let filters = EnabledFilters::new();

    let before = planner.plan_with_catalog(&catalog, &query, &filters).unwrap();
    assert!(before.joins.is_empty());

    catalog.apply_schema(library_schema(FetchMode::Join)).unwrap();
    let after = planner.plan_with_catalog(&catalog, &query, &filters).unwrap();
    assert_eq!(after.joins.len(), 1);
    assert_eq!(planner.cache().unwrap().schema_version(), 2);
}
