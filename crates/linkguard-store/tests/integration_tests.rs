//! Integration tests for linkguard-store
//!
//! These tests verify resource reads, relation queries and publishing
//! against a real SQLite database.

use linkguard_domain::traits::RelationStore;
use linkguard_domain::{
    Project, Relation, RelationFilter, RelationType, RelationTypeRegistry, RequestContext, Resource,
    ResourceFilter, ResourceRef, ResourceState, ResourceType,
};
use linkguard_store::{SqliteStore, StoreError};
use std::sync::Arc;

fn registry() -> Arc<RelationTypeRegistry> {
    let mut registry = RelationTypeRegistry::new();
    registry.add_user_defined("REQUIRES", true).unwrap();
    registry.freeze();
    Arc::new(registry)
}

fn offline_ctx() -> RequestContext {
    RequestContext::new("admin", Project::Offline, "").with_request_time(1_000)
}

/// Store with a small site: two pages linking to an image
fn seeded_store() -> (SqliteStore, Resource, Resource, Resource) {
    let mut store = SqliteStore::new(":memory:", registry()).unwrap();
    let page = Resource::file("/sites/a/index.html", "xmlpage");
    let about = Resource::file("/sites/a/about.html", "xmlpage");
    let logo = Resource::file("/sites/a/img/logo.png", "image");
    for resource in [&page, &about, &logo] {
        store.write_resource(Project::Offline, resource).unwrap();
    }
    store.write_resource(Project::Offline, &Resource::folder("/sites/a")).unwrap();
    store.write_resource(Project::Offline, &Resource::folder("/sites/a/img")).unwrap();

    store
        .write_relation(
            Project::Offline,
            &Relation::between(&page, &logo, RelationType::EMBEDDED_IMAGE),
        )
        .unwrap();
    store
        .write_relation(
            Project::Offline,
            &Relation::between(&page, &about, RelationType::HYPERLINK),
        )
        .unwrap();
    store
        .write_relation(
            Project::Offline,
            &Relation::between(&about, &logo, RelationType::EMBEDDED_IMAGE),
        )
        .unwrap();
    (store, page, about, logo)
}

#[test]
fn test_store_initialization() {
    let store = SqliteStore::new(":memory:", registry());
    assert!(store.is_ok(), "Store should initialize successfully");
}

#[test]
fn test_read_resource_by_id_and_path() {
    let (store, page, _, _) = seeded_store();
    let ctx = offline_ctx();

    let by_id = store
        .read_resource(&ctx, ResourceRef::Id(page.structure_id), &ResourceFilter::DEFAULT)
        .unwrap()
        .expect("page by id");
    assert_eq!(by_id, page);

    let by_path = store
        .read_resource(&ctx, ResourceRef::Path("/sites/a/index.html"), &ResourceFilter::DEFAULT)
        .unwrap();
    assert_eq!(by_path, Some(page));

    let missing = store
        .read_resource(&ctx, ResourceRef::Path("/sites/a/missing.html"), &ResourceFilter::DEFAULT)
        .unwrap();
    assert!(missing.is_none());
}

#[test]
fn test_read_resource_resolves_site_paths() {
    let (store, page, _, _) = seeded_store();
    let ctx = RequestContext::new("editor", Project::Offline, "/sites/a/");

    let found = store
        .read_resource(&ctx, ResourceRef::Path("/index.html"), &ResourceFilter::DEFAULT)
        .unwrap();
    assert_eq!(found.map(|r| r.structure_id), Some(page.structure_id));

    // Folders are found with or without trailing slash
    let folder = store
        .read_resource(&ctx, ResourceRef::Path("/img"), &ResourceFilter::DEFAULT)
        .unwrap()
        .expect("folder");
    assert!(folder.is_folder());
    assert_eq!(folder.root_path, "/sites/a/img/");
}

#[test]
fn test_projects_are_separate() {
    let (store, page, _, _) = seeded_store();
    let online = RequestContext::new("admin", Project::Online, "");
    let found = store
        .read_resource(&online, ResourceRef::Id(page.structure_id), &ResourceFilter::ALL)
        .unwrap();
    assert!(found.is_none(), "Nothing is published yet");
}

#[test]
fn test_read_resource_applies_filter() {
    let mut store = SqliteStore::new(":memory:", registry()).unwrap();
    let deleted = Resource::file("/gone.html", "xmlpage").with_state(ResourceState::Deleted);
    let expired = Resource::file("/old.html", "xmlpage").with_time_range(0, 500);
    store.write_resource(Project::Offline, &deleted).unwrap();
    store.write_resource(Project::Offline, &expired).unwrap();
    let ctx = offline_ctx();

    let read = |path: &str, filter: &ResourceFilter| {
        store
            .read_resource(&ctx, ResourceRef::Path(path), filter)
            .unwrap()
    };
    assert!(read("/gone.html", &ResourceFilter::DEFAULT).is_none());
    assert!(read("/gone.html", &ResourceFilter::ALL).is_some());
    assert!(read("/old.html", &ResourceFilter::DEFAULT).is_none());
    assert!(read("/old.html", &ResourceFilter::IGNORE_EXPIRATION).is_some());
}

#[test]
fn test_read_resources_recursive_and_flat() {
    let (store, _, _, _) = seeded_store();
    let ctx = offline_ctx();

    let flat = store
        .read_resources(&ctx, "/sites/a", &ResourceFilter::DEFAULT, false)
        .unwrap();
    let flat_paths: Vec<_> = flat.iter().map(|r| r.root_path.as_str()).collect();
    assert_eq!(flat_paths, vec!["/sites/a/about.html", "/sites/a/img/", "/sites/a/index.html"]);

    let deep = store
        .read_resources(&ctx, "/sites/a/", &ResourceFilter::DEFAULT, true)
        .unwrap();
    assert_eq!(deep.len(), 4);
    assert!(deep.iter().any(|r| r.root_path == "/sites/a/img/logo.png"));

    let typed = store
        .read_resources(&ctx, "/", &ResourceFilter::DEFAULT.with_required_type("image"), true)
        .unwrap();
    assert_eq!(typed.len(), 1);
}

#[test]
fn test_siblings() {
    let mut store = SqliteStore::new(":memory:", registry()).unwrap();
    let original = Resource::file("/a/doc.pdf", "binary");
    let copy = original.sibling("/b/doc.pdf");
    store.write_resource(Project::Offline, &original).unwrap();
    store.write_resource(Project::Offline, &copy).unwrap();
    let ctx = offline_ctx();

    let read = store
        .read_resource(&ctx, ResourceRef::Path("/a/doc.pdf"), &ResourceFilter::ALL)
        .unwrap()
        .unwrap();
    assert_eq!(read.sibling_count, 2);

    let siblings = store
        .read_siblings(&ctx, "/a/doc.pdf", &ResourceFilter::ALL)
        .unwrap();
    let paths: Vec<_> = siblings.iter().map(|r| r.root_path.as_str()).collect();
    assert_eq!(paths, vec!["/a/doc.pdf", "/b/doc.pdf"]);

    assert!(matches!(
        store.read_siblings(&ctx, "/c/doc.pdf", &ResourceFilter::ALL),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn test_find_relations_by_direction() {
    let (store, page, about, logo) = seeded_store();
    let ctx = offline_ctx();

    // Who points at the logo
    let sources = store.find_relations(&ctx, &logo, &RelationFilter::SOURCES).unwrap();
    let source_paths: Vec<_> = sources.iter().map(|r| r.source_path()).collect();
    assert_eq!(source_paths, vec!["/sites/a/index.html", "/sites/a/about.html"]);

    // What the page points at
    let targets = store.find_relations(&ctx, &page, &RelationFilter::TARGETS).unwrap();
    assert_eq!(targets.len(), 2);
    assert!(targets.contains(&Relation::between(&page, &about, RelationType::HYPERLINK)));

    // Both directions
    let all = store.find_relations(&ctx, &about, &RelationFilter::ALL).unwrap();
    assert_eq!(all.len(), 2);

    assert!(store
        .find_relations(&ctx, &page, &RelationFilter::SOURCES)
        .unwrap()
        .is_empty());
}

#[test]
fn test_find_relations_with_restrictions() {
    let (store, page, _, logo) = seeded_store();
    let ctx = offline_ctx();

    let images = RelationFilter::TARGETS.filter_type(RelationType::EMBEDDED_IMAGE);
    let found = store.find_relations(&ctx, &page, &images).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].target_path(), "/sites/a/img/logo.png");

    let into_img = RelationFilter::TARGETS.filter_path("/sites/a/img/").filter_include_children();
    assert_eq!(store.find_relations(&ctx, &page, &into_img).unwrap().len(), 1);

    let exact = RelationFilter::TARGETS.filter_path("/sites/a/img/");
    assert!(store.find_relations(&ctx, &page, &exact).unwrap().is_empty());

    let from_page = RelationFilter::SOURCES.filter_structure_id(page.structure_id);
    let found = store.find_relations(&ctx, &logo, &from_page).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].source_id(), page.structure_id);
}

#[test]
fn test_find_relations_by_path_when_target_id_unknown() {
    let (mut store, page, _, _) = seeded_store();
    let later = Resource::file("/sites/a/later.html", "xmlpage");
    let by_path = Relation::new(
        Some(page.structure_id),
        Some(page.root_path.clone()),
        None,
        Some(later.root_path.clone()),
        RelationType::HYPERLINK,
    );
    store.write_relation(Project::Offline, &by_path).unwrap();
    store.write_resource(Project::Offline, &later).unwrap();

    let sources = store
        .find_relations(&offline_ctx(), &later, &RelationFilter::SOURCES)
        .unwrap();
    assert_eq!(sources.len(), 1);
    assert!(sources[0].target_id().is_null());
}

#[test]
fn test_add_relation_rules() {
    let (mut store, page, _, _) = seeded_store();
    let ctx = RequestContext::new("editor", Project::Offline, "/sites/a");

    let relation = store
        .add_relation(&ctx, "/index.html", "/about.html", "requires")
        .unwrap();
    assert_eq!(relation.source_id(), page.structure_id);
    assert_eq!(relation.target_path(), "/sites/a/about.html");

    let category = store.add_relation(&ctx, "/index.html", "/img/", "CATEGORY");
    assert!(category.is_ok());

    assert!(matches!(
        store.add_relation(&ctx, "/index.html", "/about.html", "A"),
        Err(StoreError::DefinedInContent(_))
    ));
    assert!(matches!(
        store.add_relation(&ctx, "/index.html", "/about.html", "NOPE"),
        Err(StoreError::Registry(_))
    ));
    assert!(matches!(
        store.add_relation(&ctx, "/index.html", "/nowhere.html", "REQUIRES"),
        Err(StoreError::NotFound(_))
    ));

    let targets = store.find_relations(&ctx, &page, &RelationFilter::TARGETS).unwrap();
    assert_eq!(targets.len(), 4);
}

#[test]
fn test_delete_relations_only_removes_matching() {
    let (mut store, page, _, _) = seeded_store();
    let ctx = offline_ctx();

    let deleted = store
        .delete_relations(
            &ctx,
            &page,
            &RelationFilter::TARGETS.filter_type(RelationType::HYPERLINK),
        )
        .unwrap();
    assert_eq!(deleted, 1);

    let remaining = store.find_relations(&ctx, &page, &RelationFilter::TARGETS).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].relation_type(), &RelationType::EMBEDDED_IMAGE);
}

#[test]
fn test_unknown_type_id_is_invalid_data() {
    let (mut store, page, about, _) = seeded_store();
    let mut unregistered = RelationTypeRegistry::new();
    let orphan = unregistered.add_user_defined("ORPHAN", false).unwrap();
    unregistered.add_user_defined("ORPHAN2", false).unwrap();
    let second = unregistered.value_of("ORPHAN2").unwrap();
    assert_eq!(orphan.id(), 100);
    // Id 101 is unknown to the store's registry
    store
        .write_relation(Project::Offline, &Relation::between(&page, &about, second))
        .unwrap();
    let result = store.find_relations(&offline_ctx(), &page, &RelationFilter::TARGETS);
    assert!(result.is_err());
}

#[test]
fn test_resource_types() {
    let mut store = SqliteStore::new(":memory:", registry()).unwrap();
    store.add_resource_type(&ResourceType::new("xmlpage", true)).unwrap();
    store.add_resource_type(&ResourceType::new("image", false)).unwrap();
    store.add_resource_type(&ResourceType::new("image", false)).unwrap();

    let types = store.resource_types().unwrap();
    assert_eq!(types.len(), 2);
    assert_eq!(types[0].name, "image");
    assert!(types[1].link_parseable);
}

#[test]
fn test_publish_resource_copies_relations_online() {
    let (mut store, page, about, logo) = seeded_store();
    store.publish_resource(page.structure_id).unwrap();

    let online = RequestContext::new("admin", Project::Online, "");
    let published = store
        .read_resource(&online, ResourceRef::Id(page.structure_id), &ResourceFilter::ALL)
        .unwrap()
        .expect("published page");
    assert_eq!(published.state, ResourceState::Unchanged);

    let targets = store.find_relations(&online, &published, &RelationFilter::TARGETS).unwrap();
    assert_eq!(targets.len(), 2);
    assert!(targets.contains(&Relation::between(&page, &logo, RelationType::EMBEDDED_IMAGE)));

    // Relations of unpublished resources stay offline
    assert!(store
        .find_relations(&online, &about, &RelationFilter::TARGETS)
        .unwrap()
        .is_empty());

    let offline = store
        .read_resource(&offline_ctx(), ResourceRef::Id(page.structure_id), &ResourceFilter::ALL)
        .unwrap()
        .unwrap();
    assert_eq!(offline.state, ResourceState::Unchanged);
}

#[test]
fn test_publish_deleted_resource_removes_it() {
    let (mut store, page, _, logo) = seeded_store();
    store.publish_resource(page.structure_id).unwrap();
    store.publish_resource(logo.structure_id).unwrap();

    let doomed = logo.clone().with_state(ResourceState::Deleted);
    store.write_resource(Project::Offline, &doomed).unwrap();
    store.publish_resource(logo.structure_id).unwrap();

    let online = RequestContext::new("admin", Project::Online, "");
    for ctx in [&online, &offline_ctx()] {
        assert!(store
            .read_resource(ctx, ResourceRef::Id(logo.structure_id), &ResourceFilter::ALL)
            .unwrap()
            .is_none());
    }
    // The page still points at the removed image online
    let published_page = store
        .read_resource(&online, ResourceRef::Id(page.structure_id), &ResourceFilter::ALL)
        .unwrap()
        .unwrap();
    let targets = store
        .find_relations(&online, &published_page, &RelationFilter::TARGETS)
        .unwrap();
    assert!(targets.iter().any(|r| r.target_path() == logo.root_path));

    assert!(matches!(
        store.publish_resource(logo.structure_id),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn test_store_persists_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("linkguard.db");
    let page = Resource::file("/index.html", "xmlpage");
    {
        let mut store = SqliteStore::new(&path, registry()).unwrap();
        store.write_resource(Project::Offline, &page).unwrap();
    }
    let store = SqliteStore::new(&path, registry()).unwrap();
    let found = store
        .read_resource(&offline_ctx(), ResourceRef::Id(page.structure_id), &ResourceFilter::ALL)
        .unwrap();
    assert_eq!(found, Some(page));
}
