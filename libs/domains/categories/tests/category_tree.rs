//! Integration tests for the category tree engine
//!
//! These tests run against real MongoDB via testcontainers to ensure:
//! - The unique (parent_id, name) index backstops the engine's pre-check
//! - Null-parent and parented sibling buckets stay separate
//! - Range shifts keep sibling orders a permutation
//! - Cascading delete removes whole subtrees
//! - Image autofill resolves against the files collection

use domain_categories::{
    Category, CategoryError, CategoryFilter, CategoryRepository, CreateCategory,
    MongoCategoryRepository, MongoImageResolver, ReorderEntry, UpdateCategory,
    service::CategoryService,
};
use domain_files::{CreateFile, FileService, MongoFileRepository};
use test_utils::TestMongo;
use uuid::Uuid;

type MongoCategoryService = CategoryService<MongoCategoryRepository, MongoImageResolver>;

async fn setup(mongo: &TestMongo, db_name: &str) -> MongoCategoryService {
    let db = mongo.database(db_name);

    let repository = MongoCategoryRepository::new(&db);
    repository.init_indexes().await.expect("index creation");

    CategoryService::new(repository, MongoImageResolver::new(&db))
}

fn input(name: &str, parent_id: Option<Uuid>) -> CreateCategory {
    CreateCategory {
        name: name.to_string(),
        description: None,
        parent_id,
        order: None,
        image_id: None,
    }
}

fn orders_by_name(items: &[Category]) -> Vec<(String, i64)> {
    items.iter().map(|c| (c.name.clone(), c.order)).collect()
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_create_assigns_sequential_sibling_orders() {
    let mongo = TestMongo::new().await;
    let service = setup(&mongo, "catalog_orders").await;

    let drinks = service.create_category(input("Drinks", None)).await.unwrap();
    let snacks = service.create_category(input("Snacks", None)).await.unwrap();

    assert_eq!(drinks.order, 0);
    assert_eq!(snacks.order, 1);

    // A child bucket starts counting from zero again
    let juices = service
        .create_category(input("Juices", Some(drinks.id)))
        .await
        .unwrap();
    assert_eq!(juices.order, 0);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_unique_index_backstops_duplicate_names() {
    let mongo = TestMongo::new().await;
    let db = mongo.database("catalog_uniq");

    let repository = MongoCategoryRepository::new(&db);
    repository.init_indexes().await.expect("index creation");

    let first = Category::new(input("Drinks", None), 0);
    repository.insert(&first).await.unwrap();

    // Bypass the service pre-check: the index itself must refuse the write
    let second = Category::new(input("Drinks", None), 1);
    let err = repository.insert(&second).await.unwrap_err();
    assert!(matches!(err, CategoryError::DuplicateName(name) if name == "Drinks"));
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_same_name_allowed_under_different_parents() {
    let mongo = TestMongo::new().await;
    let service = setup(&mongo, "catalog_scoped_names").await;

    let drinks = service.create_category(input("Drinks", None)).await.unwrap();
    let snacks = service.create_category(input("Snacks", None)).await.unwrap();

    service
        .create_category(input("Specials", Some(drinks.id)))
        .await
        .unwrap();
    // Same name, different bucket: allowed
    service
        .create_category(input("Specials", Some(snacks.id)))
        .await
        .unwrap();

    // Same name, same bucket: refused
    let err = service
        .create_category(input("Specials", Some(drinks.id)))
        .await
        .unwrap_err();
    assert!(matches!(err, CategoryError::DuplicateName(_)));
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_reorder_single_keeps_orders_a_permutation() {
    let mongo = TestMongo::new().await;
    let service = setup(&mongo, "catalog_reorder_single").await;

    let mut ids = Vec::new();
    for name in ["A", "B", "C", "D"] {
        ids.push(service.create_category(input(name, None)).await.unwrap().id);
    }

    // Move D (order 3) to the front
    service.reorder_single(ids[3], 0).await.unwrap();

    let (items, _) = service
        .list_categories(CategoryFilter::default(), 1, 10)
        .await
        .unwrap();

    assert_eq!(
        orders_by_name(&items),
        vec![
            ("D".to_string(), 0),
            ("A".to_string(), 1),
            ("B".to_string(), 2),
            ("C".to_string(), 3),
        ]
    );

    // And back toward the middle
    service.reorder_single(ids[3], 2).await.unwrap();

    let (items, _) = service
        .list_categories(CategoryFilter::default(), 1, 10)
        .await
        .unwrap();
    assert_eq!(
        orders_by_name(&items),
        vec![
            ("A".to_string(), 0),
            ("B".to_string(), 1),
            ("D".to_string(), 2),
            ("C".to_string(), 3),
        ]
    );
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_bulk_reorder_applies_requested_orders() {
    let mongo = TestMongo::new().await;
    let service = setup(&mongo, "catalog_reorder_bulk").await;

    let drinks = service.create_category(input("Drinks", None)).await.unwrap();
    let snacks = service.create_category(input("Snacks", None)).await.unwrap();

    service
        .reorder(vec![
            ReorderEntry {
                id: drinks.id,
                order: 1,
            },
            ReorderEntry {
                id: snacks.id,
                order: 0,
            },
        ])
        .await
        .unwrap();

    let (items, total) = service
        .list_categories(CategoryFilter::default(), 1, 10)
        .await
        .unwrap();

    assert_eq!(total, 2);
    assert_eq!(
        orders_by_name(&items),
        vec![("Snacks".to_string(), 0), ("Drinks".to_string(), 1)]
    );
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_list_paginates_within_total() {
    let mongo = TestMongo::new().await;
    let service = setup(&mongo, "catalog_pagination").await;

    for name in ["A", "B", "C", "D", "E"] {
        service.create_category(input(name, None)).await.unwrap();
    }

    let (page2, total) = service
        .list_categories(CategoryFilter::default(), 2, 2)
        .await
        .unwrap();
    assert_eq!(total, 5);
    assert_eq!(orders_by_name(&page2), vec![
        ("C".to_string(), 2),
        ("D".to_string(), 3),
    ]);

    let (page3, _) = service
        .list_categories(CategoryFilter::default(), 3, 2)
        .await
        .unwrap();
    assert_eq!(page3.len(), 1);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_cycle_rejected_against_stored_chain() {
    let mongo = TestMongo::new().await;
    let service = setup(&mongo, "catalog_cycles").await;

    let root = service.create_category(input("Root", None)).await.unwrap();
    let child = service
        .create_category(input("Child", Some(root.id)))
        .await
        .unwrap();
    let grandchild = service
        .create_category(input("Grandchild", Some(child.id)))
        .await
        .unwrap();

    let err = service
        .update_category(
            root.id,
            UpdateCategory {
                parent_id: Some(Some(grandchild.id)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CategoryError::Cycle(id) if id == root.id));
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_delete_cascades_through_subtree() {
    let mongo = TestMongo::new().await;
    let service = setup(&mongo, "catalog_cascade").await;

    let root = service.create_category(input("Root", None)).await.unwrap();
    let child = service
        .create_category(input("Child", Some(root.id)))
        .await
        .unwrap();
    service
        .create_category(input("Grandchild", Some(child.id)))
        .await
        .unwrap();
    let survivor = service.create_category(input("Survivor", None)).await.unwrap();

    let removed = service.delete_category(root.id).await.unwrap();
    assert_eq!(removed, 3);

    let (remaining, total) = service
        .list_categories(CategoryFilter::default(), 1, 10)
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(remaining[0].id, survivor.id);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_image_autofill_against_files_collection() {
    let mongo = TestMongo::new().await;
    let db_name = "catalog_images";
    let service = setup(&mongo, db_name).await;

    let files = FileService::new(MongoFileRepository::new(&mongo.database(db_name)));
    let file = files
        .create_file(CreateFile {
            url: "/static/drinks.png".to_string(),
            filename: Some("drinks.png".to_string()),
            content_type: Some("image/png".to_string()),
            size_bytes: Some(512),
        })
        .await
        .unwrap();

    let mut create = input("Drinks", None);
    create.image_id = Some(file.id.to_string());

    let created = service.create_category(create).await.unwrap();
    assert_eq!(created.image_id, Some(file.id));
    assert_eq!(created.image_url.as_deref(), Some("/static/drinks.png"));

    // Resolving the same id twice yields the same URL
    let again = service
        .update_category(
            created.id,
            UpdateCategory {
                image_id: Some(Some(file.id.to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(again.image_url.as_deref(), Some("/static/drinks.png"));

    // Clearing with a blank id drops both fields
    let cleared = service
        .update_category(
            created.id,
            UpdateCategory {
                image_id: Some(Some(String::new())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(cleared.image_id.is_none());
    assert!(cleared.image_url.is_none());

    // An id that resolves to nothing is refused
    let err = service
        .update_category(
            created.id,
            UpdateCategory {
                image_id: Some(Some(Uuid::now_v7().to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CategoryError::InvalidImageRef(_)));
}
