//! Integration tests for lazy catalog resolution against a mock archive

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use modis_fetcher::app::{CatalogNode, Collection, ModisClient, SearchQuery};
use modis_fetcher::errors::{CatalogError, NodeKind, TransportError};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;

#[tokio::test]
async fn test_collections_are_memoized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{ROOT}.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"name": "61"}])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let first = client.collections().await.unwrap();
    let second = client.collections().await.unwrap();
    let named = client.collection("61").await.unwrap();

    assert_eq!(first.len(), 1);
    assert!(Arc::ptr_eq(&first[0], &second[0]));
    assert!(Arc::ptr_eq(&first[0], &named));
    assert_eq!(named.url(), format!("{}61", base_url(&server)));
}

#[tokio::test]
async fn test_get_collections_refreshes_and_replaces() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{ROOT}.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"name": "61"}])))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server);
    let before = client.collection("61").await.unwrap();
    let refreshed = client.get_collections().await.unwrap();
    let after = client.collection("61").await.unwrap();

    assert!(!Arc::ptr_eq(&before, &refreshed[0]));
    assert!(Arc::ptr_eq(&refreshed[0], &after));
}

#[tokio::test]
async fn test_unknown_collection_is_not_found() {
    let server = MockServer::start().await;
    mount_archive(&server).await;

    let err = client(&server).collection("5").await.unwrap_err();

    assert!(matches!(
        err,
        CatalogError::NotFound {
            kind: NodeKind::Collection,
            ..
        }
    ));
}

#[tokio::test]
async fn test_products_memoized_until_refresh() {
    let server = MockServer::start().await;
    mount_archive(&server).await;

    let client = client(&server);
    let collection = client.collection("61").await.unwrap();

    let first = collection.product("MOD09GA").await.unwrap();
    let again = collection.product("MOD09GA").await.unwrap();
    assert!(Arc::ptr_eq(&first, &again));
    assert!(collection.has_product("MOD08_D3").await.unwrap());
    assert!(!collection.has_product("MYD09GA").await.unwrap());

    let refreshed = collection.get_products().await.unwrap();
    let after = collection.product("MOD09GA").await.unwrap();
    assert_eq!(refreshed.len(), 2);
    assert!(!Arc::ptr_eq(&first, &after));
    assert!(refreshed.iter().any(|p| Arc::ptr_eq(p, &after)));

    assert_eq!(first.collection_name(), "61");
    assert!(Arc::ptr_eq(&first.collection().unwrap(), &collection));
    assert_eq!(first.updated_at(), Some("2020-06-01 00:00"));
}

#[tokio::test]
async fn test_products_from_collection_memoized_per_name() {
    let server = MockServer::start().await;
    mount_archive(&server).await;

    let client = client(&server);
    let first = client.get_products_from_collection("61").await.unwrap();
    let second = client.get_products_from_collection("61").await.unwrap();

    let names: Vec<&str> = first.iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["MOD09GA", "MOD08_D3"]);
    assert!(Arc::ptr_eq(&first[0], &second[0]));

    let err = client.get_products_from_collection("nope").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_year_and_day_navigation() {
    let server = MockServer::start().await;
    mount_archive(&server).await;

    let client = client(&server);
    let product = client
        .collection("61")
        .await
        .unwrap()
        .product("MOD09GA")
        .await
        .unwrap();

    let year = product.year(2020).await.unwrap();
    assert_eq!(year.year(), 2020);
    assert!(Arc::ptr_eq(&year, &product.year("2020").await.unwrap()));
    assert!(product.year(2018).await.unwrap_err().is_not_found());

    let day = year.day_of_year(45).await.unwrap().expect("day 45 is published");
    assert_eq!(day.day_of_year(), 45);
    assert_eq!(day.date(), NaiveDate::from_ymd_opt(2020, 2, 14).unwrap());
    assert!(day.url().ends_with("/61/MOD09GA/2020/045"));

    assert!(year.day_of_year(2).await.unwrap().is_none());
    assert!(year.has_day_of_year(3).await.unwrap());
    assert!(!year.has_day_of_year(2).await.unwrap());
}

#[tokio::test]
async fn test_day_range_omits_missing_days() {
    let server = MockServer::start().await;
    mount_archive(&server).await;

    let client = client(&server);
    let product = client.collection("61").await.unwrap().product("MOD09GA").await.unwrap();
    let year = product.year(2020).await.unwrap();

    let days = year.get_days_in_range(1, 45).await.unwrap();
    let ordinals: Vec<u32> = days.iter().map(|d| d.day_of_year()).collect();
    assert_eq!(ordinals, vec![1, 3, 45]);

    let err = year.get_days_in_range(5, 3).await.unwrap_err();
    assert!(matches!(err, CatalogError::InvalidRange { start: 5, end: 3 }));
}

#[tokio::test]
async fn test_date_lookups() {
    let server = MockServer::start().await;
    mount_archive(&server).await;

    let client = client(&server);
    let product = client.collection("61").await.unwrap().product("MOD09GA").await.unwrap();

    let day = product.get_date("2020-01-03").await.unwrap().unwrap();
    assert_eq!(day.day_of_year(), 3);

    assert!(product.get_date("2020-01-02").await.unwrap().is_none());
    assert!(product.get_date("2018-01-01").await.unwrap().is_none());
    assert!(matches!(
        product.get_date("02/01/2020").await,
        Err(CatalogError::InvalidDate { .. })
    ));

    let days = product
        .get_days_in_date_range("2019-12-31", "2020-01-03")
        .await
        .unwrap();
    let dates: Vec<NaiveDate> = days.iter().map(|d| d.date()).collect();
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(2019, 12, 31).unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 3).unwrap(),
        ]
    );
}

#[tokio::test]
async fn test_images_and_tiles() {
    let server = MockServer::start().await;
    mount_archive(&server).await;

    let client = client(&server);
    let product = client.collection("61").await.unwrap().product("MOD09GA").await.unwrap();
    let day = product.get_date("2020-02-14").await.unwrap().unwrap();

    let images = day.images().await.unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0].name, TILE_045_A);
    assert_eq!(images[0].url, format!("{}/{}", day.url(), TILE_045_A));
    assert_eq!(images[0].size(), Some(1024));

    let tile = day.get_image_tile((12, 4)).await.unwrap();
    assert_eq!(tile.name, TILE_045_B);
    assert!(Arc::ptr_eq(&tile, &day.image(TILE_045_B).await.unwrap()));

    let missing = day.get_image_tile((1, 1)).await.unwrap_err();
    assert!(missing.is_not_found());
    assert!(matches!(
        day.get_image_tile((36, 0)).await,
        Err(CatalogError::InvalidPosition { .. })
    ));
    assert!(day.image("nothing.hdf").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_non_gridded_day_has_no_tiles() {
    let server = MockServer::start().await;
    mount_archive(&server).await;

    let client = client(&server);
    let product = client.collection("61").await.unwrap().product("MOD08_D3").await.unwrap();
    let day = product.get_date("2020-02-14").await.unwrap().unwrap();

    let image = day.image(ATMOS_045).await.unwrap();
    assert!(image.tile_position.is_none());
    assert!(image.horizontal_position.is_none());
    assert!(day.get_image_tile((10, 5)).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_token_is_inherited_by_children() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{ROOT}.json")))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"name": "61"}])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{ROOT}/61.json")))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"name": "MOD09GA"}])))
        .mount(&server)
        .await;

    let client = ModisClient::new(&client_config(&server).with_token("secret")).unwrap();
    let collection = client.collection("61").await.unwrap();
    let product = collection.product("MOD09GA").await.unwrap();

    assert_eq!(product.api_token().as_deref(), Some("secret"));
}

#[tokio::test]
async fn test_transport_errors_surface_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client(&server).collections().await.unwrap_err();

    match err {
        CatalogError::Transport(TransportError::Status { status, .. }) => assert_eq!(status, 503),
        other => panic!("Expected transport status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_download_tile_into_directory() {
    let server = MockServer::start().await;
    mount_archive(&server).await;
    Mock::given(method("GET"))
        .and(path(format!("{ROOT}/61/MOD09GA/2020/045/{TILE_045_A}")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"HDF4 payload".to_vec()))
        .mount(&server)
        .await;

    let client = client(&server);
    let product = client.collection("61").await.unwrap().product("MOD09GA").await.unwrap();
    let day = product.get_date("2020-02-14").await.unwrap().unwrap();
    let temp_dir = TempDir::new().unwrap();

    let written = day
        .download_tile_by_position((10, 5), temp_dir.path())
        .await
        .unwrap();

    assert_eq!(written, temp_dir.path().join(TILE_045_A));
    assert_eq!(std::fs::read(&written).unwrap(), b"HDF4 payload");
}

#[tokio::test]
async fn test_download_by_name_creates_directories() {
    let server = MockServer::start().await;
    mount_archive(&server).await;
    Mock::given(method("GET"))
        .and(path(format!("{ROOT}/61/MOD09GA/2020/003/{TILE_003}")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"tile".to_vec()))
        .mount(&server)
        .await;

    let client = client(&server);
    let product = client.collection("61").await.unwrap().product("MOD09GA").await.unwrap();
    let day = product.get_date("2020-01-03").await.unwrap().unwrap();
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("a").join("b").join("tile.hdf");

    let written = day.download(TILE_003, &target).await.unwrap();

    assert_eq!(written, target);
    assert_eq!(std::fs::read(&target).unwrap(), b"tile");
}

#[tokio::test]
async fn test_failed_download_leaves_no_file() {
    let server = MockServer::start().await;
    mount_archive(&server).await;

    let client = client(&server);
    let product = client.collection("61").await.unwrap().product("MOD09GA").await.unwrap();
    let day = product.get_date("2020-01-03").await.unwrap().unwrap();
    let temp_dir = TempDir::new().unwrap();

    let url = format!("{}{}/missing.hdf", server.uri(), ROOT);
    let err = day.download(url.as_str(), temp_dir.path()).await.unwrap_err();

    assert!(matches!(
        err,
        CatalogError::Transport(TransportError::Status { status: 404, .. })
    ));
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_concurrent_first_access_fetches_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{ROOT}.json")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"name": "61"}]))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{ROOT}/61.json")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"name": "MOD09GA"}]))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let (a, b, c) = tokio::join!(client.collections(), client.collections(), client.collections());
    let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
    assert!(Arc::ptr_eq(&a[0], &b[0]));
    assert!(Arc::ptr_eq(&a[0], &c[0]));

    let collection = Arc::clone(&a[0]);
    let (first, second) = tokio::join!(collection.products(), collection.products());
    assert!(Arc::ptr_eq(&first.unwrap()[0], &second.unwrap()[0]));

    server.verify().await;
}

#[tokio::test]
async fn test_concurrent_raw_listing_fetches_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{ROOT}/61.json")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"name": "MOD09GA"}]))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let collection = Collection::named("61", client(&server).transport().clone());
    let (first, second) = tokio::join!(collection.fetch_available(), collection.fetch_available());

    assert!(Arc::ptr_eq(&first.unwrap(), &second.unwrap()));
    server.verify().await;
}

#[tokio::test]
async fn test_stray_listing_entries_are_skipped() {
    let server = MockServer::start().await;
    mount_json(&server, ".json", json!([{"name": "61"}])).await;
    mount_json(&server, "/61.json", json!([{"name": "MOD09GA"}])).await;
    mount_json(
        &server,
        "/61/MOD09GA.json",
        json!([{"name": "2020"}, {"name": "README"}]),
    )
    .await;
    mount_json(
        &server,
        "/61/MOD09GA/2020.json",
        json!([{"name": "045"}, {"name": "checksums"}]),
    )
    .await;
    mount_json(
        &server,
        "/61/MOD09GA/2020/045.json",
        json!([{"name": TILE_045_A}]),
    )
    .await;

    let client = client(&server);
    let product = client.collection("61").await.unwrap().product("MOD09GA").await.unwrap();

    let years = product.years().await.unwrap();
    assert_eq!(years.len(), 1);
    let year = product.year(2020).await.unwrap();
    assert!(product.year("README").await.unwrap_err().is_not_found());

    let days = year.days().await.unwrap();
    assert_eq!(days.len(), 1);
    assert!(year.day_of_year("045").await.unwrap().is_some());
    assert!(year.day_of_year("checksums").await.unwrap().is_none());

    let images = client
        .search(&SearchQuery::new().product("MOD09GA").year(2020))
        .await
        .unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].name, TILE_045_A);
}

#[tokio::test]
async fn test_products_from_collection_follow_refresh() {
    let server = MockServer::start().await;
    mount_json(&server, ".json", json!([{"name": "61"}])).await;
    Mock::given(method("GET"))
        .and(path(format!("{ROOT}/61.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"name": "MOD09GA"}])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_json(
        &server,
        "/61.json",
        json!([{"name": "MOD09GA"}, {"name": "MYD09GA"}]),
    )
    .await;

    let client = client(&server);
    let before = client.get_products_from_collection("61").await.unwrap();
    assert_eq!(before.len(), 1);

    let refreshed = client.collection("61").await.unwrap().get_products().await.unwrap();
    let after = client.get_products_from_collection("61").await.unwrap();

    let names: Vec<&str> = after.iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["MOD09GA", "MYD09GA"]);
    assert!(Arc::ptr_eq(&refreshed[0], &after[0]));
    assert!(!Arc::ptr_eq(&before[0], &after[0]));
}
