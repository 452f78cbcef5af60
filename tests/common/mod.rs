//! Shared fixtures: a small mock LAADS archive served by wiremock

#![allow(dead_code)]

use modis_fetcher::app::{ClientConfig, ModisClient};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ROOT: &str = "/archive/allData";

pub const TILE_001_A: &str = "MOD09GA.A2020001.h10v05.061.2020003024516.hdf";
pub const TILE_001_B: &str = "MOD09GA.A2020001.h11v05.061.2020003024841.hdf";
pub const TILE_003: &str = "MOD09GA.A2020003.h10v05.061.2020005030127.hdf";
pub const TILE_045_A: &str = "MOD09GA.A2020045.h10v05.061.2020050123456.hdf";
pub const TILE_045_B: &str = "MOD09GA.A2020045.h12v04.061.2020050123501.hdf";
pub const TILE_2019_365: &str = "MOD09GA.A2019365.h10v05.061.2020002031545.hdf";
pub const ATMOS_045: &str = "MOD08_D3.A2020045.061.2020046151245.hdf";

/// Base URL of the mock archive, as the client expects it
pub fn base_url(server: &MockServer) -> String {
    format!("{}{}/", server.uri(), ROOT)
}

pub fn client_config(server: &MockServer) -> ClientConfig {
    ClientConfig {
        rate_limit_rps: 1000,
        ..ClientConfig::default().with_base_url(base_url(server))
    }
}

pub fn client(server: &MockServer) -> ModisClient {
    ModisClient::new(&client_config(server)).expect("client should build")
}

/// Serves `body` as JSON at `{ROOT}{suffix}`
pub async fn mount_json(server: &MockServer, suffix: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("{ROOT}{suffix}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn names(entries: &[&str]) -> Value {
    Value::Array(
        entries
            .iter()
            .map(|name| json!({"name": name, "size": 0, "last-modified": "2020-06-01 00:00"}))
            .collect(),
    )
}

fn files(entries: &[&str]) -> Value {
    Value::Array(
        entries
            .iter()
            .map(|name| json!({"name": name, "size": 1024, "md5sum": "d41d8cd98f00b204e9800998ecf8427e"}))
            .collect(),
    )
}

/// Mounts the whole mock archive:
///
/// ```text
/// 61/MOD09GA/2019/365          h10v05
/// 61/MOD09GA/2020/001          h10v05 h11v05
/// 61/MOD09GA/2020/003          h10v05
/// 61/MOD09GA/2020/045          h10v05 h12v04
/// 61/MOD08_D3/2020/045         (not gridded)
/// 6/MOD09GA/2021               (no days)
/// ```
pub async fn mount_archive(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("{ROOT}.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(names(&["61", "6"])))
        .mount(server)
        .await;

    mount_json(server, "/61.json", names(&["MOD09GA", "MOD08_D3"])).await;
    mount_json(server, "/6.json", json!({"content": [{"name": "MOD09GA"}]})).await;

    mount_json(server, "/61/MOD09GA.json", names(&["2019", "2020"])).await;
    mount_json(server, "/61/MOD09GA/2019.json", names(&["365"])).await;
    mount_json(server, "/61/MOD09GA/2020.json", names(&["001", "003", "045"])).await;
    mount_json(server, "/61/MOD09GA/2019/365.json", files(&[TILE_2019_365])).await;
    mount_json(server, "/61/MOD09GA/2020/001.json", files(&[TILE_001_A, TILE_001_B])).await;
    mount_json(server, "/61/MOD09GA/2020/003.json", files(&[TILE_003])).await;
    mount_json(server, "/61/MOD09GA/2020/045.json", files(&[TILE_045_A, TILE_045_B])).await;

    mount_json(server, "/61/MOD08_D3.json", names(&["2020"])).await;
    mount_json(server, "/61/MOD08_D3/2020.json", names(&["045"])).await;
    mount_json(server, "/61/MOD08_D3/2020/045.json", files(&[ATMOS_045])).await;

    mount_json(server, "/6/MOD09GA.json", names(&["2021"])).await;
    mount_json(server, "/6/MOD09GA/2021.json", json!([])).await;
}
