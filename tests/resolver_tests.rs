//! Tests for the GitHub release resolver
//!
//! A local mockito server stands in for both the releases API and the asset
//! download host.


use mockito::{Matcher, Server, ServerGuard};
use relpm::{Error, GithubResolver, PackageName, ReleaseResolver, SourceConfig};
use std::fs;
use test_utils::{zip_bytes, TestRoot};

fn resolver(server: &ServerGuard, root: &TestRoot) -> GithubResolver {
    let source = SourceConfig {
        api_url: server.url(),
        owner: "someone".to_string(),
        license: "Apache-2.0".to_string(),
        ..SourceConfig::default()
    };
    GithubResolver::new(&source, &root.paths).unwrap().quiet()
}

fn release_body(server: &ServerGuard, assets: &[&str]) -> String {
    let assets: Vec<String> = assets
        .iter()
        .map(|name| {
            format!(
                r#"{{"name": "{name}", "browser_download_url": "{}/download/{name}"}}"#,
                server.url()
            )
        })
        .collect();
    format!(
        r#"{{
            "tag_name": "v1.4.0",
            "published_at": "2024-05-01T12:00:00Z",
            "author": {{"login": "someone"}},
            "assets": [{}]
        }}"#,
        assets.join(",")
    )
}

#[test]
fn test_resolve_downloads_first_zip_asset() {
    let mut server = Server::new();
    let root = TestRoot::new();
    let archive = zip_bytes(&[("tool.exe", b"binary")]);

    let api = server
        .mock("GET", "/repos/someone/c-utils/releases/latest")
        .match_header("user-agent", Matcher::Regex("^relpm/".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(release_body(
            &server,
            &["checksums.txt", "c-utils-win64.ZIP", "c-utils-src.zip"],
        ))
        .create();
    let download = server
        .mock("GET", "/download/c-utils-win64.ZIP")
        .with_status(200)
        .with_body(archive.clone())
        .create();

    let release = resolver(&server, &root)
        .resolve(&PackageName::new("c-utils"))
        .unwrap();

    api.assert();
    download.assert();
    assert_eq!(release.version, "v1.4.0");
    assert_eq!(release.archive_file_name, "c-utils-win64.ZIP");
    assert_eq!(
        release.archive,
        root.paths.downloads_dir.join("c-utils-win64.ZIP")
    );
    assert_eq!(fs::read(&release.archive).unwrap(), archive);
    assert_eq!(release.metadata.author, "someone");
    assert_eq!(release.metadata.license, "Apache-2.0");
    assert_eq!(release.metadata.published_at, "2024-05-01T12:00:00Z");
}

#[test]
fn test_resolve_release_not_found() {
    let mut server = Server::new();
    let root = TestRoot::new();
    let _api = server
        .mock("GET", "/repos/someone/c-utils/releases/latest")
        .with_status(404)
        .with_body(r#"{"message": "Not Found"}"#)
        .create();

    let err = resolver(&server, &root)
        .resolve(&PackageName::new("c-utils"))
        .unwrap_err();
    assert!(matches!(err, Error::Resolution(_)), "{:?}", err);
    assert!(
        err.to_string().contains("No published release for 'c-utils'"),
        "{}",
        err
    );
}

#[test]
fn test_resolve_without_zip_asset() {
    let mut server = Server::new();
    let root = TestRoot::new();
    let _api = server
        .mock("GET", "/repos/someone/c-utils/releases/latest")
        .with_status(200)
        .with_body(release_body(&server, &["c-utils.tar.gz"]))
        .create();

    let err = resolver(&server, &root)
        .resolve(&PackageName::new("c-utils"))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Release resolution failed: No zip asset found in latest release"
    );
    assert_eq!(root.download_count(), 0);
}

#[test]
fn test_failed_download_leaves_no_archive() {
    let mut server = Server::new();
    let root = TestRoot::new();
    let _api = server
        .mock("GET", "/repos/someone/c-utils/releases/latest")
        .with_status(200)
        .with_body(release_body(&server, &["c-utils.zip"]))
        .create();
    let _download = server
        .mock("GET", "/download/c-utils.zip")
        .with_status(500)
        .create();

    let err = resolver(&server, &root)
        .resolve(&PackageName::new("c-utils"))
        .unwrap_err();
    assert!(err.to_string().contains("HTTP 500"), "{}", err);
    assert!(!root.paths.downloads_dir.join("c-utils.zip").exists());
}

#[test]
fn test_malformed_release_json() {
    let mut server = Server::new();
    let root = TestRoot::new();
    let _api = server
        .mock("GET", "/repos/someone/c-utils/releases/latest")
        .with_status(200)
        .with_body("<html>rate limited</html>")
        .create();

    let err = resolver(&server, &root)
        .resolve(&PackageName::new("c-utils"))
        .unwrap_err();
    assert!(matches!(err, Error::Resolution(_)), "{:?}", err);
}
