//! End-to-end runs against throwaway project directories.
//!
//! Each test lays out a fake bundler output under a temp dir and calls
//! `run_in` with that dir as the working directory.

use html_inject::config::{InjectConfig, parse_config};
use html_inject::hash::hash_bytes;
use html_inject::inject::InjectError;
use html_inject::template::TemplateSource;
use html_inject::types::{Artifact, ArtifactKind, InjectTarget, Placement};
use html_inject::{BuildEvent, ChunkInfo, run_in};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn project(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (rel, content) in files {
        let path = tmp.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    tmp
}

fn entry(file: &str) -> BuildEvent {
    BuildEvent {
        chunks: vec![ChunkInfo {
            file_name: file.into(),
            is_entry: true,
            sourcemap: false,
        }],
        entry_code: None,
    }
}

fn inline(markup: &str) -> InjectConfig {
    InjectConfig {
        template: Some(TemplateSource::Inline(markup.into())),
        filename: Some("index.html".into()),
        ..Default::default()
    }
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}

#[test]
fn single_script_lands_in_body() {
    let tmp = project(&[("dist/app.js", "console.log(1)")]);
    let config = inline("<html><head></head><body></body></html>");

    let report = run_in(&config, &entry("dist/app.js"), tmp.path()).unwrap();

    assert_eq!(report.destination, tmp.path().join("dist/index.html"));
    assert_eq!(
        read(tmp.path(), "dist/index.html"),
        "<html><head></head><body><script type=\"text/javascript\" src=\"app.js\"></script>\n</body></html>"
    );
}

#[test]
fn template_file_in_project_root() {
    let tmp = project(&[
        ("src/index.html", "<!DOCTYPE html>\n<html>\n  <head>\n    <title>App</title>\n  </head>\n  <body>\n  </body>\n</html>\n"),
        ("dist/js/app.js", "x"),
        ("dist/css/site.css", "y"),
    ]);
    let config = InjectConfig {
        template: Some(TemplateSource::Path("src/index.html".into())),
        ..Default::default()
    };

    let report = run_in(&config, &entry("dist/js/app.js"), tmp.path()).unwrap();
    assert_eq!(report.destination, tmp.path().join("dist/index.html"));

    let html = read(tmp.path(), "dist/index.html");
    assert!(html.starts_with("<!DOCTYPE html>"));
    // template newlines collapse; only the two injected tags end in one
    assert_eq!(html.matches('\n').count(), 2);
    let head = &html[html.find("<head>").unwrap()..html.find("</head>").unwrap()];
    assert!(head.contains("<title>App</title>"));
    assert!(head.contains("<link rel=\"stylesheet\" href=\"css/site.css\">"));
    let body = &html[html.find("<body>").unwrap()..html.find("</body>").unwrap()];
    assert!(body.contains("src=\"js/app.js\""));
}

#[test]
fn ignored_sourcemaps_produce_no_tags() {
    let tmp = project(&[("dist/app.js", "x"), ("dist/app.js.map", "{}")]);
    let config = InjectConfig {
        ignore: Some(r"\.map$".into()),
        ..inline("<html><head></head><body></body></html>")
    };

    let report = run_in(&config, &entry("dist/app.js"), tmp.path()).unwrap();
    let html = read(tmp.path(), "dist/index.html");
    assert!(!html.contains(".map"));
    assert_eq!(report.inject.tags.len(), 1);
}

#[test]
fn online_path_points_at_cdn() {
    let tmp = project(&[("dist/js/app.js", "x")]);
    let config = InjectConfig {
        online_path: Some("https://cdn.example.com/assets".into()),
        ..inline("<html><head></head><body></body></html>")
    };

    run_in(&config, &entry("dist/js/app.js"), tmp.path()).unwrap();
    assert!(
        read(tmp.path(), "dist/index.html")
            .contains("src=\"https://cdn.example.com/assets/app.js\"")
    );
}

#[test]
fn external_url_referenced_verbatim() {
    let tmp = project(&[("dist/app.js", "x")]);
    let config = InjectConfig {
        absolute: true,
        externals: vec![Artifact {
            kind: ArtifactKind::Script,
            path: "//cdn.example.com/lib.js".into(),
            placement: Placement::Default,
            inject: InjectTarget::Default,
            timestamp: false,
        }],
        ..inline("<html><head></head><body></body></html>")
    };

    run_in(&config, &entry("dist/app.js"), tmp.path()).unwrap();
    let html = read(tmp.path(), "dist/index.html");
    assert!(html.contains("src=\"//cdn.example.com/lib.js\""));
    assert!(html.contains("src=\"/app.js\""));
}

#[test]
fn before_externals_lead_in_declaration_order() {
    let tmp = project(&[("dist/app.js", "x")]);
    let config = parse_config(
        r#"
            template = "<html><head></head><body></body></html>"
            filename = "index.html"

            [[externals]]
            type = "js"
            file = "https://cdn.example.com/a.js"
            pos = "before"

            [[externals]]
            type = "js"
            file = "https://cdn.example.com/b.js"
            pos = "before"

            [[externals]]
            type = "js"
            file = "https://cdn.example.com/z.js"
            "#,
    )
    .unwrap();

    let report = run_in(&config, &entry("dist/app.js"), tmp.path()).unwrap();
    let urls: Vec<_> = report.inject.tags.iter().map(|t| t.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://cdn.example.com/a.js",
            "https://cdn.example.com/b.js",
            "app.js",
            "https://cdn.example.com/z.js",
        ]
    );
}

#[test]
fn hashed_entry_with_sourcemap() {
    let tmp = project(&[
        ("dist/app.[hash].js", "on disk"),
        ("dist/app.[hash].js.map", "{\"version\":3,\"mappings\":\"\"}"),
    ]);
    let config = InjectConfig {
        ignore: Some(r"\.map$".into()),
        hash_length: Some(8),
        ..inline("<html><head></head><body></body></html>")
    };
    let event = BuildEvent {
        chunks: vec![ChunkInfo {
            file_name: "dist/app.[hash].js".into(),
            is_entry: true,
            sourcemap: true,
        }],
        entry_code: Some("main();\n".into()),
    };

    run_in(&config, &event, tmp.path()).unwrap();

    let map_digest = hash_bytes(b"{\"version\":3,\"mappings\":\"\"}");
    let map_hash = &map_digest[..8];
    let code = format!("main();\n//# sourceMappingURL=app.{map_hash}.js.map");
    let code_digest = hash_bytes(code.as_bytes());
    let code_hash = &code_digest[..8];

    let dist = tmp.path().join("dist");
    assert!(!dist.join("app.[hash].js").exists());
    assert!(!dist.join("app.[hash].js.map").exists());
    assert!(dist.join(format!("app.{map_hash}.js.map")).exists());
    assert_eq!(read(&dist, &format!("app.{code_hash}.js")), code);
    assert!(read(&dist, "index.html").contains(&format!("src=\"app.{code_hash}.js\"")));
}

#[test]
fn rerun_on_hashed_output_is_stable() {
    let tmp = project(&[("dist/app.[hash].js", "stable")]);
    let config = inline("<html><head></head><body></body></html>");

    run_in(&config, &entry("dist/app.[hash].js"), tmp.path()).unwrap();
    let first = read(tmp.path(), "dist/index.html");

    fs::write(tmp.path().join("dist/app.[hash].js"), "stable").unwrap();
    let digest = hash_bytes(b"stable");
    fs::remove_file(tmp.path().join(format!("dist/app.{digest}.js"))).unwrap();
    fs::remove_file(tmp.path().join("dist/index.html")).unwrap();

    run_in(&config, &entry("dist/app.[hash].js"), tmp.path()).unwrap();
    assert_eq!(read(tmp.path(), "dist/index.html"), first);
}

#[test]
fn missing_template_file_leaves_output_untouched() {
    let tmp = project(&[("dist/app.[hash].js", "x")]);
    let config = InjectConfig {
        template: Some(TemplateSource::Path("missing.html".into())),
        ..Default::default()
    };

    let result = run_in(&config, &entry("dist/app.[hash].js"), tmp.path());
    assert!(matches!(result, Err(InjectError::Template(_))));
    assert!(tmp.path().join("dist/app.[hash].js").exists());
    assert!(!tmp.path().join("dist/missing.html").exists());
}

#[test]
fn missing_output_dir_is_scan_error() {
    let tmp = TempDir::new().unwrap();
    let config = inline("<html><head></head><body></body></html>");
    let result = run_in(&config, &entry("dist/app.js"), tmp.path());
    assert!(matches!(result, Err(InjectError::Scan(_))));
}

#[test]
fn head_target_and_favicon() {
    let tmp = project(&[("dist/app.js", "x"), ("dist/site.css", "y")]);
    let config = InjectConfig {
        inject: InjectTarget::Head,
        defer: true,
        favicon: Some("/favicon.ico".into()),
        ..inline("<html><head><meta charset=\"utf-8\"></head><body><div id=\"app\"></div></body></html>")
    };

    run_in(&config, &entry("dist/app.js"), tmp.path()).unwrap();
    let html = read(tmp.path(), "dist/index.html");
    let head = &html[..html.find("</head>").unwrap()];
    assert!(head.contains("<meta charset=\"utf-8\">"));
    assert!(head.contains("<script type=\"text/javascript\" defer src=\"app.js\"></script>"));
    assert!(head.contains("<link rel=\"stylesheet\" href=\"site.css\">"));
    assert_eq!(html.matches("shortcut icon").count(), 1);
    assert!(html.contains("<body><div id=\"app\"></div></body>"));
}

#[test]
fn template_without_sections_gets_them() {
    let tmp = project(&[("dist/app.js", "x"), ("dist/site.css", "y")]);
    let config = inline("<html><div>hi</div></html>");

    run_in(&config, &entry("dist/app.js"), tmp.path()).unwrap();
    let html = read(tmp.path(), "dist/index.html");
    assert!(html.starts_with("<html><head><link rel=\"stylesheet\""));
    assert!(html.ends_with("</script>\n</body></html>"));
    assert!(html.contains("<div>hi</div>"));
}

#[test]
fn external_without_type_is_skipped() {
    let tmp = project(&[("dist/app.js", "x")]);
    let config = parse_config(
        r#"
            template = "<html><head></head><body></body></html>"
            filename = "index.html"

            [[externals]]
            file = "https://cdn.example.com/font.woff2"
            "#,
    )
    .unwrap();

    let report = run_in(&config, &entry("dist/app.js"), tmp.path()).unwrap();
    assert_eq!(report.artifacts.len(), 2);
    assert_eq!(report.inject.tags.len(), 1);
    assert!(!read(tmp.path(), "dist/index.html").contains("font.woff2"));
}

#[test]
fn template_with_inline_script_and_bare_ampersand() {
    let tmp = project(&[("dist/app.js", "x")]);
    let config = inline(
        "<!DOCTYPE html><html><head></head><body><p>Q&A</p><script>if (a && b) document.write('</body>')</script></body></html>",
    );

    run_in(&config, &entry("dist/app.js"), tmp.path()).unwrap();
    assert_eq!(
        read(tmp.path(), "dist/index.html"),
        "<!DOCTYPE html><html><head></head><body><p>Q&A</p><script>if (a && b) document.write('</body>')</script><script type=\"text/javascript\" src=\"app.js\"></script>\n</body></html>"
    );
}
