//! End-to-end builds of small projects through the public API, with real
//! minijinja templates on disk.

use liara::config::{self, SiteConfig};
use liara::pipeline::{self, BuildError};
use liara::scan::ScanError;
use liara::site::SiteError;
use liara::template::TemplateError;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn read(root: &Path, relative: &str) -> String {
    fs::read_to_string(root.join(relative))
        .unwrap_or_else(|e| panic!("cannot read {relative}: {e}"))
}

const ROUTES: &str = r#""/*": page.html
"/blog*": blog.html
"/about": about.html
"#;

const PAGE: &str = "{{ page.meta.title }}|{{ site.data.author }}|{{ page.content }}";

const BLOG: &str = r#"{% if node.kind == "index" -%}
{% for p in node.select_children().with_tag("post").sorted_by_title().pages() %}{{ p.meta.title }}:{{ p.url }};{% endfor %}
{%- else -%}
post {{ page.meta.title }} in {{ node.parent.url }}
{%- endif %}"#;

const ABOUT: &str = r#"{% for s in site.static %}{{ s.url }} {{ s.meta.image_size | join("x") }}{% endfor %}"#;

/// A project exercising every node kind.
fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    write(root, "templates/routes.yaml", ROUTES);
    write(root, "templates/page.html", PAGE);
    write(root, "templates/blog.html", BLOG);
    write(root, "templates/about.html", ABOUT);

    write(
        root,
        "content/_index.md",
        "---\ntitle: Home\n---\nSee [about](/about/) and [this](/missing#x).\n",
    );
    write(root, "content/about.md", "---\ntitle: About\n---\n");
    write(root, "content/site.yaml", "author: Ada\n");
    write(root, "content/blog/b.md", "---\ntitle: Beta\npost: true\n---\nB\n");
    write(root, "content/blog/a.md", "---\ntitle: Alpha\npost: true\n---\nA\n");
    write(root, "resources/css/site.scss", "$gap: 4px;\nmain { padding: $gap; }\n");

    fs::create_dir_all(root.join("static/img")).unwrap();
    image::RgbImage::new(3, 2)
        .save(root.join("static/img/dot.png"))
        .unwrap();

    tmp
}

#[test]
fn builds_a_complete_site() {
    let tmp = project();
    let root = tmp.path();
    let site_config = config::load_config(root).unwrap();

    let report = pipeline::build(root, &site_config).unwrap();
    assert_eq!(report.pages, 5);
    assert_eq!(report.resources, 1);
    assert_eq!(report.statics, 1);
    assert_eq!(report.link_warnings.len(), 1);
    assert_eq!(report.link_warnings[0].page.as_str(), "/");
    assert_eq!(report.link_warnings[0].target, "/missing#x");

    let home = read(root, "output/index.html");
    assert!(home.starts_with("Home|Ada|"), "{home}");
    assert!(home.contains(r#"<a href="/about/">about</a>"#), "{home}");

    assert_eq!(
        read(root, "output/blog/index.html"),
        "Alpha:/blog/a;Beta:/blog/b;"
    );
    assert_eq!(read(root, "output/blog/a/index.html"), "post Alpha in /blog");
    assert_eq!(read(root, "output/about/index.html"), "/img/dot.png 3x2");

    let css = read(root, "output/css/site.css");
    assert!(css.contains("padding: 4px"), "{css}");
}

#[cfg(unix)]
#[test]
fn static_files_are_symlinks() {
    let tmp = project();
    let root = tmp.path();
    pipeline::build(root, &SiteConfig::default()).unwrap();

    let link = root.join("output/img/dot.png");
    let target = fs::read_link(&link).unwrap();
    assert!(target.is_absolute());
    assert!(target.ends_with("static/img/dot.png"));
}

#[test]
fn config_file_moves_the_output() {
    let tmp = project();
    let root = tmp.path();
    write(
        root,
        "config.toml",
        "output_directory = \"public\"\n\n[processing]\nmax_processes = 2\n",
    );
    let site_config = config::load_config(root).unwrap();

    pipeline::build(root, &site_config).unwrap();
    assert!(root.join("public/index.html").exists());
    assert!(!root.join("output").exists());
}

#[test]
fn unknown_template_backend_is_rejected() {
    let tmp = project();
    let root = tmp.path();
    write(root, "config.toml", "[templates]\nbackend = \"mako\"\n");
    let site_config = config::load_config(root).unwrap();

    let err = pipeline::build(root, &site_config).unwrap_err();
    assert!(matches!(
        err,
        BuildError::Template(TemplateError::UnknownBackend(ref name)) if name == "mako"
    ));
}

#[test]
fn colliding_output_paths_fail_discovery() {
    let tmp = project();
    let root = tmp.path();
    write(root, "content/about.yaml", "extra: true\n");

    let err = pipeline::check(root, &SiteConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        BuildError::Scan(ScanError::Site(SiteError::DuplicatePath { .. }))
    ));
}

#[test]
fn untitled_document_stops_before_output() {
    let tmp = project();
    let root = tmp.path();
    write(root, "content/blog/draft.md", "no front matter\n");

    let err = pipeline::build(root, &SiteConfig::default()).unwrap_err();
    assert!(matches!(err, BuildError::Validation { .. }));
    assert!(!root.join("output").exists());
}

#[test]
fn template_errors_name_the_page() {
    let tmp = project();
    let root = tmp.path();
    write(root, "templates/about.html", "{{ site.select().sorted_by_tag('post').pages() }}");

    let err = pipeline::build(root, &SiteConfig::default()).unwrap_err();
    assert!(err.to_string().contains("/about"), "{err}");
}
