use std::path::{Path, PathBuf};

use stencil_core::{CompileError, Compiler, compile_source};
use tempfile::TempDir;

struct Site {
    dir: TempDir,
}

impl Site {
    fn new() -> Self {
        let site = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        site.write("globals.spec", "");
        site
    }

    fn root(&self) -> PathBuf {
        self.dir.path().join("src")
    }

    fn out(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    fn write(&self, rel: &str, body: &str) -> &Self {
        let path = self.root().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
        self
    }

    fn compiler(&self, production: bool) -> Compiler {
        Compiler::builder(self.root())
            .output_dir(self.out())
            .production(production)
            .markdown(|md: &str| format!("<p>{}</p>", md.trim()))
            .build()
            .unwrap()
    }
}

fn read(path: impl AsRef<Path>) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn test_hello_world() {
    let site = Site::new();
    site.write("templates/base.html", "@{name} #{post-title}")
        .write(
            "pages.spec",
            "[index]\ntemplate: base\nurl: index.html\ntitle: Hello\nvariables:\nname: World\n",
        );

    let summary = compile_source(site.root(), site.out(), false).unwrap();

    assert_eq!(summary.pages, 1);
    assert_eq!(read(site.out().join("index.html")), "World Hello");
}

const BLOG_SPEC: &str = "
[index]
template: home
url: index.html
title: Home
variables:
heading: Latest posts

[first]
template: post
group: blog
url: first.html
date: 2023-01-01
title: First
author: Ana
content: first.md

[second]
template: post
group: blog
url: second.html
date: 2023-06-01
title: Second
author: Bo
content: second.md

[third]
template: post
group: blog
url: third.html
date: 2022-12-01
title: Third
author: Ana
unlisted: true
content: third.md
";

fn blog() -> Site {
    let site = Site::new();
    site.write("pages.spec", BLOG_SPEC)
        .write("globals.spec", "site: Dev Blog\nprod: Real Blog\nroot: /\n")
        .write("templates/head.html", "<title>#{post-title} | @{site}</title>")
        .write("templates/layout-top.html", "<html>${head}<body>")
        .write(
            "templates/home.html",
            "${layout-top}<h1>@{heading}</h1>\n#{list:blog:2}<a href=\"@{root}#{post-url}\">#{post-title}</a>#{post-line}#{list:end}</body></html>",
        )
        .write(
            "templates/post.html",
            "${layout-top}<article>#{post-content}</article></body></html>",
        )
        .write("content/first.md", "first body")
        .write("content/second.md", "second body, written #{post-date} by #{post-author}")
        .write("content/third.md", "third body")
        .write("line/first.md", "first line")
        .write("line/second.md", "second line")
        .write("preview/first.md", "first preview")
        .write("static/css/site.css", "body {}");
    site
}

#[test]
fn test_blog_site() {
    let site = blog();
    let summary = site.compiler(false).compile().unwrap();

    assert_eq!(summary.pages, 4);
    assert_eq!(summary.static_files, 1);
    assert_eq!(read(site.out().join("css/site.css")), "body {}");

    let index = read(site.out().join("index.html"));
    assert_eq!(
        index,
        "<html><title>Home | Dev Blog</title><body><h1>Latest posts</h1>\n\
         <a href=\"/blog/second.html\">Second</a><p>second line</p>\n<!-- expanded block div -->\n\
         <a href=\"/blog/first.html\">First</a><p>first line</p>\n<!-- expanded block div -->\n\
         </body></html>"
    );

    let second = read(site.out().join("blog/second.html"));
    assert_eq!(
        second,
        "<html><title>Second | Dev Blog</title><body><article><p>second body, written 2023-06-01 by Bo</p></article></body></html>"
    );
    assert!(site.out().join("blog/third.html").is_file());
}

#[test]
fn test_production_globals() {
    let site = blog();
    site.compiler(true).compile().unwrap();

    let first = read(site.out().join("blog/first.html"));
    assert!(first.contains("<title>First | Real Blog</title>"));
}

#[test]
fn test_output_is_replaced_on_rebuild() {
    let site = blog();
    std::fs::create_dir_all(site.out()).unwrap();
    std::fs::write(site.out().join("stale.html"), "old").unwrap();

    site.compiler(false).compile().unwrap();
    assert!(!site.out().join("stale.html").exists());
}

#[test]
fn test_pages_are_parsed_once() {
    let site = blog();
    let mut compiler = site.compiler(false);

    assert_eq!(compiler.pages().unwrap().len(), 4);
    std::fs::remove_file(site.root().join("pages.spec")).unwrap();
    assert_eq!(compiler.pages().unwrap()["second"].author, "Bo");
}

#[test]
fn test_templates_are_loaded_once_per_run() {
    let site = blog();
    let mut compiler = site.compiler(false);

    let first = compiler.render_page("first").unwrap();
    std::fs::remove_file(site.root().join("templates/post.html")).unwrap();
    std::fs::remove_file(site.root().join("templates/head.html")).unwrap();
    let second = compiler.render_page("second").unwrap();

    assert_eq!(first.path, "blog/first.html");
    assert_eq!(second.path, "blog/second.html");
    assert!(compiler.templates().is_cached("layout-top"));

    // A new run starts from scratch and notices the missing template.
    let mut fresh = site.compiler(false);
    assert!(matches!(
        fresh.render_page("second"),
        Err(CompileError::TemplateNotFound { .. })
    ));
}

#[test]
fn test_unresolved_variable() {
    let site = Site::new();
    site.write("templates/base.html", "<p>@{missing}</p>")
        .write("pages.spec", "[index]\ntemplate: base\nurl: index.html\n");

    let err = site.compiler(false).compile().unwrap_err();
    match err {
        CompileError::UnresolvedVariable { page, placeholder } => {
            assert_eq!(page, "index");
            assert_eq!(placeholder, "@{missing}");
        }
        other => panic!("expected unresolved variable, got {other:?}"),
    }
}

#[test]
fn test_missing_end_block() {
    let site = Site::new();
    site.write("templates/base.html", "#{list:blog:3}")
        .write("pages.spec", "[index]\ntemplate: base\nurl: index.html\n");

    let err = site.compiler(false).render_page("index").unwrap_err();
    assert!(matches!(err, CompileError::MissingEndBlock { .. }));
}

#[test]
fn test_missing_template_is_fatal() {
    let site = Site::new();
    site.write("pages.spec", "[index]\ntemplate: nope\nurl: index.html\n");

    let err = site.compiler(false).compile().unwrap_err();
    assert!(matches!(err, CompileError::TemplateNotFound { ref name, .. } if name == "nope"));
}

#[test]
fn test_missing_globals_file() {
    let site = Site::new();
    site.write("templates/base.html", "hi")
        .write("pages.spec", "[index]\ntemplate: base\nurl: index.html\n");
    std::fs::remove_file(site.root().join("globals.spec")).unwrap();

    let err = site.compiler(false).render_page("index").unwrap_err();
    assert!(matches!(err, CompileError::SpecNotFound { .. }));
}

#[test]
fn test_unknown_page() {
    let site = blog();
    let err = site.compiler(false).render_page("nope").unwrap_err();
    assert!(matches!(err, CompileError::PageNotFound(ref name) if name == "nope"));
}

#[test]
fn test_layout_file_is_honoured() {
    let site = Site::new();
    site.write("stencil.toml", "[layout]\ntemplates = \"layouts\"\ntemplate_extension = \"htm\"\n")
        .write("layouts/base.htm", "from layouts")
        .write("pages.spec", "[index]\ntemplate: base\nurl: index.html\n");

    compile_source(site.root(), site.out(), false).unwrap();
    assert_eq!(read(site.out().join("index.html")), "from layouts");
}

#[test]
fn test_globals_load_without_pages_file() {
    let site = Site::new();
    site.write("globals.spec", "site: Dev Blog\n");

    let mut compiler = site.compiler(false);
    assert_eq!(compiler.globals().unwrap()["site"], "Dev Blog");
    assert!(matches!(compiler.pages(), Err(CompileError::SpecNotFound { .. })));
}

#[test]
fn test_parsed_pages_survive_a_missing_globals_file() {
    let site = blog();
    std::fs::remove_file(site.root().join("globals.spec")).unwrap();
    let mut compiler = site.compiler(false);

    assert!(matches!(
        compiler.render_page("first"),
        Err(CompileError::SpecNotFound { .. })
    ));

    std::fs::remove_file(site.root().join("pages.spec")).unwrap();
    site.write("globals.spec", "site: Later\n");
    let page = compiler.render_page("first").unwrap();
    assert!(page.content.contains("<title>First | Later</title>"));
}

#[test]
fn test_missing_spec_message_names_the_file_once() {
    let site = Site::new();
    let path = site.root().join("pages.spec");

    let err = site.compiler(false).pages().unwrap_err();
    assert_eq!(err.to_string(), format!("could not open {}", path.display()));
    assert!(std::error::Error::source(&err).is_some());
}
