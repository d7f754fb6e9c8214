use std::path::{Component, Path, PathBuf};

/// Maps a request path onto a file under `root`. Directories resolve to
/// their `index.html`. Any `..` component, or a file that does not exist,
/// yields `None`.
pub fn resolve(root: &Path, url: &str) -> Option<PathBuf> {
    let path = url.split(['?', '#']).next().unwrap_or("");
    let relative = Path::new(path.trim_start_matches('/'));

    let mut target = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => target.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if target.is_dir() {
        target.push("index.html");
    }
    target.is_file().then_some(target)
}

pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") | Some("mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<h1>dash</h1>").unwrap();
        fs::write(dir.path().join("styles.css"), "body {}").unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs").join("index.html"), "docs").unwrap();
        dir
    }

    #[test]
    fn test_root_and_directories_serve_index() {
        let dir = site();
        assert_eq!(
            resolve(dir.path(), "/"),
            Some(dir.path().join("index.html"))
        );
        assert_eq!(
            resolve(dir.path(), "/docs/"),
            Some(dir.path().join("docs").join("index.html"))
        );
    }

    #[test]
    fn test_files_and_query_strings() {
        let dir = site();
        assert_eq!(
            resolve(dir.path(), "/styles.css?v=3"),
            Some(dir.path().join("styles.css"))
        );
        assert_eq!(resolve(dir.path(), "/missing.js"), None);
    }

    #[test]
    fn test_parent_components_are_rejected() {
        let dir = site();
        let outside = dir.path().parent().unwrap().to_path_buf();
        assert!(outside.is_dir());
        assert_eq!(resolve(dir.path(), "/../"), None);
        assert_eq!(resolve(dir.path(), "/docs/../index.html"), None);
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type(Path::new("a/index.HTML")), "text/html; charset=utf-8");
        assert_eq!(
            content_type(Path::new("script.js")),
            "application/javascript; charset=utf-8"
        );
        assert_eq!(content_type(Path::new("logo.svg")), "image/svg+xml");
        assert_eq!(content_type(Path::new("blob")), "application/octet-stream");
    }
}
