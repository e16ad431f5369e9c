//! Route source files.
//!
//! Routes can be declared in TOML files under a source directory. Files are
//! applied in lexicographic path order through the [`Routes`] DSL. Inside a
//! file, top-level `[[route]]` entries are registered before `[[group]]`
//! entries, and groups may nest.
//!
//! ```toml
//! [[route]]
//! method = "get"
//! path = "/users/{id}[int]"
//! handler = "UserController@show"
//!
//! [[group]]
//! middleware = ["Auth"]
//!
//!   [[group.route]]
//!   method = "post"
//!   path = "/users"
//!   handler = "UserController@store"
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{RouteError, RouteMethod, RouteTable, Routes};

/// File extension of route source files.
pub const SOURCE_EXTENSION: &str = "toml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SourceFile {
    #[serde(default)]
    route: Vec<RouteSpec>,
    #[serde(default)]
    group: Vec<GroupSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RouteSpec {
    method: String,
    path: String,
    handler: String,
    #[serde(default)]
    middleware: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GroupSpec {
    #[serde(default)]
    middleware: Vec<String>,
    #[serde(default)]
    route: Vec<RouteSpec>,
    #[serde(default)]
    group: Vec<GroupSpec>,
}

/// Lists the route source files under `dir`, recursively, sorted by path.
///
/// A missing directory yields no files.
pub fn source_files(dir: &Path) -> Result<Vec<PathBuf>, RouteError> {
    let mut files = Vec::new();
    if dir.is_dir() {
        collect(dir, &mut files)?;
    }
    files.sort();
    Ok(files)
}

fn collect(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), RouteError> {
    let entries = fs::read_dir(dir).map_err(|e| RouteError::io(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| RouteError::io(dir, e))?.path();
        if path.is_dir() {
            collect(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION) {
            files.push(path);
        }
    }
    Ok(())
}

/// Builds a route table from every source file under `dir`.
pub fn load_dir(dir: &Path) -> Result<RouteTable, RouteError> {
    let mut routes = Routes::new();
    for file in source_files(dir)? {
        load_file(&file, &mut routes)?;
    }
    tracing::info!(
        source_dir = %dir.display(),
        routes = routes.table().len(),
        "route table built from sources"
    );
    Ok(routes.into_table())
}

/// Applies one source file to `routes`.
pub fn load_file(path: &Path, routes: &mut Routes) -> Result<(), RouteError> {
    let content = fs::read_to_string(path).map_err(|e| RouteError::io(path, e))?;
    load_str(path, &content, routes)
}

/// Applies TOML source text to `routes`. `origin` names the source in errors.
pub fn load_str(origin: &Path, content: &str, routes: &mut Routes) -> Result<(), RouteError> {
    let file: SourceFile =
        toml::from_str(content).map_err(|e| RouteError::source(origin, e.to_string()))?;

    tracing::debug!(
        file = %origin.display(),
        routes = file.route.len(),
        groups = file.group.len(),
        "loading route source"
    );

    register_all(origin, &file.route, &file.group, routes)
}

fn register_all(
    origin: &Path,
    specs: &[RouteSpec],
    groups: &[GroupSpec],
    routes: &mut Routes,
) -> Result<(), RouteError> {
    for spec in specs {
        register(origin, spec, routes)?;
    }
    for group in groups {
        routes.with_middleware(group.middleware.as_slice(), |routes| {
            register_all(origin, &group.route, &group.group, routes)
        })?;
    }
    Ok(())
}

fn register(origin: &Path, spec: &RouteSpec, routes: &mut Routes) -> Result<(), RouteError> {
    let methods: Vec<RouteMethod> = if spec.method.eq_ignore_ascii_case("any") {
        RouteMethod::ANY.to_vec()
    } else {
        let method = spec
            .method
            .parse::<RouteMethod>()
            .map_err(|e| RouteError::source(origin, e.to_string()))?;
        vec![method]
    };

    for method in methods {
        routes.route_with(method, &spec.path, &spec.handler, spec.middleware.as_slice())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use tempfile::TempDir;

    const USERS: &str = r#"
[[route]]
method = "get"
path = "/users/{id}[int]"
handler = "UserController@show"

[[group]]
middleware = ["Auth"]

  [[group.route]]
  method = "post"
  path = "/users"
  handler = "UserController@store"
  middleware = ["Throttle@strict"]

  [[group.group]]
  middleware = ["Admin@check"]

    [[group.group.route]]
    method = "any"
    path = "/admin/users/{id}"
    handler = "AdminController@users"
"#;

    #[test]
    fn test_load_str_registers_routes_and_groups() {
        let mut routes = Routes::new();
        load_str(Path::new("users.toml"), USERS, &mut routes).unwrap();
        let table = routes.into_table();

        assert_eq!(table.len(), 7);
        assert!(table.lookup(&Method::GET, "/users/1").unwrap().entry.middleware.is_empty());

        let store = table.lookup(&Method::POST, "/users").unwrap();
        let chain: Vec<String> = store.entry.middleware.iter().map(ToString::to_string).collect();
        assert_eq!(chain, vec!["Auth@handle", "Throttle@strict"]);

        let admin = table.lookup(&Method::PATCH, "/admin/users/3").unwrap();
        let chain: Vec<String> = admin.entry.middleware.iter().map(ToString::to_string).collect();
        assert_eq!(chain, vec!["Auth@handle", "Admin@check"]);
    }

    #[test]
    fn test_unknown_keys_fail() {
        let mut routes = Routes::new();
        let err = load_str(
            Path::new("bad.toml"),
            "[[route]]\nmethod = \"get\"\npath = \"/\"\nhandler = \"H@i\"\ncolour = \"red\"\n",
            &mut routes,
        )
        .unwrap_err();
        assert!(matches!(err, RouteError::Source { .. }));
    }

    #[test]
    fn test_unknown_method_fails() {
        let mut routes = Routes::new();
        let err = load_str(
            Path::new("bad.toml"),
            "[[route]]\nmethod = \"fetch\"\npath = \"/\"\nhandler = \"H@i\"\n",
            &mut routes,
        )
        .unwrap_err();
        assert!(err.to_string().contains("fetch"));
    }

    #[test]
    fn test_load_dir_orders_files() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(
            dir.path().join("b.toml"),
            "[[route]]\nmethod = \"get\"\npath = \"/posts/{id}[int]\"\nhandler = \"Posts@byId\"\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("a.toml"),
            "[[route]]\nmethod = \"get\"\npath = \"/posts/{slug}\"\nhandler = \"Posts@bySlug\"\n",
        )
        .unwrap();
        fs::write(dir.path().join("nested/c.toml"), "").unwrap();
        fs::write(dir.path().join("README.md"), "not a route file").unwrap();

        let files = source_files(dir.path()).unwrap();
        assert_eq!(files.len(), 3);

        let table = load_dir(dir.path()).unwrap();
        let found = table.lookup(&Method::GET, "/posts/7").unwrap();
        assert_eq!(found.entry.handler.action(), "bySlug");
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let table = load_dir(&dir.path().join("absent")).unwrap();
        assert!(table.is_empty());
    }
}
