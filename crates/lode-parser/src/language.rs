//! Language detection by file extension.
//!
//! Supports Python, JavaScript, TypeScript, Go, Java, and SQL, plus template
//! formats (Vue, Svelte, Astro, EJS, Handlebars, HTML, JSP) whose embedded
//! scripts are extracted by [`crate::template`].

use std::path::Path;

use lode_core::enums::Language;

/// Detect the language from a file path extension.
#[must_use]
pub fn detect_language(path: &str) -> Language {
    let ext = extension(path);
    match ext.as_str() {
        "py" | "pyw" | "pyi" => Language::Python,
        // Pure JavaScript plus templates whose scripts are JavaScript
        "js" | "mjs" | "cjs" | "jsx" | "ejs" | "hbs" | "handlebars" | "html" | "htm" | "vue"
        | "svelte" | "astro" => Language::Javascript,
        "ts" | "mts" | "cts" | "tsx" => Language::Typescript,
        "go" => Language::Go,
        "java" | "jsp" => Language::Java,
        "sql" | "psql" | "pgsql" | "plsql" | "ddl" | "dml" => Language::Sql,
        _ => Language::Unknown,
    }
}

/// Whether the file is a template that needs script extraction before parsing.
#[must_use]
pub fn is_template_file(path: &str) -> bool {
    matches!(
        extension(path).as_str(),
        "ejs" | "hbs" | "handlebars" | "html" | "htm" | "vue" | "svelte" | "astro" | "jsp" | "erb"
    )
}

fn extension(path: &str) -> String {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("app.py", Language::Python)]
    #[case("stubs.pyi", Language::Python)]
    #[case("util.mjs", Language::Javascript)]
    #[case("Component.vue", Language::Javascript)]
    #[case("index.ts", Language::Typescript)]
    #[case("App.tsx", Language::Typescript)]
    #[case("main.go", Language::Go)]
    #[case("Main.java", Language::Java)]
    #[case("page.jsp", Language::Java)]
    #[case("schema.sql", Language::Sql)]
    #[case("dump.pgsql", Language::Sql)]
    #[case("data.csv", Language::Unknown)]
    #[case("README", Language::Unknown)]
    fn detects_language(#[case] path: &str, #[case] expected: Language) {
        assert_eq!(detect_language(path), expected);
    }

    #[rstest]
    #[case("index.html", true)]
    #[case("Component.vue", true)]
    #[case("widget.svelte", true)]
    #[case("page.astro", true)]
    #[case("view.erb", true)]
    #[case("app.py", false)]
    #[case("index.ts", false)]
    fn detects_templates(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(is_template_file(path), expected);
    }

    #[test]
    fn nested_paths_use_final_extension() {
        assert_eq!(detect_language("src/parser/mod.py"), Language::Python);
        assert_eq!(detect_language("a/b/c.spec.ts"), Language::Typescript);
    }
}
