//! Output file naming
//!
//! Pure functions deciding which extension generated files get and how a
//! protobuf file name maps onto an output file name.

use crate::template::Template;

/// Pick the extension used for every output file of one generate call
///
/// An explicit, non-empty extension wins verbatim. Otherwise the extension of
/// the first template source name that has one is used (entry template
/// first). When nothing is found the result is empty and output files simply
/// carry no extension.
pub fn resolve_extension(explicit: &str, template: &Template) -> String {
    if !explicit.is_empty() {
        return explicit.to_string();
    }

    template
        .source_names()
        .into_iter()
        .map(extension_of)
        .find(|ext| !ext.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Derive the output file name for a protobuf file
///
/// `pkg/foo.proto` with `.go` becomes `pkg/foo.go`. Backslash separators are
/// rewritten to forward slashes. Distinct inputs may collide; no check is made.
pub fn output_name(proto_name: &str, ext: &str) -> String {
    let mut name = strip_extension(proto_name).to_string();
    name.push_str(ext);
    unix_path(&name)
}

/// The extension of the final path element, including the leading dot
///
/// Returns an empty string when the final element has no dot.
pub fn extension_of(name: &str) -> &str {
    match extension_start(name) {
        Some(i) => &name[i..],
        None => "",
    }
}

/// `name` with the extension of its final path element removed
pub fn strip_extension(name: &str) -> &str {
    match extension_start(name) {
        Some(i) => &name[..i],
        None => name,
    }
}

/// Rewrite platform-style separators to forward slashes
pub fn unix_path(name: &str) -> String {
    name.replace('\\', "/")
}

fn extension_start(name: &str) -> Option<usize> {
    let base = name.rfind(is_separator).map_or(0, |i| i + 1);
    name[base..].rfind('.').map(|i| base + i)
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_name_replaces_extension() {
        assert_eq!(output_name("pkg/foo.proto", ".go"), "pkg/foo.go");
    }

    #[test]
    fn test_output_name_appends_when_no_extension() {
        assert_eq!(output_name("pkg/foo", ".go"), "pkg/foo.go");
    }

    #[test]
    fn test_output_name_normalizes_separators() {
        assert_eq!(output_name("pkg\\sub\\foo.proto", ".go"), "pkg/sub/foo.go");
    }

    #[test]
    fn test_output_name_only_strips_last_extension() {
        assert_eq!(output_name("foo.pb.proto", ".txt"), "foo.pb.txt");
    }

    #[test]
    fn test_dot_in_directory_is_not_an_extension() {
        assert_eq!(output_name("v1.2/foo", ".go"), "v1.2/foo.go");
        assert_eq!(extension_of("v1.2/foo"), "");
    }

    #[test]
    fn test_empty_extension_strips_only() {
        assert_eq!(output_name("a.proto", ""), "a");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("doc.html"), ".html");
        assert_eq!(extension_of("dir/page.md"), ".md");
        assert_eq!(extension_of("Makefile"), "");
    }

    #[test]
    fn test_resolve_extension_prefers_explicit() {
        let template = Template::from_raw("doc.html", "{{ name }}").unwrap();
        assert_eq!(resolve_extension(".txt", &template), ".txt");
    }

    #[test]
    fn test_resolve_extension_from_template_name() {
        let template = Template::from_raw("doc.html", "{{ name }}").unwrap();
        assert_eq!(resolve_extension("", &template), ".html");
    }

    #[test]
    fn test_resolve_extension_skips_names_without_extension() {
        let mut template = Template::from_raw("main", "{{ name }}").unwrap();
        template.add_raw_template("part.md", "x").unwrap();
        assert_eq!(resolve_extension("", &template), ".md");
    }

    #[test]
    fn test_resolve_extension_none_found() {
        let template = Template::from_raw("main", "{{ name }}").unwrap();
        assert_eq!(resolve_extension("", &template), "");
    }
}
