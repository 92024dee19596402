use std::path::PathBuf;

/// A span within a source file. Every AST node carries one; every error
/// carries a copy of the node's.
///
/// Unlike the GraphQL schema/executable-document split this is modeled on,
/// there is exactly one kind of source here (program text), so `filename:
/// None` stands in for a synthesized or builtin location instead of a
/// separate enum variant.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct SourceLocation {
    pub filename: Option<PathBuf>,
    pub line: usize,
    pub column: usize,
    pub length: usize,
}
impl SourceLocation {
    /// A location for values that exist without ever having been written in
    /// source (builtin scalar types, synthesized fresh type variables).
    pub fn builtin() -> Self {
        SourceLocation {
            filename: None,
            line: 0,
            column: 0,
            length: 0,
        }
    }

    pub fn new(
        filename: Option<PathBuf>,
        line: usize,
        column: usize,
        length: usize,
    ) -> Self {
        SourceLocation { filename, line, column, length }
    }

    pub fn is_builtin(&self) -> bool {
        self.filename.is_none() && self.line == 0 && self.column == 0
    }
}
impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.filename {
            Some(path) => write!(f, "{}:{}:{}", path.display(), self.line, self.column),
            None => write!(f, "<builtin>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_no_filename() {
        let loc = SourceLocation::builtin();
        assert!(loc.is_builtin());
        assert_eq!(loc.filename, None);
    }

    #[test]
    fn display_renders_path_and_position() {
        let loc = SourceLocation::new(Some(PathBuf::from("a.dang")), 3, 5, 4);
        assert_eq!(format!("{loc}"), "a.dang:3:5");
    }
}
