/// Per-declaration visibility (spec.md §3). Determines whether a field is
/// included in [`crate::value::ModuleValue::public_fields`] for host
/// introspection (spec.md §6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum Visibility {
    Public,
    Private,
}
impl Default for Visibility {
    fn default() -> Self {
        Visibility::Public
    }
}
