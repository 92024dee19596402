use crate::types::Scheme;

/// One field of a [`RecordType`]. Positional fields (`positional: true`)
/// carry no key and bind to parameters by index at call time (spec.md §3
/// `Record`).
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct RecordField {
    pub key: Option<String>,
    pub scheme: Scheme,
    pub positional: bool,
}

/// A function's argument record, or the result of an `ObjectSelection`.
/// Also acts as a type environment for field lookup: field order and
/// per-field type must match exactly for two `RecordType`s to be equal,
/// but names are only compared when *both* sides carry one (spec.md §4.A)
/// -- otherwise comparison falls back to pure structural duck-typing.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct RecordType {
    pub name: Option<String>,
    pub fields: Vec<RecordField>,
}
impl RecordType {
    pub fn new(name: Option<String>, fields: Vec<RecordField>) -> Self {
        RecordType { name, fields }
    }

    pub fn empty() -> Self {
        RecordType { name: None, fields: vec![] }
    }

    pub fn field(&self, key: &str) -> Option<&RecordField> {
        self.fields.iter().find(|f| f.key.as_deref() == Some(key))
    }

    pub fn positional_field(&self, index: usize) -> Option<&RecordField> {
        self.fields.iter().filter(|f| f.positional).nth(index)
    }
}
impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        if let (Some(self_name), Some(other_name)) = (&self.name, &other.name) {
            if self_name != other_name {
                return false;
            }
        }
        if self.fields.len() != other.fields.len() {
            return false;
        }
        self.fields.iter().zip(other.fields.iter()).all(|(a, b)| {
            a.key == b.key && a.positional == b.positional && a.scheme.ty == b.scheme.ty
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    fn field(key: &str, ty: Type) -> RecordField {
        RecordField { key: Some(key.into()), scheme: crate::types::Scheme::monomorphic(ty), positional: false }
    }

    #[test]
    fn equal_when_same_ordered_fields() {
        let a = RecordType::new(None, vec![field("x", Type::Named("Int".into()))]);
        let b = RecordType::new(None, vec![field("x", Type::Named("Int".into()))]);
        assert_eq!(a, b);
    }

    #[test]
    fn unequal_when_field_order_differs() {
        let a = RecordType::new(None, vec![
            field("x", Type::Named("Int".into())),
            field("y", Type::Named("String".into())),
        ]);
        let b = RecordType::new(None, vec![
            field("y", Type::Named("String".into())),
            field("x", Type::Named("Int".into())),
        ]);
        assert_ne!(a, b);
    }

    #[test]
    fn names_ignored_when_either_side_is_anonymous() {
        let named = RecordType::new(Some("Point".into()), vec![field("x", Type::Named("Int".into()))]);
        let anon = RecordType::new(None, vec![field("x", Type::Named("Int".into()))]);
        assert_eq!(named, anon);
    }

    #[test]
    fn names_must_match_when_both_present() {
        let a = RecordType::new(Some("Point".into()), vec![field("x", Type::Named("Int".into()))]);
        let b = RecordType::new(Some("Vec2".into()), vec![field("x", Type::Named("Int".into()))]);
        assert_ne!(a, b);
    }
}
