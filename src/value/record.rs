use crate::types::RecordType;
use crate::value::Value;
use indexmap::IndexMap;

/// The value produced by an `ObjectSelection` over a non-module receiver,
/// or by evaluating a record literal used as call arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub fields: IndexMap<String, Value>,
    pub rec_type: RecordType,
}
