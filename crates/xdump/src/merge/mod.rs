//! Joins ESM-fragment records with runtime-reconstructed records by FormID.
//!
//! ESM fragments are raw signature-matched records for kinds whose data
//! still resides in the captured heap in subrecord form (CELL, LAND, INFO,
//! REFR, DIAL); runtime records come from [`crate::runtime`]. A FormID can
//! appear on both sides when the same form was both carved as a raw ESM
//! fragment and walked from the live heap — the two are reconciled field
//! by field, not just picked between.

use std::collections::BTreeMap;

use crate::runtime::{FieldValue, FormKind, FormRecord};

/// A record whose fields were recovered straight from an ESM-style
/// subrecord blob rather than walked from a live heap pointer. Field
/// values are kept as strings since subrecord layouts vary per kind and
/// this component only needs to compare presence, not type.
#[derive(Debug, Clone, PartialEq)]
pub struct EsmFragment {
    pub kind: FormKind,
    pub form_id: u32,
    pub fields: BTreeMap<String, String>,
}

/// One merged field value plus which side it came from, for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub enum MergedValue {
    FromEsm(String),
    FromRuntime(String),
}

impl MergedValue {
    pub fn as_str(&self) -> &str {
        match self {
            MergedValue::FromEsm(s) | MergedValue::FromRuntime(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    pub kind: FormKind,
    pub form_id: u32,
    pub editor_id: Option<String>,
    pub fields: BTreeMap<String, MergedValue>,
}

/// Records grouped by kind, the `SemanticMerger`'s output shape.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordCollection {
    records: Vec<MergedRecord>,
}

impl RecordCollection {
    pub fn by_kind(&self, kind: FormKind) -> impl Iterator<Item = &MergedRecord> {
        self.records.iter().filter(move |r| r.kind == kind)
    }

    pub fn all(&self) -> &[MergedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn field_to_string(value: &FieldValue) -> String {
    match value {
        FieldValue::U8(v) => v.to_string(),
        FieldValue::U16(v) => v.to_string(),
        FieldValue::U32(v) => v.to_string(),
        FieldValue::I16(v) => v.to_string(),
        FieldValue::I32(v) => v.to_string(),
        FieldValue::F32(v) => v.to_string(),
        FieldValue::Str(v) => v.clone(),
        FieldValue::FormRef(v) => format!("{v:#010x}"),
        FieldValue::FormRefList(items) => items.iter().map(|v| format!("{v:#010x}")).collect::<Vec<_>>().join(","),
    }
}

/// Merges ESM fragments with runtime records by `(kind, form_id)`. A
/// FormID colliding across *different* kinds is not a merge conflict —
/// distinct kind namespaces keep their own record.
pub struct SemanticMerger;

impl SemanticMerger {
    pub fn merge(esm_fragments: &[EsmFragment], runtime_records: &[FormRecord]) -> RecordCollection {
        let mut by_key: BTreeMap<(FormKind, u32), MergedRecord> = BTreeMap::new();

        for record in runtime_records {
            let key = (record.kind, record.form_id);
            let mut fields = BTreeMap::new();
            for (name, value) in &record.fields {
                fields.insert((*name).to_string(), MergedValue::FromRuntime(field_to_string(value)));
            }
            by_key.insert(
                key,
                MergedRecord {
                    kind: record.kind,
                    form_id: record.form_id,
                    editor_id: record.editor_id.clone(),
                    fields,
                },
            );
        }

        for fragment in esm_fragments {
            let key = (fragment.kind, fragment.form_id);
            let entry = by_key.entry(key).or_insert_with(|| MergedRecord {
                kind: fragment.kind,
                form_id: fragment.form_id,
                editor_id: None,
                fields: BTreeMap::new(),
            });
            // ESM subrecord value wins whenever present, per the merge policy.
            for (name, value) in &fragment.fields {
                entry.fields.insert(name.clone(), MergedValue::FromEsm(value.clone()));
            }
        }

        RecordCollection {
            records: by_key.into_values().collect(),
        }
    }
}
