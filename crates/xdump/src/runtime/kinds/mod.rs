//! Closed set of reconstructible FormRecord kinds and the field-extraction
//! descriptor tables that drive them.

mod armor;
mod container;
mod dialog_topic;
mod npc;
mod script;
pub(crate) mod weapon;

use std::collections::BTreeMap;

use crate::binary::{BinaryReader, Endian};
use crate::dump::{DumpSource, MinidumpIndex};
use crate::error::RuntimeError;
use crate::runtime::strings;

/// A `form_type` byte at or above this value is not stable across engine
/// builds; dispatch in that range requires a calibrated value.
const CALIBRATED_DISPATCH_THRESHOLD: u8 = 0x45;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FormKind {
    Npc,
    Weapon,
    Armor,
    Container,
    DialogTopic,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldWidth {
    U8,
    U16,
    U32,
    I16,
    I32,
    F32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    /// A pointer to another engine form; resolved to that form's `form_id`.
    FormRef,
    /// A pointer to an engine string descriptor (`{data_ptr,length,capacity}`).
    StringPtr,
}

/// One field in a kind's extraction table. `pdb_offset` is the offset as
/// reported by PDB symbols; `shift` is the constant the engine inserts
/// between the PDB-declared base and the runtime image for this kind (+16
/// for most `TESBoundObject`-derived kinds, +4 for `TESTopicInfo`).
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub pdb_offset: usize,
    pub shift: i32,
    pub width: FieldWidth,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    U8(u8),
    U16(u16),
    U32(u32),
    I16(i16),
    I32(i32),
    F32(f32),
    Str(String),
    FormRef(u32),
    /// A bounded dynamic array of contained-item FormIDs, used for
    /// `Container`'s item list.
    FormRefList(Vec<u32>),
}

pub struct KindDescriptor {
    pub form_type: u8,
    pub kind: FormKind,
    pub fields: &'static [FieldDescriptor],
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormRecord {
    pub kind: FormKind,
    pub form_id: u32,
    pub editor_id: Option<String>,
    pub fields: BTreeMap<&'static str, FieldValue>,
}

const STABLE_KINDS: &[&KindDescriptor] = &[
    &npc::DESCRIPTOR,
    &weapon::DESCRIPTOR,
    &armor::DESCRIPTOR,
    &container::DESCRIPTOR,
    &script::DESCRIPTOR,
];

/// Resolves a `form_type` byte to a kind descriptor. Values at or above
/// [`CALIBRATED_DISPATCH_THRESHOLD`] only resolve to [`dialog_topic`] once
/// `calibrated_info_form_type` has been determined, and only if they match
/// it exactly — an uncalibrated reader simply does not reconstruct those
/// kinds rather than guessing.
pub fn dispatch(form_type: u8, calibrated_info_form_type: Option<u8>) -> Option<&'static KindDescriptor> {
    if form_type >= CALIBRATED_DISPATCH_THRESHOLD {
        return calibrated_info_form_type
            .filter(|&calibrated| calibrated == form_type)
            .map(|_| &dialog_topic::DESCRIPTOR);
    }
    STABLE_KINDS.iter().copied().find(|d| d.form_type == form_type)
}

fn read_scalar(dump: &DumpSource, offset: u64, width: FieldWidth) -> Option<FieldValue> {
    match width {
        FieldWidth::U8 => dump.read_at(offset, 1).ok().map(|b| FieldValue::U8(b[0])),
        FieldWidth::U16 => {
            let bytes = dump.read_at(offset, 2).ok()?;
            BinaryReader::new(bytes).u16(0, Endian::Big).ok().map(FieldValue::U16)
        }
        FieldWidth::U32 => {
            let bytes = dump.read_at(offset, 4).ok()?;
            BinaryReader::new(bytes).u32(0, Endian::Big).ok().map(FieldValue::U32)
        }
        FieldWidth::I16 => {
            let bytes = dump.read_at(offset, 2).ok()?;
            BinaryReader::new(bytes).i16(0, Endian::Big).ok().map(FieldValue::I16)
        }
        FieldWidth::I32 => {
            let bytes = dump.read_at(offset, 4).ok()?;
            BinaryReader::new(bytes).i32(0, Endian::Big).ok().map(FieldValue::I32)
        }
        FieldWidth::F32 => {
            let bytes = dump.read_at(offset, 4).ok()?;
            BinaryReader::new(bytes).f32(0, Endian::Big).ok().map(FieldValue::F32)
        }
    }
}

/// Reads a pointer at `offset`, resolves it through the minidump index, and
/// returns the `form_id` at `target + 12` (the PDB-stable offset shared by
/// every form kind). A null pointer yields `Ok(None)`, not a rejection; an
/// unresolved non-null pointer is the one failure mode this component
/// surfaces as a counted diagnostic rather than a silent drop.
fn read_form_ref(
    dump: &DumpSource,
    minidump: &MinidumpIndex,
    offset: u64,
) -> Result<Option<FieldValue>, RuntimeError> {
    let bytes = dump.read_at(offset, 4)?;
    let ptr = BinaryReader::new(bytes).u32(0, Endian::Big)?;
    if ptr == 0 {
        return Ok(None);
    }
    let target_offset = minidump
        .va_to_file_offset(u64::from(ptr))
        .ok_or(RuntimeError::UnresolvedTarget { va: u64::from(ptr) })?;
    let target_bytes = dump.read_at(target_offset + 12, 4)?;
    let form_id = BinaryReader::new(target_bytes).u32(0, Endian::Big)?;
    Ok(Some(FieldValue::FormRef(form_id)))
}

fn read_string_ptr(dump: &DumpSource, minidump: &MinidumpIndex, offset: u64) -> Option<FieldValue> {
    let descriptor = strings::read_descriptor(dump, offset)?;
    strings::read_value(dump, minidump, &descriptor).map(FieldValue::Str)
}

/// Extracts every field in `desc.fields` at `file_offset`, per the
/// per-kind descriptor table. A field that fails to resolve (out of
/// bounds, null string pointer) is simply omitted — only an unresolved
/// `FormRef` target escalates to `Err` for the caller to count.
pub fn extract(
    desc: &KindDescriptor,
    dump: &DumpSource,
    minidump: &MinidumpIndex,
    file_offset: u64,
    form_id: u32,
) -> Result<Option<FormRecord>, RuntimeError> {
    let mut fields = BTreeMap::new();

    for field in desc.fields {
        let runtime_offset = field.pdb_offset as i64 + i64::from(field.shift);
        if runtime_offset < 0 {
            continue;
        }
        let abs_offset = file_offset + runtime_offset as u64;

        let value = match field.kind {
            FieldKind::Scalar => read_scalar(dump, abs_offset, field.width),
            FieldKind::FormRef => read_form_ref(dump, minidump, abs_offset)?,
            FieldKind::StringPtr => read_string_ptr(dump, minidump, abs_offset),
        };

        if let Some(value) = value {
            fields.insert(field.name, value);
        }
    }

    if desc.kind == FormKind::Container {
        if let (Some(FieldValue::U32(buffer_ptr)), Some(FieldValue::U32(count))) =
            (fields.get("items_buffer_ptr"), fields.get("items_count"))
        {
            // Each entry is a { form_id, count } pair; read twice as many
            // u32 elements and keep only the FormID half of each pair.
            let raw = crate::runtime::dynamic_array::read_elements(
                dump,
                minidump,
                u64::from(*buffer_ptr),
                count.saturating_mul(2),
            );
            if !raw.is_empty() {
                let form_ids: Vec<u32> = raw.chunks_exact(2).map(|pair| pair[0]).collect();
                fields.insert("contained_items", FieldValue::FormRefList(form_ids));
            }
        }
    }

    Ok(Some(FormRecord {
        kind: desc.kind,
        form_id,
        editor_id: None,
        fields,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_resolves_stable_kind() {
        let desc = dispatch(weapon::FORM_TYPE, None).expect("weapon dispatches unconditionally");
        assert_eq!(desc.kind, FormKind::Weapon);
    }

    #[test]
    fn dispatch_refuses_calibrated_range_without_calibration() {
        assert!(dispatch(0x48, None).is_none());
    }

    #[test]
    fn dispatch_resolves_calibrated_kind_once_calibrated() {
        let desc = dispatch(0x48, Some(0x48)).expect("calibrated INFO form_type dispatches");
        assert_eq!(desc.kind, FormKind::DialogTopic);
    }

    #[test]
    fn extract_reads_scalar_fields() {
        let mut buf = vec![0u8; 64];
        let offset = weapon::DESCRIPTOR.fields[0].pdb_offset as i64 + i64::from(weapon::DESCRIPTOR.fields[0].shift);
        let offset = offset as usize;
        buf[offset..offset + 2].copy_from_slice(&25u16.to_be_bytes());
        let dump = DumpSource::from_bytes(buf);
        let minidump = MinidumpIndex::with_regions(vec![]);

        let record = extract(&weapon::DESCRIPTOR, &dump, &minidump, 0, 0x0001_0001)
            .unwrap()
            .unwrap();
        assert_eq!(record.fields.get("damage"), Some(&FieldValue::U16(25)));
    }
}
