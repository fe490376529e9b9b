use super::{FieldDescriptor, FieldKind, FieldWidth, FormKind, KindDescriptor};

/// +4: the shift `TESTopicInfo` gets between its PDB-declared base and the
/// runtime image, distinct from the +16 most bound-object kinds use.
const SHIFT: i32 = 4;

pub static DESCRIPTOR: KindDescriptor = KindDescriptor {
    form_type: 0, // unused: dispatch for this kind goes through the calibrated value, not this constant
    kind: FormKind::DialogTopic,
    fields: &[
        FieldDescriptor {
            name: "topic_text",
            pdb_offset: 0x18,
            shift: SHIFT,
            width: FieldWidth::U32,
            kind: FieldKind::StringPtr,
        },
        FieldDescriptor {
            name: "parent_quest",
            pdb_offset: 0x24,
            shift: SHIFT,
            width: FieldWidth::U32,
            kind: FieldKind::FormRef,
        },
    ],
};
