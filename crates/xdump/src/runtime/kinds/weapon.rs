use super::{FieldDescriptor, FieldKind, FieldWidth, FormKind, KindDescriptor};

pub const FORM_TYPE: u8 = 0x28;

/// +16: the shift every `TESBoundObject`-derived kind picks up between its
/// PDB-declared base and the runtime image.
const SHIFT: i32 = 16;

pub static DESCRIPTOR: KindDescriptor = KindDescriptor {
    form_type: FORM_TYPE,
    kind: FormKind::Weapon,
    fields: &[
        FieldDescriptor {
            name: "damage",
            pdb_offset: 0x1c,
            shift: SHIFT,
            width: FieldWidth::U16,
            kind: FieldKind::Scalar,
        },
        FieldDescriptor {
            name: "weight",
            pdb_offset: 0x20,
            shift: SHIFT,
            width: FieldWidth::F32,
            kind: FieldKind::Scalar,
        },
        FieldDescriptor {
            name: "value",
            pdb_offset: 0x24,
            shift: SHIFT,
            width: FieldWidth::U32,
            kind: FieldKind::Scalar,
        },
        FieldDescriptor {
            name: "ammo",
            pdb_offset: 0x2c,
            shift: SHIFT,
            width: FieldWidth::U32,
            kind: FieldKind::FormRef,
        },
    ],
};
