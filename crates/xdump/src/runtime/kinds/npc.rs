use super::{FieldDescriptor, FieldKind, FieldWidth, FormKind, KindDescriptor};

pub const FORM_TYPE: u8 = 0x2d;
const SHIFT: i32 = 16;

// Height and Weight were reported empirically absent/unverified at
// NPC+484/+488 in the source PDBs and are deliberately left out of the
// mandatory extraction table.
pub static DESCRIPTOR: KindDescriptor = KindDescriptor {
    form_type: FORM_TYPE,
    kind: FormKind::Npc,
    fields: &[
        FieldDescriptor {
            name: "level",
            pdb_offset: 0x1c,
            shift: SHIFT,
            width: FieldWidth::I16,
            kind: FieldKind::Scalar,
        },
        FieldDescriptor {
            name: "health",
            pdb_offset: 0x20,
            shift: SHIFT,
            width: FieldWidth::U32,
            kind: FieldKind::Scalar,
        },
        FieldDescriptor {
            name: "race",
            pdb_offset: 0x2c,
            shift: SHIFT,
            width: FieldWidth::U32,
            kind: FieldKind::FormRef,
        },
        FieldDescriptor {
            name: "class",
            pdb_offset: 0x30,
            shift: SHIFT,
            width: FieldWidth::U32,
            kind: FieldKind::FormRef,
        },
    ],
};
