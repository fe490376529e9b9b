use super::{FieldDescriptor, FieldKind, FieldWidth, FormKind, KindDescriptor};

pub const FORM_TYPE: u8 = 0x13;
const SHIFT: i32 = 16;

pub static DESCRIPTOR: KindDescriptor = KindDescriptor {
    form_type: FORM_TYPE,
    kind: FormKind::Script,
    fields: &[
        FieldDescriptor {
            name: "script_flags",
            pdb_offset: 0x1c,
            shift: SHIFT,
            width: FieldWidth::U16,
            kind: FieldKind::Scalar,
        },
        FieldDescriptor {
            name: "compiled_size",
            pdb_offset: 0x20,
            shift: SHIFT,
            width: FieldWidth::U32,
            kind: FieldKind::Scalar,
        },
    ],
};
