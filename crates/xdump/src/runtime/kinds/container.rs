use super::{FieldDescriptor, FieldKind, FieldWidth, FormKind, KindDescriptor};

pub const FORM_TYPE: u8 = 0x1a;
const SHIFT: i32 = 16;

pub static DESCRIPTOR: KindDescriptor = KindDescriptor {
    form_type: FORM_TYPE,
    kind: FormKind::Container,
    fields: &[
        FieldDescriptor {
            name: "flags",
            pdb_offset: 0x1c,
            shift: SHIFT,
            width: FieldWidth::U8,
            kind: FieldKind::Scalar,
        },
        // The contained-items list is a dynamic array of FormID/count
        // pairs, walked separately via `runtime::dynamic_array` — it is
        // not a single scalar/FormRef field and so has no descriptor entry
        // here.
        FieldDescriptor {
            name: "items_buffer_ptr",
            pdb_offset: 0x30,
            shift: SHIFT,
            width: FieldWidth::U32,
            kind: FieldKind::Scalar,
        },
        FieldDescriptor {
            name: "items_count",
            pdb_offset: 0x34,
            shift: SHIFT,
            width: FieldWidth::U32,
            kind: FieldKind::Scalar,
        },
    ],
};
