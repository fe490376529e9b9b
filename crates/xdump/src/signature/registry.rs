//! Static catalog of recognised file-format signatures.
//!
//! Built once per run and treated as immutable afterward — nothing here
//! mutates once [`SignatureRegistry::builtin`] returns.

/// Which [`crate::parsers::FormatParser`] a signature is bound to.
///
/// `SimpleHeader` covers the formats whose only carving rule is "read an
/// explicit size field from the header and clamp it" (LIP/SCDA/XDBF/XUI/ESP)
/// — they share one parser parameterised by a [`SimpleHeaderLayout`] rather
/// than each getting a bespoke implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserKind {
    Dds,
    Ddx,
    Xma,
    Png,
    Nif,
    Xex,
    SimpleHeader(SimpleHeaderLayout),
}

/// Where the explicit size field lives for a `SimpleHeader` format, and
/// whether a fixed amount should be added on top of the field's value (the
/// field sometimes encodes a body size, not a total file size).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimpleHeaderLayout {
    pub size_field_offset: usize,
    pub size_field_width: SizeFieldWidth,
    pub size_includes_header: bool,
    pub header_size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeFieldWidth {
    U16,
    U32,
}

/// One entry in the signature catalog.
///
/// Invariants: `magic` is non-empty; `min_size <= max_size`; `id` is unique
/// within a registry.
#[derive(Debug, Clone)]
pub struct Signature {
    pub id: &'static str,
    pub magic: &'static [u8],
    pub min_size: u32,
    pub max_size: u32,
    pub parser_kind: ParserKind,
    pub output_folder: &'static str,
    pub extension: &'static str,
    pub category: &'static str,
    /// Used to break ties when two accepted records claim overlapping
    /// extents. Higher wins.
    pub priority: u32,
}

/// The immutable, once-built catalog of every format the system recognises.
#[derive(Debug, Clone)]
pub struct SignatureRegistry {
    signatures: Vec<Signature>,
}

impl SignatureRegistry {
    /// Builds the static registry. Call once per run; the result is shared
    /// read-only by the scanner and the orchestrator's parser dispatch.
    pub fn builtin() -> Self {
        let signatures = vec![
            Signature {
                id: "dds",
                magic: b"DDS ",
                min_size: 128,
                max_size: 64 * 1024 * 1024,
                parser_kind: ParserKind::Dds,
                output_folder: "textures",
                extension: "dds",
                category: "texture",
                priority: 50,
            },
            Signature {
                id: "ddx",
                magic: b"3XDO",
                min_size: 68,
                max_size: 64 * 1024 * 1024,
                parser_kind: ParserKind::Ddx,
                output_folder: "textures_xbox",
                extension: "ddx",
                category: "texture",
                priority: 50,
            },
            Signature {
                id: "ddx_be",
                magic: b"3XDR",
                min_size: 68,
                max_size: 64 * 1024 * 1024,
                parser_kind: ParserKind::Ddx,
                output_folder: "textures_xbox",
                extension: "ddx",
                category: "texture",
                priority: 50,
            },
            Signature {
                id: "xma",
                magic: b"RIFF",
                min_size: 44,
                max_size: 32 * 1024 * 1024,
                parser_kind: ParserKind::Xma,
                output_folder: "audio",
                extension: "xma",
                category: "audio",
                priority: 20,
            },
            Signature {
                id: "png",
                magic: b"\x89PNG\r\n\x1a\n",
                min_size: 8 + (12 + 13) + 12, // sig + IHDR chunk (header+crc 12, data 13) + IEND chunk
                max_size: 32 * 1024 * 1024,
                parser_kind: ParserKind::Png,
                output_folder: "images",
                extension: "png",
                category: "image",
                priority: 70,
            },
            Signature {
                id: "nif",
                magic: b"Gamebryo",
                min_size: 64,
                max_size: 128 * 1024 * 1024,
                parser_kind: ParserKind::Nif,
                output_folder: "meshes",
                extension: "nif",
                category: "mesh",
                priority: 60,
            },
            Signature {
                id: "xex",
                magic: b"XEX2",
                min_size: 24,
                max_size: 64 * 1024 * 1024,
                parser_kind: ParserKind::Xex,
                output_folder: "executables",
                extension: "xex",
                category: "executable",
                priority: 90,
            },
            Signature {
                id: "lip",
                magic: b"LIP ",
                min_size: 16,
                max_size: 1024 * 1024,
                parser_kind: ParserKind::SimpleHeader(SimpleHeaderLayout {
                    size_field_offset: 8,
                    size_field_width: SizeFieldWidth::U32,
                    size_includes_header: false,
                    header_size: 16,
                }),
                output_folder: "lipsync",
                extension: "lip",
                category: "lipsync",
                priority: 40,
            },
            Signature {
                id: "scda",
                magic: b"SCDA",
                min_size: 12,
                max_size: 4 * 1024 * 1024,
                parser_kind: ParserKind::SimpleHeader(SimpleHeaderLayout {
                    size_field_offset: 4,
                    size_field_width: SizeFieldWidth::U32,
                    size_includes_header: false,
                    header_size: 8,
                }),
                output_folder: "scripts",
                extension: "scda",
                category: "script",
                priority: 30,
            },
            Signature {
                id: "xdbf",
                magic: b"XDBF",
                min_size: 24,
                max_size: 8 * 1024 * 1024,
                parser_kind: ParserKind::SimpleHeader(SimpleHeaderLayout {
                    size_field_offset: 8,
                    size_field_width: SizeFieldWidth::U32,
                    size_includes_header: true,
                    header_size: 0,
                }),
                output_folder: "dashboard",
                extension: "xdbf",
                category: "dashboard",
                priority: 45,
            },
            Signature {
                id: "xui",
                magic: b"XUIB",
                min_size: 16,
                max_size: 4 * 1024 * 1024,
                parser_kind: ParserKind::SimpleHeader(SimpleHeaderLayout {
                    size_field_offset: 4,
                    size_field_width: SizeFieldWidth::U32,
                    size_includes_header: true,
                    header_size: 0,
                }),
                output_folder: "ui",
                extension: "xui",
                category: "ui",
                priority: 35,
            },
            Signature {
                id: "esp",
                magic: b"TES4",
                min_size: 24,
                max_size: 256 * 1024 * 1024,
                parser_kind: ParserKind::SimpleHeader(SimpleHeaderLayout {
                    size_field_offset: 4,
                    size_field_width: SizeFieldWidth::U32,
                    size_includes_header: true,
                    header_size: 24,
                }),
                output_folder: "plugins",
                extension: "esp",
                category: "plugin",
                priority: 80,
            },
        ];

        SignatureRegistry::from_signatures(signatures)
    }

    fn from_signatures(signatures: Vec<Signature>) -> Self {
        debug_assert!(signatures.iter().all(|s| !s.magic.is_empty()));
        debug_assert!(signatures.iter().all(|s| s.min_size <= s.max_size));
        debug_assert!({
            let mut ids: Vec<_> = signatures.iter().map(|s| s.id).collect();
            ids.sort_unstable();
            ids.windows(2).all(|w| w[0] != w[1])
        });
        SignatureRegistry { signatures }
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    pub fn by_id(&self, id: &str) -> Option<&Signature> {
        self.signatures.iter().find(|s| s.id == id)
    }

    pub fn priority_of(&self, id: &str) -> u32 {
        self.by_id(id).map(|s| s.priority).unwrap_or(0)
    }
}
