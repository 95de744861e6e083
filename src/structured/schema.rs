//! Per-feature item schemas: which fields are closed enumerations, their allowed values, and
//! the documented default substituted for anything else.

/// How a declared field is coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text. Missing or null becomes `""`.
    Text,
    /// Closed enumeration. Values outside `allowed` become `default`.
    Enum {
        allowed: &'static [&'static str],
        default: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
        }
    }

    pub const fn one_of(
        name: &'static str,
        allowed: &'static [&'static str],
        default: &'static str,
    ) -> Self {
        Self {
            name,
            kind: FieldKind::Enum { allowed, default },
        }
    }
}

/// Shape of one structured result type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemSchema {
    pub name: &'static str,
    /// Key holding the item array when the model wraps it in an object (`{"issues": [...]}`).
    pub collection_key: Option<&'static str>,
    pub fields: &'static [FieldSpec],
    /// "At most N" the prompt asks for. Logged when exceeded, never enforced.
    pub advisory_cap: Option<usize>,
}

impl ItemSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

pub const SEVERITIES: &[&str] = &["error", "warning", "info"];
pub const ISSUE_CATEGORIES: &[&str] = &[
    "character",
    "timeline",
    "location",
    "logic_gap",
    "worldbuilding",
];
pub const IDEA_CATEGORIES: &[&str] = &["plot", "character", "setting", "conflict", "theme"];
pub const LEVELS: &[&str] = &["high", "medium", "low"];
pub const GAP_TYPES: &[&str] = &["character", "plot", "world", "timeline", "motivation"];
pub const EMOTIONS: &[&str] = &["neutral", "happy", "sad", "angry", "fearful", "surprised"];
pub const PACES: &[&str] = &["slow", "moderate", "fast"];
pub const STRENGTHS: &[&str] = &["strong", "moderate", "weak"];
pub const BEAT_TYPES: &[&str] = &["action", "dialogue", "emotion", "description", "internal"];

pub const ISSUE: ItemSchema = ItemSchema {
    name: "issue",
    collection_key: Some("issues"),
    fields: &[
        FieldSpec::one_of("severity", SEVERITIES, "warning"),
        FieldSpec::one_of("category", ISSUE_CATEGORIES, "logic_gap"),
        FieldSpec::text("description"),
        FieldSpec::text("suggestion"),
    ],
    advisory_cap: Some(10),
};

pub const IDEA: ItemSchema = ItemSchema {
    name: "idea",
    collection_key: Some("ideas"),
    fields: &[
        FieldSpec::text("title"),
        FieldSpec::text("description"),
        FieldSpec::one_of("category", IDEA_CATEGORIES, "plot"),
    ],
    advisory_cap: Some(5),
};

pub const RIPPLE_EFFECT: ItemSchema = ItemSchema {
    name: "ripple_effect",
    collection_key: Some("effects"),
    fields: &[
        FieldSpec::text("affected_entity"),
        FieldSpec::one_of("impact_level", LEVELS, "medium"),
        FieldSpec::text("description"),
        FieldSpec::text("suggestion"),
    ],
    advisory_cap: Some(8),
};

pub const GAP: ItemSchema = ItemSchema {
    name: "gap",
    collection_key: Some("gaps"),
    fields: &[
        FieldSpec::one_of("gap_type", GAP_TYPES, "plot"),
        FieldSpec::one_of("priority", LEVELS, "medium"),
        FieldSpec::text("description"),
        FieldSpec::text("suggestion"),
    ],
    advisory_cap: Some(10),
};

pub const VOICE_SAMPLE: ItemSchema = ItemSchema {
    name: "voice_sample",
    collection_key: Some("samples"),
    fields: &[
        FieldSpec::text("line"),
        FieldSpec::one_of("emotion", EMOTIONS, "neutral"),
        FieldSpec::text("context"),
    ],
    advisory_cap: Some(5),
};

pub const BLUEPRINT_SECTION: ItemSchema = ItemSchema {
    name: "blueprint_section",
    collection_key: Some("sections"),
    fields: &[
        FieldSpec::text("title"),
        FieldSpec::text("purpose"),
        FieldSpec::one_of("pacing", PACES, "moderate"),
    ],
    advisory_cap: Some(8),
};

pub const PACING_SEGMENT: ItemSchema = ItemSchema {
    name: "pacing_segment",
    collection_key: Some("segments"),
    fields: &[
        FieldSpec::text("excerpt"),
        FieldSpec::one_of("pace", PACES, "moderate"),
        FieldSpec::text("note"),
    ],
    advisory_cap: Some(10),
};

pub const THEME: ItemSchema = ItemSchema {
    name: "theme",
    collection_key: Some("themes"),
    fields: &[
        FieldSpec::text("theme"),
        FieldSpec::one_of("strength", STRENGTHS, "moderate"),
        FieldSpec::text("evidence"),
    ],
    advisory_cap: Some(6),
};

pub const BEAT: ItemSchema = ItemSchema {
    name: "beat",
    collection_key: Some("beats"),
    fields: &[
        FieldSpec::one_of("type", BEAT_TYPES, "action"),
        FieldSpec::text("description"),
    ],
    advisory_cap: Some(8),
};

pub const SCENE_PLAN: ItemSchema = ItemSchema {
    name: "scene_plan",
    collection_key: None,
    fields: &[
        FieldSpec::text("pov"),
        FieldSpec::text("goal"),
        FieldSpec::text("conflict"),
        FieldSpec::text("resolution"),
        FieldSpec::text("setting"),
        FieldSpec::text("opening_line"),
    ],
    advisory_cap: None,
};
