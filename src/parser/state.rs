//! Parse cursor context
//!
//! [`ParserState`] is a plain value: every line handler receives the current
//! state and returns the next one. Nothing else carries parse context.

/// File type from the `!LDRAW_ORG` header or inferred from a file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// A model; placements go into building steps
    Model,
    /// A part
    Part,
    /// A sub-part
    Subpart,
    /// A primitive
    Primitive,
    /// A low-resolution (8 segment) primitive
    LowResPrimitive,
    /// A high-resolution (48 segment) primitive
    HiResPrimitive,
    /// A shortcut (a part assembled from other parts)
    Shortcut,
    /// A helper file
    Helper,
    /// A configuration file (e.g. LDConfig.ldr)
    Configuration,
}

impl FileType {
    /// Look up the type named in a `!LDRAW_ORG` header
    ///
    /// Matching ignores case, and the `Unofficial_` prefix is accepted on every
    /// type. Returns `None` for unknown names.
    pub fn from_header(value: &str) -> Option<Self> {
        let value = value.to_ascii_lowercase();
        let value = value.strip_prefix("unofficial_").unwrap_or(&value);
        match value {
            "model" => Some(FileType::Model),
            "part" => Some(FileType::Part),
            "subpart" => Some(FileType::Subpart),
            "primitive" => Some(FileType::Primitive),
            "8_primitive" => Some(FileType::LowResPrimitive),
            "48_primitive" => Some(FileType::HiResPrimitive),
            "shortcut" => Some(FileType::Shortcut),
            "helper" => Some(FileType::Helper),
            "configuration" => Some(FileType::Configuration),
            _ => None,
        }
    }

    /// Whether placements in this file go into building steps
    pub fn is_model(&self) -> bool {
        matches!(self, FileType::Model)
    }
}

/// What set the current file type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeSource {
    /// Declared by a `!LDRAW_ORG` header
    Header,
    /// Inferred from the extension of a `FILE` or `NAME` target
    FileName,
}

/// Parse context threaded through every line handler
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserState {
    /// Model placements are appended to
    pub active_model: Option<String>,
    /// Part geometry and nested placements are appended to
    pub active_part: Option<String>,
    /// Current file type
    pub file_type: Option<FileType>,
    /// What set `file_type`
    pub inferred_by: Option<TypeSource>,
}

impl ParserState {
    /// Initial state with no context
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial state for parsing the backing file of part `name`
    pub fn for_part(name: impl Into<String>) -> Self {
        Self {
            active_model: None,
            active_part: Some(name.into()),
            file_type: Some(FileType::Part),
            inferred_by: Some(TypeSource::FileName),
        }
    }

    /// Initial state for parsing the backing file of model `name`
    pub fn for_model(name: impl Into<String>) -> Self {
        Self {
            active_model: Some(name.into()),
            active_part: None,
            file_type: Some(FileType::Model),
            inferred_by: Some(TypeSource::FileName),
        }
    }

    /// Switch to model `name`, leaving any active part
    pub fn with_model(self, name: impl Into<String>) -> Self {
        Self {
            active_model: Some(name.into()),
            active_part: None,
            ..self
        }
    }

    /// Switch to part `name`, leaving any active model
    pub fn with_part(self, name: impl Into<String>) -> Self {
        Self {
            active_model: None,
            active_part: Some(name.into()),
            ..self
        }
    }

    /// Set the file type and what set it
    pub fn with_file_type(self, file_type: FileType, source: TypeSource) -> Self {
        Self {
            file_type: Some(file_type),
            inferred_by: Some(source),
            ..self
        }
    }

    /// Leave any active model or part (`NOFILE`)
    pub fn cleared(self) -> Self {
        Self {
            active_model: None,
            active_part: None,
            ..self
        }
    }

    /// Whether a file name may (re)infer the file type
    ///
    /// A type declared by a header is kept; an unset or inferred type is not.
    pub fn may_infer_type(&self) -> bool {
        self.inferred_by != Some(TypeSource::Header)
    }

    /// Whether placements are routed to the active model
    pub fn routes_to_model(&self) -> bool {
        self.file_type.is_some_and(|t| t.is_model())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_header() {
        assert_eq!(FileType::from_header("Part"), Some(FileType::Part));
        assert_eq!(FileType::from_header("Unofficial_Part"), Some(FileType::Part));
        assert_eq!(
            FileType::from_header("48_Primitive"),
            Some(FileType::HiResPrimitive)
        );
        assert_eq!(
            FileType::from_header("Unofficial_Subpart"),
            Some(FileType::Subpart)
        );
        assert_eq!(FileType::from_header("UNOFFICIAL_PART"), Some(FileType::Part));
        assert_eq!(FileType::from_header("unofficial_shortcut"), Some(FileType::Shortcut));
        assert_eq!(FileType::from_header("Model"), Some(FileType::Model));
        assert_eq!(FileType::from_header("Sticker"), None);
    }

    #[test]
    fn test_transitions_replace_context() {
        let state = ParserState::new().with_model("main.ldr");
        assert_eq!(state.active_model.as_deref(), Some("main.ldr"));

        let state = state.with_part("brick.dat");
        assert_eq!(state.active_model, None);
        assert_eq!(state.active_part.as_deref(), Some("brick.dat"));

        let state = state.cleared();
        assert_eq!(state, ParserState::new());
    }

    #[test]
    fn test_header_blocks_inference() {
        let state = ParserState::new();
        assert!(state.may_infer_type());
        let state = state.with_file_type(FileType::Part, TypeSource::FileName);
        assert!(state.may_infer_type());
        let state = state.with_file_type(FileType::Part, TypeSource::Header);
        assert!(!state.may_infer_type());
    }

    #[test]
    fn test_for_part() {
        let state = ParserState::for_part("stud.dat");
        assert_eq!(state.active_part.as_deref(), Some("stud.dat"));
        assert!(!state.routes_to_model());
        assert!(ParserState::for_model("m.ldr").routes_to_model());
    }
}
