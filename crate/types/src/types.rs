use boxc_derive::NamedEnum;

/// The primitive types of Box (spec §3). `num24` is the default integer
/// width; `f16`/`f24` share storage with `num16`/`num24` respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, NamedEnum)]
pub enum Primitive {
    Num16,
    Num24,
    F16,
    F24,
    Char,
    Void,
}

impl Primitive {
    /// Size in bytes of a value of this primitive type. `Void` has no
    /// storage; it is only legal on return types and as a pointee.
    pub const fn size(&self) -> u8 {
        match self {
            Primitive::Num16 | Primitive::F16 => 2,
            Primitive::Num24 | Primitive::F24 => 3,
            Primitive::Char => 1,
            Primitive::Void => 0,
        }
    }

    pub const fn is_numeric(&self) -> bool {
        !matches!(self, Primitive::Void)
    }
}

/// A Box type: one of the closed set of primitives, or a single level of
/// pointer over any `BoxType` (deeper pointers are not expressible in the
/// source grammar; see spec §4.4).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BoxType {
    Primitive(Primitive),
    Pointer(Box<BoxType>),
}

impl BoxType {
    pub const NUM16: BoxType = BoxType::Primitive(Primitive::Num16);
    pub const NUM24: BoxType = BoxType::Primitive(Primitive::Num24);
    pub const F16: BoxType = BoxType::Primitive(Primitive::F16);
    pub const F24: BoxType = BoxType::Primitive(Primitive::F24);
    pub const CHAR: BoxType = BoxType::Primitive(Primitive::Char);
    pub const VOID: BoxType = BoxType::Primitive(Primitive::Void);

    /// `char*`, the string literal type.
    pub fn string() -> BoxType {
        BoxType::Pointer(Box::new(BoxType::CHAR))
    }

    pub fn pointer_to(inner: BoxType) -> BoxType {
        BoxType::Pointer(Box::new(inner))
    }

    pub const fn is_pointer(&self) -> bool {
        matches!(self, BoxType::Pointer(_))
    }

    pub const fn is_void(&self) -> bool {
        matches!(self, BoxType::Primitive(Primitive::Void))
    }

    /// `true` for `void*` specifically (not for other pointer types).
    pub fn is_void_pointer(&self) -> bool {
        matches!(self, BoxType::Pointer(inner) if inner.is_void())
    }

    pub fn pointee(&self) -> Option<&BoxType> {
        match self {
            BoxType::Pointer(inner) => Some(inner),
            _ => None,
        }
    }

    /// A condition in `if`/`while`/`switch` must be numeric or char
    /// (spec §4.5).
    pub fn is_numeric_or_char(&self) -> bool {
        matches!(
            self,
            BoxType::Primitive(Primitive::Num16 | Primitive::Num24 | Primitive::Char)
        )
    }

    /// Size in bytes: 3 for any pointer, the primitive's own size otherwise.
    pub fn size(&self) -> u8 {
        match self {
            BoxType::Primitive(p) => p.size(),
            BoxType::Pointer(_) => 3,
        }
    }

    /// Resolve a type-name token's lexeme to its primitive, if it names one.
    pub fn primitive_from_name(name: &str) -> Option<Primitive> {
        Primitive::from_str(name)
    }

    pub fn name(&self) -> String {
        match self {
            BoxType::Primitive(p) => p.name().to_string(),
            BoxType::Pointer(inner) => format!("{}*", inner.name()),
        }
    }
}

impl std::fmt::Display for BoxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
