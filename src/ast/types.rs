//! Type model shared by the parser and the semantic analyzer.
//!
//! A `Type` is a plain recursive value: a name, a pointer depth and, for
//! arrays, a boxed element type. Named struct types are resolved by name
//! against the symbol table, so the `members` of a type written in source
//! stay empty until the analyzer fills in a struct's declaration.

use std::fmt::Display;

pub const VOID: &str = "void";
pub const VARIADIC: &str = "...";

pub const POINTER_SIZE: u32 = 8;
pub const ARRAY_HEADER_SIZE: u32 = 8;

/// Names seeded into every symbol table.
pub const PRIMITIVES: [&str; 5] = ["void", "char", "int", "float", "bool"];

#[derive(Debug, Clone, Default)]
pub struct Type {
    pub name: String,
    pub pointer_depth: u32,
    /// Present iff this is an array type
    pub element: Option<Box<Type>>,
    pub members: Vec<Member>,
    /// Struct-of-arrays layout, one buffer per struct field
    pub realigned: bool,
    /// Members keep declaration order
    pub volatile: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub name: String,
    pub ty: Type,
}

impl Type {
    pub fn named(name: &str) -> Type {
        Type {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn pointer(name: &str, pointer_depth: u32) -> Type {
        Type {
            name: name.to_string(),
            pointer_depth,
            ..Default::default()
        }
    }

    pub fn array(element: Type) -> Type {
        Type {
            element: Some(Box::new(element)),
            ..Default::default()
        }
    }

    pub fn realigned_array(element: Type) -> Type {
        Type {
            element: Some(Box::new(element)),
            realigned: true,
            ..Default::default()
        }
    }

    pub fn void() -> Type {
        Type::named(VOID)
    }

    pub fn int() -> Type {
        Type::named("int")
    }

    pub fn float() -> Type {
        Type::named("float")
    }

    pub fn char() -> Type {
        Type::named("char")
    }

    pub fn bool() -> Type {
        Type::named("bool")
    }

    pub fn variadic() -> Type {
        Type::named(VARIADIC)
    }

    /// Best-effort type given to an expression after a semantic error.
    pub fn unresolved() -> Type {
        Type::default()
    }

    pub fn is_unresolved(&self) -> bool {
        self.name.is_empty() && self.element.is_none()
    }

    pub fn is_array(&self) -> bool {
        self.element.is_some()
    }

    pub fn is_pointer(&self) -> bool {
        self.pointer_depth > 0
    }

    pub fn is_void(&self) -> bool {
        self.name == VOID && self.pointer_depth == 0 && !self.is_array()
    }

    pub fn is_void_pointer(&self) -> bool {
        self.name == VOID && self.pointer_depth == 1 && !self.is_array()
    }

    pub fn is_variadic(&self) -> bool {
        self.name == VARIADIC
    }

    pub fn is_primitive(&self) -> bool {
        PRIMITIVES.contains(&self.name.as_str())
    }

    /// A struct value: neither pointer, array nor primitive.
    pub fn is_struct(&self) -> bool {
        !self.is_unresolved()
            && !self.is_array()
            && !self.is_pointer()
            && !self.is_primitive()
            && !self.is_variadic()
    }

    pub fn is_scalar(&self, name: &str) -> bool {
        self.name == name && self.pointer_depth == 0 && !self.is_array()
    }

    /// `int`, `float` or `char` values.
    pub fn is_arithmetic(&self) -> bool {
        self.is_scalar("int") || self.is_scalar("float") || self.is_scalar("char")
    }

    pub fn element_type(&self) -> Option<&Type> {
        self.element.as_deref()
    }

    pub fn with_pointer_depth(&self, pointer_depth: u32) -> Type {
        let mut ty = self.clone();
        ty.pointer_depth = pointer_depth;
        ty
    }

    /// The type that names the storage class of an array or pointer, e.g. the
    /// `S` in `[]*S` or `S**`.
    pub fn base_name(&self) -> &str {
        match &self.element {
            Some(element) => element.base_name(),
            None => &self.name,
        }
    }

    /// Storage size in bytes.
    ///
    /// Named structs only report a size once their members are filled in.
    pub fn size(&self) -> u32 {
        if self.pointer_depth > 0 {
            return POINTER_SIZE;
        }

        if let Some(element) = &self.element {
            if self.realigned {
                return ARRAY_HEADER_SIZE + POINTER_SIZE * element.members.len() as u32;
            }
            return POINTER_SIZE + ARRAY_HEADER_SIZE;
        }

        if !self.members.is_empty() {
            return self.members.iter().map(|member| member.ty.size()).sum();
        }

        match self.name.as_str() {
            "int" | "float" => 4,
            "char" | "bool" => 1,
            _ => 0,
        }
    }

    /// Multi-line rendering including struct members, used by symbol table dumps.
    pub fn full_string(&self) -> String {
        if self.is_unresolved() {
            return String::from("<unresolved>");
        }

        let mut buffer = self.name.clone();
        if self.volatile {
            buffer = format!("volatile {}", buffer);
        }
        for member in &self.members {
            buffer.push_str(&format!("\n\t{} {}", member.ty, member.name));
        }

        buffer
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.pointer_depth == other.pointer_depth
            && self.element == other.element
    }
}

impl Eq for Type {}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_unresolved() {
            return write!(f, "<unresolved>");
        }

        let mut buffer = self.name.clone();
        if self.element.is_some() {
            buffer.push_str("[]");
            if self.realigned {
                buffer.push('@');
            }
        }

        buffer.push_str(&"*".repeat(self.pointer_depth as usize));

        if let Some(element) = &self.element {
            buffer.push_str(&element.to_string());
        }

        write!(f, "{}", buffer)
    }
}

/// Name, return type and ordered parameters of a function or extern.
///
/// A trailing parameter of type `...` marks the function variadic.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub name: String,
    pub return_type: Type,
    pub parameters: Vec<Type>,
    pub parameter_names: Vec<String>,
}

impl FunctionSignature {
    pub fn new(name: &str) -> Self {
        FunctionSignature {
            name: name.to_string(),
            return_type: Type::void(),
            parameters: vec![],
            parameter_names: vec![],
        }
    }

    pub fn is_variadic(&self) -> bool {
        self.parameters.last().is_some_and(|ty| ty.is_variadic())
    }

    /// Parameters before a trailing `...`.
    pub fn fixed_parameters(&self) -> &[Type] {
        if self.is_variadic() {
            &self.parameters[..self.parameters.len() - 1]
        } else {
            &self.parameters
        }
    }
}

impl Display for FunctionSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parameters = self
            .parameters
            .iter()
            .map(|ty| ty.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}({})", self.name, parameters)
    }
}
